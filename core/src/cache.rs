//! Memoizing image cache
//!
//! Wraps any [`ImageSource`] and remembers successful fetches for the life of
//! the cache. Failures are never stored, so a band that was unavailable is
//! retried on the next request.

use std::cell::{Cell, RefCell};

use hashbrown::HashMap;
use tracing::trace;

use crate::band::BandImage;
use crate::error::FetchError;
use crate::source::{FetchRequest, ImageSource};

/// Unbounded cache keyed by the full fetch request.
pub struct ImageCache<S> {
    source: S,
    entries: RefCell<HashMap<FetchRequest, BandImage>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl<S: ImageSource> ImageCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            entries: RefCell::new(HashMap::new()),
            hits: Cell::new(0),
            misses: Cell::new(0),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Number of cached images.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    /// Drop every cached image. Counters are kept.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

impl<S: ImageSource> ImageSource for ImageCache<S> {
    fn fetch(&self, request: &FetchRequest) -> Result<BandImage, FetchError> {
        if let Some(image) = self.entries.borrow().get(request) {
            self.hits.set(self.hits.get() + 1);
            trace!(survey = %request.survey, "cache hit");
            return Ok(image.clone());
        }

        self.misses.set(self.misses.get() + 1);
        let image = self.source.fetch(request)?;
        self.entries
            .borrow_mut()
            .insert(request.clone(), image.clone());
        Ok(image)
    }
}
