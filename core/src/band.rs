//! Band images and band sets

use std::fmt;
use std::sync::Arc;

use ndarray::{Array2, ArrayView1, Axis};

use crate::error::{Result, SonifyError};

/// Default survey filters, in order.
pub const SDSS_BANDS: [&str; 5] = ["SDSSu", "SDSSg", "SDSSr", "SDSSi", "SDSSz"];

/// A named spectral filter (e.g. `SDSSg`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Band(String);

impl Band {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Band {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Ordered list of bands, fixed at configuration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BandSet {
    bands: Vec<Band>,
}

impl BandSet {
    pub fn new<I, B>(bands: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Band>,
    {
        Self {
            bands: bands.into_iter().map(Into::into).collect(),
        }
    }

    /// The five SDSS filters u, g, r, i, z.
    pub fn sdss() -> Self {
        Self::new(SDSS_BANDS)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Band> {
        self.bands.iter()
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl Default for BandSet {
    fn default() -> Self {
        Self::sdss()
    }
}

/// Immutable 2-D grid of samples (height x width) for one band.
///
/// Cheap to clone: the samples are shared.
#[derive(Debug, Clone, PartialEq)]
pub struct BandImage {
    data: Arc<Array2<f64>>,
}

impl BandImage {
    /// Wrap a sample grid. Rejects empty grids and non-finite samples.
    pub fn new(data: Array2<f64>) -> Result<Self> {
        let (height, width) = data.dim();
        if height == 0 || width == 0 {
            return Err(SonifyError::InvalidImage(format!(
                "empty grid ({height}x{width})"
            )));
        }
        if let Some(pos) = data.iter().position(|v| !v.is_finite()) {
            return Err(SonifyError::InvalidImage(format!(
                "non-finite sample at row {}, column {}",
                pos / width,
                pos % width
            )));
        }
        Ok(Self {
            data: Arc::new(data),
        })
    }

    /// Build from row-major samples.
    pub fn from_rows(height: usize, width: usize, samples: Vec<f64>) -> Result<Self> {
        let data = Array2::from_shape_vec((height, width), samples).map_err(|e| {
            SonifyError::InvalidImage(format!("cannot shape samples as {height}x{width}: {e}"))
        })?;
        Self::new(data)
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        self.data.get((row, column)).copied()
    }

    pub fn column(&self, column: usize) -> ArrayView1<'_, f64> {
        self.data.index_axis(Axis(1), column)
    }

    pub fn min(&self) -> f64 {
        self.data.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.data.iter().copied().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn samples(&self) -> &Array2<f64> {
        &self.data
    }
}

/// One band's fetch result: `None` when the fetch failed.
pub type BandSlot = (Band, Option<BandImage>);

/// Ordered fetch results for a band set.
pub type BandImages = Vec<BandSlot>;

/// Count of bands that actually carry an image.
pub fn present_count(images: &[BandSlot]) -> usize {
    images.iter().filter(|(_, image)| image.is_some()).count()
}
