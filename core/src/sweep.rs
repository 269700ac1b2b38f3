//! Sweep sequencing
//!
//! A sweep walks a virtual scan line across the image from column 0 to the
//! last column. Extraction and pitch mapping run up front so that missing data
//! is reported before the first tone; rendering is lazy, one column per
//! iteration step.

use std::iter::FusedIterator;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::band::BandSlot;
use crate::error::Result;
use crate::extract::{extract, extract_per_band};
use crate::pitch::{BandRanges, Pitch, PitchRange, map, scale};
use crate::render::{Tone, ToneRenderer};

/// How band intensities become pitches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum SweepMode {
    /// Average all present bands into one series and one pitch per column
    Combined(PitchRange),
    /// One pitch per present band, each in the band's own sub-range
    PerBand(BandRanges),
    /// Combined series offset from a base frequency, not rescaled
    Scaled {
        #[serde(default = "default_base_hz")]
        base_hz: f64,
        #[serde(default = "default_hz_per_unit")]
        hz_per_unit: f64,
    },
}

fn default_base_hz() -> f64 {
    200.0
}
fn default_hz_per_unit() -> f64 {
    50.0
}

impl SweepMode {
    /// Base-frequency mapping with the default 200 Hz base and 50 Hz per unit.
    pub fn scaled() -> Self {
        SweepMode::Scaled {
            base_hz: default_base_hz(),
            hz_per_unit: default_hz_per_unit(),
        }
    }
}

impl Default for SweepMode {
    fn default() -> Self {
        SweepMode::Combined(PitchRange::default())
    }
}

/// The rendered output for a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct SweepFrame {
    /// 0-based image column
    pub column: usize,
    pub pitches: Vec<Pitch>,
    pub tone: Tone,
}

/// Compute the pitches of every column without rendering anything.
pub fn plan(images: &[BandSlot], mode: &SweepMode) -> Result<Vec<Vec<Pitch>>> {
    match mode {
        SweepMode::Combined(range) => {
            let series = extract(images)?;
            let pitches = map(&series, *range)?;
            Ok(pitches.into_iter().map(|p| vec![p]).collect())
        }
        SweepMode::PerBand(ranges) => {
            let per_band = extract_per_band(images)?;
            let width = per_band.first().map_or(0, |(_, series)| series.len());
            let mut columns = vec![Vec::with_capacity(per_band.len()); width];
            for (band, series) in &per_band {
                let range = ranges.range_for(band.name())?;
                for (column, pitch) in map(series, range)?.into_iter().enumerate() {
                    columns[column].push(pitch);
                }
            }
            Ok(columns)
        }
        SweepMode::Scaled {
            base_hz,
            hz_per_unit,
        } => {
            let series = extract(images)?;
            let pitches = scale(&series, *base_hz, *hz_per_unit)?;
            Ok(pitches.into_iter().map(|p| vec![p]).collect())
        }
    }
}

/// Start a sweep over `images`.
///
/// # Errors
///
/// `NoData` when every band is absent, `WidthMismatch` when present bands
/// disagree on width, `InvalidPitchRange` for a bad target range. No frame is
/// produced in any of these cases.
pub fn sweep<'r, R>(images: &[BandSlot], mode: &SweepMode, renderer: &'r mut R) -> Result<Sweep<'r, R>>
where
    R: ToneRenderer + ?Sized,
{
    let pitches = plan(images, mode)?;
    debug!(columns = pitches.len(), "sweep planned");
    Ok(Sweep {
        pitches,
        renderer,
        next: 0,
        finished: false,
    })
}

/// Lazy column-by-column sweep.
///
/// Yields one frame per column in order. A renderer error is yielded once and
/// ends the sweep. Dropping the sweep releases any note still sounding.
pub struct Sweep<'r, R: ToneRenderer + ?Sized> {
    pitches: Vec<Vec<Pitch>>,
    renderer: &'r mut R,
    next: usize,
    finished: bool,
}

impl<R: ToneRenderer + ?Sized> Sweep<'_, R> {
    /// Precomputed pitches, one entry per column.
    pub fn pitches(&self) -> &[Vec<Pitch>] {
        &self.pitches
    }

    /// Number of columns (image width).
    pub fn width(&self) -> usize {
        self.pitches.len()
    }
}

impl<R: ToneRenderer + ?Sized> Iterator for Sweep<'_, R> {
    type Item = Result<SweepFrame>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished || self.next >= self.pitches.len() {
            self.finished = true;
            return None;
        }

        let column = self.next;
        self.next += 1;
        let pitches = &self.pitches[column];

        match self.renderer.render(pitches) {
            Ok(tone) => Some(Ok(SweepFrame {
                column,
                pitches: pitches.clone(),
                tone,
            })),
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            (0, Some(0))
        } else {
            (0, Some(self.pitches.len() - self.next))
        }
    }
}

impl<R: ToneRenderer + ?Sized> FusedIterator for Sweep<'_, R> {}

impl<R: ToneRenderer + ?Sized> Drop for Sweep<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.renderer.release() {
            warn!("Failed to release renderer after sweep: {}", e);
        }
    }
}
