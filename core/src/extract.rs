//! Intensity extraction
//!
//! Reduces band images to one scalar per column. Absent bands are skipped; at
//! least one band must be present.

use ndarray::Axis;
use tracing::debug;

use crate::band::{Band, BandImage, BandSlot};
use crate::error::{Result, SonifyError};

/// Mean intensity per image column, one value per column index.
pub type ColumnSeries = Vec<f64>;

/// Mean of each column over all rows.
pub fn column_means(image: &BandImage) -> ColumnSeries {
    // BandImage guarantees at least one row, so mean_axis always succeeds.
    image
        .samples()
        .mean_axis(Axis(0))
        .map(|means| means.to_vec())
        .unwrap_or_else(|| vec![0.0; image.width()])
}

/// Present bands in order, checking that they share one width.
fn present_bands(images: &[BandSlot]) -> Result<Vec<(&Band, &BandImage)>> {
    let present: Vec<(&Band, &BandImage)> = images
        .iter()
        .filter_map(|(band, image)| image.as_ref().map(|img| (band, img)))
        .collect();

    let Some((_, first)) = present.first() else {
        return Err(SonifyError::NoData);
    };
    let expected = first.width();
    for (band, image) in &present {
        if image.width() != expected {
            return Err(SonifyError::WidthMismatch {
                band: band.to_string(),
                expected,
                actual: image.width(),
            });
        }
    }
    Ok(present)
}

/// All-band average: per column, the mean over present bands of each band's
/// column mean.
///
/// # Errors
///
/// `NoData` if every band is absent, `WidthMismatch` if present bands differ
/// in width.
pub fn extract(images: &[BandSlot]) -> Result<ColumnSeries> {
    let present = present_bands(images)?;
    let width = present[0].1.width();
    let mut combined = vec![0.0; width];

    for (_, image) in &present {
        for (acc, mean) in combined.iter_mut().zip(column_means(image)) {
            *acc += mean;
        }
    }

    let count = present.len() as f64;
    for value in &mut combined {
        *value /= count;
    }

    debug!(
        bands = present.len(),
        skipped = images.len() - present.len(),
        width,
        "extracted combined column series"
    );
    Ok(combined)
}

/// Filter-aware variant: keeps one column series per present band.
pub fn extract_per_band(images: &[BandSlot]) -> Result<Vec<(Band, ColumnSeries)>> {
    let present = present_bands(images)?;
    Ok(present
        .into_iter()
        .map(|(band, image)| (band.clone(), column_means(image)))
        .collect())
}
