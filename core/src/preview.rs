//! False-color previews
//!
//! Three bands are log-stretched to 8 bits and stacked as red, green and blue.
//! The scan-line highlighter marks the column currently being sonified.

use image::{Rgb, RgbImage};
use tracing::debug;

use crate::band::{BandImage, BandSlot};
use crate::error::{Result, SonifyError};

/// Bands stacked as red, green and blue by default.
pub const RGB_BANDS: [&str; 3] = ["SDSSg", "SDSSr", "SDSSz"];

/// Opacity of the highlighted scan line.
const HIGHLIGHT_ALPHA: f32 = 0.5;
const HIGHLIGHT_COLOR: [u8; 3] = [255, 0, 0];

/// Log-stretch a band to `0..=255`.
///
/// `log1p(x - min) / log1p(max - min) * 255`. A flat image stretches to black.
pub fn stretch(image: &BandImage) -> Vec<u8> {
    let min = image.min();
    let span = (image.max() - min).ln_1p();
    image
        .samples()
        .iter()
        .map(|&x| {
            if span > 0.0 {
                ((x - min).ln_1p() / span * 255.0).clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect()
}

fn find<'a>(images: &'a [BandSlot], name: &str) -> Option<&'a BandImage> {
    images
        .iter()
        .find(|(band, _)| band.name() == name)
        .and_then(|(_, image)| image.as_ref())
}

fn stack(channels: [&BandImage; 3]) -> Result<RgbImage> {
    let (height, width) = (channels[0].height(), channels[0].width());
    for channel in &channels[1..] {
        if channel.height() != height || channel.width() != width {
            return Err(SonifyError::InvalidImage(format!(
                "cannot stack {}x{} with {}x{}",
                width,
                height,
                channel.width(),
                channel.height()
            )));
        }
    }

    let [r, g, b] = channels.map(stretch);
    // Samples are row-major, row 0 at the top
    let pixels: Vec<u8> = r
        .iter()
        .zip(&g)
        .zip(&b)
        .flat_map(|((&r, &g), &b)| [r, g, b])
        .collect();

    RgbImage::from_raw(width as u32, height as u32, pixels)
        .ok_or_else(|| SonifyError::InvalidImage("preview buffer size mismatch".into()))
}

/// Compose an RGB preview from exactly the named bands.
///
/// # Errors
///
/// `MissingBand` names the first requested band that is absent.
pub fn compose_rgb(images: &[BandSlot], bands: [&str; 3]) -> Result<RgbImage> {
    let mut channels = Vec::with_capacity(3);
    for name in bands {
        let image = find(images, name).ok_or_else(|| SonifyError::MissingBand(name.to_string()))?;
        channels.push(image);
    }
    stack([channels[0], channels[1], channels[2]])
}

/// Compose the best preview the available bands allow.
///
/// Uses [`RGB_BANDS`] when all three are present, otherwise the first three
/// available bands in band order, otherwise a grayscale image of the first
/// available band.
pub fn compose_preview(images: &[BandSlot]) -> Result<RgbImage> {
    match compose_rgb(images, RGB_BANDS) {
        Ok(preview) => return Ok(preview),
        Err(SonifyError::MissingBand(band)) => {
            debug!("Preview band {} missing, falling back", band);
        }
        Err(e) => return Err(e),
    }

    let available: Vec<&BandImage> = images.iter().filter_map(|(_, image)| image.as_ref()).collect();
    match available.as_slice() {
        [] => Err(SonifyError::NoData),
        [r, g, b, ..] => stack([*r, *g, *b]),
        [gray, ..] => stack([*gray, *gray, *gray]),
    }
}

/// Copy of `preview` with a translucent red line over `column`.
///
/// Columns outside the image leave it unchanged.
pub fn highlight_column(preview: &RgbImage, column: usize) -> RgbImage {
    let mut frame = preview.clone();
    let Ok(x) = u32::try_from(column) else {
        return frame;
    };
    if x >= frame.width() {
        return frame;
    }

    for y in 0..frame.height() {
        let Rgb(pixel) = *frame.get_pixel(x, y);
        let blended: [u8; 3] = std::array::from_fn(|c| {
            let base = pixel[c] as f32;
            let over = HIGHLIGHT_COLOR[c] as f32;
            (base + (over - base) * HIGHLIGHT_ALPHA).round() as u8
        });
        frame.put_pixel(x, y, Rgb(blended));
    }
    frame
}
