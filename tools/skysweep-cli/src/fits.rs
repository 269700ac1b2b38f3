//! Minimal FITS reader for survey cutouts
//!
//! Decodes the primary HDU of a FITS file into a 2-D sample grid. Only what
//! SkyView returns is supported: a single image with BITPIX 8, 16, 32, 64,
//! -32 or -64, optionally scaled by BSCALE/BZERO. Blank and NaN samples
//! become 0.0.

use std::io::Read;
use std::path::Path;

use byteorder::{BigEndian, ReadBytesExt};
use ndarray::Array2;
use thiserror::Error;

use skysweep_core::{BandImage, FetchError};

/// FITS files are made of 2880-byte blocks.
const BLOCK_SIZE: usize = 2880;
/// Header cards are 80 ASCII characters.
const CARD_SIZE: usize = 80;

/// Errors that can occur while decoding a FITS file
#[derive(Error, Debug)]
pub enum FitsError {
    #[error("FITS I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("not a FITS file")]
    NotFits,
    #[error("header has no END card")]
    UnterminatedHeader,
    #[error("missing or invalid keyword {0}")]
    Keyword(&'static str),
    #[error("unsupported BITPIX {0}")]
    UnsupportedBitpix(i64),
    #[error("expected a 2-D image, got {0} axes")]
    Dimensions(usize),
    #[error("data unit truncated: need {needed} bytes, have {available}")]
    Truncated { needed: usize, available: usize },
}

impl From<FitsError> for FetchError {
    fn from(e: FitsError) -> Self {
        FetchError::Format(e.to_string())
    }
}

/// Parsed header keywords, in file order.
#[derive(Debug, Default)]
struct Header {
    cards: Vec<(String, String)>,
}

impl Header {
    fn value(&self, keyword: &str) -> Option<&str> {
        self.cards
            .iter()
            .find(|(key, _)| key == keyword)
            .map(|(_, value)| value.as_str())
    }

    fn int(&self, keyword: &'static str) -> Result<i64, FitsError> {
        self.value(keyword)
            .and_then(|v| v.parse().ok())
            .ok_or(FitsError::Keyword(keyword))
    }

    fn float_or(&self, keyword: &'static str, default: f64) -> Result<f64, FitsError> {
        match self.value(keyword) {
            // Fortran-style exponents (1.0D+00) are legal in FITS
            Some(v) => v
                .replace(['D', 'd'], "E")
                .parse()
                .map_err(|_| FitsError::Keyword(keyword)),
            None => Ok(default),
        }
    }
}

/// Split a card into keyword and value, dropping any inline comment.
fn parse_card(card: &[u8]) -> (String, Option<String>) {
    let text = String::from_utf8_lossy(card);
    let keyword = text.get(..8).unwrap_or(&text).trim().to_string();
    let value = text.get(8..10).filter(|&indicator| indicator == "= ").and_then(|_| {
        let field = text.get(10..)?.trim();
        let value = if let Some(quoted) = field.strip_prefix('\'') {
            quoted.split('\'').next().unwrap_or_default().trim_end()
        } else {
            field.split('/').next().unwrap_or_default().trim()
        };
        Some(value.to_string())
    });
    (keyword, value)
}

/// Read cards up to END. Returns the header and its size in bytes (block padded).
fn parse_header(bytes: &[u8]) -> Result<(Header, usize), FitsError> {
    if !bytes.starts_with(b"SIMPLE") {
        return Err(FitsError::NotFits);
    }

    let mut header = Header::default();
    for (index, card) in bytes.chunks_exact(CARD_SIZE).enumerate() {
        let (keyword, value) = parse_card(card);
        if keyword == "END" {
            let used = (index + 1) * CARD_SIZE;
            return Ok((header, used.div_ceil(BLOCK_SIZE) * BLOCK_SIZE));
        }
        if let Some(value) = value {
            header.cards.push((keyword, value));
        }
    }
    Err(FitsError::UnterminatedHeader)
}

/// Decode the primary image.
///
/// Rows are flipped so row 0 is the top of the image (north up), matching
/// how previews are drawn.
pub fn parse(bytes: &[u8]) -> Result<Array2<f64>, FitsError> {
    let (header, offset) = parse_header(bytes)?;

    let bitpix = header.int("BITPIX")?;
    let naxis = header.int("NAXIS")?;
    let width = header.int("NAXIS1")?;
    let height = header.int("NAXIS2")?;
    // Degenerate trailing axes (NAXIS3 = 1) are fine
    for axis in 3..=naxis {
        let name = format!("NAXIS{axis}");
        if header.value(&name) != Some("1") {
            return Err(FitsError::Dimensions(naxis as usize));
        }
    }
    if naxis < 2 || width <= 0 || height <= 0 {
        return Err(FitsError::Dimensions(naxis.max(0) as usize));
    }
    let (width, height) = (width as usize, height as usize);

    let bscale = header.float_or("BSCALE", 1.0)?;
    let bzero = header.float_or("BZERO", 0.0)?;
    let blank = header.int("BLANK").ok();

    let bytes_per_sample = match bitpix {
        8 => 1,
        16 => 2,
        32 | -32 => 4,
        64 | -64 => 8,
        other => return Err(FitsError::UnsupportedBitpix(other)),
    };
    // Axis sizes come from untrusted headers
    let Some((count, needed)) = width
        .checked_mul(height)
        .and_then(|count| Some((count, count.checked_mul(bytes_per_sample)?)))
    else {
        return Err(FitsError::Dimensions(naxis as usize));
    };
    let data = bytes.get(offset..).unwrap_or_default();
    if data.len() < needed {
        return Err(FitsError::Truncated {
            needed,
            available: data.len(),
        });
    }

    let mut reader = &data[..needed];
    let mut samples = Vec::with_capacity(count);
    for _ in 0..count {
        let raw = read_sample(&mut reader, bitpix)?;
        let value = match raw {
            Sample::Int(v) if Some(v) == blank => f64::NAN,
            Sample::Int(v) => bzero + bscale * v as f64,
            Sample::Float(v) => bzero + bscale * v,
        };
        samples.push(if value.is_finite() { value } else { 0.0 });
    }

    let mut image = Array2::zeros((height, width));
    for (row, chunk) in samples.chunks_exact(width).enumerate() {
        for (column, &value) in chunk.iter().enumerate() {
            image[(height - 1 - row, column)] = value;
        }
    }
    Ok(image)
}

enum Sample {
    Int(i64),
    Float(f64),
}

fn read_sample(reader: &mut impl Read, bitpix: i64) -> Result<Sample, FitsError> {
    Ok(match bitpix {
        8 => Sample::Int(reader.read_u8()? as i64),
        16 => Sample::Int(reader.read_i16::<BigEndian>()? as i64),
        32 => Sample::Int(reader.read_i32::<BigEndian>()? as i64),
        64 => Sample::Int(reader.read_i64::<BigEndian>()?),
        -32 => Sample::Float(reader.read_f32::<BigEndian>()? as f64),
        -64 => Sample::Float(reader.read_f64::<BigEndian>()?),
        other => return Err(FitsError::UnsupportedBitpix(other)),
    })
}

/// Decode FITS bytes into a band image.
pub fn decode_band(bytes: &[u8]) -> Result<BandImage, FetchError> {
    let samples = parse(bytes)?;
    Ok(BandImage::new(samples)?)
}

/// Read a FITS file from disk into a band image.
pub fn read_band(path: &Path) -> Result<BandImage, FetchError> {
    let bytes = std::fs::read(path)?;
    decode_band(&bytes)
}
