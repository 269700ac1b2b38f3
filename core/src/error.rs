//! Error types for the sonification pipeline

use std::path::PathBuf;

/// Errors produced while extracting, mapping, rendering or exporting a sweep.
///
/// There is intentionally no variant for an all-equal intensity series: that case
/// maps every column to the bottom of the target range.
#[derive(Debug, thiserror::Error)]
pub enum SonifyError {
    /// No band produced an image
    #[error("no image data available for any band")]
    NoData,

    /// A band required for RGB composition is absent
    #[error("required band '{0}' is missing")]
    MissingBand(String),

    /// Instrument name not present in the General MIDI table
    #[error("unknown instrument '{0}'")]
    UnknownInstrument(String),

    /// Synthesizer backend, sound bank or output device unreachable
    #[error("synthesizer unavailable: {0}")]
    SynthUnavailable(String),

    /// Present bands disagree on image width
    #[error("band '{band}' is {actual} columns wide, expected {expected}")]
    WidthMismatch {
        band: String,
        expected: usize,
        actual: usize,
    },

    /// Sample grid is empty, misshapen or contains non-finite values
    #[error("invalid image: {0}")]
    InvalidImage(String),

    /// Target pitch range is reversed or out of bounds
    #[error("invalid pitch range: {0}")]
    InvalidPitchRange(String),

    /// RA/Dec text could not be parsed or is out of range
    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    /// Configuration file could not be parsed or written
    #[error("config error in {path}: {message}")]
    Config { path: PathBuf, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[cfg(feature = "wav-export")]
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("image encoding error: {0}")]
    Image(#[from] image::ImageError),
}

/// Convenience alias used throughout the crate.
pub type Result<T, E = SonifyError> = std::result::Result<T, E>;

/// Errors reported by an image source for a single band request.
///
/// These never abort a sonification on their own; the band is treated as absent.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("service returned status {0}")]
    Status(u16),

    #[error("malformed image data: {0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Image(#[from] SonifyError),
}
