//! Skysweep Core - sky survey image sonification
//!
//! This crate turns multi-band astronomical images into sound by sweeping a
//! virtual scan line across the image, one column at a time.
//!
//! # Architecture
//!
//! - [`extract`] - per-column mean intensity, combined or per band
//! - [`pitch`] - linear rescaling of intensities into a MIDI or Hz range
//! - [`render`] - [`ToneRenderer`] implementations (sine waveform, synth voice)
//! - [`sweep`] - lazy column-by-column sequencing into [`SweepFrame`]s
//!
//! Around the pipeline sit the image [`source`] seam with its [`cache`], sky
//! [`coords`], RGB [`preview`] frames, WAV/MIDI [`export`] and [`smf`] writers,
//! and the TOML [`config`].
//!
//! # Example
//! ```
//! use skysweep_core::{Band, BandImage, SweepMode, WaveformRenderer, WaveformSettings, sweep};
//!
//! let image = BandImage::from_rows(1, 3, vec![0.0, 5.0, 10.0]).unwrap();
//! let images = vec![(Band::new("SDSSg"), Some(image))];
//! let mut renderer = WaveformRenderer::new(WaveformSettings::default());
//!
//! let frames: Vec<_> = sweep(&images, &SweepMode::default(), &mut renderer)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(frames.len(), 3);
//! ```

pub mod band;
pub mod cache;
pub mod config;
pub mod coords;
pub mod error;
pub mod export;
pub mod extract;
pub mod instruments;
pub mod pitch;
pub mod preview;
pub mod render;
pub mod smf;
pub mod source;
pub mod sweep;

pub use band::{Band, BandImage, BandImages, BandSet, BandSlot};
pub use cache::ImageCache;
pub use config::{Config, RendererKind};
pub use coords::{CoordUnit, SkyPosition};
pub use error::{FetchError, Result, SonifyError};
pub use extract::{ColumnSeries, extract, extract_per_band};
pub use pitch::{BandRanges, Pitch, PitchRange};
pub use render::{
    AudioBuffer, NoteEvent, NoteRecorder, SynthBackend, Tone, ToneRenderer, VoiceRenderer,
    VoiceSettings, WaveformRenderer, WaveformSettings,
};
pub use source::{FetchRequest, ImageSource, fetch_bands};
pub use sweep::{Sweep, SweepFrame, SweepMode, sweep};
