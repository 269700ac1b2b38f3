//! Tone rendering
//!
//! A [`ToneRenderer`] turns the pitches of one column into one playable
//! [`Tone`]. Two strategies are provided and selected by configuration:
//!
//! - [`WaveformRenderer`] - sine tones with a fade envelope, band tones overlaid
//! - [`VoiceRenderer`] - note-on/note-off against a synthesizer voice
//!
//! # Example
//! ```
//! use skysweep_core::render::*;
//! use skysweep_core::pitch::Pitch;
//!
//! let mut renderer = WaveformRenderer::new(WaveformSettings::default());
//! let tone = renderer.render(&[Pitch::Midi(69)]).unwrap();
//! assert!(matches!(tone, Tone::Waveform(_)));
//! ```

mod voice;
mod waveform;

use std::time::Duration;

use crate::error::Result;
use crate::pitch::Pitch;

pub use voice::{NoteRecorder, SynthBackend, SynthCommand, VoiceRenderer, VoiceSettings};
pub use waveform::{Fade, WaveformRenderer, WaveformSettings, sine};

/// Default output sample rate in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Mono audio sample buffer (f32 samples, -1.0 to 1.0 range)
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    /// Sample rate in Hz
    pub sample_rate: u32,
    /// Audio samples
    pub samples: Vec<f32>,
}

impl AudioBuffer {
    /// Create a new empty audio buffer
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    /// Create a buffer from samples
    pub fn from_samples(sample_rate: u32, samples: Vec<f32>) -> Self {
        Self {
            sample_rate,
            samples,
        }
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// A single synthesizer note on the sweep timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteEvent {
    pub channel: u8,
    pub note: u8,
    pub velocity: u8,
    /// Offset from the start of the sweep
    pub start: Duration,
    pub duration: Duration,
}

/// Rendered audio for one column.
#[derive(Debug, Clone, PartialEq)]
pub enum Tone {
    /// Synthesized samples, ready for playback or export
    Waveform(AudioBuffer),
    /// Notes sent to a synthesizer voice (one per band pitch)
    Notes(Vec<NoteEvent>),
}

impl Tone {
    pub fn as_buffer(&self) -> Option<&AudioBuffer> {
        match self {
            Tone::Waveform(buffer) => Some(buffer),
            Tone::Notes(_) => None,
        }
    }

    pub fn notes(&self) -> &[NoteEvent] {
        match self {
            Tone::Waveform(_) => &[],
            Tone::Notes(notes) => notes,
        }
    }
}

/// Capability set shared by the rendering strategies.
pub trait ToneRenderer {
    /// Render the pitches of one column into one tone.
    ///
    /// Several pitches (one per band) are combined into a single tone.
    fn render(&mut self, pitches: &[Pitch]) -> Result<Tone>;

    /// Silence anything still sounding. Called when a sweep ends early.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

impl<R: ToneRenderer + ?Sized> ToneRenderer for Box<R> {
    fn render(&mut self, pitches: &[Pitch]) -> Result<Tone> {
        (**self).render(pitches)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}
