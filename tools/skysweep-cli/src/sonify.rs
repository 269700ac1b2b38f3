//! Sonification options shared by `play` and `render`

use anyhow::{Result, bail};
use clap::Args;

use skysweep_core::{BandRanges, Config, Pitch, PitchRange, RendererKind, SweepFrame, SweepMode, Tone};

/// Renderer and pitch mapping options
#[derive(Args, Debug, Default)]
pub struct SweepArgs {
    /// Renderer: waveform (sine tones) or voice (synthesizer notes)
    #[arg(long)]
    pub renderer: Option<RendererKind>,

    /// General MIDI instrument for the voice renderer (see `skysweep instruments`)
    #[arg(long)]
    pub instrument: Option<String>,

    /// One pitch per band, each in its own note range
    #[arg(long, conflicts_with_all = ["note_range", "hz_range", "scale"])]
    pub per_band: bool,

    /// Target MIDI note range, e.g. 21,108
    #[arg(long, value_delimiter = ',', conflicts_with = "hz_range")]
    pub note_range: Option<Vec<u8>>,

    /// Target frequency range in Hz, e.g. 220,880
    #[arg(long, value_delimiter = ',', conflicts_with = "scale")]
    pub hz_range: Option<Vec<f64>>,

    /// Unscaled mapping: base frequency plus Hz per unit of intensity, e.g. 200,50
    #[arg(long, value_delimiter = ',', conflicts_with = "note_range", allow_hyphen_values = true)]
    pub scale: Option<Vec<f64>>,

    /// Tone length per column in milliseconds (waveform renderer)
    #[arg(long)]
    pub duration_ms: Option<u64>,

    /// Note hold time per column in milliseconds (voice renderer)
    #[arg(long)]
    pub hold_ms: Option<u64>,
}

fn pair<T: Copy>(values: &[T], flag: &str) -> Result<(T, T)> {
    match values {
        [min, max] => Ok((*min, *max)),
        _ => bail!("--{flag} takes exactly two values, MIN,MAX"),
    }
}

impl SweepArgs {
    /// Override configuration values with the given flags.
    pub fn apply(&self, config: &mut Config) -> Result<()> {
        if let Some(renderer) = self.renderer {
            config.renderer = renderer;
        }
        if let Some(instrument) = &self.instrument {
            config.voice.instrument = instrument.clone();
        }
        if let Some(duration_ms) = self.duration_ms {
            config.waveform.duration_ms = duration_ms;
        }
        if let Some(hold_ms) = self.hold_ms {
            config.voice.hold_ms = hold_ms;
        }

        if self.per_band {
            if !matches!(config.mapping, SweepMode::PerBand(_)) {
                config.mapping = SweepMode::PerBand(BandRanges::default());
            }
        } else if let Some(notes) = &self.note_range {
            let (min, max) = pair(notes, "note-range")?;
            config.mapping = SweepMode::Combined(PitchRange::midi(min, max)?);
        } else if let Some(hz) = &self.hz_range {
            let (min, max) = pair(hz, "hz-range")?;
            config.mapping = SweepMode::Combined(PitchRange::frequency(min, max)?);
        } else if let Some(scale) = &self.scale {
            let (base_hz, hz_per_unit) = pair(scale, "scale")?;
            config.mapping = SweepMode::Scaled {
                base_hz,
                hz_per_unit,
            };
        }
        Ok(())
    }
}

/// One-line description of a frame for progress output.
pub fn describe(frame: &SweepFrame, width: usize) -> String {
    let pitches: Vec<String> = frame
        .pitches
        .iter()
        .map(|p| match p {
            Pitch::Midi(note) => format!("note {note}"),
            Pitch::Hz(hz) => format!("{hz:.1} Hz"),
        })
        .collect();
    let kind = match &frame.tone {
        Tone::Waveform(buffer) => format!("{} samples", buffer.len()),
        Tone::Notes(notes) => format!("{} notes", notes.len()),
    };
    format!(
        "column {}/{}: {} ({})",
        frame.column + 1,
        width,
        pitches.join(", "),
        kind
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use skysweep_core::AudioBuffer;

    #[test]
    fn test_apply_note_range() {
        let mut config = Config::default();
        let args = SweepArgs {
            note_range: Some(vec![40, 80]),
            renderer: Some(RendererKind::Voice),
            instrument: Some("Violin".into()),
            ..SweepArgs::default()
        };
        args.apply(&mut config).unwrap();
        assert_eq!(config.mapping, SweepMode::Combined(PitchRange::midi(40, 80).unwrap()));
        assert_eq!(config.renderer, RendererKind::Voice);
        assert_eq!(config.voice.instrument, "Violin");
    }

    #[test]
    fn test_apply_rejects_bad_range() {
        let mut config = Config::default();
        let reversed = SweepArgs {
            note_range: Some(vec![80, 40]),
            ..SweepArgs::default()
        };
        assert!(reversed.apply(&mut config).is_err());

        let single = SweepArgs {
            hz_range: Some(vec![440.0]),
            ..SweepArgs::default()
        };
        assert!(single.apply(&mut config).is_err());
    }

    #[test]
    fn test_apply_per_band() {
        let mut config = Config::default();
        let args = SweepArgs {
            per_band: true,
            ..SweepArgs::default()
        };
        args.apply(&mut config).unwrap();
        assert_eq!(config.mapping, SweepMode::PerBand(BandRanges::default()));
    }

    #[test]
    fn test_apply_scale() {
        let mut config = Config::default();
        let args = SweepArgs {
            scale: Some(vec![150.0, 25.0]),
            ..SweepArgs::default()
        };
        args.apply(&mut config).unwrap();
        assert_eq!(
            config.mapping,
            SweepMode::Scaled {
                base_hz: 150.0,
                hz_per_unit: 25.0
            }
        );
    }

    #[test]
    fn test_describe() {
        let frame = SweepFrame {
            column: 0,
            pitches: vec![Pitch::Midi(60), Pitch::Hz(440.0)],
            tone: Tone::Waveform(AudioBuffer::from_samples(44_100, vec![0.0; 10])),
        };
        assert_eq!(describe(&frame, 4), "column 1/4: note 60, 440.0 Hz (10 samples)");
    }
}
