//! Sine-tone rendering with a click-free fade envelope

use std::f64::consts::PI;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{AudioBuffer, SAMPLE_RATE, Tone, ToneRenderer};
use crate::error::Result;
use crate::export::mix;
use crate::pitch::Pitch;

/// Generate `duration` of a sine wave at `frequency` Hz.
///
/// Samples are in the -`amplitude`..=`amplitude` range.
pub fn sine(frequency: f64, duration: Duration, sample_rate: u32, amplitude: f32) -> Vec<f32> {
    let num_samples = sample_count(duration, sample_rate);
    let omega = 2.0 * PI * frequency / sample_rate as f64;
    (0..num_samples)
        .map(|i| (omega * i as f64).sin() as f32 * amplitude)
        .collect()
}

fn sample_count(duration: Duration, sample_rate: u32) -> usize {
    (duration.as_secs_f64() * sample_rate as f64) as usize
}

/// Linear fade-in/fade-out applied at tone boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fade {
    pub fade_in: Duration,
    pub fade_out: Duration,
}

impl Fade {
    /// Fades of `duration * overlap` each, capped at half the tone.
    pub fn for_tone(duration: Duration, overlap: f64) -> Self {
        let overlap = if overlap.is_finite() {
            overlap.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let length = duration.mul_f64(overlap).min(duration / 2);
        Self {
            fade_in: length,
            fade_out: length,
        }
    }

    /// Shape `samples` in place.
    pub fn apply(&self, samples: &mut [f32], sample_rate: u32) {
        let total = samples.len();
        let fade_in = sample_count(self.fade_in, sample_rate).min(total);
        let fade_out = sample_count(self.fade_out, sample_rate).min(total);

        for (i, sample) in samples.iter_mut().take(fade_in).enumerate() {
            *sample *= i as f32 / fade_in as f32;
        }

        let release_start = total - fade_out;
        for (i, sample) in samples.iter_mut().skip(release_start).enumerate() {
            // Last sample lands on zero
            *sample *= 1.0 - (i + 1) as f32 / fade_out as f32;
        }
    }
}

/// Waveform renderer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveformSettings {
    /// Tone length in milliseconds (default: 50)
    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,
    /// Fraction of the tone used for each fade (default: 0.5)
    #[serde(default = "default_overlap")]
    pub overlap: f64,
    /// Output sample rate in Hz (default: 44100)
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
    /// Peak amplitude of each band tone (default: 1.0)
    #[serde(default = "default_amplitude")]
    pub amplitude: f32,
}

fn default_duration_ms() -> u64 {
    50
}
fn default_overlap() -> f64 {
    0.5
}
fn default_sample_rate() -> u32 {
    SAMPLE_RATE
}
fn default_amplitude() -> f32 {
    1.0
}

impl Default for WaveformSettings {
    fn default() -> Self {
        Self {
            duration_ms: default_duration_ms(),
            overlap: default_overlap(),
            sample_rate: default_sample_rate(),
            amplitude: default_amplitude(),
        }
    }
}

impl WaveformSettings {
    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }

    pub fn fade(&self) -> Fade {
        Fade::for_tone(self.duration(), self.overlap)
    }
}

/// Renders each column as a faded sine tone, overlaying one tone per band.
#[derive(Debug, Clone)]
pub struct WaveformRenderer {
    settings: WaveformSettings,
    fade: Fade,
}

impl WaveformRenderer {
    pub fn new(settings: WaveformSettings) -> Self {
        let fade = settings.fade();
        Self { settings, fade }
    }

    pub fn settings(&self) -> &WaveformSettings {
        &self.settings
    }

    pub fn fade(&self) -> Fade {
        self.fade
    }

    fn band_tone(&self, pitch: Pitch) -> Vec<f32> {
        let mut samples = sine(
            pitch.frequency(),
            self.settings.duration(),
            self.settings.sample_rate,
            self.settings.amplitude,
        );
        self.fade.apply(&mut samples, self.settings.sample_rate);
        samples
    }
}

impl ToneRenderer for WaveformRenderer {
    fn render(&mut self, pitches: &[Pitch]) -> Result<Tone> {
        let sample_rate = self.settings.sample_rate;
        let samples = match pitches {
            [] => vec![0.0; sample_count(self.settings.duration(), sample_rate)],
            [single] => self.band_tone(*single),
            many => {
                let layers: Vec<Vec<f32>> = many.iter().map(|&p| self.band_tone(p)).collect();
                let refs: Vec<(&[f32], f32)> = layers.iter().map(|s| (s.as_slice(), 1.0)).collect();
                mix(&refs)
            }
        };
        Ok(Tone::Waveform(AudioBuffer::from_samples(sample_rate, samples)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SAMPLE_RATE: u32 = 44_100;

    #[test]
    fn test_sine_sample_count() {
        let samples = sine(440.0, Duration::from_millis(50), TEST_SAMPLE_RATE, 1.0);
        assert_eq!(samples.len(), 2205);
        assert!(samples.iter().all(|&s| (-1.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_fade_default_is_quarter_of_tone() {
        let fade = Fade::for_tone(Duration::from_millis(50), 0.5);
        assert_eq!(fade.fade_in, Duration::from_millis(25));
        assert_eq!(fade.fade_out, Duration::from_millis(25));
    }

    #[test]
    fn test_fade_never_exceeds_half_tone() {
        let duration = Duration::from_millis(50);
        for step in 0..=20 {
            let overlap = step as f64 / 20.0;
            let fade = Fade::for_tone(duration, overlap);
            assert!(fade.fade_in <= duration / 2, "overlap {overlap}");
            assert!(fade.fade_out <= duration / 2, "overlap {overlap}");
        }
        assert_eq!(Fade::for_tone(duration, 7.0).fade_in, duration / 2);
        assert_eq!(Fade::for_tone(duration, -1.0).fade_in, Duration::ZERO);
        assert_eq!(Fade::for_tone(duration, f64::NAN).fade_in, Duration::ZERO);
    }

    #[test]
    fn test_fade_apply_edges_silent() {
        let fade = Fade::for_tone(Duration::from_millis(50), 0.5);
        let mut samples = vec![1.0f32; 2205];
        fade.apply(&mut samples, TEST_SAMPLE_RATE);
        assert_eq!(samples[0], 0.0);
        assert_eq!(*samples.last().unwrap(), 0.0);
        assert!(samples.iter().all(|&s| (0.0..=1.0).contains(&s)));
        // Middle of the tone passes through the peak region
        assert!(samples[1102] > 0.95);
    }

    #[test]
    fn test_fade_zero_length_is_noop() {
        let fade = Fade::for_tone(Duration::from_millis(50), 0.0);
        let mut samples = vec![0.5f32; 100];
        fade.apply(&mut samples, TEST_SAMPLE_RATE);
        assert!(samples.iter().all(|&s| s == 0.5));
    }

    #[test]
    fn test_render_single_pitch() {
        let mut renderer = WaveformRenderer::new(WaveformSettings::default());
        let tone = renderer.render(&[Pitch::Midi(69)]).unwrap();
        let buffer = tone.as_buffer().unwrap();
        assert_eq!(buffer.sample_rate, TEST_SAMPLE_RATE);
        assert_eq!(buffer.len(), 2205);
    }

    #[test]
    fn test_render_overlays_bands() {
        let mut renderer = WaveformRenderer::new(WaveformSettings::default());
        let a = renderer.render(&[Pitch::Midi(40)]).unwrap();
        let b = renderer.render(&[Pitch::Midi(52)]).unwrap();
        let both = renderer.render(&[Pitch::Midi(40), Pitch::Midi(52)]).unwrap();

        let (a, b, both) = (
            a.as_buffer().unwrap(),
            b.as_buffer().unwrap(),
            both.as_buffer().unwrap(),
        );
        assert_eq!(both.len(), a.len());
        for i in (0..both.len()).step_by(97) {
            assert!((both.samples[i] - (a.samples[i] + b.samples[i])).abs() < 1e-6);
        }
    }

    #[test]
    fn test_render_no_pitches_is_silence() {
        let mut renderer = WaveformRenderer::new(WaveformSettings::default());
        let tone = renderer.render(&[]).unwrap();
        let buffer = tone.as_buffer().unwrap();
        assert_eq!(buffer.len(), 2205);
        assert!(buffer.samples.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_settings_toml_defaults() {
        let settings: WaveformSettings = toml::from_str("duration_ms = 80").unwrap();
        assert_eq!(settings.duration_ms, 80);
        assert_eq!(settings.overlap, 0.5);
        assert_eq!(settings.sample_rate, TEST_SAMPLE_RATE);
    }
}
