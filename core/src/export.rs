//! Audio export and utility functions
//!
//! Provides mixing, PCM conversion and WAV export for rendered sweeps.

#[cfg(feature = "wav-export")]
use std::path::Path;

use crate::render::{AudioBuffer, Tone};

/// Convert f32 samples (-1.0 to 1.0) to PCM i16
///
/// Out-of-range samples (e.g. from overlaid band tones) are clamped.
pub fn to_pcm_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect()
}

/// Mix multiple audio signals together
///
/// Each signal is multiplied by its volume before mixing.
/// The result is not normalized and may exceed 1.0.
///
/// # Example
/// ```
/// use skysweep_core::export::mix;
///
/// let a = vec![0.5, 0.5, 0.5];
/// let b = vec![0.25, 0.25];
/// let mixed = mix(&[(&a, 1.0), (&b, 1.0)]);
/// assert_eq!(mixed, vec![0.75, 0.75, 0.5]);
/// ```
pub fn mix(signals: &[(&[f32], f32)]) -> Vec<f32> {
    let max_len = signals.iter().map(|(s, _)| s.len()).max().unwrap_or(0);
    let mut result = vec![0.0f32; max_len];

    for (samples, volume) in signals {
        for (out, &sample) in result.iter_mut().zip(samples.iter()) {
            *out += sample * volume;
        }
    }

    result
}

/// Concatenate the waveform tones of a sweep, in column order.
///
/// Note tones carry no samples and are skipped. Returns `None` when no
/// waveform tone is present.
pub fn concat_tones<'a, I>(tones: I) -> Option<AudioBuffer>
where
    I: IntoIterator<Item = &'a Tone>,
{
    let mut out: Option<AudioBuffer> = None;
    for buffer in tones.into_iter().filter_map(Tone::as_buffer) {
        match out.as_mut() {
            Some(acc) => acc.samples.extend_from_slice(&buffer.samples),
            None => out = Some(buffer.clone()),
        }
    }
    out
}

/// Write a mono buffer to a 16-bit WAV file
///
/// Requires the `wav-export` feature.
#[cfg(feature = "wav-export")]
pub fn write_wav(buffer: &AudioBuffer, path: &Path) -> crate::error::Result<()> {
    use hound::{SampleFormat, WavSpec, WavWriter};

    let spec = WavSpec {
        channels: 1,
        sample_rate: buffer.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec)?;
    for sample in to_pcm_i16(&buffer.samples) {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    tracing::info!(
        "Wrote {} samples ({:.2}s) to {}",
        buffer.len(),
        buffer.duration(),
        path.display()
    );
    Ok(())
}
