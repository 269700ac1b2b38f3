//! Audio output using cpal and ring buffer

use std::thread;
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use ringbuf::{
    HeapRb,
    traits::{Consumer, Observer, Producer, Split},
};
use tracing::{debug, error};

use skysweep_core::SonifyError;

/// Ring buffer size in samples (~100ms of stereo at 44.1kHz)
const RING_BUFFER_SIZE: usize = 8820;

/// How long a blocked writer waits for the device to drain some samples
const WRITE_BACKOFF: Duration = Duration::from_millis(5);

/// Sample rate and channel count of the output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

/// The running cpal stream. Must stay alive while samples are written.
pub struct AudioOutput {
    _stream: cpal::Stream,
    format: OutputFormat,
}

/// Producer side of the ring buffer; can be moved to another thread.
pub struct SampleWriter {
    producer: ringbuf::HeapProd<f32>,
    format: OutputFormat,
}

fn unavailable(message: impl std::fmt::Display) -> SonifyError {
    SonifyError::SynthUnavailable(message.to_string())
}

impl AudioOutput {
    /// Open the default output device.
    ///
    /// # Errors
    ///
    /// `SynthUnavailable` when there is no device or the stream cannot start.
    pub fn open() -> Result<(Self, SampleWriter), SonifyError> {
        let host = cpal::default_host();

        let device = host
            .default_output_device()
            .ok_or_else(|| unavailable("No audio output device available"))?;

        let config = device
            .default_output_config()
            .map_err(|e| unavailable(format!("Failed to get default output config: {}", e)))?;

        let format = OutputFormat {
            sample_rate: config.sample_rate().0,
            channels: config.channels(),
        };

        let ring = HeapRb::<f32>::new(RING_BUFFER_SIZE);
        let (producer, mut consumer) = ring.split();

        let stream = match config.sample_format() {
            cpal::SampleFormat::F32 => device.build_output_stream(
                &config.into(),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    let popped = consumer.pop_slice(data);
                    data[popped..].fill(0.0);
                },
                |err| error!("Audio stream error: {}", err),
                None,
            ),
            cpal::SampleFormat::I16 => {
                let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
                device.build_output_stream(
                    &config.into(),
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0.0);
                        }
                        let popped = consumer.pop_slice(&mut temp_buffer[..data.len()]);
                        for (out, &f) in data.iter_mut().zip(&temp_buffer[..popped]) {
                            *out = (f * 32767.0).clamp(-32768.0, 32767.0) as i16;
                        }
                        data[popped..].fill(0);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            cpal::SampleFormat::U16 => {
                let mut temp_buffer: Vec<f32> = vec![0.0; 4096];
                device.build_output_stream(
                    &config.into(),
                    move |data: &mut [u16], _: &cpal::OutputCallbackInfo| {
                        if temp_buffer.len() < data.len() {
                            temp_buffer.resize(data.len(), 0.0);
                        }
                        let popped = consumer.pop_slice(&mut temp_buffer[..data.len()]);
                        for (out, &f) in data.iter_mut().zip(&temp_buffer[..popped]) {
                            *out = (f * 32767.0 + 32768.0).clamp(0.0, 65535.0) as u16;
                        }
                        // 0x8000 is silence for u16 audio
                        data[popped..].fill(32768);
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
            }
            other => {
                return Err(unavailable(format!("Unsupported sample format: {:?}", other)));
            }
        }
        .map_err(|e| unavailable(format!("Failed to build audio stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| unavailable(format!("Failed to play audio stream: {}", e)))?;

        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            "Audio stream started"
        );

        Ok((
            Self {
                _stream: stream,
                format,
            },
            SampleWriter { producer, format },
        ))
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

impl SampleWriter {
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Push interleaved samples, waiting for room when the buffer is full.
    pub fn write(&mut self, samples: &[f32]) {
        let mut written = 0;
        while written < samples.len() {
            written += self.producer.push_slice(&samples[written..]);
            if written < samples.len() {
                thread::sleep(WRITE_BACKOFF);
            }
        }
    }

    /// Play a mono buffer recorded at `sample_rate`.
    pub fn write_mono(&mut self, samples: &[f32], sample_rate: u32) {
        let resampled = resample(samples, sample_rate, self.format.sample_rate);
        let frames = interleave(&resampled, self.format.channels);
        self.write(&frames);
    }

    /// Block until the device has consumed everything written.
    pub fn drain(&self) {
        while !self.producer.is_empty() {
            thread::sleep(WRITE_BACKOFF);
        }
    }
}

/// Linear-interpolation sample rate conversion.
pub fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || samples.is_empty() {
        return samples.to_vec();
    }
    let ratio = from as f64 / to as f64;
    let len = (samples.len() as f64 / ratio).round() as usize;
    (0..len)
        .map(|i| {
            let position = i as f64 * ratio;
            let index = position as usize;
            let frac = (position - index as f64) as f32;
            let a = samples[index.min(samples.len() - 1)];
            let b = samples[(index + 1).min(samples.len() - 1)];
            a + (b - a) * frac
        })
        .collect()
}

/// Copy each mono sample to every output channel.
pub fn interleave(mono: &[f32], channels: u16) -> Vec<f32> {
    let channels = channels.max(1) as usize;
    mono.iter()
        .flat_map(|&s| std::iter::repeat_n(s, channels))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resample_identity() {
        let samples = vec![0.1, 0.2, 0.3];
        assert_eq!(resample(&samples, 44_100, 44_100), samples);
    }

    #[test]
    fn test_resample_double_rate() {
        let up = resample(&[0.0, 1.0], 22_050, 44_100);
        assert_eq!(up.len(), 4);
        assert!((up[1] - 0.5).abs() < 1e-6);
        assert_eq!(up[2], 1.0);
    }

    #[test]
    fn test_resample_length() {
        let samples = vec![0.0; 2205];
        assert_eq!(resample(&samples, 44_100, 48_000).len(), 2400);
    }

    #[test]
    fn test_interleave() {
        assert_eq!(interleave(&[0.5, -0.5], 2), vec![0.5, 0.5, -0.5, -0.5]);
        assert_eq!(interleave(&[0.5], 0), vec![0.5]);
    }
}
