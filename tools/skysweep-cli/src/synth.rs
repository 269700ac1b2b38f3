//! Built-in synthesizer voice
//!
//! A small polyphonic oscillator synth standing in for a SoundFont player.
//! The waveform is picked from the General MIDI program family, so "Violin"
//! and "Church Organ" at least sound different. A mixer thread renders the
//! active voices into the audio ring buffer while the sweep thread sends
//! note-on/note-off commands.

use std::f32::consts::TAU;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use skysweep_core::pitch::frequency_from_midi;
use skysweep_core::{Result, SonifyError, SynthBackend};

use crate::playback::{AudioOutput, SampleWriter};

/// Frames rendered per mixer iteration
const BLOCK_FRAMES: usize = 256;
/// Per-voice peak level at full velocity, leaving headroom for chords
const VOICE_LEVEL: f32 = 0.25;
const ATTACK_SECONDS: f32 = 0.005;
const RELEASE_SECONDS: f32 = 0.03;
const CHANNELS: usize = 16;

/// Oscillator shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Waveform {
    Sine,
    Square,
    Saw,
    Triangle,
}

impl Waveform {
    /// Waveform for a General MIDI program, by instrument family.
    pub fn for_program(program: u8) -> Self {
        match program / 8 {
            // Piano, chromatic percussion, guitar
            0 | 1 | 3 => Waveform::Triangle,
            // Organ, synth lead
            2 | 10 => Waveform::Square,
            // Bass, strings, ensemble, brass
            4..=7 => Waveform::Saw,
            // Reed, pipe, pads and the rest
            _ => Waveform::Sine,
        }
    }

    /// Sample at `phase` (0.0..1.0 of a cycle).
    fn sample(self, phase: f32) -> f32 {
        match self {
            Waveform::Sine => (TAU * phase).sin(),
            Waveform::Square => {
                if phase < 0.5 {
                    0.6
                } else {
                    -0.6
                }
            }
            Waveform::Saw => (2.0 * phase - 1.0) * 0.7,
            Waveform::Triangle => 4.0 * (phase - 0.5).abs() - 1.0,
        }
    }
}

#[derive(Debug)]
struct Voice {
    channel: u8,
    note: u8,
    waveform: Waveform,
    step: f32,
    phase: f32,
    level: f32,
    envelope: f32,
    released: bool,
}

impl Voice {
    fn next(&mut self, attack_step: f32, release_step: f32) -> f32 {
        if self.released {
            self.envelope = (self.envelope - release_step).max(0.0);
        } else {
            self.envelope = (self.envelope + attack_step).min(1.0);
        }
        let sample = self.waveform.sample(self.phase) * self.level * self.envelope;
        self.phase = (self.phase + self.step).fract();
        sample
    }

    fn finished(&self) -> bool {
        self.released && self.envelope <= 0.0
    }
}

#[derive(Debug)]
struct Voices {
    programs: [u8; CHANNELS],
    active: Vec<Voice>,
    sample_rate: u32,
}

impl Voices {
    fn new(sample_rate: u32) -> Self {
        Self {
            programs: [0; CHANNELS],
            active: Vec::new(),
            sample_rate,
        }
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) {
        let program = self.programs[channel as usize % CHANNELS];
        self.active.push(Voice {
            channel,
            note,
            waveform: Waveform::for_program(program),
            step: frequency_from_midi(note as f64) as f32 / self.sample_rate as f32,
            phase: 0.0,
            level: VOICE_LEVEL * velocity as f32 / 127.0,
            envelope: 0.0,
            released: false,
        });
    }

    fn note_off(&mut self, channel: u8, note: u8) {
        for voice in &mut self.active {
            if voice.channel == channel && voice.note == note {
                voice.released = true;
            }
        }
    }

    /// Mix one block of mono samples.
    fn render(&mut self, out: &mut [f32]) {
        let rate = self.sample_rate as f32;
        let (attack_step, release_step) = (1.0 / (ATTACK_SECONDS * rate), 1.0 / (RELEASE_SECONDS * rate));
        for sample in out.iter_mut() {
            *sample = self
                .active
                .iter_mut()
                .map(|voice| voice.next(attack_step, release_step))
                .sum();
        }
        self.active.retain(|voice| !voice.finished());
    }
}

/// Synth backend playing on the default output device.
pub struct LiveSynth {
    voices: Arc<Mutex<Voices>>,
    running: Arc<AtomicBool>,
    mixer: Option<JoinHandle<()>>,
    _output: AudioOutput,
}

impl LiveSynth {
    /// Open the default output device and start the mixer thread.
    ///
    /// # Errors
    ///
    /// `SynthUnavailable` when no output device can be opened.
    pub fn open() -> Result<Self> {
        let (output, writer) = AudioOutput::open()?;
        let voices = Arc::new(Mutex::new(Voices::new(writer.format().sample_rate)));
        let running = Arc::new(AtomicBool::new(true));

        let mixer = {
            let voices = Arc::clone(&voices);
            let running = Arc::clone(&running);
            thread::Builder::new()
                .name("skysweep-synth".into())
                .spawn(move || mix_loop(&voices, &running, writer))
                .map_err(|e| SonifyError::SynthUnavailable(format!("mixer thread: {}", e)))?
        };
        debug!("Live synth started");

        Ok(Self {
            voices,
            running,
            mixer: Some(mixer),
            _output: output,
        })
    }

    fn voices(&self) -> Result<MutexGuard<'_, Voices>> {
        if !self.running.load(Ordering::Acquire) {
            return Err(SonifyError::SynthUnavailable("mixer stopped".into()));
        }
        self.voices
            .lock()
            .map_err(|_| SonifyError::SynthUnavailable("mixer thread panicked".into()))
    }
}

fn mix_loop(voices: &Mutex<Voices>, running: &AtomicBool, mut writer: SampleWriter) {
    let mut block = vec![0.0f32; BLOCK_FRAMES];
    while running.load(Ordering::Acquire) {
        match voices.lock() {
            Ok(mut voices) => voices.render(&mut block),
            Err(_) => {
                warn!("Synth voices poisoned, stopping mixer");
                running.store(false, Ordering::Release);
                break;
            }
        }
        let rate = writer.format().sample_rate;
        writer.write_mono(&block, rate);
    }
}

impl SynthBackend for LiveSynth {
    fn program_select(&mut self, channel: u8, program: u8) -> Result<()> {
        let mut voices = self.voices()?;
        voices.programs[channel as usize % CHANNELS] = program;
        Ok(())
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.voices()?.note_on(channel, note, velocity);
        Ok(())
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<()> {
        self.voices()?.note_off(channel, note);
        Ok(())
    }
}

impl Drop for LiveSynth {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
        if let Some(mixer) = self.mixer.take() {
            if mixer.join().is_err() {
                warn!("Synth mixer thread panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_program_families() {
        assert_eq!(Waveform::for_program(0), Waveform::Triangle);
        assert_eq!(Waveform::for_program(19), Waveform::Square);
        assert_eq!(Waveform::for_program(40), Waveform::Saw);
        assert_eq!(Waveform::for_program(56), Waveform::Saw);
        assert_eq!(Waveform::for_program(73), Waveform::Sine);
    }

    #[test]
    fn test_voice_release_removes_voice() {
        let mut voices = Voices::new(8000);
        voices.note_on(0, 69, 127);
        let mut block = vec![0.0; 400];
        voices.render(&mut block);
        assert!(block.iter().any(|&s| s.abs() > 0.01));
        assert!(block.iter().all(|&s| s.abs() <= VOICE_LEVEL));

        voices.note_off(0, 69);
        voices.render(&mut block);
        assert!(voices.active.is_empty());
    }

    #[test]
    fn test_note_off_matches_channel() {
        let mut voices = Voices::new(8000);
        voices.note_on(0, 60, 100);
        voices.note_on(1, 60, 100);
        voices.note_off(1, 60);
        assert!(!voices.active[0].released);
        assert!(voices.active[1].released);
    }
}
