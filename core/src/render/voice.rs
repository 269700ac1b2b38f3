//! Synthesizer-voice rendering
//!
//! Sends note-on/note-off pairs to a [`SynthBackend`]. Each band pitch of a
//! column gets its own channel, and a channel never holds more than one note:
//! everything still sounding is released before the next note-on.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{NoteEvent, Tone, ToneRenderer};
use crate::error::{Result, SonifyError};
use crate::instruments;
use crate::pitch::Pitch;

/// Melodic MIDI channels available to one renderer (channel 9 is percussion).
const MAX_CHANNELS: usize = 15;

fn channel_for(index: usize) -> u8 {
    if index >= 9 { index as u8 + 1 } else { index as u8 }
}

/// Synthesizer engine the voice renderer drives.
///
/// Implementations report an unreachable engine, sound bank or output device as
/// [`SonifyError::SynthUnavailable`].
pub trait SynthBackend {
    /// Select the instrument program for a channel.
    fn program_select(&mut self, channel: u8, program: u8) -> Result<()>;

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()>;

    fn note_off(&mut self, channel: u8, note: u8) -> Result<()>;
}

impl<B: SynthBackend + ?Sized> SynthBackend for &mut B {
    fn program_select(&mut self, channel: u8, program: u8) -> Result<()> {
        (**self).program_select(channel, program)
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        (**self).note_on(channel, note, velocity)
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<()> {
        (**self).note_off(channel, note)
    }
}

/// A command received by a [`NoteRecorder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthCommand {
    ProgramSelect { channel: u8, program: u8 },
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8 },
}

/// Backend that records every command in memory.
#[derive(Debug, Default, Clone)]
pub struct NoteRecorder {
    commands: Vec<SynthCommand>,
}

impl NoteRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[SynthCommand] {
        &self.commands
    }
}

impl SynthBackend for NoteRecorder {
    fn program_select(&mut self, channel: u8, program: u8) -> Result<()> {
        self.commands
            .push(SynthCommand::ProgramSelect { channel, program });
        Ok(())
    }

    fn note_on(&mut self, channel: u8, note: u8, velocity: u8) -> Result<()> {
        self.commands.push(SynthCommand::NoteOn {
            channel,
            note,
            velocity,
        });
        Ok(())
    }

    fn note_off(&mut self, channel: u8, note: u8) -> Result<()> {
        self.commands.push(SynthCommand::NoteOff { channel, note });
        Ok(())
    }
}

/// Voice renderer parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    /// General MIDI instrument name (default: "Acoustic Grand Piano")
    #[serde(default = "default_instrument")]
    pub instrument: String,
    /// Note-on velocity (default: 50, range: 1-127)
    #[serde(default = "default_velocity")]
    pub velocity: u8,
    /// How long each note is held, in milliseconds (default: 500)
    #[serde(default = "default_hold_ms")]
    pub hold_ms: u64,
    /// Silence between consecutive notes on the timeline (default: 50)
    #[serde(default = "default_gap_ms")]
    pub gap_ms: u64,
    /// Sleep for the hold time between note-on and note-off (default: true)
    #[serde(default = "default_true")]
    pub pace: bool,
}

fn default_instrument() -> String {
    "Acoustic Grand Piano".to_string()
}
fn default_velocity() -> u8 {
    50
}
fn default_hold_ms() -> u64 {
    500
}
fn default_gap_ms() -> u64 {
    50
}
fn default_true() -> bool {
    true
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            instrument: default_instrument(),
            velocity: default_velocity(),
            hold_ms: default_hold_ms(),
            gap_ms: default_gap_ms(),
            pace: default_true(),
        }
    }
}

impl VoiceSettings {
    pub fn hold(&self) -> Duration {
        Duration::from_millis(self.hold_ms)
    }

    pub fn gap(&self) -> Duration {
        Duration::from_millis(self.gap_ms)
    }
}

/// Renders columns as notes on a synthesizer voice.
pub struct VoiceRenderer<B: SynthBackend> {
    backend: B,
    program: u8,
    velocity: u8,
    hold: Duration,
    gap: Duration,
    pace: bool,
    /// Timeline position of the next column
    cursor: Duration,
    /// Channels that have had the program selected
    programmed: usize,
    /// `(channel, note)` pairs currently sounding
    sounding: Vec<(u8, u8)>,
}

impl<B: SynthBackend> VoiceRenderer<B> {
    /// Create a renderer for the named instrument.
    ///
    /// # Errors
    ///
    /// `UnknownInstrument` if the name is not a General MIDI instrument, or the
    /// backend's error if program selection fails.
    pub fn new(mut backend: B, settings: &VoiceSettings) -> Result<Self> {
        let program = instruments::program_for(&settings.instrument)
            .ok_or_else(|| SonifyError::UnknownInstrument(settings.instrument.clone()))?;
        backend.program_select(0, program)?;
        debug!(
            instrument = %settings.instrument,
            program,
            "voice renderer ready"
        );

        Ok(Self {
            backend,
            program,
            velocity: settings.velocity.clamp(1, 127),
            hold: settings.hold(),
            gap: settings.gap(),
            pace: settings.pace,
            cursor: Duration::ZERO,
            programmed: 1,
            sounding: Vec::new(),
        })
    }

    pub fn program(&self) -> u8 {
        self.program
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Rewind the timeline for a new sweep.
    pub fn reset(&mut self) {
        self.cursor = Duration::ZERO;
    }

    fn silence(&mut self) -> Result<()> {
        while let Some((channel, note)) = self.sounding.pop() {
            self.backend.note_off(channel, note)?;
        }
        Ok(())
    }

    fn ensure_programmed(&mut self, channels: usize) -> Result<()> {
        while self.programmed < channels {
            self.backend
                .program_select(channel_for(self.programmed), self.program)?;
            self.programmed += 1;
        }
        Ok(())
    }
}

impl<B: SynthBackend> ToneRenderer for VoiceRenderer<B> {
    fn render(&mut self, pitches: &[Pitch]) -> Result<Tone> {
        self.silence()?;

        let voices = pitches.len().min(MAX_CHANNELS);
        if pitches.len() > MAX_CHANNELS {
            warn!(
                "{} pitches in one column, only {} channels available",
                pitches.len(),
                MAX_CHANNELS
            );
        }
        self.ensure_programmed(voices)?;

        let start = self.cursor;
        let mut events = Vec::with_capacity(voices);
        for (index, pitch) in pitches.iter().take(voices).enumerate() {
            let channel = channel_for(index);
            let note = pitch.midi_note();
            self.backend.note_on(channel, note, self.velocity)?;
            self.sounding.push((channel, note));
            events.push(NoteEvent {
                channel,
                note,
                velocity: self.velocity,
                start,
                duration: self.hold,
            });
        }

        if self.pace && !events.is_empty() {
            thread::sleep(self.hold);
        }
        self.silence()?;

        self.cursor += self.hold + self.gap;
        Ok(Tone::Notes(events))
    }

    fn release(&mut self) -> Result<()> {
        self.silence()
    }
}

impl<B: SynthBackend> Drop for VoiceRenderer<B> {
    fn drop(&mut self) {
        if let Err(e) = self.silence() {
            warn!("Failed to release voice on drop: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> VoiceSettings {
        VoiceSettings {
            pace: false,
            ..VoiceSettings::default()
        }
    }

    /// Backend that fails every note-on, as an unreachable output device would.
    struct Offline;

    impl SynthBackend for Offline {
        fn program_select(&mut self, _channel: u8, _program: u8) -> Result<()> {
            Ok(())
        }

        fn note_on(&mut self, _channel: u8, _note: u8, _velocity: u8) -> Result<()> {
            Err(SonifyError::SynthUnavailable("no output device".into()))
        }

        fn note_off(&mut self, _channel: u8, _note: u8) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_unknown_instrument() {
        let settings = VoiceSettings {
            instrument: "Theremin Deluxe".into(),
            ..settings()
        };
        let err = VoiceRenderer::new(NoteRecorder::new(), &settings).err().unwrap();
        assert!(matches!(err, SonifyError::UnknownInstrument(name) if name == "Theremin Deluxe"));
    }

    #[test]
    fn test_program_selected_on_creation() {
        let settings = VoiceSettings {
            instrument: "violin".into(),
            ..settings()
        };
        let renderer = VoiceRenderer::new(NoteRecorder::new(), &settings).unwrap();
        assert_eq!(renderer.program(), 40);
        assert_eq!(
            renderer.backend().commands(),
            &[SynthCommand::ProgramSelect {
                channel: 0,
                program: 40
            }]
        );
    }

    #[test]
    fn test_note_on_then_off() {
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings()).unwrap();
        let tone = renderer.render(&[Pitch::Midi(60)]).unwrap();
        assert_eq!(tone.notes().len(), 1);
        assert_eq!(tone.notes()[0].velocity, 50);

        assert_eq!(
            &renderer.backend().commands()[1..],
            &[
                SynthCommand::NoteOn {
                    channel: 0,
                    note: 60,
                    velocity: 50
                },
                SynthCommand::NoteOff {
                    channel: 0,
                    note: 60
                },
            ]
        );
    }

    #[test]
    fn test_channel_never_holds_two_notes() {
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings()).unwrap();
        for note in [60, 62, 64, 62] {
            renderer.render(&[Pitch::Midi(note), Pitch::Midi(note + 12)]).unwrap();
        }
        renderer.release().unwrap();

        let mut active = [None::<u8>; 16];
        for command in renderer.backend().commands() {
            match *command {
                SynthCommand::NoteOn { channel, note, .. } => {
                    assert!(active[channel as usize].is_none(), "overlapping note on {channel}");
                    active[channel as usize] = Some(note);
                }
                SynthCommand::NoteOff { channel, note } => {
                    assert_eq!(active[channel as usize], Some(note));
                    active[channel as usize] = None;
                }
                SynthCommand::ProgramSelect { .. } => {}
            }
        }
        assert!(active.iter().all(Option::is_none));
    }

    #[test]
    fn test_timeline_advances() {
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings()).unwrap();
        let first = renderer.render(&[Pitch::Midi(60)]).unwrap();
        let second = renderer.render(&[Pitch::Midi(61)]).unwrap();
        assert_eq!(first.notes()[0].start, Duration::ZERO);
        assert_eq!(second.notes()[0].start, Duration::from_millis(550));

        renderer.reset();
        let third = renderer.render(&[Pitch::Midi(62)]).unwrap();
        assert_eq!(third.notes()[0].start, Duration::ZERO);
    }

    #[test]
    fn test_hz_pitch_uses_nearest_note() {
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings()).unwrap();
        let tone = renderer.render(&[Pitch::Hz(440.0)]).unwrap();
        assert_eq!(tone.notes()[0].note, 69);
    }

    #[test]
    fn test_unavailable_backend_surfaces_error() {
        let mut renderer = VoiceRenderer::new(Offline, &settings()).unwrap();
        let err = renderer.render(&[Pitch::Midi(60)]).unwrap_err();
        assert!(matches!(err, SonifyError::SynthUnavailable(_)));
    }

    #[test]
    fn test_velocity_clamped() {
        let settings = VoiceSettings {
            velocity: 0,
            ..settings()
        };
        let mut renderer = VoiceRenderer::new(NoteRecorder::new(), &settings).unwrap();
        let tone = renderer.render(&[Pitch::Midi(60)]).unwrap();
        assert_eq!(tone.notes()[0].velocity, 1);
    }
}
