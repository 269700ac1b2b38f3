//! Standard MIDI File export
//!
//! Writes the note timeline of a voice-rendered sweep as a single-track SMF,
//! so a sweep can be rendered offline and opened in any sequencer.

use std::path::Path;
use std::time::Duration;

use midly::num::{u4, u7, u15, u24, u28};
use midly::{Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind};

use crate::error::Result;
use crate::render::NoteEvent;

/// Ticks per quarter note
const TICKS_PER_BEAT: u16 = 480;
/// Microseconds per quarter note (120 BPM)
const TEMPO_US: u32 = 500_000;

fn to_ticks(offset: Duration) -> u32 {
    let ticks = offset.as_micros() * TICKS_PER_BEAT as u128 / TEMPO_US as u128;
    ticks.min(u28::max_value().as_int() as u128) as u32
}

/// Encode notes played with `program` into SMF bytes.
pub fn encode(notes: &[NoteEvent], program: u8) -> Result<Vec<u8>> {
    let mut smf = Smf::new(Header::new(
        Format::SingleTrack,
        Timing::Metrical(u15::new(TICKS_PER_BEAT)),
    ));

    // (tick, is_note_on, channel, key, velocity)
    let mut timeline: Vec<(u32, bool, u8, u8, u8)> = Vec::with_capacity(notes.len() * 2);
    for note in notes {
        let start = to_ticks(note.start);
        let end = to_ticks(note.start + note.duration).max(start + 1);
        timeline.push((start, true, note.channel, note.note, note.velocity));
        timeline.push((end, false, note.channel, note.note, 0));
    }
    // Offs sort before ons on the same tick
    timeline.sort_by_key(|&(tick, on, channel, key, _)| (tick, on, channel, key));

    let mut channels: Vec<u8> = notes.iter().map(|n| n.channel).collect();
    channels.sort_unstable();
    channels.dedup();

    let mut track = Vec::with_capacity(timeline.len() + channels.len() + 2);
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::Tempo(u24::new(TEMPO_US))),
    });
    for &channel in &channels {
        track.push(TrackEvent {
            delta: u28::new(0),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel & 0x0F),
                message: MidiMessage::ProgramChange {
                    program: u7::new(program & 0x7F),
                },
            },
        });
    }

    let mut last_tick = 0;
    for (tick, on, channel, key, velocity) in timeline {
        let message = if on {
            MidiMessage::NoteOn {
                key: u7::new(key & 0x7F),
                vel: u7::new(velocity & 0x7F),
            }
        } else {
            MidiMessage::NoteOff {
                key: u7::new(key & 0x7F),
                vel: u7::new(0),
            }
        };
        track.push(TrackEvent {
            delta: u28::new(tick - last_tick),
            kind: TrackEventKind::Midi {
                channel: u4::new(channel & 0x0F),
                message,
            },
        });
        last_tick = tick;
    }
    track.push(TrackEvent {
        delta: u28::new(0),
        kind: TrackEventKind::Meta(MetaMessage::EndOfTrack),
    });
    smf.tracks.push(track);

    let mut bytes = Vec::new();
    smf.write_std(&mut bytes)?;
    Ok(bytes)
}

/// Write notes to a `.mid` file.
pub fn write_smf(notes: &[NoteEvent], program: u8, path: &Path) -> Result<()> {
    let bytes = encode(notes, program)?;
    std::fs::write(path, bytes)?;
    tracing::info!("Wrote {} notes to {}", notes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(channel: u8, key: u8, start_ms: u64) -> NoteEvent {
        NoteEvent {
            channel,
            note: key,
            velocity: 100,
            start: Duration::from_millis(start_ms),
            duration: Duration::from_millis(500),
        }
    }

    #[test]
    fn test_ticks() {
        assert_eq!(to_ticks(Duration::ZERO), 0);
        // One quarter note at 120 BPM
        assert_eq!(to_ticks(Duration::from_millis(500)), 480);
        assert_eq!(to_ticks(Duration::from_millis(550)), 528);
    }

    #[test]
    fn test_encode_one_note_on_per_column() {
        let notes: Vec<NoteEvent> = (0..4).map(|i| note(0, 60 + i as u8, i * 550)).collect();
        let bytes = encode(&notes, 40).unwrap();

        let smf = Smf::parse(&bytes).unwrap();
        assert_eq!(smf.tracks.len(), 1);

        let track = &smf.tracks[0];
        let note_ons: Vec<u8> = track
            .iter()
            .filter_map(|event| match event.kind {
                TrackEventKind::Midi {
                    message: MidiMessage::NoteOn { key, .. },
                    ..
                } => Some(key.as_int()),
                _ => None,
            })
            .collect();
        assert_eq!(note_ons, vec![60, 61, 62, 63]);

        let programs = track
            .iter()
            .filter(|event| {
                matches!(
                    event.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::ProgramChange { .. },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(programs, 1);
    }

    #[test]
    fn test_encode_program_per_channel() {
        let notes = vec![note(0, 40, 0), note(1, 52, 0), note(2, 64, 0)];
        let bytes = encode(&notes, 0).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        let programs = smf.tracks[0]
            .iter()
            .filter(|event| {
                matches!(
                    event.kind,
                    TrackEventKind::Midi {
                        message: MidiMessage::ProgramChange { .. },
                        ..
                    }
                )
            })
            .count();
        assert_eq!(programs, 3);
    }

    #[test]
    fn test_encode_empty() {
        let bytes = encode(&[], 0).unwrap();
        let smf = Smf::parse(&bytes).unwrap();
        // Tempo + end of track
        assert_eq!(smf.tracks[0].len(), 2);
    }

    #[test]
    fn test_write_smf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sweep.mid");
        write_smf(&[note(0, 69, 0)], 0, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..4], b"MThd");
    }
}
