//! Pitch mapping
//!
//! Linearly rescales a column series from its observed `[min, max]` into a
//! target pitch range. The series never leaves the target range.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SonifyError};

/// MIDI note of concert A (440 Hz).
pub const A4_NOTE: u8 = 69;
/// Frequency of concert A in Hz.
pub const A4_FREQUENCY: f64 = 440.0;
/// Highest valid MIDI note number.
pub const MIDI_MAX: u8 = 127;

/// Default range for combined mapping: the 88 piano keys.
pub const PIANO_RANGE: (u8, u8) = (21, 108);

/// Convert a MIDI note number to a frequency in Hz (equal temperament).
pub fn frequency_from_midi(note: f64) -> f64 {
    A4_FREQUENCY * 2f64.powf((note - A4_NOTE as f64) / 12.0)
}

/// Nearest MIDI note for a frequency, clamped to `0..=127`.
pub fn midi_from_frequency(hz: f64) -> u8 {
    if hz.is_nan() || hz <= 0.0 {
        return 0;
    }
    let note = A4_NOTE as f64 + 12.0 * (hz / A4_FREQUENCY).log2();
    note.round().clamp(0.0, MIDI_MAX as f64) as u8
}

/// A mapped pitch: discrete MIDI note or continuous frequency.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pitch {
    Midi(u8),
    Hz(f64),
}

impl Pitch {
    pub fn frequency(&self) -> f64 {
        match *self {
            Pitch::Midi(note) => frequency_from_midi(note as f64),
            Pitch::Hz(hz) => hz,
        }
    }

    pub fn midi_note(&self) -> u8 {
        match *self {
            Pitch::Midi(note) => note,
            Pitch::Hz(hz) => midi_from_frequency(hz),
        }
    }
}

/// Target range for the pitch mapper.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PitchRange {
    Midi { min: u8, max: u8 },
    Frequency { min_hz: f64, max_hz: f64 },
}

impl Default for PitchRange {
    fn default() -> Self {
        PitchRange::Midi {
            min: PIANO_RANGE.0,
            max: PIANO_RANGE.1,
        }
    }
}

impl PitchRange {
    pub fn midi(min: u8, max: u8) -> Result<Self> {
        let range = PitchRange::Midi { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn frequency(min_hz: f64, max_hz: f64) -> Result<Self> {
        let range = PitchRange::Frequency { min_hz, max_hz };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        match *self {
            PitchRange::Midi { min, max } => {
                if max > MIDI_MAX {
                    return Err(SonifyError::InvalidPitchRange(format!(
                        "MIDI note {max} exceeds {MIDI_MAX}"
                    )));
                }
                if min > max {
                    return Err(SonifyError::InvalidPitchRange(format!(
                        "minimum note {min} above maximum {max}"
                    )));
                }
            }
            PitchRange::Frequency { min_hz, max_hz } => {
                if !min_hz.is_finite() || !max_hz.is_finite() || min_hz <= 0.0 {
                    return Err(SonifyError::InvalidPitchRange(format!(
                        "frequencies must be finite and positive, got {min_hz}..{max_hz}"
                    )));
                }
                if min_hz > max_hz {
                    return Err(SonifyError::InvalidPitchRange(format!(
                        "minimum {min_hz} Hz above maximum {max_hz} Hz"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Lowest pitch in the range.
    pub fn min_pitch(&self) -> Pitch {
        match *self {
            PitchRange::Midi { min, .. } => Pitch::Midi(min),
            PitchRange::Frequency { min_hz, .. } => Pitch::Hz(min_hz),
        }
    }

    /// Pitch at `fraction` of the way through the range (0.0 = min, 1.0 = max).
    fn at(&self, fraction: f64) -> Pitch {
        let fraction = fraction.clamp(0.0, 1.0);
        match *self {
            PitchRange::Midi { min, max } => {
                let (lo, hi) = (min as f64, max as f64);
                // Halfway values round to the even note
                let note = (lo + (hi - lo) * fraction).round_ties_even().clamp(lo, hi);
                Pitch::Midi(note as u8)
            }
            PitchRange::Frequency { min_hz, max_hz } => {
                let hz = (min_hz + (max_hz - min_hz) * fraction).clamp(min_hz, max_hz);
                Pitch::Hz(hz)
            }
        }
    }

    pub fn contains(&self, pitch: Pitch) -> bool {
        match (*self, pitch) {
            (PitchRange::Midi { min, max }, Pitch::Midi(note)) => (min..=max).contains(&note),
            (PitchRange::Frequency { min_hz, max_hz }, Pitch::Hz(hz)) => {
                (min_hz..=max_hz).contains(&hz)
            }
            _ => false,
        }
    }
}

/// Map a column series into `range`.
///
/// When every value is equal the whole series maps to the range minimum.
pub fn map(series: &[f64], range: PitchRange) -> Result<Vec<Pitch>> {
    range.validate()?;

    let observed_min = series.iter().copied().fold(f64::INFINITY, f64::min);
    let observed_max = series.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    if series.is_empty() {
        return Ok(Vec::new());
    }

    if observed_max == observed_min {
        return Ok(vec![range.min_pitch(); series.len()]);
    }

    let span = observed_max - observed_min;
    Ok(series
        .iter()
        .map(|&value| range.at((value - observed_min) / span))
        .collect())
}

/// Map a column series straight to frequencies: `base_hz + value * hz_per_unit`.
///
/// Unlike [`map`] the series is not rescaled, so brighter images sound higher
/// overall. Results below 0 Hz are clamped to 0 (silence).
pub fn scale(series: &[f64], base_hz: f64, hz_per_unit: f64) -> Result<Vec<Pitch>> {
    if !base_hz.is_finite() || !hz_per_unit.is_finite() {
        return Err(SonifyError::InvalidPitchRange(format!(
            "base {base_hz} Hz and slope {hz_per_unit} Hz per unit must be finite"
        )));
    }
    Ok(series
        .iter()
        .map(|&value| Pitch::Hz((base_hz + value * hz_per_unit).max(0.0)))
        .collect())
}

/// Per-band MIDI sub-ranges, keyed by band name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRanges {
    /// Band name to `(note_min, note_max)`
    #[serde(default = "default_band_table")]
    pub ranges: BTreeMap<String, (u8, u8)>,
    /// Range used for band names missing from the table
    #[serde(default = "default_fallback_range")]
    pub fallback: (u8, u8),
}

fn default_band_table() -> BTreeMap<String, (u8, u8)> {
    [
        ("SDSSu", (21, 32)),
        ("SDSSg", (33, 44)),
        ("SDSSr", (45, 56)),
        ("SDSSi", (57, 68)),
        ("SDSSz", (69, 80)),
    ]
    .into_iter()
    .map(|(name, range)| (name.to_string(), range))
    .collect()
}

fn default_fallback_range() -> (u8, u8) {
    (21, 32)
}

impl Default for BandRanges {
    fn default() -> Self {
        Self {
            ranges: default_band_table(),
            fallback: default_fallback_range(),
        }
    }
}

impl BandRanges {
    /// Sub-range for a band. Unknown names fall back rather than fail.
    pub fn range_for(&self, band: &str) -> Result<PitchRange> {
        let (min, max) = self
            .ranges
            .get(band)
            .or_else(|| {
                self.ranges
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(band))
                    .map(|(_, range)| range)
            })
            .copied()
            .unwrap_or(self.fallback);
        PitchRange::midi(min, max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_frequency_from_midi_reference() {
        assert!((frequency_from_midi(69.0) - 440.0).abs() < EPS);
        assert!((frequency_from_midi(81.0) - 880.0).abs() < EPS);
        assert!((frequency_from_midi(57.0) - 220.0).abs() < EPS);
    }

    #[test]
    fn test_midi_from_frequency() {
        assert_eq!(midi_from_frequency(440.0), 69);
        assert_eq!(midi_from_frequency(445.0), 69);
        assert_eq!(midi_from_frequency(261.63), 60);
        assert_eq!(midi_from_frequency(0.0), 0);
        assert_eq!(midi_from_frequency(1.0e9), 127);
    }

    #[test]
    fn test_map_constant_series_hits_minimum() {
        let pitches = map(&[3.5; 6], PitchRange::midi(21, 108).unwrap()).unwrap();
        assert_eq!(pitches, vec![Pitch::Midi(21); 6]);

        let pitches = map(&[0.0; 3], PitchRange::frequency(200.0, 800.0).unwrap()).unwrap();
        assert_eq!(pitches, vec![Pitch::Hz(200.0); 3]);
    }

    #[test]
    fn test_map_extremes_hit_range_ends() {
        let series = [5.0, -2.0, 10.0, 3.0];
        let pitches = map(&series, PitchRange::midi(21, 108).unwrap()).unwrap();
        assert_eq!(pitches[1], Pitch::Midi(21));
        assert_eq!(pitches[2], Pitch::Midi(108));

        let pitches = map(&series, PitchRange::frequency(100.0, 900.0).unwrap()).unwrap();
        assert_eq!(pitches[1], Pitch::Hz(100.0));
        assert_eq!(pitches[2], Pitch::Hz(900.0));
    }

    #[test]
    fn test_map_rounds_midi() {
        // 0.5 of the way from 0 to 3 is 1.5, rounds to 2
        let pitches = map(&[0.0, 0.5, 1.0], PitchRange::midi(0, 3).unwrap()).unwrap();
        assert_eq!(pitches, vec![Pitch::Midi(0), Pitch::Midi(2), Pitch::Midi(3)]);
    }

    #[test]
    fn test_map_midpoint_rounds_to_even() {
        // Halfway between notes 0 and 1 lands on the even note
        let pitches = map(&[0.0, 1.0, 2.0], PitchRange::midi(0, 1).unwrap()).unwrap();
        assert_eq!(pitches, vec![Pitch::Midi(0), Pitch::Midi(0), Pitch::Midi(1)]);

        let pitches = map(&[0.0, 1.0, 2.0], PitchRange::midi(60, 61).unwrap()).unwrap();
        assert_eq!(pitches[1], Pitch::Midi(60));

        let pitches = map(&[0.0, 1.0, 2.0], PitchRange::midi(61, 62).unwrap()).unwrap();
        assert_eq!(pitches[1], Pitch::Midi(62));
    }

    #[test]
    fn test_map_stays_in_range() {
        let series: Vec<f64> = (0..200).map(|i| ((i * 37) % 101) as f64 * 0.13).collect();
        let range = PitchRange::midi(33, 44).unwrap();
        let pitches = map(&series, range).unwrap();
        assert_eq!(pitches.len(), series.len());
        assert!(pitches.iter().all(|&p| range.contains(p)));
    }

    #[test]
    fn test_scale_from_base() {
        let pitches = scale(&[0.0, 1.5, -10.0], 200.0, 50.0).unwrap();
        assert_eq!(pitches, vec![Pitch::Hz(200.0), Pitch::Hz(275.0), Pitch::Hz(0.0)]);
        assert!(scale(&[1.0], f64::NAN, 50.0).is_err());
    }

    #[test]
    fn test_map_empty_series() {
        assert!(map(&[], PitchRange::default()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_ranges() {
        assert!(PitchRange::midi(60, 50).is_err());
        assert!(PitchRange::midi(0, 128).is_err());
        assert!(PitchRange::frequency(0.0, 100.0).is_err());
        assert!(PitchRange::frequency(500.0, 100.0).is_err());
        assert!(PitchRange::frequency(f64::NAN, 100.0).is_err());
        assert!(map(&[1.0], PitchRange::Midi { min: 9, max: 3 }).is_err());
    }

    #[test]
    fn test_band_ranges_lookup() {
        let table = BandRanges::default();
        assert_eq!(table.range_for("SDSSr").unwrap(), PitchRange::Midi { min: 45, max: 56 });
        // Case-insensitive match for legacy spellings such as "SDSSI"
        assert_eq!(table.range_for("SDSSI").unwrap(), PitchRange::Midi { min: 57, max: 68 });
        assert_eq!(table.range_for("2MASS-J").unwrap(), PitchRange::Midi { min: 21, max: 32 });
    }

    #[test]
    fn test_pitch_conversions() {
        assert!((Pitch::Midi(69).frequency() - 440.0).abs() < EPS);
        assert_eq!(Pitch::Hz(880.0).midi_note(), 81);
        assert_eq!(Pitch::Midi(12).midi_note(), 12);
    }
}
