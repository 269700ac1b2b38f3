//! General MIDI instrument names
//!
//! Maps human-readable instrument names to the program numbers a synthesizer
//! voice understands. Lookup ignores ASCII case and surrounding whitespace.

/// General MIDI level 1 program names, indexed by program number.
pub const GM_INSTRUMENTS: [&str; 128] = [
    // Piano
    "Acoustic Grand Piano",
    "Bright Acoustic Piano",
    "Electric Grand Piano",
    "Honky-tonk Piano",
    "Electric Piano 1",
    "Electric Piano 2",
    "Harpsichord",
    "Clavinet",
    // Chromatic percussion
    "Celesta",
    "Glockenspiel",
    "Music Box",
    "Vibraphone",
    "Marimba",
    "Xylophone",
    "Tubular Bells",
    "Dulcimer",
    // Organ
    "Drawbar Organ",
    "Percussive Organ",
    "Rock Organ",
    "Church Organ",
    "Reed Organ",
    "Accordion",
    "Harmonica",
    "Tango Accordion",
    // Guitar
    "Acoustic Guitar (nylon)",
    "Acoustic Guitar (steel)",
    "Electric Guitar (jazz)",
    "Electric Guitar (clean)",
    "Electric Guitar (muted)",
    "Overdriven Guitar",
    "Distortion Guitar",
    "Guitar Harmonics",
    // Bass
    "Acoustic Bass",
    "Electric Bass (finger)",
    "Electric Bass (pick)",
    "Fretless Bass",
    "Slap Bass 1",
    "Slap Bass 2",
    "Synth Bass 1",
    "Synth Bass 2",
    // Strings
    "Violin",
    "Viola",
    "Cello",
    "Contrabass",
    "Tremolo Strings",
    "Pizzicato Strings",
    "Orchestral Harp",
    "Timpani",
    // Ensemble
    "String Ensemble 1",
    "String Ensemble 2",
    "Synth Strings 1",
    "Synth Strings 2",
    "Choir Aahs",
    "Voice Oohs",
    "Synth Choir",
    "Orchestra Hit",
    // Brass
    "Trumpet",
    "Trombone",
    "Tuba",
    "Muted Trumpet",
    "French Horn",
    "Brass Section",
    "Synth Brass 1",
    "Synth Brass 2",
    // Reed
    "Soprano Sax",
    "Alto Sax",
    "Tenor Sax",
    "Baritone Sax",
    "Oboe",
    "English Horn",
    "Bassoon",
    "Clarinet",
    // Pipe
    "Piccolo",
    "Flute",
    "Recorder",
    "Pan Flute",
    "Blown bottle",
    "Shakuhachi",
    "Whistle",
    "Ocarina",
    // Synth lead
    "Lead 1 (square)",
    "Lead 2 (sawtooth)",
    "Lead 3 (calliope)",
    "Lead 4 chiff",
    "Lead 5 (charang)",
    "Lead 6 (voice)",
    "Lead 7 (fifths)",
    "Lead 8 (bass + lead)",
    // Synth pad
    "Pad 1 (new age)",
    "Pad 2 (warm)",
    "Pad 3 (polysynth)",
    "Pad 4 (choir)",
    "Pad 5 (bowed)",
    "Pad 6 (metallic)",
    "Pad 7 (halo)",
    "Pad 8 (sweep)",
    // Synth effects
    "FX 1 (rain)",
    "FX 2 (soundtrack)",
    "FX 3 (crystal)",
    "FX 4 (atmosphere)",
    "FX 5 (brightness)",
    "FX 6 (goblins)",
    "FX 7 (echoes)",
    "FX 8 (sci-fi)",
    // Ethnic
    "Sitar",
    "Banjo",
    "Shamisen",
    "Koto",
    "Kalimba",
    "Bagpipe",
    "Fiddle",
    "Shanai",
    // Percussive
    "Tinkle Bell",
    "Agogo",
    "Steel Drums",
    "Woodblock",
    "Taiko Drum",
    "Melodic Tom",
    "Synth Drum",
    "Reverse Cymbal",
    // Sound effects
    "Guitar Fret Noise",
    "Breath Noise",
    "Seashore",
    "Bird Tweet",
    "Telephone Ring",
    "Helicopter",
    "Applause",
    "Gunshot",
];

/// Instruments offered first in interactive pickers.
pub const FEATURED: [&str; 7] = [
    "Acoustic Grand Piano",
    "Bright Acoustic Piano",
    "Electric Guitar (clean)",
    "String Ensemble 1",
    "Church Organ",
    "Violin",
    "Trumpet",
];

/// Program number for an instrument name, if it is a General MIDI instrument.
pub fn program_for(name: &str) -> Option<u8> {
    let name = name.trim();
    GM_INSTRUMENTS
        .iter()
        .position(|candidate| candidate.eq_ignore_ascii_case(name))
        .map(|program| program as u8)
}

/// Name for a program number.
pub fn name_for(program: u8) -> Option<&'static str> {
    GM_INSTRUMENTS.get(program as usize).copied()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_featured_programs() {
        let programs: Vec<u8> = FEATURED.iter().map(|n| program_for(n).unwrap()).collect();
        assert_eq!(programs, vec![0, 1, 27, 48, 19, 40, 56]);
    }

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(program_for("  church organ "), Some(19));
        assert_eq!(program_for("GUNSHOT"), Some(127));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(program_for("Kazoo"), None);
        assert_eq!(program_for(""), None);
    }

    #[test]
    fn test_name_for() {
        assert_eq!(name_for(40), Some("Violin"));
        assert_eq!(name_for(128), None);
    }
}
