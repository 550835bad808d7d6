// skalez -- a live scale and chord finder for MIDI keyboards
// Copyright (C) 2021  Fabian Thorand
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Naming the chord formed by the held notes.

use std::fmt;

use crate::note::PitchClass;

/// A named chord, given by the intervals of its notes above the root.
#[derive(Debug, Eq, PartialEq, Hash)]
pub struct ChordDefinition {
    pub name: &'static str,
    pub intervals: &'static [u8],
}

impl ChordDefinition {
    /// Whether every interval of `intervals` is part of this chord.
    pub fn includes(&self, intervals: &[u8]) -> bool {
        intervals
            .iter()
            .all(|interval| self.intervals.contains(interval))
    }
}

macro_rules! chord {
    ($name:expr, [$($interval:expr),*]) => {
        ChordDefinition { name: $name, intervals: &[$($interval),*] }
    };
}

/// Known chords, searched front to back.
///
/// The first chord including all held intervals wins, so the order decides between
/// ambiguous matches. "Half-Diminished 7th" and "Minor 7th Flat 5" have the same intervals
/// and the former always wins. Intervals above an octave can never be held since
/// intervals are taken modulo 12, they only make those entries broader.
pub const CHORD_DEFINITIONS: &[ChordDefinition] = &[
    chord!("Major", [4, 7]),
    chord!("Minor", [3, 7]),
    chord!("Diminished", [3, 6]),
    chord!("Augmented", [4, 8]),
    chord!("6th", [5, 9]),
    chord!("Major 7th", [4, 7, 11]),
    chord!("Minor 7th", [3, 7, 10]),
    chord!("Dominant 7th", [4, 7, 10]),
    chord!("Suspended 4th", [5, 7]),
    chord!("Suspended 2nd", [2, 7]),
    chord!("Minor 6th", [3, 8]),
    chord!("Major 6th", [4, 9]),
    chord!("Major 9th", [4, 7, 11, 14]),
    chord!("Minor 9th", [3, 7, 10, 14]),
    chord!("Dominant 9th", [4, 7, 10, 14]),
    chord!("Major 13th", [4, 7, 11, 14, 17]),
    chord!("Minor 13th", [3, 7, 10, 14, 17]),
    chord!("Dominant 13th", [4, 7, 10, 14, 17]),
    chord!("Augmented 7th", [4, 8, 10]),
    chord!("Diminished 7th", [3, 6, 9]),
    chord!("Half-Diminished 7th", [3, 6, 10]),
    chord!("Minor Major 7th", [3, 7, 11]),
    chord!("Augmented Major 7th", [4, 8, 11]),
    chord!("Flat 5", [4, 6]),
    chord!("Augmented 9th", [4, 8, 14]),
    chord!("Flat 9", [4, 7, 10, 13]),
    chord!("Minor 7th Flat 5", [3, 6, 10]),
    chord!("Sharp 11", [4, 7, 11, 18]),
];

/// Outcome of naming the held notes.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ChordResult {
    /// Fewer than two notes are held.
    NoChord,
    /// Two or more notes are held, but no known chord includes them.
    Unknown,
    Named {
        root: PitchClass,
        definition: &'static ChordDefinition,
    },
}

impl ChordResult {
    pub fn is_named(&self) -> bool {
        matches!(self, ChordResult::Named { .. })
    }
}

impl fmt::Display for ChordResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChordResult::NoChord => f.write_str("no chord"),
            ChordResult::Unknown => f.write_str("Unknown chord"),
            ChordResult::Named { root, definition } => write!(f, "{} {}", root, definition.name),
        }
    }
}

/// Name the chord formed by `pressed`.
///
/// The first element is taken as the root. The intervals of all other notes above it
/// are looked up in [`CHORD_DEFINITIONS`].
///
/// # Examples
///
/// ```
/// use skalez_core::chord::*;
/// use skalez_core::note::*;
///
/// let c_e_g = [Note::from_midi(60), Note::from_midi(64), Note::from_midi(67)];
/// assert_eq!(chord_for(&c_e_g).to_string(), "C Major");
/// assert_eq!(chord_for(&c_e_g[..1]), ChordResult::NoChord);
/// ```
pub fn chord_for<P: Copy + Into<PitchClass>>(pressed: &[P]) -> ChordResult {
    let (root, rest): (PitchClass, &[P]) = match pressed {
        [root, rest @ ..] if !rest.is_empty() => ((*root).into(), rest),
        _ => return ChordResult::NoChord,
    };
    let mut intervals: Vec<u8> = rest
        .iter()
        .map(|note| {
            let pitch: PitchClass = (*note).into();
            pitch.interval_from(root)
        })
        .collect();
    intervals.sort_unstable();

    CHORD_DEFINITIONS
        .iter()
        .find(|definition| definition.includes(&intervals))
        .map_or(ChordResult::Unknown, |definition| ChordResult::Named {
            root,
            definition,
        })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::note::Note;

    fn name(pitches: &[PitchClass]) -> String {
        chord_for(pitches).to_string()
    }

    #[test]
    fn fewer_than_two_notes() {
        assert_eq!(chord_for::<PitchClass>(&[]), ChordResult::NoChord);
        assert_eq!(chord_for(&[PitchClass::D]), ChordResult::NoChord);
    }

    #[test]
    fn triads() {
        use crate::note::PitchClass as P;
        assert_eq!(name(&[P::C, P::E, P::G]), "C Major");
        assert_eq!(name(&[P::A, P::C, P::E]), "A Minor");
        assert_eq!(name(&[P::B, P::D, P::F]), "B Diminished");
        assert_eq!(name(&[P::C, P::E, P::G_SHARP]), "C Augmented");
        assert_eq!(name(&[P::D, P::G, P::A]), "D Suspended 4th");
    }

    #[test]
    fn partial_chords_match_the_first_superset() {
        use crate::note::PitchClass as P;
        // A lone third is enough for "Major"
        assert_eq!(name(&[P::C, P::E]), "C Major");
        assert_eq!(name(&[P::C, P::D]), "C Suspended 2nd");
        // An A minor triad read from C upwards
        assert_eq!(name(&[P::C, P::E, P::A]), "C Major 6th");
    }

    #[test]
    fn table_order_decides_ambiguities() {
        use crate::note::PitchClass as P;
        assert_eq!(name(&[P::C, P::D_SHARP, P::F_SHARP, P::A_SHARP]), "C Half-Diminished 7th");
        assert_eq!(name(&[P::C, P::D_SHARP, P::F_SHARP, P::A]), "C Diminished 7th");
        assert_eq!(name(&[P::C, P::E, P::G, P::A_SHARP]), "C Dominant 7th");
    }

    #[test]
    fn unknown_is_not_no_chord() {
        use crate::note::PitchClass as P;
        let cluster = chord_for(&[P::C, P::C_SHARP, P::D]);
        assert_eq!(cluster, ChordResult::Unknown);
        assert_ne!(cluster, ChordResult::NoChord);
        assert_eq!(cluster.to_string(), "Unknown chord");
    }

    #[test]
    fn raw_notes_reduce_to_pitch_classes() {
        let spread = [Note::from_midi(48), Note::from_midi(76), Note::from_midi(91)];
        assert_eq!(chord_for(&spread).to_string(), "C Major");
        // The same pitch class twice is an interval of zero, which no chord has
        let octave = [Note::from_midi(60), Note::from_midi(72)];
        assert_eq!(chord_for(&octave), ChordResult::Unknown);
    }

    #[test]
    fn table_order_is_kept() {
        let names: Vec<&str> = CHORD_DEFINITIONS.iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 28);
        assert_eq!(names[0], "Major");
        assert_eq!(names[20], "Half-Diminished 7th");
        assert_eq!(names[26], "Minor 7th Flat 5");
        assert_eq!(names[27], "Sharp 11");
    }
}
