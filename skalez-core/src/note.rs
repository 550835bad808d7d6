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

//! Definitions of what a note is, and of the pitch class it belongs to.

use std::fmt;

/// Canonical names of the twelve pitch classes, indexed by pitch class.
pub const PITCH_CLASS_NAMES: [&str; 12] = [
    "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B",
];

/// One of the twelve notes of an octave, independent of the octave it is played in.
///
/// Pitch classes are ordered from C to B.
///
/// # Examples
///
/// ```
/// use skalez_core::note::*;
///
/// assert_eq!(PitchClass::new(1).name(), "C#");
/// assert_eq!(PitchClass::from(Note::from_midi(64)), PitchClass::E);
/// assert!(PitchClass::C < PitchClass::B);
/// ```
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PitchClass(u8);

impl PitchClass {
    pub const C: PitchClass = PitchClass(0);
    pub const C_SHARP: PitchClass = PitchClass(1);
    pub const D: PitchClass = PitchClass(2);
    pub const D_SHARP: PitchClass = PitchClass(3);
    pub const E: PitchClass = PitchClass(4);
    pub const F: PitchClass = PitchClass(5);
    pub const F_SHARP: PitchClass = PitchClass(6);
    pub const G: PitchClass = PitchClass(7);
    pub const G_SHARP: PitchClass = PitchClass(8);
    pub const A: PitchClass = PitchClass(9);
    pub const A_SHARP: PitchClass = PitchClass(10);
    pub const B: PitchClass = PitchClass(11);

    /// All pitch classes in index order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass(0),
        PitchClass(1),
        PitchClass(2),
        PitchClass(3),
        PitchClass(4),
        PitchClass(5),
        PitchClass(6),
        PitchClass(7),
        PitchClass(8),
        PitchClass(9),
        PitchClass(10),
        PitchClass(11),
    ];

    /// The pitch class `semitones` above C, wrapping around at the octave.
    pub fn new(semitones: u8) -> PitchClass {
        PitchClass(semitones % 12)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn name(self) -> &'static str {
        PITCH_CLASS_NAMES[self.index()]
    }

    /// Transpose upwards by the given interval, wrapping around at the octave.
    pub fn transpose(self, semitones: u8) -> PitchClass {
        PitchClass::new((self.0 + semitones % 12) % 12)
    }

    /// The interval in semitones from `root` up to this pitch class, in `0..12`.
    pub fn interval_from(self, root: PitchClass) -> u8 {
        (self.0 + 12 - root.0) % 12
    }
}

impl From<Note> for PitchClass {
    fn from(note: Note) -> Self {
        note.pitch_class()
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of pitch classes, stored as a 12 bit mask.
///
/// Iteration yields the members in pitch class order.
///
/// # Examples
///
/// ```
/// use skalez_core::note::*;
///
/// let triad: PitchSet = vec![PitchClass::G, PitchClass::C, PitchClass::E].into_iter().collect();
/// assert_eq!(triad.len(), 3);
/// assert_eq!(triad.iter().collect::<Vec<_>>(), vec![PitchClass::C, PitchClass::E, PitchClass::G]);
/// assert!(triad.is_subset(PitchSet::chromatic()));
/// ```
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash)]
pub struct PitchSet(u16);

impl PitchSet {
    pub const EMPTY: PitchSet = PitchSet(0);

    /// The set of all twelve pitch classes.
    pub fn chromatic() -> PitchSet {
        PitchSet(0x0fff)
    }

    pub fn with(self, pitch: PitchClass) -> PitchSet {
        PitchSet(self.0 | (1 << pitch.0))
    }

    pub fn without(self, pitch: PitchClass) -> PitchSet {
        PitchSet(self.0 & !(1 << pitch.0))
    }

    pub fn contains(self, pitch: PitchClass) -> bool {
        self.0 & (1 << pitch.0) != 0
    }

    /// Whether every member of `self` is also a member of `other`.
    pub fn is_subset(self, other: PitchSet) -> bool {
        self.0 & !other.0 == 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = PitchClass> {
        PitchClass::ALL
            .iter()
            .copied()
            .filter(move |pitch| self.contains(*pitch))
    }
}

impl std::iter::FromIterator<PitchClass> for PitchSet {
    fn from_iter<I: IntoIterator<Item = PitchClass>>(iter: I) -> Self {
        iter.into_iter().fold(PitchSet::EMPTY, PitchSet::with)
    }
}

/// A "note" is just an index on the keyboard of the controller.
/// This definition follows the MIDI standard where C4 corresponds to index 60.
///
/// Distinct notes may share a pitch class when they are octaves apart.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Note(u8);

/// The name of a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteName {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

/// Any accidental applied to a note in standard notation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Accidental {
    /// The note is a half-tone lower then indicated by its name.
    Flat,
    /// The note is left unchanged.
    Base,
    /// The note is a half-tone higher then indicated by its name.
    Sharp,
}

impl Note {
    /// Convert a note from standard notation to a MIDI note index.
    /// Note that different names may refer to the same note, e.g. a G♯ is the same as a A♭.
    /// Returns `None` if the note is not representable in the MIDI note system.
    ///
    /// # Examples
    ///
    /// ```
    /// use skalez_core::note::*;
    ///
    /// assert_eq!(Note::try_named(NoteName::A, Accidental::Base, 4), Some(Note::from_midi(69)));
    /// assert_eq!(Note::try_named(NoteName::C, Accidental::Sharp, 6), Some(Note::from_midi(85)));
    /// assert_eq!(Note::try_named(NoteName::G, Accidental::Flat, 2), Some(Note::from_midi(42)));
    /// assert_eq!(Note::try_named(NoteName::G, Accidental::Base, 10), None);
    /// ```
    pub fn try_named(name: NoteName, accidental: Accidental, octave: i32) -> Option<Note> {
        let name_index = match name {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        };
        let accidental_index = match accidental {
            Accidental::Base => 0,
            Accidental::Flat => -1,
            Accidental::Sharp => 1,
        };
        // C4 is MIDI note number 60
        let normalize_index = 60 - 4 * 12;
        let note_index = octave
            .checked_mul(12)?
            .checked_add(name_index + accidental_index + normalize_index)?;
        Note::try_from_midi(note_index as i64)
    }

    /// Parse a name string of the format `<letter><accidental><octave>`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use skalez_core::note::*;
    ///
    /// assert_eq!(Note::named_str("A4"), Some(Note::from_midi(69)));
    /// assert_eq!(Note::named_str("a4"), Some(Note::from_midi(69)));
    /// assert_eq!(Note::named_str("Csharp6"), Some(Note::from_midi(85)));
    /// assert_eq!(Note::named_str("C♯6"), Some(Note::from_midi(85)));
    /// assert_eq!(Note::named_str("Gb2"), Some(Note::from_midi(42)));
    /// assert_eq!(Note::named_str("C-1"), Some(Note::from_midi(0)));
    /// assert_eq!(Note::named_str("H2"), None);
    /// ```
    pub fn named_str(name_str: &str) -> Option<Note> {
        let mut name_chars = name_str.chars();
        let name_ch = name_chars.next()?;
        let name = match name_ch.to_ascii_uppercase() {
            'A' => NoteName::A,
            'B' => NoteName::B,
            'C' => NoteName::C,
            'D' => NoteName::D,
            'E' => NoteName::E,
            'F' => NoteName::F,
            'G' => NoteName::G,
            _ => return None,
        };

        let accidental_str = name_chars
            .as_str()
            .trim_end_matches(|ch: char| ch.is_ascii_digit() || ch == '-');
        let accidental = match accidental_str {
            "sharp" | "♯" | "#" => Accidental::Sharp,
            "flat" | "♭" | "b" => Accidental::Flat,
            "" => Accidental::Base,
            _ => return None,
        };

        let octave_str = &name_chars.as_str()[accidental_str.len()..];
        let octave = octave_str.parse().ok()?;
        Note::try_named(name, accidental, octave)
    }

    pub fn from_midi(midi_note: u8) -> Note {
        assert!(midi_note < 128, "MIDI only has notes 0 - 127");
        Note(midi_note)
    }

    pub fn try_from_midi(midi_note: i64) -> Option<Note> {
        if (0..128).contains(&midi_note) {
            Some(Note(midi_note as u8))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    /// Return the note index in a signed type, convenient for further calculations.
    pub fn index(self) -> i32 {
        self.0 as i32
    }

    pub fn pitch_class(self) -> PitchClass {
        PitchClass::new(self.0)
    }

    /// The octave in scientific pitch notation, where C4 is MIDI note 60.
    pub fn octave(self) -> i32 {
        self.index() / 12 - 1
    }
}

/// Notes are displayed in scientific pitch notation, always spelled with sharps.
///
/// ```
/// # use skalez_core::note::*;
/// assert_eq!(Note::from_midi(61).to_string(), "C#4");
/// assert_eq!(Note::from_midi(0).to_string(), "C-1");
/// ```
impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.pitch_class(), self.octave())
    }
}

/// The velocity of a voice indicates how hard/fast the key was pressed down.
/// Kept in the MIDI range of 0 to 127 inclusive.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Velocity(u8);

impl Velocity {
    pub const MAX: Velocity = Velocity(127);
    pub const MIN: Velocity = Velocity(0);

    pub fn try_from_midi(velocity: u8) -> Option<Velocity> {
        if velocity < 128 {
            Some(Velocity(velocity))
        } else {
            None
        }
    }

    pub fn to_midi(self) -> u8 {
        self.0
    }

    /// The velocity as a linear gain between 0.0 and 1.0.
    ///
    /// ```
    /// # use skalez_core::note::*;
    /// assert_eq!(Velocity::MAX.as_f64(), 1.0);
    /// assert_eq!(Velocity::MIN.as_f64(), 0.0);
    /// ```
    pub fn as_f64(self) -> f64 {
        self.0 as f64 / 127.0
    }
}
