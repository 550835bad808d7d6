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

//! Decoding of raw controller messages into note events.

use crate::note::{Note, Velocity};

/// Upper nibble of a note-on status byte. The lower nibble is the channel.
pub const NOTE_ON: u8 = 0x90;

/// A controller message after validation.
///
/// Anything that is not a well-formed note-on message is `Ignored`.
/// Controllers send plenty of those (clock, active sensing, control changes),
/// so ignoring them is not an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum NoteEvent {
    NoteOn { note: Note, velocity: Velocity },
    /// A note-on with velocity zero, which is how controllers release a key.
    NoteOff { note: Note },
    Ignored,
}

impl NoteEvent {
    /// Decode a three byte message.
    ///
    /// # Examples
    ///
    /// ```
    /// use skalez_core::event::*;
    /// use skalez_core::note::*;
    ///
    /// let c4 = Note::from_midi(60);
    /// assert_eq!(
    ///     NoteEvent::decode(0x90, 60, 100),
    ///     NoteEvent::NoteOn { note: c4, velocity: Velocity::try_from_midi(100).unwrap() }
    /// );
    /// assert_eq!(NoteEvent::decode(0x90, 60, 0), NoteEvent::NoteOff { note: c4 });
    /// assert_eq!(NoteEvent::decode(0xB0, 7, 127), NoteEvent::Ignored);
    /// ```
    pub fn decode(status: u8, data1: u8, data2: u8) -> NoteEvent {
        if status & 0xF0 != NOTE_ON {
            return NoteEvent::Ignored;
        }
        // Data bytes never have the high bit set
        let note = match Note::try_from_midi(data1 as i64) {
            Some(note) => note,
            None => return NoteEvent::Ignored,
        };
        match Velocity::try_from_midi(data2) {
            Some(Velocity::MIN) => NoteEvent::NoteOff { note },
            Some(velocity) => NoteEvent::NoteOn { note, velocity },
            None => NoteEvent::Ignored,
        }
    }

    /// Decode a message of arbitrary length. Messages of any length other than three are ignored.
    pub fn from_bytes(message: &[u8]) -> NoteEvent {
        match *message {
            [status, data1, data2] => NoteEvent::decode(status, data1, data2),
            _ => NoteEvent::Ignored,
        }
    }

    /// The note this event refers to, if any.
    pub fn note(self) -> Option<Note> {
        match self {
            NoteEvent::NoteOn { note, .. } | NoteEvent::NoteOff { note } => Some(note),
            NoteEvent::Ignored => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn note_on_on_every_channel() {
        for channel in 0..16 {
            assert_eq!(
                NoteEvent::decode(NOTE_ON | channel, 64, 1).note(),
                Some(Note::from_midi(64))
            );
        }
    }

    #[test]
    fn other_status_bytes_are_ignored() {
        for status in 0..=255u8 {
            if status & 0xF0 == NOTE_ON {
                continue;
            }
            assert_eq!(NoteEvent::decode(status, 60, 100), NoteEvent::Ignored);
        }
        // Explicit note-off messages are not part of the accepted vocabulary
        assert_eq!(NoteEvent::decode(0x80, 60, 64), NoteEvent::Ignored);
    }

    #[test]
    fn malformed_data_is_ignored() {
        assert_eq!(NoteEvent::decode(0x90, 128, 100), NoteEvent::Ignored);
        assert_eq!(NoteEvent::decode(0x90, 60, 200), NoteEvent::Ignored);
        assert_eq!(NoteEvent::from_bytes(&[0x90, 60]), NoteEvent::Ignored);
        assert_eq!(NoteEvent::from_bytes(&[]), NoteEvent::Ignored);
        assert_eq!(NoteEvent::from_bytes(&[0x90, 60, 1, 2]), NoteEvent::Ignored);
    }
}
