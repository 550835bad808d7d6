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

//! Immutable snapshots of which notes are held and which were held since the last clear.
//!
//! Updates never modify a snapshot in place, they return the next one.

use crate::note::{PitchClass, PitchSet};

/// Press state of each of the twelve pitch classes.
///
/// All octaves of a pitch class share one slot, and the latest event wins:
/// releasing one C while another C is still held clears the slot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct NoteState {
    pressed: [bool; 12],
}

impl NoteState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state after a press or release of `pitch`.
    pub fn with(self, pitch: PitchClass, pressed: bool) -> NoteState {
        let mut next = self;
        next.pressed[pitch.index()] = pressed;
        next
    }

    pub fn is_pressed(&self, pitch: PitchClass) -> bool {
        self.pressed[pitch.index()]
    }

    /// The pressed pitch classes from C to B.
    pub fn pressed(&self) -> impl Iterator<Item = PitchClass> + '_ {
        PitchClass::ALL
            .iter()
            .copied()
            .filter(move |pitch| self.is_pressed(*pitch))
    }

    pub fn pitch_set(&self) -> PitchSet {
        self.pressed().collect()
    }

    /// Every pitch class together with its press state, from C to B.
    pub fn entries(&self) -> impl Iterator<Item = (PitchClass, bool)> + '_ {
        PitchClass::ALL
            .iter()
            .map(move |pitch| (*pitch, self.is_pressed(*pitch)))
    }

    pub fn is_empty(&self) -> bool {
        !self.pressed.iter().any(|pressed| *pressed)
    }
}

/// The pitch classes pressed since the last clear, in the order they were first pressed.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct NoteHistory {
    /// First-press order, no duplicates.
    order: Vec<PitchClass>,
}

impl NoteHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// The history after `pitch` was pressed.
    /// Returns `None` when the pitch class was already recorded and nothing changes.
    pub fn with(&self, pitch: PitchClass) -> Option<NoteHistory> {
        if self.contains(pitch) {
            return None;
        }
        let mut order = Vec::with_capacity(self.order.len() + 1);
        order.extend_from_slice(&self.order);
        order.push(pitch);
        Some(NoteHistory { order })
    }

    pub fn contains(&self, pitch: PitchClass) -> bool {
        self.order.contains(&pitch)
    }

    /// Recorded pitch classes in the order they were first pressed.
    pub fn in_press_order(&self) -> &[PitchClass] {
        &self.order
    }

    /// Recorded pitch classes from C to B, the order used for display.
    pub fn sorted(&self) -> Vec<PitchClass> {
        self.pitch_set().iter().collect()
    }

    pub fn pitch_set(&self) -> PitchSet {
        self.order.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn updates_leave_the_old_snapshot_alone() {
        let before = NoteState::new();
        let after = before.with(PitchClass::E, true);
        assert!(before.is_empty());
        assert!(after.is_pressed(PitchClass::E));
        assert_eq!(after.with(PitchClass::E, false), before);
    }

    #[test]
    fn pressed_in_pitch_class_order() {
        let state = NoteState::new()
            .with(PitchClass::G, true)
            .with(PitchClass::C, true)
            .with(PitchClass::E, true);
        assert_eq!(
            state.pressed().collect::<Vec<_>>(),
            vec![PitchClass::C, PitchClass::E, PitchClass::G]
        );
        assert_eq!(state.entries().filter(|(_, pressed)| *pressed).count(), 3);
        assert_eq!(state.entries().count(), 12);
    }

    #[test]
    fn octaves_share_a_slot() {
        // C4 and C5 pressed, C5 released: the slot is cleared although C4 is still down.
        let state = NoteState::new()
            .with(PitchClass::C, true)
            .with(PitchClass::C, true)
            .with(PitchClass::C, false);
        assert!(!state.is_pressed(PitchClass::C));
    }

    #[test]
    fn history_records_first_presses_only() {
        let history = NoteHistory::new();
        let history = history.with(PitchClass::G).unwrap();
        let history = history.with(PitchClass::C).unwrap();
        assert_eq!(history.with(PitchClass::G), None);
        assert_eq!(history.in_press_order(), &[PitchClass::G, PitchClass::C]);
        assert_eq!(history.sorted(), vec![PitchClass::C, PitchClass::G]);
        assert_eq!(history.len(), 2);
    }
}
