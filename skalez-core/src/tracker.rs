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

//! Feeding controller events into the note state, the history and an instrument.

use std::fmt;

use log::debug;

use crate::chord::{chord_for, ChordResult};
use crate::event::NoteEvent;
use crate::note::{Note, PitchClass, Velocity};
use crate::scale::{scales_for, ScaleCandidate};
use crate::state::{NoteHistory, NoteState};

/// Something that makes sound when keys are pressed.
///
/// Both calls must be cheap and must not fail: a misbehaving instrument
/// must never get in the way of tracking the notes.
pub trait Instrument {
    fn play_note(&mut self, note: Note, velocity: Velocity);

    fn release_note(&mut self, note: Note);
}

impl<I: Instrument + ?Sized> Instrument for &mut I {
    fn play_note(&mut self, note: Note, velocity: Velocity) {
        (**self).play_note(note, velocity)
    }

    fn release_note(&mut self, note: Note) {
        (**self).release_note(note)
    }
}

impl<I: Instrument + ?Sized> Instrument for Box<I> {
    fn play_note(&mut self, note: Note, velocity: Velocity) {
        (**self).play_note(note, velocity)
    }

    fn release_note(&mut self, note: Note) {
        (**self).release_note(note)
    }
}

/// The instrument that does not make a sound.
#[derive(Debug, Default, Clone, Copy)]
pub struct Silence;

impl Instrument for Silence {
    fn play_note(&mut self, _note: Note, _velocity: Velocity) {}

    fn release_note(&mut self, _note: Note) {}
}

/// Keeps track of the held and recorded notes and forwards key presses to an instrument.
pub struct NoteEventProcessor<I> {
    pressed: NoteState,
    history: NoteHistory,
    instrument: I,
}

impl<I: Instrument> NoteEventProcessor<I> {
    pub fn new(instrument: I) -> Self {
        Self {
            pressed: NoteState::new(),
            history: NoteHistory::new(),
            instrument,
        }
    }

    /// Process a raw three byte controller message.
    /// Returns the decoded event, which is `Ignored` for anything that is not a note.
    pub fn on_event(&mut self, status: u8, data1: u8, data2: u8) -> NoteEvent {
        let event = NoteEvent::decode(status, data1, data2);
        if event == NoteEvent::Ignored {
            debug!(
                "ignoring message {:02X} {:02X} {:02X}",
                status,
                data1,
                data2
            );
        }
        self.handle(event);
        event
    }

    /// Process a raw controller message of any length.
    pub fn on_message(&mut self, message: &[u8]) -> NoteEvent {
        match *message {
            [status, data1, data2] => self.on_event(status, data1, data2),
            _ => {
                debug!("ignoring {} byte message {:02X?}", message.len(), message);
                NoteEvent::Ignored
            }
        }
    }

    /// Apply an already decoded event.
    pub fn handle(&mut self, event: NoteEvent) {
        match event {
            NoteEvent::NoteOn { note, velocity } => {
                debug!("press {} with velocity {}", note, velocity.to_midi());
                let pitch = note.pitch_class();
                self.pressed = self.pressed.with(pitch, true);
                if let Some(history) = self.history.with(pitch) {
                    self.history = history;
                }
                self.instrument.play_note(note, velocity);
            }
            NoteEvent::NoteOff { note } => {
                debug!("release {}", note);
                self.pressed = self.pressed.with(note.pitch_class(), false);
                self.instrument.release_note(note);
            }
            NoteEvent::Ignored => {}
        }
    }

    /// Forget the recorded notes. Held notes and sounding voices are left alone.
    pub fn clear(&mut self) {
        debug!("clearing {} recorded notes", self.history.len());
        self.history = NoteHistory::new();
    }
}

impl<I> NoteEventProcessor<I> {
    pub fn pressed(&self) -> &NoteState {
        &self.pressed
    }

    pub fn history(&self) -> &NoteHistory {
        &self.history
    }

    /// Scales containing every recorded note.
    pub fn scales(&self) -> Vec<ScaleCandidate> {
        scales_for(self.history.pitch_set())
    }

    /// The chord formed by the held notes, rooted at the lowest held pitch class.
    pub fn chord(&self) -> ChordResult {
        let held: Vec<PitchClass> = self.pressed.pressed().collect();
        chord_for(&held)
    }

    /// Everything derived from the current state in one value.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pressed: self.pressed,
            history: self.history.clone(),
            scales: self.scales(),
            chord: self.chord(),
        }
    }

    pub fn instrument(&self) -> &I {
        &self.instrument
    }

    pub fn instrument_mut(&mut self) -> &mut I {
        &mut self.instrument
    }

    pub fn into_instrument(self) -> I {
        self.instrument
    }
}

/// A consistent view of the tracked and derived state, taken between two events.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Snapshot {
    pub pressed: NoteState,
    pub history: NoteHistory,
    pub scales: Vec<ScaleCandidate>,
    pub chord: ChordResult,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    if items.is_empty() {
        return f.write_str("-");
    }
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pressed: Vec<PitchClass> = self.pressed.pressed().collect();
        f.write_str("pressed:  ")?;
        write_list(f, &pressed, " ")?;
        f.write_str("\nrecorded: ")?;
        write_list(f, &self.history.sorted(), " ")?;
        writeln!(f, "\nchord:    {}", self.chord)?;
        f.write_str("scales:   ")?;
        write_list(f, &self.scales, ", ")
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scale::ScaleType;
    use expect_test::expect;

    /// Records the calls it receives.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl Instrument for Recorder {
        fn play_note(&mut self, note: Note, velocity: Velocity) {
            self.calls.push(format!("play {} {}", note, velocity.to_midi()));
        }

        fn release_note(&mut self, note: Note) {
            self.calls.push(format!("release {}", note));
        }
    }

    #[test]
    fn press_and_release_reach_the_instrument() {
        let mut processor = NoteEventProcessor::new(Recorder::default());
        processor.on_event(0x90, 60, 100);
        processor.on_event(0x90, 60, 0);
        processor.on_event(0x90, 61, 0);
        assert_eq!(
            processor.instrument().calls,
            vec!["play C4 100", "release C4", "release C#4"]
        );
    }

    #[test]
    fn irrelevant_messages_change_nothing() {
        let mut processor = NoteEventProcessor::new(Recorder::default());
        processor.on_event(0x90, 64, 90);
        let before = processor.snapshot();
        assert_eq!(processor.on_event(0xB0, 64, 127), NoteEvent::Ignored);
        assert_eq!(processor.on_event(0x80, 64, 0), NoteEvent::Ignored);
        assert_eq!(processor.on_event(0x90, 200, 1), NoteEvent::Ignored);
        assert_eq!(processor.on_message(&[0xF8]), NoteEvent::Ignored);
        assert_eq!(processor.snapshot(), before);
        assert_eq!(processor.instrument().calls.len(), 1);
    }

    #[test]
    fn history_survives_release_but_not_clear() {
        let mut processor = NoteEventProcessor::new(Silence);
        processor.on_event(0x90, 62, 80);
        processor.on_event(0x90, 62, 0);
        processor.on_event(0x90, 74, 80);
        assert_eq!(processor.history().in_press_order(), &[PitchClass::D]);
        processor.clear();
        assert!(processor.history().is_empty());
        assert!(processor.scales().is_empty());
        // Clearing keeps the held note
        assert!(processor.pressed().is_pressed(PitchClass::D));
    }

    #[test]
    fn scales_follow_the_history() {
        let mut processor = NoteEventProcessor::new(Silence);
        for note in &[60, 62, 64, 65, 67, 69, 71] {
            processor.on_event(0x90, *note, 100);
            processor.on_event(0x90, *note, 0);
        }
        let scales = processor.scales();
        assert_eq!(
            scales,
            vec![
                ScaleCandidate {
                    root: PitchClass::C,
                    scale: ScaleType::Major
                },
                ScaleCandidate {
                    root: PitchClass::A,
                    scale: ScaleType::Minor
                },
            ]
        );
        assert_eq!(processor.chord(), ChordResult::NoChord);
    }

    #[test]
    fn c_major_then_d() {
        let mut processor = NoteEventProcessor::new(Silence);
        for note in &[60, 64, 67] {
            processor.on_event(0x90, *note, 100);
        }
        expect![[r#"
            pressed:  C E G
            recorded: C E G
            chord:    C Major
            scales:   C major, F major, G major, D minor, E minor, A minor"#]]
        .assert_eq(&processor.snapshot().to_string());

        for note in &[60, 64, 67] {
            processor.on_event(0x90, *note, 0);
        }
        processor.on_event(0x90, 62, 100);
        expect![[r#"
            pressed:  D
            recorded: C D E G
            chord:    no chord
            scales:   C major, F major, G major, D minor, E minor, A minor"#]]
        .assert_eq(&processor.snapshot().to_string());
    }

    #[test]
    fn empty_snapshot() {
        let processor = NoteEventProcessor::new(Silence);
        expect![[r#"
            pressed:  -
            recorded: -
            chord:    no chord
            scales:   -"#]]
        .assert_eq(&processor.snapshot().to_string());
    }
}
