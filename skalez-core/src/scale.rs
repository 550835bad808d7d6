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

//! Finding the scales that contain a set of notes.

use std::fmt;

use crate::note::{PitchClass, PitchSet};

/// The kinds of scales that can be recognized.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum ScaleType {
    Major,
    Minor,
}

impl ScaleType {
    /// All scale types, in the order their candidates are reported.
    pub const ALL: [ScaleType; 2] = [ScaleType::Major, ScaleType::Minor];

    /// Semitones from the root of each scale degree.
    pub fn intervals(self) -> &'static [u8] {
        match self {
            ScaleType::Major => &[0, 2, 4, 5, 7, 9, 11],
            ScaleType::Minor => &[0, 2, 3, 5, 7, 8, 10],
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ScaleType::Major => "major",
            ScaleType::Minor => "minor",
        }
    }

    /// The pitch classes of this scale when started on `root`.
    ///
    /// ```
    /// use skalez_core::note::*;
    /// use skalez_core::scale::*;
    ///
    /// let a_minor = ScaleType::Minor.pitch_set(PitchClass::A);
    /// let c_major = ScaleType::Major.pitch_set(PitchClass::C);
    /// assert_eq!(a_minor, c_major);
    /// ```
    pub fn pitch_set(self, root: PitchClass) -> PitchSet {
        self.intervals()
            .iter()
            .map(|interval| root.transpose(*interval))
            .collect()
    }
}

impl fmt::Display for ScaleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scale that contains all the notes that were asked about.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ScaleCandidate {
    pub root: PitchClass,
    pub scale: ScaleType,
}

impl fmt::Display for ScaleCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.root, self.scale)
    }
}

/// Every scale that contains all of `active`, grouped by scale type and then ordered by root.
///
/// No notes at all match no scale, rather than every scale.
pub fn scales_for(active: PitchSet) -> Vec<ScaleCandidate> {
    if active.is_empty() {
        return Vec::new();
    }
    ScaleType::ALL
        .iter()
        .flat_map(|scale| {
            PitchClass::ALL.iter().map(move |root| ScaleCandidate {
                root: *root,
                scale: *scale,
            })
        })
        .filter(|candidate| active.is_subset(candidate.scale.pitch_set(candidate.root)))
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    fn set(pitches: &[PitchClass]) -> PitchSet {
        pitches.iter().copied().collect()
    }

    #[test]
    fn nothing_pressed_matches_nothing() {
        assert!(scales_for(PitchSet::EMPTY).is_empty());
    }

    #[test]
    fn single_note_is_in_seven_scales_of_each_type() {
        let found = scales_for(set(&[PitchClass::C]));
        assert_eq!(found.iter().filter(|c| c.scale == ScaleType::Major).count(), 7);
        assert_eq!(found.iter().filter(|c| c.scale == ScaleType::Minor).count(), 7);
    }

    #[test]
    fn chromatic_cluster_matches_nothing() {
        let cluster = set(&[PitchClass::C, PitchClass::C_SHARP, PitchClass::D]);
        assert!(scales_for(cluster).is_empty());
    }

    #[test]
    fn results_grouped_by_type_then_root() {
        let found = scales_for(set(&[PitchClass::C, PitchClass::E, PitchClass::G]));
        let rendered: Vec<String> = found.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec!["C major", "F major", "G major", "D minor", "E minor", "A minor"]
        );
    }

    /// Brute force cross check against every (root, type) combination.
    #[test]
    fn candidates_are_exactly_the_supersets() {
        for mask in 1u16..(1 << 12) {
            let active: PitchSet = PitchClass::ALL
                .iter()
                .copied()
                .filter(|p| mask & (1 << p.index()) != 0)
                .collect();
            let found = scales_for(active);
            for scale in ScaleType::ALL.iter() {
                for root in PitchClass::ALL.iter() {
                    let candidate = ScaleCandidate {
                        root: *root,
                        scale: *scale,
                    };
                    let contains_all = active
                        .iter()
                        .all(|pitch| scale.pitch_set(*root).contains(pitch));
                    assert_eq!(found.contains(&candidate), contains_all);
                }
            }
        }
    }
}
