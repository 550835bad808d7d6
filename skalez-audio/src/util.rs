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

//! Unit conversions that I don't know where to put else

/// Compute a frequency factor measured in semitones (one octave consists of 12 semitones)
///
/// # Example
///
/// ```
/// # use skalez_audio::util::*;
///
/// assert_eq!(from_semitones(12.0), 2.0);
/// assert_eq!(from_semitones(-24.0), 0.25);
/// ```
pub fn from_semitones(semitones: f64) -> f64 {
    2.0f64.powf(semitones / 12.0)
}

/// Convert an amplitude level measured in decibels to a linear factor.
///
/// # Example
///
/// ```
/// # use skalez_audio::util::*;
///
/// assert_eq!(from_decibels(0.0), 1.0);
/// assert_eq!(from_decibels(-40.0), 0.01);
/// ```
pub fn from_decibels(decibels: f64) -> f64 {
    10.0f64.powf(decibels / 20.0)
}

/// Convert a linear amplitude to decibels. Silence is clamped to -200 dB.
///
/// # Example
///
/// ```
/// # use skalez_audio::util::*;
///
/// assert_eq!(to_decibels(10.0), 20.0);
/// assert_eq!(to_decibels(0.0), -200.0);
/// ```
pub fn to_decibels(amplitude: f64) -> f64 {
    20.0 * amplitude.abs().max(1e-10).log10()
}
