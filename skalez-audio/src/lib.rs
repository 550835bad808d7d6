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

//! Sound for skalez: a small polyphonic synthesizer rendered sample by sample.
//!
//! [`poly::PolySynth`] decides which voices sound and how loud; it talks to a
//! [`engine::Renderer`] through the time-stamped commands of an [`context::AudioContext`].

pub mod clock;
pub mod context;
pub mod engine;
pub mod error;
pub mod param;
pub mod params;
pub mod poly;
pub mod sox;

// Signal processing
pub mod compressor;
pub mod filter;
pub mod oscillator;
pub mod tuning;
pub mod util;
pub mod wave;
