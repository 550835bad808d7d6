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

use crate::compressor::CompressorParams;
use crate::filter::BiquadType;
use crate::oscillator::WaveShape;
use crate::tuning::Tuning;

/// The signal chain shared by all voices.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainParams {
    pub wave_shape: WaveShape,
    pub filter: BiquadType,
    pub compressor: CompressorParams,
}

impl Default for ChainParams {
    fn default() -> Self {
        Self {
            wave_shape: WaveShape::Triangle,
            filter: BiquadType::butterworth_lowpass(1500.0),
            compressor: CompressorParams::default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SynthParams {
    pub sample_rate: f64,
    /// Samples rendered at once by the realtime context.
    pub buffer_size: usize,
    /// Sum of the gains of all held voices.
    pub headroom: f64,
    /// Duration of the fade out after a key is released, in seconds.
    pub release_seconds: f64,
    /// Gain at the end of the fade out.
    pub release_floor: f64,
    pub tuning: Tuning,
    pub chain: ChainParams,
}

impl Default for SynthParams {
    fn default() -> Self {
        Self {
            sample_rate: 44100.0,
            buffer_size: 441,
            headroom: 0.95,
            release_seconds: 0.1,
            release_floor: 0.001,
            tuning: Tuning::default(),
            chain: ChainParams::default(),
        }
    }
}
