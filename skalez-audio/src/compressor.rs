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

//! Dynamic range compression of the mixed voices.
//!
//! The static curve follows the usual soft-knee design: below `threshold - knee / 2`
//! the signal is untouched, above `threshold + knee / 2` levels grow by `1 / ratio`,
//! and in between a quadratic blends the two. The gain reduction is smoothed in dB
//! by a one-pole follower with separate attack and release times.

use crate::util::{from_decibels, to_decibels};

#[derive(Debug, Clone, PartialEq)]
pub struct CompressorParams {
    /// Level in dB above which the signal is compressed.
    pub threshold: f64,
    /// Width in dB of the soft transition around the threshold.
    pub knee: f64,
    /// Input dB change per output dB change above the threshold.
    pub ratio: f64,
    /// Seconds
    pub attack: f64,
    /// Seconds
    pub release: f64,
}

impl Default for CompressorParams {
    fn default() -> Self {
        Self {
            threshold: -30.0,
            knee: 40.0,
            ratio: 12.0,
            attack: 0.003,
            release: 0.25,
        }
    }
}

impl CompressorParams {
    /// Gain reduction in dB (zero or negative) for an input level in dB.
    ///
    /// ```
    /// # use skalez_audio::compressor::*;
    /// let params = CompressorParams::default();
    /// assert_eq!(params.gain_reduction(-60.0), 0.0);
    /// assert!((params.gain_reduction(0.0) + 27.5).abs() < 1e-9);
    /// ```
    pub fn gain_reduction(&self, level: f64) -> f64 {
        let over = level - self.threshold;
        let slope = 1.0 / self.ratio - 1.0;
        if 2.0 * over < -self.knee {
            0.0
        } else if 2.0 * over.abs() <= self.knee && self.knee > 0.0 {
            let into_knee = over + self.knee / 2.0;
            slope * into_knee * into_knee / (2.0 * self.knee)
        } else {
            slope * over
        }
    }
}

#[derive(Debug, Clone)]
pub struct Compressor {
    params: CompressorParams,
    attack_coeff: f64,
    release_coeff: f64,
    /// Smoothed gain reduction in dB
    envelope: f64,
}

impl Compressor {
    pub fn new(params: CompressorParams, sample_rate: f64) -> Self {
        let coefficient = |seconds: f64| {
            if seconds > 0.0 {
                (-1.0 / (seconds * sample_rate)).exp()
            } else {
                0.0
            }
        };
        Self {
            attack_coeff: coefficient(params.attack),
            release_coeff: coefficient(params.release),
            params,
            envelope: 0.0,
        }
    }

    pub fn params(&self) -> &CompressorParams {
        &self.params
    }

    /// Current gain reduction in dB.
    pub fn reduction(&self) -> f64 {
        self.envelope
    }

    pub fn step(&mut self, input: f64) -> f64 {
        let target = self.params.gain_reduction(to_decibels(input));
        let coeff = if target < self.envelope {
            self.attack_coeff
        } else {
            self.release_coeff
        };
        self.envelope = coeff * self.envelope + (1.0 - coeff) * target;
        input * from_decibels(self.envelope)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn quiet_signals_pass() {
        let mut compressor = Compressor::new(CompressorParams::default(), 44100.0);
        for i in 0..1000 {
            let x = if i % 2 == 0 { 0.001 } else { -0.001 };
            assert_eq!(compressor.step(x), x);
        }
    }

    #[test]
    fn loud_signals_are_reduced() {
        let mut compressor = Compressor::new(CompressorParams::default(), 44100.0);
        let mut last = 0.0;
        for _ in 0..44100 {
            last = compressor.step(0.95);
            assert!(last <= 0.95);
        }
        // Settled close to the static curve
        let expected = 0.95 * from_decibels(CompressorParams::default().gain_reduction(to_decibels(0.95)));
        assert!((last - expected).abs() < 1e-3);
        assert!(compressor.reduction() < -20.0);
    }

    #[test]
    fn knee_is_continuous() {
        let params = CompressorParams::default();
        let edge = params.threshold + params.knee / 2.0;
        let inside = params.gain_reduction(edge - 1e-9);
        let outside = params.gain_reduction(edge + 1e-9);
        assert!((inside - outside).abs() < 1e-6);
        assert_eq!(params.gain_reduction(params.threshold - params.knee / 2.0), 0.0);
    }

    #[test]
    fn release_recovers_slowly() {
        let mut compressor = Compressor::new(CompressorParams::default(), 44100.0);
        for _ in 0..4410 {
            compressor.step(1.0);
        }
        let compressed = compressor.reduction();
        // 10 ms of silence: far less than the 250 ms release
        for _ in 0..441 {
            compressor.step(0.0);
        }
        assert!(compressor.reduction() < compressed * 0.9);
        assert!(compressor.reduction() > compressed);
    }
}
