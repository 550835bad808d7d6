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

//! Per-voice tone shaping.

/// The kinds of filter a voice can be sent through.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BiquadType {
    /// The identity filter that lets the signal pass unchanged.
    Allpass,
    /// Lowpass filter with the given cutoff frequency and Q factor (controls resonance)
    Lowpass { cutoff: f64, q: f64 },
}

impl BiquadType {
    /// A lowpass without resonance peak.
    pub fn butterworth_lowpass(cutoff: f64) -> Self {
        BiquadType::Lowpass {
            cutoff,
            q: std::f64::consts::FRAC_1_SQRT_2,
        }
    }

    pub fn to_coefficients(&self, sample_rate: f64) -> BiquadCoefficients {
        match self {
            BiquadType::Allpass => BiquadCoefficients::allpass(),
            BiquadType::Lowpass { cutoff, q } => {
                BiquadCoefficients::lowpass(sample_rate, *cutoff, *q)
            }
        }
    }
}

/// Filter coefficients for a biquadratic filter,
/// based on https://www.w3.org/2011/audio/audio-eq-cookbook.html.
#[derive(Debug, Clone, PartialEq)]
pub struct BiquadCoefficients {
    pub b0: f64,
    pub b1: f64,
    pub b2: f64,
    pub a1: f64,
    pub a2: f64,
}

impl BiquadCoefficients {
    pub fn allpass() -> Self {
        Self {
            b0: 1.0,
            b1: 0.0,
            b2: 0.0,
            a1: 0.0,
            a2: 0.0,
        }
    }

    /// Lowpass filter with the given cutoff frequency and Q factor.
    /// Cutoffs at or above Nyquist are clamped just below it.
    pub fn lowpass(sample_rate: f64, cutoff: f64, q: f64) -> Self {
        let cutoff = cutoff.min(sample_rate * 0.499).max(1.0);
        let omega0 = 2.0 * std::f64::consts::PI * cutoff / sample_rate;
        let (sin_omega, cos_omega) = omega0.sin_cos();
        let alpha = sin_omega / (2.0 * q);
        let a0_inv = 1.0 / (1.0 + alpha);
        let b1 = a0_inv * (1.0 - cos_omega);
        Self {
            b0: b1 / 2.0,
            b1,
            b2: b1 / 2.0,
            a1: a0_inv * (-2.0 * cos_omega),
            a2: a0_inv * (1.0 - alpha),
        }
    }
}

/// Delay line of a biquad filter. The coefficients are passed on every step
/// so that all voices can share one set.
#[derive(Debug, Clone, Default)]
pub struct Biquad {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl Biquad {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next value through the filter using the given coefficients.
    pub fn step(&mut self, c: &BiquadCoefficients, input: f64) -> f64 {
        let output =
            c.b0 * input + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;
        output
    }
}
