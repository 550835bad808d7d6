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

use std::fmt;
use std::str::FromStr;

/// Position within one period of a wave, always in `[0, 1)`.
#[derive(Debug, Copy, Clone)]
pub struct Phase(f64);

impl Phase {
    pub const ZERO: Phase = Phase(0.0);

    pub fn new(offset: f64) -> Phase {
        Phase(offset - offset.floor())
    }

    pub fn offset(self) -> f64 {
        self.0
    }

    pub fn step_frequency(self, frequency: f64, sample_rate: f64) -> Phase {
        Phase::new(self.0 + frequency / sample_rate)
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum WaveShape {
    Sine,
    Triangle,
    Saw,
    Rectangle,
}

impl WaveShape {
    /// Evaluate the wave at the given phase. All shapes stay within `[-1, 1]`.
    ///
    /// ```
    /// # use skalez_audio::oscillator::*;
    /// assert_eq!(WaveShape::Triangle.eval(Phase::new(0.25)), 1.0);
    /// assert_eq!(WaveShape::Triangle.eval(Phase::new(0.75)), -1.0);
    /// assert_eq!(WaveShape::Saw.eval(Phase::ZERO), -1.0);
    /// ```
    pub fn eval(self, phase: Phase) -> f64 {
        let offset = phase.offset();
        match self {
            WaveShape::Sine => (offset * 2.0 * std::f64::consts::PI).sin(),
            WaveShape::Triangle => {
                if offset < 0.25 {
                    4.0 * offset
                } else if offset < 0.75 {
                    2.0 - 4.0 * offset
                } else {
                    4.0 * offset - 4.0
                }
            }
            WaveShape::Saw => 2.0 * offset - 1.0,
            WaveShape::Rectangle => {
                if offset < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WaveShape::Sine => "sine",
            WaveShape::Triangle => "triangle",
            WaveShape::Saw => "saw",
            WaveShape::Rectangle => "rectangle",
        }
    }
}

impl fmt::Display for WaveShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for WaveShape {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(WaveShape::Sine),
            "triangle" => Ok(WaveShape::Triangle),
            "saw" => Ok(WaveShape::Saw),
            "rectangle" | "square" => Ok(WaveShape::Rectangle),
            other => Err(format!(
                "unknown wave shape {:?}, expected sine, triangle, saw or rectangle",
                other
            )),
        }
    }
}

/// An oscillator sampling a wave of some shape at a fixed sample rate.
#[derive(Debug)]
pub struct Oscillator {
    shape: WaveShape,
    sample_rate: f64,
    frequency: f64,
    phase: Phase,
}

impl Oscillator {
    pub fn new(shape: WaveShape, sample_rate: f64, frequency: f64) -> Self {
        Self {
            shape,
            sample_rate,
            frequency,
            phase: Phase::ZERO,
        }
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    pub fn next_sample(&mut self) -> f64 {
        let result = self.shape.eval(self.phase);
        self.phase = self.phase.step_frequency(self.frequency, self.sample_rate);
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn phase_wraps_around() {
        assert_eq!(Phase::new(1.25).offset(), 0.25);
        assert_eq!(Phase::new(-0.25).offset(), 0.75);
    }

    #[test]
    fn one_period_per_cycle() {
        // 4 samples per period: 0, peak, 0, trough
        let mut osc = Oscillator::new(WaveShape::Triangle, 4.0, 1.0);
        let samples: Vec<f64> = (0..5).map(|_| osc.next_sample()).collect();
        assert_eq!(samples, vec![0.0, 1.0, 0.0, -1.0, 0.0]);
    }

    #[test]
    fn parse_shapes() {
        assert_eq!("triangle".parse(), Ok(WaveShape::Triangle));
        assert_eq!("square".parse(), Ok(WaveShape::Rectangle));
        assert!("noise".parse::<WaveShape>().is_err());
    }
}
