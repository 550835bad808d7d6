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

//! Sample frames and the buffers handed to the output.

use std::ops;

/// A left and a right value, e.g. one frame of audio.
///
/// ```
/// use skalez_audio::wave::*;
///
/// let frame = Stereo::mono(0.25) + Stereo::new(0.5, -0.25);
/// assert_eq!(frame * 2.0, Stereo::new(1.5, 0.0));
/// ```
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Stereo<T> {
    pub left: T,
    pub right: T,
}

impl<T> Stereo<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn mono(mono: T) -> Self
    where
        T: Copy,
    {
        Self::new(mono, mono)
    }
}

impl<T: ops::Add> ops::Add for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn add(self, rhs: Self) -> Self::Output {
        Stereo {
            left: self.left + rhs.left,
            right: self.right + rhs.right,
        }
    }
}

impl<T: ops::Mul + Copy> ops::Mul<T> for Stereo<T> {
    type Output = Stereo<T::Output>;

    fn mul(self, rhs: T) -> Self::Output {
        Stereo {
            left: self.left * rhs,
            right: self.right * rhs,
        }
    }
}

/// A fixed number of stereo frames.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<Stereo<f64>>,
}

#[allow(clippy::len_without_is_empty)]
impl AudioBuffer {
    pub fn new(sample_count: usize) -> Self {
        Self {
            samples: vec![Stereo::default(); sample_count],
        }
    }

    /// Size of the buffer in samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Size of the buffer in bytes when written as interleaved `f64`.
    pub fn byte_len(&self) -> usize {
        self.len() * 2 * std::mem::size_of::<f64>()
    }

    pub fn samples(&self) -> &[Stereo<f64>] {
        &self.samples
    }

    pub fn samples_mut(&mut self) -> &mut [Stereo<f64>] {
        &mut self.samples
    }

    /// Write the samples as little endian `f64`, left before right.
    ///
    /// Returns the number of samples that fit into `bytes`.
    pub fn copy_bytes_to(&self, bytes: &mut [u8]) -> usize {
        let mut processed = 0;
        for (sample, target) in self.samples.iter().zip(bytes.chunks_exact_mut(16)) {
            target[0..8].copy_from_slice(&sample.left.to_le_bytes());
            target[8..16].copy_from_slice(&sample.right.to_le_bytes());
            processed += 1;
        }
        processed
    }
}
