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

//! The time base shared by the renderer and everyone scheduling work for it.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Time measured in samples since the audio context was created.
pub type Sample = usize;

/// Monotonic clock counting the samples rendered so far.
///
/// Clones share the same position. Only the renderer advances it,
/// everybody else merely reads it to time-stamp their commands.
#[derive(Debug, Clone)]
pub struct AudioClock {
    sample_rate: f64,
    position: Arc<AtomicUsize>,
}

impl AudioClock {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            position: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The sample that will be rendered next.
    pub fn now(&self) -> Sample {
        self.position.load(Ordering::Acquire)
    }

    /// Rendered time in seconds.
    pub fn seconds(&self) -> f64 {
        self.now() as f64 / self.sample_rate
    }

    /// Convert a duration in seconds to samples, rounded to the closest sample.
    ///
    /// ```
    /// # use skalez_audio::clock::*;
    /// assert_eq!(AudioClock::new(44100.0).samples(0.1), 4410);
    /// ```
    pub fn samples(&self, seconds: f64) -> Sample {
        (seconds.max(0.0) * self.sample_rate).round() as Sample
    }

    pub(crate) fn advance(&self, samples: Sample) {
        self.position.fetch_add(samples, Ordering::Release);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn clones_share_the_position() {
        let clock = AudioClock::new(48000.0);
        let observer = clock.clone();
        clock.advance(24000);
        assert_eq!(observer.now(), 24000);
        assert_eq!(observer.seconds(), 0.5);
    }
}
