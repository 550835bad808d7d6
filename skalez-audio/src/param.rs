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

//! Sample accurate automation of a single value, such as the gain of a voice.

use crate::clock::Sample;

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum ParamEvent {
    /// Jump to `value` at `at`.
    SetValue { value: f64, at: Sample },
    /// Glide exponentially from the previous event to reach `value` at `at`.
    ExponentialRamp { value: f64, at: Sample },
}

impl ParamEvent {
    pub fn at(&self) -> Sample {
        match self {
            ParamEvent::SetValue { at, .. } | ParamEvent::ExponentialRamp { at, .. } => *at,
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            ParamEvent::SetValue { value, .. } | ParamEvent::ExponentialRamp { value, .. } => {
                *value
            }
        }
    }
}

/// A value changing over time according to a timeline of events.
///
/// ```
/// use skalez_audio::param::*;
///
/// let mut gain = AudioParam::new(1.0);
/// gain.schedule(ParamEvent::SetValue { value: 1.0, at: 100 });
/// gain.schedule(ParamEvent::ExponentialRamp { value: 0.01, at: 300 });
/// assert_eq!(gain.value_at(50), 1.0);
/// assert!((gain.value_at(200) - 0.1).abs() < 1e-12);
/// assert_eq!(gain.value_at(300), 0.01);
/// ```
#[derive(Clone, Debug)]
pub struct AudioParam {
    initial: f64,
    /// Sorted by time, events at the same time in insertion order.
    events: Vec<ParamEvent>,
}

impl AudioParam {
    pub fn new(initial: f64) -> Self {
        Self {
            initial,
            events: Vec::new(),
        }
    }

    /// Add an event to the timeline. It takes effect after all events already scheduled at the same time.
    pub fn schedule(&mut self, event: ParamEvent) {
        let index = self.first_after(event.at());
        self.events.insert(index, event);
    }

    pub fn value_at(&self, time: Sample) -> f64 {
        let next = self.first_after(time);
        let (from, start) = match next.checked_sub(1).map(|i| &self.events[i]) {
            Some(previous) => (previous.value(), previous.at()),
            None => (self.initial, 0),
        };
        match self.events.get(next) {
            Some(ParamEvent::ExponentialRamp { value, at }) => {
                exponential(from, start, *value, *at, time)
            }
            _ => from,
        }
    }

    /// Drop events that can no longer influence any value at or after `now`.
    pub fn compact(&mut self, now: Sample) {
        let next = self.first_after(now);
        if next > 1 {
            self.initial = self.events[next - 2].value();
            self.events.drain(..next - 1);
        }
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    fn first_after(&self, time: Sample) -> usize {
        self.events
            .iter()
            .position(|e| e.at() > time)
            .unwrap_or_else(|| self.events.len())
    }
}

/// Exponential interpolation between `(t0, v0)` and `(t1, v1)`, for `t0 <= t < t1`.
/// Ramps from or to non-positive values are impossible, the start value is held instead.
fn exponential(v0: f64, t0: Sample, v1: f64, t1: Sample, t: Sample) -> f64 {
    if v0 <= 0.0 || v1 <= 0.0 || t1 <= t0 {
        return v0;
    }
    let progress = (t - t0) as f64 / (t1 - t0) as f64;
    v0 * (v1 / v0).powf(progress)
}
