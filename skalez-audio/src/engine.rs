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

//! The rendering side: voices scheduled by time-stamped commands, mixed through the shared chain.

use crossbeam_channel::{Receiver, TryRecvError};
use log::trace;

use crate::clock::{AudioClock, Sample};
use crate::compressor::Compressor;
use crate::filter::{Biquad, BiquadCoefficients};
use crate::oscillator::Oscillator;
use crate::param::{AudioParam, ParamEvent};
use crate::params::ChainParams;
use crate::wave::Stereo;

/// Identifies a rendered voice. Unlike notes, ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VoiceId(pub(crate) usize);

/// Instructions for the renderer, taking effect at the given sample.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Start {
        voice: VoiceId,
        frequency: f64,
        gain: f64,
        at: Sample,
    },
    Gain {
        voice: VoiceId,
        event: ParamEvent,
    },
    Stop {
        voice: VoiceId,
        at: Sample,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoiceStage {
    Sounding,
    /// Produces samples until right before `at`.
    Stopping { at: Sample },
}

struct RenderVoice {
    id: VoiceId,
    oscillator: Oscillator,
    lowpass: Biquad,
    gain: AudioParam,
    start: Sample,
    stop: Option<Sample>,
}

impl RenderVoice {
    fn is_playing(&self, time: Sample) -> bool {
        time >= self.start && self.stop.map_or(true, |stop| time < stop)
    }

    fn next_sample(&mut self, time: Sample, coefficients: &BiquadCoefficients) -> f64 {
        if !self.is_playing(time) {
            return 0.0;
        }
        let raw = self.oscillator.next_sample();
        self.lowpass.step(coefficients, raw) * self.gain.value_at(time)
    }
}

/// Renders all voices into buffers, advancing the shared clock.
pub struct Renderer {
    clock: AudioClock,
    commands: Receiver<Command>,
    chain: ChainParams,
    /// Computed once, every voice filters with the same coefficients.
    lowpass: BiquadCoefficients,
    compressor: Compressor,
    voices: Vec<RenderVoice>,
}

impl Renderer {
    pub(crate) fn new(clock: AudioClock, commands: Receiver<Command>, chain: &ChainParams) -> Self {
        let sample_rate = clock.sample_rate();
        Self {
            lowpass: chain.filter.to_coefficients(sample_rate),
            compressor: Compressor::new(chain.compressor.clone(), sample_rate),
            chain: chain.clone(),
            clock,
            commands,
            voices: Vec::new(),
        }
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    /// Apply all commands received so far.
    /// Returns `false` once the sending side is gone and nothing is left to apply.
    pub fn apply_pending(&mut self) -> bool {
        loop {
            match self.commands.try_recv() {
                Ok(command) => self.apply(command),
                Err(TryRecvError::Empty) => return true,
                Err(TryRecvError::Disconnected) => return false,
            }
        }
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Start {
                voice,
                frequency,
                gain,
                at,
            } => {
                if self.voice(voice).is_some() {
                    trace!("voice {:?} already started", voice);
                    return;
                }
                trace!("start {:?} at {} Hz", voice, frequency);
                let mut param = AudioParam::new(gain);
                param.schedule(ParamEvent::SetValue { value: gain, at });
                self.voices.push(RenderVoice {
                    id: voice,
                    oscillator: Oscillator::new(
                        self.chain.wave_shape,
                        self.clock.sample_rate(),
                        frequency,
                    ),
                    lowpass: Biquad::new(),
                    gain: param,
                    start: at,
                    stop: None,
                });
            }
            Command::Gain { voice, event } => match self.voice_mut(voice) {
                Some(target) => target.gain.schedule(event),
                None => trace!("gain change for finished voice {:?}", voice),
            },
            Command::Stop { voice, at } => match self.voice_mut(voice) {
                Some(target) => {
                    trace!("stop {:?} at sample {}", voice, at);
                    target.stop = Some(target.stop.map_or(at, |stop| stop.min(at)));
                }
                None => trace!("stop for finished voice {:?}", voice),
            },
        }
    }

    /// Render the next `output.len()` samples.
    pub fn render(&mut self, output: &mut [Stereo<f64>]) {
        self.apply_pending();

        let start = self.clock.now();
        let lowpass = &self.lowpass;
        for (offset, frame) in output.iter_mut().enumerate() {
            let time = start + offset;
            let mix: f64 = self
                .voices
                .iter_mut()
                .map(|voice| voice.next_sample(time, lowpass))
                .sum();
            *frame = Stereo::mono(self.compressor.step(mix));
        }

        let end = start + output.len();
        let before = self.voices.len();
        self.voices
            .retain(|voice| voice.stop.map_or(true, |stop| stop > end));
        if self.voices.len() != before {
            trace!(
                "removed {} stopped voices, {} left",
                before - self.voices.len(),
                self.voices.len()
            );
        }
        for voice in self.voices.iter_mut() {
            voice.gain.compact(end);
        }
        self.clock.advance(output.len());
    }

    pub fn voice_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice_stage(&self, id: VoiceId) -> Option<VoiceStage> {
        self.voice(id).map(|voice| match voice.stop {
            None => VoiceStage::Sounding,
            Some(at) => VoiceStage::Stopping { at },
        })
    }

    /// The gain a voice has at `time`, as far as it is still known.
    pub fn gain_at(&self, id: VoiceId, time: Sample) -> Option<f64> {
        self.voice(id).map(|voice| voice.gain.value_at(time))
    }

    fn voice(&self, id: VoiceId) -> Option<&RenderVoice> {
        self.voices.iter().find(|voice| voice.id == id)
    }

    fn voice_mut(&mut self, id: VoiceId) -> Option<&mut RenderVoice> {
        self.voices.iter_mut().find(|voice| voice.id == id)
    }
}
