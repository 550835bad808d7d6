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

//! A polyphonic synthesizer with one voice per held key.

use std::collections::BTreeMap;
use std::mem;

use log::{debug, trace, warn};
use skalez_core::note::{Note, Velocity};
use skalez_core::tracker::Instrument;

use crate::context::AudioContext;
use crate::engine::{Command, VoiceId};
use crate::error::AudioError;
use crate::param::ParamEvent;
use crate::params::SynthParams;

type Init = Box<dyn FnOnce() -> Result<AudioContext, AudioError>>;

enum Backend {
    /// Created on first use.
    Pending(Init),
    Ready(AudioContext),
    /// Creating the context failed, or there never was one.
    Unavailable,
}

struct Voice {
    id: VoiceId,
    gain: f64,
}

/// Starts a voice per pressed note and fades it out when the note is released.
///
/// The gains of all held voices always add up to the configured headroom.
/// Released voices are handed over to the renderer, which stops them after the fade out;
/// they no longer count towards the headroom.
pub struct PolySynth {
    params: SynthParams,
    backend: Backend,
    next_voice: usize,
    voices: BTreeMap<Note, Voice>,
}

impl PolySynth {
    pub fn with_context(params: SynthParams, context: AudioContext) -> Self {
        Self::new(params, Backend::Ready(context))
    }

    /// Defer creating the audio context until the first note is played or released.
    pub fn lazy<F>(params: SynthParams, init: F) -> Self
    where
        F: FnOnce() -> Result<AudioContext, AudioError> + 'static,
    {
        Self::new(params, Backend::Pending(Box::new(init)))
    }

    /// A synthesizer that keeps quiet.
    pub fn without_audio(params: SynthParams) -> Self {
        Self::new(params, Backend::Unavailable)
    }

    fn new(params: SynthParams, backend: Backend) -> Self {
        Self {
            params,
            backend,
            next_voice: 0,
            voices: BTreeMap::new(),
        }
    }

    pub fn params(&self) -> &SynthParams {
        &self.params
    }

    /// Whether the synthesizer can still make sound. True as long as a pending context has not failed.
    pub fn is_audible(&self) -> bool {
        !matches!(self.backend, Backend::Unavailable)
    }

    pub fn context(&self) -> Option<&AudioContext> {
        match &self.backend {
            Backend::Ready(context) => Some(context),
            _ => None,
        }
    }

    /// Notes with a held voice and the gain of that voice.
    pub fn voices(&self) -> impl Iterator<Item = (Note, f64)> + '_ {
        self.voices.iter().map(|(note, voice)| (*note, voice.gain))
    }

    pub fn voice_id(&self, note: Note) -> Option<VoiceId> {
        self.voices.get(&note).map(|voice| voice.id)
    }

    pub fn start(&mut self, note: Note, velocity: Velocity) {
        self.ensure_backend();
        let context = match &self.backend {
            Backend::Ready(context) => context,
            _ => return,
        };
        if self.voices.contains_key(&note) {
            trace!("{} is already sounding", note);
            return;
        }

        let id = VoiceId(self.next_voice);
        self.next_voice += 1;
        let gain = velocity.as_f64();
        let frequency = self.params.tuning.frequency(note);
        trace!("voice {:?} for {} at {:.2} Hz", id, note, frequency);
        context.send(Command::Start {
            voice: id,
            frequency,
            gain,
            at: context.current_time(),
        });
        self.voices.insert(note, Voice { id, gain });
        self.renormalise();
    }

    pub fn release(&mut self, note: Note) {
        self.ensure_backend();
        let context = match &self.backend {
            Backend::Ready(context) => context,
            _ => return,
        };
        let voice = match self.voices.remove(&note) {
            Some(voice) => voice,
            None => return,
        };

        let now = context.current_time();
        let end = now + context.clock().samples(self.params.release_seconds);
        trace!("fading out voice {:?} until sample {}", voice.id, end);
        context.send(Command::Gain {
            voice: voice.id,
            event: ParamEvent::SetValue {
                value: voice.gain,
                at: now,
            },
        });
        context.send(Command::Gain {
            voice: voice.id,
            event: ParamEvent::ExponentialRamp {
                value: self.params.release_floor,
                at: end,
            },
        });
        context.send(Command::Stop { voice: voice.id, at: end });
        self.renormalise();
    }

    /// Give every held voice an equal share of the headroom.
    fn renormalise(&mut self) {
        let context = match &self.backend {
            Backend::Ready(context) => context,
            _ => return,
        };
        if self.voices.is_empty() {
            return;
        }
        let gain = self.params.headroom / self.voices.len() as f64;
        let now = context.current_time();
        for voice in self.voices.values_mut() {
            voice.gain = gain;
            context.send(Command::Gain {
                voice: voice.id,
                event: ParamEvent::SetValue { value: gain, at: now },
            });
        }
    }

    fn ensure_backend(&mut self) {
        let backend = mem::replace(&mut self.backend, Backend::Unavailable);
        self.backend = match backend {
            Backend::Pending(init) => match init() {
                Ok(context) => {
                    debug!("audio context ready");
                    Backend::Ready(context)
                }
                Err(err) => {
                    warn!("continuing without audio: {}", err);
                    Backend::Unavailable
                }
            },
            other => other,
        };
    }

    /// Stop all audio and release the context.
    pub fn shutdown(self) {
        if let Backend::Ready(context) = self.backend {
            context.close();
        }
    }
}

impl Instrument for PolySynth {
    fn play_note(&mut self, note: Note, velocity: Velocity) {
        self.start(note, velocity)
    }

    fn release_note(&mut self, note: Note) {
        self.release(note)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::engine::{Renderer, VoiceStage};
    use crate::wave::AudioBuffer;
    use skalez_core::tracker::NoteEventProcessor;
    use std::cell::Cell;
    use std::io;
    use std::rc::Rc;

    fn synth() -> (PolySynth, Renderer) {
        let params = SynthParams::default();
        let (context, renderer) = AudioContext::offline(params.sample_rate, &params.chain);
        (PolySynth::with_context(params, context), renderer)
    }

    fn render_buffers(renderer: &mut Renderer, count: usize) {
        let mut buffer = AudioBuffer::new(441);
        for _ in 0..count {
            renderer.render(buffer.samples_mut());
        }
    }

    fn note(midi: u8) -> Note {
        Note::from_midi(midi)
    }

    fn velocity(v: u8) -> Velocity {
        Velocity::try_from_midi(v).unwrap()
    }

    fn total_gain(synth: &PolySynth) -> f64 {
        synth.voices().map(|(_, gain)| gain).sum()
    }

    #[test]
    fn pressing_twice_keeps_one_voice() {
        let (mut synth, mut renderer) = synth();
        synth.start(note(60), velocity(100));
        synth.start(note(64), velocity(100));
        render_buffers(&mut renderer, 1);
        let before: Vec<(Note, f64)> = synth.voices().collect();
        let c = synth.voice_id(note(60)).unwrap();
        let now = renderer.clock().now();
        let rendered_before = renderer.gain_at(c, now);

        synth.start(note(60), velocity(30));
        render_buffers(&mut renderer, 1);
        assert_eq!(synth.voices().collect::<Vec<_>>(), before);
        assert_eq!(synth.voice_id(note(60)), Some(c));
        assert_eq!(renderer.voice_count(), 2);
        assert_eq!(rendered_before, Some(0.475));
        assert_eq!(renderer.gain_at(c, now), rendered_before);
        assert_eq!(renderer.gain_at(c, renderer.clock().now()), rendered_before);
    }

    #[test]
    fn releasing_an_unknown_note_does_nothing() {
        let (mut synth, mut renderer) = synth();
        synth.release(note(62));
        render_buffers(&mut renderer, 1);
        assert_eq!(synth.voices().count(), 0);
        assert_eq!(renderer.voice_count(), 0);
    }

    #[test]
    fn held_gains_add_up_to_the_headroom() {
        let (mut synth, mut renderer) = synth();
        for (count, midi) in [60, 64, 67, 71, 74, 77].iter().enumerate() {
            synth.start(note(*midi), velocity(127));
            assert!((total_gain(&synth) - 0.95).abs() < 1e-9);
            for (_, gain) in synth.voices() {
                assert!((gain - 0.95 / (count + 1) as f64).abs() < 1e-9);
            }
        }
        render_buffers(&mut renderer, 1);
        let now = renderer.clock().now();
        let rendered: f64 = synth
            .voices()
            .map(|(n, _)| renderer.gain_at(synth.voice_id(n).unwrap(), now).unwrap())
            .sum();
        assert!((rendered - 0.95).abs() < 1e-9);

        synth.release(note(64));
        synth.release(note(71));
        assert_eq!(synth.voices().count(), 4);
        assert!((total_gain(&synth) - 0.95).abs() < 1e-9);
    }

    #[test]
    fn released_voice_fades_out_and_stops() {
        let (mut synth, mut renderer) = synth();
        synth.start(note(60), velocity(100));
        render_buffers(&mut renderer, 1);
        let c = synth.voice_id(note(60)).unwrap();

        let released_at = renderer.clock().now();
        synth.release(note(60));
        synth.start(note(61), velocity(100));
        let c_sharp = synth.voice_id(note(61)).unwrap();
        assert_eq!(synth.voice_id(note(60)), None);
        // The fading voice does not take away from the new one
        assert!((total_gain(&synth) - 0.95).abs() < 1e-9);

        let stop = released_at + 4410;
        render_buffers(&mut renderer, 9);
        assert_eq!(renderer.voice_stage(c), Some(VoiceStage::Stopping { at: stop }));
        assert_eq!(renderer.voice_stage(c_sharp), Some(VoiceStage::Sounding));
        let halfway = renderer.gain_at(c, released_at + 2205).unwrap();
        assert!((halfway - (0.95f64 * 0.001).sqrt()).abs() < 1e-6);
        let last = renderer.gain_at(c, stop - 1).unwrap();
        assert!(last > 0.001 && last < 0.0011);

        render_buffers(&mut renderer, 1);
        assert_eq!(renderer.clock().now(), stop);
        assert_eq!(renderer.voice_stage(c), None);
        assert_eq!(renderer.voice_count(), 1);
    }

    #[test]
    fn pressing_again_while_fading_starts_a_new_voice() {
        let (mut synth, mut renderer) = synth();
        synth.start(note(60), velocity(100));
        let first = synth.voice_id(note(60)).unwrap();
        synth.release(note(60));
        synth.start(note(60), velocity(100));
        let second = synth.voice_id(note(60)).unwrap();
        assert_ne!(first, second);

        render_buffers(&mut renderer, 1);
        assert_eq!(renderer.voice_count(), 2);
        render_buffers(&mut renderer, 10);
        assert_eq!(renderer.voice_count(), 1);
        assert_eq!(renderer.voice_stage(second), Some(VoiceStage::Sounding));
    }

    #[test]
    fn context_is_created_on_first_use() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let params = SynthParams::default();
        let chain = params.chain.clone();
        let mut synth = PolySynth::lazy(params, move || {
            counter.set(counter.get() + 1);
            Ok(AudioContext::offline(44100.0, &chain).0)
        });
        assert_eq!(calls.get(), 0);
        assert!(synth.context().is_none());

        synth.release(note(60));
        synth.start(note(60), velocity(90));
        synth.start(note(64), velocity(90));
        assert_eq!(calls.get(), 1);
        assert!(synth.context().is_some());
        assert_eq!(synth.voices().count(), 2);
        synth.shutdown();
    }

    #[test]
    fn failed_init_leaves_analysis_working() {
        let synth = PolySynth::lazy(SynthParams::default(), || {
            Err(AudioError::SpawnRenderThread {
                source: io::Error::new(io::ErrorKind::Other, "no audio device"),
            })
        });
        let mut processor = NoteEventProcessor::new(synth);
        for midi in &[60, 64, 67] {
            processor.on_event(0x90, *midi, 100);
        }
        assert_eq!(processor.chord().to_string(), "C Major");
        assert!(!processor.instrument().is_audible());
        assert_eq!(processor.instrument().voices().count(), 0);
    }
}
