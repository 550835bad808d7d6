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

//! Ownership of the rendering backend.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, trace};

use crate::clock::{AudioClock, Sample};
use crate::engine::{Command, Renderer};
use crate::error::AudioError;
use crate::params::ChainParams;
use crate::sox::Sink;
use crate::wave::AudioBuffer;

struct RenderThread {
    running: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

/// The control side of a renderer: its clock and the channel for scheduling commands.
///
/// Sending never blocks, commands only take effect once the renderer picks them up.
pub struct AudioContext {
    clock: AudioClock,
    commands: Sender<Command>,
    render_thread: Option<RenderThread>,
}

impl AudioContext {
    /// A context whose renderer is driven by the caller.
    pub fn offline(sample_rate: f64, chain: &ChainParams) -> (AudioContext, Renderer) {
        let clock = AudioClock::new(sample_rate);
        let (sender, receiver) = unbounded();
        let renderer = Renderer::new(clock.clone(), receiver, chain);
        let context = AudioContext {
            clock,
            commands: sender,
            render_thread: None,
        };
        (context, renderer)
    }

    /// A context rendering on its own thread into `sink`, in step with the wall clock.
    pub fn realtime<S: Sink + Send + 'static>(
        sample_rate: f64,
        buffer_size: usize,
        chain: &ChainParams,
        mut sink: S,
    ) -> Result<AudioContext, AudioError> {
        let (mut context, mut renderer) = AudioContext::offline(sample_rate, chain);
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name("skalez-render".to_string())
            .spawn(move || render_loop(&mut renderer, &mut sink, buffer_size, &thread_running))
            .map_err(|source| AudioError::SpawnRenderThread { source })?;
        context.render_thread = Some(RenderThread { running, handle });
        debug!(
            "started realtime rendering at {} Hz with {} samples per buffer",
            sample_rate, buffer_size
        );
        Ok(context)
    }

    pub fn clock(&self) -> &AudioClock {
        &self.clock
    }

    pub fn current_time(&self) -> Sample {
        self.clock.now()
    }

    pub fn send(&self, command: Command) {
        if self.commands.send(command).is_err() {
            trace!("renderer is gone, dropping command");
        }
    }

    /// Stop rendering. Already scheduled sounds are cut off.
    pub fn close(mut self) {
        self.stop_render_thread();
    }

    fn stop_render_thread(&mut self) {
        if let Some(thread) = self.render_thread.take() {
            thread.running.store(false, Ordering::Release);
            if thread.handle.join().is_err() {
                error!("render thread panicked");
            }
        }
    }
}

impl Drop for AudioContext {
    fn drop(&mut self) {
        self.stop_render_thread();
    }
}

fn render_loop<S: Sink>(
    renderer: &mut Renderer,
    sink: &mut S,
    buffer_size: usize,
    running: &AtomicBool,
) {
    let mut buffer = AudioBuffer::new(buffer_size.max(1));
    let sample_rate = renderer.clock().sample_rate();
    // Rendering may run ahead of the wall clock by this much
    let lead = Duration::from_secs_f64(buffer.len() as f64 / sample_rate);
    let started = Instant::now();

    while running.load(Ordering::Acquire) {
        renderer.render(buffer.samples_mut());
        sink.write(&buffer);

        let rendered = Duration::from_secs_f64(renderer.clock().seconds());
        let due = started.elapsed() + lead;
        if rendered > due {
            thread::sleep(rendered - due);
        }
    }
    debug!(
        "render thread stopped after {:.2} s of audio",
        renderer.clock().seconds()
    );
}
