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

//! Running skalez: scripted from a file, or live from line based input.

use std::io::{self, BufRead};
use std::path::Path;

use log::{info, warn};
use snafu::Snafu;

use skalez_audio::clock::Sample;
use skalez_audio::context::AudioContext;
use skalez_audio::engine::Renderer;
use skalez_audio::error::AudioError;
use skalez_audio::params::SynthParams;
use skalez_audio::poly::PolySynth;
use skalez_audio::sox::{Sink, SoxSink, SoxTarget};
use skalez_audio::wave::AudioBuffer;
use skalez_core::tracker::{Instrument, NoteEventProcessor, Silence, Snapshot};

use crate::script::{parse_live_line, Script, ScriptAction};

/// Rendering continues this long after the last action, so that releases can fade out.
const TAIL_SECONDS: f64 = 1.0;

#[derive(Debug, Snafu)]
pub enum PlayError {
    #[snafu(display("Failed to read input: {}", source))]
    ReadInput { source: io::Error },
    #[snafu(display("Audio output failed: {}", source))]
    FinishAudio { source: AudioError },
}

/// Where the sound of a scripted run goes.
#[derive(Debug, Clone, Copy)]
pub enum AudioOutput<'a> {
    Silent,
    Speakers,
    File(&'a Path),
}

/// Apply one action to the tracked state.
pub fn apply<I: Instrument>(processor: &mut NoteEventProcessor<I>, action: &ScriptAction) {
    match action {
        ScriptAction::Message(bytes) => {
            processor.on_message(bytes);
        }
        ScriptAction::Clear => processor.clear(),
    }
}

/// Run a script, reporting the state after every action. Returns the final state.
pub fn play_script(
    script: &Script,
    params: &SynthParams,
    output: AudioOutput,
) -> Result<Snapshot, PlayError> {
    let target = match output {
        AudioOutput::Silent => return Ok(analyse_script(script)),
        AudioOutput::Speakers => SoxTarget::Play,
        AudioOutput::File(path) => SoxTarget::File(path),
    };
    match SoxSink::new(params.sample_rate, target) {
        Ok(sink) => {
            let (snapshot, sink) = render_script(script, params, Some(sink));
            if let Some(sink) = sink {
                sink.finish()
                    .map_err(|source| PlayError::FinishAudio { source })?;
            }
            Ok(snapshot)
        }
        Err(err) => {
            warn!("continuing without audio: {}", err);
            Ok(analyse_script(script))
        }
    }
}

fn analyse_script(script: &Script) -> Snapshot {
    let mut processor = NoteEventProcessor::new(Silence);
    for timed in script.actions() {
        apply(&mut processor, &timed.action);
        report(timed.seconds, &timed.action, &processor.snapshot());
    }
    processor.snapshot()
}

/// Render the script offline, sending the audio to `sink` if there is one.
fn render_script(
    script: &Script,
    params: &SynthParams,
    sink: Option<SoxSink>,
) -> (Snapshot, Option<SoxSink>) {
    let (context, renderer) = AudioContext::offline(params.sample_rate, &params.chain);
    let clock = context.clock().clone();
    let mut output = OfflineOutput {
        renderer,
        sink,
        buffer_size: params.buffer_size.max(1),
    };
    let mut processor = NoteEventProcessor::new(PolySynth::with_context(params.clone(), context));

    info!(
        "rendering {:.2} seconds at {} Hz",
        script.duration() + TAIL_SECONDS,
        params.sample_rate
    );
    for timed in script.actions() {
        output.render_until(clock.samples(timed.seconds));
        apply(&mut processor, &timed.action);
        report(timed.seconds, &timed.action, &processor.snapshot());
    }
    output.render_until(clock.samples(script.duration() + TAIL_SECONDS));

    let snapshot = processor.snapshot();
    processor.into_instrument().shutdown();
    (snapshot, output.sink)
}

struct OfflineOutput {
    renderer: Renderer,
    sink: Option<SoxSink>,
    buffer_size: usize,
}

impl OfflineOutput {
    fn render_until(&mut self, target: Sample) {
        loop {
            let now = self.renderer.clock().now();
            if now >= target {
                break;
            }
            let mut buffer = AudioBuffer::new((target - now).min(self.buffer_size));
            self.renderer.render(buffer.samples_mut());
            if let Some(sink) = self.sink.as_mut() {
                sink.write(&buffer);
            }
        }
    }
}

/// Read actions from `input` until it ends, playing them in real time.
pub fn play_live<R: BufRead>(
    input: R,
    params: &SynthParams,
    audio: bool,
) -> Result<Snapshot, PlayError> {
    let synth = if audio {
        let sample_rate = params.sample_rate;
        let buffer_size = params.buffer_size;
        let chain = params.chain.clone();
        PolySynth::lazy(params.clone(), move || {
            let sink = SoxSink::new(sample_rate, SoxTarget::Play)?;
            AudioContext::realtime(sample_rate, buffer_size, &chain, sink)
        })
    } else {
        PolySynth::without_audio(params.clone())
    };
    let mut processor = NoteEventProcessor::new(synth);

    for (index, line) in input.lines().enumerate() {
        let line = line.map_err(|source| PlayError::ReadInput { source })?;
        match parse_live_line(&line, index + 1) {
            Ok(Some(action)) => {
                apply(&mut processor, &action);
                let seconds = processor
                    .instrument()
                    .context()
                    .map_or(0.0, |context| context.clock().seconds());
                report(seconds, &action, &processor.snapshot());
            }
            Ok(None) => {}
            Err(err) => warn!("{}", err),
        }
    }

    let snapshot = processor.snapshot();
    processor.into_instrument().shutdown();
    Ok(snapshot)
}

fn report(seconds: f64, action: &ScriptAction, snapshot: &Snapshot) {
    info!("{:8.3}s  {}\n{}", seconds, action, snapshot);
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::expect;

    const SCRIPT: &str = "
0.0  on C4
0.0  on E4
0.0  on G4
0.5  off C4
0.5  off E4
0.5  off G4
0.5  B0 40 7F      # sustain pedal, ignored
0.6  on D4
0.9  off D4
";

    #[test]
    fn silent_run() {
        let script = Script::parse(SCRIPT).unwrap();
        let snapshot = play_script(&script, &SynthParams::default(), AudioOutput::Silent).unwrap();
        expect![[r#"
            pressed:  -
            recorded: C D E G
            chord:    no chord
            scales:   C major, F major, G major, D minor, E minor, A minor"#]]
        .assert_eq(&snapshot.to_string());
    }

    #[test]
    fn rendered_run_matches_analysis() {
        let script = Script::parse(SCRIPT).unwrap();
        let params = SynthParams {
            sample_rate: 8000.0,
            buffer_size: 80,
            ..SynthParams::default()
        };
        let (snapshot, sink) = render_script(&script, &params, None);
        assert!(sink.is_none());
        assert_eq!(snapshot, analyse_script(&script));
    }

    #[test]
    fn offline_output_stops_at_the_target() {
        let (_context, renderer) = AudioContext::offline(1000.0, &Default::default());
        let mut output = OfflineOutput {
            renderer,
            sink: None,
            buffer_size: 64,
        };
        output.render_until(150);
        assert_eq!(output.renderer.clock().now(), 150);
        output.render_until(100);
        assert_eq!(output.renderer.clock().now(), 150);
    }

    #[test]
    fn live_input_without_audio() {
        let input = "on C4\non E4\non G4\n# comment\nbogus\noff E4\n";
        let snapshot = play_live(input.as_bytes(), &SynthParams::default(), false).unwrap();
        expect![[r#"
            pressed:  C G
            recorded: C E G
            chord:    C Major
            scales:   C major, F major, G major, D minor, E minor, A minor"#]]
        .assert_eq(&snapshot.to_string());
    }
}
