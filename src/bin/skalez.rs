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

//! `skalez` - shows the scales and chords matching the notes played, and plays them.

use std::io;
use std::path::PathBuf;
use std::process;

use log::info;
use snafu::Snafu;
use structopt::StructOpt;

use skalez::play::{self, AudioOutput, PlayError};
use skalez::script::{Script, ScriptError};
use skalez_audio::filter::BiquadType;
use skalez_audio::oscillator::WaveShape;
use skalez_audio::params::SynthParams;

#[derive(Debug, StructOpt)]
#[structopt(name = "skalez", about = "Finding the scales and chords in what you play")]
struct Opt {
    #[structopt(short = "v", long = "verbose", parse(from_occurrences))]
    verbose: usize,

    /// Only analyse the notes, never make a sound.
    #[structopt(long)]
    no_audio: bool,

    /// Output file (any sox-supported format) for scripts. Audio is played directly if not given.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(long, default_value = "44100")]
    sample_rate: u32,

    /// Wave shape of the voices: sine, triangle, saw or rectangle.
    #[structopt(long, default_value = "triangle")]
    wave: WaveShape,

    /// Cutoff frequency of the lowpass filter in Hz.
    #[structopt(long, default_value = "1500")]
    cutoff: f64,

    /// Fade out time of released notes in milliseconds.
    #[structopt(long, default_value = "100")]
    release_ms: f64,

    /// Timed script of controller messages. Messages are read from stdin without timestamps if not given.
    #[structopt(parse(from_os_str))]
    script: Option<PathBuf>,
}

impl Opt {
    fn synth_params(&self) -> Result<SynthParams, CliError> {
        if self.sample_rate == 0 {
            return Err(CliError::InvalidSampleRate {
                sample_rate: self.sample_rate,
            });
        }
        let mut params = SynthParams::default();
        params.sample_rate = f64::from(self.sample_rate);
        params.buffer_size = (self.sample_rate / 100).max(1) as usize;
        params.release_seconds = self.release_ms.max(0.0) / 1000.0;
        params.chain.wave_shape = self.wave;
        params.chain.filter = BiquadType::butterworth_lowpass(self.cutoff);
        Ok(params)
    }
}

#[derive(Debug, Snafu)]
enum CliError {
    #[snafu(display("Sample rate must be positive, got {}", sample_rate))]
    InvalidSampleRate { sample_rate: u32 },
    #[snafu(display("Could not set up logging: {}", message))]
    Logger { message: String },
    #[snafu(display("Could not read {}: {}", path.display(), source))]
    ReadScript { path: PathBuf, source: io::Error },
    #[snafu(display("{}: {}", path.display(), source))]
    ParseScript { path: PathBuf, source: ScriptError },
    #[snafu(display("{}", source))]
    Play { source: PlayError },
}

fn main() {
    if let Err(err) = run(Opt::from_args()) {
        eprintln!("skalez: {}", err);
        process::exit(1);
    }
}

fn run(opt: Opt) -> Result<(), CliError> {
    let level = match opt.verbose {
        0 => log::Level::Info,
        1 => log::Level::Debug,
        _ => log::Level::Trace,
    };
    simple_logger::init_with_level(level).map_err(|err| CliError::Logger {
        message: err.to_string(),
    })?;

    let params = opt.synth_params()?;
    let snapshot = match &opt.script {
        Some(path) => {
            let source = std::fs::read_to_string(path).map_err(|source| CliError::ReadScript {
                path: path.clone(),
                source,
            })?;
            let script = Script::parse(&source).map_err(|source| CliError::ParseScript {
                path: path.clone(),
                source,
            })?;
            let output = match (opt.no_audio, opt.output.as_deref()) {
                (true, _) => AudioOutput::Silent,
                (false, None) => AudioOutput::Speakers,
                (false, Some(path)) => AudioOutput::File(path),
            };
            play::play_script(&script, &params, output)
        }
        None => {
            info!("reading actions from stdin, e.g. \"on C4\", \"off C4\", \"clear\"");
            let stdin = io::stdin();
            let input = stdin.lock();
            play::play_live(input, &params, !opt.no_audio)
        }
    }
    .map_err(|source| CliError::Play { source })?;

    info!("final state\n{}", snapshot);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn parse(args: &[&str]) -> Opt {
        Opt::from_iter(std::iter::once("skalez").chain(args.iter().copied()))
    }

    #[test]
    fn zero_sample_rate_is_rejected() {
        let err = parse(&["--sample-rate", "0"]).synth_params().unwrap_err();
        assert_eq!(err.to_string(), "Sample rate must be positive, got 0");
    }

    #[test]
    fn options_reach_the_params() {
        let params = parse(&["--sample-rate", "48000", "--wave", "saw", "--release-ms", "250"])
            .synth_params()
            .unwrap();
        assert_eq!(params.sample_rate, 48000.0);
        assert_eq!(params.buffer_size, 480);
        assert_eq!(params.release_seconds, 0.25);
        assert_eq!(params.chain.wave_shape, WaveShape::Saw);
    }
}
