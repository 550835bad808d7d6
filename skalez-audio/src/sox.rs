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

//! Sending rendered audio to the speakers or a file through sox.

use std::io::{self, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};

use log::error;

use crate::error::AudioError;
use crate::wave::AudioBuffer;

/// Destination of rendered buffers.
pub trait Sink {
    /// Consume the next buffer. Failures are handled by the sink itself.
    fn write(&mut self, buffer: &AudioBuffer);
}

/// Discards everything.
#[derive(Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn write(&mut self, _buffer: &AudioBuffer) {}
}

pub enum SoxTarget<'a> {
    Play,
    File(&'a Path),
}

/// Pipes raw audio into a `play` or `sox` child process.
pub struct SoxSink {
    child: Child,
    audio_stream: Option<ChildStdin>,
    buffer: Vec<u8>,
    error: bool,
}

impl SoxSink {
    pub fn new(sample_rate: f64, target: SoxTarget) -> Result<Self, AudioError> {
        let sample_rate_str = format!("{}", sample_rate.round() as u32);
        let input_args = &[
            "-R", // make the output reproducible
            "--channels",
            "2",
            "--rate",
            &sample_rate_str,
            "--type",
            "f64",
            "/dev/stdin",
        ];

        // For properly recording the sox dependency on nix:
        let (play, sox) = if let Some(sox_bin) = option_env!("NIX_SOX_BIN") {
            log::debug!("using sox from nix store {}", sox_bin);
            (Path::new(sox_bin).join("play"), Path::new(sox_bin).join("sox"))
        } else {
            ("play".into(), "sox".into())
        };

        let spawned = match target {
            SoxTarget::Play => Command::new(&play)
                .args(input_args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|source| AudioError::SpawnSox {
                    program: play.display().to_string(),
                    source,
                }),
            SoxTarget::File(outfile) => Command::new(&sox)
                .args(input_args)
                .arg(outfile)
                .stdin(Stdio::piped())
                .spawn()
                .map_err(|source| AudioError::SpawnSox {
                    program: sox.display().to_string(),
                    source,
                }),
        };
        Ok(Self::from_child(spawned?))
    }

    fn from_child(mut child: Child) -> Self {
        let audio_stream = child.stdin.take();
        Self {
            child,
            audio_stream,
            buffer: Vec::new(),
            error: false,
        }
    }

    /// Whether a write has failed, after which all audio is dropped.
    pub fn has_failed(&self) -> bool {
        self.error
    }

    /// Close the stream and wait for sox to write out everything it received.
    pub fn finish(mut self) -> Result<(), AudioError> {
        drop(self.audio_stream.take());
        let status = self
            .child
            .wait()
            .map_err(|source| AudioError::WriteSox { source })?;
        if status.success() {
            Ok(())
        } else {
            Err(AudioError::SoxFailed { status })
        }
    }

    fn write_bytes(&mut self) -> io::Result<()> {
        match self.audio_stream.as_mut() {
            Some(stream) => stream.write_all(&self.buffer).and_then(|_| stream.flush()),
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "sox stdin is closed")),
        }
    }
}

impl Sink for SoxSink {
    fn write(&mut self, buffer: &AudioBuffer) {
        if self.error {
            return;
        }

        if self.buffer.len() != buffer.byte_len() {
            self.buffer.resize(buffer.byte_len(), 0);
        }
        buffer.copy_bytes_to(&mut self.buffer);

        if let Err(err) = self.write_bytes() {
            error!("{}", AudioError::WriteSox { source: err });
            self.error = true;
        }
    }
}

/// Closing the stream lets sox exit on its own, waiting reaps the process.
impl Drop for SoxSink {
    fn drop(&mut self) {
        drop(self.audio_stream.take());
        if let Err(err) = self.child.wait() {
            error!("Failed to wait for sox: {}", err);
        }
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, buffer: &AudioBuffer) {
        (**self).write(buffer)
    }
}

#[cfg(all(test, target_os = "linux"))]
mod test {
    use super::*;

    /// Stands in for sox: consumes stdin until it is closed.
    fn cat_sink() -> SoxSink {
        let child = Command::new("cat")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()
            .unwrap();
        SoxSink::from_child(child)
    }

    #[test]
    fn dropping_reaps_the_child() {
        let mut sink = cat_sink();
        let pid = sink.child.id();
        sink.write(&AudioBuffer::new(64));
        assert!(!sink.has_failed());
        drop(sink);
        assert!(!Path::new(&format!("/proc/{}", pid)).exists());
    }

    #[test]
    fn finish_reports_success() {
        let mut sink = cat_sink();
        sink.write(&AudioBuffer::new(16));
        sink.finish().unwrap();
    }
}
