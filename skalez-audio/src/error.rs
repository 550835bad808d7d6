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

use std::io;

use snafu::Snafu;

#[derive(Debug, Snafu)]
pub enum AudioError {
    #[snafu(display("Could not start {:?}: {}", program, source))]
    SpawnSox { program: String, source: io::Error },
    #[snafu(display("Failed to write audio to sox stream: {}", source))]
    WriteSox { source: io::Error },
    #[snafu(display("sox exited with {}", status))]
    SoxFailed { status: std::process::ExitStatus },
    #[snafu(display("Could not start the render thread: {}", source))]
    SpawnRenderThread { source: io::Error },
}
