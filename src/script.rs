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

//! The text format for feeding controller messages to skalez.
//!
//! One action per line, `#` starts a comment:
//!
//! ```text
//! 0.0  on C4 100   # press with velocity 100
//! 0.5  off C4      # release
//! 0.5  90 40 64    # raw message bytes in hex
//! 1.0  clear       # forget the recorded notes
//! ```
//!
//! Scripts put the time in seconds in front of every action, live input omits it.

use std::fmt;

use snafu::Snafu;

use skalez_core::event::NOTE_ON;
use skalez_core::note::Note;

const DEFAULT_VELOCITY: u8 = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptAction {
    /// Raw controller message.
    Message(Vec<u8>),
    Clear,
}

impl fmt::Display for ScriptAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptAction::Message(bytes) => {
                for (index, byte) in bytes.iter().enumerate() {
                    if index > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02X}", byte)?;
                }
                Ok(())
            }
            ScriptAction::Clear => f.write_str("clear"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TimedAction {
    pub seconds: f64,
    pub action: ScriptAction,
    /// 1-based line in the source
    pub line: usize,
}

#[derive(Debug, PartialEq, Snafu)]
pub enum ScriptError {
    #[snafu(display("line {}: expected a time in seconds, found {:?}", line, text))]
    InvalidTime { line: usize, text: String },
    #[snafu(display("line {}: time {} is negative", line, seconds))]
    NegativeTime { line: usize, seconds: f64 },
    #[snafu(display("line {}: time {} is before the previous time {}", line, seconds, previous))]
    TimeGoesBack {
        line: usize,
        seconds: f64,
        previous: f64,
    },
    #[snafu(display("line {}: missing action", line))]
    MissingAction { line: usize },
    #[snafu(display("line {}: unknown action {:?}", line, word))]
    UnknownAction { line: usize, word: String },
    #[snafu(display("line {}: missing note", line))]
    MissingNote { line: usize },
    #[snafu(display("line {}: {:?} is not a note", line, text))]
    InvalidNote { line: usize, text: String },
    #[snafu(display("line {}: velocity must be between 1 and 127, found {:?}", line, text))]
    InvalidVelocity { line: usize, text: String },
    #[snafu(display("line {}: {:?} is not a hex byte", line, text))]
    InvalidByte { line: usize, text: String },
    #[snafu(display("line {}: messages have at most 3 bytes, found {}", line, count))]
    TooManyBytes { line: usize, count: usize },
    #[snafu(display("line {}: unexpected {:?}", line, text))]
    UnexpectedArgument { line: usize, text: String },
}

/// A parsed script, ordered by time.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Script {
    actions: Vec<TimedAction>,
}

impl Script {
    pub fn parse(source: &str) -> Result<Script, ScriptError> {
        let mut actions: Vec<TimedAction> = Vec::new();
        for (index, raw_line) in source.lines().enumerate() {
            let line = index + 1;
            let mut words = strip_comment(raw_line).split_whitespace();
            let time_text = match words.next() {
                Some(text) => text,
                None => continue,
            };
            let seconds = parse_time(line, time_text)?;
            if let Some(previous) = actions.last() {
                if seconds < previous.seconds {
                    return Err(ScriptError::TimeGoesBack {
                        line,
                        seconds,
                        previous: previous.seconds,
                    });
                }
            }
            let words: Vec<&str> = words.collect();
            let action = parse_words(line, &words)?;
            actions.push(TimedAction {
                seconds,
                action,
                line,
            });
        }
        Ok(Script { actions })
    }

    pub fn actions(&self) -> &[TimedAction] {
        &self.actions
    }

    /// Time of the last action.
    pub fn duration(&self) -> f64 {
        self.actions.last().map_or(0.0, |action| action.seconds)
    }
}

/// Parse a line of live input, which has no time stamp.
/// Blank lines and comments give `None`.
///
/// ```
/// # use skalez::script::*;
/// assert_eq!(
///     parse_live_line("on A4 64", 1),
///     Ok(Some(ScriptAction::Message(vec![0x90, 69, 64])))
/// );
/// assert_eq!(parse_live_line("  # nothing", 2), Ok(None));
/// ```
pub fn parse_live_line(text: &str, line: usize) -> Result<Option<ScriptAction>, ScriptError> {
    let words: Vec<&str> = strip_comment(text).split_whitespace().collect();
    if words.is_empty() {
        return Ok(None);
    }
    parse_words(line, &words).map(Some)
}

/// A comment starts with a `#` at the start of a word, so that sharps like `C#4` survive.
fn strip_comment(line: &str) -> &str {
    let start = line.char_indices().find(|&(index, ch)| {
        ch == '#'
            && line[..index]
                .chars()
                .next_back()
                .map_or(true, char::is_whitespace)
    });
    match start {
        Some((index, _)) => &line[..index],
        None => line,
    }
}

fn parse_time(line: usize, text: &str) -> Result<f64, ScriptError> {
    let seconds: f64 = text.parse().map_err(|_| ScriptError::InvalidTime {
        line,
        text: text.to_string(),
    })?;
    if !seconds.is_finite() {
        Err(ScriptError::InvalidTime {
            line,
            text: text.to_string(),
        })
    } else if seconds < 0.0 {
        Err(ScriptError::NegativeTime { line, seconds })
    } else {
        Ok(seconds)
    }
}

fn parse_words(line: usize, words: &[&str]) -> Result<ScriptAction, ScriptError> {
    let (first, rest) = match words.split_first() {
        Some(split) => split,
        None => return Err(ScriptError::MissingAction { line }),
    };
    match *first {
        "clear" => {
            no_more(line, rest)?;
            Ok(ScriptAction::Clear)
        }
        "on" => {
            let (note, rest) = take_note(line, rest)?;
            let velocity = match rest.split_first() {
                Some((text, rest)) => {
                    no_more(line, rest)?;
                    parse_velocity(line, text)?
                }
                None => DEFAULT_VELOCITY,
            };
            Ok(ScriptAction::Message(vec![NOTE_ON, note.to_midi(), velocity]))
        }
        "off" => {
            let (note, rest) = take_note(line, rest)?;
            no_more(line, rest)?;
            Ok(ScriptAction::Message(vec![NOTE_ON, note.to_midi(), 0]))
        }
        word if parse_byte(word).is_some() => {
            if words.len() > 3 {
                return Err(ScriptError::TooManyBytes {
                    line,
                    count: words.len(),
                });
            }
            words
                .iter()
                .map(|text| {
                    parse_byte(text).ok_or(ScriptError::InvalidByte {
                        line,
                        text: text.to_string(),
                    })
                })
                .collect::<Result<Vec<u8>, ScriptError>>()
                .map(ScriptAction::Message)
        }
        word => Err(ScriptError::UnknownAction {
            line,
            word: word.to_string(),
        }),
    }
}

fn take_note<'a, 'b>(line: usize, words: &'a [&'b str]) -> Result<(Note, &'a [&'b str]), ScriptError> {
    let (text, rest) = words
        .split_first()
        .ok_or(ScriptError::MissingNote { line })?;
    let note = Note::named_str(text)
        .or_else(|| text.parse::<i64>().ok().and_then(Note::try_from_midi))
        .ok_or(ScriptError::InvalidNote {
            line,
            text: text.to_string(),
        })?;
    Ok((note, rest))
}

fn parse_velocity(line: usize, text: &str) -> Result<u8, ScriptError> {
    match text.parse::<u8>() {
        Ok(velocity) if (1..=127).contains(&velocity) => Ok(velocity),
        _ => Err(ScriptError::InvalidVelocity {
            line,
            text: text.to_string(),
        }),
    }
}

fn parse_byte(text: &str) -> Option<u8> {
    if text.len() > 2 {
        return None;
    }
    u8::from_str_radix(text, 16).ok()
}

fn no_more(line: usize, rest: &[&str]) -> Result<(), ScriptError> {
    match rest.first() {
        Some(text) => Err(ScriptError::UnexpectedArgument {
            line,
            text: text.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::{expect, Expect};

    fn check(source: &str, output: Expect) {
        let rendered = match Script::parse(source) {
            Ok(script) => script
                .actions()
                .iter()
                .map(|a| format!("{} {:.3}  {}", a.line, a.seconds, a.action))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(err) => format!("error: {}", err),
        };
        output.assert_eq(&rendered);
    }

    #[test]
    fn parse_all_actions() {
        check(
            "# C major, then a D
0     on C4
0     on E4 90
0     on 67 127
1.5   off C4   # release
1.5   90 3E 64
2     B0 07 7F
2.25  F8
3     clear
",
            expect![[r#"
                2 0.000  90 3C 64
                3 0.000  90 40 5A
                4 0.000  90 43 7F
                5 1.500  90 3C 00
                6 1.500  90 3E 64
                7 2.000  B0 07 7F
                8 2.250  F8
                9 3.000  clear"#]],
        );
    }

    #[test]
    fn note_names() {
        check(
            "0 on C#3\n0 on Bb2\n0 on Csharp6\n0 on A-1",
            expect![[r#"
                1 0.000  90 31 64
                2 0.000  90 2E 64
                3 0.000  90 55 64
                4 0.000  90 09 64"#]],
        );
    }

    #[test]
    fn parse_errors() {
        check("zero on C4", expect![[r#"error: line 1: expected a time in seconds, found "zero""#]]);
        check("-1 on C4", expect![[r#"error: line 1: time -1 is negative"#]]);
        check(
            "1 on C4\n\n0.5 off C4",
            expect![[r#"error: line 3: time 0.5 is before the previous time 1"#]],
        );
        check("3", expect![[r#"error: line 1: missing action"#]]);
        check("0 press C4", expect![[r#"error: line 1: unknown action "press""#]]);
        check("0 on", expect![[r#"error: line 1: missing note"#]]);
        check("0 on H4", expect![[r#"error: line 1: "H4" is not a note"#]]);
        check("0 on 128", expect![[r#"error: line 1: "128" is not a note"#]]);
        check(
            "0 on C4 0",
            expect![[r#"error: line 1: velocity must be between 1 and 127, found "0""#]],
        );
        check("0 90 3C 64 00", expect![[r#"error: line 1: messages have at most 3 bytes, found 4"#]]);
        check("0 90 3C zz", expect![[r#"error: line 1: "zz" is not a hex byte"#]]);
        check("0 clear all", expect![[r#"error: line 1: unexpected "all""#]]);
    }

    #[test]
    fn blank_script() {
        let script = Script::parse("\n   \n# only comments\n").unwrap();
        assert!(script.actions().is_empty());
        assert_eq!(script.duration(), 0.0);
    }

    #[test]
    fn sharps_are_not_comments() {
        assert_eq!(
            parse_live_line("on C#4 # middle C sharp", 1),
            Ok(Some(ScriptAction::Message(vec![0x90, 61, 100])))
        );
        assert_eq!(parse_live_line("#on C4", 2), Ok(None));
        check(
            "0 on F#3\n0.5 off F#3# no space before the comment",
            expect![[r#"error: line 2: "F#3#" is not a note"#]],
        );
        check(
            "0 on F#3 #a comment\n0.5\toff F#3\t#another",
            expect![[r#"
                1 0.000  90 36 64
                2 0.500  90 36 00"#]],
        );
    }

    #[test]
    fn live_lines_have_no_time() {
        assert_eq!(parse_live_line("clear", 1), Ok(Some(ScriptAction::Clear)));
        assert_eq!(
            parse_live_line("off 60", 4),
            Ok(Some(ScriptAction::Message(vec![0x90, 60, 0])))
        );
        assert_eq!(
            parse_live_line("0.5 on C4", 7),
            Err(ScriptError::UnknownAction {
                line: 7,
                word: "0.5".to_string()
            })
        );
    }
}
