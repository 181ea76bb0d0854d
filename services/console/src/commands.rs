// Copyright 2025 HEM Sp. z o.o.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use playback_core::FocusChange;
use thiserror::Error;

pub const HELP: &str = "\
commands:
  prepare <id>        resolve and load a media id
  play | pause        start or pause the loaded media
  toggle              play when paused, pause when playing
  stop                stop and release everything
  seek <ms>           jump within the loaded media
  state | position    show the current snapshot or position
  focus <change>      gain | loss | transient | duck | noisy
  end                 simulate the end of the track
  fail [reason]       simulate an engine error
  detach | attach     hide or show the UI
  help                this text
  quit | exit         shut the session down";

/// One line typed at the console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Prepare(String),
    Play,
    Pause,
    Toggle,
    Stop,
    Seek(i64),
    State,
    Position,
    Focus(FocusChange),
    End,
    Fail(String),
    Detach,
    Attach,
    Help,
    Quit,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty line")]
    Empty,

    #[error("unknown command '{0}', try 'help'")]
    Unknown(String),

    #[error("'{0}' needs an argument")]
    MissingArgument(&'static str),

    #[error("'{command}' does not understand '{value}'")]
    InvalidArgument { command: &'static str, value: String },
}

pub fn parse(line: &str) -> Result<ConsoleCommand, ParseError> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Err(ParseError::Empty);
    };
    let command = match verb.to_lowercase().as_str() {
        "prepare" => {
            let id = words.next().ok_or(ParseError::MissingArgument("prepare"))?;
            ConsoleCommand::Prepare(id.to_string())
        }
        "play" => ConsoleCommand::Play,
        "pause" => ConsoleCommand::Pause,
        "toggle" => ConsoleCommand::Toggle,
        "stop" => ConsoleCommand::Stop,
        "seek" => {
            let value = words.next().ok_or(ParseError::MissingArgument("seek"))?;
            let position = value.parse::<i64>().map_err(|_| ParseError::InvalidArgument {
                command: "seek",
                value: value.to_string(),
            })?;
            ConsoleCommand::Seek(position)
        }
        "state" => ConsoleCommand::State,
        "position" => ConsoleCommand::Position,
        "focus" => {
            let value = words.next().ok_or(ParseError::MissingArgument("focus"))?;
            ConsoleCommand::Focus(parse_focus(value)?)
        }
        "end" => ConsoleCommand::End,
        "fail" => {
            let reason = words.collect::<Vec<_>>().join(" ");
            if reason.is_empty() {
                ConsoleCommand::Fail("simulated failure".to_string())
            } else {
                ConsoleCommand::Fail(reason)
            }
        }
        "detach" => ConsoleCommand::Detach,
        "attach" => ConsoleCommand::Attach,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" => ConsoleCommand::Quit,
        other => return Err(ParseError::Unknown(other.to_string())),
    };
    Ok(command)
}

fn parse_focus(value: &str) -> Result<FocusChange, ParseError> {
    match value.to_lowercase().as_str() {
        "gain" => Ok(FocusChange::Gained),
        "loss" => Ok(FocusChange::Lost),
        "transient" => Ok(FocusChange::LostTransient),
        "duck" => Ok(FocusChange::LostTransientCanDuck),
        "noisy" => Ok(FocusChange::BecomingNoisy),
        _ => Err(ParseError::InvalidArgument { command: "focus", value: value.to_string() }),
    }
}
