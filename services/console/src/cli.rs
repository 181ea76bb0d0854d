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

use std::collections::HashSet;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use playback_core::SessionConfig;

use crate::simulated::SimulationSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// Drive a playback session from stdin against simulated media.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level; RUST_LOG applies when omitted
    #[arg(short, long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Leave prepared media paused instead of starting it
    #[arg(long)]
    pub no_auto_play: bool,

    /// Simulated lookup latency
    #[arg(long, value_name = "MS", default_value_t = 300)]
    pub resolve_delay_ms: u64,

    /// Simulated time from prepare until the engine is ready
    #[arg(long, value_name = "MS", default_value_t = 200)]
    pub buffer_delay_ms: u64,

    /// Length of every simulated track
    #[arg(long, value_name = "SECS", default_value_t = 240)]
    pub duration_secs: u64,

    /// Media id the resolver reports as unplayable (repeatable)
    #[arg(long = "fail-media", value_name = "ID")]
    pub fail_media: Vec<String>,

    /// Have the audio system refuse every focus request
    #[arg(long)]
    pub deny_focus: bool,
}

impl Cli {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_auto_play(!self.no_auto_play)
    }

    pub fn simulation(&self) -> SimulationSettings {
        SimulationSettings {
            resolve_delay: Duration::from_millis(self.resolve_delay_ms),
            buffer_delay: Duration::from_millis(self.buffer_delay_ms),
            duration_secs: self.duration_secs,
            failing_media: self.fail_media.iter().cloned().collect::<HashSet<_>>(),
            grant_focus: !self.deny_focus,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["playback-console"]).unwrap();
        assert_eq!(cli.log_level, None);
        assert!(cli.session_config().auto_play_on_prepare);
        let sim = cli.simulation();
        assert_eq!(sim.resolve_delay, Duration::from_millis(300));
        assert_eq!(sim.buffer_delay, Duration::from_millis(200));
        assert_eq!(sim.duration_secs, 240);
        assert!(sim.failing_media.is_empty());
        assert!(sim.grant_focus);
    }

    #[test]
    fn flags_map_onto_config_and_simulation() {
        let cli = Cli::try_parse_from([
            "playback-console",
            "--log-level", "debug",
            "--no-auto-play",
            "--resolve-delay-ms", "5",
            "--fail-media", "bad",
            "--fail-media", "worse",
            "--deny-focus",
        ])
        .unwrap();
        assert_eq!(cli.log_level.map(|l| l.to_level_filter()), Some(LevelFilter::Debug));
        assert!(!cli.session_config().auto_play_on_prepare);
        let sim = cli.simulation();
        assert_eq!(sim.resolve_delay, Duration::from_millis(5));
        assert!(sim.failing_media.contains("bad") && sim.failing_media.contains("worse"));
        assert!(!sim.grant_focus);
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        assert!(Cli::try_parse_from(["playback-console", "--log-level", "loud"]).is_err());
    }
}
