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

mod cli;
mod commands;
mod observer;
mod simulated;

use std::sync::Arc;

use clap::Parser;
use log::{debug, info};
use playback_core::{PlaybackControl, PlaybackError, PlaybackSession};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::cli::{Cli, LogLevel};
use crate::commands::{ConsoleCommand, ParseError, HELP};
use crate::observer::{describe, PrintingObserver};
use crate::simulated::{SimulatedEngine, SimulatedFocusHost, SimulatedResolver};

fn init_logger(level: Option<LogLevel>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.filter_level(level.to_level_filter());
    }
    builder.init();
}

struct Console {
    control: PlaybackControl,
    engine: Arc<SimulatedEngine>,
    focus: Arc<SimulatedFocusHost>,
}

impl Console {
    async fn execute(&self, command: ConsoleCommand) -> Result<(), PlaybackError> {
        match command {
            ConsoleCommand::Prepare(media_id) => self.control.prepare(media_id).await,
            ConsoleCommand::Play => self.control.play().await,
            ConsoleCommand::Pause => self.control.pause().await,
            ConsoleCommand::Toggle => self.control.play_or_pause().await,
            ConsoleCommand::Stop => self.control.stop().await,
            ConsoleCommand::Seek(position_ms) => self.control.seek(position_ms).await,
            ConsoleCommand::State => {
                let snapshot = self.control.current_snapshot();
                println!("{}", describe(snapshot.state, snapshot.metadata.as_ref()));
                if let Some(failure) = snapshot.failure {
                    println!("  last failure: {}", failure);
                }
                Ok(())
            }
            ConsoleCommand::Position => {
                let position = self.control.position_ms().await?;
                println!("{}.{:03}s", position / 1000, position % 1000);
                Ok(())
            }
            ConsoleCommand::Focus(change) => {
                self.focus.inject(change);
                Ok(())
            }
            ConsoleCommand::End => {
                self.engine.finish_track();
                Ok(())
            }
            ConsoleCommand::Fail(reason) => {
                self.engine.fail(reason);
                Ok(())
            }
            ConsoleCommand::Detach => self.control.set_ui_attached(false).await,
            ConsoleCommand::Attach => self.control.set_ui_attached(true).await,
            ConsoleCommand::Help => {
                println!("{}", HELP);
                Ok(())
            }
            ConsoleCommand::Quit => Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logger(cli.log_level);

    let config = cli.session_config();
    let simulation = cli.simulation();
    debug!("Session config: {:?}", config);
    debug!("Simulation: {:?}", simulation);

    let resolver = Arc::new(SimulatedResolver::new(&simulation));
    let engine = Arc::new(SimulatedEngine::new(&simulation, config.transport_capacity));
    let focus =
        Arc::new(SimulatedFocusHost::new(simulation.grant_focus, config.transport_capacity));

    let session = PlaybackSession::start(config, resolver, engine.clone(), focus.clone())?;
    let console = Console { control: session.control(), engine, focus };
    console.control.add_subscriber(Arc::new(PrintingObserver)).await?;
    info!("Session {} ready, type 'help' for commands", session.id());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C signal, exiting...");
                break;
            }
        };
        let Some(line) = line else {
            debug!("End of input");
            break;
        };
        let command = match commands::parse(&line) {
            Ok(ConsoleCommand::Quit) => break,
            Ok(command) => command,
            Err(ParseError::Empty) => continue,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };
        match console.execute(command).await {
            Ok(()) => {}
            Err(PlaybackError::SessionClosed) => {
                info!("Session has ended");
                break;
            }
            Err(e) => println!("{}", e),
        }
        if session.is_closed() {
            info!("Session ended with no UI attached");
            break;
        }
    }

    if session.is_closed() {
        session.closed().await;
    } else {
        session.shutdown().await;
    }
    info!("Console exited");
    Ok(())
}
