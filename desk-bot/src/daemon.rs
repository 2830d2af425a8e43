//! Poll loop orchestrator.
//!
//! A three-state machine: `Starting` (fixed startup delay), `Greeting`
//! (one-shot greeting typed into the chat), then `Polling` forever. The
//! polling state never exits under normal operation; this is a
//! long-running daemon whose only shutdown path is an external signal.
//!
//! Every tick runs to completion before the next sleep begins, so there
//! is never more than one in-flight completion request. Per-tick errors
//! are logged at tick granularity and never terminate the loop.

use crate::engine::ChatEngine;
use crate::extract::extract;
use crate::terminal::{Terminal, TerminalError};
use desk_common::config::{BotConfig, Config};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Waiting out the startup delay
    Starting,
    /// Sending the one-shot greeting
    Greeting,
    /// Steady state; never exits
    Polling,
}

/// The poll loop: owns the engine, the terminal, and the lifecycle flags.
pub struct PollLoop<T: Terminal> {
    engine: ChatEngine,
    terminal: T,
    bot: BotConfig,
    poll_interval: Duration,
    greeting_delay: Duration,
    state: LoopState,
    greeting_sent: bool,
}

impl<T: Terminal> PollLoop<T> {
    /// Create a loop in the `Starting` state.
    pub fn new(config: &Config, engine: ChatEngine, terminal: T) -> Self {
        Self {
            engine,
            terminal,
            bot: config.bot.clone(),
            poll_interval: Duration::from_millis(config.poll.interval_ms),
            greeting_delay: Duration::from_secs(config.bot.greeting_delay_secs),
            state: LoopState::Starting,
            greeting_sent: false,
        }
    }

    /// Current orchestrator state.
    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Walk `Starting` → `Greeting` → `Polling`: wait the startup delay,
    /// then type the greeting exactly once. Safe to call again; the
    /// one-shot flag keeps the greeting from repeating.
    pub async fn start_up(&mut self) -> Result<(), TerminalError> {
        tokio::time::sleep(self.greeting_delay).await;
        self.state = LoopState::Greeting;

        if !self.greeting_sent {
            let greeting = self.bot.rendered_greeting();
            info!(greeting = %greeting, "sending startup greeting");
            self.terminal.type_and_submit(&greeting)?;
            self.greeting_sent = true;
        }

        self.state = LoopState::Polling;
        Ok(())
    }

    /// One poll tick: read the surface, extract, route, and inject the
    /// reply if one was produced. Returns whether a reply was sent.
    pub async fn tick(&mut self) -> Result<bool, TerminalError> {
        let raw = self.terminal.read_all()?;

        let candidate = match extract(
            &raw,
            &self.bot.trigger_prefix,
            &self.bot.bot_marker,
            self.engine.processed(),
        ) {
            Some(candidate) => candidate,
            None => return Ok(false),
        };

        debug!(
            timestamp = %candidate.timestamp_token,
            author = %candidate.author,
            "candidate extracted"
        );

        match self.engine.handle(&candidate).await {
            Some(reply) => {
                self.terminal.type_and_submit(&reply)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Run forever. Startup and per-tick failures are logged and
    /// absorbed; the loop only ends when the process is killed.
    pub async fn run(mut self) {
        if let Err(err) = self.start_up().await {
            // Greeting is best-effort; polling still proceeds.
            warn!(error = %err, "startup greeting failed");
            self.state = LoopState::Polling;
        }

        info!(interval_ms = self.poll_interval.as_millis() as u64, "polling started");
        loop {
            if let Err(err) = self.tick().await {
                warn!(error = %err, "tick failed");
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
