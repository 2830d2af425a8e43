//! Terminal I/O adapter: the seam between the daemon and the desktop
//! chat application it rides.
//!
//! The target application is a black box reached only through simulated
//! keystrokes and the system clipboard. `DesktopTerminal` drives it with
//! `enigo` (keystrokes) and `arboard` (clipboard); tests substitute a
//! scripted in-memory implementation of the [`Terminal`] trait.

use desk_common::config::TerminalConfig;
use enigo::{Direction, Enigo, Key, Keyboard, Settings};
use std::thread;
use std::time::Duration;

/// Terminal automation failure.
#[derive(Debug, thiserror::Error)]
pub enum TerminalError {
    /// Automation backend could not be initialized
    #[error("automation init failed: {0}")]
    Init(String),

    /// A simulated keystroke could not be delivered
    #[error("input failed: {0}")]
    Input(String),

    /// Clipboard read failed
    #[error("clipboard read failed: {0}")]
    Clipboard(String),
}

/// The chat surface as seen by the daemon.
///
/// All methods block until the UI interaction completes; the poll loop
/// is strictly sequential by design.
pub trait Terminal {
    /// Deterministically bring the chat input field into focus.
    fn focus_input(&mut self) -> Result<(), TerminalError>;

    /// Select-all and copy the visible conversation text, returning it.
    fn read_all(&mut self) -> Result<String, TerminalError>;

    /// Type `text` at human-plausible pacing, submit it, and return
    /// focus away from the input field.
    fn type_and_submit(&mut self, text: &str) -> Result<(), TerminalError>;
}

/// [`Terminal`] implementation driving a real desktop application.
pub struct DesktopTerminal {
    enigo: Enigo,
    clipboard: arboard::Clipboard,
    config: TerminalConfig,
}

impl DesktopTerminal {
    /// Connect to the platform automation and clipboard backends.
    pub fn new(config: TerminalConfig) -> Result<Self, TerminalError> {
        let enigo =
            Enigo::new(&Settings::default()).map_err(|e| TerminalError::Init(e.to_string()))?;
        let clipboard =
            arboard::Clipboard::new().map_err(|e| TerminalError::Init(e.to_string()))?;
        Ok(Self {
            enigo,
            clipboard,
            config,
        })
    }

    fn key(&mut self, key: Key) -> Result<(), TerminalError> {
        self.enigo
            .key(key, Direction::Click)
            .map_err(|e| TerminalError::Input(e.to_string()))
    }

    fn with_ctrl(&mut self, key: Key) -> Result<(), TerminalError> {
        self.enigo
            .key(Key::Control, Direction::Press)
            .map_err(|e| TerminalError::Input(e.to_string()))?;
        let result = self.key(key);
        // Always release the modifier, even if the chord failed
        let released = self
            .enigo
            .key(Key::Control, Direction::Release)
            .map_err(|e| TerminalError::Input(e.to_string()));
        result.and(released)
    }

    fn settle(&self, ms: u64) {
        thread::sleep(Duration::from_millis(ms));
    }
}

impl Terminal for DesktopTerminal {
    fn focus_input(&mut self) -> Result<(), TerminalError> {
        for _ in 0..self.config.focus_tabs {
            self.key(Key::Tab)?;
            self.settle(self.config.key_settle_ms);
        }
        Ok(())
    }

    fn read_all(&mut self) -> Result<String, TerminalError> {
        self.focus_input()?;

        self.with_ctrl(Key::Unicode('a'))?;
        self.settle(self.config.copy_settle_ms);
        self.with_ctrl(Key::Unicode('c'))?;
        self.settle(self.config.copy_settle_ms);

        let text = self
            .clipboard
            .get_text()
            .map_err(|e| TerminalError::Clipboard(e.to_string()))?;
        Ok(text.trim().to_string())
    }

    fn type_and_submit(&mut self, text: &str) -> Result<(), TerminalError> {
        self.focus_input()?;

        // Per-character pacing; a single text() burst trips some chat
        // clients' input handling.
        for ch in text.chars() {
            let mut buf = [0u8; 4];
            self.enigo
                .text(ch.encode_utf8(&mut buf))
                .map_err(|e| TerminalError::Input(e.to_string()))?;
            self.settle(self.config.typing_delay_ms);
        }

        self.key(Key::Return)?;
        self.key(Key::Tab)?;
        Ok(())
    }
}
