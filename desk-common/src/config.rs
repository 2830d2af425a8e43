//! Configuration for the Desk-Bot daemon.
//!
//! Configuration lives in a single JSON file at `~/.deskbot/config.json`.
//! The file is optional: every field has a default that matches a local
//! OpenAI-compatible endpoint, so the daemon runs with no file at all.
//!
//! # Configuration Priority
//!
//! 1. Environment variables (DESKBOT_* prefix)
//! 2. Explicit config file values
//! 3. Default values
//!
//! # Environment Variable Mapping
//!
//! - `DESKBOT_ENDPOINT` → completion.endpoint
//! - `DESKBOT_MODEL` → completion.model
//! - `DESKBOT_API_KEY` → completion.api_key
//! - `DESKBOT_TRIGGER_PREFIX` → bot.trigger_prefix
//! - `DESKBOT_SYSTEM_PROMPT` → bot.system_prompt
//! - `DESKBOT_GREETING` → bot.greeting
//! - `DESKBOT_POLL_INTERVAL_MS` → poll.interval_ms
//! - `DESKBOT_LOG_LEVEL` → observability.log_level
//! - `DESKBOT_LOG_FORMAT` → observability.log_format

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Get the configuration directory path.
pub fn config_dir() -> PathBuf {
    directories::UserDirs::new().map_or_else(
        || PathBuf::from(".deskbot"),
        |dirs| dirs.home_dir().join(".deskbot"),
    )
}

/// Get the configuration file path.
pub fn config_path() -> PathBuf {
    config_dir().join("config.json")
}

// ============================================================================
// Completion Endpoint Configuration
// ============================================================================

/// Completion endpoint and generation parameters.
///
/// Defaults target a local OpenAI-compatible server (LM Studio, llama.cpp,
/// ollama with the compat layer, etc.). No API key is required for those;
/// set one for hosted endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Full URL of the chat completions endpoint
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model identifier to request (omitted from the payload when None;
    /// local single-model servers ignore it anyway)
    #[serde(default)]
    pub model: Option<String>,

    /// Bearer token for the endpoint, if it requires one
    #[serde(default)]
    pub api_key: Option<String>,

    /// Token budget per reply
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f64,

    /// Nucleus sampling cutoff
    #[serde(default = "default_top_p")]
    pub top_p: f64,

    /// Stop sequences; the defaults keep replies to a single chat line
    #[serde(default = "default_stop")]
    pub stop: Vec<String>,
}

fn default_endpoint() -> String {
    "http://localhost:1234/v1/chat/completions".into()
}
fn default_max_tokens() -> u32 {
    500
}
fn default_temperature() -> f64 {
    0.8
}
fn default_top_p() -> f64 {
    1.0
}
fn default_stop() -> Vec<String> {
    vec!["\n".into(), "user:".into(), "assistant:".into()]
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            model: None,
            api_key: None,
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            top_p: default_top_p(),
            stop: default_stop(),
        }
    }
}

// ============================================================================
// Bot Persona Configuration
// ============================================================================

/// Persona and message-recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Substring that marks a scraped line as addressed to the bot
    #[serde(default = "default_trigger_prefix")]
    pub trigger_prefix: String,

    /// Prefix of lines the bot itself authored; such lines are never
    /// treated as incoming messages
    #[serde(default = "default_bot_marker")]
    pub bot_marker: String,

    /// System prompt seeding every new conversation. `{username}` is
    /// replaced with the author's name.
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// One-shot greeting typed into the chat at startup. `{prefix}` is
    /// replaced with the trigger prefix.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Delay before the greeting is sent, in seconds
    #[serde(default = "default_greeting_delay_secs")]
    pub greeting_delay_secs: u64,
}

fn default_trigger_prefix() -> String {
    "/b".into()
}
fn default_bot_marker() -> String {
    "Bot:".into()
}
fn default_system_prompt() -> String {
    "Be direct".into()
}
fn default_greeting() -> String {
    "Hello! I am Desk-Bot. Use {prefix} to talk to me.".into()
}
fn default_greeting_delay_secs() -> u64 {
    2
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            trigger_prefix: default_trigger_prefix(),
            bot_marker: default_bot_marker(),
            system_prompt: default_system_prompt(),
            greeting: default_greeting(),
            greeting_delay_secs: default_greeting_delay_secs(),
        }
    }
}

impl BotConfig {
    /// Greeting with the `{prefix}` placeholder filled in.
    pub fn rendered_greeting(&self) -> String {
        self.greeting.replace("{prefix}", &self.trigger_prefix)
    }

    /// System prompt with the `{username}` placeholder filled in.
    pub fn system_prompt_for(&self, author: &str) -> String {
        self.system_prompt.replace("{username}", author)
    }
}

// ============================================================================
// Terminal Automation Configuration
// ============================================================================

/// Keystroke/clipboard automation timing.
///
/// The target application is a black box; these knobs exist because every
/// chat client needs slightly different pacing before its UI keeps up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Number of Tab presses that land focus on the chat input field
    #[serde(default = "default_focus_tabs")]
    pub focus_tabs: u32,

    /// Per-character delay while typing a reply, in milliseconds
    #[serde(default = "default_typing_delay_ms")]
    pub typing_delay_ms: u64,

    /// Settle delay after each focus keystroke, in milliseconds
    #[serde(default = "default_key_settle_ms")]
    pub key_settle_ms: u64,

    /// Settle delay after select-all and after copy, in milliseconds
    #[serde(default = "default_copy_settle_ms")]
    pub copy_settle_ms: u64,
}

fn default_focus_tabs() -> u32 {
    2
}
fn default_typing_delay_ms() -> u64 {
    1
}
fn default_key_settle_ms() -> u64 {
    100
}
fn default_copy_settle_ms() -> u64 {
    500
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            focus_tabs: default_focus_tabs(),
            typing_delay_ms: default_typing_delay_ms(),
            key_settle_ms: default_key_settle_ms(),
            copy_settle_ms: default_copy_settle_ms(),
        }
    }
}

// ============================================================================
// Poll Loop Configuration
// ============================================================================

/// Poll loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    /// Sleep between poll ticks, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    100
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
        }
    }
}

// ============================================================================
// Observability Configuration
// ============================================================================

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Base log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Output format: "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "pretty".into()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

// ============================================================================
// Top-level Configuration
// ============================================================================

/// Full daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Completion endpoint and generation parameters
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Persona and message recognition
    #[serde(default)]
    pub bot: BotConfig,

    /// Keystroke/clipboard automation timing
    #[serde(default)]
    pub terminal: TerminalConfig,

    /// Poll loop timing
    #[serde(default)]
    pub poll: PollConfig,

    /// Logging
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the default path, applying environment
    /// overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file(&config_path())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a specific file path (defaults if absent).
    pub fn load_file(path: &std::path::Path) -> Result<Self> {
        let config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            Self::default()
        };
        Ok(config)
    }

    /// Apply `DESKBOT_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var("DESKBOT_ENDPOINT") {
            self.completion.endpoint = endpoint;
        }
        if let Ok(model) = std::env::var("DESKBOT_MODEL") {
            self.completion.model = Some(model);
        }
        if let Ok(key) = std::env::var("DESKBOT_API_KEY") {
            self.completion.api_key = Some(key);
        }
        if let Ok(prefix) = std::env::var("DESKBOT_TRIGGER_PREFIX") {
            self.bot.trigger_prefix = prefix;
        }
        if let Ok(prompt) = std::env::var("DESKBOT_SYSTEM_PROMPT") {
            self.bot.system_prompt = prompt;
        }
        if let Ok(greeting) = std::env::var("DESKBOT_GREETING") {
            self.bot.greeting = greeting;
        }
        if let Ok(interval) = std::env::var("DESKBOT_POLL_INTERVAL_MS") {
            if let Ok(ms) = interval.parse() {
                self.poll.interval_ms = ms;
            }
        }
        if let Ok(level) = std::env::var("DESKBOT_LOG_LEVEL") {
            self.observability.log_level = level;
        }
        if let Ok(format) = std::env::var("DESKBOT_LOG_FORMAT") {
            self.observability.log_format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_setup() {
        let config = Config::default();
        assert_eq!(
            config.completion.endpoint,
            "http://localhost:1234/v1/chat/completions"
        );
        assert_eq!(config.completion.max_tokens, 500);
        assert!((config.completion.temperature - 0.8).abs() < f64::EPSILON);
        assert!((config.completion.top_p - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.completion.stop, vec!["\n", "user:", "assistant:"]);
        assert_eq!(config.bot.trigger_prefix, "/b");
        assert_eq!(config.bot.bot_marker, "Bot:");
        assert_eq!(config.bot.greeting_delay_secs, 2);
        assert_eq!(config.terminal.focus_tabs, 2);
        assert_eq!(config.poll.interval_ms, 100);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_file(&dir.path().join("nope.json")).unwrap();
        assert_eq!(config.bot.trigger_prefix, "/b");
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"bot": {"trigger_prefix": "!ai"}}"#).unwrap();
        let config = Config::load_file(&path).unwrap();
        assert_eq!(config.bot.trigger_prefix, "!ai");
        // Untouched sections keep their defaults
        assert_eq!(config.completion.max_tokens, 500);
        assert_eq!(config.bot.bot_marker, "Bot:");
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_file(&path).is_err());
    }

    #[test]
    fn greeting_prefix_placeholder() {
        let bot = BotConfig {
            greeting: "Ping me with {prefix}!".into(),
            trigger_prefix: "/b".into(),
            ..BotConfig::default()
        };
        assert_eq!(bot.rendered_greeting(), "Ping me with /b!");
    }

    #[test]
    fn system_prompt_username_placeholder() {
        let bot = BotConfig {
            system_prompt: "You are talking to {username}. Be direct.".into(),
            ..BotConfig::default()
        };
        assert_eq!(
            bot.system_prompt_for("Alice"),
            "You are talking to Alice. Be direct."
        );
    }

    #[test]
    fn system_prompt_without_placeholder_is_unchanged() {
        let bot = BotConfig::default();
        assert_eq!(bot.system_prompt_for("Alice"), "Be direct");
    }
}
