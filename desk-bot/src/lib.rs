//! Desk-Bot: a chat-bot persona daemon for desktop chat applications.
//!
//! The daemon has no API into the chat application it rides. It scrapes
//! newly typed messages from the visible conversation text via clipboard
//! polling, routes them through a per-author conversation engine to an
//! OpenAI-compatible completion endpoint, and types the reply back into
//! the application's input field with simulated keystrokes.
//!
//! Pipeline per tick: [`terminal`] read → [`extract`] → [`engine`] →
//! [`llm`] → [`terminal`] send, driven by the [`daemon`] poll loop.

pub mod daemon;
pub mod engine;
pub mod extract;
pub mod llm;
pub mod session;
pub mod terminal;
