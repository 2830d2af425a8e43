//! Message extraction from the scraped conversation surface.
//!
//! Each poll tick hands this module the full visible text of the chat
//! window. The job is to find the most recent line that is addressed to
//! the bot, was not authored by the bot, and has not been answered yet,
//! then split it into author and content.
//!
//! Returning `None` is the steady state on almost every tick, not an
//! error: usually no new message has arrived.

use std::collections::HashSet;

/// A freshly scraped line plausibly representing a new, unanswered
/// user command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    /// Leading token of the line, typically a timestamp. Ignored beyond
    /// parsing; kept for debug logs.
    pub timestamp_token: String,
    /// Author name, text between the leading token and the trigger prefix
    pub author: String,
    /// Message content, text after the trigger prefix
    pub content: String,
    /// The verbatim scraped line; the unique dedup key
    pub raw_line: String,
}

/// Find the most recent actionable line in the scraped surface text.
///
/// A line is actionable when it contains `trigger_prefix`, does not start
/// with `bot_marker` (the bot's own output), and is not already in
/// `processed`. Lines are scanned most-recent-first, so only the newest
/// unanswered message is ever returned.
pub fn extract(
    raw_text: &str,
    trigger_prefix: &str,
    bot_marker: &str,
    processed: &HashSet<String>,
) -> Option<CandidateMessage> {
    for line in raw_text.lines().rev() {
        let line = line.trim();
        if !line.contains(trigger_prefix) {
            continue;
        }
        if line.starts_with(bot_marker) {
            continue;
        }
        if processed.contains(line) {
            continue;
        }

        tracing::debug!(line = %line, "detected new message");

        let (timestamp_token, author, content) = match parse(line, trigger_prefix) {
            Some(parts) => parts,
            None => {
                // Malformed but trigger-bearing line; skip it, never crash.
                tracing::debug!(line = %line, "line matched trigger but failed to parse");
                return None;
            }
        };

        return Some(CandidateMessage {
            timestamp_token,
            author,
            content,
            raw_line: line.to_string(),
        });
    }

    None
}

/// Split a scraped line into (timestamp token, author, content).
///
/// Expected shape: `<timestamp> <author...> <prefix> <content...>`, e.g.
/// `"23:15 John Bob /b who are you?"` → `("23:15", "John Bob", "who are you?")`.
///
/// Returns `None` when the line cannot be split off a leading token or the
/// trigger prefix is absent. Author or content may still trim to empty;
/// the caller treats that as non-actionable.
fn parse(line: &str, trigger_prefix: &str) -> Option<(String, String, String)> {
    let mut parts = line.splitn(2, char::is_whitespace);
    let timestamp = parts.next()?;
    parts.next()?;

    let prefix_start = line.find(trigger_prefix)?;

    // Author sits strictly between the leading token and the prefix.
    let author_span = line.get(timestamp.len()..prefix_start)?;
    let author = author_span.trim().to_string();
    let content = line[prefix_start + trigger_prefix.len()..].trim().to_string();

    Some((timestamp.to_string(), author, content))
}
