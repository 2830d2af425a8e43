//! Dedup and routing engine: the state machine between the unreliable
//! polling loop and the stateless completion API.
//!
//! The engine owns all conversational state for the process: one
//! append-only history per author, plus the set of raw lines already
//! answered. Both grow without bound for the process lifetime; there is
//! no eviction and no persistence.
//!
//! Failure semantics are deliberate: when a completion call fails, the
//! user turn stays in the history and the raw line is NOT marked
//! processed, so a future scrape of the same line could retry. In
//! practice the surface text usually changes first, so the retry rarely
//! fires. A failed author history then holds a trailing user turn until
//! the next successful completion resolves it.

use crate::extract::CandidateMessage;
use crate::llm::CompletionClient;
use crate::session::Conversation;
use desk_common::config::BotConfig;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Per-author conversation state plus dedup bookkeeping.
///
/// Exactly one engine exists per process, owned by the poll loop and
/// passed by `&mut` into each tick. No ambient globals.
pub struct ChatEngine {
    client: CompletionClient,
    bot: BotConfig,
    max_tokens: u32,
    conversations: HashMap<String, Conversation>,
    processed: HashSet<String>,
}

impl ChatEngine {
    /// Create an engine with empty state.
    pub fn new(client: CompletionClient, bot: BotConfig, max_tokens: u32) -> Self {
        Self {
            client,
            bot,
            max_tokens,
            conversations: HashMap::new(),
            processed: HashSet::new(),
        }
    }

    /// Raw lines already answered; consulted by the extractor each tick.
    pub fn processed(&self) -> &HashSet<String> {
        &self.processed
    }

    /// Conversation history for an author, if one exists.
    pub fn conversation(&self, author: &str) -> Option<&Conversation> {
        self.conversations.get(author)
    }

    /// Route one candidate message; returns the reply text to inject,
    /// or `None` when the tick produces no reply.
    ///
    /// `None` covers four distinct cases, none of them fatal: empty
    /// author/content, an already-processed line, and a transport or API
    /// failure from the completion endpoint.
    pub async fn handle(&mut self, candidate: &CandidateMessage) -> Option<String> {
        if candidate.author.is_empty() || candidate.content.is_empty() {
            debug!(raw_line = %candidate.raw_line, "skipping candidate with empty author or content");
            return None;
        }

        if self.processed.contains(&candidate.raw_line) {
            // The same on-screen line is re-read every tick until it
            // scrolls away; this is the steady-state no-op.
            debug!(raw_line = %candidate.raw_line, "duplicate message, skipping");
            return None;
        }

        info!(user = %candidate.author, question = %candidate.content, "handling message");

        let conversation = self
            .conversations
            .entry(candidate.author.clone())
            .or_insert_with(|| Conversation::new(self.bot.system_prompt_for(&candidate.author)));

        conversation.push_user(candidate.content.clone());

        let reply = match self.client.complete(conversation.turns(), self.max_tokens).await {
            Ok(text) => text,
            Err(err) => {
                // The user turn stays appended and the line stays
                // unprocessed; see module docs for the retry caveat.
                warn!(user = %candidate.author, error = %err, "completion failed, no reply this tick");
                return None;
            }
        };

        conversation.push_assistant(reply.clone());
        self.processed.insert(candidate.raw_line.clone());

        info!(user = %candidate.author, reply = %reply, "bot response");
        Some(reply)
    }
}
