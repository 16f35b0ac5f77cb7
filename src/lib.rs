//! Threadbot: a mention-triggered Slack responder backed by a chat-completion model.
//!
//! When the bot is @-mentioned, it fetches the enclosing thread, rebuilds it
//! into an ordered role-tagged transcript (persona prompt injected on the
//! first user turn), asks the completion endpoint for a reply, and posts
//! that reply back into the same thread.

pub mod config;
pub mod error;
pub mod handler;
pub mod llm;
pub mod messaging;
pub mod server;
pub mod transcript;

pub use error::{Error, Result};

use serde::{Deserialize, Serialize};

/// A single message fetched from a Slack thread, in platform order.
///
/// Either field may be absent: system messages carry no author, and
/// attachment-only messages carry no text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadMessage {
    pub author_id: Option<String>,
    pub text: Option<String>,
}

/// Role of a transcript entry, mirroring the chat-completion wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One ordered entry of the conversation transcript sent to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub role: Role,
    pub content: String,
}

impl TranscriptMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// An inbound `app_mention` event decoded from the events webhook.
#[derive(Debug, Clone)]
pub struct MentionEvent {
    pub channel: String,
    /// Timestamp of the mentioning message itself.
    pub ts: String,
    /// Timestamp of the thread root, present when the mention is already
    /// part of a thread.
    pub thread_ts: Option<String>,
    /// Redelivery counter from the platform, absent on first delivery.
    pub retry_num: Option<u32>,
    pub retry_reason: Option<String>,
}

impl MentionEvent {
    /// The thread to fetch and reply into: the existing thread root when the
    /// mention is inside one, otherwise the mention's own timestamp anchors
    /// a new thread.
    pub fn reply_thread_ts(&self) -> &str {
        self.thread_ts.as_deref().unwrap_or(&self.ts)
    }
}
