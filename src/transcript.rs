//! Thread-to-conversation transcript reconstruction.
//!
//! Takes the raw messages of a Slack thread (platform order, oldest first)
//! and the bot's identity, and produces the ordered role-tagged sequence
//! sent to the completion endpoint. Pure; no I/O and no hidden state.

use crate::{Role, ThreadMessage, TranscriptMessage};

/// Rebuild a chat-completion transcript from a thread's messages.
///
/// Rules, applied in input order:
/// - messages with absent or empty text contribute nothing;
/// - the bot's own messages become `assistant` turns, except transient
///   "thinking" placeholders (text starting with `thinking_prefix`),
///   which are dropped entirely;
/// - everything else becomes a `user` turn with any `<@bot>` mention
///   tokens stripped, and the persona prompt is prepended to the first
///   such turn only.
///
/// An absent `bot_user_id` is not an error; it just means no message is
/// attributed to the assistant. The result may be empty if every input
/// was filtered out.
pub fn build_transcript(
    messages: &[ThreadMessage],
    bot_user_id: Option<&str>,
    persona: &str,
    thinking_prefix: &str,
) -> Vec<TranscriptMessage> {
    let mut transcript = Vec::with_capacity(messages.len());
    let mut persona_injected = false;

    for message in messages {
        let Some(text) = message.text.as_deref().filter(|text| !text.is_empty()) else {
            continue;
        };

        let from_bot = match (message.author_id.as_deref(), bot_user_id) {
            (Some(author), Some(bot)) => author == bot,
            _ => false,
        };

        if from_bot {
            // Thinking placeholders are status noise, not conversation.
            if !thinking_prefix.is_empty() && text.starts_with(thinking_prefix) {
                continue;
            }
            transcript.push(TranscriptMessage { role: Role::Assistant, content: text.to_string() });
        } else {
            let stripped = strip_bot_mentions(text, bot_user_id);
            let content = if persona_injected {
                stripped
            } else {
                persona_injected = true;
                format!("{persona}{stripped}")
            };
            transcript.push(TranscriptMessage { role: Role::User, content });
        }
    }

    transcript
}

/// Remove every literal `<@BOT_USER_ID>` mention token from user text.
///
/// All occurrences are stripped, not just the first, so repeated mentions
/// in one message don't leak the raw token into the prompt.
fn strip_bot_mentions(text: &str, bot_user_id: Option<&str>) -> String {
    match bot_user_id {
        Some(bot) => text.replace(&format!("<@{bot}>"), ""),
        None => text.to_string(),
    }
}
