//! Slack Web API gateway using slack-morphism.
//!
//! Implements both pipeline collaborators against the same client:
//! `conversations.replies` for thread fetching and `chat.postMessage`
//! for threaded replies.

use crate::ThreadMessage;
use crate::error::{Result, SlackError};
use crate::messaging::traits::{ReplyDispatcher, ThreadFetcher};

use anyhow::Context as _;
use slack_morphism::prelude::*;
use std::sync::Arc;

/// Thin wrapper around the Slack Web API.
pub struct SlackGateway {
    /// Shared HTTP client — constructed once, reused across all API calls.
    /// Holds a hyper connection pool internally.
    client: Arc<SlackHyperClient>,
    /// Pre-built API token wrapping the bot token. Created once alongside
    /// `client`.
    token: SlackApiToken,
}

impl SlackGateway {
    pub fn new(bot_token: impl Into<String>) -> anyhow::Result<Self> {
        let client = Arc::new(SlackClient::new(
            SlackClientHyperConnector::new().context("failed to create slack HTTP connector")?,
        ));
        let token = SlackApiToken::new(SlackApiTokenValue(bot_token.into()));
        Ok(Self { client, token })
    }

    /// Open a session against the cached client using the cached bot token.
    fn session(&self) -> SlackClientSession<'_, SlackClientHyperHttpsConnector> {
        self.client.open_session(&self.token)
    }
}

impl ThreadFetcher for SlackGateway {
    async fn fetch_thread(&self, channel: &str, thread_ts: &str) -> Result<Vec<ThreadMessage>> {
        let request = SlackApiConversationsRepliesRequest::new(
            SlackChannelId(channel.to_string()),
            SlackTs(thread_ts.to_string()),
        );

        let response = self
            .session()
            .conversations_replies(&request)
            .await
            .map_err(|error| SlackError::ThreadFetch {
                channel: channel.to_string(),
                message: error.to_string(),
            })?;

        tracing::debug!(
            channel,
            thread_ts,
            count = response.messages.len(),
            "fetched thread replies"
        );

        // conversations.replies returns the thread oldest first; keep that
        // order, it is what the transcript builder expects.
        Ok(response
            .messages
            .into_iter()
            .map(|message| ThreadMessage {
                author_id: message.sender.user.map(|user| user.0),
                text: message.content.text,
            })
            .collect())
    }
}

impl ReplyDispatcher for SlackGateway {
    async fn post_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
        let request = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        )
        .with_thread_ts(SlackTs(thread_ts.to_string()));

        self.session()
            .chat_post_message(&request)
            .await
            .map_err(|error| SlackError::PostMessage {
                channel: channel.to_string(),
                message: error.to_string(),
            })?;

        Ok(())
    }
}
