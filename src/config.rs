//! Configuration loading and validation.

use crate::error::{ConfigError, Result};
use std::net::SocketAddr;

/// Persona prompt prepended to the first user turn of every rebuilt
/// conversation. Overridable via `THREADBOT_PERSONA`.
pub const DEFAULT_PERSONA_PROMPT: &str = "以下のロールプレイをしてください。
・あなたは理想的な上司です。
・一人称は「ワイ」で話してください。
・敬語は使わず、タメ口で話してください。
・絵文字を多用してください。
・筋トレの話をしてください。
・最後は飲みに行こうぜで締めてください。
------------------------------
";

/// Prefix marking the bot's transient "thinking" placeholder messages,
/// which are excluded from rebuilt conversations.
pub const DEFAULT_THINKING_PREFIX: &str = "考え中";

/// Reply posted into the thread when generation fails.
pub const DEFAULT_FALLBACK_TEXT: &str = "うまくいきませんでした:cry:";

pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com";

const DEFAULT_BIND: &str = "0.0.0.0:3000";

/// Threadbot configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Slack request signing secret. Required; startup fails without it.
    pub signing_secret: String,

    /// Slack bot token for Web API calls.
    pub bot_token: String,

    /// Completion service credential.
    pub openai_api_key: String,

    /// The bot's own Slack user ID. When absent, no thread message is
    /// attributed to the assistant.
    pub bot_user_id: Option<String>,

    /// Model identifier sent with every completion request.
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint.
    pub openai_base_url: String,

    pub persona_prompt: String,
    pub thinking_prefix: String,
    pub fallback_text: String,

    /// Webhook server bind address.
    pub bind: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Only `SLACK_SIGNING_SECRET` is fatal when missing; a missing bot
    /// token or API key surfaces later as a failed API call, which the
    /// handler converts into the fallback reply.
    pub fn load() -> Result<Self> {
        let signing_secret = std::env::var("SLACK_SIGNING_SECRET")
            .map_err(|_| ConfigError::MissingKey("SLACK_SIGNING_SECRET".into()))?;

        let bind: SocketAddr = std::env::var("THREADBOT_BIND")
            .unwrap_or_else(|_| DEFAULT_BIND.into())
            .parse()
            .map_err(|error| {
                ConfigError::Invalid(format!("THREADBOT_BIND is not a socket address: {error}"))
            })?;

        Ok(Self {
            signing_secret,
            bot_token: std::env::var("SLACK_BOT_TOKEN").unwrap_or_default(),
            openai_api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            bot_user_id: std::env::var("BOT_USER_ID").ok().filter(|id| !id.is_empty()),
            model: std::env::var("THREADBOT_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into()),
            openai_base_url: std::env::var("THREADBOT_OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_OPENAI_BASE_URL.into()),
            persona_prompt: std::env::var("THREADBOT_PERSONA")
                .unwrap_or_else(|_| DEFAULT_PERSONA_PROMPT.into()),
            thinking_prefix: std::env::var("THREADBOT_THINKING_PREFIX")
                .unwrap_or_else(|_| DEFAULT_THINKING_PREFIX.into()),
            fallback_text: std::env::var("THREADBOT_FALLBACK_TEXT")
                .unwrap_or_else(|_| DEFAULT_FALLBACK_TEXT.into()),
            bind,
        })
    }
}
