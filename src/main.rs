//! Threadbot CLI entry point.

use anyhow::Context as _;
use clap::Parser;
use slack_morphism::prelude::*;
use slack_morphism::signature_verifier::SlackEventSignatureVerifier;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "threadbot")]
#[command(about = "A Slack mention responder backed by a chat-completion model")]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = threadbot::config::Config::load()
        .context("failed to load configuration from environment")?;

    tracing::info!(
        model = %config.model,
        bind = %config.bind,
        bot_user_id = config.bot_user_id.as_deref().unwrap_or("unset"),
        "configuration loaded"
    );

    let gateway = Arc::new(
        threadbot::messaging::SlackGateway::new(config.bot_token.clone())
            .context("failed to create slack gateway")?,
    );
    let completion = threadbot::llm::OpenAiClient::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    );

    let handler = threadbot::handler::MentionHandler::new(
        gateway.clone(),
        completion,
        gateway,
        threadbot::handler::HandlerConfig::from(&config),
    );

    let verifier =
        SlackEventSignatureVerifier::new(&SlackSigningSecret::new(config.signing_secret.clone()));

    let state = Arc::new(threadbot::server::AppState { handler, verifier });

    tokio::select! {
        result = threadbot::server::serve(config.bind, state) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutdown signal received");
            Ok(())
        }
    }
}
