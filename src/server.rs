//! Webhook receiver for the Slack Events API.
//!
//! Verifies request signatures, answers `url_verification` challenges, and
//! turns `app_mention` callbacks into [`MentionEvent`]s handled off the
//! request path. Every accepted request is acknowledged with 200 regardless
//! of what happens downstream, so the platform never retries on our
//! internal failures.

use crate::MentionEvent;
use crate::handler::MentionHandler;
use crate::llm::CompletionClient;
use crate::messaging::traits::{ReplyDispatcher, ThreadFetcher};

use anyhow::Context as _;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use slack_morphism::prelude::*;
use slack_morphism::signature_verifier::SlackEventSignatureVerifier;
use std::net::SocketAddr;
use std::sync::Arc;

/// Redelivery headers Slack attaches when it retries an event.
const RETRY_NUM_HEADER: &str = "x-slack-retry-num";
const RETRY_REASON_HEADER: &str = "x-slack-retry-reason";

/// Shared state for the webhook routes.
pub struct AppState<F, C, D> {
    pub handler: MentionHandler<F, C, D>,
    pub verifier: SlackEventSignatureVerifier,
}

/// Serve the webhook endpoints until the listener fails or the process
/// is shut down.
pub async fn serve<F, C, D>(bind: SocketAddr, state: Arc<AppState<F, C, D>>) -> anyhow::Result<()>
where
    F: ThreadFetcher,
    C: CompletionClient,
    D: ReplyDispatcher,
{
    let app = Router::new()
        .route("/health", get(health))
        .route("/slack/events", post(slack_events::<F, C, D>))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind webhook server to {bind}"))?;
    tracing::info!(%bind, "webhook server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> &'static str {
    "ok"
}

async fn slack_events<F, C, D>(
    State(state): State<Arc<AppState<F, C, D>>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String)
where
    F: ThreadFetcher,
    C: CompletionClient,
    D: ReplyDispatcher,
{
    if let Err(error) = verify_signature(&state.verifier, &headers, &body) {
        tracing::warn!(%error, "rejecting events request");
        return (StatusCode::UNAUTHORIZED, String::new());
    }

    let push_event: SlackPushEvent = match serde_json::from_str(&body) {
        Ok(event) => event,
        Err(error) => {
            // Still ack: a payload we can't read would be redelivered
            // forever otherwise.
            tracing::warn!(%error, "unparseable push event payload");
            return (StatusCode::OK, String::new());
        }
    };

    match push_event {
        SlackPushEvent::UrlVerification(verification) => {
            tracing::info!("answering url_verification challenge");
            (StatusCode::OK, verification.challenge)
        }
        SlackPushEvent::EventCallback(callback) => {
            if let Some(event) = mention_event(&headers, callback) {
                // Ack within Slack's deadline and handle off the request
                // path. The spawned task owns the failure handling; a panic
                // there is contained by the runtime.
                let state = state.clone();
                tokio::spawn(async move {
                    state.handler.handle(event).await;
                });
            }
            (StatusCode::OK, String::new())
        }
        _ => (StatusCode::OK, String::new()),
    }
}

fn verify_signature(
    verifier: &SlackEventSignatureVerifier,
    headers: &HeaderMap,
    body: &str,
) -> anyhow::Result<()> {
    let signature = header_str(headers, SlackEventSignatureVerifier::SLACK_SIGNED_HASH_HEADER)
        .context("missing signature header")?;
    let timestamp = header_str(headers, SlackEventSignatureVerifier::SLACK_SIGNED_TIMESTAMP)
        .context("missing request timestamp header")?;

    verifier
        .verify(signature, body, timestamp)
        .context("signature mismatch")?;
    Ok(())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Decode an `app_mention` callback into a [`MentionEvent`]; any other
/// callback body is ignored.
fn mention_event(headers: &HeaderMap, callback: SlackPushEventCallback) -> Option<MentionEvent> {
    let SlackEventCallbackBody::AppMention(mention) = callback.event else {
        return None;
    };

    Some(MentionEvent {
        channel: mention.channel.0,
        ts: mention.origin.ts.0,
        thread_ts: mention.origin.thread_ts.map(|ts| ts.0),
        retry_num: header_str(headers, RETRY_NUM_HEADER).and_then(|value| value.parse().ok()),
        retry_reason: header_str(headers, RETRY_REASON_HEADER).map(str::to_string),
    })
}
