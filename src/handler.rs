//! Per-mention orchestration: fetch thread, build transcript, complete, reply.

use crate::MentionEvent;
use crate::config::Config;
use crate::llm::CompletionClient;
use crate::messaging::traits::{ReplyDispatcher, ThreadFetcher};
use crate::transcript::build_transcript;

/// How an inbound event is treated.
///
/// Slack redelivers an event when the first delivery isn't acknowledged in
/// time; acting on a redelivery would post a duplicate reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventDisposition {
    /// First delivery: run the full pipeline.
    NewEvent,
    /// Platform redelivery: log and do nothing.
    SuppressedRetry,
}

impl EventDisposition {
    pub fn of(event: &MentionEvent) -> Self {
        match event.retry_num {
            Some(retry_num) if retry_num > 0 => Self::SuppressedRetry,
            _ => Self::NewEvent,
        }
    }
}

/// Handler settings, split out of [`Config`] so tests don't need the full
/// process configuration.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    pub model: String,
    pub bot_user_id: Option<String>,
    pub persona_prompt: String,
    pub thinking_prefix: String,
    pub fallback_text: String,
}

impl From<&Config> for HandlerConfig {
    fn from(config: &Config) -> Self {
        Self {
            model: config.model.clone(),
            bot_user_id: config.bot_user_id.clone(),
            persona_prompt: config.persona_prompt.clone(),
            thinking_prefix: config.thinking_prefix.clone(),
            fallback_text: config.fallback_text.clone(),
        }
    }
}

/// Orchestrates one mention event end to end.
///
/// Collaborators are injected so tests can substitute doubles; each
/// invocation is independent and shares no mutable state with any other.
pub struct MentionHandler<F, C, D> {
    fetcher: F,
    completion: C,
    dispatcher: D,
    config: HandlerConfig,
}

impl<F, C, D> MentionHandler<F, C, D>
where
    F: ThreadFetcher,
    C: CompletionClient,
    D: ReplyDispatcher,
{
    pub fn new(fetcher: F, completion: C, dispatcher: D, config: HandlerConfig) -> Self {
        Self { fetcher, completion, dispatcher, config }
    }

    /// Handle one inbound mention event.
    ///
    /// Never returns an error: a failed pipeline degrades to the fixed
    /// fallback reply, and a failed fallback post is logged and swallowed
    /// so nothing propagates back to the webhook layer.
    pub async fn handle(&self, event: MentionEvent) {
        if EventDisposition::of(&event) == EventDisposition::SuppressedRetry {
            tracing::info!(
                channel = %event.channel,
                retry_reason = event.retry_reason.as_deref().unwrap_or("unknown"),
                "skipped redelivered event"
            );
            return;
        }

        let thread_ts = event.reply_thread_ts().to_string();
        tracing::debug!(channel = %event.channel, %thread_ts, "handling mention");

        if let Err(error) = self.respond(&event.channel, &thread_ts).await {
            // The error display carries the provider's response body when
            // one was available.
            tracing::error!(%error, channel = %event.channel, "mention pipeline failed, sending fallback reply");

            if let Err(error) = self
                .dispatcher
                .post_reply(&event.channel, &thread_ts, &self.config.fallback_text)
                .await
            {
                tracing::error!(%error, channel = %event.channel, "failed to deliver fallback reply");
            }
        }
    }

    async fn respond(&self, channel: &str, thread_ts: &str) -> crate::Result<()> {
        let messages = self.fetcher.fetch_thread(channel, thread_ts).await?;

        let transcript = build_transcript(
            &messages,
            self.config.bot_user_id.as_deref(),
            &self.config.persona_prompt,
            &self.config.thinking_prefix,
        );

        // An empty transcript is still sent; the completion endpoint decides
        // what a zero-turn request yields.
        let choices = self
            .completion
            .complete(&self.config.model, &transcript)
            .await?;

        let reply: String = choices.into_iter().map(|choice| choice.text).collect();
        tracing::info!(channel, chars = reply.len(), "posting completion reply");

        self.dispatcher.post_reply(channel, thread_ts, &reply).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreadMessage;
    use crate::error::{CompletionError, SlackError};
    use crate::llm::CompletionChoice;
    use crate::{Result, TranscriptMessage};
    use std::sync::Arc;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn test_config() -> HandlerConfig {
        HandlerConfig {
            model: "test-model".into(),
            bot_user_id: Some("U0BOT".into()),
            persona_prompt: "PERSONA\n".into(),
            thinking_prefix: "考え中".into(),
            fallback_text: "うまくいきませんでした:cry:".into(),
        }
    }

    fn mention(retry_num: Option<u32>) -> MentionEvent {
        MentionEvent {
            channel: "C123".into(),
            ts: "200.000".into(),
            thread_ts: Some("100.000".into()),
            retry_num,
            retry_reason: retry_num.map(|_| "http_timeout".into()),
        }
    }

    struct StubFetcher {
        thread: Vec<ThreadMessage>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl StubFetcher {
        fn with_thread(thread: Vec<ThreadMessage>) -> Self {
            Self { thread, fail: false, calls: Arc::new(AtomicUsize::new(0)) }
        }

        fn failing() -> Self {
            Self { thread: Vec::new(), fail: true, calls: Arc::new(AtomicUsize::new(0)) }
        }
    }

    impl ThreadFetcher for StubFetcher {
        async fn fetch_thread(&self, channel: &str, _thread_ts: &str) -> Result<Vec<ThreadMessage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SlackError::ThreadFetch {
                    channel: channel.to_string(),
                    message: "boom".into(),
                }
                .into());
            }
            Ok(self.thread.clone())
        }
    }

    struct StubCompletion {
        choices: Vec<CompletionChoice>,
        fail: bool,
        requests: Arc<Mutex<Vec<Vec<TranscriptMessage>>>>,
    }

    impl StubCompletion {
        fn with_choices(texts: &[&str]) -> Self {
            Self {
                choices: texts.iter().map(|t| CompletionChoice { text: t.to_string() }).collect(),
                fail: false,
                requests: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn failing() -> Self {
            Self { choices: Vec::new(), fail: true, requests: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    impl CompletionClient for StubCompletion {
        async fn complete(
            &self,
            _model: &str,
            transcript: &[TranscriptMessage],
        ) -> Result<Vec<CompletionChoice>> {
            self.requests.lock().unwrap().push(transcript.to_vec());
            if self.fail {
                return Err(CompletionError::Api {
                    status: 429,
                    body: r#"{"error":{"message":"rate limited"}}"#.into(),
                }
                .into());
            }
            Ok(self.choices.clone())
        }
    }

    struct StubDispatcher {
        fail: bool,
        posts: Arc<Mutex<Vec<(String, String, String)>>>,
    }

    impl StubDispatcher {
        fn new() -> Self {
            Self { fail: false, posts: Arc::new(Mutex::new(Vec::new())) }
        }

        fn failing() -> Self {
            Self { fail: true, posts: Arc::new(Mutex::new(Vec::new())) }
        }
    }

    impl ReplyDispatcher for StubDispatcher {
        async fn post_reply(&self, channel: &str, thread_ts: &str, text: &str) -> Result<()> {
            self.posts
                .lock()
                .unwrap()
                .push((channel.to_string(), thread_ts.to_string(), text.to_string()));
            if self.fail {
                return Err(SlackError::PostMessage {
                    channel: channel.to_string(),
                    message: "boom".into(),
                }
                .into());
            }
            Ok(())
        }
    }

    fn user_msg(text: &str) -> ThreadMessage {
        ThreadMessage { author_id: Some("U1".into()), text: Some(text.into()) }
    }

    #[test]
    fn test_retry_disposition() {
        assert_eq!(EventDisposition::of(&mention(None)), EventDisposition::NewEvent);
        // A zero retry count means first delivery.
        assert_eq!(EventDisposition::of(&mention(Some(0))), EventDisposition::NewEvent);
        assert_eq!(EventDisposition::of(&mention(Some(1))), EventDisposition::SuppressedRetry);
        assert_eq!(EventDisposition::of(&mention(Some(3))), EventDisposition::SuppressedRetry);
    }

    #[tokio::test]
    async fn test_redelivered_event_touches_no_collaborator() {
        let fetcher = StubFetcher::with_thread(vec![user_msg("hi")]);
        let fetch_calls = fetcher.calls.clone();
        let completion = StubCompletion::with_choices(&["yo"]);
        let requests = completion.requests.clone();
        let dispatcher = StubDispatcher::new();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        handler.handle(mention(Some(1))).await;

        assert_eq!(fetch_calls.load(Ordering::SeqCst), 0);
        assert!(requests.lock().unwrap().is_empty());
        assert!(posts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_posts_concatenated_candidates_into_thread() {
        let fetcher = StubFetcher::with_thread(vec![user_msg("hi <@U0BOT>")]);
        let completion = StubCompletion::with_choices(&["part one", " part two"]);
        let requests = completion.requests.clone();
        let dispatcher = StubDispatcher::new();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        handler.handle(mention(None)).await;

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0][0].content, "PERSONA\nhi ");

        let posts = posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        // Candidates are joined with no separator, into the existing thread.
        assert_eq!(posts[0], ("C123".into(), "100.000".into(), "part one part two".into()));
    }

    #[tokio::test]
    async fn test_mention_outside_thread_anchors_new_thread_on_event_ts() {
        let fetcher = StubFetcher::with_thread(vec![user_msg("hi")]);
        let completion = StubCompletion::with_choices(&["yo"]);
        let dispatcher = StubDispatcher::new();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        let event = MentionEvent {
            channel: "C123".into(),
            ts: "200.000".into(),
            thread_ts: None,
            retry_num: None,
            retry_reason: None,
        };
        handler.handle(event).await;

        assert_eq!(posts.lock().unwrap()[0].1, "200.000");
    }

    #[tokio::test]
    async fn test_completion_failure_sends_fallback_without_leaking_error() {
        let fetcher = StubFetcher::with_thread(vec![user_msg("hi")]);
        let completion = StubCompletion::failing();
        let dispatcher = StubDispatcher::new();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        handler.handle(mention(None)).await;

        let posts = posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].2, "うまくいきませんでした:cry:");
        assert!(!posts[0].2.contains("rate limited"));
    }

    #[tokio::test]
    async fn test_fetch_failure_sends_fallback() {
        let fetcher = StubFetcher::failing();
        let completion = StubCompletion::with_choices(&["yo"]);
        let requests = completion.requests.clone();
        let dispatcher = StubDispatcher::new();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        handler.handle(mention(None)).await;

        assert!(requests.lock().unwrap().is_empty());
        assert_eq!(posts.lock().unwrap()[0].2, "うまくいきませんでした:cry:");
    }

    #[tokio::test]
    async fn test_empty_thread_still_issues_completion_request() {
        let fetcher = StubFetcher::with_thread(Vec::new());
        let completion = StubCompletion::with_choices(&["anyway"]);
        let requests = completion.requests.clone();
        let dispatcher = StubDispatcher::new();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        handler.handle(mention(None)).await;

        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].is_empty());
    }

    #[tokio::test]
    async fn test_failed_fallback_post_is_swallowed() {
        let fetcher = StubFetcher::failing();
        let completion = StubCompletion::with_choices(&[]);
        let dispatcher = StubDispatcher::failing();
        let posts = dispatcher.posts.clone();

        let handler = MentionHandler::new(fetcher, completion, dispatcher, test_config());
        // Must return normally even though the fallback post itself errors.
        handler.handle(mention(None)).await;

        assert_eq!(posts.lock().unwrap().len(), 1);
    }
}
