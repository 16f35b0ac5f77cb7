//! Collaborator traits for the mention pipeline.
//!
//! The handler depends on these rather than on concrete clients so tests
//! can substitute recording doubles.

use crate::ThreadMessage;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;

/// Fetches the messages of a thread, in platform order (oldest first).
pub trait ThreadFetcher: Send + Sync + 'static {
    fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> impl Future<Output = Result<Vec<ThreadMessage>>> + Send;
}

/// Posts reply text into a thread.
pub trait ReplyDispatcher: Send + Sync + 'static {
    fn post_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<T: ThreadFetcher> ThreadFetcher for Arc<T> {
    fn fetch_thread(
        &self,
        channel: &str,
        thread_ts: &str,
    ) -> impl Future<Output = Result<Vec<ThreadMessage>>> + Send {
        T::fetch_thread(self, channel, thread_ts)
    }
}

impl<T: ReplyDispatcher> ReplyDispatcher for Arc<T> {
    fn post_reply(
        &self,
        channel: &str,
        thread_ts: &str,
        text: &str,
    ) -> impl Future<Output = Result<()>> + Send {
        T::post_reply(self, channel, thread_ts, text)
    }
}
