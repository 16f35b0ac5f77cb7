//! Completion client trait and the OpenAI-compatible implementation.

pub mod openai;

pub use openai::OpenAiClient;

use crate::TranscriptMessage;
use crate::error::Result;
use std::future::Future;
use std::sync::Arc;

/// One candidate output returned by the completion service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionChoice {
    pub text: String,
}

/// Sends a role-tagged transcript to a language-model service and returns
/// the candidate outputs, in the order the service produced them.
pub trait CompletionClient: Send + Sync + 'static {
    fn complete(
        &self,
        model: &str,
        transcript: &[TranscriptMessage],
    ) -> impl Future<Output = Result<Vec<CompletionChoice>>> + Send;
}

impl<T: CompletionClient> CompletionClient for Arc<T> {
    fn complete(
        &self,
        model: &str,
        transcript: &[TranscriptMessage],
    ) -> impl Future<Output = Result<Vec<CompletionChoice>>> + Send {
        T::complete(self, model, transcript)
    }
}
