//! Messaging collaborators: the thread fetch / reply post traits and the
//! Slack implementation behind them.

pub mod slack;
pub mod traits;

pub use slack::SlackGateway;
pub use traits::{ReplyDispatcher, ThreadFetcher};
