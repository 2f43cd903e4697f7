//! Contract between the synchronizer and the backend transport.

/// In-process adapter backed by tokio channels.
pub mod channel;
/// Reader for recorded push-event streams.
pub mod replay;

use futures::future::BoxFuture;
use serde_json::Value;
use thiserror::Error;

use crate::{
    dto::{
        command::Command,
        push::{PushEvent, PushKind},
    },
    state::Unsubscribe,
};

pub use self::{
    channel::{ChannelConnection, CommandReceiver, PendingCommand, PushSender, RemoteEnd},
    replay::{RecordedEvent, ReplayError, ReplayReader},
};

/// Callback invoked for every push event of a subscribed kind.
pub type PushHandler = Box<dyn Fn(&PushEvent) + Send + Sync>;

/// Failures reported by a connection for a single command.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is closed; nothing was delivered.
    #[error("connection closed")]
    Disconnected,
    /// The command was accepted but no response will ever arrive.
    #[error("command cancelled before a response arrived")]
    Cancelled,
    /// The backend rejected the command.
    #[error("backend error {code}: {message}")]
    Remote { code: String, message: String },
}

impl TransportError {
    /// Backend rejection with the given code.
    pub fn remote(code: impl Into<String>, message: impl Into<String>) -> Self {
        TransportError::Remote {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Request/response channel plus push subscriptions to the game backend.
///
/// Implementations must deliver the push events of one subscription in the order they
/// arrived, one at a time.
pub trait Connection: Send + Sync {
    /// Send `command` and resolve with the backend's JSON acknowledgment.
    fn send_command(&self, command: Command) -> BoxFuture<'static, Result<Value, TransportError>>;
    /// Register `handler` for every push event of `kind` until the handle is dropped.
    fn subscribe(&self, kind: PushKind, handler: PushHandler) -> Unsubscribe;
}
