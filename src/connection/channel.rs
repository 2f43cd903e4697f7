use std::sync::Arc;

use futures::future::BoxFuture;
use serde_json::Value;
use tokio::{
    sync::{mpsc, oneshot},
    task::JoinHandle,
};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    connection::{Connection, PushHandler, TransportError},
    dto::{
        command::Command,
        push::{PushDecodeError, PushEvent, PushKind},
    },
    state::{ListenerHub, Unsubscribe},
};

/// A command waiting for the remote end's answer.
#[derive(Debug)]
pub struct PendingCommand {
    /// Correlation id, logged on both ends.
    pub id: Uuid,
    /// Command as sent by the synchronizer.
    pub command: Command,
    reply: oneshot::Sender<Result<Value, TransportError>>,
}

impl PendingCommand {
    /// Answer the command. Returns `false` when the sender stopped waiting.
    pub fn respond(self, result: Result<Value, TransportError>) -> bool {
        let delivered = self.reply.send(result).is_ok();
        if !delivered {
            debug!(request_id = %self.id, "response dropped; command no longer awaited");
        }
        delivered
    }
}

/// Push subscribers, one ordered hub per kind.
struct PushDispatcher {
    state_changed: ListenerHub<PushEvent>,
    timer_update: ListenerHub<PushEvent>,
    round_ended: ListenerHub<PushEvent>,
}

impl PushDispatcher {
    fn new() -> Self {
        Self {
            state_changed: ListenerHub::new(),
            timer_update: ListenerHub::new(),
            round_ended: ListenerHub::new(),
        }
    }

    fn hub(&self, kind: PushKind) -> &ListenerHub<PushEvent> {
        match kind {
            PushKind::StateChanged => &self.state_changed,
            PushKind::TimerUpdate => &self.timer_update,
            PushKind::RoundEnded => &self.round_ended,
        }
    }
}

/// [`Connection`] whose backend is whatever owns the matching [`RemoteEnd`].
#[derive(Clone)]
pub struct ChannelConnection {
    commands: mpsc::Sender<PendingCommand>,
    pushes: Arc<PushDispatcher>,
}

/// Backend side of a [`ChannelConnection`].
pub struct RemoteEnd {
    /// Commands sent by the synchronizer.
    pub commands: CommandReceiver,
    /// Injects push events into the connection.
    pub pushes: PushSender,
}

impl ChannelConnection {
    /// Connected pair with room for `capacity` in-flight commands.
    pub fn pair(capacity: usize) -> (Self, RemoteEnd) {
        let (tx, rx) = mpsc::channel(capacity);
        let pushes = Arc::new(PushDispatcher::new());
        let connection = Self {
            commands: tx,
            pushes: Arc::clone(&pushes),
        };
        let remote = RemoteEnd {
            commands: CommandReceiver { rx },
            pushes: PushSender { pushes },
        };
        (connection, remote)
    }
}

impl Connection for ChannelConnection {
    fn send_command(&self, command: Command) -> BoxFuture<'static, Result<Value, TransportError>> {
        let commands = self.commands.clone();
        Box::pin(async move {
            let id = Uuid::new_v4();
            let name = command.name();
            let (reply, response) = oneshot::channel();

            debug!(request_id = %id, command = name, "sending command");
            commands
                .send(PendingCommand { id, command, reply })
                .await
                .map_err(|_| TransportError::Disconnected)?;

            let result = response.await.map_err(|_| TransportError::Cancelled)?;
            if let Err(err) = &result {
                debug!(request_id = %id, command = name, error = %err, "command failed");
            }
            result
        })
    }

    fn subscribe(&self, kind: PushKind, handler: PushHandler) -> Unsubscribe {
        self.pushes.hub(kind).subscribe(handler)
    }
}

/// Receiving half of the command channel.
pub struct CommandReceiver {
    rx: mpsc::Receiver<PendingCommand>,
}

impl CommandReceiver {
    /// Next command, or `None` once every connection clone is gone.
    pub async fn recv(&mut self) -> Option<PendingCommand> {
        self.rx.recv().await
    }

    /// Answer every incoming command with `handler` on a background task.
    pub fn serve<F>(mut self, mut handler: F) -> JoinHandle<()>
    where
        F: FnMut(&Command) -> Result<Value, TransportError> + Send + 'static,
    {
        tokio::spawn(async move {
            while let Some(pending) = self.rx.recv().await {
                let result = handler(&pending.command);
                pending.respond(result);
            }
        })
    }
}

/// Injects push events into the connection's subscribers.
///
/// Delivery is synchronous: `push` returns once every subscriber has run, so events pushed
/// from one task reach subscribers in order.
#[derive(Clone)]
pub struct PushSender {
    pushes: Arc<PushDispatcher>,
}

impl PushSender {
    /// Deliver a decoded event to the subscribers of its kind.
    pub fn push(&self, event: &PushEvent) {
        let hub = self.pushes.hub(event.kind());
        if hub.is_empty() {
            debug!(event = event.kind().event_name(), "push event without subscribers");
        }
        hub.notify(event);
    }

    /// Decode a raw bus event and deliver it.
    pub fn push_raw(&self, event: &str, data: Value) -> Result<(), PushDecodeError> {
        match PushEvent::decode(event, data) {
            Ok(decoded) => {
                self.push(&decoded);
                Ok(())
            }
            Err(err) => {
                warn!(event, error = %err, "dropping undecodable push event");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::dto::push::{EVENT_TIMER_UPDATE, TimerUpdate};

    #[tokio::test]
    async fn command_resolves_with_remote_answer() {
        let (connection, remote) = ChannelConnection::pair(4);
        let _server = remote.commands.serve(|command| match command {
            Command::NextRound => Ok(json!({ "success": true })),
            _ => Err(TransportError::remote("unknown_command", "unexpected")),
        });

        let ack = connection.send_command(Command::NextRound).await.unwrap();
        assert_eq!(ack, json!({ "success": true }));

        let err = connection
            .send_command(Command::GetHighscores)
            .await
            .unwrap_err();
        assert!(matches!(err, TransportError::Remote { code, .. } if code == "unknown_command"));
    }

    #[tokio::test]
    async fn closed_remote_is_disconnected() {
        let (connection, remote) = ChannelConnection::pair(1);
        drop(remote);

        assert_eq!(
            connection.send_command(Command::NextRound).await,
            Err(TransportError::Disconnected)
        );
    }

    #[tokio::test]
    async fn dropped_pending_command_is_cancelled() {
        let (connection, mut remote) = ChannelConnection::pair(1);
        let server = tokio::spawn(async move {
            let pending = remote.commands.recv().await;
            drop(pending);
        });

        assert_eq!(
            connection.send_command(Command::NextRound).await,
            Err(TransportError::Cancelled)
        );
        server.await.unwrap();
    }

    #[test]
    fn pushes_reach_only_their_kind_in_order() {
        let (connection, remote) = ChannelConnection::pair(1);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _timer = {
            let seen = Arc::clone(&seen);
            connection.subscribe(
                PushKind::TimerUpdate,
                Box::new(move |event: &PushEvent| {
                    if let PushEvent::TimerUpdate(update) = event {
                        seen.lock().unwrap().push(update.time_remaining);
                    }
                }),
            )
        };
        let _rounds = connection.subscribe(
            PushKind::RoundEnded,
            Box::new(|_| panic!("round handler must not see timer events")),
        );

        for remaining in [3, 2, 1] {
            remote.pushes.push(&PushEvent::TimerUpdate(TimerUpdate {
                game_id: Some("g".into()),
                time_remaining: remaining,
            }));
        }

        assert_eq!(*seen.lock().unwrap(), vec![3, 2, 1]);
    }

    #[test]
    fn raw_pushes_are_decoded_or_rejected() {
        let (connection, remote) = ChannelConnection::pair(1);
        let count = Arc::new(Mutex::new(0));
        let _guard = {
            let count = Arc::clone(&count);
            connection.subscribe(
                PushKind::TimerUpdate,
                Box::new(move |_| *count.lock().unwrap() += 1),
            )
        };

        remote
            .pushes
            .push_raw(EVENT_TIMER_UPDATE, json!({ "game_id": "g", "timer_remaining": 4 }))
            .unwrap();
        assert!(
            remote
                .pushes
                .push_raw(EVENT_TIMER_UPDATE, json!({ "oops": true }))
                .is_err()
        );

        assert_eq!(*count.lock().unwrap(), 1);
    }
}
