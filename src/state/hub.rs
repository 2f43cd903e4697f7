use std::{
    fmt,
    sync::{
        Arc, Mutex, PoisonError, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use indexmap::IndexMap;
use tokio::sync::broadcast;

use crate::{
    connection::TransportError,
    state::game::{GameState, Highscores, RoundSummary},
};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;
type Registry<T> = Mutex<IndexMap<u64, Listener<T>>>;

/// Handle returned by every subscription; dropping it (or calling
/// [`Unsubscribe::unsubscribe`]) removes the listener.
#[must_use = "dropping the handle removes the listener immediately"]
pub struct Unsubscribe {
    cancel: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Unsubscribe {
    /// Wrap a cancellation callback.
    pub fn new(cancel: impl FnOnce() + Send + Sync + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Keep the listener registered for as long as its hub lives.
    pub fn detach(mut self) {
        self.cancel.take();
    }

    fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Unsubscribe {
    fn drop(&mut self) {
        self.cancel_now();
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// Ordered set of listeners for one notification kind.
///
/// Listeners are invoked synchronously, in subscription order, outside the registry lock so
/// they are free to subscribe or unsubscribe while being notified.
pub struct ListenerHub<T> {
    listeners: Arc<Registry<T>>,
    next_id: AtomicU64,
}

impl<T: 'static> ListenerHub<T> {
    /// Empty hub.
    pub fn new() -> Self {
        Self {
            listeners: Arc::new(Mutex::new(IndexMap::new())),
            next_id: AtomicU64::new(0),
        }
    }

    /// Register `listener` until the returned handle is dropped.
    pub fn subscribe(&self, listener: impl Fn(&T) + Send + Sync + 'static) -> Unsubscribe {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.listeners).insert(id, Arc::new(listener));

        let registry: Weak<Registry<T>> = Arc::downgrade(&self.listeners);
        Unsubscribe::new(move || {
            if let Some(registry) = registry.upgrade() {
                lock(&registry).shift_remove(&id);
            }
        })
    }

    /// Invoke every listener with `value`.
    pub fn notify(&self, value: &T) {
        let listeners: Vec<Listener<T>> = lock(&self.listeners).values().cloned().collect();
        for listener in listeners {
            listener(value);
        }
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        lock(&self.listeners).len()
    }

    /// Whether no listener is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: 'static> Default for ListenerHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Every notification the synchronizer publishes, as carried on the broadcast feed.
#[derive(Debug, Clone)]
pub enum GameNotification {
    /// A new state reference was installed.
    StateChanged(Arc<GameState>),
    /// The backend reported a new remaining time for the current game.
    TimerUpdated {
        /// Seconds left in the round.
        time_remaining: u32,
    },
    /// A round ended with authoritative scores.
    RoundEnded(Arc<RoundSummary>),
    /// The highscore table was reloaded.
    HighscoresChanged(Arc<Highscores>),
    /// A command did not get a successful answer.
    CommandFailed(CommandFailure),
}

/// Transport-level failure of a command, as announced to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
    /// Wire name of the command.
    pub command: &'static str,
    pub error: TransportError,
}

/// Typed observer registry plus a broadcast feed mirroring every notification.
pub struct Notifications {
    state_changed: ListenerHub<Arc<GameState>>,
    timer_updated: ListenerHub<u32>,
    round_ended: ListenerHub<Arc<RoundSummary>>,
    highscores_changed: ListenerHub<Arc<Highscores>>,
    command_failed: ListenerHub<CommandFailure>,
    feed: broadcast::Sender<GameNotification>,
}

impl Notifications {
    /// Build the registry with a feed able to buffer `capacity` notifications per receiver.
    pub fn new(capacity: usize) -> Self {
        let (feed, _receiver) = broadcast::channel(capacity);
        Self {
            state_changed: ListenerHub::new(),
            timer_updated: ListenerHub::new(),
            round_ended: ListenerHub::new(),
            highscores_changed: ListenerHub::new(),
            command_failed: ListenerHub::new(),
            feed,
        }
    }

    /// Listeners for state replacements.
    pub fn state_changed(&self) -> &ListenerHub<Arc<GameState>> {
        &self.state_changed
    }

    /// Listeners for timer pushes.
    pub fn timer_updated(&self) -> &ListenerHub<u32> {
        &self.timer_updated
    }

    /// Listeners for round summaries.
    pub fn round_ended(&self) -> &ListenerHub<Arc<RoundSummary>> {
        &self.round_ended
    }

    /// Listeners for highscore reloads.
    pub fn highscores_changed(&self) -> &ListenerHub<Arc<Highscores>> {
        &self.highscores_changed
    }

    /// Listeners for failed commands.
    pub fn command_failed(&self) -> &ListenerHub<CommandFailure> {
        &self.command_failed
    }

    /// Receiver for every subsequent notification.
    pub fn subscribe(&self) -> broadcast::Receiver<GameNotification> {
        self.feed.subscribe()
    }

    /// Dispatch `notification` to its typed listeners, then to the feed.
    pub fn publish(&self, notification: GameNotification) {
        match &notification {
            GameNotification::StateChanged(state) => self.state_changed.notify(state),
            GameNotification::TimerUpdated { time_remaining } => {
                self.timer_updated.notify(time_remaining)
            }
            GameNotification::RoundEnded(summary) => self.round_ended.notify(summary),
            GameNotification::HighscoresChanged(highscores) => {
                self.highscores_changed.notify(highscores)
            }
            GameNotification::CommandFailed(failure) => self.command_failed.notify(failure),
        }
        // No receivers is not an error.
        let _ = self.feed.send(notification);
    }
}
