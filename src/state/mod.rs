pub mod game;
pub mod hub;

use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

use tracing::debug;

pub use self::hub::{CommandFailure, GameNotification, ListenerHub, Notifications, Unsubscribe};
use self::game::{GameState, Highscores};

/// Capacity of the broadcast feed mirroring every notification.
pub const NOTIFICATION_FEED_CAPACITY: usize = 64;

/// Container owning the single live [`GameState`] reference of a panel session.
///
/// Every update runs under `update_gate`: the next state is computed from the current one,
/// installed, and its notifications queued before the gate is released, so updates never
/// interleave. Listeners run after the gate is released, in installation order, and may
/// themselves update the store; notifications raised from a listener are delivered once
/// the current listener round finishes.
pub struct StateStore {
    current: RwLock<Arc<GameState>>,
    highscores: RwLock<Option<Arc<Highscores>>>,
    notifications: Notifications,
    update_gate: Mutex<()>,
    outbox: Mutex<VecDeque<GameNotification>>,
    delivering: AtomicBool,
}

impl StateStore {
    /// Store holding an inactive state.
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(GameState::inactive())),
            highscores: RwLock::new(None),
            notifications: Notifications::new(NOTIFICATION_FEED_CAPACITY),
            update_gate: Mutex::new(()),
            outbox: Mutex::new(VecDeque::new()),
            delivering: AtomicBool::new(false),
        }
    }

    /// Latest published state reference.
    pub fn snapshot(&self) -> Arc<GameState> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Latest highscore table, if one was loaded.
    pub fn highscores(&self) -> Option<Arc<Highscores>> {
        self.highscores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Typed listeners and feed.
    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    /// Replace the state wholesale and notify.
    pub fn replace(&self, next: GameState) -> Arc<GameState> {
        self.update_with(|_| Some(next), |_| None)
            .unwrap_or_else(|| self.snapshot())
    }

    /// Derive the next state from the current one; `None` leaves the store untouched and
    /// fires nothing. Returns the installed reference when an update happened.
    pub fn update(
        &self,
        derive: impl FnOnce(&GameState) -> Option<GameState>,
    ) -> Option<Arc<GameState>> {
        self.update_with(derive, |_| None)
    }

    /// Like [`StateStore::update`]; the notification returned by `follow_up` is delivered
    /// right after the state-changed one.
    pub fn update_with(
        &self,
        derive: impl FnOnce(&GameState) -> Option<GameState>,
        follow_up: impl FnOnce(&Arc<GameState>) -> Option<GameNotification>,
    ) -> Option<Arc<GameState>> {
        let next = {
            let _gate = self
                .update_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);

            let next = Arc::new(derive(&self.snapshot())?);
            {
                let mut slot = self.current.write().unwrap_or_else(PoisonError::into_inner);
                *slot = Arc::clone(&next);
            }
            debug!(
                active = next.active,
                round = next.current_round,
                round_active = next.round_active,
                teams = next.teams.len(),
                "game state replaced"
            );

            let mut outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
            outbox.push_back(GameNotification::StateChanged(Arc::clone(&next)));
            outbox.extend(follow_up(&next));
            next
        };

        self.deliver();
        Some(next)
    }

    /// Install a freshly loaded highscore table and notify.
    pub fn set_highscores(&self, highscores: Highscores) -> Arc<Highscores> {
        let highscores = Arc::new(highscores);
        {
            let _gate = self
                .update_gate
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            let mut slot = self
                .highscores
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *slot = Some(Arc::clone(&highscores));
            self.outbox
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push_back(GameNotification::HighscoresChanged(Arc::clone(&highscores)));
        }
        self.deliver();
        highscores
    }

    /// Queue a notification that carries no state change.
    pub fn announce(&self, notification: GameNotification) {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(notification);
        self.deliver();
    }

    /// Drop back to an inactive state (session end).
    pub fn reset(&self) -> Arc<GameState> {
        {
            let mut slot = self
                .highscores
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            slot.take();
        }
        self.replace(GameState::inactive())
    }

    /// Drain the outbox unless another caller already is; that caller then delivers what
    /// was queued here, keeping a single ordered delivery sequence.
    fn deliver(&self) {
        loop {
            if self.delivering.swap(true, Ordering::AcqRel) {
                return;
            }
            {
                let _delivering = DeliveryGuard(&self.delivering);
                while let Some(notification) = self.pop_outbox() {
                    self.notifications.publish(notification);
                }
            }
            // Something queued between the last pop and the flag release is ours to send.
            if self
                .outbox
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_empty()
            {
                return;
            }
        }
    }

    fn pop_outbox(&self) -> Option<GameNotification> {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }
}

/// Releases the delivery flag even when a listener panics.
struct DeliveryGuard<'a>(&'a AtomicBool);

impl Drop for DeliveryGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for StateStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[test]
    fn every_update_installs_a_new_reference() {
        let store = StateStore::new();
        let before = store.snapshot();

        let after = store
            .update(|state| Some(state.with_timer_remaining(state.timer_remaining)))
            .unwrap();

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(*before, *after);
        assert!(Arc::ptr_eq(&after, &store.snapshot()));
    }

    #[test]
    fn declined_update_keeps_reference_and_stays_silent() {
        let store = StateStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let _guard = {
            let calls = Arc::clone(&calls);
            store.notifications().state_changed().subscribe(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            })
        };
        let before = store.snapshot();

        assert!(store.update(|_| None).is_none());

        assert!(Arc::ptr_eq(&before, &store.snapshot()));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listeners_can_read_the_store_they_observe() {
        let store = Arc::new(StateStore::new());
        let observed = Arc::new(Mutex::new(None));
        let _guard = {
            let store_ref = Arc::downgrade(&store);
            let observed = Arc::clone(&observed);
            store.notifications().state_changed().subscribe(move |state| {
                let live = store_ref.upgrade().map(|store| store.snapshot());
                *observed.lock().unwrap() = live.map(|live| Arc::ptr_eq(&live, state));
            })
        };

        store.replace(GameState {
            active: true,
            ..GameState::inactive()
        });

        assert_eq!(*observed.lock().unwrap(), Some(true));
    }

    #[test]
    fn reset_clears_highscores() {
        let store = StateStore::new();
        store.set_highscores(Highscores::default());
        store.reset();
        assert!(store.highscores().is_none());
        assert!(!store.snapshot().active);
    }

    #[test]
    fn listener_may_update_the_store_it_observes() {
        let store = Arc::new(StateStore::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let _guard = {
            let store_ref = Arc::downgrade(&store);
            let seen = Arc::clone(&seen);
            store.notifications().state_changed().subscribe(move |state| {
                seen.lock().unwrap().push(state.active);
                if state.active
                    && let Some(store) = store_ref.upgrade()
                {
                    store.reset();
                }
            })
        };

        store.replace(GameState {
            active: true,
            ..GameState::inactive()
        });

        assert_eq!(*seen.lock().unwrap(), vec![true, false]);
        assert!(!store.snapshot().active);
    }

    #[test]
    fn follow_up_is_delivered_after_state_change() {
        let store = StateStore::new();
        let mut feed = store.notifications().subscribe();

        store.update_with(
            |state| Some(state.with_timer_remaining(5)),
            |_| Some(GameNotification::TimerUpdated { time_remaining: 5 }),
        );

        assert!(matches!(
            feed.try_recv(),
            Ok(GameNotification::StateChanged(state)) if state.timer_remaining == 5
        ));
        assert!(matches!(
            feed.try_recv(),
            Ok(GameNotification::TimerUpdated { time_remaining: 5 })
        ));
    }
}
