//! The state synchronizer: command operations with their success patches, push-event
//! merging, notifications and the song picker.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::broadcast;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::{
    connection::{Connection, TransportError},
    dao::{catalog::Catalog, models::Song},
    dto::{
        command::{
            AssignUserRequest, Command, CommandAck, GuessRequest, MediaAction, NewGameRequest,
            RenameTeamRequest,
        },
        game::GameStatePayload,
        push::{PushEvent, PushKind},
    },
    error::ServiceError,
    services::{push_events, song_service},
    state::{
        CommandFailure, GameNotification, StateStore, Unsubscribe,
        game::{GameState, Highscores, RoundSummary, SongRef},
    },
};

/// Settings sent by [`GameService::end_game`]: a game without teams.
const END_GAME_PLAYLIST_ID: &str = song_service::DEFAULT_PLAYLIST_ID;
const END_GAME_TIMER_SECONDS: u32 = 30;

/// Owns the panel session's [`GameState`] and keeps it in sync with the backend.
pub struct GameService {
    connection: Arc<dyn Connection>,
    catalog: Catalog,
    store: StateStore,
    subscriptions: Mutex<Vec<Unsubscribe>>,
}

impl GameService {
    /// Build the synchronizer and subscribe to every push event kind.
    ///
    /// Push handlers only hold a weak reference: dropping the last `Arc` stops merging.
    pub fn new(connection: Arc<dyn Connection>, catalog: Catalog) -> Arc<Self> {
        Arc::new_cyclic(|service: &Weak<Self>| {
            let subscriptions = PushKind::ALL
                .into_iter()
                .map(|kind| {
                    let service = service.clone();
                    connection.subscribe(
                        kind,
                        Box::new(move |event: &PushEvent| {
                            if let Some(service) = service.upgrade() {
                                push_events::apply_push(&service.store, event);
                            }
                        }),
                    )
                })
                .collect();

            Self {
                connection,
                catalog,
                store: StateStore::new(),
                subscriptions: Mutex::new(subscriptions),
            }
        })
    }

    /// Latest published state.
    pub fn get_state(&self) -> Arc<GameState> {
        self.store.snapshot()
    }

    /// Latest loaded highscore table.
    pub fn get_highscores(&self) -> Option<Arc<Highscores>> {
        self.store.highscores()
    }

    /// Fetch the full state and replace the local one with it.
    ///
    /// Unconfirmed local patches not reflected by the response are discarded.
    pub async fn load_state(&self) -> Result<Arc<GameState>, ServiceError> {
        let response = self.send(Command::GetGameState).await?;
        let payload: GameStatePayload = serde_json::from_value(response.0)?;
        let state = self.store.replace(GameState::from(payload));
        info!(
            active = state.active,
            game_id = state.game_id.as_deref().unwrap_or("none"),
            round = state.current_round,
            teams = state.teams.len(),
            "game state loaded"
        );
        Ok(state)
    }

    /// Start a new game and reload the state it produced.
    pub async fn start_new_game(
        &self,
        team_count: u8,
        playlist_id: &str,
        timer_seconds: u32,
    ) -> Result<CommandAck, ServiceError> {
        let request = NewGameRequest {
            team_count,
            playlist_id: playlist_id.to_string(),
            timer_seconds,
        };
        request.validate()?;

        let ack = self.send(Command::NewGame(request)).await?;
        info!(
            game_id = ack.game_id().unwrap_or("unknown"),
            team_count, playlist_id, "new game started"
        );
        self.load_state().await?;
        Ok(ack)
    }

    /// Open a round on `song`.
    pub async fn start_round(&self, song: &Song) -> Result<CommandAck, ServiceError> {
        let ack = self
            .send(Command::StartRound { song: song.clone() })
            .await?;
        let song_ref = SongRef::from(song);
        // Nothing to open a round on until a game was loaded.
        self.store
            .update(|state| state.active.then(|| state.with_round_started(song_ref)));
        Ok(ack)
    }

    /// Clear the revealed song and every team's guess.
    pub async fn advance_round(&self) -> Result<CommandAck, ServiceError> {
        let ack = self.send(Command::NextRound).await?;
        self.store.update(|state| Some(state.with_round_advanced()));
        Ok(ack)
    }

    /// Record `team_id`'s guess.
    pub async fn submit_guess(
        &self,
        team_id: &str,
        year: i32,
        has_bet: bool,
    ) -> Result<CommandAck, ServiceError> {
        let request = GuessRequest {
            team_id: team_id.to_string(),
            year,
            has_bet,
        };
        request.validate()?;

        let ack = self.send(Command::SubmitGuess(request)).await?;
        self.store
            .update(|state| Some(state.with_guess(team_id, year, has_bet)));
        Ok(ack)
    }

    /// Rename `team_id`. Surrounding whitespace is dropped.
    pub async fn rename_team(&self, team_id: &str, name: &str) -> Result<CommandAck, ServiceError> {
        let request = RenameTeamRequest {
            team_id: team_id.to_string(),
            name: name.trim().to_string(),
        };
        request.validate()?;

        let name = request.name.clone();
        let ack = self.send(Command::UpdateTeamName(request)).await?;
        self.store
            .update(|state| Some(state.with_team_name(team_id, &name)));
        Ok(ack)
    }

    /// Give `user_id` control of `team_id`, then reload: the backend also removes the user
    /// from any other team.
    pub async fn assign_user_to_team(
        &self,
        team_id: &str,
        user_id: &str,
    ) -> Result<CommandAck, ServiceError> {
        let request = AssignUserRequest {
            team_id: team_id.to_string(),
            user_id: user_id.to_string(),
        };
        request.validate()?;

        let ack = self.send(Command::AssignUserToTeam(request)).await?;
        self.load_state().await?;
        Ok(ack)
    }

    /// End the game by starting one without teams, then reload.
    pub async fn end_game(&self) -> Result<CommandAck, ServiceError> {
        let ack = self
            .send(Command::NewGame(NewGameRequest {
                team_count: 0,
                playlist_id: END_GAME_PLAYLIST_ID.to_string(),
                timer_seconds: END_GAME_TIMER_SECONDS,
            }))
            .await?;
        info!("game ended");
        self.load_state().await?;
        Ok(ack)
    }

    /// Forward a playback action. The game state is not touched.
    pub async fn media_control(&self, action: MediaAction) -> Result<CommandAck, ServiceError> {
        action.validate()?;
        self.send(Command::MediaControl(action)).await
    }

    /// Fetch the highscore table and announce it.
    pub async fn load_highscores(&self) -> Result<Arc<Highscores>, ServiceError> {
        let response = self.send(Command::GetHighscores).await?;
        let highscores: Highscores = serde_json::from_value(response.0)?;
        Ok(self.store.set_highscores(highscores))
    }

    /// Pick an unplayed song of `playlist_id` from the catalog.
    ///
    /// Advisory only: the backend validates the song when the round starts.
    pub async fn get_random_song(&self, playlist_id: &str) -> Result<Song, ServiceError> {
        let songs = self.catalog.songs().await;
        let playlists = self.catalog.playlists().await;
        let state = self.store.snapshot();

        song_service::pick_song(
            &songs,
            &playlists,
            playlist_id,
            &state.played_song_ids,
            &mut rand::rng(),
        )
    }

    /// Listen for every new state reference.
    pub fn on_state_changed(
        &self,
        listener: impl Fn(&Arc<GameState>) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.store.notifications().state_changed().subscribe(listener)
    }

    /// Listen for authoritative round results.
    pub fn on_round_ended(
        &self,
        listener: impl Fn(&Arc<RoundSummary>) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.store.notifications().round_ended().subscribe(listener)
    }

    /// Listen for accepted timer ticks.
    pub fn on_timer_update(&self, listener: impl Fn(&u32) + Send + Sync + 'static) -> Unsubscribe {
        self.store.notifications().timer_updated().subscribe(listener)
    }

    /// Listen for highscore reloads.
    pub fn on_highscores_changed(
        &self,
        listener: impl Fn(&Arc<Highscores>) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.store
            .notifications()
            .highscores_changed()
            .subscribe(listener)
    }

    /// Listen for commands that failed in transport or were refused by the backend.
    pub fn on_error(
        &self,
        listener: impl Fn(&CommandFailure) + Send + Sync + 'static,
    ) -> Unsubscribe {
        self.store.notifications().command_failed().subscribe(listener)
    }

    /// Receiver for every subsequent notification.
    pub fn subscribe(&self) -> broadcast::Receiver<GameNotification> {
        self.store.notifications().subscribe()
    }

    /// End the session: stop merging pushes and drop back to an inactive state.
    ///
    /// Only the first call has an effect. Safe to call from a listener.
    pub fn disconnect(&self) {
        let subscriptions: Vec<Unsubscribe> = self
            .subscriptions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        if subscriptions.is_empty() {
            debug!("panel session already disconnected");
            return;
        }
        debug!(count = subscriptions.len(), "dropping push subscriptions");
        drop(subscriptions);
        self.store.reset();
        info!("panel session disconnected");
    }

    async fn send(&self, command: Command) -> Result<CommandAck, ServiceError> {
        let name = command.name();
        let outcome = match self.connection.send_command(command).await.map(CommandAck) {
            Ok(ack) if ack.success() => Ok(ack),
            Ok(_) => Err(TransportError::remote(
                "command_failed",
                format!("{name} reported failure"),
            )),
            Err(err) => Err(err),
        };

        outcome.map_err(|error| {
            warn!(command = name, error = %error, "command failed");
            self.store
                .announce(GameNotification::CommandFailed(CommandFailure {
                    command: name,
                    error: error.clone(),
                }));
            ServiceError::from(error)
        })
    }
}
