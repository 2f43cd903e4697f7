//! Soundbeats replay binary: feeds a recorded push stream through the synchronizer and logs
//! the derived views.

use std::{env, sync::Arc};

use anyhow::{Context, bail};
use tokio_stream::{StreamExt, wrappers::BroadcastStream};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use soundbeats_panel::{
    config::PanelConfig,
    connection::{ChannelConnection, ReplayReader, TransportError},
    dao::{catalog::Catalog, catalog_store},
    services::{
        game_service::GameService,
        views::{self, RoundStatus, TimerView},
    },
    state::GameNotification,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let Some(path) = env::args_os().nth(1) else {
        bail!("usage: soundbeats-replay <recording.jsonl>");
    };

    let config = PanelConfig::load();
    info!(
        playlist = %config.default_playlist_id,
        timer_seconds = config.default_timer_seconds,
        "panel defaults"
    );
    let store = catalog_store::store_for(&config.catalog).context("building catalog store")?;

    let (connection, remote) = ChannelConnection::pair(16);
    // Replays are read-only: the recording is the only source of truth.
    let _commands = remote.commands.serve(|command| {
        Err(TransportError::remote(
            "replay_mode",
            format!("{} is not available while replaying", command.name()),
        ))
    });

    let service = GameService::new(Arc::new(connection), Catalog::new(store));
    let feed = BroadcastStream::new(service.subscribe());
    let reporter = tokio::spawn(report(feed));

    let mut reader = ReplayReader::open(&path)
        .await
        .with_context(|| format!("opening {}", path.to_string_lossy()))?;
    let mut replayed = 0usize;
    while let Some((line, recorded)) = reader.next_event().await.context("reading recording")? {
        if let Err(err) = remote.pushes.push_raw(&recorded.event, recorded.data) {
            warn!(line, error = %err, "skipping event");
            continue;
        }
        replayed += 1;
        tokio::task::yield_now().await;
    }

    info!(replayed, "recording replayed");
    let final_state = service.get_state();
    service.disconnect();
    drop(service);
    reporter.await.context("joining reporter")?;

    for standing in views::leaderboard(&final_state) {
        info!(
            rank = standing.rank,
            team = %standing.team.name,
            score = standing.team.score,
            average = %standing.average,
            "final standing"
        );
    }
    Ok(())
}

/// Log the views derived from every notification until the feed closes.
async fn report(mut feed: BroadcastStream<GameNotification>) {
    while let Some(notification) = feed.next().await {
        match notification {
            Ok(GameNotification::StateChanged(state)) => {
                let status = RoundStatus::of(&state);
                let timer = TimerView::of(&state);
                let leader = views::standings(&state.teams)
                    .first()
                    .map(|team| format!("{} ({})", team.name, team.score));
                info!(
                    round = state.current_round,
                    status = status.text(),
                    timer = %timer.display,
                    level = ?timer.level,
                    leader = leader.as_deref().unwrap_or("-"),
                    "state changed"
                );
            }
            Ok(GameNotification::RoundEnded(summary)) => {
                info!(
                    round = summary.round,
                    year = summary.actual_year,
                    song = %summary.song.song,
                    artist = %summary.song.artist,
                    scores = ?summary.round_scores,
                    "round ended"
                );
            }
            Ok(GameNotification::TimerUpdated { .. }) => {}
            Ok(GameNotification::HighscoresChanged(highscores)) => {
                if let Some(best) = &highscores.all_time_best {
                    info!(best = %views::highscore_line(best), "highscores changed");
                }
            }
            Ok(GameNotification::CommandFailed(failure)) => {
                warn!(command = failure.command, error = %failure.error, "command failed");
            }
            Err(err) => warn!(error = %err, "reporter lagged behind"),
        }
    }
}

/// Configure tracing subscribers so logs include spans by default.
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,soundbeats_panel=debug".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
