//! Scripted duel harness: two players trade punches until one goes down.
use anyhow::Result;
use gameplay_core::{Attribute, AvatarTransform, DeathState, GameplayTag, InputTag};
use gameplay_runtime::{Event, Session, SessionConfig, TeamEvent, Topic};
use glam::Vec3;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Ticks between two swings of the scripted attacker.
const SWING_INTERVAL: u64 = 12;
const MAX_TICKS: u64 = 30 * 60;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = SessionConfig::from_env();
    setup_logging(&config)?;

    let mut session = Session::load(config)?;
    let watchers = [Topic::Lifecycle, Topic::Team]
        .map(|topic| tokio::spawn(log_events(session.subscribe(topic))));

    let attacker = session.add_player(None)?;
    let defender = session.add_player(None)?;
    session.place(attacker, AvatarTransform::new(Vec3::ZERO, Vec3::X));
    session.place(
        defender,
        AvatarTransform::new(Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_X),
    );
    session.start_game_mode();

    while session.current_tick() < MAX_TICKS {
        let phase = session.current_tick() % SWING_INTERVAL;
        match phase {
            0 => session.press_input(attacker, InputTag::Primary)?,
            1 => session.release_input(attacker, InputTag::Primary)?,
            4 => {
                session.animation_event(attacker, GameplayTag::EventMeleeHit)?;
            }
            _ => {}
        }
        session.tick()?;

        let down = session
            .player(defender)
            .is_some_and(|player| player.server().death_state() != DeathState::NotDead);
        if down {
            tracing::info!(tick = session.current_tick(), "defender is down");
            break;
        }
    }

    // Let in-flight replication settle before the summary.
    session.run_for(session.config().latency_ticks.max(1) * 2)?;
    session.end_game_mode();

    for player in session.players() {
        tracing::info!(
            actor = %player.id(),
            team = %player.team(),
            health = player.server().attribute(Attribute::Health),
            client_health = player.client().attribute(Attribute::Health),
            lives = player.server().attribute(Attribute::Lives),
            death = ?player.server().death_state(),
            "final state"
        );
    }
    tracing::info!(
        ticks = session.current_tick(),
        bytes = session.link().bytes_sent(),
        "duel finished"
    );

    drop(session);
    for watcher in watchers {
        let _ = watcher.await;
    }
    Ok(())
}

async fn log_events(mut events: broadcast::Receiver<Event>) {
    loop {
        match events.recv().await {
            Ok(Event::Gameplay { peer, message }) => {
                tracing::info!(?peer, owner = %message.owner, kind = ?message.kind, "lifecycle");
            }
            Ok(Event::Team(TeamEvent::LifeLost { team, died })) => {
                tracing::info!(%team, %died, "team lost a life");
            }
            Ok(_) => {}
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event watcher fell behind");
            }
            Err(RecvError::Closed) => break,
        }
    }
}

/// Setup logging to stdout, and to a file when a log directory is configured
fn setup_logging(config: &SessionConfig) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    let stdout_layer = tracing_subscriber::fmt::layer().with_target(false);

    let file_layer = match &config.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)?;
            let file_appender = tracing_appender::rolling::never(dir, "duel.log");
            let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
            // Leak the guard to keep file writer alive
            std::mem::forget(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking_file)
                    .with_ansi(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    if let Some(dir) = &config.log_dir {
        tracing::info!("Log file: {}/duel.log", dir.display());
    }
    Ok(())
}
