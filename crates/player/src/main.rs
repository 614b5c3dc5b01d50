//! Worldcast Player - headless host/viewer harness.
//!
//! ```text
//! worldcast-player host <world-url> [name]
//! worldcast-player join <code> [name]
//! ```
//!
//! The relay address comes from `WORLDCAST_URL` (default `ws://localhost:3000/ws`).

use anyhow::{bail, Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use worldcast_player::{ClientConfig, HostParams, SessionClient, SessionEvent};

const DEFAULT_URL: &str = "ws://localhost:3000/ws";
const HARNESS_COLOR: u32 = 0x4a90d9;

enum Mode {
    Host { world_url: String },
    Join { code: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worldcast_player=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let mode = match (args.next().as_deref(), args.next()) {
        (Some("host"), Some(world_url)) => Mode::Host { world_url },
        (Some("join"), Some(code)) => Mode::Join { code },
        _ => bail!("usage: worldcast-player (host <world-url> | join <code>) [name]"),
    };
    let name = args.next().unwrap_or_else(|| "Player".to_string());

    let url = std::env::var("WORLDCAST_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    let config = ClientConfig::new(&url).context("Invalid WORLDCAST_URL")?;
    tracing::info!(url = %config.url, "Starting Worldcast Player");

    let client = SessionClient::new(config);
    let mut events = client.subscribe();
    client.connect();

    let queued = match &mode {
        Mode::Host { world_url } => {
            client.create_session(HostParams::new(world_url.clone(), name, HARNESS_COLOR))
        }
        Mode::Join { code } => client.join_session(code, &name, HARNESS_COLOR),
    };
    if !queued {
        bail!("Session request was rejected; check the session code");
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            event = events.recv() => match event {
                Ok(event) => on_event(&client, event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event stream lagged");
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    client.disconnect();
    Ok(())
}

fn on_event(client: &SessionClient, event: SessionEvent) {
    match event {
        SessionEvent::Connection(state) => tracing::info!(?state, "Connection state changed"),
        SessionEvent::SessionCreated { session_code, .. } => {
            tracing::info!(session_code = %session_code, "Hosting session");
        }
        SessionEvent::SessionJoined {
            session_code,
            host_name,
            ..
        } => tracing::info!(session_code = %session_code, host = %host_name, "Joined session"),
        SessionEvent::SessionError { error, code, .. } => {
            tracing::warn!(code = %code, "Session error: {}", error);
        }
        SessionEvent::SessionEnded { reason } => tracing::info!(reason = %reason, "Session ended"),
        SessionEvent::PeerJoined(peer) => {
            tracing::info!(peer = %peer.id, name = %peer.name, "Peer joined");
        }
        SessionEvent::PeerLeft { id } => tracing::info!(peer = %id, "Peer left"),
        SessionEvent::FullStateRequested {
            viewer_id,
            viewer_name,
        } => {
            tracing::info!(viewer = %viewer_id, name = %viewer_name, "Sending snapshot");
            client.send_state([0.0; 3], [0.0, 0.0, 0.0, 1.0], None, None);
            client.send_playback_sync(true, 0.0);
        }
        SessionEvent::Chat { name, message, .. } => {
            tracing::info!(from = %name, "{}", message);
        }
        other => tracing::debug!(event = ?other, "Session event"),
    }
}
