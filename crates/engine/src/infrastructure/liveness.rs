//! Background timers: ping sweep, session reaper, lobby heartbeat.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::infrastructure::config::RelayConfig;
use crate::use_cases::Relay;

/// Spawn the three liveness timers. They stop when `cancel_token` fires.
pub fn spawn_liveness_tasks(
    relay: Arc<Relay>,
    config: &RelayConfig,
    cancel_token: CancellationToken,
) -> Vec<JoinHandle<()>> {
    let ping = {
        let relay = relay.clone();
        spawn_ticker(
            "ping sweep",
            config.ping_interval(),
            cancel_token.clone(),
            move || {
                let relay = relay.clone();
                async move { relay.ping_sweep().await }
            },
        )
    };

    let reaper = {
        let relay = relay.clone();
        spawn_ticker(
            "session reaper",
            config.session_sweep_interval(),
            cancel_token.clone(),
            move || {
                let relay = relay.clone();
                async move { relay.reap().await }
            },
        )
    };

    let heartbeat = spawn_ticker(
        "lobby heartbeat",
        config.lobby_heartbeat_interval(),
        cancel_token,
        move || {
            let relay = relay.clone();
            async move { relay.heartbeat().await }
        },
    );

    vec![ping, reaper, heartbeat]
}

fn spawn_ticker<F, Fut>(
    name: &'static str,
    period: Duration,
    cancel_token: CancellationToken,
    mut tick: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    tokio::spawn(async move {
        tracing::info!(task = name, period_secs = period.as_secs(), "Starting liveness task");
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately.
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => {
                    tracing::info!(task = name, "Liveness task shutting down");
                    break;
                }
                _ = interval.tick() => tick().await,
            }
        }
    })
}
