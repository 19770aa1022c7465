//! gather-relay: forwards presence events from a virtual space to
//! downstream sinks.
//!
//! Watches the space's event stream, turns join/leave signals into
//! deduplicated, identity-enriched events, and delivers them at least once
//! to a webhook and/or an append-only log.

mod server;
mod wiring;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use gather_common::{RelayError, Result};
use gather_config::{config_to_json, RelayConfig};
use gather_engine::{ConnectionSupervisor, DeliveryQueue, Relay, WebSocketConnector};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::server::{build_router, AppState};

#[derive(Parser)]
#[command(name = "gather-relay", about = "Presence event relay for a virtual space")]
struct Args {
    /// Path to the TOML config file (defaults to the platform config dir).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the inspection server port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Load and validate the configuration, print it redacted, and exit.
    #[arg(long)]
    check_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = gather_config::load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(&config.logging.level).into()),
        )
        .init();

    if args.check_config {
        println!("{}", config_to_json(&config));
        return Ok(());
    }

    run(config).await
}

async fn run(config: RelayConfig) -> Result<()> {
    let shutdown = CancellationToken::new();
    let flush_stop = CancellationToken::new();

    let queue = DeliveryQueue::new(wiring::build_lanes(&config)?);
    tracing::info!(sinks = ?queue.sink_names(), "Delivery queue ready");

    let connector = Arc::new(WebSocketConnector::new(
        config.upstream.ws_url()?,
        std::time::Duration::from_secs(config.upstream.connect_timeout_secs),
    ));
    let (supervisor, events) = ConnectionSupervisor::start(
        connector,
        wiring::supervisor_config(&config),
        &shutdown,
    );

    let relay = Relay::new(queue.clone(), wiring::resolve_settings(&config));
    let relay_task = tokio::spawn(relay.run(events, shutdown.clone()));
    let flush_task = tokio::spawn(queue.clone().run(flush_stop.clone()));

    let server_task = if config.server.enabled {
        let addr = format!("{}:{}", config.server.host, config.server.port);
        let listener = TcpListener::bind(&addr).await?;
        tracing::info!("gather-relay listening on {}", addr);

        let app = build_router(AppState::new(queue, config.server.inspect_token.clone()));
        let stop = shutdown.clone();
        Some(tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { stop.cancelled().await })
                .await
        }))
    } else {
        None
    };

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    shutdown.cancel();

    supervisor.shutdown().await;
    drain(relay_task, flush_stop, flush_task).await;
    if let Some(task) = server_task {
        match task.await {
            Ok(result) => result.map_err(|e| RelayError::Server(e.to_string()))?,
            Err(e) => tracing::error!(error = %e, "Server task panicked"),
        }
    }

    tracing::info!("gather-relay stopped");
    Ok(())
}

fn default_filter(level: &str) -> String {
    ["gather_relay", "gather_engine", "gather_config"]
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Waits for the relay to stop before the final flush, so whatever it
/// enqueued last is still delivered.
async fn drain(
    relay_task: JoinHandle<()>,
    flush_stop: CancellationToken,
    flush_task: JoinHandle<()>,
) {
    join(relay_task, "relay").await;
    flush_stop.cancel();
    join(flush_task, "delivery").await;
}

async fn join(task: JoinHandle<()>, name: &str) {
    if let Err(e) = task.await {
        tracing::error!(task = name, error = %e, "Task panicked");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::Utc;
    use gather_common::SinkError;
    use gather_engine::{Event, EventKind, Identity, Sink, SinkLane};

    use super::*;

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Sink for Recorder {
        fn name(&self) -> &str {
            "webhook"
        }

        async fn deliver(&self, batch: &[Event]) -> std::result::Result<(), SinkError> {
            self.delivered
                .lock()
                .unwrap()
                .extend(batch.iter().map(|e| e.session_id.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn drain_flushes_what_the_relay_enqueued_last() {
        let sink = Arc::new(Recorder::default());
        let queue = DeliveryQueue::new(vec![SinkLane::new(sink.clone(), Duration::from_secs(60))]);
        let flush_stop = CancellationToken::new();
        let flush_task = tokio::spawn(queue.clone().run(flush_stop.clone()));

        let relay_queue = queue.clone();
        let relay_task = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            relay_queue
                .enqueue(Event::new(EventKind::Leave, "7".into(), Identity::named("Ada"), Utc::now()))
                .await;
        });

        drain(relay_task, flush_stop, flush_task).await;

        assert_eq!(*sink.delivered.lock().unwrap(), vec!["7".to_string()]);
        assert_eq!(queue.pending_len().await, 0);
    }

    #[test]
    fn args_parse_overrides() {
        let args = Args::parse_from(["gather-relay", "--config", "/tmp/r.toml", "-p", "9000"]);
        assert_eq!(args.config, Some(PathBuf::from("/tmp/r.toml")));
        assert_eq!(args.port, Some(9000));
        assert!(!args.check_config);
    }

    #[test]
    fn default_filter_covers_workspace_crates() {
        assert_eq!(
            default_filter("debug"),
            "gather_relay=debug,gather_engine=debug,gather_config=debug"
        );
    }
}
