//! Ping Demo
//!
//! Walks through every dispatch surface of the Conduit mediator:
//!
//! - `send` through a pipeline of behaviors (logging, validation, timeout)
//! - `publish` to several handlers, one of which fails
//! - `create_stream` with a consumer-side cancellation token
//! - `send_any` / `publish_any` with values whose type is erased
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-demo -- --ticks 5 --stop-after 3
//! CONDUIT_MEDIATOR__PUBLISH_STRATEGY=concurrent cargo run --package ping-demo
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use conduit::prelude::*;
use futures::StreamExt;
use futures::stream;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "ping-demo", about = "Conduit mediator walkthrough")]
struct Args {
    /// Configuration file (defaults to searching for conduit.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of ticks the stream produces.
    #[arg(long, default_value_t = 5)]
    ticks: u32,

    /// Cancel the stream after this many ticks.
    #[arg(long)]
    stop_after: Option<u32>,
}

// ============================================================================
// Messages
// ============================================================================

struct Ping {
    payload: String,
}

impl Request for Ping {
    type Response = String;
}

struct ResetCounter;

impl Request for ResetCounter {
    type Response = Unit;
}

struct Pinged {
    sequence: u64,
}

impl Notification for Pinged {}

struct Ticks {
    count: u32,
    interval: Duration,
}

impl StreamRequest for Ticks {
    type Item = u32;
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Clone, Default)]
struct Counter(Arc<AtomicU64>);

struct PingHandler {
    counter: Counter,
}

#[async_trait]
impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, request: &Ping, _cancel: &CancellationToken) -> DispatchResult<String> {
        let n = self.counter.0.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(format!("pong #{n}: {}", request.payload))
    }
}

struct ResetHandler {
    counter: Counter,
}

#[async_trait]
impl RequestHandler<ResetCounter> for ResetHandler {
    async fn handle(&self, _request: &ResetCounter, _cancel: &CancellationToken) -> DispatchResult<Unit> {
        self.counter.0.store(0, Ordering::SeqCst);
        Ok(Unit)
    }
}

struct RejectEmpty;

#[async_trait]
impl RequestPreProcessor<Ping> for RejectEmpty {
    async fn process(&self, request: &Ping, _cancel: &CancellationToken) -> DispatchResult<()> {
        if request.payload.trim().is_empty() {
            return Err(DispatchError::invalid_argument("Ping", "payload is empty"));
        }
        Ok(())
    }
}

struct AuditLog;

#[async_trait]
impl NotificationHandler<Pinged> for AuditLog {
    async fn handle(&self, notification: &Pinged, _cancel: &CancellationToken) -> DispatchResult<()> {
        info!(sequence = notification.sequence, "audit: ping recorded");
        Ok(())
    }
}

struct FlakyMetrics;

#[async_trait]
impl NotificationHandler<Pinged> for FlakyMetrics {
    async fn handle(&self, notification: &Pinged, _cancel: &CancellationToken) -> DispatchResult<()> {
        if notification.sequence % 2 == 0 {
            return Err(DispatchError::handler("metrics sink unavailable"));
        }
        Ok(())
    }
}

struct TickHandler;

impl StreamHandler<Ticks> for TickHandler {
    fn handle(&self, request: Ticks, cancel: CancellationToken) -> ItemStream<u32> {
        let Ticks { count, interval } = request;
        stream::unfold(1, move |n| {
            let cancel = cancel.clone();
            async move {
                if n > count {
                    return None;
                }
                tokio::select! {
                    _ = cancel.cancelled() => None,
                    _ = tokio::time::sleep(interval) => Some((Ok(n), n + 1)),
                }
            }
        })
        .boxed()
    }
}

fn build_registry() -> Result<ServiceRegistry> {
    let counter = Counter::default();
    let mut registry = ServiceRegistry::new();

    registry
        .add_request_handler::<Ping, _>(PingHandler {
            counter: counter.clone(),
        })?
        .add_behavior::<Ping, _>(LoggingBehavior::new())
        .add_pre_processor::<Ping, _>(RejectEmpty)
        .add_behavior::<Ping, _>(TimeoutBehavior::new(Duration::from_secs(1)));
    registry.add_request_handler::<ResetCounter, _>(ResetHandler { counter })?;
    registry
        .add_notification_handler::<Pinged, _>(AuditLog)
        .add_notification_handler::<Pinged, _>(FlakyMetrics);
    registry.add_stream_handler::<Ticks, _>(TickHandler)?;

    Ok(registry)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::new().file(path).load()?,
        None => load_config()?,
    };
    let mediator = bootstrap(build_registry()?, &config)?;

    // Requests
    for payload in ["hello", "world", "   "] {
        match mediator
            .send(Ping {
                payload: payload.to_string(),
            })
            .await
        {
            Ok(reply) => info!(%reply, "send"),
            Err(e) => warn!(error = %e, "send rejected"),
        }
    }

    // Notifications
    for sequence in 1..=2 {
        if let Err(e) = mediator.publish(Pinged { sequence }).await {
            warn!(error = %e, "publish reported failures");
        }
    }

    // Streams
    let stop = CancellationToken::new();
    let mut ticks = mediator
        .create_stream(Ticks {
            count: args.ticks,
            interval: Duration::from_millis(100),
        })
        .await?
        .cancel_on(stop.clone());
    while let Some(tick) = ticks.next().await {
        match tick {
            Ok(n) => {
                info!(tick = n, "stream");
                if args.stop_after == Some(n) {
                    stop.cancel();
                }
            }
            Err(e) => warn!(error = %e, "stream ended early"),
        }
    }

    // Untyped dispatch
    let erased = AnyMessage::new(ResetCounter);
    let response = mediator.send_any(erased).await?;
    info!(response = response.type_name(), unit = response.is_unit(), "send_any");

    mediator.publish_any(AnyMessage::new(Pinged { sequence: 3 })).await?;
    if let Err(e) = mediator.send_any(AnyMessage::new(42u8)).await {
        warn!(error = %e, "send_any rejected");
    }

    info!(cached = ?mediator.cached_entries(), "done");
    Ok(())
}
