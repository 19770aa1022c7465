//! In-memory delivery queue with per-sink lanes.
//!
//! Every enqueued event is appended to each sink's lane. A lane is flushed
//! on its own timer (or on demand) and keeps only what its sink has not
//! yet accepted, so one sink retrying never re-sends to another sink that
//! already succeeded. Nothing is persisted: events pending at process exit
//! are lost.

mod lane;


use std::sync::Arc;

use futures_util::future::join_all;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::event::Event;

use lane::Lane;
pub use lane::{LaneReport, LaneSnapshot, SinkLane};

/// Outcome of a flush across all lanes.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlushReport {
    pub lanes: Vec<LaneReport>,
}

impl FlushReport {
    pub fn delivered(&self) -> usize {
        self.lanes.iter().map(|l| l.delivered).sum()
    }

    pub fn requeued(&self) -> usize {
        self.lanes.iter().map(|l| l.requeued).sum()
    }
}

/// Cheaply cloneable handle; clones share the same lanes.
#[derive(Clone)]
pub struct DeliveryQueue {
    lanes: Arc<Vec<Lane>>,
}

impl DeliveryQueue {
    pub fn new(lanes: Vec<SinkLane>) -> Self {
        Self {
            lanes: Arc::new(lanes.into_iter().map(Lane::new).collect()),
        }
    }

    /// Append `event` to every lane, preserving arrival order.
    pub async fn enqueue(&self, event: Event) {
        debug!(
            session = %event.session_id,
            kind = event.kind.as_str(),
            "Event queued"
        );
        for lane in self.lanes.iter() {
            lane.push(event.clone()).await;
        }
    }

    /// Flush every lane concurrently; lanes do not wait on each other's
    /// sinks beyond this call returning.
    pub async fn flush(&self) -> FlushReport {
        let lanes = join_all(self.lanes.iter().map(|l| l.flush())).await;
        FlushReport { lanes }
    }

    /// Flush the lane at `index` only.
    pub async fn flush_lane(&self, index: usize) -> Option<LaneReport> {
        Some(self.lanes.get(index)?.flush().await)
    }

    /// Pending events per sink.
    pub async fn snapshot(&self) -> Vec<LaneSnapshot> {
        join_all(self.lanes.iter().map(|l| l.snapshot())).await
    }

    /// Total pending events summed over lanes.
    pub async fn pending_len(&self) -> usize {
        join_all(self.lanes.iter().map(|l| l.len()))
            .await
            .into_iter()
            .sum()
    }

    pub fn sink_names(&self) -> Vec<String> {
        self.lanes.iter().map(|l| l.name().to_string()).collect()
    }

    /// Flush each lane on its own interval until `shutdown` fires, then
    /// make one final attempt for every lane.
    pub async fn run(self, shutdown: CancellationToken) {
        let tasks = (0..self.lanes.len()).map(|i| {
            let queue = self.clone();
            let shutdown = shutdown.clone();
            async move {
                let interval = queue.lanes[i].flush_interval;
                let mut ticker =
                    tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
                ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
                loop {
                    tokio::select! {
                        _ = shutdown.cancelled() => break,
                        _ = ticker.tick() => {
                            queue.lanes[i].flush().await;
                        }
                    }
                }
            }
        });
        join_all(tasks).await;

        let report = self.flush().await;
        info!(
            delivered = report.delivered(),
            undelivered = report.requeued(),
            "Final flush complete"
        );
    }
}
