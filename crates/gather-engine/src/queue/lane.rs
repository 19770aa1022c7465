//! One sink's pending events and its flush procedure.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::event::Event;
use crate::sink::Sink;

/// A sink plus how often its lane is flushed.
#[derive(Clone)]
pub struct SinkLane {
    pub sink: Arc<dyn Sink>,
    pub flush_interval: Duration,
}

impl SinkLane {
    pub fn new(sink: Arc<dyn Sink>, flush_interval: Duration) -> Self {
        Self {
            sink,
            flush_interval,
        }
    }
}

/// Outcome of flushing one lane.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LaneReport {
    pub sink: String,
    pub attempted: usize,
    pub delivered: usize,
    pub requeued: usize,
}

/// Pending events for one sink, as returned by inspection.
#[derive(Debug, Clone, Serialize)]
pub struct LaneSnapshot {
    pub sink: String,
    pub pending: Vec<Event>,
}

pub(crate) struct Lane {
    pub(crate) sink: Arc<dyn Sink>,
    pub(crate) flush_interval: Duration,
    pending: Mutex<VecDeque<Event>>,
    /// Held for the whole of a flush so two flushes of the same lane never
    /// interleave their take/requeue steps.
    flushing: Mutex<()>,
}

impl Lane {
    pub(crate) fn new(lane: SinkLane) -> Self {
        Self {
            sink: lane.sink,
            flush_interval: lane.flush_interval,
            pending: Mutex::new(VecDeque::new()),
            flushing: Mutex::new(()),
        }
    }

    pub(crate) fn name(&self) -> &str {
        self.sink.name()
    }

    pub(crate) async fn push(&self, event: Event) {
        self.pending.lock().await.push_back(event);
    }

    pub(crate) async fn len(&self) -> usize {
        self.pending.lock().await.len()
    }

    pub(crate) async fn snapshot(&self) -> LaneSnapshot {
        LaneSnapshot {
            sink: self.name().to_string(),
            pending: self.pending.lock().await.iter().cloned().collect(),
        }
    }

    /// Take everything pending, deliver it as one batch, and put back
    /// whatever the sink did not accept, ahead of anything that arrived
    /// meanwhile. The pending lock is never held across `deliver`.
    pub(crate) async fn flush(&self) -> LaneReport {
        let _flushing = self.flushing.lock().await;

        let batch: Vec<Event> = self.pending.lock().await.drain(..).collect();
        let mut report = LaneReport {
            sink: self.name().to_string(),
            attempted: batch.len(),
            ..Default::default()
        };
        if batch.is_empty() {
            return report;
        }

        match self.sink.deliver(&batch).await {
            Ok(()) => {
                report.delivered = batch.len();
                info!(sink = %report.sink, events = batch.len(), "Batch delivered");
            }
            Err(e) => {
                let failed = e.undelivered(batch.len());
                report.requeued = failed.len();
                report.delivered = batch.len() - failed.len();

                let mut pending = self.pending.lock().await;
                for &i in failed.iter().rev() {
                    pending.push_front(batch[i].clone());
                }
                warn!(
                    sink = %report.sink,
                    error = %e,
                    requeued = report.requeued,
                    pending = pending.len(),
                    "Batch delivery failed, will retry on next flush"
                );
            }
        }

        report
    }
}
