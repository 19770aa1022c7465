//! The single worker that ties supervision, normalization and delivery
//! together. Every presence mutation happens on this task.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::normalizer::{EventNormalizer, ResolveSettings, ResolvedIdentity};
use crate::presence::IdentityDirectory;
use crate::queue::DeliveryQueue;
use crate::signal::TransportSignal;
use crate::supervisor::SupervisorEvent;

pub struct Relay {
    normalizer: EventNormalizer,
    resolved: mpsc::UnboundedReceiver<ResolvedIdentity>,
    queue: DeliveryQueue,
}

impl Relay {
    pub fn new(queue: DeliveryQueue, settings: ResolveSettings) -> Self {
        let (normalizer, resolved) =
            EventNormalizer::new(queue.clone(), IdentityDirectory::new(), settings);
        Self {
            normalizer,
            resolved,
            queue,
        }
    }

    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub fn normalizer(&self) -> &EventNormalizer {
        &self.normalizer
    }

    pub async fn handle_event(&mut self, event: SupervisorEvent) {
        match event {
            SupervisorEvent::Connected => {
                info!(present = self.normalizer.table().len(), "Upstream connected");
            }
            SupervisorEvent::Disconnected => self.normalizer.on_disconnect().await,
            SupervisorEvent::Signal(signal) => match signal {
                TransportSignal::Join(raw) => self.normalizer.handle_join_signal(&raw).await,
                TransportSignal::Leave(raw) => self.normalizer.handle_leave_signal(&raw).await,
                TransportSignal::IdentityAnnounced(raw) => {
                    self.normalizer.handle_identity_signal(&raw).await
                }
                TransportSignal::Snapshot(raw) => self.normalizer.handle_snapshot(&raw).await,
            },
        }
    }

    /// Process supervisor events and finished resolutions until shutdown
    /// or until the supervisor goes away.
    pub async fn run(mut self, mut events: mpsc::Receiver<SupervisorEvent>, shutdown: CancellationToken) {
        info!(sinks = ?self.queue.sink_names(), "Relay running");
        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                Some(resolved) = self.resolved.recv() => {
                    self.normalizer.complete_resolution(resolved).await;
                }
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event).await,
                    None => break,
                },
            }
        }
        info!(
            present = self.normalizer.table().len(),
            "Relay stopped"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use gather_common::SinkError;
    use serde_json::json;

    use super::*;
    use crate::event::{Event, EventKind};
    use crate::queue::SinkLane;
    use crate::signal::RawSignal;
    use crate::sink::Sink;

    #[derive(Default)]
    struct Recorder {
        delivered: Mutex<Vec<(EventKind, String, String)>>,
        fail_next: Mutex<bool>,
    }

    #[async_trait]
    impl Sink for Recorder {
        fn name(&self) -> &str {
            "webhook"
        }

        async fn deliver(&self, batch: &[Event]) -> Result<(), SinkError> {
            if std::mem::take(&mut *self.fail_next.lock().unwrap()) {
                return Err(SinkError::Network("unreachable".into()));
            }
            self.delivered.lock().unwrap().extend(batch.iter().map(|e| {
                (
                    e.kind,
                    e.session_id.to_string(),
                    e.identity.display_name.clone(),
                )
            }));
            Ok(())
        }
    }

    fn signal(event: &str, id: u64, name: Option<&str>) -> SupervisorEvent {
        let mut payload = json!({"event": event, "userId": id});
        if let Some(name) = name {
            payload["name"] = json!(name);
        }
        let raw = RawSignal::new(payload);
        SupervisorEvent::Signal(match event {
            "playerJoins" => TransportSignal::Join(raw),
            "playerExits" => TransportSignal::Leave(raw),
            _ => TransportSignal::IdentityAnnounced(raw),
        })
    }

    fn relay_with(sink: Arc<Recorder>) -> Relay {
        let queue = DeliveryQueue::new(vec![SinkLane::new(sink, Duration::from_secs(10))]);
        Relay::new(queue, ResolveSettings::default())
    }

    #[tokio::test(start_paused = true)]
    async fn end_to_end_through_run_loop() {
        let sink = Arc::new(Recorder::default());
        let relay = relay_with(sink.clone());
        let queue = relay.queue().clone();
        let (tx, rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();
        let worker = tokio::spawn(relay.run(rx, shutdown.clone()));

        tx.send(SupervisorEvent::Connected).await.unwrap();
        tx.send(signal("playerJoins", 42, None)).await.unwrap();
        tx.send(signal("playerSetsName", 42, Some("Ada"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(signal("playerExits", 42, None)).await.unwrap();
        tx.send(signal("playerExits", 42, None)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        queue.flush().await;
        assert_eq!(
            *sink.delivered.lock().unwrap(),
            vec![
                (EventKind::Join, "42".to_string(), "Ada".to_string()),
                (EventKind::Leave, "42".to_string(), "Ada".to_string()),
            ]
        );

        shutdown.cancel();
        worker.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn disconnect_discards_prior_epoch() {
        let sink = Arc::new(Recorder::default());
        let mut relay = relay_with(sink.clone());

        relay.handle_event(signal("playerJoins", 9, Some("Eve"))).await;
        let resolved = relay.resolved.recv().await.unwrap();
        relay.normalizer.complete_resolution(resolved).await;

        relay.handle_event(SupervisorEvent::Disconnected).await;
        relay.handle_event(SupervisorEvent::Connected).await;
        relay.handle_event(signal("playerExits", 9, None)).await;

        relay.queue().flush().await;
        let delivered = sink.delivered.lock().unwrap().clone();
        assert_eq!(delivered, vec![(EventKind::Join, "9".to_string(), "Eve".to_string())]);
        assert!(relay.normalizer().table().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_delivery_is_retried_with_newer_events() {
        let sink = Arc::new(Recorder::default());
        let mut relay = relay_with(sink.clone());

        for id in [1, 2] {
            relay.handle_event(signal("playerJoins", id, Some("x"))).await;
            let resolved = relay.resolved.recv().await.unwrap();
            relay.normalizer.complete_resolution(resolved).await;
        }
        *sink.fail_next.lock().unwrap() = true;
        relay.queue().flush().await;
        assert!(sink.delivered.lock().unwrap().is_empty());

        relay.handle_event(signal("playerExits", 1, None)).await;
        relay.queue().flush().await;

        let delivered: Vec<_> = sink
            .delivered
            .lock()
            .unwrap()
            .iter()
            .map(|(kind, id, _)| (*kind, id.clone()))
            .collect();
        assert_eq!(
            delivered,
            vec![
                (EventKind::Join, "1".to_string()),
                (EventKind::Join, "2".to_string()),
                (EventKind::Leave, "1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn run_ends_when_supervisor_goes_away() {
        let relay = relay_with(Arc::new(Recorder::default()));
        let (tx, rx) = mpsc::channel(1);
        drop(tx);
        relay.run(rx, CancellationToken::new()).await;
    }
}
