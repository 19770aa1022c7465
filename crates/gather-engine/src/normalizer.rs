//! Turns raw transport signals into canonical [`Event`]s.
//!
//! Joins are held in the presence table as Resolving while a spawned task
//! waits for the participant's identity. The task only waits: its result
//! comes back over a channel and is applied by the same worker that
//! handles every other signal, so table mutations stay serialized and a
//! resolution can never overtake a later leave.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::event::{Event, EventKind, MonotonicClock};
use crate::identity::{Identity, SessionId};
use crate::presence::{
    await_identity, AnnounceOutcome, IdentityDirectory, PresenceState, PresenceTable, Resolution,
};
use crate::queue::DeliveryQueue;
use crate::signal::RawSignal;

/// Bounds on the identity wait after a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveSettings {
    pub timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ResolveSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(4000),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Result of a resolution task, applied by [`EventNormalizer::complete_resolution`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedIdentity {
    pub session_id: SessionId,
    pub generation: u64,
    pub resolution: Resolution,
}

struct PendingResolution {
    generation: u64,
    notify: Arc<Notify>,
    cancel: CancellationToken,
}

pub struct EventNormalizer {
    table: PresenceTable,
    directory: IdentityDirectory,
    queue: DeliveryQueue,
    clock: MonotonicClock,
    settings: ResolveSettings,
    pending: HashMap<SessionId, PendingResolution>,
    resolved_tx: mpsc::UnboundedSender<ResolvedIdentity>,
}

impl EventNormalizer {
    /// Returns the normalizer and the receiver its resolution tasks report
    /// to. The caller must feed every received value back through
    /// [`complete_resolution`](Self::complete_resolution).
    pub fn new(
        queue: DeliveryQueue,
        directory: IdentityDirectory,
        settings: ResolveSettings,
    ) -> (Self, mpsc::UnboundedReceiver<ResolvedIdentity>) {
        let (resolved_tx, resolved_rx) = mpsc::unbounded_channel();
        let normalizer = Self {
            table: PresenceTable::new(),
            directory,
            queue,
            clock: MonotonicClock::new(),
            settings,
            pending: HashMap::new(),
            resolved_tx,
        };
        (normalizer, resolved_rx)
    }

    pub fn table(&self) -> &PresenceTable {
        &self.table
    }

    pub fn directory(&self) -> &IdentityDirectory {
        &self.directory
    }

    /// Joins still waiting on identity.
    pub fn pending_resolutions(&self) -> usize {
        self.pending.len()
    }

    pub async fn handle_join_signal(&mut self, raw: &RawSignal) {
        let id = match raw.session_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, payload = %raw.payload(), "Dropping malformed join signal");
                return;
            }
        };

        // A join that already names the participant resolves immediately.
        // The entry keeps its own copy in case a snapshot replaces the directory.
        let carried = raw.identity();
        let informative = carried.is_resolved() || carried.durable_id.is_some();
        if informative && self.table.get(&id).is_none() {
            let merged = self.directory.upsert(id.clone(), carried).await;
            self.table.on_identity_announced(id.clone(), merged);
        }

        let entry = match self.table.on_join(id, self.clock.now()) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(session = %e.0, "Duplicate join dropped");
                return;
            }
        };

        let notify = Arc::new(Notify::new());
        let cancel = CancellationToken::new();
        self.pending.insert(
            entry.session_id.clone(),
            PendingResolution {
                generation: entry.generation,
                notify: Arc::clone(&notify),
                cancel: cancel.clone(),
            },
        );

        let directory = self.directory.clone();
        let tx = self.resolved_tx.clone();
        let ResolveSettings {
            timeout,
            poll_interval,
        } = self.settings;
        let (session_id, generation) = (entry.session_id, entry.generation);
        debug!(session = %session_id, generation, "Join received, resolving identity");

        tokio::spawn(async move {
            let outcome = await_identity(
                session_id.clone(),
                directory,
                notify,
                cancel,
                timeout,
                poll_interval,
            )
            .await;
            if let Some(resolution) = outcome {
                let _ = tx.send(ResolvedIdentity {
                    session_id,
                    generation,
                    resolution,
                });
            }
        });
    }

    /// Apply a finished resolution: activate the entry and emit its Join.
    /// Results for entries that were removed or replaced are discarded.
    pub async fn complete_resolution(&mut self, resolved: ResolvedIdentity) {
        let ResolvedIdentity {
            session_id,
            generation,
            resolution,
        } = resolved;

        if self
            .pending
            .get(&session_id)
            .is_some_and(|p| p.generation == generation)
        {
            self.pending.remove(&session_id);
        }

        let identity = match resolution {
            Resolution::Resolved(identity) => Some(identity),
            Resolution::TimedOut(partial) => {
                info!(session = %session_id, "Identity not resolved in time, using best effort");
                partial
            }
        };

        match self.table.activate(&session_id, generation, identity) {
            Some(entry) => {
                self.emit(EventKind::Join, entry.session_id, entry.identity)
                    .await;
            }
            None => debug!(session = %session_id, generation, "Stale resolution discarded"),
        }
    }

    pub async fn handle_leave_signal(&mut self, raw: &RawSignal) {
        let id = match raw.session_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, payload = %raw.payload(), "Dropping malformed leave signal");
                return;
            }
        };

        let Some(entry) = self.table.on_leave(&id) else {
            debug!(session = %id, "Leave without a present entry dropped");
            return;
        };

        if let Some(pending) = self.pending.remove(&id) {
            pending.cancel.cancel();
        }

        let mut identity = entry.identity;
        if let Some(known) = self.directory.lookup(&id).await {
            identity = identity.merge(&known);
        }
        identity = identity.merge(&raw.identity());
        // Slot ids are recycled; the next holder must not inherit this identity.
        self.directory.remove(&id).await;

        // Left before resolution finished: the join still happened.
        if entry.state == PresenceState::Resolving {
            self.emit(EventKind::Join, id.clone(), identity.clone())
                .await;
        }
        self.emit(EventKind::Leave, id, identity).await;
    }

    pub async fn handle_identity_signal(&mut self, raw: &RawSignal) {
        let id = match raw.session_id() {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, payload = %raw.payload(), "Dropping malformed identity signal");
                return;
            }
        };

        let merged = self.directory.upsert(id.clone(), raw.identity()).await;
        let outcome = self.table.on_identity_announced(id.clone(), merged);
        debug!(session = %id, ?outcome, "Identity announced");

        if outcome == AnnounceOutcome::Updated(PresenceState::Resolving) {
            if let Some(pending) = self.pending.get(&id) {
                pending.notify.notify_one();
            }
        }
    }

    /// Replace the identity directory with an initial-state snapshot.
    pub async fn handle_snapshot(&mut self, raw: &RawSignal) {
        let entries = raw.snapshot_entries();
        let players = entries.len();
        self.directory.replace_all(entries).await;
        for (id, pending) in &self.pending {
            // Identities learned since the join outlive a snapshot that lacks them.
            if let Some(entry) = self.table.get(id).filter(|e| e.identity.is_resolved()) {
                let known = self.directory.lookup(id).await.unwrap_or_default();
                self.directory.upsert(id.clone(), entry.identity.merge(&known)).await;
            }
            pending.notify.notify_one();
        }
        info!(players, "Initial state snapshot applied");
    }

    /// Session identifiers from the old connection are meaningless now:
    /// drop every entry, abandon every resolution and forget the directory.
    pub async fn on_disconnect(&mut self) {
        let cleared = self.table.clear_all();
        let abandoned = self.pending.len();
        for (_, pending) in self.pending.drain() {
            pending.cancel.cancel();
        }
        self.directory.clear().await;
        info!(cleared, abandoned, "Presence cleared after disconnect");
    }

    async fn emit(&self, kind: EventKind, session_id: SessionId, identity: Identity) {
        let event = Event::new(kind, session_id, identity, self.clock.now());
        info!(
            session = %event.session_id,
            kind = kind.as_str(),
            name = %event.identity.display_name,
            "Presence event"
        );
        self.queue.enqueue(event).await;
    }
}
