//! Shared view of the identities the upstream currently knows about.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::identity::{Identity, SessionId};

/// Snapshot of known identities keyed by session identifier. Replaced on
/// every initial-state snapshot, patched by identity announcements, and
/// cleared when the connection drops.
#[derive(Clone, Default)]
pub struct IdentityDirectory {
    inner: Arc<RwLock<HashMap<SessionId, Identity>>>,
}

impl IdentityDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lookup(&self, id: &SessionId) -> Option<Identity> {
        self.inner.read().await.get(id).cloned()
    }

    /// Replace the whole directory with a fresh snapshot.
    pub async fn replace_all(&self, entries: impl IntoIterator<Item = (SessionId, Identity)>) {
        let mut map = self.inner.write().await;
        map.clear();
        map.extend(entries);
    }

    /// Record an announcement, merging with what was already known.
    pub async fn upsert(&self, id: SessionId, identity: Identity) -> Identity {
        let mut map = self.inner.write().await;
        let merged = match map.get(&id) {
            Some(existing) => existing.merge(&identity),
            None => identity,
        };
        map.insert(id, merged.clone());
        merged
    }

    pub async fn remove(&self, id: &SessionId) {
        self.inner.write().await.remove(id);
    }

    pub async fn clear(&self) {
        self.inner.write().await.clear();
    }
}
