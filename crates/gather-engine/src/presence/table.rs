//! The presence table: one entry per session identifier.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::identity::{Identity, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceState {
    /// Joined; identity still being resolved, no Join event emitted yet.
    Resolving,
    /// Join event emitted.
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceEntry {
    pub session_id: SessionId,
    pub identity: Identity,
    pub joined_at: DateTime<Utc>,
    pub state: PresenceState,
    /// Unique per entry lifetime. A resolution that finishes for an older
    /// generation than the current entry is stale.
    pub generation: u64,
}

/// Returned by `on_join` when the identifier already has an entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("session {0} is already active")]
pub struct AlreadyActive(pub SessionId);

/// What `on_identity_announced` did with the identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnnounceOutcome {
    /// An entry existed and was updated in place.
    Updated(PresenceState),
    /// No entry yet; held for the next join of this identifier.
    Cached,
}

/// In-memory presence state for the current connection epoch.
///
/// Not internally synchronized: the relay's single worker owns it and
/// serializes every mutation.
#[derive(Debug, Default)]
pub struct PresenceTable {
    entries: HashMap<SessionId, PresenceEntry>,
    provisional: HashMap<SessionId, Identity>,
    next_generation: u64,
}

impl PresenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a Resolving entry, seeded with any identity announced ahead
    /// of the join. Fails without side effects if an entry exists.
    pub fn on_join(
        &mut self,
        id: SessionId,
        now: DateTime<Utc>,
    ) -> Result<PresenceEntry, AlreadyActive> {
        if self.entries.contains_key(&id) {
            return Err(AlreadyActive(id));
        }

        self.next_generation += 1;
        let entry = PresenceEntry {
            identity: self.provisional.remove(&id).unwrap_or_default(),
            session_id: id.clone(),
            joined_at: now,
            state: PresenceState::Resolving,
            generation: self.next_generation,
        };
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    pub fn on_identity_announced(&mut self, id: SessionId, identity: Identity) -> AnnounceOutcome {
        match self.entries.get_mut(&id) {
            Some(entry) => {
                entry.identity = entry.identity.merge(&identity);
                AnnounceOutcome::Updated(entry.state)
            }
            None => {
                let cached = match self.provisional.get(&id) {
                    Some(existing) => existing.merge(&identity),
                    None => identity,
                };
                self.provisional.insert(id, cached);
                AnnounceOutcome::Cached
            }
        }
    }

    /// Finish resolution for `generation`, merging in `resolved`.
    ///
    /// Returns the now-Active entry, or `None` if the entry was removed,
    /// replaced, or already active.
    pub fn activate(
        &mut self,
        id: &SessionId,
        generation: u64,
        resolved: Option<Identity>,
    ) -> Option<PresenceEntry> {
        let entry = self.entries.get_mut(id)?;
        if entry.generation != generation || entry.state != PresenceState::Resolving {
            return None;
        }
        if let Some(identity) = resolved {
            entry.identity = entry.identity.merge(&identity);
        }
        entry.state = PresenceState::Active;
        Some(entry.clone())
    }

    /// Remove and return the entry, if any. A missing entry means the
    /// leave is a duplicate or belongs to a cleared epoch.
    pub fn on_leave(&mut self, id: &SessionId) -> Option<PresenceEntry> {
        self.provisional.remove(id);
        self.entries.remove(id)
    }

    /// Drop every entry and cached identity. Returns how many entries went.
    pub fn clear_all(&mut self) -> usize {
        let n = self.entries.len();
        self.entries.clear();
        self.provisional.clear();
        n
    }

    pub fn get(&self, id: &SessionId) -> Option<&PresenceEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
