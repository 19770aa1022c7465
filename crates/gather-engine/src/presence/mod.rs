//! Presence tracking: who is currently in the space, and who they are.
//!
//! `PresenceTable` owns the per-identifier entries and is the source of
//! join/leave deduplication. `IdentityDirectory` mirrors the upstream
//! snapshot of known identities, which resolution waits consult.

mod directory;
mod resolve;
mod table;


pub use directory::IdentityDirectory;
pub use resolve::Resolution;
pub(crate) use resolve::await_identity;
pub use table::{AlreadyActive, AnnounceOutcome, PresenceEntry, PresenceState, PresenceTable};
