//! Bounded wait for a joining participant's identity.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::identity::{Identity, SessionId};

use super::directory::IdentityDirectory;

/// How a resolution wait ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(Identity),
    /// Nothing usable arrived in time; carries any partial identity.
    TimedOut(Option<Identity>),
}

/// Wait until `directory` holds a resolved identity for `id`.
///
/// Re-checks every `poll` and immediately whenever `notify` fires.
/// Returns `None` if `cancel` fires first: the entry this wait belongs to
/// is gone and its result must be discarded.
pub(crate) async fn await_identity(
    id: SessionId,
    directory: IdentityDirectory,
    notify: Arc<Notify>,
    cancel: CancellationToken,
    timeout: Duration,
    poll: Duration,
) -> Option<Resolution> {
    let deadline = tokio::time::Instant::now() + timeout;

    loop {
        if let Some(identity) = directory.lookup(&id).await {
            if identity.is_resolved() {
                return Some(Resolution::Resolved(identity));
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep_until(deadline) => {
                return Some(Resolution::TimedOut(directory.lookup(&id).await));
            }
            _ = notify.notified() => {}
            _ = tokio::time::sleep(poll) => {}
        }
    }
}
