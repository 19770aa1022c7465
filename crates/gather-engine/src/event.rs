//! Canonical presence events and the clock that stamps them.

use std::sync::Mutex;

use chrono::{DateTime, Duration, DurationRound, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::identity::{Identity, SessionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Join,
    Leave,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Join => "join",
            EventKind::Leave => "leave",
        }
    }
}

/// A normalized join/leave record. Immutable once built; the timestamp is
/// fixed at normalization and survives any number of delivery retries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub kind: EventKind,
    pub session_id: SessionId,
    pub identity: Identity,
    pub timestamp: DateTime<Utc>,
}

impl Event {
    pub fn new(
        kind: EventKind,
        session_id: SessionId,
        identity: Identity,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            kind,
            session_id,
            identity,
            timestamp,
        }
    }

    /// ISO-8601 timestamp with millisecond precision, e.g.
    /// `2024-05-01T12:00:00.123Z`.
    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Millisecond wall clock that never repeats or goes backwards.
///
/// Consumers deduplicate on `(identifier, kind, timestamp)`, so two events
/// normalized within the same millisecond get distinct stamps.
#[derive(Debug, Default)]
pub struct MonotonicClock {
    last: Mutex<Option<DateTime<Utc>>>,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.stamp(Utc::now())
    }

    /// Stamp an observed wall-clock reading.
    pub(crate) fn stamp(&self, observed: DateTime<Utc>) -> DateTime<Utc> {
        let observed = observed
            .duration_trunc(Duration::milliseconds(1))
            .unwrap_or(observed);
        let mut last = self.last.lock().unwrap_or_else(|e| e.into_inner());
        let next = match *last {
            Some(prev) if observed <= prev => prev + Duration::milliseconds(1),
            _ => observed,
        };
        *last = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&EventKind::Join).unwrap(), "\"join\"");
        assert_eq!(EventKind::Leave.as_str(), "leave");
    }

    #[test]
    fn timestamp_is_iso8601_millis() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + Duration::milliseconds(123);
        let event = Event::new(EventKind::Join, "42".into(), Identity::named("Ada"), ts);
        assert_eq!(event.timestamp_iso(), "2024-05-01T12:00:00.123Z");
    }

    #[test]
    fn clock_is_strictly_increasing() {
        let clock = MonotonicClock::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let a = clock.stamp(t);
        let b = clock.stamp(t);
        let c = clock.stamp(t - Duration::seconds(5));
        assert!(a < b);
        assert!(b < c);
        assert_eq!(b - a, Duration::milliseconds(1));
    }

    #[test]
    fn clock_follows_wall_time_when_it_advances() {
        let clock = MonotonicClock::new();
        let t = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        clock.stamp(t);
        let later = t + Duration::seconds(3);
        assert_eq!(clock.stamp(later), later);
    }
}
