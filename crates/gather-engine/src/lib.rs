//! Presence-event relay engine.
//!
//! Observes join/leave signals from a virtual-space session, deduplicates
//! them against an in-memory presence table, enriches them with identity
//! metadata, and forwards them with at-least-once semantics to one or
//! more sinks.
//!
//! Data flow: transport → [`ConnectionSupervisor`] → [`EventNormalizer`]
//! (consulting [`PresenceTable`]) → [`DeliveryQueue`] → [`Sink`]s, all
//! coordinated by a single [`Relay`] worker.

pub mod event;
pub mod identity;
pub mod normalizer;
pub mod presence;
pub mod queue;
pub mod relay;
pub mod signal;
pub mod sink;
pub mod supervisor;
pub mod transport;

pub use event::{Event, EventKind, MonotonicClock};
pub use identity::{Identity, SessionId, UNKNOWN_NAME};
pub use normalizer::{EventNormalizer, ResolveSettings, ResolvedIdentity};
pub use presence::{IdentityDirectory, PresenceEntry, PresenceState, PresenceTable, Resolution};
pub use queue::{DeliveryQueue, FlushReport, LaneReport, LaneSnapshot, SinkLane};
pub use relay::Relay;
pub use signal::{RawSignal, SignalError, TransportSignal};
pub use sink::{AppendLogSink, Sink, WebhookSink};
pub use supervisor::{
    BackoffPolicy, ConnectionState, ConnectionSupervisor, SupervisorConfig, SupervisorEvent,
};
pub use transport::{decode_frame, Connector, TransportSession, WebSocketConnector};
