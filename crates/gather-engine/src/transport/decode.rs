//! JSON frame decoding for the space event stream.

use serde_json::Value;
use tracing::{debug, warn};

use crate::signal::{RawSignal, TransportSignal};

/// Classify one text frame by its `event` field.
///
/// Unparseable frames and event types the relay does not consume yield
/// `None`; neither ends the session.
pub fn decode_frame(text: &str) -> Option<TransportSignal> {
    let value: Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "Dropping unparseable frame");
            return None;
        }
    };

    let Some(event) = value.get("event").and_then(Value::as_str) else {
        debug!("Frame without event type ignored");
        return None;
    };

    let signal = match event {
        "playerJoins" => TransportSignal::Join,
        "playerExits" => TransportSignal::Leave,
        "playerSetsName" => TransportSignal::IdentityAnnounced,
        "initialState" => TransportSignal::Snapshot,
        other => {
            debug!(event = other, "Ignoring frame");
            return None;
        }
    };
    Some(signal(RawSignal::new(value)))
}
