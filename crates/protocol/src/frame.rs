//! Message envelopes exchanged over the driver pipe.
//!
//! Every frame carries exactly one of:
//!
//! - a [`Request`] from the gateway (`{id, method, params}`)
//! - a [`Response`] from the driver (`{id, result}` or `{id, error}`)
//! - an [`Event`] from the driver (`{event, params}`)

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request sent to the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses
	pub id: u32,
	/// Method name to invoke
	pub method: String,
	/// Method parameters as JSON object
	pub params: Value,
}

/// Response to a [`Request`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Request ID this response correlates to
	pub id: u32,
	/// Success result (mutually exclusive with error)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	/// Error result (mutually exclusive with result)
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorPayload>,
}

/// Error details reported by the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	/// Error message
	pub message: String,
	/// Error type name (e.g. "TimeoutError", "ProtocolError")
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
}

/// Unsolicited lifecycle notification from the driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
	/// Event name (`qr`, `ready`, `disconnected`, ...)
	pub event: String,
	/// Event parameters, `null` for parameterless events
	#[serde(default)]
	pub params: Value,
}

/// Discriminated union of inbound frames.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
	/// Response message (has `id` field)
	Response(Response),
	/// Event message (has `event` field)
	Event(Event),
	/// Unknown message type (forward-compatible catch-all)
	Unknown(Value),
}
