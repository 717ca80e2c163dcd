//! Lifecycle events reported by a session.
//!
//! The driver reports events as loosely shaped `{event, params}` frames.
//! [`SessionEvent`] is the closed set the gateway acts on; unknown event names
//! are surfaced as [`EventDecodeError::Unknown`] so callers can log and skip them.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::frame::Event;

/// Account the session is signed in as.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionIdentity {
	/// Display name chosen by the account owner
	pub name: Option<String>,
	/// Phone number of the account, digits only
	pub phone: Option<String>,
}

/// Lifecycle event emitted by a session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
	/// A pairing code must be scanned from a trusted device. Carries the raw QR payload.
	PairingChallenge(String),
	/// Stored or scanned credentials were accepted.
	Authenticated,
	/// Handshake finished; the session can send messages.
	Ready(SessionIdentity),
	/// Credentials were rejected.
	AuthFailed(String),
	/// The session dropped, was signed out, or the driver went away.
	Disconnected(String),
	/// The web client is still loading.
	LoadingProgress { percent: u8, message: Option<String> },
}

impl SessionEvent {
	/// Short stable name, used in logs.
	pub fn name(&self) -> &'static str {
		match self {
			SessionEvent::PairingChallenge(_) => "qr",
			SessionEvent::Authenticated => "authenticated",
			SessionEvent::Ready(_) => "ready",
			SessionEvent::AuthFailed(_) => "auth_failure",
			SessionEvent::Disconnected(_) => "disconnected",
			SessionEvent::LoadingProgress { .. } => "loading_screen",
		}
	}
}

#[derive(Deserialize)]
struct QrParams {
	code: String,
}

#[derive(Deserialize, Default)]
struct ReadyParams {
	#[serde(default)]
	name: Option<String>,
	#[serde(default)]
	phone: Option<String>,
}

#[derive(Deserialize, Default)]
struct AuthFailureParams {
	#[serde(default)]
	message: Option<String>,
}

#[derive(Deserialize, Default)]
struct DisconnectedParams {
	#[serde(default)]
	reason: Option<String>,
}

#[derive(Deserialize)]
struct LoadingParams {
	percent: f64,
	#[serde(default)]
	message: Option<String>,
}

/// Failure to turn a driver [`Event`] into a [`SessionEvent`].
#[derive(Debug)]
pub enum EventDecodeError {
	/// The event name is not part of the bridge protocol.
	Unknown(String),
	/// The event name is known but its params do not match.
	InvalidParams { event: String, source: serde_json::Error },
}

impl fmt::Display for EventDecodeError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EventDecodeError::Unknown(name) => write!(f, "unknown driver event: {name}"),
			EventDecodeError::InvalidParams { event, source } => {
				write!(f, "invalid params for driver event {event}: {source}")
			}
		}
	}
}

impl std::error::Error for EventDecodeError {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			EventDecodeError::Unknown(_) => None,
			EventDecodeError::InvalidParams { source, .. } => Some(source),
		}
	}
}

fn params<T>(event: &Event) -> Result<T, EventDecodeError>
where
	T: for<'de> Deserialize<'de> + Default,
{
	if event.params.is_null() {
		return Ok(T::default());
	}
	serde_json::from_value(event.params.clone()).map_err(|source| EventDecodeError::InvalidParams {
		event: event.event.clone(),
		source,
	})
}

fn required_params<T>(event: &Event) -> Result<T, EventDecodeError>
where
	T: for<'de> Deserialize<'de>,
{
	serde_json::from_value(event.params.clone()).map_err(|source| EventDecodeError::InvalidParams {
		event: event.event.clone(),
		source,
	})
}

impl TryFrom<&Event> for SessionEvent {
	type Error = EventDecodeError;

	fn try_from(event: &Event) -> Result<Self, Self::Error> {
		match event.event.as_str() {
			"qr" => {
				let QrParams { code } = required_params(event)?;
				Ok(SessionEvent::PairingChallenge(code))
			}
			"authenticated" => Ok(SessionEvent::Authenticated),
			"ready" => {
				let ReadyParams { name, phone } = params(event)?;
				Ok(SessionEvent::Ready(SessionIdentity { name, phone }))
			}
			"auth_failure" => {
				let AuthFailureParams { message } = params(event)?;
				Ok(SessionEvent::AuthFailed(message.unwrap_or_else(|| "unknown reason".to_string())))
			}
			"disconnected" => {
				let DisconnectedParams { reason } = params(event)?;
				Ok(SessionEvent::Disconnected(reason.unwrap_or_else(|| "unknown".to_string())))
			}
			"loading_screen" => {
				let LoadingParams { percent, message } = required_params(event)?;
				Ok(SessionEvent::LoadingProgress {
					percent: percent.clamp(0.0, 100.0).round() as u8,
					message,
				})
			}
			other => Err(EventDecodeError::Unknown(other.to_string())),
		}
	}
}
