use std::fmt;

use serde::Serialize;
use wa_protocol::SessionIdentity;

/// Connection phase of the supervised session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
	Initializing,
	QrReady,
	Connecting,
	Connected,
	Disconnected,
	Error,
}

impl ConnectionStatus {
	pub fn as_str(self) -> &'static str {
		match self {
			ConnectionStatus::Initializing => "initializing",
			ConnectionStatus::QrReady => "qr_ready",
			ConnectionStatus::Connecting => "connecting",
			ConnectionStatus::Connected => "connected",
			ConnectionStatus::Disconnected => "disconnected",
			ConnectionStatus::Error => "error",
		}
	}

	/// States an automatic retry may start from.
	pub fn is_retryable(self) -> bool {
		matches!(self, ConnectionStatus::Disconnected | ConnectionStatus::Error)
	}

	/// Whether the handle is still working towards a connection.
	pub fn is_pending(self) -> bool {
		matches!(
			self,
			ConnectionStatus::Initializing | ConnectionStatus::QrReady | ConnectionStatus::Connecting
		)
	}

	/// Transition table. Pairing and loading only advance a pending handle;
	/// initialization, disconnects and failures apply from anywhere.
	pub fn can_become(self, next: ConnectionStatus) -> bool {
		match next {
			ConnectionStatus::Initializing | ConnectionStatus::Disconnected | ConnectionStatus::Error => true,
			ConnectionStatus::QrReady | ConnectionStatus::Connecting => self.is_pending(),
			ConnectionStatus::Connected => self.is_pending() || self == ConnectionStatus::Connected,
		}
	}
}

impl fmt::Display for ConnectionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Point-in-time copy of everything the supervisor tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorSnapshot {
	pub status: ConnectionStatus,
	/// PNG data URI of the current pairing code
	pub qr_code: Option<String>,
	pub identity: Option<SessionIdentity>,
	pub last_error: Option<String>,
	pub init_attempts: u32,
}

pub(crate) struct SessionState {
	pub status: ConnectionStatus,
	pub qr_code: Option<String>,
	pub identity: Option<SessionIdentity>,
	pub last_error: Option<String>,
	pub init_attempts: u32,
	pub generation: u64,
}

impl SessionState {
	pub fn new() -> Self {
		Self {
			status: ConnectionStatus::Initializing,
			qr_code: None,
			identity: None,
			last_error: None,
			init_attempts: 0,
			generation: 0,
		}
	}

	/// Moves to `status`, dropping pairing material unless the new status is `qr_ready`.
	///
	/// Returns `false` and leaves the state untouched when the move is not in the table.
	pub fn transition(&mut self, status: ConnectionStatus) -> bool {
		if !self.status.can_become(status) {
			return false;
		}
		self.status = status;
		if status != ConnectionStatus::QrReady {
			self.qr_code = None;
		}
		if status != ConnectionStatus::Connected {
			self.identity = None;
		}
		true
	}

	pub fn snapshot(&self) -> SupervisorSnapshot {
		SupervisorSnapshot {
			status: self.status,
			qr_code: self.qr_code.clone(),
			identity: self.identity.clone(),
			last_error: self.last_error.clone(),
			init_attempts: self.init_attempts,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn status_serializes_in_snake_case() {
		assert_eq!(serde_json::to_value(ConnectionStatus::QrReady).unwrap(), "qr_ready");
		assert_eq!(serde_json::to_value(ConnectionStatus::Initializing).unwrap(), "initializing");
		assert_eq!(ConnectionStatus::Error.to_string(), "error");
	}

	#[test]
	fn leaving_qr_ready_clears_pairing_material() {
		let mut state = SessionState::new();
		state.transition(ConnectionStatus::QrReady);
		state.qr_code = Some("data:image/png;base64,AAAA".to_string());

		state.transition(ConnectionStatus::QrReady);
		assert!(state.qr_code.is_some());

		state.transition(ConnectionStatus::Connecting);
		assert!(state.qr_code.is_none());
	}

	#[test]
	fn progress_only_advances_pending_states() {
		use ConnectionStatus::*;

		for from in [Initializing, QrReady, Connecting] {
			assert!(from.can_become(QrReady), "{from} -> qr_ready");
			assert!(from.can_become(Connecting), "{from} -> connecting");
			assert!(from.can_become(Connected), "{from} -> connected");
		}
		for from in [Connected, Disconnected, Error] {
			assert!(!from.can_become(QrReady), "{from} -> qr_ready");
			assert!(!from.can_become(Connecting), "{from} -> connecting");
		}
		assert!(Connected.can_become(Connected));
		assert!(!Error.can_become(Connected));
		assert!(!Disconnected.can_become(Connected));
	}

	#[test]
	fn failures_and_reinit_apply_from_anywhere() {
		use ConnectionStatus::*;

		for from in [Initializing, QrReady, Connecting, Connected, Disconnected, Error] {
			assert!(from.can_become(Initializing));
			assert!(from.can_become(Disconnected));
			assert!(from.can_become(Error));
		}
	}

	#[test]
	fn rejected_transition_leaves_state_untouched() {
		let mut state = SessionState::new();
		assert!(state.transition(ConnectionStatus::Error));
		state.last_error = Some("boom".to_string());

		assert!(!state.transition(ConnectionStatus::Connecting));
		assert_eq!(state.status, ConnectionStatus::Error);
		assert_eq!(state.last_error.as_deref(), Some("boom"));
	}

	#[test]
	fn leaving_connected_clears_identity() {
		let mut state = SessionState::new();
		state.transition(ConnectionStatus::Connected);
		state.identity = Some(SessionIdentity {
			name: Some("Front Desk".to_string()),
			phone: Some("8801700000000".to_string()),
		});

		state.transition(ConnectionStatus::Disconnected);
		assert!(state.identity.is_none());
	}
}
