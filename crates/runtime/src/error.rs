//! Error types for the session runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while driving a session.
#[derive(Debug, Error)]
pub enum Error {
	/// Session driver script was not found.
	#[error("Session driver not found. Run `npm install` in crates/runtime/driver, install wa-bridge-driver with npm, or set WA_DRIVER_PATH")]
	DriverNotFound,

	/// Failed to launch the driver process.
	#[error("Failed to launch session driver: {0}. Check that Node.js is installed.")]
	LaunchFailed(String),

	/// Transport-level error (stdio communication).
	#[error("Transport error: {0}")]
	TransportError(String),

	/// Protocol-level error (malformed frame, uncorrelated response).
	#[error("Protocol error: {0}")]
	ProtocolError(String),

	/// Error reported by the driver for a request.
	#[error("{name}: {message}")]
	Remote {
		/// Error type name (e.g. "Error", "TimeoutError")
		name: String,
		/// Human-readable error message
		message: String,
	},

	/// The connection closed before a response arrived.
	#[error("Channel closed unexpectedly")]
	ChannelClosed,

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// JSON serialization/deserialization error.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl Error {
	/// Returns the driver's message for remote errors, or the full display text otherwise.
	pub fn message(&self) -> String {
		match self {
			Error::Remote { message, .. } => message.clone(),
			other => other.to_string(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn remote_errors_expose_driver_message() {
		let err = Error::Remote {
			name: "Error".to_string(),
			message: "Evaluation failed: chat not found".to_string(),
		};
		assert_eq!(err.to_string(), "Error: Evaluation failed: chat not found");
		assert_eq!(err.message(), "Evaluation failed: chat not found");
	}

	#[test]
	fn local_errors_use_display_text() {
		assert_eq!(Error::ChannelClosed.message(), "Channel closed unexpectedly");
	}
}
