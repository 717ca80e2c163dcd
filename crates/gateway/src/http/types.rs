//! JSON bodies of the HTTP API.

use serde::{Deserialize, Serialize};
use wa_protocol::SessionIdentity;

use crate::supervisor::{ConnectionStatus, SupervisorSnapshot};

#[derive(Debug, Serialize)]
pub struct RootResponse {
	pub service: String,
	pub status: ConnectionStatus,
	/// RFC 3339 with millisecond precision
	pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
	pub status: ConnectionStatus,
	pub qr_code: Option<String>,
	pub connected_as: Option<ConnectedAs>,
	pub last_error: Option<String>,
	pub init_attempts: u32,
}

#[derive(Debug, Serialize)]
pub struct ConnectedAs {
	pub name: Option<String>,
	pub phone: Option<String>,
}

impl From<SessionIdentity> for ConnectedAs {
	fn from(identity: SessionIdentity) -> Self {
		Self {
			name: identity.name,
			phone: identity.phone,
		}
	}
}

impl From<SupervisorSnapshot> for StatusResponse {
	fn from(snapshot: SupervisorSnapshot) -> Self {
		Self {
			status: snapshot.status,
			qr_code: snapshot.qr_code,
			connected_as: snapshot.identity.map(ConnectedAs::from),
			last_error: snapshot.last_error,
			init_attempts: snapshot.init_attempts,
		}
	}
}

#[derive(Debug, Default, Deserialize)]
pub struct SendRequest {
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendPdfRequest {
	#[serde(default)]
	pub phone: Option<String>,
	#[serde(default)]
	pub message: Option<String>,
	#[serde(default)]
	pub pdf_base64: Option<String>,
	#[serde(default)]
	pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendResponse {
	pub success: bool,
	pub message_id: String,
	pub to: String,
}

#[derive(Debug, Serialize)]
pub struct SendPdfResponse {
	pub success: bool,
	pub to: String,
}

/// `{success: true, message}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct Ack {
	pub success: bool,
	pub message: &'static str,
}

impl Ack {
	pub fn new(message: &'static str) -> Self {
		Self { success: true, message }
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn status_response_uses_camel_case_and_nulls() {
		let snapshot = SupervisorSnapshot {
			status: ConnectionStatus::Initializing,
			qr_code: None,
			identity: None,
			last_error: None,
			init_attempts: 1,
		};
		let value = serde_json::to_value(StatusResponse::from(snapshot)).unwrap();
		assert_eq!(
			value,
			json!({
				"status": "initializing",
				"qrCode": null,
				"connectedAs": null,
				"lastError": null,
				"initAttempts": 1
			})
		);
	}

	#[test]
	fn connected_as_carries_identity() {
		let snapshot = SupervisorSnapshot {
			status: ConnectionStatus::Connected,
			qr_code: None,
			identity: Some(SessionIdentity {
				name: Some("Front Desk".to_string()),
				phone: Some("8801700000000".to_string()),
			}),
			last_error: None,
			init_attempts: 0,
		};
		let value = serde_json::to_value(StatusResponse::from(snapshot)).unwrap();
		assert_eq!(value["connectedAs"], json!({"name": "Front Desk", "phone": "8801700000000"}));
	}

	#[test]
	fn pdf_request_reads_camel_case_fields() {
		let req: SendPdfRequest = serde_json::from_value(json!({
			"phone": "01712345678",
			"pdfBase64": "JVBERi0=",
			"filename": "Bill.pdf"
		}))
		.unwrap();
		assert_eq!(req.pdf_base64.as_deref(), Some("JVBERi0="));
		assert_eq!(req.filename.as_deref(), Some("Bill.pdf"));
		assert!(req.message.is_none());
	}
}
