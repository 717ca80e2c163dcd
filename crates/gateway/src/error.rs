use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GatewayError>;

/// Failures surfaced to HTTP callers.
///
/// Every variant renders as `{"success": false, "error": <message>}`.
#[derive(Debug, Error)]
pub enum GatewayError {
	/// Required input missing or malformed.
	#[error("{0}")]
	Validation(String),

	/// The session is not in the `connected` state.
	#[error("{0}")]
	NotReady(String),

	/// The destination has no account on the network.
	#[error("{0}")]
	RecipientNotFound(String),

	/// The session handle failed the operation.
	#[error("{0}")]
	Provider(String),
}

impl GatewayError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			GatewayError::Validation(_) | GatewayError::RecipientNotFound(_) => StatusCode::BAD_REQUEST,
			GatewayError::NotReady(_) => StatusCode::SERVICE_UNAVAILABLE,
			GatewayError::Provider(_) => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl From<wa_runtime::Error> for GatewayError {
	fn from(err: wa_runtime::Error) -> Self {
		GatewayError::Provider(err.message())
	}
}

impl IntoResponse for GatewayError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		if status.is_server_error() {
			tracing::warn!(target = "wa.http", status = status.as_u16(), error = %self, "request failed");
		} else {
			tracing::debug!(target = "wa.http", status = status.as_u16(), error = %self, "request rejected");
		}
		(status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
	}
}
