//! Operations exposed over HTTP, independent of axum.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, info};
use wa_protocol::{ChatId, Document, MessageId};
use wa_runtime::SessionClient;

use crate::error::{GatewayError, Result};
use crate::phone::normalize_phone;
use crate::supervisor::{Supervisor, SupervisorSnapshot};

/// File name used when a document request does not provide one.
pub const DEFAULT_DOCUMENT_NAME: &str = "Invoice.pdf";

/// A text message that was handed to the network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
	pub message_id: MessageId,
	/// Normalized destination number
	pub to: String,
}

/// Input to [`Gateway::send_document`].
#[derive(Debug, Clone, Default)]
pub struct DocumentRequest {
	pub phone: Option<String>,
	pub message: Option<String>,
	pub pdf_base64: Option<String>,
	pub filename: Option<String>,
}

#[derive(Clone)]
pub struct Gateway {
	supervisor: Supervisor,
	country_code: Arc<str>,
	service_name: Arc<str>,
}

impl Gateway {
	pub fn new(supervisor: Supervisor, country_code: impl Into<Arc<str>>, service_name: impl Into<Arc<str>>) -> Self {
		Self {
			supervisor,
			country_code: country_code.into(),
			service_name: service_name.into(),
		}
	}

	pub fn supervisor(&self) -> &Supervisor {
		&self.supervisor
	}

	pub fn service_name(&self) -> &str {
		&self.service_name
	}

	pub fn status(&self) -> SupervisorSnapshot {
		self.supervisor.snapshot()
	}

	pub async fn send_message(&self, phone: Option<&str>, message: Option<&str>) -> Result<SentMessage> {
		let (Some(phone), Some(message)) = (non_empty(phone), non_empty(message)) else {
			return Err(GatewayError::Validation("Phone and message are required".to_string()));
		};
		let client = self
			.supervisor
			.connected_client()
			.ok_or_else(|| GatewayError::NotReady("WhatsApp not connected. Please scan QR code first.".to_string()))?;

		let (to, chat) = self.resolve(phone)?;
		debug!(target = "wa.gateway", chat = %chat, "sending message");
		ensure_registered(client.as_ref(), &chat, "This phone number is not registered on WhatsApp").await?;

		let message_id = client.send_text(&chat, message).await?;
		info!(target = "wa.gateway", %to, message_id = %message_id, "message sent");
		Ok(SentMessage { message_id, to })
	}

	/// Sends an optional text followed by an optional PDF. Returns the normalized destination.
	pub async fn send_document(&self, request: DocumentRequest) -> Result<String> {
		let Some(phone) = non_empty(request.phone.as_deref()) else {
			return Err(GatewayError::Validation("Phone is required".to_string()));
		};
		let client = self
			.supervisor
			.connected_client()
			.ok_or_else(|| GatewayError::NotReady("WhatsApp not connected".to_string()))?;

		let (to, chat) = self.resolve(phone)?;
		let document = match non_empty(request.pdf_base64.as_deref()) {
			Some(encoded) => {
				let data = STANDARD
					.decode(encoded.trim())
					.map_err(|e| GatewayError::Validation(format!("pdfBase64 is not valid base64: {e}")))?;
				let filename = non_empty(request.filename.as_deref()).unwrap_or(DEFAULT_DOCUMENT_NAME);
				Some(Document::pdf(filename, data))
			}
			None => None,
		};

		ensure_registered(client.as_ref(), &chat, "Phone not on WhatsApp").await?;

		if let Some(message) = non_empty(request.message.as_deref()) {
			client.send_text(&chat, message).await?;
		}
		if let Some(document) = document {
			let filename = document.filename.clone();
			let size = document.data.len();
			client.send_document(&chat, document).await?;
			info!(target = "wa.gateway", %to, %filename, size, "document sent");
		}
		Ok(to)
	}

	pub async fn logout(&self) -> Result<()> {
		let client = self
			.supervisor
			.client()
			.ok_or_else(|| GatewayError::Provider("WhatsApp client is not initialized".to_string()))?;
		client.logout().await?;
		self.supervisor.mark_logged_out();
		Ok(())
	}

	pub fn restart(&self) {
		self.supervisor.restart();
	}

	fn resolve(&self, phone: &str) -> Result<(String, ChatId)> {
		let number = normalize_phone(phone, &self.country_code);
		if number.is_empty() {
			return Err(GatewayError::Validation("Phone number must contain digits".to_string()));
		}
		let chat = ChatId::for_user(&number);
		Ok((number, chat))
	}
}

async fn ensure_registered(client: &dyn SessionClient, chat: &ChatId, not_found: &str) -> Result<()> {
	if client.is_registered(chat).await? {
		Ok(())
	} else {
		Err(GatewayError::RecipientNotFound(not_found.to_string()))
	}
}

fn non_empty(value: Option<&str>) -> Option<&str> {
	value.filter(|v| !v.is_empty())
}
