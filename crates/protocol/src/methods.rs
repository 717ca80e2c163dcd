//! Request parameters and results for driver methods.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::{ChatId, Document, MessageId};

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_IS_REGISTERED_USER: &str = "isRegisteredUser";
pub const METHOD_SEND_MESSAGE: &str = "sendMessage";
pub const METHOD_SEND_MEDIA: &str = "sendMedia";
pub const METHOD_LOGOUT: &str = "logout";
pub const METHOD_DESTROY: &str = "destroy";

/// Parameters for `initialize`: launches the web client and starts pairing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
	/// Directory where the driver persists pairing credentials
	pub session_dir: PathBuf,
	/// Run the browser without a visible window
	pub headless: bool,
	/// Browser executable to use instead of the driver's bundled one
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub executable_path: Option<PathBuf>,
	/// Extra browser command-line flags
	#[serde(default)]
	pub args: Vec<String>,
}

/// Parameters for `isRegisteredUser`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IsRegisteredParams {
	pub chat_id: ChatId,
}

/// Result of `isRegisteredUser`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RegisteredResult {
	pub registered: bool,
}

/// Parameters for `sendMessage`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageParams {
	pub chat_id: ChatId,
	pub body: String,
}

/// Parameters for `sendMedia`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaParams {
	pub chat_id: ChatId,
	#[serde(flatten)]
	pub document: Document,
}

/// Result of `sendMessage` and `sendMedia`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentResult {
	pub id: MessageId,
}
