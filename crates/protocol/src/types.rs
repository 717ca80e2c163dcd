//! Core value types shared by the driver bridge and the gateway.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Address suffix the chat network uses for individual accounts.
pub const USER_SERVER: &str = "c.us";

/// Content type used for document attachments.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Recipient address on the chat network (`<digits>@c.us`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(String);

impl ChatId {
	/// Builds a user address from an already normalized, digit-only number.
	pub fn for_user(number: &str) -> Self {
		Self(format!("{number}@{USER_SERVER}"))
	}

	/// Returns the wire representation.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for ChatId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Provider-assigned identifier of a sent message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for MessageId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// File attachment sent as its own message.
///
/// The body travels base64-encoded on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
	/// MIME type of the attachment
	pub mimetype: String,
	/// File name shown to the recipient
	pub filename: String,
	/// Raw file bytes
	#[serde(serialize_with = "serialize_base64", deserialize_with = "deserialize_base64")]
	pub data: Vec<u8>,
	/// Optional caption displayed under the attachment
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub caption: Option<String>,
}

impl Document {
	/// Creates a PDF attachment captioned with its own file name.
	pub fn pdf(filename: impl Into<String>, data: Vec<u8>) -> Self {
		let filename = filename.into();
		Self {
			mimetype: PDF_MIME_TYPE.to_string(),
			caption: Some(filename.clone()),
			filename,
			data,
		}
	}
}

fn serialize_base64<S>(data: &[u8], serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	serializer.serialize_str(&STANDARD.encode(data))
}

fn deserialize_base64<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
where
	D: Deserializer<'de>,
{
	let encoded: String = Deserialize::deserialize(deserializer)?;
	STANDARD.decode(encoded.as_bytes()).map_err(serde::de::Error::custom)
}
