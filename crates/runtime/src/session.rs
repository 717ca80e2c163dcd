//! Session handle abstraction.
//!
//! A [`SessionClient`] is one live connection to the chat network. The gateway
//! never constructs one directly; it asks a [`SessionFactory`] for a fresh
//! handle on every initialization attempt and hands it the callback that
//! receives lifecycle events for that handle only.

use std::sync::Arc;

use async_trait::async_trait;
use wa_protocol::{ChatId, Document, MessageId, SessionEvent};

use crate::error::Result;

/// Callback receiving lifecycle events from one session handle.
pub type EventHandler = Arc<dyn Fn(SessionEvent) + Send + Sync>;

#[async_trait]
pub trait SessionClient: Send + Sync {
	/// Begins connecting. Resolves once the web client is loaded, before pairing completes.
	async fn start(&self) -> Result<()>;

	/// Whether `chat` belongs to an account on the network.
	async fn is_registered(&self, chat: &ChatId) -> Result<bool>;

	async fn send_text(&self, chat: &ChatId, body: &str) -> Result<MessageId>;

	async fn send_document(&self, chat: &ChatId, document: Document) -> Result<MessageId>;

	/// Signs the linked device out and discards stored credentials.
	async fn logout(&self) -> Result<()>;

	/// Releases every resource held by the handle. Idempotent.
	async fn destroy(&self) -> Result<()>;
}

#[async_trait]
pub trait SessionFactory: Send + Sync {
	/// Builds an unstarted handle whose events are delivered to `events`.
	async fn create(&self, events: EventHandler) -> Result<Arc<dyn SessionClient>>;
}
