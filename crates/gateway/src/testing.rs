//! Test doubles for the session handle.
//!
//! [`StubFactory`] hands out [`StubClient`]s that record every call, follow a
//! shared, mutable [`StubScript`], and let tests push lifecycle events into
//! the supervisor as if the driver had sent them.
//!
//! # Example
//!
//! ```ignore
//! let factory = StubFactory::new();
//! let supervisor = Supervisor::new(Arc::new(factory.clone()), RetryPolicy::default());
//! supervisor.initialize().await;
//! factory.latest().unwrap().emit(SessionEvent::Ready(SessionIdentity::default()));
//! assert_eq!(supervisor.status(), ConnectionStatus::Connected);
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use wa_protocol::{ChatId, Document, MessageId, SessionEvent};
use wa_runtime::{Error, EventHandler, Result, SessionClient, SessionFactory};

/// Behavior shared by every client a [`StubFactory`] creates. Changes apply immediately.
#[derive(Debug, Clone)]
pub struct StubScript {
	/// `create` waits this long before doing anything else
	pub create_delay: Duration,
	/// `create` fails with a launch error
	pub fail_create: bool,
	/// Events emitted from inside `start`, before it returns
	pub start_events: Vec<SessionEvent>,
	/// `start` fails with this message
	pub start_error: Option<String>,
	/// `start` never completes
	pub start_hangs: bool,
	/// Answer to `is_registered`
	pub registered: bool,
	/// `send_text` and `send_document` fail with this message
	pub send_error: Option<String>,
	/// `logout` fails with this message
	pub logout_error: Option<String>,
	/// `destroy` fails with this message
	pub destroy_error: Option<String>,
	/// `destroy` never completes
	pub destroy_hangs: bool,
}

impl Default for StubScript {
	fn default() -> Self {
		Self {
			create_delay: Duration::ZERO,
			fail_create: false,
			start_events: Vec::new(),
			start_error: None,
			start_hangs: false,
			registered: true,
			send_error: None,
			logout_error: None,
			destroy_error: None,
			destroy_hangs: false,
		}
	}
}

/// One recorded call on a [`StubClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StubCall {
	Start,
	IsRegistered(ChatId),
	SendText(ChatId, String),
	SendDocument(ChatId, Document),
	Logout,
	Destroy,
}

struct Shared {
	script: Mutex<StubScript>,
	clients: Mutex<Vec<Arc<StubClient>>>,
	journal: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub struct StubFactory {
	shared: Arc<Shared>,
}

impl Default for StubFactory {
	fn default() -> Self {
		Self::new()
	}
}

impl StubFactory {
	pub fn new() -> Self {
		Self::with_script(StubScript::default())
	}

	pub fn with_script(script: StubScript) -> Self {
		Self {
			shared: Arc::new(Shared {
				script: Mutex::new(script),
				clients: Mutex::new(Vec::new()),
				journal: Mutex::new(Vec::new()),
			}),
		}
	}

	/// Mutates the script seen by all current and future clients.
	pub fn update(&self, f: impl FnOnce(&mut StubScript)) {
		f(&mut self.shared.script.lock());
	}

	/// Number of clients created so far.
	pub fn created(&self) -> usize {
		self.shared.clients.lock().len()
	}

	pub fn client(&self, index: usize) -> Arc<StubClient> {
		Arc::clone(&self.shared.clients.lock()[index])
	}

	pub fn latest(&self) -> Option<Arc<StubClient>> {
		self.shared.clients.lock().last().cloned()
	}

	/// Lifecycle calls across all clients in order, e.g. `["create#0", "start#0", "destroy#0"]`.
	pub fn journal(&self) -> Vec<String> {
		self.shared.journal.lock().clone()
	}

	fn script(&self) -> StubScript {
		self.shared.script.lock().clone()
	}

	fn log(&self, entry: String) {
		self.shared.journal.lock().push(entry);
	}
}

#[async_trait]
impl SessionFactory for StubFactory {
	async fn create(&self, events: EventHandler) -> Result<Arc<dyn SessionClient>> {
		let delay = self.script().create_delay;
		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}
		if self.script().fail_create {
			self.log("create-failed".to_string());
			return Err(Error::LaunchFailed("stub refused to launch".to_string()));
		}
		let mut clients = self.shared.clients.lock();
		let index = clients.len();
		let client = Arc::new(StubClient {
			index,
			factory: self.clone(),
			events,
			calls: Mutex::new(Vec::new()),
		});
		clients.push(Arc::clone(&client));
		drop(clients);
		self.log(format!("create#{index}"));
		Ok(client)
	}
}

pub struct StubClient {
	index: usize,
	factory: StubFactory,
	events: EventHandler,
	calls: Mutex<Vec<StubCall>>,
}

impl StubClient {
	/// Delivers `event` to the supervisor exactly as the driver bridge would.
	pub fn emit(&self, event: SessionEvent) {
		(self.events)(event);
	}

	pub fn calls(&self) -> Vec<StubCall> {
		self.calls.lock().clone()
	}

	pub fn count(&self, matches: impl Fn(&StubCall) -> bool) -> usize {
		self.calls.lock().iter().filter(|call| matches(call)).count()
	}

	pub fn was_destroyed(&self) -> bool {
		self.count(|call| matches!(call, StubCall::Destroy)) > 0
	}

	fn record(&self, call: StubCall) {
		self.calls.lock().push(call);
	}

	fn remote(message: &str) -> Error {
		Error::Remote {
			name: "Error".to_string(),
			message: message.to_string(),
		}
	}
}

#[async_trait]
impl SessionClient for StubClient {
	async fn start(&self) -> Result<()> {
		self.record(StubCall::Start);
		self.factory.log(format!("start#{}", self.index));
		tokio::task::yield_now().await;

		let script = self.factory.script();
		for event in script.start_events {
			self.emit(event);
		}
		if script.start_hangs {
			std::future::pending::<()>().await;
		}
		match script.start_error {
			Some(message) => Err(Self::remote(&message)),
			None => Ok(()),
		}
	}

	async fn is_registered(&self, chat: &ChatId) -> Result<bool> {
		self.record(StubCall::IsRegistered(chat.clone()));
		Ok(self.factory.script().registered)
	}

	async fn send_text(&self, chat: &ChatId, body: &str) -> Result<MessageId> {
		self.record(StubCall::SendText(chat.clone(), body.to_string()));
		if let Some(message) = self.factory.script().send_error {
			return Err(Self::remote(&message));
		}
		let n = self.count(|call| matches!(call, StubCall::SendText(..) | StubCall::SendDocument(..)));
		Ok(MessageId(format!("true_{chat}_STUB{n}")))
	}

	async fn send_document(&self, chat: &ChatId, document: Document) -> Result<MessageId> {
		self.record(StubCall::SendDocument(chat.clone(), document));
		if let Some(message) = self.factory.script().send_error {
			return Err(Self::remote(&message));
		}
		let n = self.count(|call| matches!(call, StubCall::SendText(..) | StubCall::SendDocument(..)));
		Ok(MessageId(format!("true_{chat}_STUB{n}")))
	}

	async fn logout(&self) -> Result<()> {
		self.record(StubCall::Logout);
		match self.factory.script().logout_error {
			Some(message) => Err(Self::remote(&message)),
			None => Ok(()),
		}
	}

	async fn destroy(&self) -> Result<()> {
		self.record(StubCall::Destroy);
		self.factory.log(format!("destroy#{}", self.index));
		tokio::task::yield_now().await;

		let script = self.factory.script();
		if script.destroy_hangs {
			std::future::pending::<()>().await;
		}
		match script.destroy_error {
			Some(message) => Err(Self::remote(&message)),
			None => Ok(()),
		}
	}
}
