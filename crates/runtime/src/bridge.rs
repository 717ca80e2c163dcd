//! Session handles backed by an external driver process.
//!
//! Each handle owns one `node <driver.js>` child. Requests and events travel
//! over the child's stdio using the framing in [`crate::transport`]; the
//! child's stderr is forwarded to the `wa.driver` log target.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::Mutex;
use wa_protocol::{
	ChatId, Document, Event, InitializeParams, IsRegisteredParams, METHOD_DESTROY, METHOD_INITIALIZE, METHOD_IS_REGISTERED_USER,
	METHOD_LOGOUT, METHOD_SEND_MEDIA, METHOD_SEND_MESSAGE, MessageId, RegisteredResult, SendMediaParams, SendMessageParams, SentResult,
	SessionEvent,
};

use crate::browser::{default_browser_args, find_browser_executable};
use crate::connection::{Connection, FrameHandler};
use crate::driver::get_driver_executable;
use crate::error::{Error, Result};
use crate::session::{EventHandler, SessionClient, SessionFactory};

/// Reason reported when the driver's stdout closes without a prior `destroy`.
pub const DRIVER_EXITED: &str = "driver process exited";

const DESTROY_GRACE: Duration = Duration::from_secs(5);
const KILL_WAIT: Duration = Duration::from_millis(500);

/// How to launch the driver and the browser it hosts.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
	/// Directory where the driver persists pairing credentials
	pub session_dir: PathBuf,
	/// Run the browser without a window
	pub headless: bool,
	/// Explicit browser executable; discovered when `None`
	pub browser_executable: Option<PathBuf>,
	/// Browser command-line flags
	pub browser_args: Vec<String>,
}

impl BridgeOptions {
	pub fn new(session_dir: impl Into<PathBuf>) -> Self {
		Self {
			session_dir: session_dir.into(),
			headless: true,
			browser_executable: None,
			browser_args: default_browser_args(),
		}
	}

	fn initialize_params(&self) -> InitializeParams {
		InitializeParams {
			session_dir: self.session_dir.clone(),
			headless: self.headless,
			executable_path: self.browser_executable.clone().or_else(find_browser_executable),
			args: self.browser_args.clone(),
		}
	}
}

/// Spawns one driver process per session handle.
#[derive(Debug, Clone)]
pub struct BridgeFactory {
	options: BridgeOptions,
}

impl BridgeFactory {
	pub fn new(options: BridgeOptions) -> Self {
		Self { options }
	}
}

#[async_trait]
impl SessionFactory for BridgeFactory {
	async fn create(&self, events: EventHandler) -> Result<Arc<dyn SessionClient>> {
		let client = BridgeClient::launch(self.options.clone(), events).await?;
		Ok(Arc::new(client))
	}
}

/// Session handle talking to a live driver process.
pub struct BridgeClient {
	connection: Arc<Connection>,
	process: Mutex<Option<Child>>,
	closing: Arc<AtomicBool>,
	options: BridgeOptions,
}

impl BridgeClient {
	/// Spawns the driver and wires its stdio. The browser is not launched until [`SessionClient::start`].
	pub async fn launch(options: BridgeOptions, events: EventHandler) -> Result<Self> {
		let (node_exe, driver_js) = get_driver_executable()?;
		tracing::debug!(target = "wa.bridge", node = %node_exe.display(), driver = %driver_js.display(), "launching driver");

		let mut child = Command::new(&node_exe)
			.arg(&driver_js)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::piped())
			.kill_on_drop(true)
			.spawn()
			.map_err(|e| Error::LaunchFailed(format!("Failed to spawn process: {e}")))?;

		tokio::time::sleep(Duration::from_millis(100)).await;
		match child.try_wait() {
			Ok(Some(status)) => {
				return Err(Error::LaunchFailed(format!("Driver process exited immediately with status: {status}")));
			}
			Ok(None) => {}
			Err(e) => return Err(Error::LaunchFailed(format!("Failed to check process status: {e}"))),
		}

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdin not captured".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::LaunchFailed("driver stdout not captured".to_string()))?;
		if let Some(stderr) = child.stderr.take() {
			tokio::spawn(async move {
				let mut lines = BufReader::new(stderr).lines();
				while let Ok(Some(line)) = lines.next_line().await {
					tracing::debug!(target = "wa.driver", "{line}");
				}
			});
		}

		let (connection, closed) = Connection::start(stdin, stdout, frame_handler(Arc::clone(&events)));

		let closing = Arc::new(AtomicBool::new(false));
		let watch_closing = Arc::clone(&closing);
		tokio::spawn(async move {
			let _ = closed.await;
			if !watch_closing.load(Ordering::SeqCst) {
				tracing::warn!(target = "wa.bridge", "driver stdout closed unexpectedly");
				events(SessionEvent::Disconnected(DRIVER_EXITED.to_string()));
			}
		});

		Ok(Self {
			connection,
			process: Mutex::new(Some(child)),
			closing,
			options,
		})
	}

	async fn kill(&self) -> Result<()> {
		let Some(mut child) = self.process.lock().await.take() else {
			return Ok(());
		};
		if child.try_wait()?.is_none() {
			child.start_kill()?;
		}
		let _ = tokio::time::timeout(KILL_WAIT, child.wait()).await;
		Ok(())
	}
}

fn frame_handler(events: EventHandler) -> FrameHandler {
	Arc::new(move |frame: Event| match SessionEvent::try_from(&frame) {
		Ok(event) => events(event),
		Err(e) => tracing::debug!(target = "wa.bridge", error = %e, "ignoring driver event"),
	})
}

#[async_trait]
impl SessionClient for BridgeClient {
	async fn start(&self) -> Result<()> {
		let params = self.options.initialize_params();
		tracing::debug!(
			target = "wa.bridge",
			session_dir = %params.session_dir.display(),
			headless = params.headless,
			browser = ?params.executable_path,
			"initializing web client"
		);
		self.connection.send(METHOD_INITIALIZE, serde_json::to_value(&params)?).await?;
		Ok(())
	}

	async fn is_registered(&self, chat: &ChatId) -> Result<bool> {
		let params = IsRegisteredParams { chat_id: chat.clone() };
		let result: RegisteredResult = self.connection.call(METHOD_IS_REGISTERED_USER, &params).await?;
		Ok(result.registered)
	}

	async fn send_text(&self, chat: &ChatId, body: &str) -> Result<MessageId> {
		let params = SendMessageParams {
			chat_id: chat.clone(),
			body: body.to_string(),
		};
		let result: SentResult = self.connection.call(METHOD_SEND_MESSAGE, &params).await?;
		Ok(result.id)
	}

	async fn send_document(&self, chat: &ChatId, document: Document) -> Result<MessageId> {
		let params = SendMediaParams {
			chat_id: chat.clone(),
			document,
		};
		let result: SentResult = self.connection.call(METHOD_SEND_MEDIA, &params).await?;
		Ok(result.id)
	}

	async fn logout(&self) -> Result<()> {
		self.connection.send(METHOD_LOGOUT, json!({})).await?;
		Ok(())
	}

	async fn destroy(&self) -> Result<()> {
		if self.closing.swap(true, Ordering::SeqCst) {
			return self.kill().await;
		}
		match tokio::time::timeout(DESTROY_GRACE, self.connection.send(METHOD_DESTROY, json!({}))).await {
			Ok(Ok(_)) => {}
			Ok(Err(e)) => tracing::debug!(target = "wa.bridge", error = %e, "driver destroy failed"),
			Err(_) => tracing::debug!(target = "wa.bridge", "driver destroy timed out"),
		}
		self.kill().await
	}
}

#[cfg(test)]
mod tests {
	use std::path::Path;

	use parking_lot::Mutex as SyncMutex;
	use serde_json::json;

	use super::*;

	#[test]
	fn options_default_to_headless_with_container_flags() {
		let options = BridgeOptions::new("/tmp/whatsapp-session");
		assert!(options.headless);
		assert_eq!(options.browser_args, default_browser_args());
	}

	#[test]
	fn explicit_browser_is_forwarded() {
		let mut options = BridgeOptions::new("/srv/session");
		options.browser_executable = Some(PathBuf::from("/opt/chrome/chrome"));
		options.headless = false;

		let params = options.initialize_params();
		assert_eq!(params.session_dir, Path::new("/srv/session"));
		assert_eq!(params.executable_path.as_deref(), Some(Path::new("/opt/chrome/chrome")));
		assert!(!params.headless);
	}

	#[test]
	fn frame_handler_decodes_known_events_only() {
		let seen = Arc::new(SyncMutex::new(Vec::new()));
		let sink = Arc::clone(&seen);
		let handler = frame_handler(Arc::new(move |event| sink.lock().push(event)));

		handler(Event {
			event: "authenticated".to_string(),
			params: serde_json::Value::Null,
		});
		handler(Event {
			event: "message".to_string(),
			params: json!({"body": "hi"}),
		});
		handler(Event {
			event: "disconnected".to_string(),
			params: json!({"reason": "LOGOUT"}),
		});

		assert_eq!(
			*seen.lock(),
			vec![SessionEvent::Authenticated, SessionEvent::Disconnected("LOGOUT".to_string())]
		);
	}
}
