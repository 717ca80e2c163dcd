//! Request/response correlation on top of the pipe transport.
//!
//! # Message Flow
//!
//! 1. Caller invokes [`Connection::send`] with a method and params
//! 2. Connection assigns a sequential ID and parks a oneshot sender
//! 3. The request is queued to the writer task
//! 4. The dispatch loop matches the driver's response by ID and completes the oneshot
//!
//! Frames carrying an `event` field are handed to the event handler instead.
//! When the driver's stdout closes, every pending request fails with
//! [`Error::ChannelClosed`] and the task returned by [`Connection::start`] finishes.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use wa_protocol::{ErrorPayload, Event, Message, Request};

use crate::error::{Error, Result};
use crate::transport::PipeTransport;

/// Receives every event frame the driver sends.
pub type FrameHandler = Arc<dyn Fn(Event) + Send + Sync>;

type CallbackMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Result<Value>>>>>;

/// Removes the pending callback if the request future is dropped before completion.
struct CancelGuard {
	id: u32,
	callbacks: CallbackMap,
	completed: bool,
}

impl Drop for CancelGuard {
	fn drop(&mut self) {
		if !self.completed && self.callbacks.lock().remove(&self.id).is_some() {
			tracing::debug!(target = "wa.bridge", id = self.id, "removed orphaned callback");
		}
	}
}

struct ResponseFuture {
	rx: oneshot::Receiver<Result<Value>>,
	guard: CancelGuard,
}

impl Future for ResponseFuture {
	type Output = Result<Value>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match Pin::new(&mut self.rx).poll(cx) {
			Poll::Ready(result) => {
				self.guard.completed = true;
				Poll::Ready(result.map_err(|_| Error::ChannelClosed).and_then(|r| r))
			}
			Poll::Pending => Poll::Pending,
		}
	}
}

/// Correlated request channel to the driver process.
pub struct Connection {
	last_id: AtomicU32,
	callbacks: CallbackMap,
	outbound_tx: mpsc::UnboundedSender<Value>,
	on_event: FrameHandler,
}

impl Connection {
	/// Wires the connection to the driver's stdio and spawns the reader, writer and dispatch tasks.
	///
	/// The returned handle completes once the driver's stdout has closed and all
	/// pending requests have been failed.
	pub fn start<W, R>(stdin: W, stdout: R, on_event: FrameHandler) -> (Arc<Self>, JoinHandle<()>)
	where
		W: AsyncWrite + Unpin + Send + 'static,
		R: AsyncRead + Unpin + Send + 'static,
	{
		let (transport, mut message_rx) = PipeTransport::new(stdin, stdout);
		let (mut sender, receiver) = transport.into_parts();
		let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Value>();

		let connection = Arc::new(Self {
			last_id: AtomicU32::new(0),
			callbacks: Arc::new(Mutex::new(HashMap::new())),
			outbound_tx,
			on_event,
		});

		let reader = tokio::spawn(async move {
			if let Err(e) = receiver.run().await {
				tracing::warn!(target = "wa.bridge", error = %e, "transport read error");
			}
		});

		tokio::spawn(async move {
			while let Some(message) = outbound_rx.recv().await {
				if let Err(e) = sender.send(message).await {
					tracing::warn!(target = "wa.bridge", error = %e, "transport write error");
					break;
				}
			}
		});

		let dispatcher = Arc::clone(&connection);
		let handle = tokio::spawn(async move {
			while let Some(value) = message_rx.recv().await {
				match serde_json::from_value::<Message>(value) {
					Ok(message) => {
						if let Err(e) = dispatcher.dispatch(message) {
							tracing::warn!(target = "wa.bridge", error = %e, "dropping driver frame");
						}
					}
					Err(e) => tracing::warn!(target = "wa.bridge", error = %e, "failed to parse driver frame"),
				}
			}
			let _ = reader.await;
			dispatcher.fail_pending();
		});

		(connection, handle)
	}

	/// Sends a request and waits for the matching response.
	pub async fn send(&self, method: &str, params: Value) -> Result<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		tracing::debug!(target = "wa.bridge", id, method, "sending request");

		let (tx, rx) = oneshot::channel();
		self.callbacks.lock().insert(id, tx);
		let guard = CancelGuard {
			id,
			callbacks: Arc::clone(&self.callbacks),
			completed: false,
		};

		let request = Request {
			id,
			method: method.to_string(),
			params,
		};
		if self.outbound_tx.send(serde_json::to_value(&request)?).is_err() {
			return Err(Error::ChannelClosed);
		}

		ResponseFuture { rx, guard }.await
	}

	/// Typed wrapper around [`Connection::send`].
	pub async fn call<P, T>(&self, method: &str, params: &P) -> Result<T>
	where
		P: Serialize + ?Sized,
		T: DeserializeOwned,
	{
		let value = self.send(method, serde_json::to_value(params)?).await?;
		Ok(serde_json::from_value(value)?)
	}

	#[cfg(test)]
	pub(crate) fn pending(&self) -> usize {
		self.callbacks.lock().len()
	}

	pub(crate) fn dispatch(&self, message: Message) -> Result<()> {
		match message {
			Message::Response(response) => {
				let callback = self
					.callbacks
					.lock()
					.remove(&response.id)
					.ok_or_else(|| Error::ProtocolError(format!("Cannot find request to respond: id={}", response.id)))?;

				let result = match response.error {
					Some(error) => Err(remote_error(error)),
					None => Ok(response.result.unwrap_or(Value::Null)),
				};
				let _ = callback.send(result);
				Ok(())
			}
			Message::Event(event) => {
				tracing::trace!(target = "wa.bridge", event = %event.event, "driver event");
				(self.on_event)(event);
				Ok(())
			}
			Message::Unknown(value) => Err(Error::ProtocolError(format!("Unrecognized frame: {value}"))),
		}
	}

	fn fail_pending(&self) {
		let pending: Vec<_> = self.callbacks.lock().drain().collect();
		for (id, callback) in pending {
			tracing::debug!(target = "wa.bridge", id, "failing request after driver exit");
			let _ = callback.send(Err(Error::ChannelClosed));
		}
	}
}

fn remote_error(payload: ErrorPayload) -> Error {
	Error::Remote {
		name: payload.name.unwrap_or_else(|| "Error".to_string()),
		message: payload.message,
	}
}
