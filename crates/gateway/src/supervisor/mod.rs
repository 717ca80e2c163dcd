//! Connection-lifecycle supervisor.
//!
//! Owns the single session handle and everything observable about it. All
//! state changes caused by the handle go through [`Supervisor::handle_event`];
//! handle replacement runs inside one async critical section so overlapping
//! initializations queue instead of interleaving.
//!
//! Every initialization and every operator restart bumps a generation counter.
//! Event callbacks and retry timers remember the generation they were created
//! for and are ignored once it is stale.

mod state;
mod timer;


use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use wa_protocol::SessionEvent;
use wa_runtime::{EventHandler, SessionClient, SessionFactory};

pub use self::state::{ConnectionStatus, SupervisorSnapshot};
use self::state::SessionState;
use self::timer::RetryTimer;
use crate::presenter::qr::qr_data_uri;

/// Retry cap and timing knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Consecutive initialization attempts before automatic retries stop
	pub max_attempts: u32,
	/// Wait before retrying a failed initialization
	pub init_retry_delay: Duration,
	/// Wait before reconnecting after a disconnect or auth failure
	pub reconnect_delay: Duration,
	/// Wait between disposal and re-initialization on operator restart
	pub restart_delay: Duration,
	/// Upper bound on disposing a handle
	pub dispose_timeout: Duration,
	/// Upper bound on starting a handle
	pub start_timeout: Duration,
}

impl Default for RetryPolicy {
	fn default() -> Self {
		Self {
			max_attempts: 3,
			init_retry_delay: Duration::from_secs(10),
			reconnect_delay: Duration::from_secs(5),
			restart_delay: Duration::from_secs(2),
			dispose_timeout: Duration::from_secs(10),
			start_timeout: Duration::from_secs(120),
		}
	}
}

struct Inner {
	factory: Arc<dyn SessionFactory>,
	policy: RetryPolicy,
	state: Mutex<SessionState>,
	client: Mutex<Option<Arc<dyn SessionClient>>>,
	lifecycle: tokio::sync::Mutex<()>,
	retry: Mutex<RetryTimer>,
	shutting_down: AtomicBool,
}

/// Cheaply cloneable handle to the process-wide session supervisor.
#[derive(Clone)]
pub struct Supervisor {
	inner: Arc<Inner>,
}

impl Supervisor {
	pub fn new(factory: Arc<dyn SessionFactory>, policy: RetryPolicy) -> Self {
		Self {
			inner: Arc::new(Inner {
				factory,
				policy,
				state: Mutex::new(SessionState::new()),
				client: Mutex::new(None),
				lifecycle: tokio::sync::Mutex::new(()),
				retry: Mutex::new(RetryTimer::default()),
				shutting_down: AtomicBool::new(false),
			}),
		}
	}

	pub fn policy(&self) -> &RetryPolicy {
		&self.inner.policy
	}

	pub fn snapshot(&self) -> SupervisorSnapshot {
		self.inner.state.lock().snapshot()
	}

	pub fn status(&self) -> ConnectionStatus {
		self.inner.state.lock().status
	}

	/// The live handle, only while the session is `connected`.
	pub fn connected_client(&self) -> Option<Arc<dyn SessionClient>> {
		let state = self.inner.state.lock();
		if state.status != ConnectionStatus::Connected {
			return None;
		}
		self.inner.client.lock().clone()
	}

	/// The live handle regardless of status.
	pub fn client(&self) -> Option<Arc<dyn SessionClient>> {
		self.inner.client.lock().clone()
	}

	/// Whether an automatic retry is scheduled.
	pub fn retry_pending(&self) -> bool {
		self.inner.retry.lock().armed_for().is_some()
	}

	/// Replaces the session handle with a fresh one and starts it.
	///
	/// Concurrent callers queue on the lifecycle lock. Failures are recorded in
	/// the snapshot and may schedule a retry; they are never returned.
	pub async fn initialize(&self) {
		let _guard = self.inner.lifecycle.lock().await;
		self.initialize_locked().await;
	}

	/// Begins the first attempt without waiting for the handle.
	///
	/// The attempt counter and status are updated before this returns, so a
	/// snapshot taken right after already reports the attempt. Building and
	/// starting the handle happen in the background under the lifecycle lock.
	pub fn start(&self) {
		let generation = self.begin_attempt();
		let supervisor = self.clone();
		tokio::spawn(async move {
			let _guard = supervisor.inner.lifecycle.lock().await;
			if supervisor.current_generation() != generation {
				return;
			}
			supervisor.dispose_current().await;
			supervisor.run_attempt(generation).await;
		});
	}

	async fn initialize_locked(&self) {
		if self.inner.shutting_down.load(Ordering::SeqCst) {
			return;
		}
		self.dispose_current().await;
		let generation = self.begin_attempt();
		self.run_attempt(generation).await;
	}

	/// Counts a new attempt and moves to `initializing` under a fresh generation.
	fn begin_attempt(&self) -> u64 {
		self.inner.retry.lock().cancel();
		let (generation, attempt) = {
			let mut state = self.inner.state.lock();
			state.init_attempts += 1;
			state.last_error = None;
			state.generation += 1;
			state.transition(ConnectionStatus::Initializing);
			(state.generation, state.init_attempts)
		};
		info!(target = "wa.supervisor", attempt, generation, "initializing session");
		generation
	}

	async fn run_attempt(&self, generation: u64) {
		if self.inner.shutting_down.load(Ordering::SeqCst) {
			return;
		}
		let client = match self.inner.factory.create(self.event_handler(generation)).await {
			Ok(client) => client,
			Err(err) => {
				self.fail_initialization(generation, err.to_string());
				return;
			}
		};

		if self.current_generation() != generation {
			debug!(target = "wa.supervisor", generation, "initialization superseded, discarding new handle");
			self.dispose(client).await;
			return;
		}
		*self.inner.client.lock() = Some(Arc::clone(&client));

		match tokio::time::timeout(self.inner.policy.start_timeout, client.start()).await {
			Ok(Ok(())) => debug!(target = "wa.supervisor", generation, "session handle started"),
			Ok(Err(err)) => self.fail_initialization(generation, err.to_string()),
			Err(_) => self.fail_initialization(
				generation,
				format!("session start timed out after {}s", self.inner.policy.start_timeout.as_secs()),
			),
		}
	}

	/// Applies one lifecycle event emitted by the handle of `generation`.
	pub fn handle_event(&self, generation: u64, event: SessionEvent) {
		let pairing_image = match &event {
			SessionEvent::PairingChallenge(code) => match qr_data_uri(code) {
				Ok(uri) => Some(uri),
				Err(err) => {
					warn!(target = "wa.supervisor", error = %err, "failed to render pairing code");
					None
				}
			},
			_ => None,
		};

		let retry_after = {
			let mut state = self.inner.state.lock();
			if state.generation != generation {
				debug!(target = "wa.supervisor", event = event.name(), generation, current = state.generation, "ignoring stale event");
				return;
			}

			match event {
				SessionEvent::PairingChallenge(_) => {
					if !state.transition(ConnectionStatus::QrReady) {
						debug!(target = "wa.supervisor", status = %state.status, "ignoring pairing code");
						return;
					}
					state.qr_code = pairing_image;
					state.init_attempts = 0;
					info!(target = "wa.supervisor", "pairing code ready");
					None
				}
				SessionEvent::Authenticated => {
					if state.transition(ConnectionStatus::Connecting) {
						info!(target = "wa.supervisor", "session authenticated");
					} else {
						debug!(target = "wa.supervisor", status = %state.status, "ignoring authenticated");
					}
					None
				}
				SessionEvent::LoadingProgress { percent, message } => {
					state.transition(ConnectionStatus::Connecting);
					debug!(target = "wa.supervisor", percent, message = message.as_deref().unwrap_or(""), status = %state.status, "loading");
					None
				}
				SessionEvent::Ready(identity) => {
					if !state.transition(ConnectionStatus::Connected) {
						debug!(target = "wa.supervisor", status = %state.status, "ignoring ready");
						return;
					}
					info!(
						target = "wa.supervisor",
						name = identity.name.as_deref().unwrap_or("unknown"),
						phone = identity.phone.as_deref().unwrap_or(""),
						"session connected"
					);
					state.identity = Some(identity);
					state.init_attempts = 0;
					None
				}
				SessionEvent::AuthFailed(message) => {
					warn!(target = "wa.supervisor", %message, "authentication failed");
					state.transition(ConnectionStatus::Disconnected);
					state.last_error = Some(format!("Authentication failed: {message}"));
					self.retry_delay(&state, self.inner.policy.reconnect_delay)
				}
				SessionEvent::Disconnected(reason) => {
					warn!(target = "wa.supervisor", %reason, "session disconnected");
					state.transition(ConnectionStatus::Disconnected);
					state.last_error = Some(reason);
					self.retry_delay(&state, self.inner.policy.reconnect_delay)
				}
			}
		};

		if let Some(delay) = retry_after {
			self.schedule_retry(generation, delay);
		}
	}

	fn fail_initialization(&self, generation: u64, message: String) {
		let retry_after = {
			let mut state = self.inner.state.lock();
			if state.generation != generation {
				debug!(target = "wa.supervisor", generation, "ignoring failure of superseded attempt");
				return;
			}
			warn!(target = "wa.supervisor", attempt = state.init_attempts, error = %message, "initialization failed");
			state.transition(ConnectionStatus::Error);
			state.last_error = Some(message);
			self.retry_delay(&state, self.inner.policy.init_retry_delay)
		};

		if let Some(delay) = retry_after {
			self.schedule_retry(generation, delay);
		}
	}

	fn retry_delay(&self, state: &SessionState, delay: Duration) -> Option<Duration> {
		if self.inner.shutting_down.load(Ordering::SeqCst) {
			return None;
		}
		if state.init_attempts < self.inner.policy.max_attempts {
			Some(delay)
		} else {
			warn!(
				target = "wa.supervisor",
				attempts = state.init_attempts,
				"retry limit reached; waiting for operator restart"
			);
			None
		}
	}

	fn schedule_retry(&self, generation: u64, delay: Duration) {
		info!(target = "wa.supervisor", generation, delay_secs = delay.as_secs(), "scheduling retry");
		let weak = Arc::downgrade(&self.inner);
		// Held across spawn so the task cannot disarm before it is armed.
		let mut timer = self.inner.retry.lock();
		let handle = tokio::spawn(async move {
			tokio::time::sleep(delay).await;
			if let Some(supervisor) = Supervisor::upgrade(&weak) {
				supervisor.retry(generation).await;
			}
		});
		timer.arm(generation, handle);
	}

	async fn retry(&self, expected: u64) {
		self.inner.retry.lock().disarm(expected);
		let _guard = self.inner.lifecycle.lock().await;

		let proceed = {
			let state = self.inner.state.lock();
			state.generation == expected && state.status.is_retryable() && state.init_attempts < self.inner.policy.max_attempts
		};
		if !proceed {
			debug!(target = "wa.supervisor", generation = expected, "retry no longer applies");
			return;
		}
		self.initialize_locked().await;
	}

	/// Operator restart: resets the attempt counter and re-initializes after `restart_delay`.
	///
	/// Returns immediately; disposal and re-initialization happen in the background.
	pub fn restart(&self) {
		self.inner.retry.lock().cancel();
		let generation = {
			let mut state = self.inner.state.lock();
			state.generation += 1;
			state.init_attempts = 0;
			state.transition(ConnectionStatus::Initializing);
			state.generation
		};
		info!(target = "wa.supervisor", generation, "restart requested");

		let supervisor = self.clone();
		tokio::spawn(async move {
			let _guard = supervisor.inner.lifecycle.lock().await;
			if supervisor.current_generation() != generation {
				return;
			}
			supervisor.dispose_current().await;
			tokio::time::sleep(supervisor.inner.policy.restart_delay).await;
			if supervisor.current_generation() != generation {
				return;
			}
			supervisor.initialize_locked().await;
		});
	}

	/// Records a successful sign-out.
	pub fn mark_logged_out(&self) {
		let mut state = self.inner.state.lock();
		state.transition(ConnectionStatus::Disconnected);
		info!(target = "wa.supervisor", "logged out");
	}

	/// Stops retries and disposes the current handle. Later initializations are no-ops.
	///
	/// Waits for an initialization in flight, so a handle it installs is disposed too.
	pub async fn shutdown(&self) {
		self.inner.shutting_down.store(true, Ordering::SeqCst);
		self.inner.retry.lock().cancel();
		let _guard = self.inner.lifecycle.lock().await;
		self.inner.state.lock().generation += 1;
		self.dispose_current().await;
		info!(target = "wa.supervisor", "supervisor stopped");
	}

	async fn dispose_current(&self) {
		let client = self.inner.client.lock().take();
		if let Some(client) = client {
			self.dispose(client).await;
		}
	}

	async fn dispose(&self, client: Arc<dyn SessionClient>) {
		match tokio::time::timeout(self.inner.policy.dispose_timeout, client.destroy()).await {
			Ok(Ok(())) => debug!(target = "wa.supervisor", "session handle disposed"),
			Ok(Err(err)) => warn!(target = "wa.supervisor", error = %err, "session handle disposal failed"),
			Err(_) => warn!(
				target = "wa.supervisor",
				timeout_secs = self.inner.policy.dispose_timeout.as_secs(),
				"session handle disposal timed out"
			),
		}
	}

	fn current_generation(&self) -> u64 {
		self.inner.state.lock().generation
	}

	fn event_handler(&self, generation: u64) -> EventHandler {
		let weak = Arc::downgrade(&self.inner);
		Arc::new(move |event| {
			if let Some(supervisor) = Supervisor::upgrade(&weak) {
				supervisor.handle_event(generation, event);
			}
		})
	}

	fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
		weak.upgrade().map(|inner| Self { inner })
	}
}
