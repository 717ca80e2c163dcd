use tokio::task::JoinHandle;

struct Pending {
	generation: u64,
	handle: JoinHandle<()>,
}

/// At most one scheduled retry, tagged with the generation it was armed for.
#[derive(Default)]
pub(crate) struct RetryTimer {
	pending: Option<Pending>,
}

impl RetryTimer {
	/// Replaces any pending retry.
	pub fn arm(&mut self, generation: u64, handle: JoinHandle<()>) {
		self.cancel();
		self.pending = Some(Pending { generation, handle });
	}

	/// Aborts the pending retry, if any.
	pub fn cancel(&mut self) -> bool {
		match self.pending.take() {
			Some(pending) => {
				pending.handle.abort();
				true
			}
			None => false,
		}
	}

	/// Forgets the pending retry without aborting it. Called by the retry task itself once it fires.
	pub fn disarm(&mut self, generation: u64) {
		if self.pending.as_ref().is_some_and(|p| p.generation == generation) {
			self.pending = None;
		}
	}

	pub fn armed_for(&self) -> Option<u64> {
		self.pending.as_ref().map(|p| p.generation)
	}
}

impl Drop for RetryTimer {
	fn drop(&mut self) {
		self.cancel();
	}
}
