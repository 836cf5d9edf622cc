//! The shared holder of at most one live interpreter session.

use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, Notify};
use tracing::{debug, info, warn};

use crate::factory::SessionFactory;
use crate::session::ShellSession;

/// Counts operations holding leases on one session and lets teardown wait
/// for the count to drain.
#[derive(Default)]
struct OperationsGate {
	in_flight: AtomicUsize,
	idle: Notify,
}

impl OperationsGate {
	fn enter(&self) {
		self.in_flight.fetch_add(1, Ordering::SeqCst);
	}

	fn exit(&self) {
		if self.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
			self.idle.notify_waiters();
		}
	}

	async fn drained(&self) {
		loop {
			// Register interest before the check so a final exit between
			// the two cannot be missed.
			let notified = self.idle.notified();
			if self.in_flight.load(Ordering::SeqCst) == 0 {
				return;
			}
			notified.await;
		}
	}
}

struct LiveSession {
	session: Arc<ShellSession>,
	gate: Arc<OperationsGate>,
}

impl LiveSession {
	fn lease(&self) -> SessionLease {
		self.gate.enter();
		SessionLease { session: self.session.clone(), gate: self.gate.clone() }
	}
}

/// Borrowed access to the shared session for the duration of one operation.
///
/// Holding a lease keeps [`ShellRegistry::release`] from closing the
/// session underneath the operation; drop it once the operation's commands
/// are done.
pub struct SessionLease {
	session: Arc<ShellSession>,
	gate: Arc<OperationsGate>,
}

impl SessionLease {
	pub fn session(&self) -> &ShellSession {
		&self.session
	}
}

impl Deref for SessionLease {
	type Target = ShellSession;

	fn deref(&self) -> &ShellSession {
		&self.session
	}
}

impl Drop for SessionLease {
	fn drop(&mut self) {
		self.gate.exit();
	}
}

/// Owner of the single shared session.
///
/// Construct one per application scope, hand references to every consumer,
/// and call [`ShellRegistry::release`] when the scope ends. The slot lock
/// serializes creation, replacement, and removal; command execution never
/// takes it.
pub struct ShellRegistry {
	factory: Box<dyn SessionFactory>,
	slot: Mutex<Option<LiveSession>>,
}

impl ShellRegistry {
	pub fn new(factory: impl SessionFactory + 'static) -> Self {
		Self { factory: Box::new(factory), slot: Mutex::new(None) }
	}

	/// Returns a lease on the live session, creating one first if needed.
	///
	/// `None` means degraded mode: no interpreter could be started. The
	/// failure is logged and the slot stays empty, so a later call probes
	/// again. The slot lock is held across creation; concurrent callers
	/// can never race two interpreters into existence.
	pub async fn acquire(&self, prefer_privileged: bool) -> Option<SessionLease> {
		let mut slot = self.slot.lock().await;

		if let Some(live) = slot.take() {
			if live.session.is_alive() {
				debug!(target = "sufm.shell", session = live.session.id(), "reusing live session");
				let lease = live.lease();
				*slot = Some(live);
				return Some(lease);
			}

			warn!(
				target = "sufm.shell",
				session = live.session.id(),
				"slot held a dead session; replacing"
			);
			live.session.close().await;
		}

		debug!(target = "sufm.shell", prefer_privileged, "creating session");
		match self.factory.create(prefer_privileged).await {
			Ok(session) => {
				let live = LiveSession {
					session: Arc::new(session),
					gate: Arc::new(OperationsGate::default()),
				};
				let lease = live.lease();
				info!(
					target = "sufm.shell",
					session = live.session.id(),
					mode = %live.session.mode(),
					"session registered"
				);
				*slot = Some(live);
				Some(lease)
			}
			Err(err) => {
				warn!(
					target = "sufm.shell",
					error = %err,
					"session creation failed; continuing without shell"
				);
				None
			}
		}
	}

	/// Removes and closes `session` if the registry still holds it.
	///
	/// Identity is checked, so an evict raced against replacement cannot
	/// tear down the newer session. Leases still out on the evicted
	/// session fail their next command instead of blocking eviction.
	pub async fn evict(&self, session: &ShellSession) {
		let removed = {
			let mut slot = self.slot.lock().await;
			match slot.as_ref() {
				Some(live) if live.session.id() == session.id() => slot.take(),
				_ => None,
			}
		};

		if let Some(live) = removed {
			info!(target = "sufm.shell", session = live.session.id(), "session evicted");
			live.session.close().await;
		}
	}

	/// Releases the shared session: empties the slot, waits for operations
	/// in flight on it to finish, then closes it. Calling this again, or
	/// with nothing held, is a no-op.
	///
	/// Must not be called while holding a lease; the wait would never end.
	pub async fn release(&self) {
		let taken = self.slot.lock().await.take();
		let Some(live) = taken else {
			return;
		};

		debug!(
			target = "sufm.shell",
			session = live.session.id(),
			in_flight = live.gate.in_flight.load(Ordering::SeqCst),
			"waiting for operations to finish"
		);
		live.gate.drained().await;
		live.session.close().await;
		info!(target = "sufm.shell", session = live.session.id(), "session released");
	}
}
