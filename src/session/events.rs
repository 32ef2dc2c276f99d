//! Change notifications published by session stores.

// std
use std::sync::Weak;
// self
use crate::{
	_prelude::*,
	session::{SessionKey, SessionSnapshot},
};

/// Callback invoked for every changed session entry.
pub type SessionListener = Arc<dyn Fn(&SessionChange) + Send + Sync>;

/// Notification describing one changed entry and the session state after the change.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionChange {
	/// Entry that changed.
	pub key: SessionKey,
	/// All entries after the change was applied.
	pub snapshot: SessionSnapshot,
}

#[derive(Default)]
struct Listeners {
	next_id: u64,
	entries: Vec<(u64, SessionListener)>,
}

/// Listener registry shared by the built-in stores.
#[derive(Clone, Default)]
pub struct SessionEvents(Arc<Mutex<Listeners>>);
impl SessionEvents {
	/// Registers `listener` until the returned guard is dropped.
	pub fn subscribe(&self, listener: SessionListener) -> SessionSubscription {
		let mut listeners = self.0.lock();
		let id = listeners.next_id;

		listeners.next_id += 1;
		listeners.entries.push((id, listener));

		SessionSubscription { id, registry: Some(Arc::downgrade(&self.0)) }
	}

	/// Notifies every listener once per key in `keys`.
	///
	/// Listeners run outside the registry lock, so they may subscribe, unsubscribe, or read
	/// the store that published the change.
	pub fn publish(&self, keys: &[SessionKey], snapshot: &SessionSnapshot) {
		if keys.is_empty() {
			return;
		}

		let listeners = self
			.0
			.lock()
			.entries
			.iter()
			.map(|(_, listener)| listener.clone())
			.collect::<Vec<_>>();

		for key in keys {
			let change = SessionChange { key: *key, snapshot: snapshot.clone() };

			for listener in &listeners {
				listener(&change);
			}
		}
	}

	/// Returns the number of registered listeners.
	pub fn listener_count(&self) -> usize {
		self.0.lock().entries.len()
	}
}
impl Debug for SessionEvents {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionEvents").field("listeners", &self.listener_count()).finish()
	}
}

/// Guard returned by [`SessionStore::subscribe`](crate::session::SessionStore::subscribe);
/// dropping it unregisters the listener.
#[must_use = "dropping the subscription unregisters the listener"]
pub struct SessionSubscription {
	id: u64,
	registry: Option<Weak<Mutex<Listeners>>>,
}
impl SessionSubscription {
	/// Guard for stores that never publish changes.
	pub fn detached() -> Self {
		Self { id: 0, registry: None }
	}
}
impl Drop for SessionSubscription {
	fn drop(&mut self) {
		if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
			registry.lock().entries.retain(|(id, _)| *id != self.id);
		}
	}
}
impl Debug for SessionSubscription {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionSubscription")
			.field("id", &self.id)
			.field("attached", &self.registry.is_some())
			.finish()
	}
}
