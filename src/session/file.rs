//! Simple file-backed [`SessionStore`] that survives restarts and can be shared between
//! processes pointing at the same path.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
	process,
	sync::atomic::{AtomicU64, Ordering},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenSecret, TokenUpdate, User},
	session::{
		SessionEvents, SessionFuture, SessionKey, SessionListener, SessionSnapshot, SessionStore,
		SessionSubscription, StoreError,
	},
};

static TMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Persists the session entries to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileSessionStore {
	path: PathBuf,
	inner: Arc<RwLock<SessionSnapshot>>,
	events: SessionEvents,
}
impl FileSessionStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)), events: SessionEvents::default() })
	}

	/// Returns the backing file path.
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Reloads the file and publishes a change for every entry another writer modified.
	///
	/// Returns the changed keys. A missing file reads as an empty session.
	pub fn sync_from_disk(&self) -> Result<Vec<SessionKey>, StoreError> {
		let loaded = Self::load_snapshot(&self.path)?;
		let changed = {
			let mut guard = self.inner.write();
			let changed = guard.changed_keys(&loaded);

			*guard = loaded.clone();

			changed
		};

		self.events.publish(&changed, &loaded);

		Ok(changed)
	}

	fn load_snapshot(path: &Path) -> Result<SessionSnapshot, StoreError> {
		if !path.exists() {
			return Ok(SessionSnapshot::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		if bytes.is_empty() {
			return Ok(SessionSnapshot::default());
		}

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create session directory {}: {e}", parent.display()),
			})?;
		}
		Ok(())
	}

	fn persist_locked(&self, contents: &SessionSnapshot) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized =
			serde_json::to_vec_pretty(contents).map_err(|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			})?;
		let tmp_path = tmp_path_for(&self.path);

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	/// Applies `mutate`, persists the result, then publishes the changed keys.
	///
	/// The in-memory state is only replaced once the file write succeeds.
	fn update(&self, mutate: impl FnOnce(&mut SessionSnapshot)) -> Result<(), StoreError> {
		let (changed, after) = {
			let mut guard = self.inner.write();
			let mut next = guard.clone();

			mutate(&mut next);

			let changed = guard.changed_keys(&next);

			if changed.is_empty() {
				return Ok(());
			}

			self.persist_locked(&next)?;
			*guard = next.clone();

			(changed, next)
		};

		self.events.publish(&changed, &after);

		Ok(())
	}
}
impl SessionStore for FileSessionStore {
	fn access_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let value = self.inner.read().access_token.clone();

			Ok(value)
		})
	}

	fn refresh_token(&self) -> SessionFuture<'_, Option<TokenSecret>> {
		Box::pin(async move {
			let value = self.inner.read().refresh_token.clone();

			Ok(value)
		})
	}

	fn store_tokens(&self, update: TokenUpdate) -> SessionFuture<'_, ()> {
		Box::pin(async move { self.update(|state| state.apply_tokens(update)) })
	}

	fn cached_profile(&self) -> SessionFuture<'_, Option<User>> {
		Box::pin(async move {
			let value = self.inner.read().user_profile.clone();

			Ok(value)
		})
	}

	fn cache_profile(&self, profile: User) -> SessionFuture<'_, ()> {
		Box::pin(async move { self.update(|state| state.user_profile = Some(profile)) })
	}

	fn clear_profile(&self) -> SessionFuture<'_, ()> {
		Box::pin(async move { self.update(|state| state.user_profile = None) })
	}

	fn clear(&self) -> SessionFuture<'_, ()> {
		Box::pin(async move { self.update(|state| *state = SessionSnapshot::default()) })
	}

	fn snapshot(&self) -> SessionFuture<'_, SessionSnapshot> {
		Box::pin(async move {
			let value = self.inner.read().clone();

			Ok(value)
		})
	}

	fn subscribe(&self, listener: SessionListener) -> SessionSubscription {
		self.events.subscribe(listener)
	}
}

/// Temporary sibling of `path`, unique per process and per write.
fn tmp_path_for(path: &Path) -> PathBuf {
	let name = path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default();
	let seq = TMP_SEQUENCE.fetch_add(1, Ordering::Relaxed);

	path.with_file_name(format!("{name}.{}.{seq}.tmp", process::id()))
}
