//! Two maps under one lock: `updated` is the staging buffer fed by
//! incoming [`ServerStatus`] messages, `active` is the live set a reclaim
//! tick drains it into. Split the way a workload/service store splits
//! "what arrived" from "what's live", so a slow or reordered update never
//! corrupts the set a reader sees.

use std::collections::HashMap;
use std::sync::Arc;

use h123_transport::h3_client::H3Client;
use h123_wire::ServerStatus;
use parking_lot::{Mutex, RwLock};

/// One discovered backend: its latest known status plus, once dialed, an
/// attached HTTP/3 client.
pub struct BackendState {
	status: RwLock<ServerStatus>,
	client: RwLock<Option<Arc<H3Client>>>,
}

impl BackendState {
	fn new(status: ServerStatus) -> Self {
		Self { status: RwLock::new(status), client: RwLock::new(None) }
	}

	pub fn status(&self) -> ServerStatus {
		self.status.read().clone()
	}

	pub fn mux_endpoint_url(&self) -> String {
		self.status.read().mux_endpoint_url.clone()
	}

	pub fn client(&self) -> Option<Arc<H3Client>> {
		self.client.read().clone()
	}

	pub fn attach_client(&self, client: Arc<H3Client>) {
		*self.client.write() = Some(client);
	}
}

#[derive(Default)]
struct Inner {
	updated: HashMap<String, ServerStatus>,
	active: HashMap<String, Arc<BackendState>>,
}

#[derive(Default)]
pub struct Store {
	inner: Mutex<Inner>,
}

impl Store {
	pub fn new() -> Self {
		Self::default()
	}

	/// Stages a freshly received status for the next reclaim tick,
	/// overwriting any status staged for the same key since the last drain.
	pub fn update(&self, status: ServerStatus) {
		self.inner.lock().updated.insert(status.mux_endpoint_url.clone(), status);
	}

	/// Drains the staging buffer. For each drained status: inserts a new
	/// `BackendState` if the key is not already active (returned for
	/// dialing), otherwise refreshes the existing one's status in place.
	pub fn drain_into_active(&self) -> Vec<Arc<BackendState>> {
		let mut inner = self.inner.lock();
		let drained: Vec<ServerStatus> = inner.updated.drain().map(|(_, v)| v).collect();
		let mut newly_active = Vec::new();
		for status in drained {
			match inner.active.get(&status.mux_endpoint_url) {
				Some(existing) => *existing.status.write() = status,
				None => {
					let key = status.mux_endpoint_url.clone();
					let state = Arc::new(BackendState::new(status));
					inner.active.insert(key, state.clone());
					newly_active.push(state);
				},
			}
		}
		newly_active
	}

	/// Removes and returns every active entry whose last status reports it
	/// offline or whose `now` is older than `max_age`.
	pub fn evict_stale(&self, now_millis: u64, max_age_millis: u64) -> usize {
		let mut inner = self.inner.lock();
		let before = inner.active.len();
		inner.active.retain(|_, state| {
			let status = state.status.read();
			status.status == h123_wire::Status::Online
				&& now_millis.saturating_sub(status.now) <= max_age_millis
		});
		before - inner.active.len()
	}

	pub fn active_len(&self) -> usize {
		self.inner.lock().active.len()
	}

	pub fn get_active(&self, key: &str) -> Option<Arc<BackendState>> {
		self.inner.lock().active.get(key).cloned()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn status(url: &str, now: u64) -> ServerStatus {
		ServerStatus {
			status: h123_wire::Status::Online,
			now,
			mux_endpoint_url: url.to_string(),
			frontend_connections: 0,
			requests: 0,
			loop_: 0,
		}
	}

	#[test]
	fn drain_promotes_first_sighting_and_refreshes_later_ones() {
		let store = Store::new();
		store.update(status("https://a", 1));
		let fresh = store.drain_into_active();
		assert_eq!(fresh.len(), 1);
		assert_eq!(store.active_len(), 1);

		store.update(status("https://a", 2));
		let fresh = store.drain_into_active();
		assert!(fresh.is_empty(), "re-sighting an active key must not re-enqueue for dial");
		assert_eq!(store.get_active("https://a").unwrap().status().now, 2);
	}

	#[test]
	fn evict_stale_removes_offline_and_aged_entries() {
		let store = Store::new();
		store.update(status("https://a", 100));
		store.update(status("https://b", 100));
		store.drain_into_active();
		store.get_active("https://b").unwrap().status.write().status = h123_wire::Status::Offline;

		let removed = store.evict_stale(100, 50);
		assert_eq!(removed, 1, "only the offline one should go when nothing has aged out yet");
		assert_eq!(store.active_len(), 1);

		let removed = store.evict_stale(300, 50);
		assert_eq!(removed, 1, "the remaining entry ages out once now - state.now exceeds max_age");
		assert_eq!(store.active_len(), 0);
	}
}
