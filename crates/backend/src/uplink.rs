//! Per-remote-client accounting. One `Session` per downstream address,
//! created on first request and removed either by the reaper (idle) or by
//! a request carrying the close header.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// A snapshot of the request that opened a session -- method and target
/// only, not headers or body, since it is kept for the session's entire
/// lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSnapshot {
	pub method: String,
	pub uri: String,
}

pub struct Session {
	pub first_request: RequestSnapshot,
	pub last_request: Mutex<Instant>,
	pub requests: AtomicU64,
}

impl Session {
	fn new(first_request: RequestSnapshot) -> Self {
		Self {
			first_request,
			last_request: Mutex::new(Instant::now()),
			requests: AtomicU64::new(0),
		}
	}
}

#[derive(Default)]
pub struct Registry {
	sessions: Mutex<HashMap<String, std::sync::Arc<Session>>>,
}

impl Registry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Records one request from `remote`, creating its session (with
	/// `first_request` as its snapshot) if absent. Returns the session's
	/// request count after this request.
	pub fn record(&self, remote: &str, method: &str, uri: &str) -> u64 {
		let mut sessions = self.sessions.lock();
		let session = sessions
			.entry(remote.to_string())
			.or_insert_with(|| {
				std::sync::Arc::new(Session::new(RequestSnapshot {
					method: method.to_string(),
					uri: uri.to_string(),
				}))
			})
			.clone();
		drop(sessions);
		*session.last_request.lock() = Instant::now();
		session.requests.fetch_add(1, Ordering::Relaxed) + 1
	}

	pub fn close(&self, remote: &str) {
		self.sessions.lock().remove(remote);
	}

	/// Removes every session idle for at least `max_idle`. Returns how many
	/// were reaped.
	pub fn reap(&self, max_idle: Duration) -> usize {
		let now = Instant::now();
		let mut sessions = self.sessions.lock();
		let before = sessions.len();
		sessions.retain(|_, session| now.duration_since(*session.last_request.lock()) < max_idle);
		before - sessions.len()
	}

	/// `(active sessions, total requests across all of them)`.
	pub fn len_and_requests(&self) -> (usize, u64) {
		let sessions = self.sessions.lock();
		let total = sessions
			.values()
			.map(|s| s.requests.load(Ordering::Relaxed))
			.sum();
		(sessions.len(), total)
	}

	pub fn len(&self) -> usize {
		self.sessions.lock().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_creates_and_increments() {
		let reg = Registry::new();
		assert_eq!(reg.record("1.1.1.1:1", "GET", "/a"), 1);
		assert_eq!(reg.record("1.1.1.1:1", "GET", "/a"), 2);
		assert_eq!(reg.record("2.2.2.2:2", "POST", "/b"), 1);
		let (n, total) = reg.len_and_requests();
		assert_eq!(n, 2);
		assert_eq!(total, 3);
	}

	#[test]
	fn record_snapshots_only_the_first_request() {
		let reg = Registry::new();
		reg.record("1.1.1.1:1", "GET", "/first");
		reg.record("1.1.1.1:1", "POST", "/second");
		let sessions = reg.sessions.lock();
		let session = sessions.get("1.1.1.1:1").unwrap();
		assert_eq!(session.first_request.method, "GET");
		assert_eq!(session.first_request.uri, "/first");
	}

	#[test]
	fn close_removes_session() {
		let reg = Registry::new();
		reg.record("1.1.1.1:1", "GET", "/a");
		reg.close("1.1.1.1:1");
		assert!(reg.is_empty());
	}

	#[test]
	fn reap_removes_only_idle_sessions() {
		let reg = Registry::new();
		reg.record("1.1.1.1:1", "GET", "/a");
		assert_eq!(reg.reap(Duration::from_secs(60)), 0);
		std::thread::sleep(Duration::from_millis(20));
		assert_eq!(reg.reap(Duration::from_millis(5)), 1);
		assert!(reg.is_empty());
	}
}
