//! Keyed, single-flight upstream-connection cache. The first caller for a
//! `(scheme, host)` pair inserts and probes it while holding its creating
//! gate; every other caller waits on that gate before touching the entry.

pub mod entry;
#[cfg(feature = "h3-upgrade-probe")]
mod upgrade;

use std::collections::HashMap;
use std::sync::Arc;

use h123_transport::http_client::HttpClient;
use parking_lot::RwLock;
use thiserror::Error;

pub use entry::Entry;

#[derive(Debug, Error)]
pub enum PoolError {
	#[error("unknown scheme {0:?}, expected http or https")]
	UnknownScheme(String),
	#[error("request scheme/host {actual} does not match connection {expected}")]
	Mismatch { expected: String, actual: String },
	#[error("transport error: {0}")]
	Transport(#[from] h123_transport::TransportError),
}

/// `add` fires exactly once per newly inserted key, after the entry is
/// already visible to other readers. `delete` is part of the contract but
/// nothing in this pool currently evicts entries, so it is never emitted.
#[derive(Clone)]
pub enum PoolEvent {
	Add { key: String, connection: Arc<Entry> },
	Delete { key: String, connection: Arc<Entry> },
}

pub type EventCallback = Arc<dyn Fn(PoolEvent) + Send + Sync>;

/// The narrow seam a request handler needs from a pool: resolve
/// `(scheme, host)` to a ready [`Entry`]. Kept as a trait so a handler's
/// tests can swap in a stand-in pool without depending on `Pool` itself.
#[async_trait::async_trait]
pub trait UpstreamPool: Send + Sync {
	async fn setup(&self, scheme: &str, host: &str) -> Result<Arc<Entry>, PoolError>;
}

pub struct Pool {
	map: RwLock<HashMap<String, Arc<Entry>>>,
	http_client: HttpClient,
	events: Option<EventCallback>,
	#[cfg(feature = "h3-upgrade-probe")]
	quic_endpoint: Option<quinn::Endpoint>,
}

impl Pool {
	pub fn new(events: Option<EventCallback>) -> Self {
		Self {
			map: RwLock::new(HashMap::new()),
			http_client: HttpClient::new(),
			events,
			#[cfg(feature = "h3-upgrade-probe")]
			quic_endpoint: None,
		}
	}

	#[cfg(feature = "h3-upgrade-probe")]
	pub fn with_quic_endpoint(mut self, endpoint: quinn::Endpoint) -> Self {
		self.quic_endpoint = Some(endpoint);
		self
	}

	pub fn len(&self) -> usize {
		self.map.read().len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Returns the `Entry` for `(scheme, host)`, creating and probing it on
	/// first use. Every caller -- creator or not -- only observes the entry
	/// after its creating gate is released.
	pub async fn setup(&self, scheme: &str, host: &str) -> Result<Arc<Entry>, PoolError> {
		if scheme != "http" && scheme != "https" {
			return Err(PoolError::UnknownScheme(scheme.to_string()));
		}
		let key = h123_wire::pool_key(scheme, host);

		if let Some(entry) = self.map.read().get(&key).cloned() {
			let _ready = entry.creating.read().await;
			return Ok(entry);
		}

		let (entry, inserted) = {
			let mut map = self.map.write();
			match map.get(&key) {
				Some(entry) => (entry.clone(), false),
				None => {
					let entry = Arc::new(Entry::new(scheme, host, self.http_client.clone()));
					map.insert(key.clone(), entry.clone());
					(entry, true)
				},
			}
		};

		if inserted {
			{
				let _creating = entry.creating.write().await;
				self.probe(&entry).await;
			}
			tracing::event!(target: "pool", tracing::Level::DEBUG, key = %key, "inserted");
			if let Some(cb) = self.events.clone() {
				let key = key.clone();
				let entry = entry.clone();
				tokio::spawn(async move {
					cb(PoolEvent::Add { key, connection: entry });
				});
			}
		} else {
			let _ready = entry.creating.read().await;
		}

		Ok(entry)
	}

	#[cfg(feature = "h3-upgrade-probe")]
	async fn probe(&self, entry: &Arc<Entry>) {
		if let Some(endpoint) = &self.quic_endpoint {
			upgrade::probe(entry, endpoint).await;
		}
	}

	#[cfg(not(feature = "h3-upgrade-probe"))]
	async fn probe(&self, _entry: &Arc<Entry>) {}
}

#[async_trait::async_trait]
impl UpstreamPool for Pool {
	async fn setup(&self, scheme: &str, host: &str) -> Result<Arc<Entry>, PoolError> {
		Pool::setup(self, scheme, host).await
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use super::*;

	#[tokio::test]
	async fn setup_rejects_unknown_scheme() {
		let pool = Pool::new(None);
		let err = pool.setup("ftp", "h:21").await.unwrap_err();
		assert!(matches!(err, PoolError::UnknownScheme(s) if s == "ftp"));
	}

	#[tokio::test]
	async fn setup_is_idempotent_per_key() {
		let pool = Pool::new(None);
		let a = pool.setup("http", "h:3000").await.unwrap();
		let b = pool.setup("http", "h:3000").await.unwrap();
		assert!(Arc::ptr_eq(&a, &b));
		assert_eq!(pool.len(), 1);
	}

	#[tokio::test]
	async fn distinct_scheme_host_pairs_get_distinct_entries() {
		let pool = Pool::new(None);
		for i in 0..100u16 {
			let host = format!("h:{}", 3000 + i);
			pool.setup("http", &host).await.unwrap();
			pool.setup("https", &host).await.unwrap();
		}
		assert_eq!(pool.len(), 200);
	}

	#[tokio::test]
	async fn add_event_fires_once_with_matching_key() {
		let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
		let seen2 = seen.clone();
		let cb: EventCallback = Arc::new(move |ev| {
			if let PoolEvent::Add { key, .. } = ev {
				seen2.lock().unwrap().push(key);
			}
		});
		let pool = Pool::new(Some(cb));
		pool.setup("http", "h:3000").await.unwrap();
		pool.setup("http", "h:3000").await.unwrap();
		// the event is dispatched on a detached task; give it a chance to run
		tokio::task::yield_now().await;
		tokio::time::sleep(std::time::Duration::from_millis(10)).await;
		let seen = seen.lock().unwrap();
		assert_eq!(seen.as_slice(), ["http://h:3000"]);
	}

	#[tokio::test]
	async fn upstream_pool_trait_object_dispatches_to_the_real_pool() {
		let pool: Arc<dyn UpstreamPool> = Arc::new(Pool::new(None));
		let entry = pool.setup("http", "h:3000").await.unwrap();
		assert_eq!(entry.key(), "http://h:3000");
	}

	#[tokio::test]
	async fn readers_observe_a_released_gate() {
		let pool = Pool::new(None);
		let entry = pool.setup("http", "h:3000").await.unwrap();
		// the gate is released; a further read-lock must not block
		let fut = entry.creating.read();
		tokio::time::timeout(std::time::Duration::from_millis(50), fut)
			.await
			.expect("creating gate should already be released");
	}
}
