use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use h123_transport::h3_client::H3Client;
use h123_transport::http_client::HttpClient;
use parking_lot::RwLock as SyncRwLock;
use tokio::sync::RwLock as AsyncRwLock;

use crate::PoolError;

#[derive(Clone)]
pub(crate) enum Transport {
	Http(HttpClient),
	H3(Arc<H3Client>),
}

pub(crate) struct MutableState {
	pub(crate) host: String,
	pub(crate) is_quic: bool,
	pub(crate) transport: Transport,
}

/// One pool entry: an upstream endpoint bound to a scheme, reachable
/// through `transport`. `host`/`transport`/`is_quic` may change exactly
/// once, during the creator's upgrade probe, while `creating` is held for
/// writing; after that they are read-only for the entry's lifetime.
pub struct Entry {
	pub(crate) scheme: String,
	pub(crate) state: SyncRwLock<MutableState>,
	pub(crate) creating: AsyncRwLock<()>,
	pub(crate) request_count: AtomicU64,
}

impl Entry {
	pub(crate) fn new(scheme: &str, host: &str, transport: HttpClient) -> Self {
		Self {
			scheme: scheme.to_string(),
			state: SyncRwLock::new(MutableState {
				host: host.to_string(),
				is_quic: false,
				transport: Transport::Http(transport),
			}),
			creating: AsyncRwLock::new(()),
			request_count: AtomicU64::new(0),
		}
	}

	pub fn scheme(&self) -> &str {
		&self.scheme
	}

	pub fn host(&self) -> String {
		self.state.read().host.clone()
	}

	pub fn is_quic(&self) -> bool {
		self.state.read().is_quic
	}

	pub fn request_count(&self) -> u64 {
		self.request_count.load(Ordering::Relaxed)
	}

	pub fn key(&self) -> String {
		h123_wire::pool_key(&self.scheme, &self.host())
	}

	pub fn to_wire(&self) -> h123_wire::Connection {
		let state = self.state.read();
		h123_wire::Connection {
			scheme: self.scheme.clone(),
			host: state.host.clone(),
			is_quic: state.is_quic,
			request_count: self.request_count(),
		}
	}

	/// Forwards `req` on this entry's bound transport. Rejects the request
	/// if its scheme/host no longer match the entry (the caller looked up
	/// the wrong key).
	pub async fn do_request(
		&self,
		req: http::Request<Bytes>,
	) -> Result<http::Response<Bytes>, PoolError> {
		let req_scheme = req.uri().scheme_str().unwrap_or_default().to_string();
		let req_host = req
			.uri()
			.authority()
			.map(|a| a.as_str().to_string())
			.unwrap_or_default();

		let transport = {
			let state = self.state.read();
			if req_scheme != self.scheme || req_host != state.host {
				return Err(PoolError::Mismatch {
					expected: format!("{}://{}", self.scheme, state.host),
					actual: format!("{req_scheme}://{req_host}"),
				});
			}
			state.transport.clone()
		};

		self.request_count.fetch_add(1, Ordering::Relaxed);
		let resp = match transport {
			Transport::Http(c) => c.send(req).await?,
			Transport::H3(c) => c.send(req).await?,
		};
		Ok(resp)
	}
}
