//! HTTP/1.1-or-H2 client over TLS, shared across pool entries. ALPN
//! negotiation (and therefore the h1-vs-h2 choice) is delegated to
//! `hyper-rustls`; this wrapper only adds the request/response shape the
//! rest of the workspace expects (`Bytes` in, `Bytes` out).

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper_rustls::HttpsConnectorBuilder;
use hyper_util::client::legacy::Client as LegacyClient;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::rt::TokioExecutor;

use crate::TransportError;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

/// A pooled HTTP/1.1-or-H2 client bound to no particular host; hyper's
/// own internal connection cache keys by authority.
#[derive(Clone)]
pub struct HttpClient {
	inner: LegacyClient<Connector, Full<Bytes>>,
}

impl HttpClient {
	pub fn new() -> Self {
		let connector = HttpsConnectorBuilder::new()
			.with_native_roots()
			.expect("native roots available")
			.https_or_http()
			.enable_http1()
			.enable_http2()
			.build();
		let inner = LegacyClient::builder(TokioExecutor::new()).build(connector);
		Self { inner }
	}

	pub async fn send(
		&self,
		req: http::Request<Bytes>,
	) -> Result<http::Response<Bytes>, TransportError> {
		let (parts, body) = req.into_parts();
		let req = http::Request::from_parts(parts, Full::new(body));
		let resp = self.inner.request(req).await?;
		let (parts, body) = resp.into_parts();
		let collected = body.collect().await?.to_bytes();
		Ok(http::Response::from_parts(parts, collected))
	}
}

impl Default for HttpClient {
	fn default() -> Self {
		Self::new()
	}
}
