//! Consumes the reclaim task's dial channel and attaches an HTTP/3 client
//! to each newly discovered backend. Dropping the sender (on shutdown)
//! ends this task's receive loop, standing in for an explicit sentinel.

use std::sync::Arc;

use bytes::Bytes;
use h123_transport::h3_client::H3Client;
use h123_wire::ReflectorResponse;
use tokio::sync::mpsc;

use crate::store::BackendState;

pub async fn run(mut dial_rx: mpsc::Receiver<Arc<BackendState>>, endpoint: quinn::Endpoint) {
	while let Some(state) = dial_rx.recv().await {
		dial_one(&state, &endpoint).await;
	}
}

async fn dial_one(state: &BackendState, endpoint: &quinn::Endpoint) {
	let mux_endpoint_url = state.mux_endpoint_url();
	if let Err(e) = try_dial(state, endpoint).await {
		tracing::event!(
			target: "dialer",
			tracing::Level::WARN,
			mux_endpoint_url = %mux_endpoint_url,
			error = %e,
			"dial failed"
		);
	}
}

#[derive(Debug, thiserror::Error)]
enum DialError {
	#[error("invalid mux endpoint url: {0}")]
	Url(#[from] url::ParseError),
	#[error("mux endpoint url has no host")]
	MissingHost,
	#[error("could not resolve mux endpoint host")]
	UnresolvedHost,
	#[error("transport error: {0}")]
	Transport(#[from] h123_transport::TransportError),
	#[error("request build error: {0}")]
	Http(#[from] http::Error),
	#[error("malformed reflector response: {0}")]
	Json(#[from] serde_json::Error),
	#[error("backend echoed a different mux endpoint url ({0})")]
	MuxMismatch(String),
}

async fn try_dial(state: &BackendState, endpoint: &quinn::Endpoint) -> Result<(), DialError> {
	let mux_endpoint_url = state.mux_endpoint_url();
	let url = url::Url::parse(&mux_endpoint_url)?;
	let host = url.host_str().ok_or(DialError::MissingHost)?.to_string();
	let port = url.port_or_known_default().unwrap_or(443);

	let addr = tokio::net::lookup_host((host.as_str(), port))
		.await
		.map_err(|_| DialError::UnresolvedHost)?
		.next()
		.ok_or(DialError::UnresolvedHost)?;

	// The dial itself only succeeds over an h3/QUIC handshake, so reaching
	// this point already establishes the HTTP/3 requirement; there is no
	// separate response-version field to inspect here.
	let client = H3Client::dial(endpoint, addr, &host).await?;
	let req = http::Request::get(mux_endpoint_url.as_str()).body(Bytes::new())?;
	let resp = client.send(req).await?;

	let envelope: ReflectorResponse = serde_json::from_slice(resp.body())?;
	if envelope.mux_endpoint_url != mux_endpoint_url {
		return Err(DialError::MuxMismatch(envelope.mux_endpoint_url));
	}

	state.attach_client(Arc::new(client));
	Ok(())
}
