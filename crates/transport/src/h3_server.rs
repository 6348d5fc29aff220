//! HTTP/3 accept loop: one task per QUIC connection, one task per request
//! within it, full stream multiplexing with no head-of-line blocking.

use std::net::SocketAddr;
use std::sync::Arc;

use bytes::{Buf, Bytes, BytesMut};

/// Invoked once per request with the request (body collected), the
/// client's remote address, and returns the full response to send back.
#[async_trait::async_trait]
pub trait Handler: Send + Sync + 'static {
	async fn handle(&self, req: http::Request<Bytes>, remote: SocketAddr) -> http::Response<Bytes>;
}

/// Serves `handler` over `endpoint` until the endpoint is closed.
pub async fn serve<H: Handler>(endpoint: quinn::Endpoint, handler: Arc<H>) {
	tracing::event!(target: "h3 server", tracing::Level::INFO, "listening");
	while let Some(incoming) = endpoint.accept().await {
		let handler = handler.clone();
		tokio::spawn(async move {
			let remote = incoming.remote_address();
			match incoming.await {
				Ok(conn) => {
					handle_connection(conn, handler, remote).await;
				},
				Err(e) => {
					tracing::event!(
						target: "h3 server",
						tracing::Level::DEBUG,
						remote = %remote,
						error = %e,
						"quic handshake failed"
					);
				},
			}
		});
	}
}

async fn handle_connection<H: Handler>(conn: quinn::Connection, handler: Arc<H>, remote: SocketAddr) {
	let h3_conn = h3_quinn::Connection::new(conn);
	let mut server_conn = match h3::server::Connection::new(h3_conn).await {
		Ok(c) => c,
		Err(e) => {
			tracing::event!(target: "h3 server", tracing::Level::DEBUG, error = %e, "setup failed");
			return;
		},
	};

	loop {
		match server_conn.accept().await {
			Ok(Some(resolver)) => {
				let handler = handler.clone();
				tokio::spawn(async move {
					if let Err(e) = handle_request(resolver, handler, remote).await {
						tracing::event!(target: "h3 server", tracing::Level::DEBUG, error = %e, "request failed");
					}
				});
			},
			Ok(None) => break,
			Err(e) => {
				tracing::event!(target: "h3 server", tracing::Level::DEBUG, error = %e, "accept error");
				break;
			},
		}
	}
}

async fn handle_request<H: Handler>(
	resolver: h3::server::RequestResolver<h3_quinn::Connection, Bytes>,
	handler: Arc<H>,
	remote: SocketAddr,
) -> Result<(), crate::TransportError> {
	let (req, mut stream) = resolver.resolve_request().await?;

	let mut body = BytesMut::new();
	while let Some(mut chunk) = stream.recv_data().await? {
		body.extend_from_slice(&chunk.copy_to_bytes(chunk.remaining()));
	}
	let (parts, _) = req.into_parts();
	let req = http::Request::from_parts(parts, body.freeze());

	let resp = handler.handle(req, remote).await;
	let (parts, body) = resp.into_parts();
	stream.send_response(http::Response::from_parts(parts, ())).await?;
	if !body.is_empty() {
		stream.send_data(body).await?;
	}
	stream.finish().await?;
	Ok(())
}
