//! HTTP/3 client: dials a single QUIC connection, drives the h3 connection
//! on a background task, and exposes a simple request/response call.

use std::net::SocketAddr;

use bytes::{Buf, Bytes, BytesMut};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::TransportError;

pub struct H3Client {
	send_request: Mutex<h3::client::SendRequest<h3_quinn::OpenStreams, Bytes>>,
	drive_task: JoinHandle<()>,
}

impl H3Client {
	pub async fn dial(
		endpoint: &quinn::Endpoint,
		addr: SocketAddr,
		server_name: &str,
	) -> Result<Self, TransportError> {
		let conn = endpoint.connect(addr, server_name)?.await?;
		let h3_conn = h3_quinn::Connection::new(conn);
		let (mut driver, send_request) = h3::client::new(h3_conn).await?;
		let drive_task = tokio::spawn(async move {
			if let Err(e) = futures_util::future::poll_fn(|cx| driver.poll_close(cx)).await {
				tracing::event!(target: "h3 client", tracing::Level::DEBUG, error = %e, "connection closed");
			}
		});
		Ok(Self { send_request: Mutex::new(send_request), drive_task })
	}

	pub async fn send(
		&self,
		req: http::Request<Bytes>,
	) -> Result<http::Response<Bytes>, TransportError> {
		let (parts, body) = req.into_parts();
		let req = http::Request::from_parts(parts, ());

		let mut send_request = self.send_request.lock().await;
		let mut stream = send_request.send_request(req).await?;
		drop(send_request);

		if !body.is_empty() {
			stream.send_data(body).await?;
		}
		stream.finish().await?;

		let resp = stream.recv_response().await?;
		let mut buf = BytesMut::new();
		while let Some(mut chunk) =
			stream.recv_data().await.map_err(TransportError::H3BodyRead)?
		{
			buf.extend_from_slice(&chunk.copy_to_bytes(chunk.remaining()));
		}
		Ok(resp.map(|_| buf.freeze()))
	}
}

impl Drop for H3Client {
	fn drop(&mut self) {
		self.drive_task.abort();
	}
}
