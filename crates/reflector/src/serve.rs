use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use h123_transport::h3_server;
use http_body_util::{BodyExt, Full};
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as AutoBuilder;
use quinn::crypto::rustls::QuicServerConfig;
use rustls::ServerConfig;
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

use crate::ReflectorConfig;
use crate::handler::{reflect, to_response};

pub struct ReflectorHandler;

#[async_trait::async_trait]
impl h3_server::Handler for ReflectorHandler {
	async fn handle(&self, req: http::Request<Bytes>, remote: SocketAddr) -> http::Response<Bytes> {
		to_response(reflect(remote, "HTTP/3.0", &req))
	}
}

/// Runs the H1/H2 listener and the H3 listener concurrently until either
/// task ends (normally, this only happens on shutdown).
pub async fn run(cfg: ReflectorConfig, tls: ServerConfig) -> anyhow::Result<()> {
	let addr: SocketAddr = cfg.listen.parse()?;
	let h12 = tokio::spawn(serve_h12(addr, tls.clone()));
	let h3 = tokio::spawn(serve_h3(addr, tls));
	tokio::select! {
		r = h12 => { r??; }
		r = h3 => { r??; }
	}
	Ok(())
}

/// Runs just the H1/H2 listener. Exposed for protocol-negotiation tests
/// that want to dial it directly without also standing up an H3 listener.
pub async fn serve_h12(addr: SocketAddr, tls: ServerConfig) -> anyhow::Result<()> {
	let acceptor = TlsAcceptor::from(Arc::new(tls));
	let listener = TcpListener::bind(addr).await?;
	tracing::event!(target: "reflector", tracing::Level::INFO, %addr, "listening (h1/h2)");

	loop {
		let (stream, remote) = listener.accept().await?;
		let acceptor = acceptor.clone();
		tokio::spawn(async move {
			let stream = match acceptor.accept(stream).await {
				Ok(s) => s,
				Err(e) => {
					tracing::event!(target: "reflector", tracing::Level::DEBUG, error = %e, "tls handshake failed");
					return;
				},
			};
			let service = service_fn(move |req: http::Request<hyper::body::Incoming>| async move {
				let (parts, body) = req.into_parts();
				let bytes = body
					.collect()
					.await
					.map(|c| c.to_bytes())
					.unwrap_or_default();
				let req = http::Request::from_parts(parts, bytes);
				let proto = format!("{:?}", req.version());
				let resp = to_response(reflect(remote, &proto, &req));
				let (parts, body) = resp.into_parts();
				Ok::<_, std::convert::Infallible>(http::Response::from_parts(parts, Full::new(body)))
			});
			if let Err(e) = AutoBuilder::new(TokioExecutor::new())
				.serve_connection(TokioIo::new(stream), service)
				.await
			{
				tracing::event!(target: "reflector", tracing::Level::DEBUG, error = %e, "connection error");
			}
		});
	}
}

async fn serve_h3(addr: SocketAddr, tls: ServerConfig) -> anyhow::Result<()> {
	let mut tls = tls;
	tls.alpn_protocols = vec![b"h3".to_vec()];
	let quic_server_config = QuicServerConfig::try_from(tls)?;
	let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));
	let endpoint = quinn::Endpoint::server(server_config, addr)?;
	h3_server::serve(endpoint, Arc::new(ReflectorHandler)).await;
	Ok(())
}
