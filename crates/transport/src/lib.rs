//! Protocol adapters: an HTTP/1.1-or-H2 client over TLS (used by the pool
//! before or instead of an H3 upgrade), and an HTTP/3 client/server pair
//! over QUIC (used for the client-facing proxy port and for front-end to
//! backend dialing).

pub mod h3_client;
pub mod h3_server;
pub mod http_client;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TransportError {
	#[error("io error: {0}")]
	Io(#[from] std::io::Error),
	#[error("hyper error: {0}")]
	Hyper(#[from] hyper::Error),
	#[error("hyper client error: {0}")]
	HyperClient(#[from] hyper_util::client::legacy::Error),
	#[error("quic connect error: {0}")]
	QuicConnect(#[from] quinn::ConnectError),
	#[error("quic connection error: {0}")]
	QuicConnection(#[from] quinn::ConnectionError),
	#[error("h3 error: {0}")]
	H3(#[from] h3::Error),
	#[error("h3 body read error: {0}")]
	H3BodyRead(h3::Error),
	#[error("http error: {0}")]
	Http(#[from] http::Error),
}
