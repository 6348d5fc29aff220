use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProxyError {
	#[error("missing or empty {0} header")]
	MissingHeader(&'static str),
	#[error("invalid target url: {0}")]
	InvalidTarget(#[from] http::uri::InvalidUri),
	#[error("pool error: {0}")]
	Pool(#[from] h123_pool::PoolError),
	#[error("reading origin response body failed")]
	OriginBodyRead,
	#[error("building outbound request failed: {0}")]
	Http(#[from] http::Error),
}

impl ProxyError {
	/// The HTTP status this failure is surfaced as on the downstream
	/// response, per the header/proxy contract. A body-read failure after
	/// the origin already responded is distinguished (507) from a failure
	/// to dial or exchange with the origin at all (500).
	pub fn status(&self) -> http::StatusCode {
		match self {
			ProxyError::MissingHeader(_) => http::StatusCode::BAD_REQUEST,
			ProxyError::InvalidTarget(_) => http::StatusCode::BAD_GATEWAY,
			ProxyError::OriginBodyRead => http::StatusCode::INSUFFICIENT_STORAGE,
			ProxyError::Pool(h123_pool::PoolError::Transport(
				h123_transport::TransportError::Hyper(_)
				| h123_transport::TransportError::H3BodyRead(_),
			)) => http::StatusCode::INSUFFICIENT_STORAGE,
			ProxyError::Pool(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
			ProxyError::Http(_) => http::StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}
