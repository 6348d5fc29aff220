use std::collections::HashMap;
use std::net::SocketAddr;

use bytes::Bytes;
use h123_wire::ReflectorResponse;

/// Builds the echo envelope for one request. Shared by the H1/H2 and H3
/// serving paths so the two protocols reflect identically.
pub fn reflect(
	remote: SocketAddr,
	protocol: &str,
	req: &http::Request<Bytes>,
) -> ReflectorResponse {
	let mut header: HashMap<String, Vec<String>> = HashMap::new();
	for (name, value) in req.headers() {
		header
			.entry(name.as_str().to_string())
			.or_default()
			.push(value.to_str().unwrap_or_default().to_string());
	}

	let body = req.body();
	let body = if body.is_empty() {
		None
	} else {
		Some(String::from_utf8_lossy(body).into_owned())
	};

	ReflectorResponse {
		remote_addr: remote.to_string(),
		protocol: protocol.to_string(),
		url: req
			.uri()
			.path_and_query()
			.map(|pq| pq.to_string())
			.unwrap_or_else(|| req.uri().to_string()),
		mux_endpoint_url: String::new(),
		header,
		body,
		method: req.method().to_string(),
		error: None,
	}
}

pub fn to_response(body: ReflectorResponse) -> http::Response<Bytes> {
	let json = serde_json::to_vec(&body).expect("ReflectorResponse always serializes");
	http::Response::builder()
		.status(200)
		.header(http::header::CONTENT_TYPE, "application/json")
		.body(Bytes::from(json))
		.expect("static response is well-formed")
}
