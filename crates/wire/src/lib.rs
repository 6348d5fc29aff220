//! Shared wire shapes published on the control plane and returned by the
//! reflector/backend over HTTP. Field names mirror the original Go model
//! types but use the idiomatic JSON casing the rest of this workspace
//! expects (`camelCase`, matching `crates/agentgateway/src/control`'s
//! serde conventions in the teacher repo).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Liveness state a backend advertises for itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
	Online,
	Offline,
}

/// Snapshot a backend publishes once per refresh tick (and once more, as
/// `Offline`, on shutdown).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerStatus {
	pub status: Status,
	/// Milliseconds since the Unix epoch; avoids pulling in a datetime crate
	/// for a single timestamp field.
	pub now: u64,
	pub mux_endpoint_url: String,
	pub frontend_connections: u64,
	pub requests: u64,
	/// Monotonically increasing per-process sequence number, starting at 0.
	#[serde(rename = "loop")]
	pub loop_: u64,
}

/// Diagnostic envelope: reflects a request verbatim, or carries an error
/// when the backend could not proxy it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectorResponse {
	pub remote_addr: String,
	pub protocol: String,
	pub url: String,
	pub mux_endpoint_url: String,
	#[serde(default)]
	pub header: HashMap<String, Vec<String>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub body: Option<String>,
	pub method: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

impl ReflectorResponse {
	pub fn error(mux_endpoint_url: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			mux_endpoint_url: mux_endpoint_url.into(),
			error: Some(message.into()),
			..Default::default()
		}
	}
}

/// Serialized form of a pool entry, published on connection-inventory
/// topics. The live transport handle and the creating gate are not part
/// of the wire shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
	pub scheme: String,
	pub host: String,
	pub is_quic: bool,
	pub request_count: u64,
}

/// Builds the `scheme://host` pool key string used both as the map key and
/// as the base of a connection-inventory topic.
pub fn pool_key(scheme: &str, host: &str) -> String {
	format!("{scheme}://{host}")
}

/// Rewrites a pool key into a topic-safe segment: colons and the
/// scheme-separator slashes are stripped, e.g. `http://h:3000` becomes
/// `http_h_3000`.
pub fn topic_safe_key(key: &str) -> String {
	key.replace("://", "_").replace(':', "_")
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn topic_safe_key_strips_scheme_separator_and_colons() {
		assert_eq!(topic_safe_key("http://h:3000"), "http_h_3000");
		assert_eq!(topic_safe_key("https://example.com:443"), "https_example.com_443");
	}

	#[test]
	fn status_round_trips_lowercase() {
		let s = ServerStatus {
			status: Status::Online,
			now: 42,
			mux_endpoint_url: "https://mux.example".into(),
			frontend_connections: 3,
			requests: 9,
			loop_: 7,
		};
		let json = serde_json::to_value(&s).unwrap();
		assert_eq!(json["status"], "online");
		assert_eq!(json["loop"], 7);
		let back: ServerStatus = serde_json::from_value(json).unwrap();
		assert_eq!(back, s);
	}

	#[test]
	fn reflector_response_omits_absent_body_and_error() {
		let r = ReflectorResponse {
			remote_addr: "127.0.0.1:1".into(),
			protocol: "HTTP/3.0".into(),
			url: "/x".into(),
			mux_endpoint_url: "https://mux".into(),
			method: "GET".into(),
			..Default::default()
		};
		let json = serde_json::to_value(&r).unwrap();
		assert!(json.get("body").is_none());
		assert!(json.get("error").is_none());
	}
}
