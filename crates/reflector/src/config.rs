use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectorConfig {
	pub listen: String,
	/// Absent: a self-signed localhost cert is generated for local testing.
	pub cert_file: Option<PathBuf>,
	pub key_file: Option<PathBuf>,
}

impl Default for ReflectorConfig {
	fn default() -> Self {
		Self {
			listen: "127.0.0.1:9443".to_string(),
			cert_file: None,
			key_file: None,
		}
	}
}
