use std::path::PathBuf;

use h123_core::HumanDuration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
	pub broker_url: String,
	pub status_topic: Option<String>,
	pub base_connection_topic: Option<String>,
	#[serde(default = "default_refresh_freq")]
	pub refresh_freq: HumanDuration,
	pub mux_endpoint_url: String,
	pub listen: String,
	pub cert_file: Option<PathBuf>,
	pub key_file: Option<PathBuf>,
	#[serde(default = "default_close_after_inactive")]
	pub close_after_inactive: HumanDuration,
}

fn default_refresh_freq() -> HumanDuration {
	HumanDuration(std::time::Duration::from_secs(1))
}

fn default_close_after_inactive() -> HumanDuration {
	HumanDuration(std::time::Duration::from_secs(60))
}

impl Default for BackendConfig {
	fn default() -> Self {
		Self {
			broker_url: "mqtt://127.0.0.1:1883".to_string(),
			status_topic: None,
			base_connection_topic: None,
			refresh_freq: default_refresh_freq(),
			mux_endpoint_url: "https://127.0.0.1:9444".to_string(),
			listen: "127.0.0.1:9444".to_string(),
			cert_file: None,
			key_file: None,
			close_after_inactive: default_close_after_inactive(),
		}
	}
}

impl BackendConfig {
	/// Default status topic: `h123/backend/<listen-with-colons-replaced>/status`.
	pub fn status_topic(&self) -> String {
		self.status_topic.clone().unwrap_or_else(|| {
			format!("h123/backend/{}/status", h123_wire::topic_safe_key(&self.listen))
		})
	}

	/// Default connection-inventory base topic: sibling of the status topic.
	pub fn base_connection_topic(&self) -> String {
		self.base_connection_topic.clone().unwrap_or_else(|| {
			let status = self.status_topic();
			match status.rsplit_once('/') {
				Some((dir, _)) => format!("{dir}/connections"),
				None => "connections".to_string(),
			}
		})
	}
}
