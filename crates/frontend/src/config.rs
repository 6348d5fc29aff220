use h123_core::HumanDuration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrontendConfig {
	pub broker_url: String,
	pub backend_topic: Option<String>,
	#[serde(default = "default_reclaim_freq")]
	pub reclaim_freq: HumanDuration,
	/// Parsed but never bound: this process is discovery-only.
	pub listen: String,
	#[serde(default = "default_max_backends")]
	pub max_backends: usize,
}

fn default_reclaim_freq() -> HumanDuration {
	HumanDuration(std::time::Duration::from_secs(1))
}

fn default_max_backends() -> usize {
	64
}

impl Default for FrontendConfig {
	fn default() -> Self {
		Self {
			broker_url: "mqtt://127.0.0.1:1883".to_string(),
			backend_topic: None,
			reclaim_freq: default_reclaim_freq(),
			listen: "127.0.0.1:9445".to_string(),
			max_backends: default_max_backends(),
		}
	}
}

impl FrontendConfig {
	pub fn backend_topic(&self) -> String {
		self.backend_topic.clone().unwrap_or_else(|| "h123/backend/#".to_string())
	}
}
