//! Structured logging setup shared by every binary in the workspace.

use tracing_subscriber::EnvFilter;

/// Installs a `tracing` subscriber reading verbosity from `RUST_LOG`,
/// defaulting to `info`.
pub fn init() {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
	let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
