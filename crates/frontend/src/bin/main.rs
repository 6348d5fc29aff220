use h123_frontend::{FrontendConfig, serve, tls};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	h123_core::logging::init();
	let path = std::env::args().nth(1).map(std::path::PathBuf::from);
	let cfg: FrontendConfig = h123_core::config::load(path.as_deref())?;
	let tls_config = tls::dev_client_config();
	let stop = CancellationToken::new();
	let stop_on_signal = stop.clone();
	tokio::spawn(async move {
		let _ = tokio::signal::ctrl_c().await;
		stop_on_signal.cancel();
	});
	serve::run(cfg, tls_config, stop).await
}
