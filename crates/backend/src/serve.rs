use std::net::SocketAddr;
use std::sync::Arc;

use bytes::Bytes;
use h123_control::Broker;
use h123_transport::h3_server;
use rustls::ServerConfig;
use tokio_util::sync::CancellationToken;

use crate::config::BackendConfig;
use crate::proxy;
use crate::uplink::Registry;
use crate::{inventory, publisher, reaper};

struct BackendHandler {
	ctx: proxy::Context,
}

#[async_trait::async_trait]
impl h3_server::Handler for BackendHandler {
	async fn handle(&self, req: http::Request<Bytes>, remote: SocketAddr) -> http::Response<Bytes> {
		proxy::handle(&self.ctx, req, remote).await
	}
}

/// Wires and runs everything a backend process owns: the H3 proxy
/// listener, the idle reaper, the status publisher, and the pool's
/// connection-inventory forwarder. Runs until `stop` is cancelled.
pub async fn run(cfg: BackendConfig, tls: ServerConfig, stop: CancellationToken) -> anyhow::Result<()> {
	let (broker, _incoming) = Broker::connect(&cfg.broker_url).await?;
	let broker = Arc::new(broker);

	let uplink = Arc::new(Registry::new());
	let event_cb = inventory::callback(broker.clone(), cfg.base_connection_topic());
	let pool: Arc<dyn h123_pool::UpstreamPool> = Arc::new(h123_pool::Pool::new(Some(event_cb)));

	let handler = Arc::new(BackendHandler {
		ctx: proxy::Context {
			uplink: uplink.clone(),
			pool: pool.clone(),
			mux_endpoint_url: cfg.mux_endpoint_url.clone(),
		},
	});

	let reaper_task = tokio::spawn(reaper::run(
		uplink.clone(),
		cfg.close_after_inactive.0,
		cfg.close_after_inactive.0,
		stop.clone(),
	));
	let publisher_task = tokio::spawn(publisher::run(
		broker.clone(),
		cfg.status_topic(),
		cfg.mux_endpoint_url.clone(),
		uplink.clone(),
		cfg.refresh_freq.0,
		stop.clone(),
	));

	let addr: SocketAddr = cfg.listen.parse()?;
	let mut tls = tls;
	tls.alpn_protocols = vec![b"h3".to_vec()];
	let quic_server_config = quinn::crypto::rustls::QuicServerConfig::try_from(tls)?;
	let server_config = quinn::ServerConfig::with_crypto(Arc::new(quic_server_config));
	let endpoint = quinn::Endpoint::server(server_config, addr)?;

	tokio::select! {
		_ = h3_server::serve(endpoint, handler) => {}
		_ = stop.cancelled() => {}
	}

	broker.disconnect().await;
	reaper_task.abort();
	publisher_task.abort();
	Ok(())
}
