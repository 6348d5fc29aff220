//! Wires the broker subscription, the reclaim tick, and the dialer into
//! one running front-end. Discovery-only: nothing in this crate listens
//! on `FrontendConfig::listen`.

use std::sync::Arc;

use h123_control::Broker;
use h123_wire::ServerStatus;
use quinn::crypto::rustls::QuicClientConfig;
use rustls::ClientConfig;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::FrontendConfig;
use crate::store::Store;
use crate::{dialer, reclaim};

pub async fn run(cfg: FrontendConfig, tls: ClientConfig, stop: CancellationToken) -> anyhow::Result<()> {
	let (broker, mut incoming) = Broker::connect(&cfg.broker_url).await?;
	let broker = Arc::new(broker);
	broker.subscribe(&cfg.backend_topic()).await?;

	let store = Arc::new(Store::new());
	let (dial_tx, dial_rx) = mpsc::channel(cfg.max_backends.max(1));

	let mut endpoint = quinn::Endpoint::client("0.0.0.0:0".parse()?)?;
	let quic_client_config = QuicClientConfig::try_from(tls)?;
	endpoint.set_default_client_config(quinn::ClientConfig::new(Arc::new(quic_client_config)));

	let reclaim_task = tokio::spawn(reclaim::run(
		store.clone(),
		dial_tx.clone(),
		cfg.reclaim_freq.0,
		stop.clone(),
	));
	let dialer_task = tokio::spawn(dialer::run(dial_rx, endpoint.clone()));

	let ingest_store = store.clone();
	let stop_ingest = stop.clone();
	let ingest_task = tokio::spawn(async move {
		loop {
			tokio::select! {
				msg = incoming.recv() => {
					match msg {
						Some(msg) => ingest(&ingest_store, &msg.payload),
						None => break,
					}
				},
				_ = stop_ingest.cancelled() => break,
			}
		}
	});

	stop.cancelled().await;
	drop(dial_tx);
	let _ = reclaim_task.await;
	let _ = dialer_task.await;
	let _ = ingest_task.await;
	broker.disconnect().await;
	endpoint.close(0u32.into(), b"shutdown");
	Ok(())
}

fn ingest(store: &Store, payload: &[u8]) {
	match serde_json::from_slice::<ServerStatus>(payload) {
		Ok(status) => store.update(status),
		Err(e) => {
			tracing::event!(target: "control", tracing::Level::WARN, error = %e, "malformed ServerStatus, dropping");
		},
	}
}
