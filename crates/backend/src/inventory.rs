//! Forwards pool `add` events to the connection-inventory topic. `delete`
//! is part of the pool's event contract but is never emitted (see
//! `DESIGN.md`), so this forwarder never publishes a removal.

use std::sync::Arc;

use h123_control::Broker;
use h123_pool::{EventCallback, PoolEvent};

pub fn callback(broker: Arc<Broker>, base_topic: String) -> EventCallback {
	Arc::new(move |event| {
		let PoolEvent::Add { key, connection } = event else {
			return;
		};
		let broker = broker.clone();
		let topic = format!("{base_topic}/{}", h123_wire::topic_safe_key(&key));
		let wire = connection.to_wire();
		tokio::spawn(async move {
			let payload = match serde_json::to_vec(&wire) {
				Ok(p) => p,
				Err(e) => {
					tracing::event!(target: "control", tracing::Level::ERROR, error = %e, "connection serialization failed");
					return;
				},
			};
			if let Err(e) = broker.publish(&topic, payload).await {
				tracing::event!(target: "control", tracing::Level::WARN, error = %e, topic = %topic, "connection publish failed");
			}
		});
	})
}
