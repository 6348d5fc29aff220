//! Thin adapter over the pub/sub control plane. Backends publish
//! [`h123_wire::ServerStatus`] and connection inventory; front-ends
//! subscribe to discover backends. Reconnection is handled entirely by
//! the underlying MQTT event loop task and is invisible to callers.

use std::time::Duration;

use rumqttc::{AsyncClient, Event, Incoming, MqttOptions, QoS};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;
use uuid::Uuid;

const KEEP_ALIVE: Duration = Duration::from_secs(2);
const DEFAULT_PORT: u16 = 1883;
const INCOMING_CAPACITY: usize = 256;

#[derive(Debug, Error)]
pub enum ControlError {
	#[error("invalid broker url: {0}")]
	Url(#[from] url::ParseError),
	#[error("broker url has no host")]
	MissingHost,
	#[error("mqtt client error: {0}")]
	Client(#[from] rumqttc::ClientError),
}

/// One message delivered on a subscribed topic.
#[derive(Debug, Clone)]
pub struct Message {
	pub topic: String,
	pub payload: Vec<u8>,
}

/// A connected broker session: a publish/subscribe handle plus the
/// background task driving the MQTT event loop.
pub struct Broker {
	client: AsyncClient,
	poll_task: JoinHandle<()>,
}

impl Broker {
	/// Connects to `broker_url` (e.g. `mqtt://localhost:1883/ignored`).
	/// Returns the broker handle and a receiver of every message delivered
	/// on topics this handle later subscribes to.
	pub async fn connect(broker_url: &str) -> Result<(Self, mpsc::Receiver<Message>), ControlError> {
		let endpoint = normalize(broker_url)?;
		let host = endpoint.host_str().ok_or(ControlError::MissingHost)?.to_owned();
		let port = endpoint.port().unwrap_or(DEFAULT_PORT);

		let client_id = format!("h123-{}", Uuid::new_v4());
		let mut opts = MqttOptions::new(client_id, host, port);
		opts.set_keep_alive(KEEP_ALIVE);

		let (client, mut event_loop) = AsyncClient::new(opts, INCOMING_CAPACITY);
		let (tx, rx) = mpsc::channel(INCOMING_CAPACITY);

		let poll_task = tokio::spawn(async move {
			loop {
				match event_loop.poll().await {
					Ok(Event::Incoming(Incoming::Publish(publish))) => {
						let msg = Message {
							topic: publish.topic,
							payload: publish.payload.to_vec(),
						};
						if tx.send(msg).await.is_err() {
							break;
						}
					},
					Ok(_) => {},
					Err(e) => {
						tracing::event!(
							target: "control",
							tracing::Level::WARN,
							error = %e,
							"mqtt event loop error"
						);
						break;
					},
				}
			}
		});

		Ok((Self { client, poll_task }, rx))
	}

	pub async fn subscribe(&self, filter: &str) -> Result<(), ControlError> {
		tracing::event!(target: "control", tracing::Level::DEBUG, filter, "subscribe");
		self.client.subscribe(filter, QoS::AtLeastOnce).await?;
		Ok(())
	}

	pub async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), ControlError> {
		self.client.publish(topic, QoS::AtLeastOnce, false, payload).await?;
		Ok(())
	}

	pub async fn disconnect(&self) {
		let _ = self.client.disconnect().await;
	}
}

impl Drop for Broker {
	fn drop(&mut self) {
		self.poll_task.abort();
	}
}

/// Rewrites `mqtt://` to `tcp://` and resets the path to `/`, matching the
/// original adapter's URL handling.
fn normalize(broker_url: &str) -> Result<Url, ControlError> {
	let url = Url::parse(broker_url)?;
	let mut url = if url.scheme() == "mqtt" {
		let rest = broker_url.splitn(2, "://").nth(1).unwrap_or("");
		Url::parse(&format!("tcp://{rest}"))?
	} else {
		url
	};
	url.set_path("/");
	Ok(url)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn mqtt_scheme_rewritten_to_tcp() {
		let url = normalize("mqtt://broker.local:1883/some/path").unwrap();
		assert_eq!(url.scheme(), "tcp");
		assert_eq!(url.host_str(), Some("broker.local"));
		assert_eq!(url.port(), Some(1883));
		assert_eq!(url.path(), "/");
	}

	#[test]
	fn non_mqtt_scheme_passed_through() {
		let url = normalize("tcp://broker.local:1883/x").unwrap();
		assert_eq!(url.scheme(), "tcp");
		assert_eq!(url.path(), "/");
	}
}
