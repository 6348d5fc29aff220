use std::sync::Arc;
use std::time::Duration;

use h123_control::Broker;
use h123_wire::{ServerStatus, Status};
use tokio_util::sync::CancellationToken;

use crate::uplink::Registry;

/// Narrow publish seam between the cadence/sequencing logic below and the
/// broker connection, so the former is testable without a live broker.
#[async_trait::async_trait]
pub trait PublishSink: Send + Sync {
	async fn publish(&self, topic: &str, payload: Vec<u8>);
}

#[async_trait::async_trait]
impl PublishSink for Broker {
	async fn publish(&self, topic: &str, payload: Vec<u8>) {
		if let Err(e) = Broker::publish(self, topic, payload).await {
			tracing::event!(target: "control", tracing::Level::WARN, error = %e, "status publish failed");
		}
	}
}

/// Publishes a `ServerStatus` snapshot every `period`, with a monotonic
/// `loop` counter starting at 0, until `stop` fires -- then publishes one
/// final `offline` message before returning.
pub async fn run(
	sink: Arc<dyn PublishSink>,
	topic: String,
	mux_endpoint_url: String,
	uplink: Arc<Registry>,
	period: Duration,
	stop: CancellationToken,
) {
	let mut interval = tokio::time::interval(period);
	interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
	let mut seq: u64 = 0;

	loop {
		tokio::select! {
			_ = stop.cancelled() => break,
			_ = interval.tick() => {
				let (connections, requests) = uplink.len_and_requests();
				let status = ServerStatus {
					status: Status::Online,
					now: now_millis(),
					mux_endpoint_url: mux_endpoint_url.clone(),
					frontend_connections: connections as u64,
					requests,
					loop_: seq,
				};
				seq += 1;
				publish(&*sink, &topic, &status).await;
			}
		}
	}

	let status = ServerStatus {
		status: Status::Offline,
		now: now_millis(),
		mux_endpoint_url,
		frontend_connections: 0,
		requests: 0,
		loop_: seq,
	};
	publish(&*sink, &topic, &status).await;
}

async fn publish(sink: &dyn PublishSink, topic: &str, status: &ServerStatus) {
	match serde_json::to_vec(status) {
		Ok(payload) => sink.publish(topic, payload).await,
		Err(e) => {
			tracing::event!(target: "control", tracing::Level::ERROR, error = %e, "status serialization failed");
		},
	}
}

fn now_millis() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.map(|d| d.as_millis() as u64)
		.unwrap_or(0)
}

#[cfg(test)]
mod tests {
	use std::sync::Mutex;

	use super::*;

	#[derive(Default)]
	struct RecordingSink {
		messages: Mutex<Vec<ServerStatus>>,
	}

	#[async_trait::async_trait]
	impl PublishSink for RecordingSink {
		async fn publish(&self, _topic: &str, payload: Vec<u8>) {
			let status: ServerStatus = serde_json::from_slice(&payload).expect("valid status json");
			self.messages.lock().unwrap().push(status);
		}
	}

	/// Mirrors the original registration test's message-count assertion:
	/// over a window of `k * period`, observe `k` online ticks with a
	/// strictly increasing `loop`, then one final offline message on stop.
	#[tokio::test]
	async fn publishes_increasing_loop_then_offline_on_stop() {
		let sink = Arc::new(RecordingSink::default());
		let stop = CancellationToken::new();
		let stop2 = stop.clone();
		let task = tokio::spawn(run(
			sink.clone(),
			"status".to_string(),
			"https://mux.example".to_string(),
			Arc::new(Registry::new()),
			Duration::from_millis(20),
			stop2,
		));

		tokio::time::sleep(Duration::from_millis(110)).await;
		stop.cancel();
		task.await.unwrap();

		let messages = sink.messages.lock().unwrap();
		let (online, offline): (Vec<_>, Vec<_>) =
			messages.iter().partition(|s| s.status == Status::Online);

		assert!(online.len() >= 4, "expected at least 4 online ticks in 110ms at a 20ms period, got {}", online.len());
		for pair in online.windows(2) {
			assert!(pair[1].loop_ > pair[0].loop_, "loop must strictly increase");
		}
		assert_eq!(online.first().unwrap().loop_, 0);

		assert_eq!(offline.len(), 1, "exactly one offline message on stop");
		assert_eq!(offline[0].loop_, online.last().unwrap().loop_ + 1);
	}
}
