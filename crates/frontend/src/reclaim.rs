//! Drains freshly received statuses into the active set and evicts
//! anything that has gone offline or stale, once per `reclaimFreq` tick.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::store::{BackendState, Store};

fn now_millis() -> u64 {
	std::time::SystemTime::now()
		.duration_since(std::time::UNIX_EPOCH)
		.unwrap_or_default()
		.as_millis() as u64
}

pub async fn run(
	store: Arc<Store>,
	dial_tx: mpsc::Sender<Arc<BackendState>>,
	reclaim_freq: Duration,
	stop: CancellationToken,
) {
	let mut interval = tokio::time::interval(reclaim_freq);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		tokio::select! {
			_ = interval.tick() => {},
			_ = stop.cancelled() => break,
		}

		for fresh in store.drain_into_active() {
			if dial_tx.try_send(fresh).is_err() {
				tracing::event!(
					target: "reclaim",
					tracing::Level::WARN,
					"dial channel full, dropping a newly discovered backend"
				);
			}
		}

		let removed = store.evict_stale(now_millis(), reclaim_freq.as_millis() as u64 * 2);
		if removed > 0 {
			tracing::event!(target: "reclaim", tracing::Level::DEBUG, removed, "evicted stale backends");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use h123_wire::{ServerStatus, Status};

	#[tokio::test]
	async fn newly_sighted_backends_are_enqueued_for_dial() {
		let store = Arc::new(Store::new());
		let (tx, mut rx) = mpsc::channel(8);
		store.update(ServerStatus {
			status: Status::Online,
			now: 1,
			mux_endpoint_url: "https://a".into(),
			frontend_connections: 0,
			requests: 0,
			loop_: 0,
		});
		let stop = CancellationToken::new();
		let stop2 = stop.clone();
		let task = tokio::spawn(run(store.clone(), tx, Duration::from_millis(10), stop2));

		let state = tokio::time::timeout(Duration::from_millis(200), rx.recv())
			.await
			.expect("dial channel should receive the new backend")
			.unwrap();
		assert_eq!(state.mux_endpoint_url(), "https://a");

		stop.cancel();
		let _ = tokio::time::timeout(Duration::from_millis(200), task).await;
	}
}
