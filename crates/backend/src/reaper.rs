use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::uplink::Registry;

/// Ticks every `period`, reaping any uplink session idle for at least
/// `max_idle`.
pub async fn run(uplink: Arc<Registry>, period: Duration, max_idle: Duration, stop: CancellationToken) {
	let mut interval = tokio::time::interval(period);
	interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
	loop {
		tokio::select! {
			_ = stop.cancelled() => break,
			_ = interval.tick() => {
				let reaped = uplink.reap(max_idle);
				if reaped > 0 {
					tracing::event!(target: "uplink", tracing::Level::DEBUG, reaped, "idle sessions reaped");
				}
			}
		}
	}
}
