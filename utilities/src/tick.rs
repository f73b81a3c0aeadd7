use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};

/// Builds an interval that ticks every `period`. When `yield_first_tick` is false the first
/// `tick()` call resolves immediately, matching `tokio::time::interval`'s default; when true the
/// caller waits a full `period` before the first tick, which is what connection-retry loops want
/// so they don't immediately hammer a node that just failed.
pub fn make_periodic_tick(period: Duration, yield_first_tick: bool) -> Interval {
	let start = if yield_first_tick { tokio::time::Instant::now() + period } else { tokio::time::Instant::now() };
	let mut interval = tokio::time::interval_at(start, period);
	interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
	interval
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test(start_paused = true)]
	async fn immediate_first_tick_by_default() {
		let mut interval = make_periodic_tick(Duration::from_secs(10), false);
		let start = tokio::time::Instant::now();
		interval.tick().await;
		assert_eq!(tokio::time::Instant::now(), start);
	}

	#[tokio::test(start_paused = true)]
	async fn delayed_first_tick_when_requested() {
		let mut interval = make_periodic_tick(Duration::from_secs(10), true);
		let start = tokio::time::Instant::now();
		interval.tick().await;
		assert_eq!(tokio::time::Instant::now(), start + Duration::from_secs(10));
	}
}
