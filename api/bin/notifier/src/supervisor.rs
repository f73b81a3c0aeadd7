//! Process-level retry loop and signal handling around [`BlockTracker::start`]. All retry policy
//! lives here, never inside the tracker itself, so the tracker's own behavior stays a pure
//! function of its inputs.

use std::time::Duration;

use notifier_engine::BlockTracker;
use tokio::signal::unix::{signal, SignalKind};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

const RESTART_BACKOFF: Duration = Duration::from_secs(1);

/// Spawns a task that cancels `shutdown` on SIGINT or SIGTERM. Installing this before the first
/// call to `run_with_restart` guarantees a signal received mid-retry still unblocks the loop.
pub fn install_signal_handlers(shutdown: CancellationToken) {
	tokio::spawn(async move {
		let mut sigint = signal(SignalKind::interrupt()).expect("failed to install SIGINT handler");
		let mut sigterm = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");

		tokio::select! {
			_ = sigint.recv() => info!("received SIGINT"),
			_ = sigterm.recv() => info!("received SIGTERM"),
		}
		shutdown.cancel();
	});
}

/// Runs `tracker.start` in a loop, restarting on error with a fixed back-off, until `shutdown`
/// is cancelled. `Close` is invoked by the tracker itself on every stop path, so this loop only
/// needs to decide whether to retry.
pub async fn run_with_restart(tracker: &BlockTracker, shutdown: CancellationToken) -> anyhow::Result<()> {
	loop {
		if shutdown.is_cancelled() {
			info!("shutdown requested, not restarting tracker");
			return Ok(());
		}

		match tracker.start(shutdown.clone()).await {
			Ok(()) => {
				info!("tracker stopped cooperatively");
				return Ok(());
			}
			Err(e) => {
				error!(error = %e, "tracker stopped with an error, restarting after back-off");
				warn!(backoff = ?RESTART_BACKOFF, "waiting before restart");
				tokio::time::sleep(RESTART_BACKOFF).await;
			}
		}
	}
}
