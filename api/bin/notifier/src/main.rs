mod settings;
mod subscribers;
mod supervisor;

use std::sync::Arc;

use clap::Parser;
use notifier_engine::{BlockTracker, SourceChainId, TrackerArgs};
use tokio_util::sync::CancellationToken;
use tracing::info;
use utilities::SecretUrl;

use crate::settings::{load_settings, CliOptions};

fn init_logging(opts: &CliOptions) -> Option<tracing_appender::non_blocking::WorkerGuard> {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&opts.log_level));

	let builder = tracing_subscriber::fmt().with_env_filter(filter).with_ansi(!opts.disable_ansi_color);

	if opts.log_to_file {
		let file_appender = tracing_appender::rolling::daily("logs", "notifier.log");
		let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
		builder.with_writer(non_blocking).with_ansi(false).init();
		Some(guard)
	} else {
		builder.init();
		None
	}
}

async fn build_tracker(settings: settings::NotifierSettings) -> anyhow::Result<BlockTracker> {
	let validated = settings.tracker.validate()?;

	let endpoint: SecretUrl = validated.client_config.url.parse()?;

	let client = notifier_engine::upstream::ethers_client::EthersUpstreamClient::new(endpoint, validated.client_config.chain_id).await?;

	let mut tracker = BlockTracker::new(TrackerArgs {
		client: Arc::new(client),
		min_confirmations: validated.min_blocks_confirmation,
		block_cache_size: validated.block_cache_size,
		subscribed_events: validated.subscribed_events,
		source_chain_id: SourceChainId::Ethereum,
	})?;

	tracker.register_subscriber(Arc::new(subscribers::LoggingSubscriber));

	Ok(tracker)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let opts = CliOptions::parse();
	let _log_guard = init_logging(&opts);

	let settings = load_settings(&opts.config, opts.clone())?;
	info!(config = %opts.config, "loaded settings");

	let tracker = build_tracker(settings).await?;

	let shutdown = CancellationToken::new();
	supervisor::install_signal_handlers(shutdown.clone());

	supervisor::run_with_restart(&tracker, shutdown).await
}
