//! The orchestrator that drives the whole pipeline: subscribe to new heads, feed them through
//! the cache, fetch logs for anything the cache finalizes, build a record, and fan it out.

use std::sync::{atomic::{AtomicBool, Ordering}, Arc};

use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::{
	builder::IncomingHeaderBuilder,
	cache::BlockCache,
	error::TrackerError,
	notifier::{Notifier, Subscriber},
	types::{Header, SourceChainId, SubscribedEvent, LogFilterQuery},
	upstream::UpstreamClient,
};

pub struct TrackerArgs {
	pub client: Arc<dyn UpstreamClient>,
	pub min_confirmations: u64,
	pub block_cache_size: usize,
	pub subscribed_events: Vec<SubscribedEvent>,
	pub source_chain_id: SourceChainId,
}

/// A cheap, cloneable handle that lets another task request shutdown without holding onto the
/// tracker itself. Closing is idempotent regardless of whether it races with the tracker's own
/// cleanup at the end of `start`.
#[derive(Clone)]
pub struct TrackerHandle {
	client: Arc<dyn UpstreamClient>,
	close_token: CancellationToken,
	closed: Arc<AtomicBool>,
}

impl TrackerHandle {
	pub fn close(&self) {
		self.close_token.cancel();
		if !self.closed.swap(true, Ordering::SeqCst) {
			self.client.close();
		}
	}
}

pub struct BlockTracker {
	client: Arc<dyn UpstreamClient>,
	cache: BlockCache,
	subscribed_events: Vec<SubscribedEvent>,
	builder: IncomingHeaderBuilder,
	notifier: Notifier,
	close_token: CancellationToken,
	closed: Arc<AtomicBool>,
}

impl BlockTracker {
	pub fn new(args: TrackerArgs) -> Result<Self, crate::error::ConfigError> {
		let cache = BlockCache::new(args.block_cache_size, args.min_confirmations, args.client.clone())?;
		Ok(Self {
			client: args.client,
			cache,
			subscribed_events: args.subscribed_events,
			builder: IncomingHeaderBuilder::new(args.source_chain_id),
			notifier: Notifier::default(),
			close_token: CancellationToken::new(),
			closed: Arc::new(AtomicBool::new(false)),
		})
	}

	pub fn register_subscriber(&mut self, subscriber: Arc<dyn Subscriber>) {
		self.notifier.register(subscriber);
	}

	pub fn handle(&self) -> TrackerHandle {
		TrackerHandle { client: self.client.clone(), close_token: self.close_token.clone(), closed: self.closed.clone() }
	}

	/// Runs the block tracking loop until `ctx` is cancelled, `close()` is called on a handle, or
	/// the upstream subscription fails or ends. All three external stop signals, plus the next
	/// header arriving, are raced with equal priority on every iteration.
	pub async fn start(&self, ctx: CancellationToken) -> Result<(), TrackerError> {
		let mut header_stream = self.client.subscribe_new_heads().await?;
		info!("subscribed to upstream head stream");

		let result = loop {
			tokio::select! {
				item = header_stream.next() => {
					match item {
						Some(Ok(header)) => {
							if let Err(e) = self.process_block(header).await {
								break Err(e);
							}
						}
						Some(Err(e)) => break Err(TrackerError::Upstream(e)),
						None => break Err(TrackerError::SubscriptionEnded),
					}
				}
				_ = ctx.cancelled() => {
					info!("tracker stopping: caller cancellation");
					break Ok(());
				}
				_ = self.close_token.cancelled() => {
					info!("tracker stopping: close requested");
					break Ok(());
				}
			}
		};

		drop(header_stream);
		if !self.closed.swap(true, Ordering::SeqCst) {
			self.client.close();
		}
		if let Err(ref e) = result {
			warn!(error = %e, "tracker stopped due to error");
		}
		result
	}

	async fn process_block(&self, header: Arc<Header>) -> Result<(), TrackerError> {
		self.cache.add(header).await?;

		for finalized in self.cache.extract_finalized().await {
			let logs = self.fetch_logs(&finalized).await?;
			let record = self.builder.build(&finalized, logs)?;
			self.notifier.notify(&record)?;
		}

		Ok(())
	}

	async fn fetch_logs(&self, header: &Header) -> Result<Vec<ethers::types::Log>, TrackerError> {
		let mut logs = Vec::new();
		for event in &self.subscribed_events {
			let query = LogFilterQuery { block_number: header.number, address: event.address, topic: event.topic };
			logs.extend(self.client.filter_logs(&query).await?);
		}
		Ok(logs)
	}
}
