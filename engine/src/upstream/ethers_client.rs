//! Concrete [`UpstreamClient`] backed by `ethers`. A single websocket endpoint serves both the
//! live head subscription and the request/response calls (`eth_getLogs`, `eth_getBlockByNumber`):
//! `ethers`'s `Ws` transport implements the full JSON-RPC client interface, so there's no separate
//! HTTP leg to configure or keep alive.

use std::{sync::Arc, time::Duration};

use async_stream::stream;
use ethers::{
	providers::{Middleware, Provider, Ws},
	types::{BlockId, BlockNumber, Filter, ValueOrArray},
};
use futures::StreamExt as _;
use tracing::{debug, error, warn};
use utilities::{make_periodic_tick, SecretUrl};

use super::{HeaderStream, UpstreamClient};
use crate::{
	error::UpstreamError,
	types::{Header, LogFilterQuery},
};

const CHAIN_ID_POLL_INTERVAL: Duration = Duration::from_secs(4);

pub struct EthersUpstreamClient {
	endpoint: SecretUrl,
	provider: Provider<Ws>,
	expected_chain_id: u64,
}

impl EthersUpstreamClient {
	/// Connects the websocket provider and blocks until its chain id matches `expected_chain_id`,
	/// the same defensive check the rest of this codebase does before trusting a fresh endpoint.
	pub async fn new(endpoint: SecretUrl, expected_chain_id: u64) -> anyhow::Result<Self> {
		let ws = Ws::connect(endpoint.as_ref()).await?;
		let provider = Provider::new(ws);

		let mut poll_interval = make_periodic_tick(CHAIN_ID_POLL_INTERVAL, false);
		loop {
			poll_interval.tick().await;
			match provider.get_chainid().await {
				Ok(chain_id) if chain_id.as_u64() == expected_chain_id => break,
				Ok(chain_id) => {
					error!(expected = expected_chain_id, actual = chain_id.as_u64(), endpoint = %endpoint, "upstream endpoint reports unexpected chain id, retrying");
				}
				Err(e) => {
					warn!(endpoint = %endpoint, error = %e, "failed to query chain id from upstream, retrying");
				}
			}
		}

		Ok(Self { endpoint, provider, expected_chain_id })
	}
}

#[async_trait::async_trait]
impl UpstreamClient for EthersUpstreamClient {
	async fn subscribe_new_heads(&self) -> Result<HeaderStream, UpstreamError> {
		let ws = Ws::connect(self.endpoint.as_ref()).await.map_err(|e| UpstreamError::Subscription(e.into()))?;
		let provider = Provider::new(ws);

		let chain_id = provider.get_chainid().await.map_err(|e| UpstreamError::Subscription(e.into()))?.as_u64();
		if chain_id != self.expected_chain_id {
			return Err(UpstreamError::ChainIdMismatch { expected: self.expected_chain_id, actual: chain_id });
		}

		// The subscription stream borrows from `provider`, so the two have to live together;
		// `stream!` builds a generator that owns `provider` for as long as anyone polls it,
		// which a plain function returning `Box<dyn Stream>` can't express.
		let stream = stream! {
			let mut blocks = match provider.subscribe_blocks().await {
				Ok(blocks) => blocks,
				Err(e) => {
					yield Err(UpstreamError::Subscription(e.into()));
					return;
				}
			};
			while let Some(block) = blocks.next().await {
				yield Header::from_block(block);
			}
		};

		Ok(Box::pin(stream))
	}

	async fn header_by_number(&self, number: u64) -> Result<Arc<Header>, UpstreamError> {
		let block = self
			.provider
			.get_block(BlockId::Number(BlockNumber::Number(number.into())))
			.await
			.map_err(|e| UpstreamError::Rpc(e.into()))?
			.ok_or(UpstreamError::HeaderNotFound(number))?;

		Header::from_block(block)
	}

	async fn filter_logs(&self, query: &LogFilterQuery) -> Result<Vec<ethers::types::Log>, UpstreamError> {
		let filter = Filter::new()
			.from_block(query.block_number)
			.to_block(query.block_number)
			.address(ValueOrArray::Value(query.address))
			.topic0(ValueOrArray::Value(query.topic));

		debug!(block = query.block_number, address = ?query.address, "fetching logs");

		self.provider.get_logs(&filter).await.map_err(|e| UpstreamError::Rpc(e.into()))
	}

	fn close(&self) {
		// The persistent provider's connection is dropped along with the client; the subscription
		// socket opened per `subscribe_new_heads` call is torn down independently by the tracker.
	}
}
