//! Wire-agnostic data model for the pipeline. `Header` wraps whatever the upstream client
//! returned for a block; everything downstream of the cache only ever touches `Arc<Header>` so a
//! finalized header can be handed off to the notifier without a copy.

use std::sync::Arc;

use ethers::types::{Block, H160, H256};

use crate::error::UpstreamError;

/// A block header as accepted into the cache. Carries just enough to drive reorg reconciliation
/// (`number`, `hash`) plus the full provider response needed to build a canonical proof later.
#[derive(Debug, Clone)]
pub struct Header {
	pub number: u64,
	pub hash: H256,
	inner: Block<H256>,
}

impl Header {
	pub fn from_block(block: Block<H256>) -> Result<Arc<Self>, UpstreamError> {
		let number = block.number.ok_or(UpstreamError::MalformedHeader("number"))?.as_u64();
		let hash = block.hash.ok_or(UpstreamError::MalformedHeader("hash"))?;
		Ok(Arc::new(Self { number, hash, inner: block }))
	}

	/// The nonce carried in the eventual `IncomingHeaderRecord`. Upstream gives us a block
	/// number, not the PoW nonce field (post-merge chains don't have one), so the block number
	/// is what gets used.
	pub fn nonce(&self) -> u64 {
		self.number
	}

	/// Canonical byte representation embedded in the record as a proof of the header's contents.
	pub fn canonical_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
		serde_json::to_vec(&self.inner)
	}
}

/// Tag identifying the upstream chain family a record originated from. Only one family is
/// supported today; the enum exists so the wire format has a stable discriminant to extend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceChainId {
	Ethereum,
}

/// A single contract event captured within a finalized block.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Event {
	pub address: Vec<u8>,
	/// Always empty: the upstream log stream carries topics and data, not a named identifier.
	pub identifier: Option<Vec<u8>>,
	pub topics: Vec<Vec<u8>>,
	pub data: Vec<u8>,
}

impl From<ethers::types::Log> for Event {
	fn from(log: ethers::types::Log) -> Self {
		Self {
			address: log.address.as_bytes().to_vec(),
			identifier: None,
			topics: log.topics.iter().map(|t| t.as_bytes().to_vec()).collect(),
			data: log.data.to_vec(),
		}
	}
}

/// The record handed to subscribers once a block has crossed the confirmation threshold.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IncomingHeaderRecord {
	pub proof: Vec<u8>,
	pub source_chain_id: SourceChainId,
	pub nonce: u64,
	pub incoming_events: Vec<Event>,
}

/// One contract address + topic pair the tracker filters logs for at each finalized block.
#[derive(Debug, Clone)]
pub struct SubscribedEvent {
	pub identifier: String,
	pub address: H160,
	pub topic: H256,
}

/// A log filter pinned to a single block. The `block_number` field alone (rather than separate
/// from/to fields) makes "fromBlock == toBlock" a structural guarantee instead of a runtime check.
#[derive(Debug, Clone)]
pub struct LogFilterQuery {
	pub block_number: u64,
	pub address: H160,
	pub topic: H256,
}
