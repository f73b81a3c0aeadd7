//! The boundary between the reorg pipeline and whatever node client actually talks to the chain.
//! Keeping this as a trait means the cache/tracker tests below run against an in-memory fake
//! instead of a live websocket.

pub mod ethers_client;

use std::{pin::Pin, sync::Arc};

use async_trait::async_trait;
use futures::Stream;

use crate::{
	error::UpstreamError,
	types::{Header, LogFilterQuery},
};

pub type HeaderStream = Pin<Box<dyn Stream<Item = Result<Arc<Header>, UpstreamError>> + Send>>;

#[async_trait]
pub trait UpstreamClient: Send + Sync {
	/// Opens a fresh subscription to new chain heads. Each call is expected to establish its own
	/// connection; the tracker calls this exactly once per `start`.
	async fn subscribe_new_heads(&self) -> Result<HeaderStream, UpstreamError>;

	/// Looks up the canonical header at `number` as currently seen by the upstream node. Used
	/// only to reconcile a reorg candidate against the node's present view of the chain.
	async fn header_by_number(&self, number: u64) -> Result<Arc<Header>, UpstreamError>;

	/// Fetches logs for a single block. `query.block_number` is used as both `fromBlock` and
	/// `toBlock`.
	async fn filter_logs(&self, query: &LogFilterQuery) -> Result<Vec<ethers::types::Log>, UpstreamError>;

	/// Idempotent teardown. Safe to call more than once and safe to call concurrently with an
	/// in-flight `start` loop.
	fn close(&self);
}
