//! The block cache: a bounded, insertion-ordered buffer of recent headers that reconciles
//! reorgs against the upstream node and releases headers once they've accumulated enough
//! confirmations.

use std::{collections::{HashMap, VecDeque}, sync::Arc};

use tracing::debug;

use crate::{
	error::{CacheError, ConfigError},
	types::Header,
	upstream::UpstreamClient,
};

const MAX_CACHE_SIZE: usize = 10_000;

struct CacheState {
	headers: HashMap<u64, Arc<Header>>,
	/// Block numbers in first-insertion order. A reorg at an already-cached number overwrites
	/// the entry in `headers` but never moves its position here, so eviction and finalization
	/// both walk the front of this queue in the order blocks first arrived.
	nonce_order: VecDeque<u64>,
}

pub struct BlockCache {
	state: tokio::sync::Mutex<CacheState>,
	max_size: usize,
	min_confirmations: u64,
	client: Arc<dyn UpstreamClient>,
}

impl BlockCache {
	pub fn new(max_size: usize, min_confirmations: u64, client: Arc<dyn UpstreamClient>) -> Result<Self, ConfigError> {
		if max_size == 0 || max_size > MAX_CACHE_SIZE {
			return Err(ConfigError::InvalidCacheSize { actual: max_size, max: MAX_CACHE_SIZE });
		}
		if min_confirmations as usize > max_size {
			return Err(ConfigError::ConfirmationsExceedCacheSize { min_confirmations, cache_size: max_size });
		}

		Ok(Self {
			state: tokio::sync::Mutex::new(CacheState { headers: HashMap::new(), nonce_order: VecDeque::new() }),
			max_size,
			min_confirmations,
			client,
		})
	}

	/// Inserts `header`, reconciling against the upstream node's canonical view if a header is
	/// already cached at the same number with a different hash. On an upstream lookup failure
	/// the cache is left untouched and the error is returned to the caller.
	pub async fn add(&self, header: Arc<Header>) -> Result<(), CacheError> {
		let mut state = self.state.lock().await;
		let number = header.number;

		match state.headers.get(&number) {
			None => {
				state.headers.insert(number, header);
				state.nonce_order.push_back(number);
			}
			Some(existing) if existing.hash == header.hash => {
				state.headers.insert(number, header);
			}
			Some(existing) => {
				debug!(number, old_hash = ?existing.hash, new_hash = ?header.hash, "chain reorg candidate");
				let canonical = self.client.header_by_number(number).await?;
				if canonical.hash == header.hash {
					state.headers.insert(number, header);
				} else {
					debug!(number, hash = ?header.hash, "reorg candidate is not canonical, discarding");
				}
			}
		}

		while state.nonce_order.len() > self.max_size {
			if let Some(evicted) = state.nonce_order.pop_front() {
				state.headers.remove(&evicted);
			}
		}

		Ok(())
	}

	/// Removes and returns every header that now has at least `min_confirmations` blocks built
	/// on top of it, oldest first. Returns an empty vec if the cache is empty or no header has
	/// accumulated enough confirmations yet.
	pub async fn extract_finalized(&self) -> Vec<Arc<Header>> {
		let mut state = self.state.lock().await;

		let Some(&highest) = state.nonce_order.back() else {
			return Vec::new();
		};
		let Some(cutoff) = highest.checked_sub(self.min_confirmations) else {
			return Vec::new();
		};

		let mut finalized = Vec::new();
		while let Some(&front) = state.nonce_order.front() {
			if front > cutoff {
				break;
			}
			state.nonce_order.pop_front();
			if let Some(header) = state.headers.remove(&front) {
				finalized.push(header);
			}
		}
		finalized
	}

	#[cfg(test)]
	pub async fn len(&self) -> usize {
		self.state.lock().await.nonce_order.len()
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicUsize, Ordering};

	use async_trait::async_trait;
	use ethers::types::H256;

	use super::*;
	use crate::{error::UpstreamError, types::LogFilterQuery, upstream::HeaderStream};

	fn hash_for(number: u64) -> H256 {
		H256::from_low_u64_be(number)
	}

	fn header(number: u64) -> Arc<Header> {
		header_with_hash(number, hash_for(number))
	}

	fn header_with_hash(number: u64, hash: H256) -> Arc<Header> {
		let block = ethers::types::Block::<H256> { number: Some(number.into()), hash: Some(hash), ..Default::default() };
		Header::from_block(block).unwrap()
	}

	#[derive(Default)]
	struct FakeUpstream {
		canonical: std::sync::Mutex<HashMap<u64, Arc<Header>>>,
		lookups: AtomicUsize,
	}

	impl FakeUpstream {
		fn with_canonical(number: u64, hash: H256) -> Self {
			let fake = Self::default();
			fake.canonical.lock().unwrap().insert(number, header_with_hash(number, hash));
			fake
		}
	}

	#[async_trait]
	impl UpstreamClient for FakeUpstream {
		async fn subscribe_new_heads(&self) -> Result<HeaderStream, UpstreamError> {
			unimplemented!("not exercised by cache tests")
		}

		async fn header_by_number(&self, number: u64) -> Result<Arc<Header>, UpstreamError> {
			self.lookups.fetch_add(1, Ordering::SeqCst);
			self.canonical.lock().unwrap().get(&number).cloned().ok_or(UpstreamError::HeaderNotFound(number))
		}

		async fn filter_logs(&self, _query: &LogFilterQuery) -> Result<Vec<ethers::types::Log>, UpstreamError> {
			Ok(Vec::new())
		}

		fn close(&self) {}
	}

	fn cache_with(max_size: usize, min_confirmations: u64, upstream: FakeUpstream) -> BlockCache {
		BlockCache::new(max_size, min_confirmations, Arc::new(upstream)).unwrap()
	}

	#[tokio::test]
	async fn finalizes_oldest_headers_once_confirmations_accumulate() {
		let cache = cache_with(10, 2, FakeUpstream::default());
		for n in 99..=102 {
			cache.add(header(n)).await.unwrap();
		}

		let finalized: Vec<u64> = cache.extract_finalized().await.iter().map(|h| h.number).collect();
		assert_eq!(finalized, vec![99, 100]);
		assert_eq!(cache.len().await, 2);

		cache.add(header(103)).await.unwrap();
		let finalized: Vec<u64> = cache.extract_finalized().await.iter().map(|h| h.number).collect();
		assert_eq!(finalized, vec![101]);
	}

	#[tokio::test]
	async fn empty_cache_finalizes_nothing() {
		let cache = cache_with(10, 2, FakeUpstream::default());
		assert!(cache.extract_finalized().await.is_empty());
	}

	#[tokio::test]
	async fn zero_confirmations_finalizes_up_to_the_tip() {
		let cache = cache_with(10, 0, FakeUpstream::default());
		for n in 1..=3 {
			cache.add(header(n)).await.unwrap();
		}
		let finalized: Vec<u64> = cache.extract_finalized().await.iter().map(|h| h.number).collect();
		assert_eq!(finalized, vec![1, 2, 3]);
	}

	#[tokio::test]
	async fn eviction_drops_oldest_once_capacity_exceeded() {
		let cache = cache_with(5, 0, FakeUpstream::default());
		for n in 1..=7 {
			cache.add(header(n)).await.unwrap();
		}
		assert_eq!(cache.len().await, 5);
	}

	#[tokio::test]
	async fn idempotent_add_of_the_same_hash_does_not_trigger_upstream_lookup() {
		let upstream = FakeUpstream::default();
		let cache = cache_with(10, 2, upstream);
		cache.add(header(5)).await.unwrap();
		cache.add(header(5)).await.unwrap();
		assert_eq!(cache.len().await, 1);
	}

	#[tokio::test]
	async fn reorg_with_canonical_match_replaces_the_cached_header() {
		let forged_hash = H256::from_low_u64_be(999);
		let upstream = FakeUpstream::with_canonical(6, forged_hash);
		let cache = cache_with(10, 2, upstream);
		cache.add(header(6)).await.unwrap();

		cache.add(header_with_hash(6, forged_hash)).await.unwrap();

		let state = cache.state.lock().await;
		assert_eq!(state.headers.get(&6).unwrap().hash, forged_hash);
	}

	#[tokio::test]
	async fn reorg_candidate_not_matching_upstream_is_discarded() {
		let original_hash = hash_for(6);
		let upstream = FakeUpstream::with_canonical(6, original_hash);
		let cache = cache_with(10, 2, upstream);
		cache.add(header(6)).await.unwrap();

		let forged = H256::from_low_u64_be(12345);
		cache.add(header_with_hash(6, forged)).await.unwrap();

		let state = cache.state.lock().await;
		assert_eq!(state.headers.get(&6).unwrap().hash, original_hash);
		assert_eq!(state.nonce_order.iter().filter(|&&n| n == 6).count(), 1);
	}

	#[tokio::test]
	async fn upstream_lookup_failure_during_reorg_leaves_cache_untouched() {
		let cache = cache_with(10, 2, FakeUpstream::default());
		cache.add(header(6)).await.unwrap();

		let err = cache.add(header_with_hash(6, H256::from_low_u64_be(42))).await;
		assert!(err.is_err());

		let state = cache.state.lock().await;
		assert_eq!(state.headers.get(&6).unwrap().hash, hash_for(6));
	}

	#[test]
	fn rejects_zero_size_configuration() {
		let upstream = Arc::new(FakeUpstream::default());
		assert!(BlockCache::new(0, 0, upstream).is_err());
	}

	#[test]
	fn rejects_confirmations_larger_than_cache_size() {
		let upstream = Arc::new(FakeUpstream::default());
		assert!(BlockCache::new(5, 6, upstream).is_err());
	}
}
