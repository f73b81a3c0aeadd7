//! Closed error taxonomy for the core pipeline. Each module gets its own enum so callers can
//! match on failure mode instead of string-sniffing; `TrackerError` composes the others for the
//! single entry point callers actually see.

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
	#[error("block_cache_size must be between 1 and {max}, got {actual}")]
	InvalidCacheSize { actual: usize, max: usize },
	#[error("min_blocks_confirmation ({min_confirmations}) must not exceed block_cache_size ({cache_size})")]
	ConfirmationsExceedCacheSize { min_confirmations: u64, cache_size: usize },
	#[error("unknown marshaller_type {0:?}, expected \"json\"")]
	UnknownMarshaller(String),
	#[error("unknown hasher_type {0:?}, expected \"keccak256\"")]
	UnknownHasher(String),
	#[error("subscribed event {identifier:?} has an invalid address {address:?}: {source}")]
	InvalidAddress { identifier: String, address: String, #[source] source: hex::FromHexError },
	#[error("client endpoint url is empty")]
	EmptyEndpoint,
}

#[derive(thiserror::Error, Debug)]
pub enum UpstreamError {
	#[error("upstream subscription failed: {0}")]
	Subscription(#[source] anyhow::Error),
	#[error("upstream rpc call failed: {0}")]
	Rpc(#[source] anyhow::Error),
	#[error("header {0} not found on upstream chain")]
	HeaderNotFound(u64),
	#[error("header returned by upstream is missing {0}")]
	MalformedHeader(&'static str),
	#[error("upstream chain id mismatch: expected {expected}, got {actual}")]
	ChainIdMismatch { expected: u64, actual: u64 },
}

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
	#[error("reorg reconciliation failed: {0}")]
	Upstream(#[from] UpstreamError),
}

#[derive(thiserror::Error, Debug)]
pub enum BuilderError {
	#[error("failed to serialize header into canonical proof bytes: {0}")]
	Serialize(#[from] serde_json::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum NotifyError {
	#[error("subscriber {subscriber} rejected incoming header record: {source}")]
	Subscriber { subscriber: &'static str, #[source] source: anyhow::Error },
}

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
	#[error(transparent)]
	Cache(#[from] CacheError),
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	#[error(transparent)]
	Builder(#[from] BuilderError),
	#[error(transparent)]
	Notify(#[from] NotifyError),
	#[error("upstream header subscription ended without being cancelled")]
	SubscriptionEnded,
}
