//! Reorg-aware block finalization pipeline for bridging confirmed upstream chain events into a
//! sovereign-chain-bound notification stream.
//!
//! The pipeline is [`upstream`] (where headers and logs come from) feeding [`cache::BlockCache`]
//! (reorg reconciliation and confirmation tracking), which in turn feeds [`builder`] (record
//! construction) and [`notifier`] (fan-out). [`tracker::BlockTracker`] wires the four together
//! and drives the run loop.

pub mod builder;
pub mod cache;
pub mod config;
pub mod error;
pub mod notifier;
pub mod tracker;
pub mod types;
pub mod upstream;

pub use error::TrackerError;
pub use tracker::{BlockTracker, TrackerArgs, TrackerHandle};
pub use types::{Event, Header, IncomingHeaderRecord, SourceChainId, SubscribedEvent};
