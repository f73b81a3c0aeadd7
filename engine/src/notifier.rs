//! Synchronous in-process fan-out of finalized header records to registered subscribers.

use std::sync::Arc;

use crate::{error::NotifyError, types::IncomingHeaderRecord};

/// Implemented by anything that wants to receive finalized header records. Subscribers run
/// synchronously and in registration order on the tracker's own task; a subscriber that needs to
/// do real work should hand the record off to its own background task rather than block here.
pub trait Subscriber: Send + Sync {
	/// A short, stable name used only in error messages and logs.
	fn name(&self) -> &'static str;

	fn handle(&self, record: &IncomingHeaderRecord) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct Notifier {
	subscribers: Vec<Arc<dyn Subscriber>>,
}

impl Notifier {
	pub fn register(&mut self, subscriber: Arc<dyn Subscriber>) {
		self.subscribers.push(subscriber);
	}

	/// Delivers `record` to every subscriber in registration order. Stops and returns on the
	/// first failure, leaving later subscribers un-notified for this record.
	pub fn notify(&self, record: &IncomingHeaderRecord) -> Result<(), NotifyError> {
		for subscriber in &self.subscribers {
			subscriber.handle(record).map_err(|source| NotifyError::Subscriber { subscriber: subscriber.name(), source })?;
		}
		Ok(())
	}
}
