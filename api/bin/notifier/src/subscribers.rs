//! In-process subscribers wired into the tracker at startup. The core pipeline deliberately has
//! no notion of a remote delivery protocol, so the only subscriber shipped with the binary today
//! observes finalized records via structured logging.

use notifier_engine::{notifier::Subscriber, IncomingHeaderRecord};
use tracing::info;

pub struct LoggingSubscriber;

impl Subscriber for LoggingSubscriber {
	fn name(&self) -> &'static str {
		"logging"
	}

	fn handle(&self, record: &IncomingHeaderRecord) -> anyhow::Result<()> {
		info!(nonce = record.nonce, events = record.incoming_events.len(), "finalized incoming header");
		Ok(())
	}
}
