//! Turns a finalized header plus its matched logs into the record handed to subscribers.

use ethers::types::Log;

use crate::{
	error::BuilderError,
	types::{Event, Header, IncomingHeaderRecord, SourceChainId},
};

pub struct IncomingHeaderBuilder {
	source_chain_id: SourceChainId,
}

impl IncomingHeaderBuilder {
	pub fn new(source_chain_id: SourceChainId) -> Self {
		Self { source_chain_id }
	}

	pub fn build(&self, header: &Header, logs: Vec<Log>) -> Result<IncomingHeaderRecord, BuilderError> {
		let proof = header.canonical_bytes()?;
		Ok(IncomingHeaderRecord {
			proof,
			source_chain_id: self.source_chain_id,
			nonce: header.nonce(),
			incoming_events: logs.into_iter().map(Event::from).collect(),
		})
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use ethers::types::{H160, H256};

	use super::*;

	fn header(number: u64) -> Arc<Header> {
		let block = ethers::types::Block::<H256> {
			number: Some(number.into()),
			hash: Some(H256::from_low_u64_be(number)),
			..Default::default()
		};
		Header::from_block(block).unwrap()
	}

	#[test]
	fn builds_a_record_with_the_block_number_as_nonce() {
		let builder = IncomingHeaderBuilder::new(SourceChainId::Ethereum);
		let log = Log { address: H160::repeat_byte(1), topics: vec![H256::repeat_byte(2)], data: vec![1, 2, 3].into(), ..Default::default() };

		let record = builder.build(&header(42), vec![log]).unwrap();

		assert_eq!(record.nonce, 42);
		assert_eq!(record.source_chain_id, SourceChainId::Ethereum);
		assert_eq!(record.incoming_events.len(), 1);
		assert!(record.incoming_events[0].identifier.is_none());
		assert!(!record.proof.is_empty());
	}

	#[test]
	fn builds_a_record_with_no_events_when_no_logs_matched() {
		let builder = IncomingHeaderBuilder::new(SourceChainId::Ethereum);
		let record = builder.build(&header(1), Vec::new()).unwrap();
		assert!(record.incoming_events.is_empty());
	}
}
