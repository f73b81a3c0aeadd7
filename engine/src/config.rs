//! Validated configuration for a tracker instance. `Settings` is the deserialization target for
//! whatever config layer the binary builds (file + env + CLI); `Settings::validate` turns it
//! into the concrete pieces the tracker needs, doing all the fallible parsing up front so the
//! rest of the pipeline never has to handle a malformed address or topic.

use std::str::FromStr;

use ethers::types::H160;
use sha3::{Digest, Keccak256};

use crate::{error::ConfigError, types::SubscribedEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarshallerType {
	Json,
}

impl FromStr for MarshallerType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"json" => Ok(Self::Json),
			other => Err(ConfigError::UnknownMarshaller(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherType {
	Keccak256,
}

impl FromStr for HasherType {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"keccak256" => Ok(Self::Keccak256),
			other => Err(ConfigError::UnknownHasher(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct SubscribedEventConfig {
	pub identifier: String,
	pub addresses: Vec<String>,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct ClientConfig {
	pub url: String,
	pub chain_id: u64,
}

#[derive(Debug, Clone, serde::Deserialize, serde::Serialize)]
pub struct Settings {
	pub marshaller_type: String,
	pub hasher_type: String,
	pub min_blocks_confirmation: u64,
	pub block_cache_size: usize,
	pub subscribed_events: Vec<SubscribedEventConfig>,
	pub client_config: ClientConfig,
}

/// The result of validating [`Settings`]: every field parsed into its strongly-typed form.
pub struct ValidatedSettings {
	pub marshaller_type: MarshallerType,
	pub hasher_type: HasherType,
	pub min_blocks_confirmation: u64,
	pub block_cache_size: usize,
	pub subscribed_events: Vec<SubscribedEvent>,
	pub client_config: ClientConfig,
}

impl Settings {
	pub fn validate(self) -> Result<ValidatedSettings, ConfigError> {
		let marshaller_type = MarshallerType::from_str(&self.marshaller_type)?;
		let hasher_type = HasherType::from_str(&self.hasher_type)?;

		if self.client_config.url.is_empty() {
			return Err(ConfigError::EmptyEndpoint);
		}
		if self.block_cache_size == 0 || self.block_cache_size > 10_000 {
			return Err(ConfigError::InvalidCacheSize { actual: self.block_cache_size, max: 10_000 });
		}
		if self.min_blocks_confirmation as usize > self.block_cache_size {
			return Err(ConfigError::ConfirmationsExceedCacheSize {
				min_confirmations: self.min_blocks_confirmation,
				cache_size: self.block_cache_size,
			});
		}

		let mut subscribed_events = Vec::new();
		for event in &self.subscribed_events {
			let topic = match hasher_type {
				HasherType::Keccak256 => ethers::types::H256::from_slice(&Keccak256::digest(event.identifier.as_bytes())),
			};
			for address in &event.addresses {
				let trimmed = address.trim_start_matches("0x");
				let bytes = hex::decode(trimmed).map_err(|source| ConfigError::InvalidAddress {
					identifier: event.identifier.clone(),
					address: address.clone(),
					source,
				})?;
				if bytes.len() != 20 {
					return Err(ConfigError::InvalidAddress {
						identifier: event.identifier.clone(),
						address: address.clone(),
						source: hex::FromHexError::InvalidStringLength,
					});
				}
				subscribed_events.push(SubscribedEvent { identifier: event.identifier.clone(), address: H160::from_slice(&bytes), topic });
			}
		}

		Ok(ValidatedSettings {
			marshaller_type,
			hasher_type,
			min_blocks_confirmation: self.min_blocks_confirmation,
			block_cache_size: self.block_cache_size,
			subscribed_events,
			client_config: self.client_config,
		})
	}
}
