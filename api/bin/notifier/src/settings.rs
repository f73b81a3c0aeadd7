use std::collections::HashMap;

use clap::Parser;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, FileFormat, Map, Source, Value};
use notifier_engine::config::Settings as TrackerSettings;
use serde::Deserialize;

/// CLI flags. Anything set here wins over the config file and environment — `TrackerOptions`
/// doubles as a `config::Source` so clap and the `config` crate layer together instead of the
/// binary juggling two separate override mechanisms.
#[derive(Parser, Debug, Clone, Default)]
#[clap(version, about = "Watches an upstream chain and notifies registered subscribers of finalized blocks")]
pub struct CliOptions {
	/// Path to the TOML config file.
	#[clap(long, default_value = "config/notifier.toml")]
	pub config: String,

	#[clap(long = "client_config.url")]
	url: Option<String>,
	#[clap(long = "client_config.chain_id")]
	chain_id: Option<String>,

	/// Minimum and maximum are `trace`/`debug`/`info`/`warn`/`error`.
	#[clap(long, default_value = "info")]
	pub log_level: String,
	#[clap(long)]
	pub log_to_file: bool,
	#[clap(long)]
	pub disable_ansi_color: bool,
}

fn insert_command_line_option(map: &mut HashMap<String, Value>, key: &str, value: &Option<String>) {
	if let Some(value) = value {
		map.insert(key.into(), value.clone().into());
	}
}

impl Source for CliOptions {
	fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
		Box::new(self.clone())
	}

	fn collect(&self) -> Result<Map<String, Value>, ConfigError> {
		let mut map = HashMap::new();
		insert_command_line_option(&mut map, "client_config.url", &self.url);
		insert_command_line_option(&mut map, "client_config.chain_id", &self.chain_id);
		Ok(map)
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct NotifierSettings {
	#[serde(flatten)]
	pub tracker: TrackerSettings,
}

/// Layers settings from lowest to highest precedence: defaults, then the TOML file (if present),
/// then `NOTIFIER__`-prefixed environment variables, then CLI flags.
pub fn load_settings(config_path: &str, opts: CliOptions) -> Result<NotifierSettings, ConfigError> {
	let builder = set_defaults(Config::builder())?;

	let builder = if std::path::Path::new(config_path).exists() {
		builder.add_source(File::new(config_path, FileFormat::Toml))
	} else {
		builder
	};

	builder
		.add_source(Environment::default().prefix("NOTIFIER").separator("__"))
		.add_source(opts)
		.build()?
		.try_deserialize()
}

fn set_defaults(builder: ConfigBuilder<config::builder::DefaultState>) -> Result<ConfigBuilder<config::builder::DefaultState>, ConfigError> {
	builder
		.set_default("marshaller_type", "json")?
		.set_default("hasher_type", "keccak256")?
		.set_default("min_blocks_confirmation", 7)?
		.set_default("block_cache_size", 100)?
		.set_default("subscribed_events", Vec::<Value>::new())?
		.set_default("client_config.chain_id", 1)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn cli_flags_override_defaults() {
		let opts = CliOptions { url: Some("wss://cli.example/ws".into()), ..Default::default() };
		let settings = load_settings("/nonexistent/path.toml", opts).unwrap();
		assert_eq!(settings.tracker.client_config.url, "wss://cli.example/ws");
	}

	#[test]
	fn missing_file_falls_back_to_defaults_plus_overrides() {
		let opts = CliOptions { url: Some("wss://example.com/ws".into()), ..Default::default() };
		let settings = load_settings("/nonexistent/path.toml", opts).unwrap();
		assert_eq!(settings.tracker.min_blocks_confirmation, 7);
		assert_eq!(settings.tracker.block_cache_size, 100);
	}

	#[test]
	fn file_values_override_defaults_but_not_cli_flags() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		use std::io::Write;
		write!(
			file,
			r#"
			min_blocks_confirmation = 12
			block_cache_size = 50

			[client_config]
			url = "wss://file.example/ws"
			chain_id = 5
			"#
		)
		.unwrap();

		let opts = CliOptions { url: Some("wss://cli.example/ws".into()), ..Default::default() };
		let settings = load_settings(file.path().to_str().unwrap(), opts).unwrap();

		assert_eq!(settings.tracker.min_blocks_confirmation, 12);
		assert_eq!(settings.tracker.block_cache_size, 50);
		assert_eq!(settings.tracker.client_config.url, "wss://cli.example/ws");
	}
}
