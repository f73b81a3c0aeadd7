pub mod redact_endpoint_secret;
pub mod tick;

pub use redact_endpoint_secret::SecretUrl;
pub use tick::make_periodic_tick;
