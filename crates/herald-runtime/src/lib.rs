//! Herald Runtime - configuration, logging and lifecycle for the Herald
//! command framework.
//!
//! This crate provides:
//! - Layered configuration ([`ConfigLoader`], [`HeraldConfig`]): defaults,
//!   programmatic overrides, `herald.toml` / `herald.yaml` files and
//!   `HERALD_*` environment variables
//! - Logging setup on `tracing-subscriber` ([`LoggingBuilder`])
//! - The [`CommandClient`], which builds the router from configuration and
//!   runs the background cooldown sweeper
//!
//! ```rust,ignore
//! use herald_framework::{Command, CommandContext, EventRouter};
//! use herald_runtime::{CommandClient, ConfigLoader};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     let builder = EventRouter::builder().command(
//!         Command::builder("ping").handler(|_ctx: CommandContext| async { anyhow::Ok(()) }),
//!     );
//!
//!     let client = CommandClient::from_config(&config, builder)?;
//!     client.start()?;
//!     // feed events from your transport into client.router()
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! # Features
//!
//! - `toml-config`: load `herald.toml` / `config.toml`
//! - `yaml-config`: load `herald.yaml` / `herald.yml`
//! - `json-log`: JSON log lines (`logging.format = "json"`)

pub mod client;
pub mod config;
pub mod error;
pub mod logging;

// Re-exports
pub use client::CommandClient;
pub use config::{
    ClientConfig, ConfigError, ConfigLoader, ConfigResult, HeraldConfig, LoggingConfig, Profile,
};
pub use error::{RuntimeError, RuntimeResult};
pub use logging::{LoggingBuilder, SpanEvents};

// Re-export tracing for use by other crates
pub use tracing;
pub use tracing_subscriber;

/// Logging macros for handler code.
pub mod prelude {
    pub use tracing::{Level, debug, error, info, instrument, span, trace, warn};
}
