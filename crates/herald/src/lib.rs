//! # Herald
//!
//! A command framework for chat bots: text commands behind a prefix and
//! structured ("slash") commands, routed to async handlers.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐   MessageEvent   ┌─────────────┐   lookup   ┌──────────────────┐
//! │ Transport │─────────────────▶│ EventRouter │───────────▶│ Command registry │
//! │ (yours)   │   SlashEvent     │             │            └──────────────────┘
//! └───────────┘─────────────────▶│  prefix ▸ help ▸ lookup ▸ listener ▸ handler
//!                                └─────────────┘
//! ```
//!
//! - **Core** (`herald-core`): events, the ordered registry, cooldowns, usage
//!   counts and the linked-deletion cache
//! - **Framework** (`herald-framework`): prefix resolution, command
//!   descriptors, the router and its listener hooks
//! - **Runtime** (`herald-runtime`): configuration, logging and the
//!   [`CommandClient`](runtime::CommandClient) lifecycle
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! async fn ping(_ctx: CommandContext) -> anyhow::Result<()> {
//!     Ok(())
//! }
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ConfigLoader::new().load()?;
//!     let builder = EventRouter::builder()
//!         .command(Command::builder("ping").help("checks the bot is alive").handler(ping));
//!
//!     let client = CommandClient::from_config(&config, builder)?;
//!     client.start()?;
//!
//!     let outcome = client.router().route_message(MessageEvent::new("!ping")).await?;
//!     client.shutdown().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `clap` (default): `CommandContext::parse_args` with clap
//! - `toml-config` (default): load `herald.toml`
//! - `yaml-config`: load `herald.yaml`
//! - `json-log`: JSON log lines

pub use herald_core as core;
pub use herald_framework as framework;
pub use herald_runtime as runtime;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use herald::prelude::*;
/// ```
pub mod prelude {
    // Runtime - configuration and lifecycle
    pub use herald_runtime::{CommandClient, ConfigLoader, HeraldConfig, LoggingBuilder};

    // Events from the transport
    pub use herald_core::{ContextKind, MessageEvent, SlashEvent};

    // Commands and their handlers
    pub use herald_framework::{
        Category, Command, CommandContext, CooldownScope, RunStatus, SlashCommand, SlashContext,
        SlashOptions,
    };

    // Routing
    pub use herald_framework::{
        CommandListener, EventRouter, MessageDeleter, PrefixSource, RouteOutcome, RouterBuilder,
    };
}
