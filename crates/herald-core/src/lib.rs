//! # Herald Core
//!
//! Shared data structures for the Herald command framework.
//!
//! This crate holds the pieces of the command pipeline that carry real
//! invariants and are shared between the router and its integrators:
//!
//! - **Events**: the inbound shapes the router understands ([`MessageEvent`],
//!   [`SlashEvent`], [`ContextKind`])
//! - **Registry**: an ordered, alias-indexed command collection
//!   ([`CommandRegistry`], [`Indexed`])
//! - **Bookkeeping**: rate limits and invocation counts ([`CooldownTracker`],
//!   [`UsageCounter`])
//! - **Linked responses**: a bounded FIFO map from a triggering message to the
//!   responses it produced ([`LinkCache`])
//!
//! Every structure here is `Send + Sync` and guards its state with exactly one
//! `parking_lot` lock, so a single instance can be shared through an `Arc`
//! between the thread that routes events and the thread that administers the
//! registry.
//!
//! ```text
//! ┌──────────────┐   lookup    ┌──────────────────┐
//! │ EventRouter  │────────────▶│ CommandRegistry  │
//! │ (framework)  │──increment─▶│ UsageCounter     │
//! │              │──remaining─▶│ CooldownTracker  │
//! └──────────────┘             └──────────────────┘
//!        ▲ link / consume      ┌──────────────────┐
//!        └────────────────────▶│ LinkCache        │
//!                              └──────────────────┘
//! ```

pub mod cooldown;
pub mod error;
pub mod event;
pub mod link_cache;
pub mod registry;
pub mod usage;

pub use cooldown::CooldownTracker;
pub use error::{RegistryError, RegistryResult};
pub use event::{ContextKind, MessageEvent, SlashEvent};
pub use link_cache::LinkCache;
pub use registry::{CommandRegistry, Indexed};
pub use usage::UsageCounter;
