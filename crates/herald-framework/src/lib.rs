//! # Herald Framework
//!
//! Command routing on top of the Herald core structures.
//!
//! This layer provides:
//! - Prefix resolution with a fixed precedence ([`PrefixResolver`])
//! - Command descriptors with async handlers ([`Command`], [`SlashCommand`])
//! - The per-event routing state machine ([`EventRouter`], [`RouteOutcome`])
//! - Listener hooks ([`CommandListener`]) and cascading deletion of linked
//!   responses ([`MessageDeleter`])
//! - Argument helpers: shell-style splitting, typed structured options and,
//!   with the `clap` feature, clap parsing of text arguments
//! - A `tower::Service` wrapper around the router ([`RouterService`])

pub mod args;
pub mod command;
pub mod context;
pub mod deletion;
pub mod error;
pub mod listener;
pub mod options;
pub mod prefix;
pub mod router;
pub mod service;

pub use args::{shell_split, split_command};
pub use command::{
    BoxedCommandHandler, BoxedSlashHandler, Category, Command, CommandBuilder, CommandHandler,
    HandlerResult, RunStatus, SlashCommand, SlashCommandBuilder, SlashHandler,
};
pub use context::{CommandContext, CooldownScope, SlashContext};
pub use deletion::MessageDeleter;
pub use error::{DispatchError, DispatchResult};
pub use listener::CommandListener;
pub use options::SlashOptions;
pub use prefix::{MENTION_PREFIX, PrefixFn, PrefixMatch, PrefixResolver, PrefixSource};
pub use router::{DEFAULT_HELP_WORD, EventRouter, PreProcessFn, RouteOutcome, RouterBuilder};
pub use service::RouterService;
