//! Command descriptors and handler traits.
//!
//! A [`Command`] is an immutable descriptor (name, aliases, help metadata)
//! paired with an opaque handler. The router never looks inside a handler; it
//! only calls [`CommandHandler::run`] with a freshly built
//! [`CommandContext`].
//!
//! Handlers can be written as async closures or as types implementing the
//! trait directly:
//!
//! ```rust,ignore
//! use herald_framework::{Command, CommandContext, CommandHandler, HandlerResult};
//!
//! // Closure handler
//! let ping = Command::builder("ping")
//!     .alias("p")
//!     .help("Checks that the bot is alive")
//!     .handler(|ctx: CommandContext| async move {
//!         tracing::info!(args = %ctx.args(), "pong");
//!         Ok(())
//!     });
//!
//! // Type handler
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl CommandHandler for Echo {
//!     async fn run(&self, ctx: CommandContext) -> HandlerResult {
//!         reply(ctx.args()).await
//!     }
//! }
//!
//! let echo = Command::builder("echo").arguments("<text>").handler(Echo);
//!
//! // Rate limited: once every 10 seconds per user and guild
//! let roll = Command::builder("roll")
//!     .cooldown(10)
//!     .cooldown_scope(CooldownScope::UserGuild)
//!     .handler(roll_handler);
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::context::{CommandContext, CooldownScope, SlashContext};
use herald_core::{CooldownTracker, Indexed};

/// Result type returned by command handlers.
pub type HandlerResult = anyhow::Result<()>;

/// How [`Command::run`] or [`SlashCommand::run`] finished without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// The handler ran to completion.
    Completed,
    /// An owner-only or guild-only restriction held the handler back.
    Refused,
    /// The invoker's cooldown for this command is still running.
    CoolingDown {
        /// Whole seconds left, rounded up.
        remaining: u32,
    },
}

// ============================================================================
// Handler Traits
// ============================================================================

/// The capability a text command exposes to the router.
///
/// Implemented automatically for any `Fn(CommandContext) -> impl Future`
/// closure returning a [`HandlerResult`].
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    /// Runs the command.
    async fn run(&self, ctx: CommandContext) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> CommandHandler for F
where
    F: Fn(CommandContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn run(&self, ctx: CommandContext) -> HandlerResult {
        self(ctx).await
    }
}

/// The capability a structured command exposes to the router.
#[async_trait]
pub trait SlashHandler: Send + Sync + 'static {
    /// Runs the command.
    async fn run(&self, ctx: SlashContext) -> HandlerResult;
}

#[async_trait]
impl<F, Fut> SlashHandler for F
where
    F: Fn(SlashContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn run(&self, ctx: SlashContext) -> HandlerResult {
        self(ctx).await
    }
}

/// A type-erased text command handler.
pub type BoxedCommandHandler = Arc<dyn CommandHandler>;

/// A type-erased structured command handler.
pub type BoxedSlashHandler = Arc<dyn SlashHandler>;

// ============================================================================
// Category
// ============================================================================

/// A grouping tag used when listing commands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Category {
    name: String,
}

impl Category {
    /// Creates a category with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// Returns the display name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

// ============================================================================
// Text Command
// ============================================================================

/// An immutable text command descriptor plus its handler.
#[derive(Clone)]
pub struct Command {
    name: String,
    aliases: Vec<String>,
    category: Option<Category>,
    hidden: bool,
    owner_only: bool,
    arguments: Option<String>,
    help: String,
    cooldown: u32,
    cooldown_scope: CooldownScope,
    handler: BoxedCommandHandler,
}

impl Command {
    /// Starts building a command with the given name.
    pub fn builder(name: impl Into<String>) -> CommandBuilder {
        CommandBuilder::new(name)
    }

    /// Returns the canonical name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the alternative names.
    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Returns the category, if any.
    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    /// Whether help listings should skip this command.
    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Whether only owners may use this command.
    pub fn is_owner_only(&self) -> bool {
        self.owner_only
    }

    /// Returns the argument hint shown in help listings.
    pub fn arguments(&self) -> Option<&str> {
        self.arguments.as_deref()
    }

    /// Returns the help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the cooldown in seconds; `0` means none.
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Returns how widely the cooldown applies.
    pub fn cooldown_scope(&self) -> CooldownScope {
        self.cooldown_scope
    }

    /// Runs the handler unless a restriction or cooldown holds it back.
    ///
    /// Owner-only commands refuse everyone else. Owners skip cooldowns; for
    /// anyone else a running cooldown blocks the handler and an expired one
    /// is restarted before the handler runs.
    pub async fn run(&self, ctx: CommandContext) -> anyhow::Result<RunStatus> {
        if self.owner_only && !ctx.is_owner() {
            debug!(command = %self.name, user = ctx.event().author_id, "Owner-only command refused");
            return Ok(RunStatus::Refused);
        }
        if self.cooldown > 0 && !ctx.is_owner() {
            let key = ctx.cooldown_key(self.cooldown_scope);
            if let Some(remaining) = claim_cooldown(ctx.cooldowns(), key, self.cooldown) {
                return Ok(RunStatus::CoolingDown { remaining });
            }
        }
        self.handler.run(ctx).await?;
        Ok(RunStatus::Completed)
    }
}

fn claim_cooldown(cooldowns: &CooldownTracker, key: String, seconds: u32) -> Option<u32> {
    let remaining = cooldowns.try_start(key.as_str(), seconds)?;
    debug!(key = %key, remaining, "Command is cooling down");
    Some(remaining)
}

impl Indexed for Command {
    fn name(&self) -> &str {
        &self.name
    }

    fn aliases(&self) -> &[String] {
        &self.aliases
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("category", &self.category)
            .field("hidden", &self.hidden)
            .field("owner_only", &self.owner_only)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Builder for [`Command`].
#[derive(Debug, Clone)]
pub struct CommandBuilder {
    name: String,
    aliases: Vec<String>,
    category: Option<Category>,
    hidden: bool,
    owner_only: bool,
    arguments: Option<String>,
    help: String,
    cooldown: u32,
    cooldown_scope: CooldownScope,
}

impl CommandBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            category: None,
            hidden: false,
            owner_only: false,
            arguments: None,
            help: "no help available".to_string(),
            cooldown: 0,
            cooldown_scope: CooldownScope::User,
        }
    }

    /// Adds an alias.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Adds several aliases.
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Hides the command from help listings.
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    /// Restricts the command to owners.
    pub fn owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = owner_only;
        self
    }

    /// Sets the argument hint.
    pub fn arguments(mut self, arguments: impl Into<String>) -> Self {
        self.arguments = Some(arguments.into());
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Sets the cooldown in seconds; `0` disables it.
    pub fn cooldown(mut self, seconds: u32) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Sets how widely the cooldown applies. Defaults to
    /// [`CooldownScope::User`].
    pub fn cooldown_scope(mut self, scope: CooldownScope) -> Self {
        self.cooldown_scope = scope;
        self
    }

    /// Attaches the handler and finishes the command.
    pub fn handler<H: CommandHandler>(self, handler: H) -> Command {
        self.handler_boxed(Arc::new(handler))
    }

    /// Attaches a pre-built boxed handler.
    pub fn handler_boxed(self, handler: BoxedCommandHandler) -> Command {
        Command {
            name: self.name,
            aliases: self.aliases,
            category: self.category,
            hidden: self.hidden,
            owner_only: self.owner_only,
            arguments: self.arguments,
            help: self.help,
            cooldown: self.cooldown,
            cooldown_scope: self.cooldown_scope,
            handler,
        }
    }
}

// ============================================================================
// Structured Command
// ============================================================================

/// An immutable structured-command descriptor plus its handler.
///
/// Structured commands have no aliases; the platform delivers the exact name.
#[derive(Clone)]
pub struct SlashCommand {
    name: String,
    help: String,
    category: Option<Category>,
    owner_only: bool,
    guild_only: bool,
    guild_id: Option<u64>,
    cooldown: u32,
    cooldown_scope: CooldownScope,
    handler: BoxedSlashHandler,
}

impl SlashCommand {
    /// Starts building a structured command with the given name.
    pub fn builder(name: impl Into<String>) -> SlashCommandBuilder {
        SlashCommandBuilder {
            name: name.into(),
            help: "no help available".to_string(),
            category: None,
            owner_only: false,
            guild_only: false,
            guild_id: None,
            cooldown: 0,
            cooldown_scope: CooldownScope::User,
        }
    }

    /// Returns the command name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the help text.
    pub fn help(&self) -> &str {
        &self.help
    }

    /// Returns the category, if any.
    pub fn category(&self) -> Option<&Category> {
        self.category.as_ref()
    }

    /// Whether only owners may use this command.
    pub fn is_owner_only(&self) -> bool {
        self.owner_only
    }

    /// Whether the command is only offered inside guilds.
    pub fn is_guild_only(&self) -> bool {
        self.guild_only
    }

    /// The guild the command is registered to, for guild-scoped commands.
    pub fn guild_id(&self) -> Option<u64> {
        self.guild_id
    }

    /// Returns the cooldown in seconds; `0` means none.
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }

    /// Returns how widely the cooldown applies.
    pub fn cooldown_scope(&self) -> CooldownScope {
        self.cooldown_scope
    }

    /// Runs the handler unless a restriction or cooldown holds it back.
    ///
    /// Refuses an owner-only command invoked by anyone else and a guild-only
    /// command invoked outside a guild. Cooldowns work as for
    /// [`Command::run`].
    pub async fn run(&self, ctx: SlashContext) -> anyhow::Result<RunStatus> {
        if self.owner_only && !ctx.is_owner() {
            debug!(command = %self.name, user = ctx.event().author_id, "Owner-only command refused");
            return Ok(RunStatus::Refused);
        }
        if self.guild_only && ctx.event().guild_id.is_none() {
            debug!(command = %self.name, "Guild-only command used outside a guild");
            return Ok(RunStatus::Refused);
        }
        if self.cooldown > 0 && !ctx.is_owner() {
            let key = ctx.cooldown_key(self.cooldown_scope);
            if let Some(remaining) = claim_cooldown(ctx.cooldowns(), key, self.cooldown) {
                return Ok(RunStatus::CoolingDown { remaining });
            }
        }
        self.handler.run(ctx).await?;
        Ok(RunStatus::Completed)
    }
}

impl Indexed for SlashCommand {
    fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for SlashCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashCommand")
            .field("name", &self.name)
            .field("guild_only", &self.guild_only)
            .field("guild_id", &self.guild_id)
            .field("cooldown", &self.cooldown)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SlashCommand`].
#[derive(Debug, Clone)]
pub struct SlashCommandBuilder {
    name: String,
    help: String,
    category: Option<Category>,
    owner_only: bool,
    guild_only: bool,
    guild_id: Option<u64>,
    cooldown: u32,
    cooldown_scope: CooldownScope,
}

impl SlashCommandBuilder {
    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = help.into();
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    /// Restricts the command to owners.
    pub fn owner_only(mut self, owner_only: bool) -> Self {
        self.owner_only = owner_only;
        self
    }

    /// Offers the command only inside guilds.
    pub fn guild_only(mut self, guild_only: bool) -> Self {
        self.guild_only = guild_only;
        self
    }

    /// Scopes the command to a single guild.
    pub fn guild_id(mut self, guild_id: u64) -> Self {
        self.guild_only = true;
        self.guild_id = Some(guild_id);
        self
    }

    /// Sets the cooldown in seconds; `0` disables it.
    pub fn cooldown(mut self, seconds: u32) -> Self {
        self.cooldown = seconds;
        self
    }

    /// Sets how widely the cooldown applies. Defaults to
    /// [`CooldownScope::User`].
    pub fn cooldown_scope(mut self, scope: CooldownScope) -> Self {
        self.cooldown_scope = scope;
        self
    }

    /// Attaches the handler and finishes the command.
    pub fn handler<H: SlashHandler>(self, handler: H) -> SlashCommand {
        SlashCommand {
            name: self.name,
            help: self.help,
            category: self.category,
            owner_only: self.owner_only,
            guild_only: self.guild_only,
            guild_id: self.guild_id,
            cooldown: self.cooldown,
            cooldown_scope: self.cooldown_scope,
            handler: Arc::new(handler),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_core::{CooldownTracker, MessageEvent};

    fn context(args: &str) -> CommandContext {
        CommandContext::new(
            "!",
            args,
            "ping",
            Arc::new(MessageEvent::new(format!("!ping {args}"))),
            false,
            Arc::new(CooldownTracker::new()),
        )
    }

    #[test]
    fn test_builder_metadata() {
        let command = Command::builder("ping")
            .aliases(["p", "pong"])
            .category(Category::new("Utility"))
            .arguments("[target]")
            .help("Replies with pong")
            .hidden(true)
            .handler(|_ctx: CommandContext| async { anyhow::Ok(()) });

        assert_eq!(command.name(), "ping");
        assert_eq!(command.aliases(), ["p", "pong"]);
        assert_eq!(command.category().map(Category::name), Some("Utility"));
        assert_eq!(command.arguments(), Some("[target]"));
        assert!(command.is_hidden());
        assert!(!command.is_owner_only());
    }

    #[tokio::test]
    async fn test_closure_handler_receives_context() {
        let command = Command::builder("ping").handler(|ctx: CommandContext| async move {
            anyhow::ensure!(ctx.args() == "now", "unexpected args {}", ctx.args());
            Ok(())
        });

        assert!(command.run(context("now")).await.is_ok());
        assert!(command.run(context("later")).await.is_err());
    }

    #[tokio::test]
    async fn test_owner_only_refuses_others() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let command = Command::builder("shutdown")
            .owner_only(true)
            .handler(move |_ctx: CommandContext| {
                let counter = Arc::clone(&counter);
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            });

        assert_eq!(command.run(context("")).await.unwrap(), RunStatus::Refused);
        assert_eq!(runs.load(Ordering::SeqCst), 0);

        let owner_ctx = CommandContext::new(
            "!",
            "",
            "shutdown",
            Arc::new(MessageEvent::new("!shutdown")),
            true,
            Arc::new(CooldownTracker::new()),
        );
        assert_eq!(command.run(owner_ctx).await.unwrap(), RunStatus::Completed);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_repeat_but_not_owners() {
        let cooldowns = Arc::new(CooldownTracker::new());
        let ctx = |author: u64, is_owner: bool| {
            CommandContext::new(
                "!",
                "",
                "roll",
                Arc::new(MessageEvent::new("!roll").with_author(author)),
                is_owner,
                Arc::clone(&cooldowns),
            )
        };
        let command = Command::builder("roll")
            .cooldown(30)
            .handler(|_ctx: CommandContext| async { anyhow::Ok(()) });
        assert_eq!(command.cooldown(), 30);
        assert_eq!(command.cooldown_scope(), CooldownScope::User);

        assert_eq!(command.run(ctx(5, false)).await.unwrap(), RunStatus::Completed);
        assert!(matches!(
            command.run(ctx(5, false)).await.unwrap(),
            RunStatus::CoolingDown { remaining: 1..=30 }
        ));
        assert_eq!(command.run(ctx(6, false)).await.unwrap(), RunStatus::Completed);

        // Owners neither wait for nor start cooldowns.
        assert_eq!(command.run(ctx(1, true)).await.unwrap(), RunStatus::Completed);
        assert_eq!(command.run(ctx(1, true)).await.unwrap(), RunStatus::Completed);
        assert!(cooldowns.expiry("roll|U:1").is_none());
    }

    #[test]
    fn test_slash_guild_id_implies_guild_only() {
        let command = SlashCommand::builder("ban")
            .guild_id(1001)
            .handler(|_ctx: SlashContext| async { anyhow::Ok(()) });
        assert!(command.is_guild_only());
        assert_eq!(command.guild_id(), Some(1001));
        assert!(Indexed::aliases(&command).is_empty());
    }
}
