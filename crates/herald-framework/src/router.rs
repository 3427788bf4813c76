//! The event router.
//!
//! [`EventRouter`] turns one inbound event into at most one handler
//! invocation. A text message goes through these steps:
//!
//! 1. messages from automated accounts are rejected outright
//! 2. the [`PrefixResolver`] finds the prefix, command name and arguments;
//!    no prefix means the message is not a command
//! 3. the help word short-circuits to the help handler without a lookup
//! 4. a message the bot cannot answer in a non-private context is not a
//!    command
//! 5. the name is looked up in the text registry; unknown names are not
//!    commands
//! 6. the listener is notified, the usage counter bumped, the pre-process
//!    predicate consulted and finally the command run: owner-only and
//!    cooldown checks first, then the awaited handler
//!
//! Structured events skip the prefix, help and predicate steps and go
//! straight to the structured registry.
//!
//! ```rust,ignore
//! use herald_framework::{Command, CommandContext, EventRouter};
//!
//! let router = EventRouter::builder()
//!     .prefix("!")
//!     .command(Command::builder("ping").handler(|_ctx: CommandContext| async {
//!         anyhow::Ok(())
//!     }))
//!     .build()?;
//!
//! let outcome = router.route_message(MessageEvent::new("!ping")).await?;
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use parking_lot::RwLock;
use tracing::{Instrument, Level, debug, info, span};

use herald_core::{
    CommandRegistry, CooldownTracker, LinkCache, MessageEvent, RegistryResult, SlashEvent,
    UsageCounter,
};

use crate::command::{BoxedCommandHandler, Command, CommandHandler, RunStatus, SlashCommand};
use crate::context::{CommandContext, SlashContext};
use crate::deletion::{MessageDeleter, delete_responses};
use crate::error::{DispatchError, DispatchResult};
use crate::listener::CommandListener;
use crate::prefix::{MENTION_PREFIX, PrefixResolver, PrefixSource};

/// Predicate run over a message before a matched command's handler.
/// Returning `false` suppresses the handler.
pub type PreProcessFn = Arc<dyn Fn(&MessageEvent) -> bool + Send + Sync>;

/// Default word that triggers the help handler.
pub const DEFAULT_HELP_WORD: &str = "help";

/// What the router did with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// The author is an automated account; nothing else happened.
    Rejected,
    /// The event is not a command invocation.
    NoMatch,
    /// The help handler ran.
    Help,
    /// The command's handler ran to completion.
    Dispatched {
        /// Canonical name of the command.
        command: String,
    },
    /// The command matched but the pre-process predicate held it back.
    Suppressed {
        /// Canonical name of the command.
        command: String,
    },
    /// The command matched but the invoker's cooldown is still running.
    CoolingDown {
        /// Canonical name of the command.
        command: String,
        /// Whole seconds left, rounded up.
        remaining: u32,
    },
}

impl RouteOutcome {
    /// Whether the event was consumed as a command or help request.
    pub fn is_handled(&self) -> bool {
        matches!(
            self,
            Self::Help
                | Self::Dispatched { .. }
                | Self::Suppressed { .. }
                | Self::CoolingDown { .. }
        )
    }
}

// ============================================================================
// Router
// ============================================================================

/// Routes text and structured events to registered commands.
///
/// All state is owned by the router and injected at construction; the
/// cooldown tracker and usage counter are shared through `Arc` so a client
/// can run maintenance on them.
pub struct EventRouter {
    resolver: PrefixResolver,
    textual_prefix: OnceLock<String>,
    use_help: bool,
    help_word: String,
    help: Option<BoxedCommandHandler>,
    pre_process: Option<PreProcessFn>,
    commands: CommandRegistry<Command>,
    slash_commands: CommandRegistry<SlashCommand>,
    cooldowns: Arc<CooldownTracker>,
    uses: Arc<UsageCounter>,
    links: LinkCache<u64, u64>,
    listener: RwLock<Option<Arc<dyn CommandListener>>>,
    owner_id: Option<u64>,
    co_owner_ids: Vec<u64>,
}

impl EventRouter {
    /// Starts configuring a router.
    pub fn builder() -> RouterBuilder {
        RouterBuilder::new()
    }

    // ========================================================================
    // Text Routing
    // ========================================================================

    /// Routes a text message.
    ///
    /// Handler errors are returned as [`DispatchError::Handler`] after the
    /// listener has seen them; everything else is an [`RouteOutcome`].
    pub async fn route_message(&self, event: MessageEvent) -> DispatchResult<RouteOutcome> {
        let span = span!(
            Level::DEBUG,
            "route_message",
            message_id = event.message_id,
            channel_id = event.channel_id
        );
        self.route_message_inner(Arc::new(event))
            .instrument(span)
            .await
    }

    async fn route_message_inner(&self, event: Arc<MessageEvent>) -> DispatchResult<RouteOutcome> {
        if event.author_is_bot {
            debug!(author = event.author_id, "Ignoring message from automated account");
            return Ok(RouteOutcome::Rejected);
        }

        let Some(matched) = self.resolver.resolve(&event) else {
            return Ok(self.not_a_command(&event));
        };
        let prefix = matched.prefix.to_string();
        let name = matched.name.to_string();
        let args = matched.args.to_string();

        if self.use_help
            && let Some(help) = &self.help
            && name.to_lowercase() == self.help_word.to_lowercase()
        {
            debug!(prefix = %prefix, "Help requested");
            let ctx = self.command_context(prefix, args, self.help_word.clone(), &event);
            let listener = self.listener();
            if let Some(listener) = &listener {
                listener.on_command(&ctx, None);
            }
            if let Err(e) = help.run(ctx.clone()).await {
                if let Some(listener) = &listener {
                    listener.on_command_exception(&ctx, None, &e);
                }
                return Err(DispatchError::handler(self.help_word.clone(), e));
            }
            if let Some(listener) = &listener {
                listener.on_completed_command(&ctx, None);
            }
            return Ok(RouteOutcome::Help);
        }

        if !event.context.is_private() && !event.can_post {
            debug!(command = %name, "Cannot reply in this channel, skipping lookup");
            return Ok(self.not_a_command(&event));
        }

        let Some(command) = self.commands.lookup(&name) else {
            return Ok(self.not_a_command(&event));
        };

        let ctx = self.command_context(prefix, args, command.name().to_string(), &event);
        let listener = self.listener();
        if let Some(listener) = &listener {
            listener.on_command(&ctx, Some(&command));
        }
        let uses = self.uses.increment(command.name());

        if let Some(pre_process) = &self.pre_process
            && !pre_process(event.as_ref())
        {
            debug!(command = %command.name(), "Pre-process predicate suppressed command");
            return Ok(RouteOutcome::Suppressed {
                command: command.name().to_string(),
            });
        }

        debug!(command = %command.name(), uses, "Dispatching command");
        match command.run(ctx.clone()).await {
            Ok(RunStatus::CoolingDown { remaining }) => {
                if let Some(listener) = &listener {
                    listener.on_cooldown(&ctx, &command, remaining);
                }
                Ok(RouteOutcome::CoolingDown {
                    command: command.name().to_string(),
                    remaining,
                })
            }
            Ok(RunStatus::Completed | RunStatus::Refused) => {
                if let Some(listener) = &listener {
                    listener.on_completed_command(&ctx, Some(&command));
                }
                Ok(RouteOutcome::Dispatched {
                    command: command.name().to_string(),
                })
            }
            Err(e) => {
                if let Some(listener) = &listener {
                    listener.on_command_exception(&ctx, Some(&command), &e);
                }
                Err(DispatchError::handler(command.name(), e))
            }
        }
    }

    fn not_a_command(&self, event: &MessageEvent) -> RouteOutcome {
        if let Some(listener) = self.listener() {
            listener.on_non_command_message(event);
        }
        RouteOutcome::NoMatch
    }

    fn command_context(
        &self,
        prefix: String,
        args: String,
        command: String,
        event: &Arc<MessageEvent>,
    ) -> CommandContext {
        CommandContext::new(
            prefix,
            args,
            command,
            Arc::clone(event),
            self.is_owner(event.author_id),
            Arc::clone(&self.cooldowns),
        )
    }

    // ========================================================================
    // Structured Routing
    // ========================================================================

    /// Routes a structured interaction by its exact command name.
    pub async fn route_slash(&self, event: SlashEvent) -> DispatchResult<RouteOutcome> {
        let span = span!(
            Level::DEBUG,
            "route_slash",
            interaction_id = event.interaction_id,
            command = %event.name
        );
        self.route_slash_inner(Arc::new(event)).instrument(span).await
    }

    async fn route_slash_inner(&self, event: Arc<SlashEvent>) -> DispatchResult<RouteOutcome> {
        let Some(command) = self.slash_commands.lookup(&event.name) else {
            debug!("Unknown structured command");
            return Ok(RouteOutcome::NoMatch);
        };

        let listener = self.listener();
        if let Some(listener) = &listener {
            listener.on_slash_command(&event, &command);
        }
        let uses = self.uses.increment(command.name());

        let ctx = SlashContext::new(
            Arc::clone(&event),
            self.is_owner(event.author_id),
            Arc::clone(&self.cooldowns),
        );
        debug!(uses, "Dispatching structured command");
        match command.run(ctx.clone()).await {
            Ok(RunStatus::CoolingDown { remaining }) => {
                if let Some(listener) = &listener {
                    listener.on_slash_cooldown(&ctx, &command, remaining);
                }
                Ok(RouteOutcome::CoolingDown {
                    command: command.name().to_string(),
                    remaining,
                })
            }
            Ok(RunStatus::Completed | RunStatus::Refused) => {
                if let Some(listener) = &listener {
                    listener.on_completed_slash_command(&ctx, &command);
                }
                Ok(RouteOutcome::Dispatched {
                    command: command.name().to_string(),
                })
            }
            Err(e) => {
                if let Some(listener) = &listener {
                    listener.on_slash_command_exception(&ctx, &command, &e);
                }
                Err(DispatchError::handler(command.name(), e))
            }
        }
    }

    // ========================================================================
    // Command Administration
    // ========================================================================

    /// Appends a text command.
    pub fn add_command(&self, command: Command) -> RegistryResult<()> {
        let name = command.name().to_string();
        self.commands.append(command)?;
        info!(command = %name, "Registered command");
        Ok(())
    }

    /// Inserts a text command at `index`.
    pub fn insert_command(&self, command: Command, index: usize) -> RegistryResult<()> {
        let name = command.name().to_string();
        self.commands.insert(command, index)?;
        info!(command = %name, index, "Registered command");
        Ok(())
    }

    /// Removes the text command owning `name_or_alias`.
    pub fn remove_command(&self, name_or_alias: &str) -> RegistryResult<Arc<Command>> {
        let removed = self.commands.remove(name_or_alias)?;
        info!(command = %removed.name(), "Removed command");
        Ok(removed)
    }

    /// Appends a structured command.
    pub fn add_slash_command(&self, command: SlashCommand) -> RegistryResult<()> {
        let name = command.name().to_string();
        self.slash_commands.append(command)?;
        info!(command = %name, "Registered structured command");
        Ok(())
    }

    /// Inserts a structured command at `index`.
    pub fn insert_slash_command(&self, command: SlashCommand, index: usize) -> RegistryResult<()> {
        let name = command.name().to_string();
        self.slash_commands.insert(command, index)?;
        info!(command = %name, index, "Registered structured command");
        Ok(())
    }

    /// Removes the structured command named `name`.
    pub fn remove_slash_command(&self, name: &str) -> RegistryResult<Arc<SlashCommand>> {
        let removed = self.slash_commands.remove(name)?;
        info!(command = %removed.name(), "Removed structured command");
        Ok(removed)
    }

    /// Returns the text commands in order.
    pub fn commands(&self) -> Vec<Arc<Command>> {
        self.commands.list()
    }

    /// Returns the structured commands in order.
    pub fn slash_commands(&self) -> Vec<Arc<SlashCommand>> {
        self.slash_commands.list()
    }

    /// Looks up a text command by name or alias.
    pub fn command(&self, name_or_alias: &str) -> Option<Arc<Command>> {
        self.commands.lookup(name_or_alias)
    }

    // ========================================================================
    // Cooldowns and Usage
    // ========================================================================

    /// Returns when the cooldown for `key` ends, if it is still running.
    pub fn cooldown(&self, key: &str) -> Option<Instant> {
        self.cooldowns.expiry(key)
    }

    /// Returns the whole seconds left on the cooldown for `key`, or `0`.
    pub fn remaining_cooldown(&self, key: &str) -> u32 {
        self.cooldowns.remaining(key)
    }

    /// Starts (or restarts) the cooldown for `key`.
    pub fn apply_cooldown(&self, key: impl Into<String>, seconds: u32) {
        self.cooldowns.apply(key, seconds);
    }

    /// Drops every expired cooldown, returning how many were removed.
    pub fn clean_cooldowns(&self) -> usize {
        self.cooldowns.sweep()
    }

    /// Returns the shared cooldown tracker.
    pub fn cooldowns(&self) -> &Arc<CooldownTracker> {
        &self.cooldowns
    }

    /// Returns how many times the named command was invoked.
    pub fn command_uses(&self, name: &str) -> u64 {
        self.uses.get(name)
    }

    /// Returns the shared usage counter.
    pub fn usage(&self) -> &Arc<UsageCounter> {
        &self.uses
    }

    // ========================================================================
    // Linked Deletion
    // ========================================================================

    /// Records that `response` was sent because of `source`.
    pub fn link_messages(&self, source: u64, response: u64) {
        self.links.link(source, response);
    }

    /// Whether linked deletion is enabled (a non-zero cache size).
    pub fn uses_linked_deletion(&self) -> bool {
        self.links.is_enabled()
    }

    /// Handles deletion of `source`, deleting every response linked to it.
    ///
    /// Returns the number of linked responses. Deletion failures are ignored.
    pub async fn on_message_deleted(&self, source: u64, deleter: &dyn MessageDeleter) -> usize {
        let Some(responses) = self.links.consume(&source) else {
            return 0;
        };
        let count = responses.len();
        debug!(source, count, "Deleting linked responses");
        delete_responses(deleter, responses.into_iter().collect()).await;
        count
    }

    // ========================================================================
    // Listener, Prefix and Owners
    // ========================================================================

    /// Installs (or clears) the listener.
    pub fn set_listener(&self, listener: Option<Arc<dyn CommandListener>>) {
        *self.listener.write() = listener;
    }

    /// Returns the installed listener.
    pub fn listener(&self) -> Option<Arc<dyn CommandListener>> {
        self.listener.read().clone()
    }

    /// Returns the prefix to show users.
    pub fn textual_prefix(&self) -> &str {
        self.textual_prefix
            .get()
            .map_or(self.resolver.prefix(), String::as_str)
    }

    /// Returns the prefix resolver.
    pub fn resolver(&self) -> &PrefixResolver {
        &self.resolver
    }

    /// Returns the configured help word.
    pub fn help_word(&self) -> &str {
        &self.help_word
    }

    /// Whether the help word is answered: help is enabled and a help handler
    /// is installed.
    pub fn uses_help(&self) -> bool {
        self.use_help && self.help.is_some()
    }

    /// Called once the bot knows its own display name.
    ///
    /// With a mention prefix the textual prefix becomes `"@<name> "`. Only the
    /// first call has an effect; returns whether this call changed it.
    pub fn on_ready(&self, self_name: &str) -> bool {
        let text = if self.resolver.prefix() == MENTION_PREFIX {
            format!("@{self_name} ")
        } else {
            self.resolver.prefix().to_string()
        };
        let changed = self.textual_prefix.set(text).is_ok();
        if changed {
            info!(prefix = %self.textual_prefix(), "Router ready");
        }
        changed
    }

    /// Whether `user_id` is the owner or a co-owner.
    pub fn is_owner(&self, user_id: u64) -> bool {
        self.owner_id == Some(user_id) || self.co_owner_ids.contains(&user_id)
    }

    /// Returns the owner id, if configured.
    pub fn owner_id(&self) -> Option<u64> {
        self.owner_id
    }

    /// Returns the co-owner ids.
    pub fn co_owner_ids(&self) -> &[u64] {
        &self.co_owner_ids
    }
}

impl fmt::Debug for EventRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventRouter")
            .field("resolver", &self.resolver)
            .field("help_word", &self.help_word)
            .field("commands", &self.commands.len())
            .field("slash_commands", &self.slash_commands.len())
            .field("links", &self.links)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Builder
// ============================================================================

/// Configures and builds an [`EventRouter`].
pub struct RouterBuilder {
    resolver: PrefixResolver,
    use_help: bool,
    help_word: String,
    help: Option<BoxedCommandHandler>,
    pre_process: Option<PreProcessFn>,
    commands: Vec<Command>,
    slash_commands: Vec<SlashCommand>,
    cooldowns: Option<Arc<CooldownTracker>>,
    uses: Option<Arc<UsageCounter>>,
    linked_cache_size: usize,
    listener: Option<Arc<dyn CommandListener>>,
    owner_id: Option<u64>,
    co_owner_ids: Vec<u64>,
}

impl RouterBuilder {
    /// Creates a builder with the mention prefix and help enabled.
    pub fn new() -> Self {
        Self {
            resolver: PrefixResolver::new(MENTION_PREFIX),
            use_help: true,
            help_word: DEFAULT_HELP_WORD.to_string(),
            help: None,
            pre_process: None,
            commands: Vec::new(),
            slash_commands: Vec::new(),
            cooldowns: None,
            uses: None,
            linked_cache_size: 0,
            listener: None,
            owner_id: None,
            co_owner_ids: Vec::new(),
        }
    }

    /// Sets the default prefix. Empty means the mention prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.resolver = self.resolver.default_prefix(prefix);
        self
    }

    /// Sets the alternate prefix.
    pub fn alt_prefix(mut self, alt_prefix: impl Into<String>) -> Self {
        self.resolver = self.resolver.alt_prefix(alt_prefix);
        self
    }

    /// Sets the static prefix list.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolver = self.resolver.prefixes(prefixes);
        self
    }

    /// Sets the custom prefix function.
    pub fn prefix_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&MessageEvent) -> Option<String> + Send + Sync + 'static,
    {
        self.resolver = self.resolver.prefix_fn(f);
        self
    }

    /// Sets the per-guild prefix source.
    pub fn prefix_source(mut self, source: Arc<dyn PrefixSource>) -> Self {
        self.resolver = self.resolver.source(source);
        self
    }

    /// Enables or disables the help word.
    pub fn use_help(mut self, use_help: bool) -> Self {
        self.use_help = use_help;
        self
    }

    /// Sets the help word. An empty word keeps the default.
    pub fn help_word(mut self, help_word: impl Into<String>) -> Self {
        let help_word = help_word.into();
        if !help_word.is_empty() {
            self.help_word = help_word;
        }
        self
    }

    /// Sets the handler run for the help word.
    pub fn help_handler<H: CommandHandler>(mut self, handler: H) -> Self {
        self.help = Some(Arc::new(handler));
        self
    }

    /// Sets the pre-process predicate.
    pub fn pre_process<F>(mut self, f: F) -> Self
    where
        F: Fn(&MessageEvent) -> bool + Send + Sync + 'static,
    {
        self.pre_process = Some(Arc::new(f));
        self
    }

    /// Adds a text command, registered in call order.
    pub fn command(mut self, command: Command) -> Self {
        self.commands.push(command);
        self
    }

    /// Adds a structured command, registered in call order.
    pub fn slash_command(mut self, command: SlashCommand) -> Self {
        self.slash_commands.push(command);
        self
    }

    /// Shares an existing cooldown tracker.
    pub fn cooldowns(mut self, cooldowns: Arc<CooldownTracker>) -> Self {
        self.cooldowns = Some(cooldowns);
        self
    }

    /// Shares an existing usage counter.
    pub fn usage(mut self, uses: Arc<UsageCounter>) -> Self {
        self.uses = Some(uses);
        self
    }

    /// Sets how many source messages linked deletion remembers; `0` disables it.
    pub fn linked_cache_size(mut self, size: usize) -> Self {
        self.linked_cache_size = size;
        self
    }

    /// Sets the listener.
    pub fn listener(mut self, listener: Arc<dyn CommandListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Sets the owner id.
    pub fn owner_id(mut self, owner_id: u64) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    /// Sets the co-owner ids.
    pub fn co_owner_ids(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.co_owner_ids = ids.into_iter().collect();
        self
    }

    /// Builds the router, registering the initial commands.
    ///
    /// Fails on the first name or alias collision among them.
    pub fn build(self) -> RegistryResult<EventRouter> {
        let commands = CommandRegistry::new();
        for command in self.commands {
            commands.append(command)?;
        }
        let slash_commands = CommandRegistry::new();
        for command in self.slash_commands {
            slash_commands.append(command)?;
        }

        if self.use_help && self.help.is_none() {
            debug!(
                help_word = %self.help_word,
                "Help is enabled but no help handler is set; the help word will be looked up as a command"
            );
        }

        debug!(
            prefix = %self.resolver.prefix(),
            commands = commands.len(),
            slash_commands = slash_commands.len(),
            "Router built"
        );

        Ok(EventRouter {
            resolver: self.resolver,
            textual_prefix: OnceLock::new(),
            use_help: self.use_help,
            help_word: self.help_word,
            help: self.help,
            pre_process: self.pre_process,
            commands,
            slash_commands,
            cooldowns: self.cooldowns.unwrap_or_default(),
            uses: self.uses.unwrap_or_default(),
            links: LinkCache::new(self.linked_cache_size),
            listener: RwLock::new(self.listener),
            owner_id: self.owner_id,
            co_owner_ids: self.co_owner_ids,
        })
    }
}

impl Default for RouterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RouterBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterBuilder")
            .field("resolver", &self.resolver)
            .field("use_help", &self.use_help)
            .field("help_word", &self.help_word)
            .field("commands", &self.commands.len())
            .field("linked_cache_size", &self.linked_cache_size)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::SlashCommandBuilder;
    use crate::context::CooldownScope;
    use herald_core::RegistryError;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn take(&self) -> Vec<String> {
            std::mem::take(&mut *self.events.lock())
        }
    }

    impl CommandListener for Recorder {
        fn on_command(&self, ctx: &CommandContext, command: Option<&Command>) {
            let name = command.map_or("<help>", Command::name);
            self.events
                .lock()
                .push(format!("command:{name}:{}:{}", ctx.prefix(), ctx.args()));
        }

        fn on_completed_command(&self, _ctx: &CommandContext, command: Option<&Command>) {
            let name = command.map_or("<help>", Command::name);
            self.events.lock().push(format!("completed:{name}"));
        }

        fn on_command_exception(
            &self,
            _ctx: &CommandContext,
            command: Option<&Command>,
            error: &anyhow::Error,
        ) {
            let name = command.map_or("<help>", Command::name);
            self.events.lock().push(format!("exception:{name}:{error}"));
        }

        fn on_cooldown(&self, _ctx: &CommandContext, command: &Command, remaining: u32) {
            let bounded = remaining > 0 && remaining <= command.cooldown();
            self.events
                .lock()
                .push(format!("cooldown:{}:{bounded}", command.name()));
        }

        fn on_slash_command(&self, _event: &SlashEvent, command: &SlashCommand) {
            self.events.lock().push(format!("slash:{}", command.name()));
        }

        fn on_completed_slash_command(&self, _ctx: &SlashContext, command: &SlashCommand) {
            self.events
                .lock()
                .push(format!("slash_completed:{}", command.name()));
        }

        fn on_slash_command_exception(
            &self,
            _ctx: &SlashContext,
            command: &SlashCommand,
            error: &anyhow::Error,
        ) {
            self.events
                .lock()
                .push(format!("slash_exception:{}:{error}", command.name()));
        }

        fn on_slash_cooldown(&self, _ctx: &SlashContext, command: &SlashCommand, _remaining: u32) {
            self.events
                .lock()
                .push(format!("slash_cooldown:{}", command.name()));
        }

        fn on_non_command_message(&self, event: &MessageEvent) {
            self.events.lock().push(format!("non_command:{}", event.content));
        }
    }

    fn counting(name: &str, runs: &Arc<AtomicUsize>) -> Command {
        let runs = Arc::clone(runs);
        Command::builder(name).handler(move |_ctx: CommandContext| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(())
            }
        })
    }

    fn router_with(builder: RouterBuilder) -> (EventRouter, Arc<Recorder>) {
        let recorder = Arc::new(Recorder::default());
        let router = builder.listener(recorder.clone()).build().unwrap();
        (router, recorder)
    }

    #[tokio::test]
    async fn test_prefixed_message_dispatches_once() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) =
            router_with(EventRouter::builder().prefix("!").command(counting("ping", &runs)));

        assert_eq!(router.command_uses("ping"), 0);
        let outcome = router.route_message(MessageEvent::new("!ping")).await.unwrap();

        assert_eq!(
            outcome,
            RouteOutcome::Dispatched {
                command: "ping".into()
            }
        );
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(router.command_uses("ping"), 1);
        assert_eq!(recorder.take(), vec!["command:ping:!:", "completed:ping"]);
    }

    #[tokio::test]
    async fn test_mention_help_skips_registry() {
        let help_runs = Arc::new(AtomicUsize::new(0));
        let cmd_runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&help_runs);
        let (router, recorder) = router_with(
            EventRouter::builder()
                .prefix(MENTION_PREFIX)
                .help_word("help")
                .help_handler(move |ctx: CommandContext| {
                    let counter = Arc::clone(&counter);
                    async move {
                        assert_eq!(ctx.args(), "ping");
                        counter.fetch_add(1, Ordering::SeqCst);
                        anyhow::Ok(())
                    }
                })
                // A registered "help" command must not be reached.
                .command(counting("help", &cmd_runs)),
        );

        let event = MessageEvent::new("<@100> HELP ping").with_self_mentions(["<@100>", "<@!100>"]);
        let outcome = router.route_message(event).await.unwrap();

        assert_eq!(outcome, RouteOutcome::Help);
        assert_eq!(help_runs.load(Ordering::SeqCst), 1);
        assert_eq!(cmd_runs.load(Ordering::SeqCst), 0);
        assert_eq!(router.command_uses("help"), 0);
        assert_eq!(
            recorder.take(),
            vec!["command:<help>:<@100>:ping", "completed:<help>"]
        );
    }

    #[tokio::test]
    async fn test_help_handler_error_is_returned() {
        let (router, recorder) = router_with(
            EventRouter::builder()
                .prefix("!")
                .help_word("commands")
                .help_handler(|_ctx: CommandContext| async {
                    Err::<(), _>(anyhow::anyhow!("listing failed"))
                }),
        );

        let err = router
            .route_message(MessageEvent::new("!Commands"))
            .await
            .unwrap_err();

        assert_eq!(err.command(), "commands");
        let DispatchError::Handler { source, .. } = &err;
        assert_eq!(source.to_string(), "listing failed");
        assert_eq!(
            recorder.take(),
            vec!["command:<help>:!:", "exception:<help>:listing failed"]
        );
    }

    #[tokio::test]
    async fn test_help_without_handler_uses_registry() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, _) =
            router_with(EventRouter::builder().prefix("!").command(counting("help", &runs)));
        assert!(!router.uses_help());

        let outcome = router.route_message(MessageEvent::new("!help")).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 1);

        let router = EventRouter::builder()
            .help_handler(|_ctx: CommandContext| async { anyhow::Ok(()) })
            .build()
            .unwrap();
        assert!(router.uses_help());
    }

    #[tokio::test]
    async fn test_help_disabled_falls_through_to_registry() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, _) = router_with(
            EventRouter::builder()
                .prefix("!")
                .use_help(false)
                .help_handler(|_ctx: CommandContext| async { anyhow::Ok(()) })
                .command(counting("help", &runs)),
        );

        let outcome = router.route_message(MessageEvent::new("!help")).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unprefixed_message_is_non_command() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) =
            router_with(EventRouter::builder().prefix("!").command(counting("ping", &runs)));

        let outcome = router.route_message(MessageEvent::new("ping")).await.unwrap();

        assert_eq!(outcome, RouteOutcome::NoMatch);
        assert_eq!(recorder.take(), vec!["non_command:ping"]);
        assert_eq!(router.command_uses("ping"), 0);
        assert!(router.usage().snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_name_and_empty_remainder_are_non_commands() {
        let (router, recorder) = router_with(EventRouter::builder().prefix("!"));

        let outcome = router.route_message(MessageEvent::new("!nope")).await.unwrap();
        assert_eq!(outcome, RouteOutcome::NoMatch);
        let outcome = router.route_message(MessageEvent::new("!  ")).await.unwrap();
        assert_eq!(outcome, RouteOutcome::NoMatch);
        assert_eq!(recorder.take(), vec!["non_command:!nope", "non_command:!  "]);
    }

    #[tokio::test]
    async fn test_bot_author_is_rejected_silently() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) =
            router_with(EventRouter::builder().prefix("!").command(counting("ping", &runs)));

        let outcome = router
            .route_message(MessageEvent::new("!ping").from_bot(true))
            .await
            .unwrap();

        assert_eq!(outcome, RouteOutcome::Rejected);
        assert!(recorder.take().is_empty());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_cannot_post_outside_private() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) =
            router_with(EventRouter::builder().prefix("!").command(counting("ping", &runs)));

        let muted = MessageEvent::new("!ping").in_guild(1).with_can_post(false);
        assert_eq!(router.route_message(muted).await.unwrap(), RouteOutcome::NoMatch);
        assert_eq!(recorder.take(), vec!["non_command:!ping"]);

        let private = MessageEvent::new("!ping").in_private().with_can_post(false);
        assert!(router.route_message(private).await.unwrap().is_handled());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pre_process_suppresses_but_counts() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) = router_with(
            EventRouter::builder()
                .prefix("!")
                .pre_process(|event: &MessageEvent| event.author_id != 13)
                .command(counting("ping", &runs)),
        );

        let outcome = router
            .route_message(MessageEvent::new("!ping").with_author(13))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RouteOutcome::Suppressed {
                command: "ping".into()
            }
        );
        assert!(outcome.is_handled());
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(router.command_uses("ping"), 1);
        assert_eq!(recorder.take(), vec!["command:ping:!:"]);
    }

    #[tokio::test]
    async fn test_handler_error_is_returned() {
        let (router, recorder) = router_with(
            EventRouter::builder().prefix("!").command(
                Command::builder("fail")
                    .alias("f")
                    .handler(|_ctx: CommandContext| async {
                        Err::<(), _>(anyhow::anyhow!("boom"))
                    }),
            ),
        );

        let err = router
            .route_message(MessageEvent::new("!F now"))
            .await
            .unwrap_err();

        assert_eq!(err.command(), "fail");
        assert_eq!(router.command_uses("fail"), 1);
        assert!(router.command("f").is_some());
        assert_eq!(recorder.take(), vec!["command:fail:!:now", "exception:fail:boom"]);
    }

    #[tokio::test]
    async fn test_slash_route() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let (router, recorder) = router_with(EventRouter::builder().slash_command(
            SlashCommand::builder("ban").handler(move |ctx: SlashContext| {
                let counter = Arc::clone(&counter);
                async move {
                    assert_eq!(ctx.event().name, "ban");
                    counter.fetch_add(1, Ordering::SeqCst);
                    anyhow::Ok(())
                }
            }),
        ));

        let outcome = router.route_slash(SlashEvent::new("ban")).await.unwrap();
        assert!(outcome.is_handled());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(router.command_uses("ban"), 1);

        let outcome = router.route_slash(SlashEvent::new("kick")).await.unwrap();
        assert_eq!(outcome, RouteOutcome::NoMatch);
        assert_eq!(recorder.take(), vec!["slash:ban", "slash_completed:ban"]);
    }

    fn counting_slash(builder: SlashCommandBuilder, runs: &Arc<AtomicUsize>) -> SlashCommand {
        let runs = Arc::clone(runs);
        builder.handler(move |_ctx: SlashContext| {
            let runs = Arc::clone(&runs);
            async move {
                runs.fetch_add(1, Ordering::SeqCst);
                anyhow::Ok(())
            }
        })
    }

    #[tokio::test]
    async fn test_slash_handler_error_is_returned() {
        let (router, recorder) = router_with(EventRouter::builder().slash_command(
            SlashCommand::builder("ban")
                .handler(|_ctx: SlashContext| async { Err::<(), _>(anyhow::anyhow!("no perms")) }),
        ));

        let err = router.route_slash(SlashEvent::new("ban")).await.unwrap_err();
        assert_eq!(err.command(), "ban");
        let DispatchError::Handler { source, .. } = &err;
        assert_eq!(source.to_string(), "no perms");
        assert_eq!(router.command_uses("ban"), 1);
        assert_eq!(recorder.take(), vec!["slash:ban", "slash_exception:ban:no perms"]);
    }

    #[tokio::test]
    async fn test_slash_owner_only_and_guild_only_finish_silently() {
        let owner_runs = Arc::new(AtomicUsize::new(0));
        let guild_runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) = router_with(
            EventRouter::builder()
                .owner_id(1)
                .slash_command(counting_slash(
                    SlashCommand::builder("shutdown").owner_only(true),
                    &owner_runs,
                ))
                .slash_command(counting_slash(
                    SlashCommand::builder("ban").guild_only(true),
                    &guild_runs,
                )),
        );

        let outcome = router
            .route_slash(SlashEvent::new("shutdown").with_author(2))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RouteOutcome::Dispatched {
                command: "shutdown".into()
            }
        );
        assert_eq!(owner_runs.load(Ordering::SeqCst), 0);
        router
            .route_slash(SlashEvent::new("shutdown").with_author(1))
            .await
            .unwrap();
        assert_eq!(owner_runs.load(Ordering::SeqCst), 1);

        let outcome = router.route_slash(SlashEvent::new("ban")).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));
        assert_eq!(guild_runs.load(Ordering::SeqCst), 0);
        router
            .route_slash(SlashEvent::new("ban").in_guild(1001))
            .await
            .unwrap();
        assert_eq!(guild_runs.load(Ordering::SeqCst), 1);

        // Refused invocations still count as uses.
        assert_eq!(router.command_uses("shutdown"), 2);
        assert_eq!(router.command_uses("ban"), 2);
        assert_eq!(recorder.take().len(), 8);
    }

    #[tokio::test]
    async fn test_cooldown_blocks_repeat_within_window() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let (router, recorder) = router_with(
            EventRouter::builder().prefix("!").command(
                Command::builder("ping")
                    .cooldown(30)
                    .handler(move |_ctx: CommandContext| {
                        let counter = Arc::clone(&counter);
                        async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            anyhow::Ok(())
                        }
                    }),
            ),
        );
        let ping = |author: u64| MessageEvent::new("!ping").with_author(author);

        let outcome = router.route_message(ping(5)).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));

        let outcome = router.route_message(ping(5)).await.unwrap();
        let RouteOutcome::CoolingDown { command, remaining } = outcome else {
            panic!("expected a cooldown, got {outcome:?}");
        };
        assert_eq!(command, "ping");
        assert!(remaining > 0 && remaining <= 30);
        assert!(router.remaining_cooldown("ping|U:5") > 0);

        // A different user is not affected.
        let outcome = router.route_message(ping(6)).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));

        // Once the window has passed the command runs again.
        router.apply_cooldown("ping|U:5", 0);
        let outcome = router.route_message(ping(5)).await.unwrap();
        assert!(matches!(outcome, RouteOutcome::Dispatched { .. }));

        assert_eq!(runs.load(Ordering::SeqCst), 3);
        assert_eq!(router.command_uses("ping"), 4);
        assert_eq!(
            recorder.take(),
            vec![
                "command:ping:!:",
                "completed:ping",
                "command:ping:!:",
                "cooldown:ping:true",
                "command:ping:!:",
                "completed:ping",
                "command:ping:!:",
                "completed:ping",
            ]
        );
    }

    #[tokio::test]
    async fn test_guild_scoped_cooldown_is_shared_and_owners_skip_it() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, _) = router_with(
            EventRouter::builder().prefix("!").owner_id(1).command(
                Command::builder("raid")
                    .cooldown(60)
                    .cooldown_scope(CooldownScope::Guild)
                    .handler({
                        let runs = Arc::clone(&runs);
                        move |_ctx: CommandContext| {
                            let runs = Arc::clone(&runs);
                            async move {
                                runs.fetch_add(1, Ordering::SeqCst);
                                anyhow::Ok(())
                            }
                        }
                    }),
            ),
        );
        let raid = |author: u64, guild: u64| {
            MessageEvent::new("!raid").with_author(author).in_guild(guild)
        };

        assert!(matches!(
            router.route_message(raid(5, 10)).await.unwrap(),
            RouteOutcome::Dispatched { .. }
        ));
        assert!(matches!(
            router.route_message(raid(6, 10)).await.unwrap(),
            RouteOutcome::CoolingDown { .. }
        ));
        assert!(matches!(
            router.route_message(raid(6, 11)).await.unwrap(),
            RouteOutcome::Dispatched { .. }
        ));
        assert!(matches!(
            router.route_message(raid(1, 10)).await.unwrap(),
            RouteOutcome::Dispatched { .. }
        ));
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_slash_cooldown() {
        let runs = Arc::new(AtomicUsize::new(0));
        let (router, recorder) = router_with(EventRouter::builder().slash_command(counting_slash(
            SlashCommand::builder("roll").cooldown(10),
            &runs,
        )));

        router
            .route_slash(SlashEvent::new("roll").with_author(5))
            .await
            .unwrap();
        let outcome = router
            .route_slash(SlashEvent::new("roll").with_author(5))
            .await
            .unwrap();

        assert!(matches!(outcome, RouteOutcome::CoolingDown { remaining: 1..=10, .. }));
        assert!(outcome.is_handled());
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(
            recorder.take(),
            vec!["slash:roll", "slash_completed:roll", "slash:roll", "slash_cooldown:roll"]
        );
    }

    #[tokio::test]
    async fn test_text_and_slash_share_usage_counts() {
        let runs = Arc::new(AtomicUsize::new(0));
        let router = EventRouter::builder()
            .prefix("!")
            .command(counting("ping", &runs))
            .slash_command(
                SlashCommand::builder("ping").handler(|_ctx: SlashContext| async { anyhow::Ok(()) }),
            )
            .build()
            .unwrap();

        router.route_message(MessageEvent::new("!ping")).await.unwrap();
        router.route_slash(SlashEvent::new("ping")).await.unwrap();
        assert_eq!(router.command_uses("ping"), 2);
    }

    #[tokio::test]
    async fn test_commands_added_and_removed_at_runtime() {
        let runs = Arc::new(AtomicUsize::new(0));
        let router = EventRouter::builder().prefix("!").build().unwrap();

        router.add_command(counting("a", &runs)).unwrap();
        router.insert_command(counting("b", &runs), 0).unwrap();
        let names: Vec<_> = router.commands().iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["b", "a"]);

        assert_eq!(
            router.insert_command(counting("c", &runs), 5).unwrap_err(),
            RegistryError::InvalidIndex { index: 5, len: 2 }
        );
        assert!(matches!(
            router.add_command(counting("A", &runs)),
            Err(RegistryError::DuplicateKey(_))
        ));

        router.remove_command("b").unwrap();
        assert_eq!(
            router.route_message(MessageEvent::new("!b")).await.unwrap(),
            RouteOutcome::NoMatch
        );
        assert!(router.route_message(MessageEvent::new("!a")).await.unwrap().is_handled());
        assert!(matches!(
            router.remove_command("b"),
            Err(RegistryError::NotFound(_))
        ));
    }

    #[test]
    fn test_duplicate_initial_commands_fail_build() {
        let runs = Arc::new(AtomicUsize::new(0));
        let result = EventRouter::builder()
            .command(counting("ping", &runs))
            .command(counting("PING", &runs))
            .build();
        assert!(matches!(result, Err(RegistryError::DuplicateKey(_))));
    }

    #[test]
    fn test_textual_prefix_updates_once() {
        let router = EventRouter::builder().build().unwrap();
        assert_eq!(router.textual_prefix(), MENTION_PREFIX);
        assert!(router.on_ready("Herald"));
        assert_eq!(router.textual_prefix(), "@Herald ");
        assert!(!router.on_ready("Other"));
        assert_eq!(router.textual_prefix(), "@Herald ");

        let router = EventRouter::builder().prefix("!").build().unwrap();
        router.on_ready("Herald");
        assert_eq!(router.textual_prefix(), "!");
    }

    #[test]
    fn test_owners_and_cooldowns() {
        let router = EventRouter::builder()
            .owner_id(1)
            .co_owner_ids([2, 3])
            .build()
            .unwrap();
        assert!(router.is_owner(1));
        assert!(router.is_owner(3));
        assert!(!router.is_owner(4));

        router.apply_cooldown("ping|U:4", 10);
        let remaining = router.remaining_cooldown("ping|U:4");
        assert!(remaining > 0 && remaining <= 10);
        assert!(router.cooldown("ping|U:4").is_some());
        router.apply_cooldown("ping|U:5", 0);
        assert_eq!(router.remaining_cooldown("ping|U:5"), 0);
        assert_eq!(router.clean_cooldowns(), 0);
    }

    #[tokio::test]
    async fn test_linked_deletion() {
        struct Deleter(Mutex<Vec<u64>>);

        #[async_trait::async_trait]
        impl MessageDeleter for Deleter {
            fn can_bulk_delete(&self) -> bool {
                false
            }

            async fn bulk_delete(&self, _ids: Vec<u64>) -> anyhow::Result<()> {
                unreachable!("bulk deletion not allowed")
            }

            async fn delete(&self, id: u64) -> anyhow::Result<()> {
                self.0.lock().push(id);
                Ok(())
            }
        }

        let router = EventRouter::builder().linked_cache_size(8).build().unwrap();
        assert!(router.uses_linked_deletion());
        router.link_messages(1, 10);
        router.link_messages(1, 11);

        let deleter = Deleter(Mutex::new(Vec::new()));
        assert_eq!(router.on_message_deleted(1, &deleter).await, 2);
        assert_eq!(router.on_message_deleted(1, &deleter).await, 0);

        let mut deleted = deleter.0.lock().clone();
        deleted.sort_unstable();
        assert_eq!(deleted, vec![10, 11]);
    }
}
