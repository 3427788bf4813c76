//! Invocation contexts handed to command handlers.
//!
//! The router builds one context per dispatched invocation:
//!
//! - [`CommandContext`] for text commands and the help path, carrying the
//!   matched prefix, the unparsed argument string and the original event
//! - [`SlashContext`] for structured commands, carrying the interaction
//!
//! Both are cheap to clone (the event sits behind an `Arc`) and expose the
//! shared [`CooldownTracker`] so handlers can rate-limit themselves with
//! [`CooldownScope`]-derived keys.

use std::fmt;
use std::sync::Arc;

use herald_core::{ContextKind, CooldownTracker, MessageEvent, SlashEvent};

use crate::args::shell_split;

// ============================================================================
// Cooldown Scope
// ============================================================================

/// How widely a command's cooldown applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CooldownScope {
    /// Per invoking user, everywhere.
    User,
    /// Per channel, shared by every user in it.
    Channel,
    /// Per user within one channel.
    UserChannel,
    /// Per guild; falls back to the channel outside guilds.
    Guild,
    /// Per user within one guild; falls back to the channel outside guilds.
    UserGuild,
    /// One cooldown shared by everyone.
    Global,
}

impl CooldownScope {
    /// Builds the cooldown key for `command` invoked by `user` in the given place.
    pub fn key(self, command: &str, user: u64, channel: u64, guild: Option<u64>) -> String {
        match (self, guild) {
            (Self::User, _) => format!("{command}|U:{user}"),
            (Self::Channel, _) | (Self::Guild, None) => format!("{command}|C:{channel}"),
            (Self::UserChannel, _) | (Self::UserGuild, None) => {
                format!("{command}|U:{user}|C:{channel}")
            }
            (Self::Guild, Some(guild)) => format!("{command}|G:{guild}"),
            (Self::UserGuild, Some(guild)) => format!("{command}|U:{user}|G:{guild}"),
            (Self::Global, _) => format!("{command}|globally"),
        }
    }
}

// ============================================================================
// Text Command Context
// ============================================================================

/// Everything a text command handler gets to see about its invocation.
#[derive(Clone)]
pub struct CommandContext {
    prefix: String,
    args: String,
    command: String,
    event: Arc<MessageEvent>,
    is_owner: bool,
    cooldowns: Arc<CooldownTracker>,
}

impl CommandContext {
    /// Creates a context. The router does this for every dispatch; handlers
    /// under test can build their own.
    pub fn new(
        prefix: impl Into<String>,
        args: impl Into<String>,
        command: impl Into<String>,
        event: Arc<MessageEvent>,
        is_owner: bool,
        cooldowns: Arc<CooldownTracker>,
    ) -> Self {
        Self {
            prefix: prefix.into(),
            args: args.into(),
            command: command.into(),
            event,
            is_owner,
            cooldowns,
        }
    }

    /// The exact prefix text that matched, as it appeared in the message.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The argument string following the command name, or `""`.
    pub fn args(&self) -> &str {
        &self.args
    }

    /// The canonical name of the invoked command (the help word on the help path).
    pub fn command_name(&self) -> &str {
        &self.command
    }

    /// The event that triggered this invocation.
    pub fn event(&self) -> &MessageEvent {
        &self.event
    }

    /// Whether the author is the owner or a co-owner.
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    /// Whether the message was posted in a direct conversation.
    pub fn is_private(&self) -> bool {
        self.event.context == ContextKind::Private
    }

    /// The shared cooldown tracker.
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Builds this invocation's cooldown key for the given scope.
    pub fn cooldown_key(&self, scope: CooldownScope) -> String {
        scope.key(
            &self.command,
            self.event.author_id,
            self.event.channel_id,
            self.event.guild_id,
        )
    }

    /// Shell-style splits the argument string (quotes group words).
    pub fn split_args(&self) -> Vec<String> {
        shell_split(&self.args)
    }

    /// Parses the argument string into a clap command.
    ///
    /// The command name is used as the binary name, so clap's usage and help
    /// output reads naturally.
    #[cfg(feature = "clap")]
    pub fn parse_args<T: clap::Parser>(&self) -> Result<T, clap::Error> {
        T::try_parse_from(std::iter::once(self.command.clone()).chain(self.split_args()))
    }
}

impl fmt::Debug for CommandContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("prefix", &self.prefix)
            .field("command", &self.command)
            .field("args", &self.args)
            .field("message_id", &self.event.message_id)
            .field("is_owner", &self.is_owner)
            .finish()
    }
}

// ============================================================================
// Structured Command Context
// ============================================================================

/// Everything a structured command handler gets to see about its invocation.
#[derive(Clone)]
pub struct SlashContext {
    event: Arc<SlashEvent>,
    is_owner: bool,
    cooldowns: Arc<CooldownTracker>,
}

impl SlashContext {
    /// Creates a context.
    pub fn new(event: Arc<SlashEvent>, is_owner: bool, cooldowns: Arc<CooldownTracker>) -> Self {
        Self {
            event,
            is_owner,
            cooldowns,
        }
    }

    /// The interaction that triggered this invocation.
    pub fn event(&self) -> &SlashEvent {
        &self.event
    }

    /// Whether the invoking user is the owner or a co-owner.
    pub fn is_owner(&self) -> bool {
        self.is_owner
    }

    /// The shared cooldown tracker.
    pub fn cooldowns(&self) -> &CooldownTracker {
        &self.cooldowns
    }

    /// Builds this invocation's cooldown key for the given scope.
    pub fn cooldown_key(&self, scope: CooldownScope) -> String {
        scope.key(
            &self.event.name,
            self.event.author_id,
            self.event.channel_id,
            self.event.guild_id,
        )
    }
}

impl fmt::Debug for SlashContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlashContext")
            .field("command", &self.event.name)
            .field("interaction_id", &self.event.interaction_id)
            .field("is_owner", &self.is_owner)
            .finish()
    }
}
