//! Inbound event shapes understood by the router.
//!
//! The chat transport is external; adapters translate whatever the platform
//! delivers into one of these two shapes before handing it to the router:
//!
//! - [`MessageEvent`] - a free-text message that may or may not invoke a
//!   command through a prefix
//! - [`SlashEvent`] - a structured interaction that already names the command
//!   it invokes
//!
//! ```rust,ignore
//! use herald_core::{ContextKind, MessageEvent};
//!
//! let event = MessageEvent::new("!ping")
//!     .with_author(42)
//!     .in_guild(1001)
//!     .with_self_mentions(["<@7>", "<@!7>"]);
//! assert_eq!(event.context, ContextKind::Guild);
//! ```

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// ============================================================================
// Context Classification
// ============================================================================

/// Where a message was posted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    /// A direct conversation between a user and the bot.
    Private,
    /// A channel belonging to a guild (server / group).
    #[default]
    Guild,
    /// Anything else the platform delivers (threads, unknown channel types).
    Other,
}

impl ContextKind {
    /// Returns `true` for direct conversations.
    pub fn is_private(self) -> bool {
        matches!(self, Self::Private)
    }
}

impl FromStr for ContextKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.to_lowercase().as_str() {
            "private" | "dm" | "direct" => Self::Private,
            "guild" | "group" | "text" => Self::Guild,
            _ => Self::Other,
        })
    }
}

// ============================================================================
// Text Message Event
// ============================================================================

/// A free-text message delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    /// Platform identifier of this message.
    #[serde(default)]
    pub message_id: u64,
    /// Platform identifier of the author.
    #[serde(default)]
    pub author_id: u64,
    /// Whether the author is a bot or other automated account.
    #[serde(default)]
    pub author_is_bot: bool,
    /// The raw, unrendered message body.
    pub content: String,
    /// Where the message was posted.
    #[serde(default)]
    pub context: ContextKind,
    /// The guild the message was posted in, if any.
    #[serde(default)]
    pub guild_id: Option<u64>,
    /// The channel the message was posted in.
    #[serde(default)]
    pub channel_id: u64,
    /// Every textual form in which the bot itself can be mentioned
    /// (for example `<@ID>` and `<@!ID>`).
    #[serde(default)]
    pub self_mentions: Vec<String>,
    /// Whether the bot is allowed to post in the originating channel.
    #[serde(default = "default_can_post")]
    pub can_post: bool,
}

fn default_can_post() -> bool {
    true
}

impl MessageEvent {
    /// Creates a guild message with the given body and permissive defaults.
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            message_id: 0,
            author_id: 0,
            author_is_bot: false,
            content: content.into(),
            context: ContextKind::Guild,
            guild_id: None,
            channel_id: 0,
            self_mentions: Vec::new(),
            can_post: true,
        }
    }

    /// Sets the message identifier.
    pub fn with_id(mut self, message_id: u64) -> Self {
        self.message_id = message_id;
        self
    }

    /// Sets the author identifier.
    pub fn with_author(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    /// Marks the author as an automated account.
    pub fn from_bot(mut self, is_bot: bool) -> Self {
        self.author_is_bot = is_bot;
        self
    }

    /// Moves the message into a direct conversation.
    pub fn in_private(mut self) -> Self {
        self.context = ContextKind::Private;
        self.guild_id = None;
        self
    }

    /// Moves the message into the given guild.
    pub fn in_guild(mut self, guild_id: u64) -> Self {
        self.context = ContextKind::Guild;
        self.guild_id = Some(guild_id);
        self
    }

    /// Sets the originating channel.
    pub fn in_channel(mut self, channel_id: u64) -> Self {
        self.channel_id = channel_id;
        self
    }

    /// Sets the forms in which the bot can be mentioned.
    pub fn with_self_mentions<I, S>(mut self, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.self_mentions = forms.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether the bot may post in the originating channel.
    pub fn with_can_post(mut self, can_post: bool) -> Self {
        self.can_post = can_post;
        self
    }
}

// ============================================================================
// Structured Command Event
// ============================================================================

/// A structured (slash-style) interaction.
///
/// The platform has already parsed the invocation, so the event carries the
/// exact command name and its typed options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlashEvent {
    /// Platform identifier of this interaction.
    #[serde(default)]
    pub interaction_id: u64,
    /// The invoked command name.
    pub name: String,
    /// Named option values supplied by the user.
    #[serde(default)]
    pub options: Map<String, Value>,
    /// Platform identifier of the invoking user.
    #[serde(default)]
    pub author_id: u64,
    /// The guild the interaction happened in, if any.
    #[serde(default)]
    pub guild_id: Option<u64>,
    /// The channel the interaction happened in.
    #[serde(default)]
    pub channel_id: u64,
}

impl SlashEvent {
    /// Creates an interaction for the named command with no options.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            interaction_id: 0,
            name: name.into(),
            options: Map::new(),
            author_id: 0,
            guild_id: None,
            channel_id: 0,
        }
    }

    /// Adds an option value.
    pub fn with_option(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(name.into(), value.into());
        self
    }

    /// Sets the invoking user.
    pub fn with_author(mut self, author_id: u64) -> Self {
        self.author_id = author_id;
        self
    }

    /// Sets the interaction id.
    pub fn with_id(mut self, interaction_id: u64) -> Self {
        self.interaction_id = interaction_id;
        self
    }

    /// Places the interaction in the given guild.
    pub fn in_guild(mut self, guild_id: u64) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// Sets the originating channel.
    pub fn in_channel(mut self, channel_id: u64) -> Self {
        self.channel_id = channel_id;
        self
    }

    /// Returns the raw value of an option, if supplied.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_kind_from_str() {
        assert_eq!("DM".parse::<ContextKind>(), Ok(ContextKind::Private));
        assert_eq!("guild".parse::<ContextKind>(), Ok(ContextKind::Guild));
        assert_eq!("thread".parse::<ContextKind>(), Ok(ContextKind::Other));
    }

    #[test]
    fn test_message_event_deserialize_defaults() {
        let event: MessageEvent = serde_json::from_str(r#"{"content": "!ping"}"#).unwrap();
        assert_eq!(event.content, "!ping");
        assert_eq!(event.context, ContextKind::Guild);
        assert!(event.can_post);
        assert!(!event.author_is_bot);
        assert!(event.self_mentions.is_empty());
    }

    #[test]
    fn test_in_private_clears_guild() {
        let event = MessageEvent::new("hi").in_guild(5).in_private();
        assert!(event.context.is_private());
        assert_eq!(event.guild_id, None);
    }

    #[test]
    fn test_slash_event_options() {
        let event = SlashEvent::new("ban")
            .with_option("user", 42)
            .with_option("reason", "spam");
        assert_eq!(event.option("user"), Some(&Value::from(42)));
        assert_eq!(event.option("missing"), None);
    }

    #[test]
    fn test_slash_event_location() {
        let event = SlashEvent::new("ban").with_id(9).in_guild(1001).in_channel(7);
        assert_eq!(event.interaction_id, 9);
        assert_eq!(event.guild_id, Some(1001));
        assert_eq!(event.channel_id, 7);
        assert_eq!(SlashEvent::new("ban").guild_id, None);
    }
}
