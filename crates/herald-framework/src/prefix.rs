//! Prefix resolution for text messages.
//!
//! A [`PrefixResolver`] holds every configured prefix source and decides
//! whether a raw message starts with one of them. Sources are tried in a
//! fixed order and the first match wins:
//!
//! 1. the bot's own mention, only when the default or alternate prefix is
//!    [`MENTION_PREFIX`]
//! 2. the custom resolver function, matched exactly
//! 3. the default prefix, ignoring case
//! 4. the alternate prefix, ignoring case
//! 5. each static prefix in order, ignoring case
//! 6. each per-guild prefix from the [`PrefixSource`] in order, ignoring case
//!
//! The text after the matched prefix is then split into a command name and
//! an argument string with [`split_command`].

use std::fmt;
use std::sync::Arc;

use herald_core::{ContextKind, MessageEvent};

use crate::args::split_command;

/// Prefix value meaning "respond to the bot's own mention".
pub const MENTION_PREFIX: &str = "@mention";

/// Custom prefix function. It is trusted to normalize, so its result is
/// matched case-sensitively.
pub type PrefixFn = Arc<dyn Fn(&MessageEvent) -> Option<String> + Send + Sync>;

/// Per-guild prefix lookup, usually backed by a settings store.
pub trait PrefixSource: Send + Sync {
    /// Returns the extra prefixes configured for a guild, in priority order.
    fn prefixes(&self, guild_id: u64) -> Vec<String>;
}

impl<F> PrefixSource for F
where
    F: Fn(u64) -> Vec<String> + Send + Sync,
{
    fn prefixes(&self, guild_id: u64) -> Vec<String> {
        self(guild_id)
    }
}

/// A successful prefix match, borrowing from the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrefixMatch<'a> {
    /// The prefix exactly as it appears in the message.
    pub prefix: &'a str,
    /// Byte offset at which the remainder begins.
    pub offset: usize,
    /// The command name; empty when nothing followed the prefix.
    pub name: &'a str,
    /// Everything after the command name, or `""`.
    pub args: &'a str,
}

/// Matches messages against the configured prefixes.
#[derive(Clone)]
pub struct PrefixResolver {
    prefix: String,
    alt_prefix: Option<String>,
    prefixes: Vec<String>,
    prefix_fn: Option<PrefixFn>,
    source: Option<Arc<dyn PrefixSource>>,
}

impl PrefixResolver {
    /// Creates a resolver with the given default prefix.
    ///
    /// An empty default prefix falls back to [`MENTION_PREFIX`].
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: MENTION_PREFIX.to_string(),
            alt_prefix: None,
            prefixes: Vec::new(),
            prefix_fn: None,
            source: None,
        }
        .default_prefix(prefix)
    }

    /// Replaces the default prefix, keeping every other source.
    pub fn default_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.prefix = if prefix.is_empty() {
            MENTION_PREFIX.to_string()
        } else {
            prefix
        };
        self
    }

    /// Sets the alternate prefix. An empty value means none.
    pub fn alt_prefix(mut self, alt_prefix: impl Into<String>) -> Self {
        let alt_prefix = alt_prefix.into();
        self.alt_prefix = (!alt_prefix.is_empty()).then_some(alt_prefix);
        self
    }

    /// Sets the static prefix list. Empty entries are dropped.
    pub fn prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.prefixes = prefixes
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.is_empty())
            .collect();
        self
    }

    /// Sets the custom prefix function.
    pub fn prefix_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&MessageEvent) -> Option<String> + Send + Sync + 'static,
    {
        self.prefix_fn = Some(Arc::new(f));
        self
    }

    /// Sets the per-guild prefix source.
    pub fn source(mut self, source: Arc<dyn PrefixSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Returns the default prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the alternate prefix, if any.
    pub fn alternate(&self) -> Option<&str> {
        self.alt_prefix.as_deref()
    }

    /// Returns the static prefix list.
    pub fn static_prefixes(&self) -> &[String] {
        &self.prefixes
    }

    /// Whether the bot's own mention acts as a prefix.
    pub fn uses_mention(&self) -> bool {
        self.prefix == MENTION_PREFIX || self.alt_prefix.as_deref() == Some(MENTION_PREFIX)
    }

    /// Resolves the prefix of a message and splits the rest.
    ///
    /// Returns `None` when no prefix matches.
    pub fn resolve<'a>(&self, event: &'a MessageEvent) -> Option<PrefixMatch<'a>> {
        let content = event.content.as_str();
        let offset = self.match_offset(event)?;
        let (name, args) = split_command(&content[offset..]);
        Some(PrefixMatch {
            prefix: &content[..offset],
            offset,
            name,
            args,
        })
    }

    fn match_offset(&self, event: &MessageEvent) -> Option<usize> {
        let content = event.content.as_str();

        if self.uses_mention()
            && let Some(form) = event
                .self_mentions
                .iter()
                .find(|form| !form.is_empty() && content.starts_with(form.as_str()))
        {
            return Some(form.len());
        }

        if let Some(prefix_fn) = &self.prefix_fn
            && let Some(prefix) = prefix_fn(event)
            && !prefix.is_empty()
            && content.starts_with(prefix.as_str())
        {
            return Some(prefix.len());
        }

        if self.prefix != MENTION_PREFIX
            && let Some(len) = starts_with_ignore_case(content, &self.prefix)
        {
            return Some(len);
        }

        if let Some(alt) = self.alt_prefix.as_deref()
            && alt != MENTION_PREFIX
            && let Some(len) = starts_with_ignore_case(content, alt)
        {
            return Some(len);
        }

        if let Some(len) = self
            .prefixes
            .iter()
            .find_map(|prefix| starts_with_ignore_case(content, prefix))
        {
            return Some(len);
        }

        if event.context == ContextKind::Guild
            && let (Some(guild_id), Some(source)) = (event.guild_id, &self.source)
        {
            return source
                .prefixes(guild_id)
                .iter()
                .filter(|prefix| !prefix.is_empty())
                .find_map(|prefix| starts_with_ignore_case(content, prefix));
        }

        None
    }
}

impl fmt::Debug for PrefixResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrefixResolver")
            .field("prefix", &self.prefix)
            .field("alt_prefix", &self.alt_prefix)
            .field("prefixes", &self.prefixes)
            .field("prefix_fn", &self.prefix_fn.is_some())
            .field("source", &self.source.is_some())
            .finish()
    }
}

/// Case-insensitive `starts_with`, returning the byte length of the matched
/// region of `text`.
///
/// Characters are compared one by one, so a character whose lowercase form
/// has a different UTF-8 width never shifts the slice boundary.
fn starts_with_ignore_case(text: &str, prefix: &str) -> Option<usize> {
    if prefix.is_empty() {
        return None;
    }
    let mut chars = text.char_indices();
    let mut end = 0;
    for expected in prefix.chars() {
        let (at, actual) = chars.next()?;
        if actual != expected && !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        end = at + actual.len_utf8();
    }
    Some(end)
}
