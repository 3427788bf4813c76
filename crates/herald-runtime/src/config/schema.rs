//! Configuration schema definitions.
//!
//! Everything here is plain serde data so it can be layered by figment.
//! Behaviour that cannot be serialised (handlers, the listener, prefix
//! functions) is supplied through the router builder instead.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use herald_framework::{DEFAULT_HELP_WORD, MENTION_PREFIX};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HeraldConfig {
    /// Command client settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

// =============================================================================
// Client
// =============================================================================

/// Command client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Owner user id, as the platform's decimal id.
    #[serde(default)]
    pub owner_id: Option<String>,

    /// Co-owner user ids.
    #[serde(default)]
    pub co_owner_ids: Vec<String>,

    /// Default prefix; `"@mention"` answers to the bot's mention.
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Alternate prefix.
    #[serde(default)]
    pub alt_prefix: Option<String>,

    /// Additional static prefixes, tried in order.
    #[serde(default)]
    pub prefixes: Vec<String>,

    /// Whether the help word is recognised.
    #[serde(default = "default_true")]
    pub use_help: bool,

    /// The word that triggers the help handler.
    #[serde(default = "default_help_word")]
    pub help_word: String,

    /// Source messages remembered for linked deletion; `0` disables it.
    #[serde(default)]
    pub linked_cache_size: usize,

    /// Seconds between expired-cooldown sweeps; `0` disables the sweeper.
    #[serde(default = "default_sweep_secs")]
    pub cooldown_sweep_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            owner_id: None,
            co_owner_ids: Vec::new(),
            prefix: default_prefix(),
            alt_prefix: None,
            prefixes: Vec::new(),
            use_help: true,
            help_word: default_help_word(),
            linked_cache_size: 0,
            cooldown_sweep_secs: default_sweep_secs(),
        }
    }
}

fn default_prefix() -> String {
    MENTION_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_help_word() -> String {
    DEFAULT_HELP_WORD.to_string()
}

fn default_sweep_secs() -> u64 {
    300
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name as used in filter directives.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to the `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanEventConfig {
    #[serde(default)]
    pub new: bool,
    #[serde(default)]
    pub enter: bool,
    #[serde(default)]
    pub exit: bool,
    #[serde(default)]
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Global log level.
    #[serde(default)]
    pub level: LogLevel,

    /// Line format.
    #[serde(default)]
    pub format: LogFormat,

    /// Destination.
    #[serde(default)]
    pub output: LogOutput,

    /// Log file, required when `output = "file"`.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    /// Include thread ids.
    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    /// Span lifecycle events.
    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `herald_framework = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}
