//! Typed access to structured-command options with caller defaults.
//!
//! Every accessor takes a default that is returned when the option is absent
//! or has an incompatible type, so handlers never have to branch on missing
//! input.
//!
//! ```rust,ignore
//! use herald::prelude::*;
//!
//! let reason = ctx.event().opt_str("reason", "no reason given");
//! let silent = ctx.event().opt_bool("silent", false);
//! ```

use herald_core::SlashEvent;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Accessors for named option values.
pub trait SlashOptions {
    /// Returns the raw option value, if present.
    fn opt_value(&self, name: &str) -> Option<&Value>;

    /// Returns `true` if the option was supplied with a non-null value.
    fn has_opt(&self, name: &str) -> bool {
        self.opt_value(name).is_some_and(|value| !value.is_null())
    }

    /// Returns a string option. Numbers and booleans are rendered as text.
    fn opt_str(&self, name: &str, default: &str) -> String {
        match self.opt_value(name) {
            Some(Value::String(s)) => s.clone(),
            Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
            _ => default.to_string(),
        }
    }

    /// Returns a boolean option.
    fn opt_bool(&self, name: &str, default: bool) -> bool {
        self.opt_value(name)
            .and_then(Value::as_bool)
            .unwrap_or(default)
    }

    /// Returns an integer option.
    fn opt_i64(&self, name: &str, default: i64) -> i64 {
        self.opt_value(name)
            .and_then(Value::as_i64)
            .unwrap_or(default)
    }

    /// Returns a floating point option. Integers are widened.
    fn opt_f64(&self, name: &str, default: f64) -> f64 {
        self.opt_value(name)
            .and_then(Value::as_f64)
            .unwrap_or(default)
    }

    /// Returns an entity id option (user, role, channel, ...).
    ///
    /// Platforms commonly send ids as decimal strings, so both numbers and
    /// numeric strings are accepted.
    fn opt_id(&self, name: &str, default: u64) -> u64 {
        match self.opt_value(name) {
            Some(Value::Number(n)) => n.as_u64().unwrap_or(default),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(default),
            _ => default,
        }
    }

    /// Deserializes an option into any serde type.
    fn opt_as<T: DeserializeOwned>(&self, name: &str, default: T) -> T {
        self.opt_value(name)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
            .unwrap_or(default)
    }
}

impl SlashOptions for SlashEvent {
    fn opt_value(&self, name: &str) -> Option<&Value> {
        self.option(name)
    }
}
