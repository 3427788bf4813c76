//! Observation hooks for routing.
//!
//! Implement only the callbacks you need; all of them default to doing
//! nothing. The router calls them on the routing task with no internal lock
//! held, so implementations may call back into the router.

use herald_core::{MessageEvent, SlashEvent};

use crate::command::{Command, SlashCommand};
use crate::context::{CommandContext, SlashContext};

/// Receives routing notifications.
pub trait CommandListener: Send + Sync + 'static {
    /// Called before a text command runs. `command` is `None` on the help path.
    fn on_command(&self, ctx: &CommandContext, command: Option<&Command>) {
        let _ = (ctx, command);
    }

    /// Called after a text command's handler returned `Ok`. `command` is
    /// `None` on the help path.
    fn on_completed_command(&self, ctx: &CommandContext, command: Option<&Command>) {
        let _ = (ctx, command);
    }

    /// Called when a text command's handler returned an error, before the
    /// error is handed back to the caller. `command` is `None` when the help
    /// handler failed.
    fn on_command_exception(
        &self,
        ctx: &CommandContext,
        command: Option<&Command>,
        error: &anyhow::Error,
    ) {
        let _ = (ctx, command, error);
    }

    /// Called instead of running a text command whose cooldown for this
    /// invoker still has `remaining` seconds to go.
    fn on_cooldown(&self, ctx: &CommandContext, command: &Command, remaining: u32) {
        let _ = (ctx, command, remaining);
    }

    /// Called before a structured command runs.
    fn on_slash_command(&self, event: &SlashEvent, command: &SlashCommand) {
        let _ = (event, command);
    }

    /// Called after a structured command's handler returned `Ok`.
    fn on_completed_slash_command(&self, ctx: &SlashContext, command: &SlashCommand) {
        let _ = (ctx, command);
    }

    /// Called when a structured command's handler returned an error.
    fn on_slash_command_exception(
        &self,
        ctx: &SlashContext,
        command: &SlashCommand,
        error: &anyhow::Error,
    ) {
        let _ = (ctx, command, error);
    }

    /// Called instead of running a structured command that is cooling down.
    fn on_slash_cooldown(&self, ctx: &SlashContext, command: &SlashCommand, remaining: u32) {
        let _ = (ctx, command, remaining);
    }

    /// Called for a message that matched no prefix, or whose name matched no
    /// command.
    fn on_non_command_message(&self, event: &MessageEvent) {
        let _ = event;
    }
}
