//! Ping Bot Example
//!
//! A console bot: every line read from stdin becomes a message event and is
//! routed through a [`CommandClient`]. Lines starting with `/` are sent as
//! structured commands instead, with `key=value` pairs as options.
//!
//! ```text
//! !ping                 -> Pong! (once every 5 seconds per user)
//! !echo hello world     -> hello world
//! !help                 -> command list
//! /roll sides=20        -> structured command with an option
//! ```
//!
//! # Usage
//!
//! ```bash
//! cargo run --package ping-bot -- --author 42 --guild 1001
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use herald::prelude::*;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, error, info, warn};

#[derive(Debug, Parser)]
#[command(about = "Route stdin lines through a Herald command client")]
struct Args {
    /// Configuration file; otherwise herald.toml is searched for.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Author id attached to every message.
    #[arg(long, default_value_t = 1)]
    author: u64,

    /// Guild id; messages are private when omitted.
    #[arg(long)]
    guild: Option<u64>,
}

// ============================================================================
// Handlers
// ============================================================================

async fn ping(_ctx: CommandContext) -> Result<()> {
    println!("Pong!");
    Ok(())
}

async fn echo(ctx: CommandContext) -> Result<()> {
    if ctx.args().is_empty() {
        anyhow::bail!("nothing to echo");
    }
    println!("{}", ctx.args());
    Ok(())
}

async fn roll(ctx: SlashContext) -> Result<()> {
    let sides = ctx.event().opt_i64("sides", 6).max(1);
    // Derived from the interaction id, so repeated rolls differ.
    let value = (ctx.event().interaction_id % sides.unsigned_abs()) + 1;
    println!("Rolled {value} (d{sides})");
    Ok(())
}

// ============================================================================
// Listener
// ============================================================================

struct ConsoleListener;

impl CommandListener for ConsoleListener {
    fn on_command_exception(
        &self,
        ctx: &CommandContext,
        command: Option<&Command>,
        error: &anyhow::Error,
    ) {
        let name = command.map_or("help", Command::name);
        warn!(command = name, args = ctx.args(), error = %error, "Command failed");
    }

    fn on_cooldown(&self, _ctx: &CommandContext, command: &Command, remaining: u32) {
        println!("Slow down! {} is available again in {remaining}s.", command.name());
    }

    fn on_slash_cooldown(&self, _ctx: &SlashContext, command: &SlashCommand, remaining: u32) {
        println!("Slow down! /{} is available again in {remaining}s.", command.name());
    }

    fn on_non_command_message(&self, event: &MessageEvent) {
        debug!(content = %event.content, "Not a command");
    }
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn build_router() -> RouterBuilder {
    let commands = vec![
        Command::builder("ping")
            .help("checks that the bot is alive")
            .cooldown(5)
            .cooldown_scope(CooldownScope::User)
            .handler(ping),
        Command::builder("echo")
            .alias("say")
            .arguments("<text>")
            .help("repeats the text back")
            .handler(echo),
    ];

    let listing: Vec<String> = commands
        .iter()
        .map(|c| match c.arguments() {
            Some(args) => format!("{} {args} - {}", c.name(), c.help()),
            None => format!("{} - {}", c.name(), c.help()),
        })
        .collect();
    let listing = Arc::new(listing.join("\n"));

    let mut builder = EventRouter::builder()
        .prefix("!")
        .slash_command(
            SlashCommand::builder("roll")
                .help("rolls a die")
                .cooldown(3)
                .handler(roll),
        )
        .listener(Arc::new(ConsoleListener))
        .help_handler(move |ctx: CommandContext| {
            let listing = Arc::clone(&listing);
            async move {
                println!("Commands (prefix {:?}):\n{listing}", ctx.prefix());
                anyhow::Ok(())
            }
        });
    for command in commands {
        builder = builder.command(command);
    }
    builder
}

fn parse_slash(line: &str, args: &Args, id: u64) -> SlashEvent {
    let mut parts = line.trim_start_matches('/').split_whitespace();
    let mut event = SlashEvent::new(parts.next().unwrap_or_default())
        .with_id(id)
        .with_author(args.author);
    if let Some(guild) = args.guild {
        event = event.in_guild(guild);
    }

    for part in parts {
        if let Some((key, raw)) = part.split_once('=') {
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::from(raw));
            event = event.with_option(key, value);
        }
    }
    event
}

fn to_message(line: String, args: &Args, id: u64) -> MessageEvent {
    let event = MessageEvent::new(line).with_id(id).with_author(args.author);
    match args.guild {
        Some(guild) => event.in_guild(guild),
        None => event.in_private(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.file(path);
    }
    let config = loader.load()?;

    let client = CommandClient::from_config(&config, build_router())?;
    client.router().on_ready("ping-bot");
    client.start()?;
    info!(prefix = client.router().textual_prefix(), "Reading commands from stdin");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut next_id = 1u64;

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        next_id += 1;

        let routed = if line.starts_with('/') {
            client.router().route_slash(parse_slash(&line, &args, next_id)).await
        } else {
            client.router().route_message(to_message(line, &args, next_id)).await
        };

        match routed {
            Ok(outcome) => debug!(?outcome, "Routed"),
            Err(e) => error!(error = %e, "Routing failed"),
        }
    }

    client.shutdown().await;
    Ok(())
}
