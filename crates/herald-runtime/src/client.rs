//! The command client: a router plus its background housekeeping.
//!
//! ```rust,ignore
//! use herald_runtime::{CommandClient, ConfigLoader};
//!
//! let config = ConfigLoader::new().load()?;
//! let client = CommandClient::from_config(&config, builder)?;
//! client.start()?;
//!
//! client.router().route_message(event).await?;
//!
//! client.shutdown().await;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use herald_framework::{
    DEFAULT_HELP_WORD, EventRouter, MENTION_PREFIX, RouterBuilder, RouterService,
};

use crate::config::{ClientConfig, HeraldConfig};
use crate::error::{RuntimeError, RuntimeResult};
use crate::logging;

/// Owns a shared [`EventRouter`] and the task that sweeps its expired
/// cooldowns.
pub struct CommandClient {
    router: Arc<EventRouter>,
    sweep_period: Option<Duration>,
    token: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl CommandClient {
    /// Applies `config` on top of `builder` and builds the router.
    ///
    /// A setting left at its default value keeps whatever the builder
    /// already has. Owner ids that are not decimal numbers are skipped with
    /// a warning.
    pub fn new(config: &ClientConfig, builder: RouterBuilder) -> RuntimeResult<Self> {
        let builder = apply_client_config(config, builder);
        let router = Arc::new(builder.build()?);

        let sweep_period =
            (config.cooldown_sweep_secs > 0).then(|| Duration::from_secs(config.cooldown_sweep_secs));

        info!(
            prefix = %router.resolver().prefix(),
            commands = router.commands().len(),
            slash_commands = router.slash_commands().len(),
            "Command client created"
        );

        Ok(Self {
            router,
            sweep_period,
            token: CancellationToken::new(),
            sweeper: Mutex::new(None),
        })
    }

    /// Initialises logging from `config.logging`, then builds the client
    /// from `config.client`.
    pub fn from_config(config: &HeraldConfig, builder: RouterBuilder) -> RuntimeResult<Self> {
        logging::init_from_config(&config.logging);
        Self::new(&config.client, builder)
    }

    /// Returns the shared router.
    pub fn router(&self) -> &Arc<EventRouter> {
        &self.router
    }

    /// Returns a `tower::Service` over the shared router.
    pub fn service(&self) -> RouterService {
        RouterService::new(Arc::clone(&self.router))
    }

    /// Whether the sweeper task is running.
    pub fn is_running(&self) -> bool {
        self.sweeper.lock().is_some()
    }

    /// Spawns the cooldown sweeper on the current tokio runtime.
    ///
    /// With `cooldown_sweep_secs = 0` there is nothing to spawn and this
    /// returns `Ok(())`.
    pub fn start(&self) -> RuntimeResult<()> {
        if self.token.is_cancelled() {
            return Err(RuntimeError::ShutDown);
        }

        let mut sweeper = self.sweeper.lock();
        if sweeper.is_some() {
            return Err(RuntimeError::AlreadyRunning);
        }

        let Some(period) = self.sweep_period else {
            debug!("Cooldown sweeping disabled");
            return Ok(());
        };

        let router = Arc::clone(&self.router);
        let token = self.token.clone();
        *sweeper = Some(tokio::spawn(sweep_cooldowns(router, period, token)));

        info!(period_secs = period.as_secs(), "Command client started");
        Ok(())
    }

    /// Stops the sweeper and waits for it to finish.
    ///
    /// The client cannot be started again afterwards.
    pub async fn shutdown(&self) {
        self.token.cancel();

        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            warn!(error = %e, "Cooldown sweeper ended abnormally");
        }

        info!("Command client stopped");
    }
}

impl fmt::Debug for CommandClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandClient")
            .field("router", &self.router)
            .field("sweep_period", &self.sweep_period)
            .field("running", &self.is_running())
            .finish()
    }
}

fn apply_client_config(config: &ClientConfig, mut builder: RouterBuilder) -> RouterBuilder {
    if config.prefix != MENTION_PREFIX {
        builder = builder.prefix(config.prefix.clone());
    }
    if let Some(alt) = &config.alt_prefix {
        builder = builder.alt_prefix(alt.clone());
    }
    if !config.prefixes.is_empty() {
        builder = builder.prefixes(config.prefixes.iter().cloned());
    }
    if !config.use_help {
        builder = builder.use_help(false);
    }
    if config.help_word != DEFAULT_HELP_WORD {
        builder = builder.help_word(config.help_word.clone());
    }
    if config.linked_cache_size > 0 {
        builder = builder.linked_cache_size(config.linked_cache_size);
    }

    if let Some(owner) = config.owner_id.as_deref().and_then(|id| parse_user_id("owner_id", id)) {
        builder = builder.owner_id(owner);
    }
    let co_owners: Vec<u64> = config
        .co_owner_ids
        .iter()
        .filter_map(|id| parse_user_id("co_owner_ids", id))
        .collect();
    if !co_owners.is_empty() {
        builder = builder.co_owner_ids(co_owners);
    }

    builder
}

fn parse_user_id(field: &'static str, raw: &str) -> Option<u64> {
    match raw.trim().parse() {
        Ok(id) => Some(id),
        Err(e) => {
            warn!(field, value = %raw, error = %e, "Ignoring malformed user id");
            None
        }
    }
}

async fn sweep_cooldowns(router: Arc<EventRouter>, period: Duration, token: CancellationToken) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            _ = ticker.tick() => {
                let removed = router.clean_cooldowns();
                if removed > 0 {
                    debug!(removed, "Swept expired cooldowns");
                }
            }
        }
    }

    debug!("Cooldown sweeper stopped");
}
