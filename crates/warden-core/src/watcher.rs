//! Watcher contract: the single-method check every pluggable watcher implements.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::hooks::WatcherHooks;

/// Default cadence for a watcher that doesn't set one.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

/// A pluggable health check (database, TCP port, ping, ...).
///
/// Implementations report an unhealthy target as an invalid [`WatcherResult`];
/// returning `Err` (or panicking) is treated as a fault and surfaces as an Error outcome.
/// There is no built-in timeout. Bounding a slow check is the watcher's job.
#[async_trait]
pub trait Watcher: Send + Sync {
    /// Non-empty, stable name.
    fn name(&self) -> &str;

    /// Watcher type label, reported as `watcherType` in snapshots.
    fn kind(&self) -> &str {
        "custom"
    }

    /// Perform one check.
    async fn execute(&self) -> anyhow::Result<WatcherResult>;
}

/// What a watcher reports for one check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatcherResult {
    pub is_valid: bool,
    pub description: String,
    /// Watcher-specific data, ignored by the core.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl WatcherResult {
    pub fn valid(description: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            description: description.into(),
            payload: serde_json::Value::Null,
        }
    }

    pub fn invalid(description: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            description: description.into(),
            payload: serde_json::Value::Null,
        }
    }

    /// Attach a watcher-specific payload.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

/// Context handed to per-watcher `on_start` hooks, before the check runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatcherCheck {
    pub watcher_name: String,
    pub watcher_type: String,
    pub group: Option<String>,
    pub ordinal: i64,
}

/// One watcher as the warden sees it: the capability plus its cadence and local hooks.
#[derive(Clone)]
pub struct WatcherConfig {
    pub(crate) watcher: Arc<dyn Watcher>,
    pub(crate) name: String,
    pub(crate) group: Option<String>,
    pub(crate) interval: Duration,
    pub(crate) hooks: WatcherHooks,
}

impl WatcherConfig {
    /// Wrap a watcher, taking its own name and the default interval.
    pub fn new(watcher: Arc<dyn Watcher>) -> Self {
        let name = watcher.name().to_string();
        Self {
            watcher,
            name,
            group: None,
            interval: DEFAULT_INTERVAL,
            hooks: WatcherHooks::default(),
        }
    }

    /// Override the name used for state tracking and reporting.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Replace the local (per-watcher) hooks.
    pub fn with_hooks(mut self, hooks: WatcherHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Mutable access to the local hooks, for registering in place.
    pub fn hooks_mut(&mut self) -> &mut WatcherHooks {
        &mut self.hooks
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &str {
        self.watcher.kind()
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn hooks(&self) -> &WatcherHooks {
        &self.hooks
    }

    pub fn watcher(&self) -> &Arc<dyn Watcher> {
        &self.watcher
    }

    /// How many times this watcher runs in an iteration paced by `slowest`.
    ///
    /// A zero interval always runs once.
    pub fn repeats_within(&self, slowest: Duration) -> u64 {
        if self.interval.is_zero() {
            return 1;
        }
        let repeats = slowest.as_nanos() / self.interval.as_nanos();
        u64::try_from(repeats).unwrap_or(u64::MAX).max(1)
    }
}

impl std::fmt::Debug for WatcherConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherConfig")
            .field("name", &self.name)
            .field("kind", &self.watcher.kind())
            .field("group", &self.group)
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
