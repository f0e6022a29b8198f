//! Warden configuration.
//!
//! [`WardenOptions`] is the plain, mutable input; [`WardenConfig::new`] validates it into
//! the immutable value a [`crate::Warden`] runs with. [`WardenSettings`] is the on-disk
//! (TOML) part: loop limits, per-watcher cadence overrides and the dashboard section.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::clock::{Clock, SystemClock};
use crate::error::{Result, WardenError};
use crate::hooks::{AggregatedHooks, WardenHooks, WatcherHooks};
use crate::watcher::WatcherConfig;

/// Unvalidated configuration input.
#[derive(Clone)]
pub struct WardenOptions {
    pub name: String,
    pub watchers: Vec<WatcherConfig>,
    /// Applied to every watcher, after its local hooks.
    pub global_hooks: WatcherHooks,
    pub aggregated_hooks: AggregatedHooks,
    pub warden_hooks: WardenHooks,
    /// `None` runs forever.
    pub max_iterations: Option<i64>,
    /// Extra pause between iterations. `None` chains iterations back to back.
    pub iteration_delay: Option<Duration>,
    pub clock: Arc<dyn Clock>,
}

impl Default for WardenOptions {
    fn default() -> Self {
        Self {
            name: "warden".into(),
            watchers: Vec::new(),
            global_hooks: WatcherHooks::default(),
            aggregated_hooks: AggregatedHooks::default(),
            warden_hooks: WardenHooks::default(),
            max_iterations: None,
            iteration_delay: None,
            clock: Arc::new(SystemClock),
        }
    }
}

/// Validated, immutable warden configuration.
#[derive(Clone)]
pub struct WardenConfig {
    name: String,
    watchers: Vec<WatcherConfig>,
    global_hooks: WatcherHooks,
    aggregated_hooks: AggregatedHooks,
    warden_hooks: WardenHooks,
    max_iterations: Option<i64>,
    iteration_delay: Option<Duration>,
    clock: Arc<dyn Clock>,
}

impl WardenConfig {
    /// Validate options into a config.
    ///
    /// Rejects an empty warden name, empty or duplicate watcher names, and a
    /// non-positive iteration cap.
    pub fn new(options: WardenOptions) -> Result<Self> {
        let name = options.name.trim().to_string();
        if name.is_empty() {
            return Err(WardenError::Validation("warden name can not be empty".into()));
        }

        let mut seen = HashSet::new();
        for watcher in &options.watchers {
            let watcher_name = watcher.name().trim();
            if watcher_name.is_empty() {
                return Err(WardenError::Validation(format!(
                    "watcher of type '{}' has an empty name",
                    watcher.kind()
                )));
            }
            if !seen.insert(watcher_name.to_string()) {
                return Err(WardenError::Validation(format!(
                    "duplicate watcher name '{watcher_name}'"
                )));
            }
        }

        if let Some(max) = options.max_iterations
            && max < 1
        {
            return Err(WardenError::Validation(format!(
                "max_iterations must be at least 1, got {max}"
            )));
        }

        Ok(Self {
            name,
            watchers: options.watchers,
            global_hooks: options.global_hooks,
            aggregated_hooks: options.aggregated_hooks,
            warden_hooks: options.warden_hooks,
            max_iterations: options.max_iterations,
            iteration_delay: options.iteration_delay,
            clock: options.clock,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn watchers(&self) -> &[WatcherConfig] {
        &self.watchers
    }

    pub fn global_hooks(&self) -> &WatcherHooks {
        &self.global_hooks
    }

    pub fn aggregated_hooks(&self) -> &AggregatedHooks {
        &self.aggregated_hooks
    }

    pub fn warden_hooks(&self) -> &WardenHooks {
        &self.warden_hooks
    }

    pub fn max_iterations(&self) -> Option<i64> {
        self.max_iterations
    }

    pub fn iteration_delay(&self) -> Option<Duration> {
        self.iteration_delay
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Longest watcher interval, which paces one iteration.
    pub fn slowest_interval(&self) -> Duration {
        self.watchers
            .iter()
            .map(WatcherConfig::interval)
            .max()
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for WardenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WardenConfig")
            .field("name", &self.name)
            .field("watchers", &self.watchers)
            .field("max_iterations", &self.max_iterations)
            .field("iteration_delay", &self.iteration_delay)
            .finish_non_exhaustive()
    }
}

/// File-backed settings (`warden.toml`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WardenSettings {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub max_iterations: Option<i64>,
    #[serde(default)]
    pub iteration_delay_ms: u64,
    /// Per-watcher overrides, keyed by watcher name.
    #[serde(default)]
    pub watchers: BTreeMap<String, WatcherSettings>,
    #[serde(default)]
    pub dashboard: DashboardSettings,
}

fn default_name() -> String { "warden".into() }
fn default_timeout_secs() -> u64 { 10 }

impl Default for WardenSettings {
    fn default() -> Self {
        Self {
            name: default_name(),
            max_iterations: None,
            iteration_delay_ms: 0,
            watchers: BTreeMap::new(),
            dashboard: DashboardSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WatcherSettings {
    #[serde(default)]
    pub interval_ms: Option<u64>,
    #[serde(default)]
    pub group: Option<String>,
}

/// Where iteration snapshots get shipped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WardenSettings {
    /// Load settings from a TOML file. A missing or unreadable file is an I/O error.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| WardenError::Config(format!("Failed to parse settings: {e}")))
    }

    /// Combine these settings with the watchers built in code.
    ///
    /// Overrides naming a watcher that isn't in `watchers` are rejected.
    pub fn into_options(self, watchers: Vec<WatcherConfig>) -> Result<WardenOptions> {
        let mut watchers = watchers;
        for (name, overrides) in &self.watchers {
            let Some(watcher) = watchers.iter_mut().find(|w| w.name() == name) else {
                return Err(WardenError::Config(format!(
                    "settings reference unknown watcher '{name}'"
                )));
            };
            if let Some(ms) = overrides.interval_ms {
                watcher.interval = Duration::from_millis(ms);
            }
            if let Some(group) = &overrides.group {
                watcher.group = Some(group.clone());
            }
        }

        Ok(WardenOptions {
            name: self.name,
            watchers,
            max_iterations: self.max_iterations,
            iteration_delay: (self.iteration_delay_ms > 0)
                .then(|| Duration::from_millis(self.iteration_delay_ms)),
            ..WardenOptions::default()
        })
    }
}
