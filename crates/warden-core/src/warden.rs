//! Warden: the run loop.
//!
//! ```text
//!            start()                pause()
//!  Stopped ──────────▶ Running ──────────────▶ Paused
//!     ▲                 │   ▲                    │
//!     │     stop()      │   └──── start() ───────┘
//!     └─────────────────┴──── stop() ◀───────────┘
//! ```
//!
//! `start()` drives iterations until the cap is reached or another task pauses or
//! stops the warden. Nothing a watcher or hook does can make it return an error.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::config::{WardenConfig, WardenOptions};
use crate::error::{Result, WardenError};
use crate::hooks::WardenFault;
use crate::outcome::panic_message;
use crate::processor::IterationProcessor;
use crate::state::StateTracker;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum WardenState {
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for WardenState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WardenState::Stopped => write!(f, "stopped"),
            WardenState::Running => write!(f, "running"),
            WardenState::Paused => write!(f, "paused"),
        }
    }
}

/// Configuration and the processor built for it; swapped as a unit.
struct Active {
    config: Arc<WardenConfig>,
    processor: Arc<IterationProcessor>,
}

struct Control {
    state: WardenState,
    /// Ordinal of the next iteration to run.
    ordinal: i64,
    cancel: CancellationToken,
    /// A `start()` is waiting for the previous loop to wind down.
    starting: bool,
}

/// Clears `Control::starting` when the waiting `start()` proceeds or is dropped.
struct StartPending<'a>(&'a Warden);

impl Drop for StartPending<'_> {
    fn drop(&mut self) {
        self.0.control().starting = false;
    }
}

struct Inner {
    tracker: Arc<StateTracker>,
    active: RwLock<Arc<Active>>,
    control: Mutex<Control>,
    /// Held by the loop; a resumed `start()` waits for the previous loop to wind down.
    run_lock: tokio::sync::Mutex<()>,
}

/// Handle to one warden. Clones share the same loop, so one task can `start()` while
/// another calls `pause()` or `stop()`.
#[derive(Clone)]
pub struct Warden {
    inner: Arc<Inner>,
}

impl Warden {
    pub fn new(config: WardenConfig) -> Self {
        let tracker = Arc::new(StateTracker::new());
        let active = Self::activate(config, &tracker);
        Self {
            inner: Arc::new(Inner {
                tracker,
                active: RwLock::new(active),
                control: Mutex::new(Control {
                    state: WardenState::Stopped,
                    ordinal: 1,
                    cancel: CancellationToken::new(),
                    starting: false,
                }),
                run_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    /// Validate `options` and build a warden from them.
    pub fn from_options(options: WardenOptions) -> Result<Self> {
        Ok(Self::new(WardenConfig::new(options)?))
    }

    fn activate(config: WardenConfig, tracker: &Arc<StateTracker>) -> Arc<Active> {
        let config = Arc::new(config);
        let processor = Arc::new(IterationProcessor::new(Arc::clone(&config), Arc::clone(tracker)));
        Arc::new(Active { config, processor })
    }

    fn control(&self) -> MutexGuard<'_, Control> {
        self.inner.control.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn active(&self) -> Arc<Active> {
        Arc::clone(&self.inner.active.read().unwrap_or_else(|e| e.into_inner()))
    }

    pub fn name(&self) -> String {
        self.active().config.name().to_string()
    }

    pub fn state(&self) -> WardenState {
        self.control().state
    }

    /// Ordinal the next iteration will get.
    pub fn ordinal(&self) -> i64 {
        self.control().ordinal
    }

    pub fn config(&self) -> Arc<WardenConfig> {
        Arc::clone(&self.active().config)
    }

    pub fn tracker(&self) -> &Arc<StateTracker> {
        &self.inner.tracker
    }

    /// Start (or resume) the loop and run it until it ends.
    ///
    /// From `Stopped` the ordinal restarts at 1; from `Paused` it carries on.
    /// Errors only if the warden is already running.
    pub async fn start(&self) -> Result<()> {
        let pending = self.reserve_start()?;
        let _running = self.inner.run_lock.lock().await;

        let (cancel, resumed, ordinal) = {
            let mut c = self.control();
            let resumed = c.state == WardenState::Paused;
            if !resumed {
                c.ordinal = 1;
            }
            c.state = WardenState::Running;
            c.cancel = CancellationToken::new();
            (c.cancel.clone(), resumed, c.ordinal)
        };
        drop(pending);

        let active = self.active();
        tracing::info!(
            "🛡️ Warden '{}' {} at iteration {} ({} watchers)",
            active.config.name(),
            if resumed { "resumed" } else { "started" },
            ordinal,
            active.config.watchers().len()
        );
        active
            .config
            .warden_hooks()
            .on_start
            .dispatch("warden on_start", &())
            .await;

        self.run(&cancel).await;
        Ok(())
    }

    /// Claim the right to start. Only one `start()` may wait for the previous loop.
    fn reserve_start(&self) -> Result<StartPending<'_>> {
        let mut c = self.control();
        if c.state == WardenState::Running || c.starting {
            let state = if c.starting { "starting".to_string() } else { c.state.to_string() };
            return Err(WardenError::InvalidTransition { state, action: "start" });
        }
        c.starting = true;
        Ok(StartPending(self))
    }

    /// Pause a running warden. The iteration in flight finishes; the ordinal is kept.
    pub async fn pause(&self) -> Result<()> {
        {
            let mut c = self.control();
            if c.state != WardenState::Running {
                return Err(WardenError::InvalidTransition {
                    state: c.state.to_string(),
                    action: "pause",
                });
            }
            c.state = WardenState::Paused;
            c.cancel.cancel();
        }

        let active = self.active();
        tracing::info!("⏸️ Warden '{}' paused", active.config.name());
        active
            .config
            .warden_hooks()
            .on_pause
            .dispatch("warden on_pause", &())
            .await;
        Ok(())
    }

    /// Stop a running or paused warden and reset the ordinal.
    pub async fn stop(&self) -> Result<()> {
        {
            let mut c = self.control();
            if c.state == WardenState::Stopped {
                return Err(WardenError::InvalidTransition {
                    state: c.state.to_string(),
                    action: "stop",
                });
            }
            c.state = WardenState::Stopped;
            c.ordinal = 1;
            c.cancel.cancel();
        }
        self.fire_stop().await;
        Ok(())
    }

    async fn fire_stop(&self) {
        let active = self.active();
        tracing::info!("⏹️ Warden '{}' stopped", active.config.name());
        active
            .config
            .warden_hooks()
            .on_stop
            .dispatch("warden on_stop", &())
            .await;
    }

    /// Swap in a whole new configuration. Takes effect from the next iteration;
    /// state for watchers that are gone is dropped.
    pub fn reconfigure(&self, config: WardenConfig) {
        self.inner
            .tracker
            .retain(config.watchers().iter().map(|w| w.name()));
        let active = Self::activate(config, &self.inner.tracker);
        tracing::info!(
            "🔄 Warden '{}' reconfigured ({} watchers)",
            active.config.name(),
            active.config.watchers().len()
        );
        *self.inner.active.write().unwrap_or_else(|e| e.into_inner()) = active;
    }

    /// Next ordinal to run, if the loop may continue.
    fn next_ordinal(&self, cancel: &CancellationToken, max_iterations: Option<i64>) -> Option<i64> {
        let c = self.control();
        if c.state != WardenState::Running || cancel.is_cancelled() {
            return None;
        }
        match max_iterations {
            Some(max) if c.ordinal > max => None,
            _ => Some(c.ordinal),
        }
    }

    async fn run(&self, cancel: &CancellationToken) {
        loop {
            let active = self.active();
            let Some(ordinal) = self.next_ordinal(cancel, active.config.max_iterations()) else {
                break;
            };
            let hooks = active.config.warden_hooks();

            hooks
                .on_iteration_start
                .dispatch("warden on_iteration_start", &ordinal)
                .await;

            let processor = Arc::clone(&active.processor);
            let token = cancel.clone();
            let task = tokio::spawn(async move { processor.execute(ordinal, &token).await });

            match task.await {
                Ok(iteration) => {
                    tracing::info!(
                        "✅ Iteration {} of '{}' completed: {}",
                        ordinal,
                        active.config.name(),
                        if iteration.is_valid() { "all valid" } else { "invalid results" }
                    );
                    hooks
                        .on_iteration_completed
                        .dispatch("warden on_iteration_completed", &iteration)
                        .await;
                }
                Err(e) => {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic().as_ref())
                    } else {
                        e.to_string()
                    };
                    let fault = WardenFault {
                        warden_name: active.config.name().to_string(),
                        ordinal,
                        message,
                    };
                    tracing::error!("❌ {fault}");
                    hooks.on_error.dispatch("warden on_error", &fault).await;
                }
            }

            {
                let mut c = self.control();
                if c.state != WardenState::Stopped {
                    c.ordinal = ordinal + 1;
                }
            }

            if let Some(delay) = active.config.iteration_delay()
                && self.next_ordinal(cancel, active.config.max_iterations()).is_some()
            {
                tokio::select! {
                    _ = cancel.cancelled() => {}
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        // Cap reached: the loop stops on its own.
        let finished = {
            let mut c = self.control();
            if c.state == WardenState::Running {
                c.state = WardenState::Stopped;
                c.ordinal = 1;
                c.cancel.cancel();
                true
            } else {
                false
            }
        };
        if finished {
            self.fire_stop().await;
        }
    }
}

impl std::fmt::Debug for Warden {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Warden")
            .field("name", &self.name())
            .field("state", &self.state())
            .field("ordinal", &self.ordinal())
            .finish()
    }
}
