//! # Warden Core
//!
//! Long-running watchdog scheduler. Repeatedly executes a set of independently
//! configured health checks ("watchers"), tracks each watcher's result history to
//! detect transitions, and fans out lifecycle hooks without ever taking the host down.
//!
//! ## Design Principles
//! - Every watcher runs in its own task; one hung or panicking check never blocks another
//! - Edge-triggered `First*` hooks fire once per streak, not once per result
//! - Failures are observable only through hooks and logs, never through `start()`
//! - Cooperative cancellation: pause/stop only signal
//!
//! ## Architecture
//! ```text
//! Warden (run loop: Stopped ⇄ Running ⇄ Paused)
//!   ├── OnIterationStart(ordinal)
//!   ├── IterationProcessor.execute(ordinal)
//!   │     ├── watcher "db"    every 100ms ─┐
//!   │     ├── watcher "api"   every 1s    ─┼─ join barrier
//!   │     └── watcher "cache" every 10ms  ─┘
//!   │           └── Start → Success|Failure|Error (+First*) → Completed
//!   │     └── aggregated hooks over the whole batch
//!   └── OnIterationCompleted(iteration) → next ordinal
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod hooks;
pub mod iteration;
pub mod outcome;
pub mod processor;
pub mod state;
pub mod warden;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use clock::{Clock, SystemClock};
pub use config::{DashboardSettings, WardenConfig, WardenOptions, WardenSettings, WatcherSettings};
pub use error::{Result, WardenError};
pub use hooks::{
    AggregatedHooks, Hook, HookId, HookSet, WardenFault, WardenHooks, WatcherHooks,
};
pub use iteration::{ExceptionSnapshot, Iteration, IterationSnapshot, ResultSnapshot};
pub use outcome::{CheckFault, CheckOutcome, WatcherResultState};
pub use processor::IterationProcessor;
pub use state::StateTracker;
pub use warden::{Warden, WardenState};
pub use watcher::{Watcher, WatcherCheck, WatcherConfig, WatcherResult};
