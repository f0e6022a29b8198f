use crate::hooks::HookSet;
use crate::outcome::CheckOutcome;
use crate::watcher::WatcherCheck;

/// Hooks fired around a single watcher check.
///
/// Used twice: as the local hooks of one [`crate::WatcherConfig`], and as the global
/// hooks applied to every watcher. Local fire before global for the same event.
#[derive(Debug, Clone, Default)]
pub struct WatcherHooks {
    pub on_start: HookSet<WatcherCheck>,
    pub on_success: HookSet<CheckOutcome>,
    /// Recovery: Success after Failure or Error. Never on the very first result.
    pub on_first_success: HookSet<CheckOutcome>,
    pub on_failure: HookSet<CheckOutcome>,
    pub on_first_failure: HookSet<CheckOutcome>,
    pub on_error: HookSet<CheckOutcome>,
    pub on_first_error: HookSet<CheckOutcome>,
    /// Always fires, whatever the outcome.
    pub on_completed: HookSet<CheckOutcome>,
}

impl WatcherHooks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of registered callbacks across all events.
    pub fn len(&self) -> usize {
        self.on_start.len()
            + self.on_success.len()
            + self.on_first_success.len()
            + self.on_failure.len()
            + self.on_first_failure.len()
            + self.on_error.len()
            + self.on_first_error.len()
            + self.on_completed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
