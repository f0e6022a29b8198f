use crate::hooks::HookSet;
use crate::outcome::{CheckFault, CheckOutcome};

/// Hooks over the whole batch of outcomes produced by one iteration.
///
/// Each event sees a filtered view of the batch; `on_completed` sees all of it.
/// Filtered events with nothing in their view are skipped.
#[derive(Debug, Clone, Default)]
pub struct AggregatedHooks {
    pub on_success: HookSet<Vec<CheckOutcome>>,
    pub on_first_success: HookSet<Vec<CheckOutcome>>,
    pub on_failure: HookSet<Vec<CheckOutcome>>,
    pub on_first_failure: HookSet<Vec<CheckOutcome>>,
    pub on_error: HookSet<Vec<CheckFault>>,
    pub on_first_error: HookSet<Vec<CheckFault>>,
    pub on_completed: HookSet<Vec<CheckOutcome>>,
}

impl AggregatedHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.on_success.is_empty()
            && self.on_first_success.is_empty()
            && self.on_failure.is_empty()
            && self.on_first_failure.is_empty()
            && self.on_error.is_empty()
            && self.on_first_error.is_empty()
            && self.on_completed.is_empty()
    }
}
