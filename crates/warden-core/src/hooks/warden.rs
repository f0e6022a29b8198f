use serde::Serialize;

use crate::hooks::HookSet;
use crate::iteration::Iteration;

/// Something escaped the iteration processor. The loop carries on regardless.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WardenFault {
    pub warden_name: String,
    pub ordinal: i64,
    pub message: String,
}

impl std::fmt::Display for WardenFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "warden '{}' iteration {}: {}",
            self.warden_name, self.ordinal, self.message
        )
    }
}

/// Loop-level hooks.
#[derive(Debug, Clone, Default)]
pub struct WardenHooks {
    pub on_start: HookSet<()>,
    pub on_pause: HookSet<()>,
    pub on_stop: HookSet<()>,
    pub on_iteration_start: HookSet<i64>,
    pub on_iteration_completed: HookSet<Iteration>,
    pub on_error: HookSet<WardenFault>,
}

impl WardenHooks {
    pub fn new() -> Self {
        Self::default()
    }
}
