//! Per-watcher result state: edge detection for the `First*` hooks.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::outcome::WatcherResultState;

/// Last observed state per watcher name.
///
/// Owned by one warden. Each watcher task only writes its own key, so the lock is
/// held for a single map operation at a time.
#[derive(Debug, Default)]
pub struct StateTracker {
    states: Mutex<HashMap<String, WatcherResultState>>,
}

impl StateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `new_state` for `watcher` and report whether the edge hook should fire.
    ///
    /// - unchanged state: no edge
    /// - first ever state: edge for Failure and Error, never for Success
    /// - any other transition: edge
    pub fn update(&self, watcher: &str, new_state: WatcherResultState) -> bool {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        let last = states.get(watcher).copied().unwrap_or_default();
        if last == new_state {
            return false;
        }
        states.insert(watcher.to_string(), new_state);
        match last {
            WatcherResultState::NotSet => new_state != WatcherResultState::Success,
            _ => true,
        }
    }

    pub fn get(&self, watcher: &str) -> WatcherResultState {
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(watcher)
            .copied()
            .unwrap_or_default()
    }

    /// Forget every watcher's history.
    pub fn clear(&self) {
        self.states.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Drop state for watchers not in `names` (after a reconfiguration).
    pub fn retain<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        let keep: std::collections::HashSet<&str> = names.into_iter().collect();
        self.states
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(|name, _| keep.contains(name.as_str()));
    }
}
