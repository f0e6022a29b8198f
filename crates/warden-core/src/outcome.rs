//! Check outcomes: the immutable record of one watcher execution.

use std::any::Any;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::watcher::WatcherResult;

/// Last observed result kind per watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WatcherResultState {
    #[default]
    NotSet,
    Success,
    Failure,
    Error,
}

impl std::fmt::Display for WatcherResultState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatcherResultState::NotSet => write!(f, "not-set"),
            WatcherResultState::Success => write!(f, "success"),
            WatcherResultState::Failure => write!(f, "failure"),
            WatcherResultState::Error => write!(f, "error"),
        }
    }
}

/// A watcher's `execute()` faulted: returned `Err` or panicked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckFault {
    pub watcher_name: String,
    pub watcher_type: String,
    pub message: String,
    /// Underlying cause chain, outermost first, joined with ": ".
    pub source: Option<String>,
}

impl CheckFault {
    pub fn from_error(watcher_name: &str, watcher_type: &str, err: &anyhow::Error) -> Self {
        let causes: Vec<String> = err.chain().skip(1).map(|c| c.to_string()).collect();
        Self {
            watcher_name: watcher_name.to_string(),
            watcher_type: watcher_type.to_string(),
            message: err.to_string(),
            source: (!causes.is_empty()).then(|| causes.join(": ")),
        }
    }

    pub fn from_panic(
        watcher_name: &str,
        watcher_type: &str,
        payload: &(dyn Any + Send),
    ) -> Self {
        Self {
            watcher_name: watcher_name.to_string(),
            watcher_type: watcher_type.to_string(),
            message: format!("watcher panicked: {}", panic_message(payload)),
            source: None,
        }
    }
}

impl std::fmt::Display for CheckFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.watcher_name, self.message)
    }
}

/// Best-effort text out of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Outcome of one check invocation. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CheckOutcome {
    watcher_name: String,
    watcher_type: String,
    group: Option<String>,
    result: WatcherResult,
    fault: Option<CheckFault>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl CheckOutcome {
    /// The watcher ran and reported a result (valid or not).
    pub fn completed(
        watcher_name: impl Into<String>,
        watcher_type: impl Into<String>,
        group: Option<String>,
        result: WatcherResult,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            watcher_name: watcher_name.into(),
            watcher_type: watcher_type.into(),
            group,
            result,
            fault: None,
            started_at,
            completed_at,
        }
    }

    /// The watcher faulted. The result is invalid and describes the fault.
    pub fn faulted(
        fault: CheckFault,
        group: Option<String>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            watcher_name: fault.watcher_name.clone(),
            watcher_type: fault.watcher_type.clone(),
            group,
            result: WatcherResult::invalid(fault.message.clone()),
            fault: Some(fault),
            started_at,
            completed_at,
        }
    }

    pub fn watcher_name(&self) -> &str {
        &self.watcher_name
    }

    pub fn watcher_type(&self) -> &str {
        &self.watcher_type
    }

    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    pub fn result(&self) -> &WatcherResult {
        &self.result
    }

    pub fn fault(&self) -> Option<&CheckFault> {
        self.fault.as_ref()
    }

    pub fn is_valid(&self) -> bool {
        self.result.is_valid
    }

    pub fn description(&self) -> &str {
        &self.result.description
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    pub fn execution_time(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    /// Never NotSet.
    pub fn state(&self) -> WatcherResultState {
        if self.fault.is_some() {
            WatcherResultState::Error
        } else if self.result.is_valid {
            WatcherResultState::Success
        } else {
            WatcherResultState::Failure
        }
    }
}
