//! Iterations (one cycle of the run loop) and their wire snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::outcome::CheckOutcome;

/// Everything one iteration produced. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Iteration {
    warden_name: String,
    ordinal: i64,
    outcomes: Vec<CheckOutcome>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
}

impl Iteration {
    pub fn new(
        warden_name: impl Into<String>,
        ordinal: i64,
        outcomes: Vec<CheckOutcome>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            warden_name: warden_name.into(),
            ordinal,
            outcomes,
            started_at,
            completed_at,
        }
    }

    pub fn warden_name(&self) -> &str {
        &self.warden_name
    }

    pub fn ordinal(&self) -> i64 {
        self.ordinal
    }

    pub fn outcomes(&self) -> &[CheckOutcome] {
        &self.outcomes
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

    /// AND over every outcome; an empty iteration is valid.
    pub fn is_valid(&self) -> bool {
        self.outcomes.iter().all(CheckOutcome::is_valid)
    }

    /// Outcomes belonging to one watcher, in execution order.
    pub fn outcomes_for<'a>(&'a self, watcher: &'a str) -> impl Iterator<Item = &'a CheckOutcome> {
        self.outcomes.iter().filter(move |o| o.watcher_name() == watcher)
    }

    /// The shape the dashboard ingests.
    pub fn snapshot(&self) -> IterationSnapshot {
        IterationSnapshot {
            warden_name: self.warden_name.clone(),
            ordinal: self.ordinal,
            started_at: self.started_at,
            completed_at: self.completed_at,
            is_valid: self.is_valid(),
            results: self.outcomes.iter().map(ResultSnapshot::from).collect(),
        }
    }
}

/// Serialized iteration, as posted to `/data/iterations`. Field names are a compatibility boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IterationSnapshot {
    pub warden_name: String,
    pub ordinal: i64,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub is_valid: bool,
    pub results: Vec<ResultSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSnapshot {
    pub watcher_name: String,
    pub watcher_type: String,
    pub is_valid: bool,
    pub description: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exception: Option<ExceptionSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExceptionSnapshot {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<&CheckOutcome> for ResultSnapshot {
    fn from(o: &CheckOutcome) -> Self {
        Self {
            watcher_name: o.watcher_name().to_string(),
            watcher_type: o.watcher_type().to_string(),
            is_valid: o.is_valid(),
            description: o.description().to_string(),
            started_at: o.started_at(),
            completed_at: o.completed_at(),
            exception: o.fault().map(|f| ExceptionSnapshot {
                message: f.message.clone(),
                source: f.source.clone(),
            }),
        }
    }
}
