//! Iteration reporter: POSTs iteration snapshots as JSON.

use std::sync::Arc;
use std::time::Duration;

use warden_core::config::DashboardSettings;
use warden_core::{Hook, Iteration, WardenHooks};

use crate::error::DashboardError;

const ENDPOINT_PATH: &str = "/data/iterations";
const HOOK_NAME: &str = "dashboard-reporter";

/// Sends every completed iteration to the dashboard.
#[derive(Debug, Clone)]
pub struct IterationReporter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl IterationReporter {
    /// `url` is the dashboard base URL, e.g. `http://localhost:5000`.
    pub fn new(url: &str, api_key: &str, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}{ENDPOINT_PATH}", url.trim_end_matches('/')),
            api_key: api_key.to_string(),
            timeout,
        }
    }

    /// Build from the `[dashboard]` settings section. `None` when disabled or without a URL.
    pub fn from_settings(settings: &DashboardSettings) -> Option<Self> {
        if !settings.enabled || settings.url.trim().is_empty() {
            return None;
        }
        Some(Self::new(
            &settings.url,
            &settings.api_key,
            Duration::from_secs(settings.timeout_secs),
        ))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// POST one iteration snapshot.
    pub async fn report(&self, iteration: &Iteration) -> Result<(), DashboardError> {
        let snapshot = iteration.snapshot();
        let mut req = self
            .client
            .post(&self.endpoint)
            .json(&snapshot)
            .timeout(self.timeout);
        if !self.api_key.is_empty() {
            req = req.header("X-Api-Key", self.api_key.as_str());
        }

        let resp = req.send().await?;
        if resp.status().is_success() {
            tracing::info!(
                "📤 Iteration {} of '{}' sent to dashboard",
                snapshot.ordinal,
                snapshot.warden_name
            );
            Ok(())
        } else {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            Err(DashboardError::Status { status, body })
        }
    }

    /// Wrap the reporter as an async `on_iteration_completed` hook.
    pub fn hook(self) -> Hook<Iteration> {
        let reporter = Arc::new(self);
        Hook::asynchronous(move |iteration: Iteration| {
            let reporter = Arc::clone(&reporter);
            async move {
                reporter
                    .report(&iteration)
                    .await
                    .map_err(anyhow::Error::from)
            }
        })
        .named(HOOK_NAME)
    }

    /// Register on a warden's loop hooks. Registering twice is a no-op.
    pub fn register(self, hooks: &mut WardenHooks) -> bool {
        hooks.on_iteration_completed.add(self.hook())
    }
}
