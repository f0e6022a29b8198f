use thiserror::Error;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Dashboard request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Dashboard rejected iteration ({status}): {body}")]
    Status { status: u16, body: String },
}
