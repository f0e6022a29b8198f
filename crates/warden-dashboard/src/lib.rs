//! # Warden Dashboard
//!
//! Ships serialized iterations to the dashboard's HTTP API.
//!
//! ```text
//! Warden ── OnIterationCompleted ──▶ IterationReporter
//!                                       └── POST {url}/data/iterations  (X-Api-Key)
//! ```
//!
//! Delivery failures are hook faults: logged, and the loop carries on.

pub mod error;
pub mod reporter;

pub use error::DashboardError;
pub use reporter::IterationReporter;
