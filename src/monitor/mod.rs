//! Vitals alert aggregation
//!
//! Polls the fall-detection and vitals endpoints, substitutes fallback data
//! for failed sources and publishes the resulting alert decision.

pub mod fallback;
mod poll;
mod source;
mod state;

pub use poll::{run_cycle, SharedDashboard, VitalsMonitor};
pub use source::{
    build_client, FallSource, HttpFallSource, HttpVitalsSource, SourceError, SourceKind,
    VitalsSource,
};
pub use state::{
    CycleOutcome, DashboardState, SourceFailure, VitalsHistory, HISTORY_CAPACITY,
};

#[cfg(test)]
pub(crate) use source::{serve_once, test_client};
