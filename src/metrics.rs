//! Pluggable metrics for access checks, group writes and reloads.
//!
//! A sink is attached to an [`AccessClient`](crate::AccessClient) with
//! `with_metrics`; without one, events are dropped.
//!
//! ```ignore
//! use scribble_authz::metrics::{EvaluationStats, MetricsSink, ReloadStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//!
//! struct DenyCounter(AtomicU64);
//!
//! impl MetricsSink for DenyCounter {
//!     fn on_evaluation(&self, stats: &EvaluationStats<'_>) {
//!         if !stats.allowed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_reload(&self, _stats: &ReloadStats) {}
//! }
//! ```

use std::time::{Duration, SystemTime};

use serde::Serialize;

/// One access check. Borrowed from the request, so a sink that keeps it
/// must copy the fields.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationStats<'a> {
    /// Time spent in enforcement
    pub duration: Duration,
    pub allowed: bool,
    pub subject: &'a str,
    pub service: &'a str,
    pub action: &'a str,
}

/// One group membership write that changed the model.
#[derive(Debug, Clone, Serialize)]
pub struct GroupStats {
    pub member: String,
    pub group: String,
    /// Includes waiting for the write gate and store I/O.
    pub duration: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReloadStats {
    pub reload_time: SystemTime,
    pub generation: u64,
}

/// Consumer of client events. Called inline on the request path, so
/// implementations must not block.
pub trait MetricsSink: Send + Sync {
    fn on_evaluation(&self, stats: &EvaluationStats<'_>);

    fn on_group_added(&self, _stats: &GroupStats) {}

    fn on_reload(&self, stats: &ReloadStats);
}

pub(crate) struct NoOpSink;

impl MetricsSink for NoOpSink {
    fn on_evaluation(&self, _stats: &EvaluationStats<'_>) {}
    fn on_reload(&self, _stats: &ReloadStats) {}
}
