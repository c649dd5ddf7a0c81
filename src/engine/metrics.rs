//! Transformation pass metrics.
//!
//! The intended usage is:
//!
//! - `Transformer::run` for normal operation.
//! - `Transformer::run_with_metrics` for reports, debugging rule sets and
//!   inspecting what each rule actually did to a document.
//!
//! Metrics are *opt-in*: the plain `run` path never allocates them.

use serde::Serialize;
use std::time::Duration;

/// What one compiled rule did over a whole pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOutcome {
    pub rule_id: String,
    /// Matches replaced across every leaf.
    pub replacements: usize,
    /// Leaves in which the rule replaced at least one match.
    pub leaves_touched: usize,
}

/// Why a requested rule id did not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "detail")]
pub enum SkipReason {
    Unknown,
    Disabled,
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleSkip {
    pub rule_id: String,
    pub reason: SkipReason,
}

/// Timing and per-rule counters for one pass.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformMetrics {
    #[serde(serialize_with = "as_micros")]
    pub total: Duration,
    /// Leaves seen, empty placeholders included.
    pub leaves_visited: usize,
    /// Leaves whose text changed.
    pub leaves_changed: usize,
    /// One entry per compiled rule, in run order.
    pub rules: Vec<RuleOutcome>,
    pub skipped: Vec<RuleSkip>,
}

impl TransformMetrics {
    pub fn total_replacements(&self) -> usize {
        self.rules.iter().map(|r| r.replacements).sum()
    }
}

fn as_micros<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_micros().try_into().unwrap_or(u64::MAX))
}
