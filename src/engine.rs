//! Rule-based transformation engine.
//!
//! This module is the *public entry point* for cleaning text. It is split into
//! focused submodules under `src/engine/`.
//!
//! ## How the parts work together
//!
//! Cleaning a document is a short pipeline:
//!
//! ```text
//! rule ids ──┐
//! store    ──┴─ CompiledRules::resolve      (compiled_rules.rs)
//!                 - look ids up, skip stale/disabled
//!                 - compile_pattern per rule  (pattern.rs)
//!                 - malformed -> skipped, logged
//!                          │
//!                          v
//! document ─────── Transformer::run          (transform.rs)
//!                    - depth-first rebuild
//!                    - fold rules over each non-empty leaf
//!                          │
//!                          v
//!                  Document (same shape, new leaf text)
//! ```
//!
//! Alongside, `SurfaceScan` (scan.rs) reports which AI-typical character
//! families a text contains, and `metrics.rs` carries opt-in per-rule counters.
//!
//! ## Responsibilities by module
//!
//! - `pattern.rs`: the three pattern grammars and the [`Matcher`] they compile to.
//! - `compiled_rules.rs`: [`RuleSource`] (read access to a catalog) and the
//!   ordered, compiled rule list for one pass.
//! - `transform.rs`: [`Transformer`] and the [`transform`] convenience function.
//! - `scan.rs`: [`SurfaceScan`] / [`SurfaceMask`].
//! - `metrics.rs`: [`TransformMetrics`] and rule skip reasons.
//!
//! ## Debugging
//!
//! Everything logs through `tracing`: `debug` for skipped rules and pass
//! summaries, `trace` for every rule that changed a leaf, `warn` for malformed
//! patterns.

#[path = "engine/compiled_rules.rs"]
mod compiled_rules;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/pattern.rs"]
mod pattern;
#[path = "engine/scan.rs"]
mod scan;
#[path = "engine/transform.rs"]
mod transform;

pub use compiled_rules::{CompiledRule, CompiledRules, RuleSource};
pub use metrics::{RuleOutcome, RuleSkip, SkipReason, TransformMetrics};
pub use pattern::{CodePointSet, Matcher, PatternError, PatternGrammar, compile_pattern};
pub use scan::{SurfaceMask, SurfaceScan};
pub use transform::{Transformer, transform};
