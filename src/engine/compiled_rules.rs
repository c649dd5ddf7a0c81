//! Rule resolution and compilation.
//!
//! This module holds the *static* side of a transformation pass: the list of
//! rules that will actually run, in order, each paired with its compiled
//! [`Matcher`].
//!
//! A pass is split into two phases:
//!
//! 1. **Resolve/compile** (this module): look every requested id up in a
//!    [`RuleSource`], drop the ones that cannot run, compile the rest once.
//! 2. **Run** (see `transform.rs`): walk the document and fold the compiled
//!    rules over every non-empty leaf.
//!
//! Compiling once per pass rather than once per leaf keeps large documents
//! cheap and means a malformed pattern is logged a single time.
//!
//! ## Invariants
//!
//! - `CompiledRules::rules` preserves the order of the requested ids,
//!   duplicates included: `[a, b, a]` runs `a` twice.
//! - An id lands in `skipped` (and never in `rules`) when it is unknown, the
//!   rule is disabled, or its pattern does not compile.

use super::metrics::{RuleSkip, SkipReason};
use super::pattern::Matcher;
use crate::TransformationRule;

/// Read access to a rule catalog.
///
/// The engine only ever reads rules; mutation goes through the store.
pub trait RuleSource {
    fn rule(&self, id: &str) -> Option<&TransformationRule>;
}

impl RuleSource for [TransformationRule] {
    fn rule(&self, id: &str) -> Option<&TransformationRule> {
        self.iter().find(|r| r.id == id)
    }
}

impl RuleSource for Vec<TransformationRule> {
    fn rule(&self, id: &str) -> Option<&TransformationRule> {
        self.as_slice().rule(id)
    }
}

/// A rule ready to run.
#[derive(Debug, Clone)]
pub struct CompiledRule<'a> {
    pub rule: &'a TransformationRule,
    pub matcher: Matcher,
}

impl CompiledRule<'_> {
    pub fn replacement(&self) -> &str {
        self.rule.effective_replacement()
    }
}

/// Ordered, compiled rule list for one pass.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules<'a> {
    pub rules: Vec<CompiledRule<'a>>,
    pub skipped: Vec<RuleSkip>,
}

impl<'a> CompiledRules<'a> {
    /// Resolve `rule_ids` against `source` and compile the runnable ones.
    pub fn resolve<S, I>(source: &'a S, rule_ids: &[I]) -> Self
    where
        S: RuleSource + ?Sized,
        I: AsRef<str>,
    {
        let mut compiled = CompiledRules::default();

        for id in rule_ids.iter().map(AsRef::as_ref) {
            let Some(rule) = source.rule(id) else {
                tracing::debug!(rule_id = id, "skipping unknown rule id");
                compiled.skipped.push(RuleSkip { rule_id: id.to_string(), reason: SkipReason::Unknown });
                continue;
            };

            if !rule.enabled {
                tracing::debug!(rule_id = id, "skipping disabled rule");
                compiled.skipped.push(RuleSkip { rule_id: id.to_string(), reason: SkipReason::Disabled });
                continue;
            }

            match Matcher::compile(&rule.pattern) {
                Ok(matcher) => compiled.rules.push(CompiledRule { rule, matcher }),
                Err(err) => {
                    tracing::warn!(rule_id = id, pattern = %rule.pattern, error = %err, "rule pattern is malformed; rule skipped");
                    compiled
                        .skipped
                        .push(RuleSkip { rule_id: id.to_string(), reason: SkipReason::Malformed(err.to_string()) });
                }
            }
        }

        compiled
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Ids of the rules that will run, in order.
    pub fn active_ids(&self) -> Vec<&'a str> {
        self.rules.iter().map(|c| c.rule.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleKind;

    fn catalog() -> Vec<TransformationRule> {
        vec![
            rule!(id: "dash", name: "Dash", description: "", replace: "U+2014" => "-"),
            rule!(id: "off", name: "Off", description: "", remove: "x", enabled: false),
            rule!(id: "broken", name: "Broken", description: "", replace: "/(/g" => ""),
        ]
    }

    #[test]
    fn resolve_keeps_order_and_duplicates() {
        let rules = catalog();
        let compiled = CompiledRules::resolve(&rules, &["dash", "dash"]);
        assert_eq!(compiled.active_ids(), vec!["dash", "dash"]);
        assert!(compiled.skipped.is_empty());
    }

    #[test]
    fn resolve_skips_unknown_disabled_and_malformed() {
        let rules = catalog();
        let compiled = CompiledRules::resolve(&rules, &["gone", "off", "broken", "dash"]);
        assert_eq!(compiled.active_ids(), vec!["dash"]);

        let reasons: Vec<_> = compiled.skipped.iter().map(|s| (s.rule_id.as_str(), &s.reason)).collect();
        assert_eq!(reasons[0], ("gone", &SkipReason::Unknown));
        assert_eq!(reasons[1], ("off", &SkipReason::Disabled));
        assert!(matches!(reasons[2], ("broken", SkipReason::Malformed(_))));
    }

    #[test]
    fn remove_rules_replace_with_nothing() {
        let rules = vec![TransformationRule {
            id: "r".into(),
            name: "r".into(),
            description: String::new(),
            kind: RuleKind::Remove,
            pattern: "a".into(),
            replacement: "ignored".into(),
            enabled: true,
        }];
        let compiled = CompiledRules::resolve(&rules, &["r"]);
        assert_eq!(compiled.rules[0].replacement(), "");
    }
}
