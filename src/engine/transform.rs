//! Rule application over structured documents.
//!
//! This module is the operational core of the engine:
//!
//! - Walk the document depth-first, rebuilding blocks around transformed
//!   children.
//! - Fold the compiled rules, left to right, over every non-empty leaf: the
//!   output of rule *i* is the input of rule *i + 1*.
//! - Leave everything but leaf text alone (kinds, nesting, marks, leaf count).
//!
//! ```text
//! Block(paragraph)                       Block(paragraph)
//!   Leaf("a—b", {})        ──rules──▶      Leaf("a-b", {})
//!   Leaf("", {BOLD})       (skipped)       Leaf("", {BOLD})
//! ```
//!
//! The pass is a pure function of `(document, compiled rules)`: no state is
//! carried between calls, so it is safe to invoke on every keystroke.

use super::compiled_rules::{CompiledRules, RuleSource};
use super::metrics::{RuleOutcome, TransformMetrics};
use crate::document::{Document, Node};
use std::time::Instant;

/// A compiled, reusable transformation.
#[derive(Debug, Clone)]
pub struct Transformer<'a> {
    compiled: CompiledRules<'a>,
}

impl<'a> Transformer<'a> {
    /// Resolve and compile `rule_ids` against `source`.
    pub fn new<S, I>(source: &'a S, rule_ids: &[I]) -> Self
    where
        S: RuleSource + ?Sized,
        I: AsRef<str>,
    {
        Transformer { compiled: CompiledRules::resolve(source, rule_ids) }
    }

    pub fn from_compiled(compiled: CompiledRules<'a>) -> Self {
        Transformer { compiled }
    }

    pub fn compiled(&self) -> &CompiledRules<'a> {
        &self.compiled
    }

    /// True when no rule will run; every input comes back unchanged.
    pub fn is_identity(&self) -> bool {
        self.compiled.is_empty()
    }

    /// Apply the rule fold to a single string.
    pub fn apply_text(&self, text: &str) -> String {
        self.fold_text(text, None)
    }

    /// Transform `doc`, returning a new document of identical shape.
    pub fn run(&self, doc: &Document) -> Document {
        if self.is_identity() || doc.is_empty() {
            return doc.clone();
        }
        Document::new(doc.nodes.iter().map(|n| self.transform_node(n, &mut None)).collect())
    }

    /// Like [`Transformer::run`], also reporting what each rule did.
    pub fn run_with_metrics(&self, doc: &Document) -> (Document, TransformMetrics) {
        let start = Instant::now();
        let mut metrics = TransformMetrics {
            rules: self
                .compiled
                .rules
                .iter()
                .map(|c| RuleOutcome { rule_id: c.rule.id.clone(), ..RuleOutcome::default() })
                .collect(),
            skipped: self.compiled.skipped.clone(),
            ..TransformMetrics::default()
        };

        let out = if self.is_identity() || doc.is_empty() {
            metrics.leaves_visited = doc.leaf_count();
            doc.clone()
        } else {
            let mut sink = Some(&mut metrics);
            Document::new(doc.nodes.iter().map(|n| self.transform_node(n, &mut sink)).collect())
        };

        metrics.total = start.elapsed();
        tracing::debug!(
            rules = metrics.rules.len(),
            skipped = metrics.skipped.len(),
            leaves = metrics.leaves_visited,
            changed = metrics.leaves_changed,
            elapsed = ?metrics.total,
            "transformation pass finished"
        );
        (out, metrics)
    }

    fn transform_node(&self, node: &Node, metrics: &mut Option<&mut TransformMetrics>) -> Node {
        match node {
            Node::Block { kind, children } => Node::Block {
                kind: kind.clone(),
                children: children.iter().map(|c| self.transform_node(c, metrics)).collect(),
            },
            Node::Leaf { text, marks } => {
                if let Some(m) = metrics.as_deref_mut() {
                    m.leaves_visited += 1;
                }
                if text.is_empty() {
                    return node.clone();
                }
                let new_text = self.fold_text(text, metrics.as_deref_mut());
                if new_text != *text {
                    if let Some(m) = metrics.as_deref_mut() {
                        m.leaves_changed += 1;
                    }
                }
                Node::Leaf { text: new_text, marks: *marks }
            }
        }
    }

    fn fold_text(&self, text: &str, mut metrics: Option<&mut TransformMetrics>) -> String {
        let mut current = text.to_string();
        for (idx, compiled) in self.compiled.rules.iter().enumerate() {
            let (next, count) = compiled.matcher.replace_all(&current, compiled.replacement());
            if count == 0 {
                continue;
            }
            tracing::trace!(rule_id = %compiled.rule.id, replacements = count, "rule applied");
            if let Some(m) = metrics.as_deref_mut() {
                let outcome = &mut m.rules[idx];
                outcome.replacements += count;
                outcome.leaves_touched += 1;
            }
            current = next.into_owned();
        }
        current
    }
}

/// Apply `rule_ids`, in order, to every leaf of `doc`.
///
/// Ids that do not resolve to an enabled rule in `source` are skipped; an
/// empty id list or an empty document returns `doc` unchanged.
pub fn transform<S, I>(doc: &Document, source: &S, rule_ids: &[I]) -> Document
where
    S: RuleSource + ?Sized,
    I: AsRef<str>,
{
    if rule_ids.is_empty() || doc.is_empty() {
        return doc.clone();
    }
    Transformer::new(source, rule_ids).run(doc)
}
