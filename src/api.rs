use crate::document::{Document, TextStats};
use crate::engine::{SurfaceScan, TransformMetrics, Transformer};
use crate::score::{ScoreBreakdown, human_likeness_score, score_breakdown};
use crate::store::{RuleStore, StoreError};
use serde::Serialize;
use std::time::{Duration, Instant};

/// Which rules a cleaning pass runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RuleSelection {
    /// The store's default preset.
    #[default]
    DefaultPreset,
    /// A preset by id.
    Preset(String),
    /// An explicit, ordered rule id list.
    Rules(Vec<String>),
}

/// Options that affect a cleaning pass.
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub selection: RuleSelection,
}

impl Options {
    pub fn preset(id: impl Into<String>) -> Self {
        Options { selection: RuleSelection::Preset(id.into()) }
    }

    pub fn rules<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Options { selection: RuleSelection::Rules(ids.into_iter().map(Into::into).collect()) }
    }
}

/// Result from [`clean`] and [`clean_with`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResult {
    pub document: Document,
    pub plain_text: String,
    pub score_before: u8,
    pub score_after: u8,
    pub stats: TextStats,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Additional details returned by [`clean_verbose_with`].
///
/// Meant for reports and rule debugging; the plain [`clean_with`] path never
/// computes them.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanDetails {
    /// Preset the rule list came from, if any.
    pub preset: Option<String>,
    /// Rule ids in the order they ran.
    pub active_rules: Vec<String>,
    pub metrics: TransformMetrics,
    pub surface_before: SurfaceScan,
    pub surface_after: SurfaceScan,
    pub breakdown_before: Option<ScoreBreakdown>,
    pub breakdown_after: Option<ScoreBreakdown>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanResultVerbose {
    #[serde(flatten)]
    pub result: CleanResult,
    pub details: CleanDetails,
}

/// Clean plain `text` with the store's default preset.
///
/// # Example
/// ```
/// use veiltext::{RuleStore, clean};
///
/// let store = RuleStore::new();
/// let out = clean("\u{201C}Smart\u{201D} quotes\u{2026}", &store);
/// assert_eq!(out.plain_text, "\"Smart\" quotes...");
/// ```
pub fn clean(text: &str, store: &RuleStore) -> CleanResult {
    let ids = store.default_preset().map(|p| p.rule_ids.clone()).unwrap_or_default();
    run(&Document::from_plain_text(text), store, &ids)
}

/// Clean `doc` with the rules selected by `options`.
///
/// Fails only when `options` names a preset the store does not have; stale
/// rule ids inside a selection are skipped.
pub fn clean_with(doc: &Document, store: &RuleStore, options: &Options) -> Result<CleanResult, StoreError> {
    let (_, ids) = selected_ids(store, &options.selection)?;
    Ok(run(doc, store, &ids))
}

/// Like [`clean_with`], also returning per-rule metrics, surface scans and score
/// breakdowns.
pub fn clean_verbose_with(
    doc: &Document,
    store: &RuleStore,
    options: &Options,
) -> Result<CleanResultVerbose, StoreError> {
    let start = Instant::now();
    let (preset, ids) = selected_ids(store, &options.selection)?;

    let transformer = Transformer::new(store, &ids);
    let active_rules = transformer.compiled().active_ids().into_iter().map(str::to_string).collect();
    let (document, metrics) = transformer.run_with_metrics(doc);

    let before = doc.plain_text();
    let plain_text = document.plain_text();
    let details = CleanDetails {
        preset,
        active_rules,
        metrics,
        surface_before: SurfaceScan::scan(&before),
        surface_after: SurfaceScan::scan(&plain_text),
        breakdown_before: score_breakdown(&before),
        breakdown_after: score_breakdown(&plain_text),
    };

    let result = CleanResult {
        score_before: human_likeness_score(&before),
        score_after: human_likeness_score(&plain_text),
        stats: TextStats::of(&plain_text),
        document,
        plain_text,
        elapsed: start.elapsed(),
    };
    Ok(CleanResultVerbose { result, details })
}

fn run(doc: &Document, store: &RuleStore, ids: &[String]) -> CleanResult {
    let start = Instant::now();
    let before = doc.plain_text();
    let document = crate::engine::transform(doc, store, ids);
    let plain_text = document.plain_text();

    CleanResult {
        score_before: human_likeness_score(&before),
        score_after: human_likeness_score(&plain_text),
        stats: TextStats::of(&plain_text),
        document,
        plain_text,
        elapsed: start.elapsed(),
    }
}

fn selected_ids(store: &RuleStore, selection: &RuleSelection) -> Result<(Option<String>, Vec<String>), StoreError> {
    match selection {
        RuleSelection::DefaultPreset => {
            Ok(store.default_preset().map_or((None, Vec::new()), |p| (Some(p.id.clone()), p.rule_ids.clone())))
        }
        RuleSelection::Preset(id) => store
            .get_preset(id)
            .map(|p| (Some(p.id.clone()), p.rule_ids.clone()))
            .ok_or_else(|| StoreError::PresetNotFound(id.clone())),
        RuleSelection::Rules(ids) => Ok((None, ids.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{BlockKind, Node};
    use pretty_assertions::assert_eq;

    #[test]
    fn clean_uses_the_default_preset() {
        let store = RuleStore::new();
        let out = clean("It\u{2019}s\u{200B} a \u{2014} test\u{2026}", &store);
        assert_eq!(out.plain_text, "It's a - test...");
        assert_eq!(out.score_after, human_likeness_score("It's a - test..."));
    }

    #[test]
    fn clean_with_selects_presets_and_rule_lists() {
        let store = RuleStore::new();
        let doc = Document::new(vec![Node::paragraph("\u{2018}a\u{2019}\u{00A0}\u{2022}")]);

        let creative = clean_with(&doc, &store, &Options::preset("preset-creative")).unwrap();
        assert_eq!(creative.plain_text, "\u{2018}a\u{2019}\u{00A0}\u{2022}");

        let technical = clean_with(&doc, &store, &Options::preset("preset-technical")).unwrap();
        // rule-7 is in the technical preset but disabled
        assert_eq!(technical.plain_text, "'a'\u{00A0}*");

        let explicit = clean_with(&doc, &store, &Options::rules(["rule-5", "rule-2"])).unwrap();
        assert_eq!(explicit.plain_text, "'a'\u{00A0}*");
    }

    #[test]
    fn unknown_preset_is_an_error() {
        let store = RuleStore::new();
        let err = clean_with(&Document::empty(), &store, &Options::preset("nope")).unwrap_err();
        assert!(matches!(err, StoreError::PresetNotFound(id) if id == "nope"));
    }

    #[test]
    fn verbose_reports_metrics_and_scans() {
        let store = RuleStore::new();
        let doc = Document::new(vec![
            Node::block(BlockKind::HeadingOne, vec![Node::text("Title\u{2026}")]),
            Node::paragraph("\u{201C}quoted\u{201D}"),
        ]);
        let out = clean_verbose_with(&doc, &store, &Options::default()).unwrap();

        assert_eq!(out.result.plain_text, "Title...\n\"quoted\"");
        assert!(out.result.document.same_shape(&doc));
        assert_eq!(out.details.preset.as_deref(), Some("preset-default"));
        assert_eq!(out.details.active_rules.len(), 6);
        assert_eq!(out.details.metrics.total_replacements(), 3);
        assert_eq!(out.details.surface_before.total(), 3);
        assert!(out.details.surface_after.is_clean());
        assert!(out.details.breakdown_before.is_some());
    }

    #[test]
    fn empty_document_scores_zero() {
        let store = RuleStore::new();
        let out = clean_with(&Document::empty(), &store, &Options::default()).unwrap();
        assert_eq!(out.plain_text, "");
        assert_eq!((out.score_before, out.score_after), (0, 0));
    }
}
