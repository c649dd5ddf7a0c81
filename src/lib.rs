use serde::{Deserialize, Serialize};

#[macro_use]
mod macros;
pub mod admin;
mod api;
pub mod detect;
pub mod document;
mod engine;
mod score;
pub mod store;

pub use api::{
    CleanDetails, CleanResult, CleanResultVerbose, Options, RuleSelection, clean, clean_verbose_with, clean_with,
};
pub use detect::{DetectError, DetectionResponse, DetectionResult, Detector, DetectorPanel, LocalDetector};
pub use document::{BlockKind, Document, Marks, Node, TextStats};
pub use engine::{
    CodePointSet, CompiledRule, CompiledRules, Matcher, PatternError, PatternGrammar, RuleOutcome, RuleSkip,
    RuleSource, SkipReason, SurfaceMask, SurfaceScan, TransformMetrics, Transformer, compile_pattern, transform,
};
pub use score::{ScoreBreakdown, human_likeness_score, score_breakdown};
pub use store::{Catalog, DetectionLog, NewDetectionLog, RuleStore, StoreError};

// --- Rule catalog types -----------------------------------------------------

/// What a rule does with the text its pattern matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    /// Substitute every match with the rule's `replacement`.
    Replace,
    /// Delete every match.
    Remove,
}

/// A named, user-configurable transformation.
///
/// `pattern` uses one of three grammars (see [`compile_pattern`]):
///
/// ```text
/// U+2018, U+2019, U+2032–U+2035   Unicode code points / ranges
/// /\s{2,}/g                      inline regex
/// (c)                            anything else: literal text
/// ```
///
/// `name` and `description` are display metadata only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformationRule {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub pattern: String,
    /// Literal replacement text. Only meaningful for [`RuleKind::Replace`];
    /// an empty replacement deletes matches.
    #[serde(default)]
    pub replacement: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl TransformationRule {
    /// The text every match is substituted with.
    pub fn effective_replacement(&self) -> &str {
        match self.kind {
            RuleKind::Replace => &self.replacement,
            RuleKind::Remove => "",
        }
    }
}

/// An ordered group of rule ids. Rules run in `rule_ids` order, each one
/// seeing the output of the previous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePreset {
    pub id: String,
    pub name: String,
    pub rule_ids: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

/// Payload for creating or updating a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRule {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    pub pattern: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
}

impl NewRule {
    pub fn replace(name: impl Into<String>, pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        NewRule {
            id: None,
            name: name.into(),
            description: String::new(),
            kind: RuleKind::Replace,
            pattern: pattern.into(),
            replacement: replacement.into(),
            enabled: true,
        }
    }

    pub fn remove(name: impl Into<String>, pattern: impl Into<String>) -> Self {
        NewRule {
            id: None,
            name: name.into(),
            description: String::new(),
            kind: RuleKind::Remove,
            pattern: pattern.into(),
            replacement: String::new(),
            enabled: true,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// Payload for creating or updating a preset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPreset {
    pub name: String,
    pub rule_ids: Vec<String>,
    #[serde(default)]
    pub is_default: bool,
}

fn enabled_by_default() -> bool {
    true
}
