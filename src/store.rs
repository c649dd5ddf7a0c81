//! Rule and preset store.
//!
//! [`RuleStore`] owns the rule catalog, the presets (ordered groups of rule
//! ids) and a small detection log. It is plain data access: no transformation
//! logic lives here, and the engine only reads it through
//! [`RuleSource`](crate::engine::RuleSource).
//!
//! ## Invariants
//!
//! - Rule ids are unique.
//! - Deleting a rule removes its id from every preset (no orphan references).
//! - At most one preset has `is_default`; setting a new default clears the old
//!   one. [`RuleStore::default_preset`] falls back to the first preset when
//!   none is flagged.
//! - There is always at least one preset: the default preset and the last
//!   remaining preset cannot be deleted.
//!
//! Failed operations never leave a partial mutation behind.
//!
//! The store can be persisted as a JSON snapshot (`{"rules": [...],
//! "presets": [...]}`) with [`RuleStore::load`] / [`RuleStore::save`].

#[path = "store/defaults.rs"]
mod defaults;

use crate::engine::RuleSource;
use crate::{NewPreset, NewRule, RulePreset, TransformationRule};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("rule '{0}' not found")]
    RuleNotFound(String),

    #[error("preset '{0}' not found")]
    PresetNotFound(String),

    #[error("rule '{0}' already exists")]
    DuplicateRule(String),

    #[error("invalid rule: {0}")]
    InvalidRule(String),

    #[error("invalid preset: {0}")]
    InvalidPreset(String),

    #[error("preset '{0}' is the default preset and cannot be deleted")]
    DefaultPresetProtected(String),

    #[error("preset '{0}' is the only preset and cannot be deleted")]
    LastPresetProtected(String),

    #[error("failed to access catalog '{path}': {source}")]
    Io { path: PathBuf, source: std::io::Error },

    #[error("catalog '{path}' is not valid: {source}")]
    Json { path: PathBuf, source: serde_json::Error },
}

/// Serializable snapshot of a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub rules: Vec<TransformationRule>,
    #[serde(default)]
    pub presets: Vec<RulePreset>,
}

/// One scoring event, kept for analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionLog {
    pub id: u64,
    pub text_length: usize,
    pub original_score: Option<u8>,
    pub cleaned_score: Option<u8>,
    pub detector_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDetectionLog {
    pub text_length: usize,
    #[serde(default)]
    pub original_score: Option<u8>,
    #[serde(default)]
    pub cleaned_score: Option<u8>,
    #[serde(default)]
    pub detector_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: Vec<TransformationRule>,
    presets: Vec<RulePreset>,
    logs: Vec<DetectionLog>,
    next_rule: u64,
    next_preset: u64,
    next_log: u64,
}

impl Default for RuleStore {
    fn default() -> Self {
        let rules = defaults::default_rules();
        let presets = defaults::default_presets(&rules);
        RuleStore::assemble(rules, presets)
    }
}

impl RuleStore {
    /// A store seeded with the built-in catalog.
    pub fn new() -> Self {
        RuleStore::default()
    }

    /// Build a store from a snapshot.
    ///
    /// An empty snapshot yields the built-in catalog. A snapshot with rules but
    /// no presets gets a single default preset holding every enabled rule.
    /// Several presets flagged default keep only the first flag.
    pub fn from_catalog(catalog: Catalog) -> Result<Self, StoreError> {
        let Catalog { rules, mut presets } = catalog;
        if rules.is_empty() && presets.is_empty() {
            return Ok(RuleStore::default());
        }

        for (idx, rule) in rules.iter().enumerate() {
            validate_rule_fields(&rule.name, &rule.pattern)?;
            if rules[..idx].iter().any(|r| r.id == rule.id) {
                return Err(StoreError::DuplicateRule(rule.id.clone()));
            }
        }

        if presets.is_empty() {
            presets.push(RulePreset {
                id: "preset-default".to_string(),
                name: "Default Preset".to_string(),
                rule_ids: rules.iter().filter(|r| r.enabled).map(|r| r.id.clone()).collect(),
                is_default: true,
            });
        }

        let mut seen_default = false;
        for preset in &mut presets {
            if preset.is_default && seen_default {
                tracing::warn!(preset_id = %preset.id, "catalog flags several default presets; keeping the first");
                preset.is_default = false;
            }
            seen_default |= preset.is_default;
        }

        Ok(RuleStore::assemble(rules, presets))
    }

    /// Read a JSON snapshot from `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let raw =
            std::fs::read_to_string(path).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        let catalog: Catalog =
            serde_json::from_str(&raw).map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), rules = catalog.rules.len(), presets = catalog.presets.len(), "catalog loaded");
        RuleStore::from_catalog(catalog)
    }

    /// Write the current rules and presets to `path` as JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(&self.catalog())
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })?;
        std::fs::write(path, json).map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        tracing::info!(path = %path.display(), "catalog saved");
        Ok(())
    }

    pub fn catalog(&self) -> Catalog {
        Catalog { rules: self.rules.clone(), presets: self.presets.clone() }
    }

    fn assemble(rules: Vec<TransformationRule>, presets: Vec<RulePreset>) -> Self {
        let next_rule = next_counter(rules.iter().map(|r| r.id.as_str()), "rule-");
        let next_preset = next_counter(presets.iter().map(|p| p.id.as_str()), "preset-");
        RuleStore { rules, presets, logs: Vec::new(), next_rule, next_preset, next_log: 1 }
    }

    // --- Rules ----------------------------------------------------------------

    pub fn list_rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    pub fn get_rule(&self, id: &str) -> Option<&TransformationRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Add a rule. A missing id is generated as `rule-<n>`.
    pub fn create_rule(&mut self, new: NewRule) -> Result<TransformationRule, StoreError> {
        validate_rule_fields(&new.name, &new.pattern)?;

        let id = match new.id.as_deref().map(str::trim) {
            Some("") => return Err(StoreError::InvalidRule("id must not be blank".to_string())),
            Some(id) if self.get_rule(id).is_some() => return Err(StoreError::DuplicateRule(id.to_string())),
            Some(id) => id.to_string(),
            None => self.fresh_rule_id(),
        };

        warn_on_code_replacement(&id, &new.replacement);
        let rule = TransformationRule {
            id,
            name: new.name,
            description: new.description,
            kind: new.kind,
            pattern: new.pattern,
            replacement: new.replacement,
            enabled: new.enabled,
        };
        tracing::info!(rule_id = %rule.id, "rule created");
        self.rules.push(rule.clone());
        Ok(rule)
    }

    /// Replace every field of rule `id` except the id itself.
    pub fn update_rule(&mut self, id: &str, new: NewRule) -> Result<TransformationRule, StoreError> {
        validate_rule_fields(&new.name, &new.pattern)?;
        let rule = self.rules.iter_mut().find(|r| r.id == id).ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;

        warn_on_code_replacement(id, &new.replacement);
        rule.name = new.name;
        rule.description = new.description;
        rule.kind = new.kind;
        rule.pattern = new.pattern;
        rule.replacement = new.replacement;
        rule.enabled = new.enabled;
        tracing::info!(rule_id = id, "rule updated");
        Ok(rule.clone())
    }

    /// Delete rule `id` and excise it from every preset.
    pub fn delete_rule(&mut self, id: &str) -> Result<(), StoreError> {
        let idx = self.rules.iter().position(|r| r.id == id).ok_or_else(|| StoreError::RuleNotFound(id.to_string()))?;
        self.rules.remove(idx);

        for preset in &mut self.presets {
            preset.rule_ids.retain(|rule_id| rule_id != id);
        }
        tracing::info!(rule_id = id, "rule deleted");
        Ok(())
    }

    // --- Presets --------------------------------------------------------------

    pub fn list_presets(&self) -> &[RulePreset] {
        &self.presets
    }

    pub fn get_preset(&self, id: &str) -> Option<&RulePreset> {
        self.presets.iter().find(|p| p.id == id)
    }

    /// The preset flagged default, else the first preset.
    ///
    /// Always `Some` for stores built by this module, which never drop their
    /// last preset.
    pub fn default_preset(&self) -> Option<&RulePreset> {
        self.presets.iter().find(|p| p.is_default).or_else(|| self.presets.first())
    }

    /// Capture `rule_ids` verbatim (duplicates and unknown ids included) as a
    /// new, non-default preset.
    pub fn save_preset(&mut self, name: impl Into<String>, rule_ids: Vec<String>) -> RulePreset {
        let preset = RulePreset { id: self.fresh_preset_id(), name: name.into(), rule_ids, is_default: false };
        tracing::info!(preset_id = %preset.id, "preset saved");
        self.presets.push(preset.clone());
        preset
    }

    /// Add a preset; `is_default` clears every other default.
    pub fn create_preset(&mut self, new: NewPreset) -> Result<RulePreset, StoreError> {
        validate_preset_name(&new.name)?;
        if new.is_default {
            self.clear_default();
        }
        let preset =
            RulePreset { id: self.fresh_preset_id(), name: new.name, rule_ids: new.rule_ids, is_default: new.is_default };
        tracing::info!(preset_id = %preset.id, "preset created");
        self.presets.push(preset.clone());
        Ok(preset)
    }

    /// Replace the name and rule ids of preset `id`. Passing `is_default`
    /// makes it the default; the current default cannot be un-flagged this way
    /// (use [`RuleStore::set_default_preset`] on another preset).
    pub fn update_preset(&mut self, id: &str, new: NewPreset) -> Result<RulePreset, StoreError> {
        validate_preset_name(&new.name)?;
        if self.get_preset(id).is_none() {
            return Err(StoreError::PresetNotFound(id.to_string()));
        }
        if new.is_default {
            self.clear_default();
        }

        let preset = self
            .presets
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| StoreError::PresetNotFound(id.to_string()))?;
        preset.name = new.name;
        preset.rule_ids = new.rule_ids;
        preset.is_default |= new.is_default;
        tracing::info!(preset_id = id, "preset updated");
        Ok(preset.clone())
    }

    /// Delete preset `id`. The default preset and the last preset are protected.
    pub fn delete_preset(&mut self, id: &str) -> Result<(), StoreError> {
        let idx =
            self.presets.iter().position(|p| p.id == id).ok_or_else(|| StoreError::PresetNotFound(id.to_string()))?;
        if self.presets[idx].is_default {
            return Err(StoreError::DefaultPresetProtected(id.to_string()));
        }
        if self.presets.len() == 1 {
            return Err(StoreError::LastPresetProtected(id.to_string()));
        }
        self.presets.remove(idx);
        tracing::info!(preset_id = id, "preset deleted");
        Ok(())
    }

    /// Make `id` the single default preset.
    pub fn set_default_preset(&mut self, id: &str) -> Result<&RulePreset, StoreError> {
        let idx =
            self.presets.iter().position(|p| p.id == id).ok_or_else(|| StoreError::PresetNotFound(id.to_string()))?;
        for (i, preset) in self.presets.iter_mut().enumerate() {
            preset.is_default = i == idx;
        }
        tracing::info!(preset_id = id, "default preset changed");
        Ok(&self.presets[idx])
    }

    // --- Detection log ----------------------------------------------------------

    pub fn log_detection(&mut self, new: NewDetectionLog) -> DetectionLog {
        let log = DetectionLog {
            id: self.next_log,
            text_length: new.text_length,
            original_score: new.original_score,
            cleaned_score: new.cleaned_score,
            detector_name: new.detector_name,
            created_at: Utc::now(),
        };
        self.next_log += 1;
        self.logs.push(log.clone());
        log
    }

    pub fn detection_logs(&self) -> &[DetectionLog] {
        &self.logs
    }

    // --- Helpers ------------------------------------------------------------------

    fn clear_default(&mut self) {
        self.presets.iter_mut().for_each(|p| p.is_default = false);
    }

    fn fresh_rule_id(&mut self) -> String {
        loop {
            let id = format!("rule-{}", self.next_rule);
            self.next_rule += 1;
            if self.get_rule(&id).is_none() {
                return id;
            }
        }
    }

    fn fresh_preset_id(&mut self) -> String {
        loop {
            let id = format!("preset-{}", self.next_preset);
            self.next_preset += 1;
            if self.get_preset(&id).is_none() {
                return id;
            }
        }
    }
}

impl RuleSource for RuleStore {
    fn rule(&self, id: &str) -> Option<&TransformationRule> {
        self.get_rule(id)
    }
}

fn validate_rule_fields(name: &str, pattern: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidRule("name must not be empty".to_string()));
    }
    if pattern.is_empty() {
        return Err(StoreError::InvalidRule("pattern must not be empty".to_string()));
    }
    Ok(())
}

fn validate_preset_name(name: &str) -> Result<(), StoreError> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidPreset("name must not be empty".to_string()));
    }
    Ok(())
}

// Replacement text is always inserted literally; something shaped like a
// callback is almost certainly a mistake.
fn warn_on_code_replacement(rule_id: &str, replacement: &str) {
    if replacement.contains("=>") || replacement.starts_with("function") {
        tracing::warn!(rule_id, replacement, "replacement looks like code; it will be inserted literally");
    }
}

/// First counter value above every `<prefix><n>` id already in use.
fn next_counter<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> u64 {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<u64>().ok()).max().map_or(1, |n| n + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RuleKind;
    use pretty_assertions::assert_eq;

    fn ids(preset: &RulePreset) -> Vec<&str> {
        preset.rule_ids.iter().map(String::as_str).collect()
    }

    #[test]
    fn default_catalog_is_seeded() {
        let store = RuleStore::new();
        assert_eq!(store.list_rules().len(), 7);
        assert_eq!(store.list_presets().len(), 4);

        let default = store.default_preset().unwrap();
        assert_eq!(default.id, "preset-default");
        assert_eq!(ids(default), vec!["rule-1", "rule-2", "rule-3", "rule-4", "rule-5", "rule-6"]);
        assert!(!store.get_rule("rule-7").unwrap().enabled);
    }

    #[test]
    fn create_rule_generates_unique_ids() {
        let mut store = RuleStore::new();
        let a = store.create_rule(NewRule::replace("A", "a", "b")).unwrap();
        let b = store.create_rule(NewRule::remove("B", "b")).unwrap();
        assert_eq!(a.id, "rule-8");
        assert_eq!(b.id, "rule-9");
        assert_eq!(b.kind, RuleKind::Remove);
        assert_eq!(store.get_rule("rule-9"), Some(&b));
    }

    #[test]
    fn create_rule_rejects_invalid_payloads() {
        let mut store = RuleStore::new();
        assert!(matches!(store.create_rule(NewRule::replace("", "a", "b")), Err(StoreError::InvalidRule(_))));
        assert!(matches!(store.create_rule(NewRule::replace("x", "", "b")), Err(StoreError::InvalidRule(_))));
        assert!(matches!(
            store.create_rule(NewRule::replace("x", "a", "b").with_id("rule-1")),
            Err(StoreError::DuplicateRule(_))
        ));
        assert_eq!(store.list_rules().len(), 7);
    }

    #[test]
    fn update_rule_keeps_id() {
        let mut store = RuleStore::new();
        let updated = store.update_rule("rule-4", NewRule::replace("Dots", "U+2026", "..").with_id("other")).unwrap();
        assert_eq!(updated.id, "rule-4");
        assert_eq!(store.get_rule("rule-4").unwrap().replacement, "..");
        assert!(matches!(store.update_rule("nope", NewRule::remove("x", "y")), Err(StoreError::RuleNotFound(_))));
    }

    #[test]
    fn deleting_a_rule_cascades_into_presets() {
        let mut store = RuleStore::new();
        store.delete_rule("rule-3").unwrap();

        assert!(store.get_rule("rule-3").is_none());
        for preset in store.list_presets() {
            assert!(!preset.rule_ids.iter().any(|id| id == "rule-3"), "{} still references rule-3", preset.id);
        }
        assert_eq!(ids(store.get_preset("preset-creative").unwrap()), vec!["rule-1", "rule-6"]);
        assert!(matches!(store.delete_rule("rule-3"), Err(StoreError::RuleNotFound(_))));
    }

    #[test]
    fn save_preset_keeps_ids_verbatim() {
        let mut store = RuleStore::new();
        let ids_in = vec!["rule-2".to_string(), "ghost".to_string(), "rule-2".to_string()];
        let preset = store.save_preset("Mine", ids_in.clone());
        assert_eq!(preset.rule_ids, ids_in);
        assert!(!preset.is_default);
        assert_eq!(store.get_preset(&preset.id), Some(&preset));
        assert_ne!(store.save_preset("Again", vec![]).id, preset.id);
    }

    #[test]
    fn set_default_preset_leaves_exactly_one_default() {
        let mut store = RuleStore::new();
        store.set_default_preset("preset-academic").unwrap();

        let defaults: Vec<_> = store.list_presets().iter().filter(|p| p.is_default).map(|p| p.id.as_str()).collect();
        assert_eq!(defaults, vec!["preset-academic"]);
        assert_eq!(store.default_preset().unwrap().id, "preset-academic");
    }

    #[test]
    fn set_default_preset_with_unknown_id_changes_nothing() {
        let mut store = RuleStore::new();
        assert!(matches!(store.set_default_preset("nope"), Err(StoreError::PresetNotFound(_))));
        assert_eq!(store.default_preset().unwrap().id, "preset-default");
    }

    #[test]
    fn create_and_update_preset_move_the_default_flag() {
        let mut store = RuleStore::new();
        let created = store
            .create_preset(NewPreset { name: "New".into(), rule_ids: vec!["rule-1".into()], is_default: true })
            .unwrap();
        assert_eq!(store.default_preset().unwrap().id, created.id);
        assert_eq!(store.list_presets().iter().filter(|p| p.is_default).count(), 1);

        store
            .update_preset("preset-creative", NewPreset { name: "Fiction".into(), rule_ids: vec![], is_default: true })
            .unwrap();
        assert_eq!(store.default_preset().unwrap().id, "preset-creative");
        assert_eq!(store.list_presets().iter().filter(|p| p.is_default).count(), 1);

        assert!(matches!(
            store.create_preset(NewPreset { name: " ".into(), rule_ids: vec![], is_default: false }),
            Err(StoreError::InvalidPreset(_))
        ));
    }

    #[test]
    fn default_and_last_presets_cannot_be_deleted() {
        let mut store = RuleStore::new();
        assert!(matches!(store.delete_preset("preset-default"), Err(StoreError::DefaultPresetProtected(_))));
        store.delete_preset("preset-academic").unwrap();
        store.delete_preset("preset-technical").unwrap();
        store.delete_preset("preset-creative").unwrap();
        assert_eq!(store.list_presets().len(), 1);

        let mut lone = RuleStore::from_catalog(Catalog {
            rules: store.list_rules().to_vec(),
            presets: vec![RulePreset { id: "p".into(), name: "P".into(), rule_ids: vec![], is_default: false }],
        })
        .unwrap();
        assert!(matches!(lone.delete_preset("p"), Err(StoreError::LastPresetProtected(_))));
        assert_eq!(lone.default_preset().unwrap().id, "p");
    }

    #[test]
    fn from_catalog_fills_missing_presets_and_extra_defaults() {
        let rules = vec![
            rule!(id: "a", name: "A", description: "", replace: "x" => "y"),
            rule!(id: "b", name: "B", description: "", remove: "z", enabled: false),
        ];
        let store = RuleStore::from_catalog(Catalog { rules: rules.clone(), presets: vec![] }).unwrap();
        assert_eq!(ids(store.default_preset().unwrap()), vec!["a"]);

        let two_defaults = vec![
            RulePreset { id: "p1".into(), name: "1".into(), rule_ids: vec![], is_default: true },
            RulePreset { id: "p2".into(), name: "2".into(), rule_ids: vec![], is_default: true },
        ];
        let store = RuleStore::from_catalog(Catalog { rules, presets: two_defaults }).unwrap();
        assert_eq!(store.list_presets().iter().filter(|p| p.is_default).count(), 1);
        assert_eq!(store.default_preset().unwrap().id, "p1");

        let empty = RuleStore::from_catalog(Catalog::default()).unwrap();
        assert_eq!(empty.list_rules().len(), 7);
    }

    #[test]
    fn from_catalog_rejects_duplicate_rule_ids() {
        let rules = vec![
            rule!(id: "a", name: "A", description: "", replace: "x" => "y"),
            rule!(id: "a", name: "A again", description: "", replace: "x" => "z"),
        ];
        assert!(matches!(RuleStore::from_catalog(Catalog { rules, presets: vec![] }), Err(StoreError::DuplicateRule(_))));
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");

        let mut store = RuleStore::new();
        store.create_rule(NewRule::replace("Copyright", "(c)", "\u{00A9}")).unwrap();
        store.set_default_preset("preset-technical").unwrap();
        store.save(&path).unwrap();

        let loaded = RuleStore::load(&path).unwrap();
        assert_eq!(loaded.catalog(), store.catalog());
        assert_eq!(loaded.default_preset().unwrap().id, "preset-technical");
    }

    #[test]
    fn load_reports_missing_and_malformed_files() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(RuleStore::load(dir.path().join("missing.json")), Err(StoreError::Io { .. })));

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, "{ not json").unwrap();
        assert!(matches!(RuleStore::load(&bad), Err(StoreError::Json { .. })));
    }

    #[test]
    fn detection_log_assigns_ids() {
        let mut store = RuleStore::new();
        let first = store.log_detection(NewDetectionLog {
            text_length: 10,
            original_score: Some(50),
            cleaned_score: Some(60),
            detector_name: Some("local".into()),
        });
        let second = store.log_detection(NewDetectionLog {
            text_length: 3,
            original_score: None,
            cleaned_score: None,
            detector_name: None,
        });
        assert_eq!((first.id, second.id), (1, 2));
        assert_eq!(store.detection_logs().len(), 2);
    }
}
