//! Built-in rule catalog and presets.

use crate::{RulePreset, TransformationRule};

pub(crate) fn default_rules() -> Vec<TransformationRule> {
    vec![
        rule!(
            id: "rule-1",
            name: "Replace Dashes",
            description: "Replace all dash variants with standard hyphen",
            replace: "U+2012–U+2015, U+2212" => "-",
        ),
        rule!(
            id: "rule-2",
            name: "Smart Single Quotes",
            description: "Replace smart single quotes with standard apostrophe",
            replace: "U+2018, U+2019, U+201A, U+201B, U+2032–U+2035" => "'",
        ),
        rule!(
            id: "rule-3",
            name: "Smart Double Quotes",
            description: "Replace smart double quotes with standard quotation marks",
            replace: "U+201C–U+201F, U+2033, U+2036, U+00AB, U+00BB" => "\"",
        ),
        rule!(
            id: "rule-4",
            name: "Ellipsis",
            description: "Replace ellipsis character with periods",
            replace: "U+2026" => "...",
        ),
        rule!(
            id: "rule-5",
            name: "Bullets",
            description: "Replace bullet and mid-dot characters with asterisk",
            replace: "U+2022, U+00B7" => "*",
        ),
        rule!(
            id: "rule-6",
            name: "Remove Invisibles",
            description: "Remove invisible Unicode characters",
            remove: "U+00AD, U+180E, U+200B–U+200F, U+202A–U+202E, U+2060–U+206F, U+FE00–U+FE0F, U+FEFF",
        ),
        rule!(
            id: "rule-7",
            name: "Unicode Spaces",
            description: "Normalize all space variants to ASCII space",
            replace: "U+00A0, U+1680, U+2000–U+200A, U+202F, U+205F, U+3000" => " ",
            enabled: false,
        ),
    ]
}

pub(crate) fn default_presets(rules: &[TransformationRule]) -> Vec<RulePreset> {
    let preset = |id: &str, name: &str, ids: &[&str], is_default: bool| RulePreset {
        id: id.to_string(),
        name: name.to_string(),
        rule_ids: ids.iter().map(|s| s.to_string()).collect(),
        is_default,
    };

    let enabled: Vec<&str> = rules.iter().filter(|r| r.enabled).map(|r| r.id.as_str()).collect();

    vec![
        preset("preset-default", "Default Preset", &enabled, true),
        preset("preset-academic", "Academic Publishing", &["rule-1", "rule-2", "rule-3", "rule-4", "rule-6"], false),
        preset(
            "preset-technical",
            "Technical Writing",
            &["rule-1", "rule-2", "rule-3", "rule-4", "rule-5", "rule-6", "rule-7"],
            false,
        ),
        preset("preset-creative", "Creative Fiction", &["rule-1", "rule-3", "rule-6"], false),
    ]
}
