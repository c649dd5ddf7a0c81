#[macro_export]
macro_rules! regex {
    ($pat:literal) => {{
        static RE: once_cell::sync::Lazy<regex::Regex> =
            once_cell::sync::Lazy::new(|| regex::Regex::new($pat).unwrap());
        &*RE
    }};
}

/// Build a catalog [`TransformationRule`](crate::TransformationRule).
///
/// ```text
/// rule!(id: "rule-4", name: "Ellipsis", description: "...", replace: "U+2026" => "...")
/// rule!(id: "rule-6", name: "Remove Invisibles", description: "...", remove: "U+200B–U+200F", enabled: false)
/// ```
#[macro_export]
macro_rules! rule {
    (
        id: $id:expr,
        name: $name:expr,
        description: $desc:expr
        , replace: $pattern:expr => $replacement:expr
        $(, enabled: $enabled:expr)?
        $(,)?
    ) => {{
        $crate::TransformationRule {
            id: $id.to_string(),
            name: $name.to_string(),
            description: $desc.to_string(),
            kind: $crate::RuleKind::Replace,
            pattern: $pattern.to_string(),
            replacement: $replacement.to_string(),
            enabled: { true $(&& $enabled)? },
        }
    }};
    (
        id: $id:expr,
        name: $name:expr,
        description: $desc:expr
        , remove: $pattern:expr
        $(, enabled: $enabled:expr)?
        $(,)?
    ) => {{
        $crate::TransformationRule {
            id: $id.to_string(),
            name: $name.to_string(),
            description: $desc.to_string(),
            kind: $crate::RuleKind::Remove,
            pattern: $pattern.to_string(),
            replacement: String::new(),
            enabled: { true $(&& $enabled)? },
        }
    }};
}
