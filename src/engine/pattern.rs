//! Pattern compilation.
//!
//! A rule's `pattern` string is written in one of three grammars, recognised in
//! this order:
//!
//! ```text
//! "U+2018, U+2019, U+2032–U+2035"   Unicode notation   -> Matcher::Char / Matcher::Class
//! "/\s{2,}/g"                       inline regex       -> Matcher::Regex (body + flags)
//! "(c)"                             literal text       -> Matcher::Regex (escaped)
//! ```
//!
//! Unicode notation is a comma-separated list whose items are single code points
//! (`U+XXXX`) or inclusive ranges (`U+XXXX–U+YYYY`, en-dash or ASCII hyphen).
//! Exactly one code point compiles to [`Matcher::Char`]; anything else compiles
//! to a [`Matcher::Class`] consuming one code point per match.
//!
//! Inline regex notation is `/<body>/<flags>`, split at the *last* slash. Flags
//! come from the editor's regex dialect: `i`, `m` and `s` map to the matching
//! inline flags, `g` and `u` are accepted and implied (every matcher is global
//! and Unicode-aware). Anything else is rejected.
//!
//! Every matcher is global and stateless: applying it twice to the same text
//! gives the same result, and replacement text is always inserted literally.
//!
//! ## Failure policy
//!
//! [`Matcher::compile`] reports a [`PatternError`]. The engine never propagates
//! it: [`Matcher::compile_lossy`] logs the error and yields [`Matcher::Never`],
//! so a single broken rule degrades to a no-op instead of aborting a pass.

use regex::Regex;
use std::borrow::Cow;
use std::ops::RangeInclusive;

const MAX_CODE_POINT: u32 = 0x10FFFF;

#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("pattern is empty")]
    Empty,

    #[error("invalid code point '{0}' in Unicode notation")]
    InvalidCodePoint(String),

    #[error("code point range U+{start:04X}–U+{end:04X} is reversed")]
    ReversedRange { start: u32, end: u32 },

    #[error("'{0}' is not of the form /body/flags")]
    MalformedRegexNotation(String),

    #[error("unsupported or repeated regex flag '{0}'")]
    UnsupportedFlag(char),

    #[error("invalid regex '{pattern}': {source}")]
    InvalidRegex { pattern: String, source: regex::Error },
}

/// Which of the three pattern grammars a pattern string uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PatternGrammar {
    Unicode,
    Regex,
    Literal,
}

impl PatternGrammar {
    pub fn of(pattern: &str) -> Self {
        if pattern.starts_with("U+") {
            PatternGrammar::Unicode
        } else if pattern.starts_with('/') {
            PatternGrammar::Regex
        } else {
            PatternGrammar::Literal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PatternGrammar::Unicode => "unicode",
            PatternGrammar::Regex => "regex",
            PatternGrammar::Literal => "literal",
        }
    }
}

/// Sorted, non-overlapping set of code point ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodePointSet {
    ranges: Vec<RangeInclusive<u32>>,
}

impl CodePointSet {
    fn new(mut ranges: Vec<RangeInclusive<u32>>) -> Self {
        ranges.sort_by_key(|r| *r.start());
        let mut merged: Vec<RangeInclusive<u32>> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if *range.start() <= last.end().saturating_add(1) => {
                    if range.end() > last.end() {
                        *last = *last.start()..=*range.end();
                    }
                }
                _ => merged.push(range),
            }
        }
        CodePointSet { ranges: merged }
    }

    pub fn contains(&self, c: char) -> bool {
        let cp = c as u32;
        self.ranges
            .binary_search_by(|r| {
                if *r.end() < cp {
                    std::cmp::Ordering::Less
                } else if *r.start() > cp {
                    std::cmp::Ordering::Greater
                } else {
                    std::cmp::Ordering::Equal
                }
            })
            .is_ok()
    }

    pub fn ranges(&self) -> &[RangeInclusive<u32>] {
        &self.ranges
    }
}

/// Executable form of a rule pattern.
#[derive(Debug, Clone)]
pub enum Matcher {
    /// Exactly one code point.
    Char(char),
    /// Any single code point from the set.
    Class(CodePointSet),
    /// Inline regex or escaped literal.
    Regex(Regex),
    /// Matches nothing; the compiled form of a malformed pattern.
    Never,
}

impl Matcher {
    /// Compile `pattern`, reporting why it is malformed.
    pub fn compile(pattern: &str) -> Result<Self, PatternError> {
        if pattern.is_empty() {
            return Err(PatternError::Empty);
        }

        match PatternGrammar::of(pattern) {
            PatternGrammar::Unicode => compile_unicode(pattern),
            PatternGrammar::Regex => compile_inline_regex(pattern),
            PatternGrammar::Literal => Regex::new(&regex::escape(pattern))
                .map(Matcher::Regex)
                .map_err(|source| PatternError::InvalidRegex { pattern: pattern.to_string(), source }),
        }
    }

    /// Compile `pattern`, degrading to [`Matcher::Never`] on failure.
    pub fn compile_lossy(pattern: &str) -> Self {
        Matcher::compile(pattern).unwrap_or_else(|err| {
            tracing::warn!(pattern, error = %err, "malformed pattern; rule will not match");
            Matcher::Never
        })
    }

    pub fn is_never(&self) -> bool {
        matches!(self, Matcher::Never)
    }

    pub fn is_match(&self, text: &str) -> bool {
        match self {
            Matcher::Char(c) => text.contains(*c),
            Matcher::Class(set) => text.chars().any(|c| set.contains(c)),
            Matcher::Regex(re) => re.is_match(text),
            Matcher::Never => false,
        }
    }

    /// Replace every non-overlapping match with `replacement` (inserted
    /// literally). Returns the new text and the number of matches replaced;
    /// the input is borrowed back untouched when nothing matched.
    pub fn replace_all<'t>(&self, text: &'t str, replacement: &str) -> (Cow<'t, str>, usize) {
        match self {
            Matcher::Char(target) => replace_chars(text, replacement, |c| c == *target),
            Matcher::Class(set) => replace_chars(text, replacement, |c| set.contains(c)),
            Matcher::Regex(re) => {
                let mut out = String::new();
                let mut last = 0;
                let mut count = 0;
                for m in re.find_iter(text) {
                    out.push_str(&text[last..m.start()]);
                    out.push_str(replacement);
                    last = m.end();
                    count += 1;
                }
                if count == 0 {
                    return (Cow::Borrowed(text), 0);
                }
                out.push_str(&text[last..]);
                (Cow::Owned(out), count)
            }
            Matcher::Never => (Cow::Borrowed(text), 0),
        }
    }
}

/// Compile `pattern` into a [`Matcher`]. See the module docs for the grammars.
pub fn compile_pattern(pattern: &str) -> Result<Matcher, PatternError> {
    Matcher::compile(pattern)
}

fn replace_chars<'t>(text: &'t str, replacement: &str, hit: impl Fn(char) -> bool) -> (Cow<'t, str>, usize) {
    let Some(first) = text.find(&hit) else {
        return (Cow::Borrowed(text), 0);
    };

    let mut out = String::with_capacity(text.len());
    out.push_str(&text[..first]);
    let mut count = 0;
    for c in text[first..].chars() {
        if hit(c) {
            out.push_str(replacement);
            count += 1;
        } else {
            out.push(c);
        }
    }
    (Cow::Owned(out), count)
}

// --- Unicode notation ---------------------------------------------------------

fn compile_unicode(pattern: &str) -> Result<Matcher, PatternError> {
    let mut ranges = Vec::new();
    let mut single: Option<char> = None;

    for item in pattern.split(',') {
        let item = item.trim();
        match item.split_once(['–', '-']) {
            Some((start, end)) => {
                let (start, end) = (parse_code_point(start)?, parse_code_point(end)?);
                if start > end {
                    return Err(PatternError::ReversedRange { start, end });
                }
                ranges.push(start..=end);
            }
            None => {
                let cp = parse_code_point(item)?;
                let c = char::from_u32(cp).ok_or_else(|| PatternError::InvalidCodePoint(item.to_string()))?;
                single = Some(c);
                ranges.push(cp..=cp);
            }
        }
    }

    match (ranges.len(), single) {
        (1, Some(c)) => Ok(Matcher::Char(c)),
        _ => Ok(Matcher::Class(CodePointSet::new(ranges))),
    }
}

fn parse_code_point(raw: &str) -> Result<u32, PatternError> {
    let trimmed = raw.trim();
    let hex = trimmed.strip_prefix("U+").or_else(|| trimmed.strip_prefix("u+")).unwrap_or(trimmed);
    let invalid = || PatternError::InvalidCodePoint(raw.trim().to_string());

    if hex.is_empty() || hex.len() > 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let cp = u32::from_str_radix(hex, 16).map_err(|_| invalid())?;
    if cp > MAX_CODE_POINT {
        return Err(invalid());
    }
    Ok(cp)
}

// --- Inline regex notation ------------------------------------------------------

fn compile_inline_regex(pattern: &str) -> Result<Matcher, PatternError> {
    let malformed = || PatternError::MalformedRegexNotation(pattern.to_string());

    let rest = pattern.strip_prefix('/').ok_or_else(malformed)?;
    let slash = rest.rfind('/').ok_or_else(malformed)?;
    let (body, flags) = (&rest[..slash], &rest[slash + 1..]);
    if body.is_empty() {
        return Err(malformed());
    }

    let mut inline = String::new();
    let mut seen = String::new();
    for flag in flags.chars() {
        if seen.contains(flag) {
            return Err(PatternError::UnsupportedFlag(flag));
        }
        seen.push(flag);
        match flag {
            'i' | 'm' | 's' => inline.push(flag),
            'g' | 'u' => {}
            other => return Err(PatternError::UnsupportedFlag(other)),
        }
    }

    let source = if inline.is_empty() { body.to_string() } else { format!("(?{inline}){body}") };
    Regex::new(&source)
        .map(Matcher::Regex)
        .map_err(|source| PatternError::InvalidRegex { pattern: pattern.to_string(), source })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn apply(pattern: &str, text: &str, replacement: &str) -> String {
        Matcher::compile(pattern).unwrap().replace_all(text, replacement).0.into_owned()
    }

    #[test]
    fn grammar_is_chosen_by_prefix() {
        assert_eq!(PatternGrammar::of("U+2026"), PatternGrammar::Unicode);
        assert_eq!(PatternGrammar::of("/a+/g"), PatternGrammar::Regex);
        assert_eq!(PatternGrammar::of("u+2026"), PatternGrammar::Literal);
        assert_eq!(PatternGrammar::of("(c)"), PatternGrammar::Literal);
    }

    #[test]
    fn single_code_point_is_exact_char() {
        let m = Matcher::compile("U+2026").unwrap();
        assert!(matches!(m, Matcher::Char('\u{2026}')));
        assert_eq!(apply("U+2026", "wait\u{2026} what\u{2026}", "..."), "wait... what...");
    }

    #[test]
    fn code_point_list_is_class() {
        let m = Matcher::compile("U+2018,U+2019").unwrap();
        assert!(matches!(m, Matcher::Class(_)));
        assert_eq!(apply("U+2018,U+2019", "\u{2018}hello\u{2019}", "'"), "'hello'");
    }

    #[test]
    fn ranges_accept_en_dash_and_hyphen() {
        let text = "a\u{2012}b\u{2013}c\u{2014}d\u{2015}e\u{2016}";
        assert_eq!(apply("U+2012–U+2015", text, "-"), "a-b-c-d-e\u{2016}");
        assert_eq!(apply("U+2012-U+2015", text, "-"), "a-b-c-d-e\u{2016}");
        assert_eq!(apply("U+2012 – U+2015", text, "-"), "a-b-c-d-e\u{2016}");
    }

    #[test]
    fn lists_mix_several_ranges_and_points() {
        let pattern = "U+00AD, U+180E, U+200B–U+200F, U+202A–U+202E, U+FEFF";
        let text = "in\u{00AD}vis\u{200B}i\u{200F}ble\u{202C}\u{FEFF}!";
        assert_eq!(apply(pattern, text, ""), "invisible!");
    }

    #[test]
    fn hex_is_case_insensitive() {
        assert_eq!(apply("U+00ab, U+00BB", "\u{00AB}x\u{00BB}", "\""), "\"x\"");
        assert_eq!(apply("U+ff01-u+ff5e", "\u{FF21}\u{FF22}c", "?"), "??c");
    }

    #[test]
    fn single_point_range_is_class_not_char() {
        assert!(matches!(Matcher::compile("U+2026-U+2026").unwrap(), Matcher::Class(_)));
    }

    #[test]
    fn malformed_unicode_is_reported() {
        assert!(matches!(Matcher::compile("U+20ZZ"), Err(PatternError::InvalidCodePoint(_))));
        assert!(matches!(Matcher::compile("U+"), Err(PatternError::InvalidCodePoint(_))));
        assert!(matches!(Matcher::compile("U+2019,"), Err(PatternError::InvalidCodePoint(_))));
        assert!(matches!(Matcher::compile("U+110000"), Err(PatternError::InvalidCodePoint(_))));
        assert!(matches!(Matcher::compile("U+D800"), Err(PatternError::InvalidCodePoint(_))));
        assert!(matches!(Matcher::compile("U+2015–U+2012"), Err(PatternError::ReversedRange { .. })));
    }

    #[test]
    fn inline_regex_uses_body_and_flags() {
        assert_eq!(apply("/ {2,}/g", "a  b     c", " "), "a b c");
        assert_eq!(apply("/hello/gi", "Hello HELLO hello", "bye"), "bye bye bye");
        assert_eq!(apply("/^x/gm", "x1\nx2", "y"), "y1\ny2");
        assert_eq!(apply("/[\\uFF01-\\uFF5E]/g", "\u{FF21}b", "_"), "_b");
    }

    #[test]
    fn inline_regex_without_g_is_still_global() {
        assert_eq!(apply("/o/", "foo boo", "0"), "f00 b00");
    }

    #[test]
    fn inline_regex_splits_at_last_slash() {
        assert_eq!(apply("/a/b/g", "a/b a/b", "X"), "X X");
    }

    #[test]
    fn malformed_inline_regex_is_reported() {
        assert!(matches!(Matcher::compile("/"), Err(PatternError::MalformedRegexNotation(_))));
        assert!(matches!(Matcher::compile("//g"), Err(PatternError::MalformedRegexNotation(_))));
        assert!(matches!(Matcher::compile("/abc"), Err(PatternError::MalformedRegexNotation(_))));
        assert!(matches!(Matcher::compile("/abc/x"), Err(PatternError::UnsupportedFlag('x'))));
        assert!(matches!(Matcher::compile("/abc/gg"), Err(PatternError::UnsupportedFlag('g'))));
        assert!(matches!(Matcher::compile("/(unclosed/g"), Err(PatternError::InvalidRegex { .. })));
    }

    #[test]
    fn lossy_compile_yields_never() {
        let m = Matcher::compile_lossy("/(unclosed/g");
        assert!(m.is_never());
        let (out, n) = m.replace_all("(unclosed", "x");
        assert_eq!((out.as_ref(), n), ("(unclosed", 0));
    }

    #[test]
    fn literal_escapes_metacharacters() {
        assert_eq!(apply(".*+?", "a.*+?b and abbb", "!"), "a!b and abbb");
        assert_eq!(apply("$1", "cost $1 or $12", "one"), "cost one or one2");
        assert_eq!(apply("(c)", "(c) 2024", "\u{00A9}"), "\u{00A9} 2024");
    }

    #[test]
    fn replacement_is_never_expanded() {
        assert_eq!(apply("/(a)(b)/g", "ab", "$2$1"), "$2$1");
        assert_eq!(apply("x", "x", "$&"), "$&");
    }

    #[test]
    fn empty_pattern_is_rejected() {
        assert!(matches!(Matcher::compile(""), Err(PatternError::Empty)));
    }

    #[test]
    fn untouched_text_is_borrowed() {
        let m = Matcher::compile("U+2026").unwrap();
        let (out, n) = m.replace_all("plain", "...");
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(n, 0);
        assert!(!m.is_match("plain"));
    }

    #[test]
    fn matchers_are_stateless() {
        let m = Matcher::compile("/o/g").unwrap();
        let first = m.replace_all("foo", "0").0.into_owned();
        let second = m.replace_all("foo", "0").0.into_owned();
        assert_eq!(first, second);
    }

    #[test]
    fn code_point_set_merges_overlaps() {
        let Matcher::Class(set) = Matcher::compile("U+2032–U+2035, U+2033, U+2036").unwrap() else {
            panic!("expected a class");
        };
        assert_eq!(set.ranges(), &[0x2032..=0x2036]);
    }
}
