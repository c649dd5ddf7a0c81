//! Deterministic "human-likeness" scoring.
//!
//! The score is a weighted blend of surface statistics, nothing more:
//!
//! ```text
//! score = 40 + length + diversity + sentence - special      clamp to [30, 95]
//!   length    = min(1, words / 300) * 30
//!   diversity = distinct lowercased tokens / words * 40
//!   sentence  = min(15, words / sentences) * 2
//!   special   = chars outside [A-Za-z0-9\s] / len * 15
//! words < 50  => score = max(40, score * 0.8)
//! ```
//!
//! Whitespace, token and length conventions follow browser text semantics so
//! scores computed here agree with the ones users already see in the editor:
//! `\s` is the ECMAScript whitespace set and lengths are counted in UTF-16 code
//! units.

use serde::Serialize;
use std::collections::HashSet;

struct Weights {
    base: f64,
    length_words_basis: f64,
    length_weight: f64,
    diversity_weight: f64,
    sentence_words_cap: f64,
    sentence_weight: f64,
    special_char_weight: f64,
    score_min: f64,
    score_max: f64,
    short_text_word_count: usize,
    short_text_factor: f64,
    short_text_floor: f64,
}

static W: Weights = Weights {
    base: 40.0,
    length_words_basis: 300.0,
    length_weight: 30.0,
    diversity_weight: 40.0,
    sentence_words_cap: 15.0,
    sentence_weight: 2.0,
    special_char_weight: 15.0,
    score_min: 30.0,
    score_max: 95.0,
    short_text_word_count: 50,
    short_text_factor: 0.8,
    short_text_floor: 40.0,
};

/// Intermediate quantities behind a score, exposed for reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreBreakdown {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
    pub lexical_diversity: f64,
    pub special_char_ratio: f64,
    pub length_factor: f64,
    pub diversity_factor: f64,
    pub sentence_factor: f64,
    pub special_char_factor: f64,
    pub score: u8,
}

/// ECMAScript `\s`: Unicode White_Space minus U+0085, plus U+FEFF.
pub(crate) fn is_space(c: char) -> bool {
    match c {
        '\u{85}' => false,
        '\u{FEFF}' => true,
        c => c.is_whitespace(),
    }
}

/// Score `text` in `[0, 100]`; empty or whitespace-only text scores `0`.
pub fn human_likeness_score(text: &str) -> u8 {
    score_breakdown(text).map_or(0, |b| b.score)
}

/// Full breakdown of [`human_likeness_score`]; `None` for blank text.
pub fn score_breakdown(text: &str) -> Option<ScoreBreakdown> {
    if text.chars().all(is_space) {
        return None;
    }

    let words: Vec<&str> = text.split(is_space).filter(|w| !w.is_empty()).collect();
    let word_count = words.len();

    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|segment| !segment.trim_matches(is_space).is_empty())
        .count();
    let avg_words_per_sentence = word_count as f64 / sentence_count.max(1) as f64;

    // Splitting on whitespace runs keeps a single empty token when the text
    // starts or ends with whitespace; it counts as one distinct token.
    let lowered = text.to_lowercase();
    let mut distinct: HashSet<&str> = lowered.split(is_space).filter(|w| !w.is_empty()).collect();
    if lowered.starts_with(is_space) || lowered.ends_with(is_space) {
        distinct.insert("");
    }
    let lexical_diversity = distinct.len() as f64 / word_count.max(1) as f64;

    let special_units: usize =
        text.chars().filter(|&c| !c.is_ascii_alphanumeric() && !is_space(c)).map(char::len_utf16).sum();
    let utf16_len: usize = text.chars().map(char::len_utf16).sum();
    let special_char_ratio = special_units as f64 / utf16_len.max(1) as f64;

    let length_factor = (word_count as f64 / W.length_words_basis).min(1.0) * W.length_weight;
    let diversity_factor = lexical_diversity * W.diversity_weight;
    let sentence_factor = avg_words_per_sentence.min(W.sentence_words_cap) * W.sentence_weight;
    let special_char_factor = special_char_ratio * W.special_char_weight;

    let mut score = W.base + length_factor + diversity_factor + sentence_factor - special_char_factor;
    score = score.max(W.score_min).min(W.score_max);
    if word_count < W.short_text_word_count {
        score = (score * W.short_text_factor).max(W.short_text_floor);
    }

    Some(ScoreBreakdown {
        word_count,
        sentence_count,
        avg_words_per_sentence,
        lexical_diversity,
        special_char_ratio,
        length_factor,
        diversity_factor,
        sentence_factor,
        special_char_factor,
        score: score.round() as u8,
    })
}
