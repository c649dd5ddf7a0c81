//! Surface scan (AI-typical character detection).
//!
//! This module inspects raw text and reports which families of "machine
//! typography" it contains: dash variants, smart quotes, the ellipsis
//! character, bullets, invisible format characters, exotic spaces and
//! full-width ASCII. These are exactly the surface patterns the default
//! catalog rewrites, so a scan before and after a pass shows what cleaning
//! achieved.
//!
//! ## Design notes
//!
//! - The scan is a single pass over `chars()`; each character is classified
//!   into at most one family by [`family_of`].
//! - Families are fixed indices (`FAMILY_*`) into a counter array, mirroring the
//!   bits of [`SurfaceMask`].

use serde::ser::{Serialize, SerializeMap, Serializer};

bitflags::bitflags! {
    /// Families of AI-typical characters found in a text.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct SurfaceMask: u16 {
        const DASHES         = 1 << 0;
        const SINGLE_QUOTES  = 1 << 1;
        const DOUBLE_QUOTES  = 1 << 2;
        const ELLIPSIS       = 1 << 3;
        const BULLETS        = 1 << 4;
        const INVISIBLES     = 1 << 5;
        const UNICODE_SPACES = 1 << 6;
        const FULLWIDTH      = 1 << 7;
    }
}

pub const FAMILY_COUNT: usize = 8;
pub const FAMILY_DASHES: usize = 0;
pub const FAMILY_SINGLE_QUOTES: usize = 1;
pub const FAMILY_DOUBLE_QUOTES: usize = 2;
pub const FAMILY_ELLIPSIS: usize = 3;
pub const FAMILY_BULLETS: usize = 4;
pub const FAMILY_INVISIBLES: usize = 5;
pub const FAMILY_UNICODE_SPACES: usize = 6;
pub const FAMILY_FULLWIDTH: usize = 7;

const FAMILY_NAMES: [&str; FAMILY_COUNT] = [
    "dashes",
    "singleQuotes",
    "doubleQuotes",
    "ellipsis",
    "bullets",
    "invisibles",
    "unicodeSpaces",
    "fullwidth",
];

/// Classify `c` into a family index, if it belongs to one.
pub fn family_of(c: char) -> Option<usize> {
    let family = match c {
        '\u{2012}'..='\u{2015}' | '\u{2212}' => FAMILY_DASHES,
        '\u{2018}'..='\u{201B}' | '\u{2032}' | '\u{2035}' => FAMILY_SINGLE_QUOTES,
        '\u{201C}'..='\u{201F}' | '\u{2033}' | '\u{2034}' | '\u{2036}' | '\u{00AB}' | '\u{00BB}' => {
            FAMILY_DOUBLE_QUOTES
        }
        '\u{2026}' => FAMILY_ELLIPSIS,
        '\u{2022}' | '\u{00B7}' => FAMILY_BULLETS,
        '\u{00AD}'
        | '\u{180E}'
        | '\u{200B}'..='\u{200F}'
        | '\u{202A}'..='\u{202E}'
        | '\u{2060}'..='\u{206F}'
        | '\u{FE00}'..='\u{FE0F}'
        | '\u{FEFF}' => FAMILY_INVISIBLES,
        '\u{00A0}' | '\u{1680}' | '\u{2000}'..='\u{200A}' | '\u{202F}' | '\u{205F}' | '\u{3000}' => {
            FAMILY_UNICODE_SPACES
        }
        '\u{FF01}'..='\u{FF5E}' => FAMILY_FULLWIDTH,
        _ => return None,
    };
    Some(family)
}

/// Surface characteristics detected in a text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceScan {
    pub mask: SurfaceMask,
    pub counts: [usize; FAMILY_COUNT],
}

impl SurfaceScan {
    /// Scan `text` for AI-typical characters.
    pub fn scan(text: &str) -> Self {
        let mut counts = [0usize; FAMILY_COUNT];
        for family in text.chars().filter_map(family_of) {
            counts[family] += 1;
        }

        let mut mask = SurfaceMask::empty();
        for (idx, count) in counts.iter().enumerate() {
            if *count > 0 {
                mask |= SurfaceMask::from_bits_truncate(1 << idx);
            }
        }

        SurfaceScan { mask, counts }
    }

    pub fn is_clean(&self) -> bool {
        self.mask.is_empty()
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// Non-zero families as `(name, count)`, in family order.
    pub fn families(&self) -> impl Iterator<Item = (&'static str, usize)> + '_ {
        FAMILY_NAMES.iter().zip(self.counts.iter()).filter(|(_, n)| **n > 0).map(|(name, n)| (*name, *n))
    }
}

impl Serialize for SurfaceScan {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for (name, count) in self.families() {
            map.serialize_entry(name, &count)?;
        }
        map.end()
    }
}
