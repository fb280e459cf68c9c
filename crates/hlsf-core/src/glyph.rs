//! Glyph bank: a seeded, categorized selection of Unicode symbols, and the
//! selectors that map strings onto it.
//!
//! The bank itself is plain data. Loading and saving it is the store's job.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Placeholder for strings with no glyph.
pub const MISSING_GLYPH: char = '?';

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphCategory {
    pub name: String,
    pub semantics: String,
    /// First bank index of the category.
    pub start: usize,
    /// Last bank index of the category (inclusive).
    pub end: usize,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlyphBank {
    pub glyphs: Vec<char>,
    pub categories: Vec<GlyphCategory>,
}

struct CategorySpec {
    name: &'static str,
    semantics: &'static str,
    /// (start, end inclusive, step)
    ranges: &'static [(u32, u32, usize)],
    target: usize,
}

const CATEGORY_SPECS: &[CategorySpec] = &[
    CategorySpec {
        name: "arrows",
        semantics: "causality, mapping, motion",
        ranges: &[(0x2190, 0x21FF, 1), (0x27F0, 0x27FF, 1), (0x2900, 0x297F, 1)],
        target: 220,
    },
    CategorySpec {
        name: "geometric_shapes",
        semantics: "structure, container, partition",
        ranges: &[(0x25A0, 0x25FF, 1)],
        target: 180,
    },
    CategorySpec {
        name: "math_symbols",
        semantics: "relations, operators, sets",
        ranges: &[(0x2200, 0x22FF, 1)],
        target: 170,
    },
    CategorySpec {
        name: "stars_emphasis",
        semantics: "rating, attention, emphasis",
        ranges: &[(0x2600, 0x26FF, 1)],
        target: 130,
    },
    CategorySpec {
        name: "misc_symbols",
        semantics: "decorative or generic markers",
        ranges: &[(0x2300, 0x23FF, 1)],
        target: 120,
    },
    CategorySpec {
        name: "dingbats_misc",
        semantics: "assorted symbols",
        ranges: &[(0x2700, 0x27BF, 1)],
        target: 100,
    },
    CategorySpec {
        name: "supplemental_symbols",
        semantics: "pictographs; cycles; flows",
        ranges: &[(0x1F300, 0x1F5FF, 17)],
        target: 180,
    },
];

/// Opening/closing brackets that sit inside the symbol blocks.
const BRACKETS: &[(u32, u32)] = &[(0x2308, 0x230B), (0x2329, 0x232A), (0x2768, 0x2775)];

fn is_symbol(c: char) -> bool {
    let cp = c as u32;
    !c.is_whitespace()
        && !c.is_control()
        && !c.is_alphanumeric()
        && !BRACKETS.iter().any(|&(lo, hi)| (lo..=hi).contains(&cp))
}

fn collect_symbols(ranges: &[(u32, u32, usize)]) -> Vec<char> {
    ranges
        .iter()
        .flat_map(|&(start, end, step)| (start..=end).step_by(step))
        .filter_map(char::from_u32)
        .filter(|&c| is_symbol(c))
        .collect()
}

/// Repeat `items` until `len` entries are available, then truncate.
fn fill_to<T: Clone>(items: &[T], len: usize) -> Vec<T> {
    items.iter().cycle().take(len).cloned().collect()
}

impl GlyphBank {
    /// Build a bank of exactly `n` glyphs (or none, if `n == 0`).
    ///
    /// Category targets are scaled to `n` with the first category absorbing
    /// rounding. Candidates within each category are shuffled with a
    /// generator seeded by `seed`, so the same `(n, seed)` yields the same bank.
    pub fn generate(n: usize, seed: u64) -> Self {
        if n == 0 {
            return Self::default();
        }
        let mut rng = StdRng::seed_from_u64(seed);
        let total_target: usize = CATEGORY_SPECS.iter().map(|c| c.target).sum();

        let mut counts: Vec<i64> = CATEGORY_SPECS
            .iter()
            .map(|c| ((n * c.target) as f64 / total_target as f64).round().max(1.0) as i64)
            .collect();
        let diff = n as i64 - counts.iter().sum::<i64>();
        counts[0] = (counts[0] + diff).max(0);

        let mut glyphs = Vec::with_capacity(n);
        let mut categories = Vec::with_capacity(CATEGORY_SPECS.len());
        for (spec, &count) in CATEGORY_SPECS.iter().zip(&counts) {
            let count = count as usize;
            let mut candidates = collect_symbols(spec.ranges);
            candidates.shuffle(&mut rng);
            let start = glyphs.len();
            glyphs.extend(fill_to(&candidates, count));
            categories.push(GlyphCategory {
                name: spec.name.to_string(),
                semantics: spec.semantics.to_string(),
                start,
                end: glyphs.len().saturating_sub(1),
            });
        }

        glyphs.truncate(n);
        if glyphs.len() < n {
            glyphs = fill_to(&glyphs, n);
        }
        Self { glyphs, categories }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, idx: usize) -> Option<char> {
        self.glyphs.get(idx).copied()
    }
}

/// Chooses a bank index for a string.
pub trait GlyphSelector {
    fn select(&self, text: &str, bank: &GlyphBank) -> usize;
}

/// Seed-keyed SHA-256 of the text, reduced modulo the bank size.
/// Stable across processes, unlike a randomized general-purpose hasher.
#[derive(Clone, Copy, Debug)]
pub struct HashedGlyphs {
    pub seed: u64,
}

pub fn keyed_index(text: &str, seed: u64, len: usize) -> usize {
    if len == 0 {
        return 0;
    }
    let digest = Sha256::digest(format!("GLYPH::{seed}::{text}").as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(head) % len as u64) as usize
}

impl GlyphSelector for HashedGlyphs {
    fn select(&self, text: &str, bank: &GlyphBank) -> usize {
        keyed_index(text, self.seed, bank.len())
    }
}

/// Indices picked by an external generator, clamped into the bank.
/// Strings it did not pick for fall back to keyed hashing.
#[derive(Clone, Debug)]
pub struct ChosenGlyphs {
    pub indices: HashMap<String, i64>,
    pub fallback: HashedGlyphs,
}

impl GlyphSelector for ChosenGlyphs {
    fn select(&self, text: &str, bank: &GlyphBank) -> usize {
        match self.indices.get(text) {
            Some(&idx) if !bank.is_empty() => idx.clamp(0, bank.len() as i64 - 1) as usize,
            _ => self.fallback.select(text, bank),
        }
    }
}

/// Glyph for every string, `?` when the bank is empty.
pub fn assign_glyphs<'a>(
    texts: impl IntoIterator<Item = &'a str>,
    bank: &GlyphBank,
    selector: &dyn GlyphSelector,
) -> HashMap<String, char> {
    texts
        .into_iter()
        .map(|text| {
            let glyph = bank
                .get(selector.select(text, bank))
                .unwrap_or(MISSING_GLYPH);
            (text.to_string(), glyph)
        })
        .collect()
}
