//! Expansion sources: every token gets exactly two related strings.
//!
//! The pipeline only sees the [`ExpansionSource`] capability. Whether the
//! pair comes from the built-in heuristic or was produced up front by an
//! external generator is decided by whoever constructs the source.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{DEFAULT_ASSOCIATIVE_WEIGHT, DEFAULT_SEMANTIC_WEIGHT};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpansionKind {
    Semantic,
    Associative,
}

impl ExpansionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpansionKind::Semantic => "semantic",
            ExpansionKind::Associative => "associative",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Expansion {
    pub text: String,
    pub kind: ExpansionKind,
    /// In [0, 1].
    pub weight: f64,
}

impl Expansion {
    pub fn new(text: impl Into<String>, kind: ExpansionKind, weight: f64) -> Self {
        Self {
            text: text.into(),
            kind,
            weight: clamp01(weight),
        }
    }
}

/// Semantic first, associative second.
pub type ExpansionPair = [Expansion; 2];

pub trait ExpansionSource {
    fn expansions(&self, token: &str) -> ExpansionPair;
}

/// Fallback pair used whenever a source has nothing usable for a token.
pub fn default_expansions(token: &str) -> ExpansionPair {
    [
        Expansion::new(format!("{token}_sem"), ExpansionKind::Semantic, DEFAULT_SEMANTIC_WEIGHT),
        Expansion::new(
            format!("{token}_assoc"),
            ExpansionKind::Associative,
            DEFAULT_ASSOCIATIVE_WEIGHT,
        ),
    ]
}

fn clamp01(x: f64) -> f64 {
    if x.is_nan() { 0.0 } else { x.clamp(0.0, 1.0) }
}

// ---------------------------------------------------------------------------
// Offline heuristic
// ---------------------------------------------------------------------------

const ASSOCIATIONS: &[(&str, [&str; 2])] = &[
    ("ai", ["model", "learning"]),
    ("engine", ["pipeline", "runtime"]),
    ("space", ["field", "vector"]),
    ("field", ["potential", "charge"]),
    ("vector", ["magnitude", "direction"]),
    ("token", ["glyph", "embedding"]),
    ("prompt", ["intent", "context"]),
];

const HEURISTIC_SEMANTIC_WEIGHT: f64 = 0.85;
const HEURISTIC_ASSOCIATIVE_WEIGHT: f64 = 0.65;

/// Offline expansions: a crude stem as the semantic neighbour and a small
/// association table for the associative one.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicExpansions;

fn stem_like(t: &str) -> &str {
    if t.len() <= 3 {
        return t;
    }
    for suffix in ["ing", "ed", "es", "s"] {
        if let Some(stem) = t.strip_suffix(suffix)
            && stem.len() >= 3
        {
            return stem;
        }
    }
    t
}

impl ExpansionSource for HeuristicExpansions {
    fn expansions(&self, token: &str) -> ExpansionPair {
        let alphabetic = !token.is_empty() && token.chars().all(|c| c.is_ascii_alphabetic());
        let base = if alphabetic {
            stem_like(&token.to_lowercase()).to_string()
        } else {
            token.to_string()
        };

        let semantic = if base != token {
            base.clone()
        } else {
            format!("{token}_sem")
        };
        let associative = ASSOCIATIONS
            .iter()
            .find(|(word, _)| *word == base)
            .map(|(_, related)| related[0].to_string())
            .unwrap_or_else(|| format!("{base}_assoc"));

        [
            Expansion::new(semantic, ExpansionKind::Semantic, HEURISTIC_SEMANTIC_WEIGHT),
            Expansion::new(associative, ExpansionKind::Associative, HEURISTIC_ASSOCIATIVE_WEIGHT),
        ]
    }
}

// ---------------------------------------------------------------------------
// Generator-backed
// ---------------------------------------------------------------------------

/// Expansions produced ahead of time by an external generator.
/// Tokens the generator skipped fall back to [`default_expansions`].
#[derive(Clone, Debug, Default)]
pub struct GeneratedExpansions {
    pairs: HashMap<String, ExpansionPair>,
}

impl GeneratedExpansions {
    pub fn new(pairs: HashMap<String, ExpansionPair>) -> Self {
        Self { pairs }
    }

    /// Parse an `{"expansions": [{token, semantic: {text, weight}, associative: {...}}]}`
    /// payload. Entries without a token are skipped; blank texts and missing or
    /// non-numeric weights take the defaults; weights are clamped to [0, 1].
    pub fn from_payload(payload: &Value) -> Self {
        let mut pairs = HashMap::new();
        let items = payload
            .get("expansions")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        for item in items {
            let Some(token) = item.get("token").and_then(Value::as_str) else {
                continue;
            };
            let semantic = parse_entry(
                item.get("semantic"),
                format!("{token}_sem"),
                ExpansionKind::Semantic,
                DEFAULT_SEMANTIC_WEIGHT,
            );
            let associative = parse_entry(
                item.get("associative"),
                format!("{token}_assoc"),
                ExpansionKind::Associative,
                DEFAULT_ASSOCIATIVE_WEIGHT,
            );
            pairs.insert(token.to_string(), [semantic, associative]);
        }
        Self { pairs }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.pairs.contains_key(token)
    }
}

fn parse_entry(
    entry: Option<&Value>,
    default_text: String,
    kind: ExpansionKind,
    default_weight: f64,
) -> Expansion {
    let text = entry
        .and_then(|e| e.get("text"))
        .map(value_to_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or(default_text);
    let weight = entry
        .and_then(|e| e.get("weight"))
        .and_then(value_to_f64)
        .unwrap_or(default_weight);
    Expansion::new(text, kind, weight)
}

fn value_to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

pub(crate) fn value_to_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

impl ExpansionSource for GeneratedExpansions {
    fn expansions(&self, token: &str) -> ExpansionPair {
        self.pairs
            .get(token)
            .cloned()
            .unwrap_or_else(|| default_expansions(token))
    }
}
