//! Deterministic hash embeddings and the scalar "vector number" derived from them.
//!
//! Every string maps to a unit vector built from its SHA-256 digest, so the
//! same text always lands at the same point for a given dimension. A seed
//! selects a direction; projecting onto it gives each string a scalar score,
//! which is then min-max rescaled into the [0, 99.9] vector-number range.

use std::collections::HashMap;

use sha2::{Digest, Sha256};

use crate::constants::{DEGENERATE_SPAN, HASH_MODULUS, VALUE_MAX, VALUE_MIDPOINT};

/// Embed text as a unit vector of length `dim`.
///
/// The digest is read as big-endian 4-byte words, each reduced modulo 2001,
/// cycled out to `dim` entries and mapped into [-1, 1] before L2
/// normalization. A zero-norm vector has no direction and is returned as zeros.
pub fn embed(text: &str, dim: usize) -> Vec<f64> {
    let digest = Sha256::digest(text.as_bytes());
    let words: Vec<u32> = digest
        .chunks(4)
        .map(|chunk| {
            let mut buf = [0u8; 4];
            buf[..chunk.len()].copy_from_slice(chunk);
            u32::from_be_bytes(buf) % HASH_MODULUS
        })
        .collect();

    let raw: Vec<f64> = words
        .iter()
        .cycle()
        .take(dim)
        .map(|&w| f64::from(w) / 1000.0 - 1.0)
        .collect();

    normalize(raw)
}

fn normalize(mut v: Vec<f64>) -> Vec<f64> {
    let norm = norm(&v);
    if norm == 0.0 {
        return vec![0.0; v.len()];
    }
    for x in &mut v {
        *x /= norm;
    }
    v
}

/// Direction vector for a seed. Stable across runs and processes.
pub fn seed_direction(seed: u64, dim: usize) -> Vec<f64> {
    embed(&format!("SEED::{seed}::HLSF"), dim)
}

/// Projection of `text`'s embedding onto the seed direction.
pub fn scalar_project(text: &str, dim: usize, seed: u64) -> f64 {
    dot(&embed(text, dim), &seed_direction(seed, dim))
}

/// Scores and embeddings for every string in a universe.
pub struct Projection {
    pub scores: HashMap<String, f64>,
    pub embeddings: HashMap<String, Vec<f64>>,
}

/// Project a universe of strings onto the seed direction in one pass.
pub fn project_all<'a>(texts: impl IntoIterator<Item = &'a str>, dim: usize, seed: u64) -> Projection {
    let direction = seed_direction(seed, dim);
    let mut scores = HashMap::new();
    let mut embeddings = HashMap::new();
    for text in texts {
        let vec = embed(text, dim);
        scores.insert(text.to_string(), dot(&vec, &direction));
        embeddings.insert(text.to_string(), vec);
    }
    Projection { scores, embeddings }
}

/// Min-max rescale scores into [0, 99.9] at 0.1 resolution.
/// A spread below 1e-9 maps every entry to exactly 50.0.
pub fn rescale(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let lo = scores.values().copied().fold(f64::INFINITY, f64::min);
    let hi = scores.values().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = hi - lo;
    if span.abs() < DEGENERATE_SPAN {
        return scores.keys().map(|k| (k.clone(), VALUE_MIDPOINT)).collect();
    }
    scores
        .iter()
        .map(|(k, &v)| {
            let scaled = (v - lo) / span * VALUE_MAX;
            (k.clone(), (scaled * 10.0).round() / 10.0)
        })
        .collect()
}

/// Map a vector number into [-1, 1].
pub fn charge(v: f64) -> f64 {
    (v - VALUE_MIDPOINT) / VALUE_MIDPOINT
}

pub fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

pub fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

/// Cosine similarity; any empty or zero-norm operand yields 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let na = norm(a);
    let nb = norm(b);
    if na == 0.0 || nb == 0.0 {
        return 0.0;
    }
    dot(a, b) / (na * nb)
}
