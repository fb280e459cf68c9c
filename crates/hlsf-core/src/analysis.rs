//! Derived series for the visual front end.

use std::collections::HashMap;
use std::f64::consts::TAU;

use serde::{Deserialize, Serialize};

use crate::builder::{expansion_id, token_id};
use crate::expansion::ExpansionPair;
use crate::glyph::MISSING_GLYPH;
use crate::graph::NodeKind;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpectrumBin {
    /// Cycles per sample, in [0, 0.5].
    pub freq: f64,
    /// Normalized so the largest bin is 1 (all zero for a flat series).
    pub magnitude: f64,
}

/// Magnitude spectrum of a mean-centred series over the non-negative
/// frequencies `k / n` for `k = 0..=n/2`.
pub fn magnitude_spectrum(values: &[f64]) -> Vec<SpectrumBin> {
    let n = values.len();
    if n == 0 {
        return Vec::new();
    }
    let mean = values.iter().sum::<f64>() / n as f64;
    let centred: Vec<f64> = values.iter().map(|v| v - mean).collect();

    let mut bins: Vec<SpectrumBin> = (0..=n / 2)
        .map(|k| {
            let (mut re, mut im) = (0.0, 0.0);
            for (t, v) in centred.iter().enumerate() {
                let angle = TAU * (k * t) as f64 / n as f64;
                re += v * angle.cos();
                im -= v * angle.sin();
            }
            SpectrumBin {
                freq: k as f64 / n as f64,
                magnitude: (re * re + im * im).sqrt(),
            }
        })
        .collect();

    let peak = bins.iter().map(|b| b.magnitude).fold(0.0, f64::max);
    if peak > 0.0 {
        for bin in &mut bins {
            bin.magnitude /= peak;
        }
    }
    bins
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GlyphStreamEntry {
    pub id: String,
    pub text: String,
    pub kind: NodeKind,
    pub glyph: String,
}

/// Tokens interleaved with their two expansions, in token order.
pub fn glyph_stream(
    tokens: &[String],
    expansions: &[ExpansionPair],
    glyphs: &HashMap<String, char>,
) -> Vec<GlyphStreamEntry> {
    let glyph_of = |text: &str| glyphs.get(text).copied().unwrap_or(MISSING_GLYPH).to_string();
    let mut stream = Vec::with_capacity(tokens.len() * 3);
    for (i, token) in tokens.iter().enumerate() {
        stream.push(GlyphStreamEntry {
            id: token_id(i),
            text: token.clone(),
            kind: NodeKind::Token,
            glyph: glyph_of(token),
        });
        let Some(pair) = expansions.get(i) else {
            continue;
        };
        for (slot, exp) in pair.iter().enumerate() {
            stream.push(GlyphStreamEntry {
                id: expansion_id(i, slot),
                text: exp.text.clone(),
                kind: NodeKind::Expansion,
                glyph: glyph_of(&exp.text),
            });
        }
    }
    stream
}
