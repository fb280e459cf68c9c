//! End-to-end run: tokens → embeddings → graph → attention → threads.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::attention::{Attention, AttentionParams, propagate};
use crate::builder::{BuildInput, SpaceField, build_graph, token_id};
use crate::constants::{DEFAULT_EMB_DIM, DEFAULT_SEED, MAX_ITER, MIN_THREAD_WEIGHT, RESTART_PROB, TOLERANCE};
use crate::embedding::{project_all, rescale};
use crate::error::{HlsfError, Result};
use crate::expansion::{ExpansionPair, ExpansionSource};
use crate::geometry::planar_positions;
use crate::glyph::{GlyphBank, GlyphSelector, assign_glyphs};
use crate::threads::{Thread, extract_threads};
use crate::tokenizer::tokenize;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub seed: u64,
    pub emb_dim: usize,
    pub restart_prob: f64,
    pub tolerance: f64,
    pub max_iter: usize,
    pub min_weight: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            emb_dim: DEFAULT_EMB_DIM,
            restart_prob: RESTART_PROB,
            tolerance: TOLERANCE,
            max_iter: MAX_ITER,
            min_weight: MIN_THREAD_WEIGHT,
        }
    }
}

impl PipelineConfig {
    /// Reject settings that would make attention or thread extraction
    /// meaningless: a restart probability outside (0, 1), a non-positive or
    /// non-finite tolerance, a NaN threshold, or zero-width embeddings.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(HlsfError::InvalidConfig(msg));
        if !(self.restart_prob > 0.0 && self.restart_prob < 1.0) {
            return invalid(format!("restart_prob must be in (0, 1), got {}", self.restart_prob));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return invalid(format!("tolerance must be positive and finite, got {}", self.tolerance));
        }
        if !self.min_weight.is_finite() {
            return invalid(format!("min_weight must be finite, got {}", self.min_weight));
        }
        if self.emb_dim == 0 {
            return invalid("emb_dim must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn attention_params(&self) -> AttentionParams {
        AttentionParams {
            restart: self.restart_prob,
            tolerance: self.tolerance,
            max_iter: self.max_iter,
        }
    }
}

/// The pluggable pieces a run depends on.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub expansions: &'a dyn ExpansionSource,
    pub glyphs: &'a dyn GlyphSelector,
    pub bank: &'a GlyphBank,
}

/// Everything a run produced. Read-only once returned.
pub struct SpaceFieldRun {
    pub tokens: Vec<String>,
    /// Aligned with `tokens`.
    pub expansions: Vec<ExpansionPair>,
    /// Tokens then expansion texts, first occurrence order, no duplicates.
    pub universe: Vec<String>,
    pub embeddings: HashMap<String, Vec<f64>>,
    pub values: HashMap<String, f64>,
    pub field: SpaceField,
    pub attention: Attention,
    pub threads: Vec<Thread>,
    pub glyphs: HashMap<String, char>,
}

/// Tokens then their expansion texts, first occurrence order, no duplicates.
pub fn universe(tokens: &[String], expansions: &[ExpansionPair]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (token, pair) in tokens.iter().zip(expansions) {
        for text in [token, &pair[0].text, &pair[1].text] {
            if seen.insert(text.as_str()) {
                out.push(text.clone());
            }
        }
    }
    out
}

/// Run the engine over an already-split token list.
/// An empty list fails with [`HlsfError::EmptyInput`] and an out-of-range
/// config with [`HlsfError::InvalidConfig`], both before any graph work.
pub fn run(tokens: &[String], collab: Collaborators<'_>, config: &PipelineConfig) -> Result<SpaceFieldRun> {
    if tokens.is_empty() {
        return Err(HlsfError::EmptyInput);
    }
    config.validate()?;

    let expansions: Vec<ExpansionPair> = tokens
        .iter()
        .map(|t| collab.expansions.expansions(t))
        .collect();
    let universe = universe(tokens, &expansions);

    let projection = project_all(universe.iter().map(String::as_str), config.emb_dim, config.seed);
    let values = rescale(&projection.scores);
    let positions = planar_positions(&projection.embeddings);

    let field = build_graph(&BuildInput {
        tokens,
        expansions: &expansions,
        embeddings: &projection.embeddings,
        values: &values,
        positions: &positions,
    })?;

    let seeds: Vec<String> = (0..tokens.len()).map(token_id).collect();
    let attention = propagate(&field.graph, &seeds, &config.attention_params());
    let threads = extract_threads(&field.graph, &attention, config.min_weight);
    let glyphs = assign_glyphs(universe.iter().map(String::as_str), collab.bank, collab.glyphs);

    Ok(SpaceFieldRun {
        tokens: tokens.to_vec(),
        expansions,
        universe,
        embeddings: projection.embeddings,
        values,
        field,
        attention,
        threads,
        glyphs,
    })
}

/// Tokenize `prompt` and run the engine over it.
pub fn run_prompt(prompt: &str, collab: Collaborators<'_>, config: &PipelineConfig) -> Result<SpaceFieldRun> {
    run(&tokenize(prompt), collab, config)
}
