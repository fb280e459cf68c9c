//! HLSF (High-Level Space Field) engine.
//!
//! Turns a prompt into a small weighted graph of tokens and their
//! expansions, places every string with a deterministic hash embedding,
//! spreads attention over the graph as a random walk with restart and
//! reads ranked threads back out of it.
//!
//! Zero I/O. Expansion and glyph choices come in through traits so the
//! engine never knows whether a text generator was involved.

pub mod analysis;
pub mod attention;
pub mod builder;
pub mod color;
pub mod compose;
pub mod constants;
pub mod cooccurrence;
pub mod embedding;
pub mod error;
pub mod expansion;
pub mod geometry;
pub mod glyph;
pub mod graph;
pub mod llm;
pub mod pipeline;
pub mod threads;
pub mod tokenizer;
pub mod wire;

pub use analysis::{GlyphStreamEntry, SpectrumBin, glyph_stream, magnitude_spectrum};
pub use attention::{Attention, AttentionParams, propagate};
pub use builder::{BuildInput, SpaceField, build_graph, edge_weight, expansion_id, token_id};
pub use color::Triangle;
pub use compose::compose_answer;
pub use constants::{
    DEFAULT_EMB_DIM, DEFAULT_GLYPH_COUNT, DEFAULT_SEED, MAX_ITER, MIN_THREAD_WEIGHT,
    PACKAGE_VERSION, RESTART_PROB, TOLERANCE,
};
pub use cooccurrence::CooccurrenceModel;
pub use embedding::{Projection, embed, project_all, rescale, scalar_project, seed_direction};
pub use error::{GraphError, HlsfError, Result};
pub use expansion::{
    Expansion, ExpansionKind, ExpansionPair, ExpansionSource, GeneratedExpansions,
    HeuristicExpansions, default_expansions,
};
pub use geometry::Position;
pub use glyph::{ChosenGlyphs, GlyphBank, GlyphCategory, GlyphSelector, HashedGlyphs, assign_glyphs};
pub use graph::{Edge, Graph, Node, NodeKind};
pub use pipeline::{Collaborators, PipelineConfig, SpaceFieldRun, run, run_prompt, universe};
pub use threads::{Thread, extract_threads};
pub use tokenizer::tokenize;
pub use wire::{GENERATOR_TRACE, OFFLINE_TRACE, Package, export_json, import_json};
