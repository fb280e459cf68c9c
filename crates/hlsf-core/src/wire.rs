//! JSON serde for the exported space-field package.
//!
//! The package is a flat, renderer-friendly view of a run: node records
//! carry their glyph and position inline, edges are `{a, b, k}` triples and
//! attention is a sorted id → probability map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::{GlyphStreamEntry, SpectrumBin, glyph_stream, magnitude_spectrum};
use crate::builder::{expansion_id, token_id};
use crate::color::Triangle;
use crate::constants::PACKAGE_VERSION;
use crate::error::GraphError;
use crate::expansion::ExpansionKind;
use crate::geometry::Position;
use crate::glyph::MISSING_GLYPH;
use crate::graph::{Graph, Node};
use crate::pipeline::SpaceFieldRun;
use crate::threads::Thread;

pub const OFFLINE_TRACE: &str = "Offline HLSF; safe-to-share trace only.";
pub const GENERATOR_TRACE: &str = "LLM-enabled HLSF; safe-to-share trace only.";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Package {
    pub version: String,
    pub space_field: WireSpaceField,
    #[serde(default)]
    pub threads: Vec<Thread>,
    #[serde(default)]
    pub attention: BTreeMap<String, f64>,
    #[serde(default)]
    pub analysis: WireAnalysis,
    #[serde(default)]
    pub trace_summary: String,
    pub stats: WireStats,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireSpaceField {
    pub tokens: Vec<WireToken>,
    pub expansions: Vec<WireExpansion>,
    #[serde(default)]
    pub triangles: Vec<Triangle>,
    pub edges: Vec<WireEdge>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireToken {
    pub id: String,
    pub text: String,
    pub glyph: String,
    pub v: f64,
    pub pos: Position,
    pub charge: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireExpansion {
    pub id: String,
    pub of: String,
    #[serde(rename = "type")]
    pub kind: ExpansionKind,
    pub text: String,
    pub glyph: String,
    pub v: f64,
    pub pos: Position,
    pub weight: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireEdge {
    pub a: String,
    pub b: String,
    pub k: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct WireAnalysis {
    pub spectrum: Vec<SpectrumBin>,
    pub glyph_stream: Vec<GlyphStreamEntry>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WireStats {
    pub tokens: usize,
    pub expansions: usize,
    pub triangles: usize,
    pub edges: usize,
    #[serde(default)]
    pub iterations: usize,
    #[serde(default)]
    pub converged: bool,
}

impl Package {
    pub fn from_run(run: &SpaceFieldRun, trace_summary: &str) -> Self {
        let graph = &run.field.graph;
        let glyph_of = |text: &str| {
            run.glyphs
                .get(text)
                .copied()
                .unwrap_or(MISSING_GLYPH)
                .to_string()
        };

        let tokens: Vec<WireToken> = (0..run.tokens.len())
            .filter_map(|i| graph.get(&token_id(i)))
            .map(|node| WireToken {
                id: node.id.clone(),
                text: node.text.clone(),
                glyph: glyph_of(&node.text),
                v: node.v,
                pos: node.pos,
                charge: node.charge,
            })
            .collect();

        let mut expansions = Vec::with_capacity(run.expansions.len() * 2);
        for (i, pair) in run.expansions.iter().enumerate() {
            for (slot, exp) in pair.iter().enumerate() {
                let Some(node) = graph.get(&expansion_id(i, slot)) else {
                    continue;
                };
                expansions.push(WireExpansion {
                    id: node.id.clone(),
                    of: node.of.clone().unwrap_or_default(),
                    kind: exp.kind,
                    text: node.text.clone(),
                    glyph: glyph_of(&node.text),
                    v: node.v,
                    pos: node.pos,
                    weight: node.weight.unwrap_or(exp.weight),
                });
            }
        }

        let edges: Vec<WireEdge> = graph
            .edges()
            .iter()
            .map(|edge| {
                let (a, b) = graph.endpoints(edge);
                WireEdge {
                    a: a.to_string(),
                    b: b.to_string(),
                    k: edge.k,
                }
            })
            .collect();

        let token_values: Vec<f64> = tokens.iter().map(|t| t.v).collect();
        let stats = WireStats {
            tokens: tokens.len(),
            expansions: expansions.len(),
            triangles: run.field.triangles.len(),
            edges: edges.len(),
            iterations: run.attention.iterations,
            converged: run.attention.converged,
        };

        Package {
            version: PACKAGE_VERSION.to_string(),
            space_field: WireSpaceField {
                tokens,
                expansions,
                triangles: run.field.triangles.clone(),
                edges,
            },
            threads: run.threads.clone(),
            attention: run.attention.to_map(),
            analysis: WireAnalysis {
                spectrum: magnitude_spectrum(&token_values),
                glyph_stream: glyph_stream(&run.tokens, &run.expansions, &run.glyphs),
            },
            trace_summary: trace_summary.to_string(),
            stats,
        }
    }
}

impl WireSpaceField {
    /// Rebuild the graph a package was exported from.
    pub fn to_graph(&self) -> Result<Graph, GraphError> {
        let mut graph = Graph::new();
        for t in &self.tokens {
            graph.add_node(Node::token(t.id.as_str(), t.text.as_str(), t.v, t.pos))?;
        }
        for e in &self.expansions {
            graph.add_node(Node::expansion(
                e.id.as_str(),
                e.of.as_str(),
                e.text.as_str(),
                e.v,
                e.pos,
                e.weight,
            ))?;
        }
        for edge in &self.edges {
            graph.add_edge(&edge.a, &edge.b, edge.k)?;
        }
        Ok(graph)
    }
}

/// Parse a package from JSON.
pub fn import_json(json: &str) -> Result<Package, serde_json::Error> {
    serde_json::from_str(json)
}

/// Pretty-printed JSON; non-ASCII glyphs are written as-is.
pub fn export_json(package: &Package) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(package)
}
