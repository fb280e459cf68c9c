use std::collections::HashMap;

use crate::color::{Triangle, triangle_alpha, triangle_hsv};
use crate::constants::VALUE_MIDPOINT;
use crate::embedding::cosine_similarity;
use crate::error::GraphError;
use crate::expansion::ExpansionPair;
use crate::geometry::{Position, distance, offset_from};
use crate::graph::{Graph, Node};

/// Everything the builder needs, keyed by string text where applicable.
pub struct BuildInput<'a> {
    pub tokens: &'a [String],
    /// One pair per token, aligned with `tokens`.
    pub expansions: &'a [ExpansionPair],
    pub embeddings: &'a HashMap<String, Vec<f64>>,
    pub values: &'a HashMap<String, f64>,
    pub positions: &'a HashMap<String, Position>,
}

/// The assembled field: the graph plus per-token rendering descriptors.
pub struct SpaceField {
    pub graph: Graph,
    pub triangles: Vec<Triangle>,
}

pub fn token_id(i: usize) -> String {
    format!("t{i}")
}

pub fn expansion_id(i: usize, slot: usize) -> String {
    format!("t{i}_e{}", slot + 1)
}

/// Token–expansion edge weight: semantic closeness damped by spatial distance.
/// Negative similarity carries no attention flow and is floored at zero.
pub fn edge_weight(token_vec: &[f64], exp_vec: &[f64], token_pos: Position, exp_pos: Position) -> f64 {
    let sim = cosine_similarity(token_vec, exp_vec).max(0.0);
    sim / (1.0 + distance(token_pos, exp_pos))
}

/// Build the token/expansion graph.
///
/// All token nodes are inserted first (`t0..tn`), then each token's two
/// expansion nodes (`t{i}_e1`, `t{i}_e2`) with their edges. Expansion text
/// without a position is placed at a fixed offset from its token, and that
/// placement is reused if the same text shows up again.
pub fn build_graph(input: &BuildInput<'_>) -> Result<SpaceField, GraphError> {
    let mut graph = Graph::new();
    let mut positions = input.positions.clone();
    let mut triangles = Vec::with_capacity(input.tokens.len());
    let empty: Vec<f64> = Vec::new();

    let value_of = |text: &str| input.values.get(text).copied();

    for (i, token) in input.tokens.iter().enumerate() {
        let v = value_of(token).unwrap_or(VALUE_MIDPOINT);
        let pos = positions.get(token).copied().unwrap_or_default();
        graph.add_node(Node::token(token_id(i), token.as_str(), v, pos))?;
    }

    for (i, token) in input.tokens.iter().enumerate() {
        let Some(pair) = input.expansions.get(i) else {
            continue;
        };
        let tid = token_id(i);
        let token_v = value_of(token).unwrap_or(VALUE_MIDPOINT);
        let token_pos = positions.get(token).copied().unwrap_or_default();
        let token_vec = input.embeddings.get(token).unwrap_or(&empty);

        let mut exp_values = [token_v; 2];
        for (slot, exp) in pair.iter().enumerate() {
            let eid = expansion_id(i, slot);
            let pos = *positions
                .entry(exp.text.clone())
                .or_insert_with(|| offset_from(token_pos));
            let v = value_of(&exp.text).unwrap_or(token_v);
            exp_values[slot] = v;

            graph.add_node(Node::expansion(
                eid.as_str(),
                tid.as_str(),
                exp.text.as_str(),
                v,
                pos,
                exp.weight,
            ))?;

            let exp_vec = input.embeddings.get(&exp.text).unwrap_or(token_vec);
            let k = edge_weight(token_vec, exp_vec, token_pos, pos);
            graph.add_edge(&tid, &eid, k)?;
        }

        triangles.push(Triangle {
            id: format!("d{i}"),
            nodes: [tid, expansion_id(i, 0), expansion_id(i, 1)],
            hsv: triangle_hsv(token_v, exp_values[0], exp_values[1]),
            alpha: triangle_alpha(pair[0].weight, pair[1].weight),
        });
    }

    Ok(SpaceField { graph, triangles })
}
