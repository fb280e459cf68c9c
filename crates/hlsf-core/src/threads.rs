use serde::{Deserialize, Serialize};

use crate::attention::Attention;
use crate::graph::{Graph, NodeKind};

/// A connected cluster of nodes that survived the attention threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// `th{n}`, where `n` is the component's discovery ordinal.
    pub id: String,
    /// Sum of member attention.
    pub score: f64,
    pub tokens: Vec<String>,
    pub expansions: Vec<String>,
}

impl Thread {
    pub fn size(&self) -> usize {
        self.tokens.len() + self.expansions.len()
    }
}

/// Drop nodes whose attention is below `min_weight`, split the remainder
/// into connected components and rank them by total attention.
///
/// Nodes the attention vector has no entry for are kept and score zero.
/// Ties keep discovery order. Neither input is modified.
pub fn extract_threads(graph: &Graph, attention: &Attention, min_weight: f64) -> Vec<Thread> {
    let kept = graph.retain(|node| attention.get(&node.id).is_none_or(|a| a >= min_weight));

    let mut threads: Vec<Thread> = kept
        .connected_components()
        .into_iter()
        .enumerate()
        .map(|(ordinal, members)| {
            let mut thread = Thread {
                id: format!("th{ordinal}"),
                score: 0.0,
                tokens: Vec::new(),
                expansions: Vec::new(),
            };
            for idx in members {
                let node = kept.node(idx);
                thread.score += attention.get(&node.id).unwrap_or(0.0);
                match node.kind {
                    NodeKind::Token => thread.tokens.push(node.id.clone()),
                    NodeKind::Expansion => thread.expansions.push(node.id.clone()),
                }
            }
            thread
        })
        .collect();

    threads.sort_by(|a, b| b.score.total_cmp(&a.score));
    threads
}
