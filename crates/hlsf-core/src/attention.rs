//! Attention as a random walk with restart (personalized PageRank).
//!
//! Each step moves `1 - r` of the mass along row-normalized edge weights and
//! re-injects `r` at the seed distribution. Mass parked on a node without
//! outgoing weight also returns through the seed distribution, so the vector
//! stays a probability distribution at every step.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_ITER, RESTART_PROB, TOLERANCE};
use crate::graph::Graph;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionParams {
    /// Restart probability `r`, in (0, 1).
    pub restart: f64,
    /// L1 change between steps below which the walk has converged.
    pub tolerance: f64,
    /// Hard iteration cap; running out is not an error.
    pub max_iter: usize,
}

impl Default for AttentionParams {
    fn default() -> Self {
        Self {
            restart: RESTART_PROB,
            tolerance: TOLERANCE,
            max_iter: MAX_ITER,
        }
    }
}

/// Stationary attention over a graph's nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Attention {
    ids: Vec<String>,
    index: HashMap<String, usize>,
    probabilities: Vec<f64>,
    /// Steps actually taken.
    pub iterations: usize,
    /// False when `max_iter` ran out before the tolerance was met.
    pub converged: bool,
}

impl Attention {
    pub fn get(&self, id: &str) -> Option<f64> {
        self.index.get(id).map(|&i| self.probabilities[i])
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// `(id, probability)` in the order the graph's nodes were inserted.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> + '_ {
        self.ids
            .iter()
            .map(String::as_str)
            .zip(self.probabilities.iter().copied())
    }

    pub fn total(&self) -> f64 {
        self.probabilities.iter().sum()
    }

    pub fn to_map(&self) -> BTreeMap<String, f64> {
        self.iter().map(|(id, p)| (id.to_string(), p)).collect()
    }
}

/// Build an attention vector directly from `(id, probability)` pairs.
/// Useful for thresholding experiments and for callers with their own scores.
impl FromIterator<(String, f64)> for Attention {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut out = Attention {
            converged: true,
            ..Default::default()
        };
        for (id, p) in iter {
            match out.index.get(&id) {
                Some(&i) => out.probabilities[i] = p,
                None => {
                    out.index.insert(id.clone(), out.ids.len());
                    out.ids.push(id);
                    out.probabilities.push(p);
                }
            }
        }
        out
    }
}

/// Row-stochastic transitions: `rows[u]` lists `(v, P[u][v])`.
/// A node whose edges carry no weight gets an empty row.
fn transition_rows(graph: &Graph) -> Vec<Vec<(usize, f64)>> {
    (0..graph.len())
        .map(|u| {
            let total: f64 = graph.neighbors(u).map(|(_, k)| k).sum();
            if total > 0.0 {
                graph.neighbors(u).map(|(v, k)| (v, k / total)).collect()
            } else {
                Vec::new()
            }
        })
        .collect()
}

/// Restart distribution: uniform over the distinct seeds present in the
/// graph, or uniform over every node when none are.
fn restart_distribution<S: AsRef<str>>(graph: &Graph, seeds: &[S]) -> Vec<f64> {
    let n = graph.len();
    let mut hit = vec![false; n];
    for seed in seeds {
        if let Some(i) = graph.index_of(seed.as_ref()) {
            hit[i] = true;
        }
    }
    let count = hit.iter().filter(|h| **h).count();
    if count == 0 {
        return vec![1.0 / n as f64; n];
    }
    let share = 1.0 / count as f64;
    hit.into_iter()
        .map(|h| if h { share } else { 0.0 })
        .collect()
}

/// Propagate attention from `seeds` until the L1 step change drops below
/// `params.tolerance` or `params.max_iter` steps have run.
pub fn propagate<S: AsRef<str>>(graph: &Graph, seeds: &[S], params: &AttentionParams) -> Attention {
    debug_assert!((0.0..=1.0).contains(&params.restart), "restart must be in [0, 1]");

    let n = graph.len();
    let ids: Vec<String> = graph.nodes().iter().map(|node| node.id.clone()).collect();
    let index: HashMap<String, usize> = ids.iter().enumerate().map(|(i, id)| (id.clone(), i)).collect();
    if n == 0 {
        return Attention {
            ids,
            index,
            probabilities: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let rows = transition_rows(graph);
    let p0 = restart_distribution(graph, seeds);
    let r = params.restart;
    let walk = 1.0 - r;

    let mut p = p0.clone();
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < params.max_iter {
        let dangling: f64 = rows
            .iter()
            .zip(&p)
            .filter(|(row, _)| row.is_empty())
            .map(|(_, mass)| mass)
            .sum();
        let reinjected = r + walk * dangling;
        for (slot, base) in next.iter_mut().zip(&p0) {
            *slot = reinjected * base;
        }
        for (u, row) in rows.iter().enumerate() {
            let mass = p[u];
            if mass == 0.0 {
                continue;
            }
            for &(v, prob) in row {
                next[v] += walk * prob * mass;
            }
        }

        let diff: f64 = next.iter().zip(&p).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut p, &mut next);
        iterations += 1;
        if diff < params.tolerance {
            converged = true;
            break;
        }
    }

    Attention {
        ids,
        index,
        probabilities: p,
        iterations,
        converged,
    }
}
