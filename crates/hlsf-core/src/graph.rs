//! Undirected weighted graph over token and expansion nodes.
//!
//! Edges live once in an indexed edge list; each node keeps a list of the
//! edge indices it touches. Both endpoints therefore read the same record and
//! weight(u, v) == weight(v, u) holds by construction.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::embedding::charge;
use crate::error::GraphError;
use crate::geometry::Position;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Token,
    Expansion,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub kind: NodeKind,
    pub text: String,
    pub pos: Position,
    /// Vector number in [0, 99.9].
    pub v: f64,
    /// `v` remapped to [-1, 1]; rendering only.
    pub charge: f64,
    /// Expansion weight in [0, 1]. `None` for tokens.
    pub weight: Option<f64>,
    /// Owning token id. `None` for tokens.
    pub of: Option<String>,
}

impl Node {
    pub fn token(id: impl Into<String>, text: impl Into<String>, v: f64, pos: Position) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Token,
            text: text.into(),
            pos,
            v,
            charge: charge(v),
            weight: None,
            of: None,
        }
    }

    pub fn expansion(
        id: impl Into<String>,
        of: impl Into<String>,
        text: impl Into<String>,
        v: f64,
        pos: Position,
        weight: f64,
    ) -> Self {
        Self {
            id: id.into(),
            kind: NodeKind::Expansion,
            text: text.into(),
            pos,
            v,
            charge: charge(v),
            weight: Some(weight),
            of: Some(of.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub k: f64,
}

impl Edge {
    /// The endpoint opposite `n`.
    pub fn other(&self, n: usize) -> usize {
        if self.a == n { self.b } else { self.a }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self, node: Node) -> Result<usize, GraphError> {
        if self.index.contains_key(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.adjacency.push(Vec::new());
        Ok(idx)
    }

    /// Connect two existing nodes. Re-adding a pair replaces its weight.
    pub fn add_edge(&mut self, a: &str, b: &str, k: f64) -> Result<usize, GraphError> {
        let ia = self.require(a)?;
        let ib = self.require(b)?;
        if ia == ib {
            return Err(GraphError::SelfLoop(a.to_string()));
        }
        if !k.is_finite() || k < 0.0 {
            return Err(GraphError::InvalidWeight {
                a: a.to_string(),
                b: b.to_string(),
                weight: k,
            });
        }
        Ok(self.connect(ia, ib, k))
    }

    fn connect(&mut self, ia: usize, ib: usize, k: f64) -> usize {
        if let Some(e) = self.edge_between(ia, ib) {
            self.edges[e].k = k;
            return e;
        }
        let e = self.edges.len();
        self.edges.push(Edge { a: ia, b: ib, k });
        self.adjacency[ia].push(e);
        self.adjacency[ib].push(e);
        e
    }

    fn require(&self, id: &str) -> Result<usize, GraphError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::UnknownNode(id.to_string()))
    }

    fn edge_between(&self, ia: usize, ib: usize) -> Option<usize> {
        self.adjacency[ia]
            .iter()
            .copied()
            .find(|&e| self.edges[e].other(ia) == ib)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_of(id).map(|i| &self.nodes[i])
    }

    /// `(neighbor index, weight)` pairs in edge insertion order.
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.adjacency[idx].iter().map(move |&e| {
            let edge = &self.edges[e];
            (edge.other(idx), edge.k)
        })
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    /// Weight of the edge between two ids, if both exist and are connected.
    pub fn weight(&self, a: &str, b: &str) -> Option<f64> {
        let ia = self.index_of(a)?;
        let ib = self.index_of(b)?;
        self.edge_between(ia, ib).map(|e| self.edges[e].k)
    }

    pub fn endpoints(&self, edge: &Edge) -> (&str, &str) {
        (&self.nodes[edge.a].id, &self.nodes[edge.b].id)
    }

    /// Copy of the graph keeping only nodes that satisfy `keep`, along with
    /// the edges between them. Relative node and edge order is preserved.
    pub fn retain(&self, mut keep: impl FnMut(&Node) -> bool) -> Graph {
        let mut out = Graph::new();
        let mut remap: Vec<Option<usize>> = vec![None; self.nodes.len()];
        for (i, node) in self.nodes.iter().enumerate() {
            if keep(node) {
                remap[i] = Some(out.nodes.len());
                out.index.insert(node.id.clone(), out.nodes.len());
                out.nodes.push(node.clone());
                out.adjacency.push(Vec::new());
            }
        }
        for edge in &self.edges {
            if let (Some(a), Some(b)) = (remap[edge.a], remap[edge.b]) {
                out.connect(a, b, edge.k);
            }
        }
        out
    }

    /// Connected components via an explicit stack.
    /// Components are discovered in node insertion order.
    pub fn connected_components(&self) -> Vec<Vec<usize>> {
        let mut seen = vec![false; self.nodes.len()];
        let mut components = Vec::new();

        for start in 0..self.nodes.len() {
            if seen[start] {
                continue;
            }
            let mut stack = vec![start];
            let mut component = Vec::new();
            while let Some(cur) = stack.pop() {
                if seen[cur] {
                    continue;
                }
                seen[cur] = true;
                component.push(cur);
                for (nb, _) in self.neighbors(cur) {
                    if !seen[nb] {
                        stack.push(nb);
                    }
                }
            }
            components.push(component);
        }
        components
    }
}
