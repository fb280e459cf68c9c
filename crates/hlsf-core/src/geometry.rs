use std::collections::HashMap;

use crate::constants::EXPANSION_OFFSET;

/// Point on the 2-D field plane.
pub type Position = [f64; 2];

/// Place an embedding on the plane from its leading components.
/// One-dimensional vectors reuse the first component at half scale for y.
/// Coordinates are clamped to [-1, 1].
pub fn planar(vec: &[f64]) -> Position {
    let x = vec.first().copied().unwrap_or(0.0);
    let y = match vec {
        [] => 0.0,
        [only] => only * 0.5,
        [_, y, ..] => *y,
    };
    [x.clamp(-1.0, 1.0), y.clamp(-1.0, 1.0)]
}

/// Planar position for every embedded string.
pub fn planar_positions(embeddings: &HashMap<String, Vec<f64>>) -> HashMap<String, Position> {
    embeddings
        .iter()
        .map(|(text, vec)| (text.clone(), planar(vec)))
        .collect()
}

/// Deterministic placement next to an anchor for strings without a position.
pub fn offset_from(anchor: Position) -> Position {
    [anchor[0] + EXPANSION_OFFSET[0], anchor[1] + EXPANSION_OFFSET[1]]
}

pub fn distance(a: Position, b: Position) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}
