use serde::{Deserialize, Serialize};

use crate::constants::VALUE_MAX;

/// Rendering-only descriptor for a token and its two expansions.
/// Not consumed by attention or thread extraction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub id: String,
    pub nodes: [String; 3],
    /// (hue in degrees, saturation, value)
    pub hsv: [f64; 3],
    pub alpha: f64,
}

/// Hue from the token value, saturation and value from the two expansion
/// values, opacity from the mean expansion weight.
pub fn triangle_hsv(token_v: f64, first_v: f64, second_v: f64) -> [f64; 3] {
    [
        360.0 * (token_v / VALUE_MAX),
        first_v / VALUE_MAX,
        second_v / VALUE_MAX,
    ]
}

pub fn triangle_alpha(first_weight: f64, second_weight: f64) -> f64 {
    0.01 + 0.99 * ((first_weight + second_weight) / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hsv_bounds() {
        assert_eq!(triangle_hsv(0.0, 0.0, 0.0), [0.0, 0.0, 0.0]);
        let top = triangle_hsv(99.9, 99.9, 99.9);
        assert_relative_eq!(top[0], 360.0);
        assert_relative_eq!(top[1], 1.0);
        assert_relative_eq!(top[2], 1.0);
    }

    #[test]
    fn test_alpha_never_fully_transparent() {
        assert_relative_eq!(triangle_alpha(0.0, 0.0), 0.01);
        assert_relative_eq!(triangle_alpha(1.0, 1.0), 1.0);
        assert_relative_eq!(triangle_alpha(0.85, 0.65), 0.7525, epsilon = 1e-12);
    }
}
