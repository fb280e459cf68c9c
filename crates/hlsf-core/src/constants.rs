/// Default seed for direction-vector derivation and glyph hashing.
pub const DEFAULT_SEED: u64 = 777;

/// Default embedding dimension.
pub const DEFAULT_EMB_DIM: usize = 64;

/// Restart probability of the attention random walk.
pub const RESTART_PROB: f64 = 0.15;

/// L1 convergence tolerance for attention propagation.
pub const TOLERANCE: f64 = 1e-8;

/// Hard cap on attention iterations.
pub const MAX_ITER: usize = 10_000;

/// Nodes with attention below this are dropped before thread extraction.
pub const MIN_THREAD_WEIGHT: f64 = 1e-6;

/// Upper bound of the rescaled vector number range [0, VALUE_MAX].
pub const VALUE_MAX: f64 = 99.9;

/// Value assigned to every string when the score spread is degenerate.
pub const VALUE_MIDPOINT: f64 = 50.0;

/// Spread below which a score distribution is considered uniform.
pub const DEGENERATE_SPAN: f64 = 1e-9;

/// Modulus applied to each 4-byte digest word during embedding.
pub const HASH_MODULUS: u32 = 2001;

/// Offset applied to a token position when an expansion has none.
pub const EXPANSION_OFFSET: [f64; 2] = [0.05, -0.05];

/// Default glyph bank size.
pub const DEFAULT_GLYPH_COUNT: usize = 1000;

/// Default weight of a semantic expansion when the generator omits it.
pub const DEFAULT_SEMANTIC_WEIGHT: f64 = 0.8;

/// Default weight of an associative expansion when the generator omits it.
pub const DEFAULT_ASSOCIATIVE_WEIGHT: f64 = 0.6;

/// Package format version.
pub const PACKAGE_VERSION: &str = "0.0.0.0";
