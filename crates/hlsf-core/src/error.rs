use std::fmt;

/// Invariant violations detected while constructing a graph.
/// These are programming errors in the caller, never recovered locally.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    DuplicateNode(String),
    UnknownNode(String),
    SelfLoop(String),
    InvalidWeight { a: String, b: String, weight: f64 },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::DuplicateNode(id) => write!(f, "duplicate node id '{id}'"),
            GraphError::UnknownNode(id) => write!(f, "unknown node id '{id}'"),
            GraphError::SelfLoop(id) => write!(f, "self-loop on node '{id}'"),
            GraphError::InvalidWeight { a, b, weight } => {
                write!(f, "invalid edge weight {weight} between '{a}' and '{b}'")
            }
        }
    }
}

impl std::error::Error for GraphError {}

#[derive(Debug, Clone, PartialEq)]
pub enum HlsfError {
    /// Tokenization produced nothing; no graph work was attempted.
    EmptyInput,
    /// A pipeline setting is outside the range the engine can work with.
    InvalidConfig(String),
    Graph(GraphError),
}

impl fmt::Display for HlsfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HlsfError::EmptyInput => write!(f, "empty input: no tokens to build a graph from"),
            HlsfError::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            HlsfError::Graph(e) => write!(f, "graph construction failed: {e}"),
        }
    }
}

impl std::error::Error for HlsfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HlsfError::EmptyInput | HlsfError::InvalidConfig(_) => None,
            HlsfError::Graph(e) => Some(e),
        }
    }
}

impl From<GraphError> for HlsfError {
    fn from(e: GraphError) -> Self {
        HlsfError::Graph(e)
    }
}

pub type Result<T> = std::result::Result<T, HlsfError>;
