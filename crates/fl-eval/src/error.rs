//! Error types for evaluation.

use fl_graph::GraphError;
use thiserror::Error;

/// Result type for evaluation operations.
pub type EvalResult<T> = Result<T, EvalError>;

/// Errors that can occur while evaluating a diagram or reading a feed.
#[derive(Debug, Error)]
pub enum EvalError {
    /// The diagram has no valid evaluation order.
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A device data batch could not be parsed.
    #[error("Invalid device data: {0}")]
    Feed(#[from] serde_json::Error),
}
