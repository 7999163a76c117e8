//! Error types for the fl-editor layer.

use fl_core::BlockId;

/// Editor error type wrapping the backend crates' errors.
#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("Program error: {0}")]
    Program(#[from] fl_program::ProgramError),

    #[error("Graph error: {0}")]
    Graph(#[from] fl_graph::GraphError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] fl_eval::EvalError),

    #[error("Invalid name: {reason}")]
    InvalidName { reason: String },

    #[error("Blocks of type {kind} cannot be renamed")]
    RenameNotAllowed { kind: String },

    #[error("Block {block} has no parameter {name}")]
    UnknownParam { block: BlockId, name: String },

    #[error("Block {0} is not a number entry")]
    NotNumberEntry(BlockId),
}

/// Result type for fl-editor operations.
pub type EditorResult<T> = Result<T, EditorError>;
