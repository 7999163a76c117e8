//! Graph-specific error types.

use fl_core::BlockId;
use thiserror::Error;

use crate::block::{DataType, PinRef};

pub type GraphResult<T> = Result<T, GraphError>;

/// Structural rejections. Every operation that returns one of these leaves the
/// diagram unchanged.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Block {0} not found")]
    BlockNotFound(BlockId),

    #[error("Block {0} already exists")]
    DuplicateBlock(BlockId),

    #[error("No block ids left")]
    IdsExhausted,

    #[error("Pin {0:?} not found")]
    PinNotFound(PinRef),

    #[error("Pins {a:?} and {b:?} have the same direction")]
    SameDirection { a: PinRef, b: PinRef },

    #[error("Cannot connect {source_type:?} output to {dest_type:?} input")]
    TypeMismatch {
        source_type: DataType,
        dest_type: DataType,
    },

    #[error("Input {0:?} already has a source")]
    InputOccupied(PinRef),

    #[error("Output {output:?} is already connected to data storage block {block}")]
    DuplicateStorageLink { output: PinRef, block: BlockId },

    #[error("Connecting block {source_block} to block {dest_block} would create a cycle")]
    Cycle {
        source_block: BlockId,
        dest_block: BlockId,
    },

    #[error("Only one data storage block allowed per program")]
    DataStorageLimit,

    #[error("Diagram contains a cycle")]
    Topology,
}
