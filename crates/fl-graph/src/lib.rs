//! fl-graph: diagram model for flowlab.
//!
//! Provides:
//! - Blocks, typed pins and connections (`Block`, `Pin`, `PinRef`)
//! - The editable `Diagram` with its id lookup, reverse dependents index and
//!   device/timer name registry
//! - Block palette templates and placement
//! - Data storage pin reconciliation
//! - Evaluation ordering and cycle detection
//!
//! # Example
//!
//! ```
//! use fl_graph::{BlockTemplate, DeviceType, Diagram, PinRef};
//!
//! let mut diagram = Diagram::new();
//! let timer = diagram.add_block(BlockTemplate::timer()).unwrap();
//! let plot = diagram.add_block(BlockTemplate::plot()).unwrap();
//! diagram
//!     .connect(PinRef::output(timer, 0), PinRef::input(plot, 0))
//!     .unwrap();
//!
//! assert_eq!(diagram.evaluation_order().unwrap(), vec![timer, plot]);
//! ```

pub mod block;
pub mod catalog;
pub mod diagram;
pub mod error;
pub mod order;
pub mod reconcile;

// Re-exports for ergonomics
pub use block::{
    Block, BlockKind, DataType, DeviceType, FilterKind, Param, ParamValue, Pin, PinDirection,
    PinRef, Point, Value,
};
pub use catalog::{BlockTemplate, palette_position};
pub use diagram::Diagram;
pub use error::{GraphError, GraphResult};
pub use reconcile::{PinDelta, SEQUENCE_NAMES, apply_delta, reconcile};
