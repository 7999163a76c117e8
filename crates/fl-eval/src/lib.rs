//! Evaluation engine for flowlab diagrams.
//!
//! Given the latest values pushed into device, timer and number entry blocks,
//! the engine computes a value for every other block in dependency order.
//!
//! # Architecture
//!
//! - `filter`: stateless filter math over numbers, arrays and images
//! - `average`: sampled moving averages with per-block state
//! - `engine`: the `Evaluator` pass over a `Diagram`
//! - `feed`: device data batches
//!
//! Unknown inputs propagate as unknown outputs rather than errors.

pub mod average;
pub mod engine;
pub mod error;
pub mod feed;
pub mod filter;

pub use average::{AverageKind, MovingAverage, MovingAverageState};
pub use engine::Evaluator;
pub use error::{EvalError, EvalResult};
pub use feed::{DeviceReading, parse_batch};
