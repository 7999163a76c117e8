//! fl-core: stable foundation for flowlab.
//!
//! Contains:
//! - ids (stable compact IDs for diagram blocks)
//! - numeric (Real + tolerances + display/entry helpers)
//! - error (shared error types)

pub mod error;
pub mod ids;
pub mod numeric;

// Re-exports: nice ergonomics for downstream crates
pub use error::{CoreError, CoreResult};
pub use ids::*;
pub use numeric::*;
