//! Program editor core.
//!
//! The [`Editor`] owns one diagram and turns events (pointer gestures,
//! commands, device data, save completions) into graph mutations. It keeps a
//! bounded undo history of program snapshots, coalesces saves so at most one
//! is in flight, and exposes a read-only [`Projection`] for drawing.
//!
//! Storage and naming are collaborators behind the [`Persistence`] and
//! [`Naming`] traits.

pub mod config;
pub mod editor;
pub mod error;
pub mod history;
pub mod interaction;
pub mod naming;
pub mod params;
pub mod projection;
pub mod save;

pub use config::{EditorConfig, Insets};
pub use editor::{Editor, EditorEvent, Notice};
pub use error::{EditorError, EditorResult};
pub use history::History;
pub use interaction::{InteractionState, PointerTarget};
pub use naming::{DefaultNaming, Naming, filter_invalid_characters};
pub use params::ParamEdit;
pub use projection::{BlockView, ConnectionView, DisplayValue, Projection, Rect};
pub use save::{Persistence, SaveAction, SaveCoordinator, SaveStatus};
