//! Editor configuration.

use fl_graph::Point;
use serde::{Deserialize, Serialize};

/// Space reserved by the surrounding UI (side menu, top bar). Pointer
/// positions arrive in page coordinates and are shifted by these insets.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Insets {
    pub left: f64,
    pub top: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Maximum number of history entries, including the current state.
    pub history_capacity: usize,
    pub chrome: Insets,
    /// Pin hit radius in canvas units.
    pub pin_radius: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 11,
            chrome: Insets::default(),
            pin_radius: 10.0,
        }
    }
}

impl EditorConfig {
    /// Convert a page position to canvas coordinates.
    pub fn to_canvas(&self, page: Point) -> Point {
        Point::new(page.x - self.chrome.left, page.y - self.chrome.top)
    }
}
