//! Pointer interaction states.

use fl_core::BlockId;
use fl_graph::{PinRef, Point};

/// What the pointer is currently doing on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    /// Moving a block. `offset` is block position minus the pointer position
    /// at pointer-down, so the block keeps its grip point under the pointer.
    DraggingBlock {
        block: BlockId,
        offset: Point,
        moved: bool,
    },
    /// Dragging a new connection out of `start`. `pointer` is the free end.
    DrawingConnection { start: PinRef, pointer: Point },
}

impl InteractionState {
    pub fn is_idle(&self) -> bool {
        matches!(self, InteractionState::Idle)
    }

    pub fn dragged_block(&self) -> Option<BlockId> {
        match self {
            InteractionState::DraggingBlock { block, .. } => Some(*block),
            _ => None,
        }
    }
}

/// Canvas element under the pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Pin(PinRef),
    Block(BlockId),
    /// A drawn connection, identified by its destination input pin.
    Connection(PinRef),
}

/// New block position for a drag, kept inside the canvas.
pub fn drag_position(pointer: Point, offset: Point) -> Point {
    Point::new(
        (pointer.x + offset.x).max(0.0),
        (pointer.y + offset.y).max(0.0),
    )
}

/// Whether a connection drawn from `start` may end on `end`. Everything
/// else is checked by the diagram when connecting.
pub fn can_finish_connection(start: PinRef, end: PinRef) -> bool {
    start.direction != end.direction
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_keeps_grip_and_clamps() {
        let offset = Point::new(-10.0, -5.0);
        assert_eq!(
            drag_position(Point::new(100.0, 50.0), offset),
            Point::new(90.0, 45.0)
        );
        assert_eq!(
            drag_position(Point::new(4.0, 2.0), offset),
            Point::new(0.0, 0.0)
        );
    }

    #[test]
    fn connection_needs_opposite_directions() {
        let a = BlockId::from_index(0);
        let b = BlockId::from_index(1);
        assert!(can_finish_connection(
            PinRef::output(a, 0),
            PinRef::input(b, 0)
        ));
        assert!(!can_finish_connection(
            PinRef::input(a, 0),
            PinRef::input(b, 1)
        ));
    }

    #[test]
    fn dragged_block_only_while_dragging() {
        let block = BlockId::from_index(3);
        let state = InteractionState::DraggingBlock {
            block,
            offset: Point::default(),
            moved: false,
        };
        assert_eq!(state.dragged_block(), Some(block));
        assert_eq!(InteractionState::default().dragged_block(), None);
        assert!(InteractionState::default().is_idle());
    }
}
