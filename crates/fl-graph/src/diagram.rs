//! The editable diagram: blocks in draw order plus the indexes kept alongside.

use std::collections::{BTreeSet, HashMap};

use fl_core::BlockId;

use crate::block::{Block, Pin, PinRef, Point, Value};
use crate::catalog::{BlockTemplate, palette_position};
use crate::error::{GraphError, GraphResult};

/// A dataflow diagram.
///
/// Blocks are stored in diagram (draw) order. Alongside them the diagram
/// maintains:
/// - an id lookup (`BlockId` -> position in `blocks`)
/// - a reverse index from each source block to the input pins it feeds
/// - a name registry for device and timer blocks
///
/// Connections are owned by the destination input pin (`Pin::source`). All
/// structural changes go through `connect`/`disconnect`/`remove_block` so the
/// indexes stay consistent.
#[derive(Debug, Clone)]
pub struct Diagram {
    blocks: Vec<Block>,
    next_id: Option<BlockId>,
    index: HashMap<BlockId, usize>,
    dependents: HashMap<BlockId, BTreeSet<PinRef>>,
    names: HashMap<String, BlockId>,
}

impl Default for Diagram {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Diagram {
    fn eq(&self, other: &Self) -> bool {
        self.blocks == other.blocks
    }
}

impl Diagram {
    pub fn new() -> Self {
        Self {
            blocks: Vec::new(),
            next_id: Some(BlockId::from_index(0)),
            index: HashMap::new(),
            dependents: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Blocks in diagram order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// The id the next added block will receive, or `None` once the id space
    /// is used up.
    pub fn next_id(&self) -> Option<BlockId> {
        self.next_id
    }

    pub fn find_block(&self, id: BlockId) -> Option<&Block> {
        self.index.get(&id).map(|&i| &self.blocks[i])
    }

    /// Mutable access for values, params, name and position.
    ///
    /// Pin sources must not be edited through this; use `connect` and
    /// `disconnect` so the reverse index stays in sync.
    pub fn find_block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.blocks[i]),
            None => None,
        }
    }

    /// Position of a block in diagram order.
    pub fn position_of(&self, id: BlockId) -> Option<usize> {
        self.index.get(&id).copied()
    }

    pub fn pin(&self, pin: PinRef) -> Option<&Pin> {
        self.find_block(pin.block)
            .and_then(|b| b.pin(pin.direction, pin.index))
    }

    /// Device or timer block registered under `name`.
    pub fn named_block(&self, name: &str) -> Option<BlockId> {
        self.names.get(name).copied()
    }

    /// Whether the diagram already holds a data storage block.
    pub fn has_data_storage(&self) -> bool {
        self.blocks.iter().any(|b| b.kind.is_data_storage())
    }

    /// Add a block built from a palette template.
    ///
    /// Assigns the next id and a palette position. Device and timer names are
    /// made unique. A second data storage block is rejected.
    pub fn add_block(&mut self, template: BlockTemplate) -> GraphResult<BlockId> {
        if template.kind.is_data_storage() && self.has_data_storage() {
            tracing::debug!("Rejected second data storage block");
            return Err(GraphError::DataStorageLimit);
        }

        let id = self.next_id.ok_or(GraphError::IdsExhausted)?;
        let name = if template.kind.is_named_source() {
            self.unique_name(&template.name)
        } else {
            template.name
        };
        let inputs = template
            .input_type
            .map(|t| (0..template.input_count).map(|_| Pin::input(t)).collect())
            .unwrap_or_default();
        let outputs = template
            .output_type
            .map(|t| (0..template.output_count).map(|_| Pin::output(t)).collect())
            .unwrap_or_default();

        let block = Block {
            id,
            kind: template.kind,
            name,
            units: template.units,
            has_seq: template.has_seq,
            value: None,
            params: template.params,
            inputs,
            outputs,
            position: palette_position(self.blocks.len()),
        };
        tracing::debug!("Adding block {} ({}) as {:?}", id, block.kind, block.name);
        self.insert_block(block)?;
        Ok(id)
    }

    /// Insert a fully formed block, keeping its id.
    ///
    /// Used when rebuilding a diagram from a program file. Input sources may
    /// reference blocks that are inserted later.
    pub fn insert_block(&mut self, block: Block) -> GraphResult<()> {
        if self.index.contains_key(&block.id) {
            return Err(GraphError::DuplicateBlock(block.id));
        }
        if self.next_id.is_some_and(|next| block.id >= next) {
            self.next_id = block.id.next();
        }
        for (i, pin) in block.inputs.iter().enumerate() {
            if let Some(src) = pin.source {
                self.dependents
                    .entry(src.block)
                    .or_default()
                    .insert(PinRef::input(block.id, i));
            }
        }
        if block.kind.is_named_source() {
            self.names.insert(block.name.clone(), block.id);
        }
        self.index.insert(block.id, self.blocks.len());
        self.blocks.push(block);
        Ok(())
    }

    /// Remove a block, severing every connection into and out of it first.
    pub fn remove_block(&mut self, id: BlockId) -> GraphResult<Block> {
        let pos = self.position_of(id).ok_or(GraphError::BlockNotFound(id))?;

        for dest in self.find_dest_pins(id) {
            self.disconnect(dest);
        }
        let input_count = self.blocks[pos].inputs.len();
        for i in 0..input_count {
            self.disconnect(PinRef::input(id, i));
        }

        let block = self.blocks.remove(pos);
        self.dependents.remove(&id);
        self.rebuild_index();
        if block.kind.is_named_source() {
            self.rebuild_name_index();
        }
        tracing::debug!("Removed block {} ({})", id, block.kind);
        Ok(block)
    }

    /// Input pins fed by any output of `id`.
    pub fn find_dest_pins(&self, id: BlockId) -> Vec<PinRef> {
        self.dependents
            .get(&id)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Connect two pins given in either order.
    ///
    /// One must be an output and the other an input of the same data type.
    /// The input must be free, and the edge must not close a cycle. An output
    /// may feed a data storage block only once.
    pub fn connect(&mut self, a: PinRef, b: PinRef) -> GraphResult<()> {
        let pin_a = self.pin(a).ok_or(GraphError::PinNotFound(a))?;
        let pin_b = self.pin(b).ok_or(GraphError::PinNotFound(b))?;
        if a.direction == b.direction {
            return Err(GraphError::SameDirection { a, b });
        }
        let (source, dest, source_pin, dest_pin) = if a.is_input() {
            (b, a, pin_b, pin_a)
        } else {
            (a, b, pin_a, pin_b)
        };

        if source_pin.data_type != dest_pin.data_type {
            return Err(GraphError::TypeMismatch {
                source_type: source_pin.data_type,
                dest_type: dest_pin.data_type,
            });
        }
        if dest_pin.is_connected() {
            return Err(GraphError::InputOccupied(dest));
        }

        let dest_block = self
            .find_block(dest.block)
            .ok_or(GraphError::BlockNotFound(dest.block))?;
        if dest_block.kind.is_data_storage()
            && dest_block.inputs.iter().any(|p| p.source == Some(source))
        {
            return Err(GraphError::DuplicateStorageLink {
                output: source,
                block: dest.block,
            });
        }
        if self.would_create_cycle(source.block, dest.block) {
            return Err(GraphError::Cycle {
                source_block: source.block,
                dest_block: dest.block,
            });
        }

        if let Some(block) = self.find_block_mut(dest.block) {
            block.inputs[dest.index].source = Some(source);
        }
        self.dependents.entry(source.block).or_default().insert(dest);
        tracing::debug!("Connected {:?} -> {:?}", source, dest);
        Ok(())
    }

    /// Clear the source of an input pin. Returns whether a connection existed.
    pub fn disconnect(&mut self, dest: PinRef) -> bool {
        if !dest.is_input() {
            return false;
        }
        let Some(block) = self.find_block_mut(dest.block) else {
            return false;
        };
        let Some(pin) = block.inputs.get_mut(dest.index) else {
            return false;
        };
        let Some(source) = pin.source.take() else {
            return false;
        };
        if let Some(set) = self.dependents.get_mut(&source.block) {
            set.remove(&dest);
            if set.is_empty() {
                self.dependents.remove(&source.block);
            }
        }
        tracing::debug!("Disconnected {:?} -> {:?}", source, dest);
        true
    }

    pub fn rename_block(&mut self, id: BlockId, name: impl Into<String>) -> GraphResult<()> {
        let block = self
            .find_block_mut(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        block.name = name.into();
        let named = block.kind.is_named_source();
        if named {
            self.rebuild_name_index();
        }
        Ok(())
    }

    pub fn set_position(&mut self, id: BlockId, position: Point) -> GraphResult<()> {
        let block = self
            .find_block_mut(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        block.position = position;
        Ok(())
    }

    pub fn set_value(&mut self, id: BlockId, value: Option<Value>) -> GraphResult<()> {
        let block = self
            .find_block_mut(id)
            .ok_or(GraphError::BlockNotFound(id))?;
        block.value = value;
        Ok(())
    }

    /// `name` if no device/timer block uses it, else the first free
    /// `"name 2"`, `"name 3"`, ...
    pub fn unique_name(&self, name: &str) -> String {
        if !self.names.contains_key(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name} {n}"))
            .find(|candidate| !self.names.contains_key(candidate))
            .unwrap_or_else(|| name.to_string())
    }

    /// Rebuild the device/timer name registry from the blocks.
    pub fn rebuild_name_index(&mut self) {
        self.names = self
            .blocks
            .iter()
            .filter(|b| b.kind.is_named_source())
            .map(|b| (b.name.clone(), b.id))
            .collect();
    }

    /// Rebuild the reverse index from the input pins. Needed after input pins
    /// are inserted or removed in place.
    pub fn rebuild_dependents(&mut self) {
        let mut dependents: HashMap<BlockId, BTreeSet<PinRef>> = HashMap::new();
        for block in &self.blocks {
            for (i, pin) in block.inputs.iter().enumerate() {
                if let Some(src) = pin.source {
                    dependents
                        .entry(src.block)
                        .or_default()
                        .insert(PinRef::input(block.id, i));
                }
            }
        }
        self.dependents = dependents;
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .blocks
            .iter()
            .enumerate()
            .map(|(i, b)| (b.id, i))
            .collect();
    }

    /// Mutable access to every block, for passes that only touch values.
    pub(crate) fn blocks_mut(&mut self) -> &mut [Block] {
        &mut self.blocks
    }

    /// Every connection as `(source output, destination input)`, in diagram
    /// order of the destination.
    pub fn connections(&self) -> Vec<(PinRef, PinRef)> {
        self.blocks
            .iter()
            .flat_map(|b| {
                b.inputs
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, p)| p.source.map(|s| (s, PinRef::input(b.id, i))))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{BlockKind, DataType, DeviceType, FilterKind};

    fn device(d: &mut Diagram, kind: &str) -> BlockId {
        d.add_block(BlockTemplate::device(DeviceType::new(kind))).unwrap()
    }

    #[test]
    fn ids_are_monotonic() {
        let mut d = Diagram::new();
        let a = device(&mut d, "light");
        let b = device(&mut d, "light");
        assert!(a < b);
        d.remove_block(b).unwrap();
        let c = device(&mut d, "light");
        assert!(c > a);
        assert_eq!(d.len(), 2);
    }

    #[test]
    fn device_names_are_unique() {
        let mut d = Diagram::new();
        let a = device(&mut d, "temperature");
        let b = device(&mut d, "temperature");
        let c = device(&mut d, "temperature");
        assert_eq!(d.find_block(a).unwrap().name, "temperature");
        assert_eq!(d.find_block(b).unwrap().name, "temperature 2");
        assert_eq!(d.find_block(c).unwrap().name, "temperature 3");
        assert_eq!(d.named_block("temperature 2"), Some(b));
    }

    #[test]
    fn filter_names_are_not_registered() {
        let mut d = Diagram::new();
        let a = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();
        let b = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();
        assert_eq!(d.find_block(a).unwrap().name, "plus");
        assert_eq!(d.find_block(b).unwrap().name, "plus");
        assert_eq!(d.named_block("plus"), None);
    }

    #[test]
    fn second_data_storage_rejected() {
        let mut d = Diagram::new();
        d.add_block(BlockTemplate::data_storage("p")).unwrap();
        let err = d.add_block(BlockTemplate::data_storage("p")).unwrap_err();
        assert_eq!(err, GraphError::DataStorageLimit);
        assert_eq!(d.len(), 1);
    }

    #[test]
    fn connect_either_order() {
        let mut d = Diagram::new();
        let s = device(&mut d, "light");
        let p = d.add_block(BlockTemplate::plot()).unwrap();
        d.connect(PinRef::input(p, 0), PinRef::output(s, 0)).unwrap();
        assert_eq!(
            d.find_block(p).unwrap().inputs[0].source,
            Some(PinRef::output(s, 0))
        );
        assert_eq!(d.find_dest_pins(s), vec![PinRef::input(p, 0)]);
    }

    #[test]
    fn connect_rejections_leave_diagram_unchanged() {
        let mut d = Diagram::new();
        let s = device(&mut d, "light");
        let cam = device(&mut d, "camera");
        let p = d.add_block(BlockTemplate::plot()).unwrap();
        let before = d.clone();

        assert!(matches!(
            d.connect(PinRef::output(s, 0), PinRef::output(cam, 0)),
            Err(GraphError::SameDirection { .. })
        ));
        assert!(matches!(
            d.connect(PinRef::output(cam, 0), PinRef::input(p, 0)),
            Err(GraphError::TypeMismatch {
                source_type: DataType::Image,
                dest_type: DataType::Numeric
            })
        ));
        assert!(matches!(
            d.connect(PinRef::output(s, 3), PinRef::input(p, 0)),
            Err(GraphError::PinNotFound(_))
        ));
        assert_eq!(d, before);

        d.connect(PinRef::output(s, 0), PinRef::input(p, 0)).unwrap();
        assert!(matches!(
            d.connect(PinRef::output(s, 0), PinRef::input(p, 0)),
            Err(GraphError::InputOccupied(_))
        ));
    }

    #[test]
    fn cycles_are_rejected() {
        let mut d = Diagram::new();
        let a = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();
        let b = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();
        d.connect(PinRef::output(a, 0), PinRef::input(b, 0)).unwrap();
        let err = d
            .connect(PinRef::output(b, 0), PinRef::input(a, 0))
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
        let err = d
            .connect(PinRef::output(a, 0), PinRef::input(a, 1))
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }));
    }

    #[test]
    fn remove_block_severs_connections() {
        let mut d = Diagram::new();
        let s = device(&mut d, "light");
        let f = d.add_block(BlockTemplate::filter(FilterKind::AbsoluteValue)).unwrap();
        let p = d.add_block(BlockTemplate::plot()).unwrap();
        d.connect(PinRef::output(s, 0), PinRef::input(f, 0)).unwrap();
        d.connect(PinRef::output(f, 0), PinRef::input(p, 0)).unwrap();

        d.remove_block(f).unwrap();
        assert!(d.find_block(f).is_none());
        assert!(d.find_dest_pins(s).is_empty());
        assert!(d.find_block(p).unwrap().inputs[0].source.is_none());
        assert!(d.connections().is_empty());
    }

    #[test]
    fn rename_updates_registry() {
        let mut d = Diagram::new();
        let t = d.add_block(BlockTemplate::timer()).unwrap();
        d.rename_block(t, "pump timer").unwrap();
        assert_eq!(d.named_block("pump timer"), Some(t));
        assert_eq!(d.named_block("timer"), None);
        assert_eq!(d.find_block(t).unwrap().kind, BlockKind::Timer);
    }

    #[test]
    fn insert_block_bumps_counter() {
        let mut d = Diagram::new();
        let mut src = Diagram::new();
        let id = src.add_block(BlockTemplate::plot()).unwrap();
        let mut block = src.find_block(id).unwrap().clone();
        block.id = BlockId::from_index(9);
        d.insert_block(block.clone()).unwrap();
        assert_eq!(d.next_id(), Some(BlockId::from_index(10)));
        assert_eq!(
            d.insert_block(block),
            Err(GraphError::DuplicateBlock(BlockId::from_index(9)))
        );
    }

    #[test]
    fn add_after_last_id_is_rejected() {
        let mut d = Diagram::new();
        let mut src = Diagram::new();
        let id = src.add_block(BlockTemplate::plot()).unwrap();
        let mut block = src.find_block(id).unwrap().clone();

        block.id = BlockId::from_index(BlockId::MAX_INDEX - 1);
        d.insert_block(block.clone()).unwrap();
        let last = d.add_block(BlockTemplate::plot()).unwrap();
        assert_eq!(last.index(), BlockId::MAX_INDEX);
        assert_eq!(d.next_id(), None);

        assert_eq!(
            d.add_block(BlockTemplate::plot()),
            Err(GraphError::IdsExhausted)
        );
        assert_eq!(d.len(), 2);

        // Lower ids can still be inserted once the counter is exhausted
        block.id = BlockId::from_index(4);
        d.insert_block(block).unwrap();
        assert_eq!(d.next_id(), None);
    }
}
