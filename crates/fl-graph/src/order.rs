//! Evaluation ordering and cycle detection.

use std::collections::{BTreeSet, HashSet};

use fl_core::BlockId;

use crate::diagram::Diagram;
use crate::error::{GraphError, GraphResult};

impl Diagram {
    /// Topological order of the blocks: every block appears after all blocks
    /// feeding its inputs. Ties are broken by diagram order.
    pub fn evaluation_order(&self) -> GraphResult<Vec<BlockId>> {
        let blocks = self.blocks();
        let mut in_degree = vec![0usize; blocks.len()];

        // Count connected inputs whose source block exists
        for (i, block) in blocks.iter().enumerate() {
            in_degree[i] = block
                .inputs
                .iter()
                .filter_map(|p| p.source)
                .filter(|src| self.position_of(src.block).is_some())
                .count();
        }

        // Kahn's algorithm, always taking the earliest ready block
        let mut ready: BTreeSet<usize> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, deg)| **deg == 0)
            .map(|(i, _)| i)
            .collect();

        let mut order = Vec::with_capacity(blocks.len());
        while let Some(pos) = ready.pop_first() {
            let id = blocks[pos].id;
            order.push(id);

            for dest in self.find_dest_pins(id) {
                if let Some(dest_pos) = self.position_of(dest.block) {
                    let deg = &mut in_degree[dest_pos];
                    *deg = deg.saturating_sub(1);
                    if *deg == 0 {
                        ready.insert(dest_pos);
                    }
                }
            }
        }

        if order.len() != blocks.len() {
            return Err(GraphError::Topology);
        }

        Ok(order)
    }

    /// Whether an edge from `source_block` into `dest_block` would close a
    /// cycle, i.e. `source_block` is already reachable downstream of
    /// `dest_block` (or they are the same block).
    pub fn would_create_cycle(&self, source_block: BlockId, dest_block: BlockId) -> bool {
        if source_block == dest_block {
            return true;
        }
        let mut seen = HashSet::new();
        let mut stack = vec![dest_block];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            for dest in self.find_dest_pins(id) {
                if dest.block == source_block {
                    return true;
                }
                stack.push(dest.block);
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use crate::block::{DeviceType, FilterKind, PinRef};
    use crate::catalog::BlockTemplate;
    use crate::diagram::Diagram;

    #[test]
    fn evaluation_order_simple() {
        let mut d = Diagram::new();
        // Added downstream-first so diagram order disagrees with data flow
        let plot = d.add_block(BlockTemplate::plot()).unwrap();
        let abs = d
            .add_block(BlockTemplate::filter(FilterKind::AbsoluteValue))
            .unwrap();
        let temp = d
            .add_block(BlockTemplate::device(DeviceType::new("temperature")))
            .unwrap();

        d.connect(PinRef::output(temp, 0), PinRef::input(abs, 0)).unwrap();
        d.connect(PinRef::output(abs, 0), PinRef::input(plot, 0)).unwrap();

        let order = d.evaluation_order().unwrap();
        assert_eq!(order, vec![temp, abs, plot]);
    }

    #[test]
    fn unconnected_blocks_keep_diagram_order() {
        let mut d = Diagram::new();
        let a = d.add_block(BlockTemplate::number_entry()).unwrap();
        let b = d.add_block(BlockTemplate::plot()).unwrap();
        let c = d.add_block(BlockTemplate::timer()).unwrap();
        assert_eq!(d.evaluation_order().unwrap(), vec![a, b, c]);
    }

    #[test]
    fn fan_out_counts_each_edge() {
        let mut d = Diagram::new();
        let n = d.add_block(BlockTemplate::number_entry()).unwrap();
        let plus = d.add_block(BlockTemplate::filter(FilterKind::Plus)).unwrap();
        d.connect(PinRef::output(n, 0), PinRef::input(plus, 0)).unwrap();
        d.connect(PinRef::output(n, 0), PinRef::input(plus, 1)).unwrap();
        assert_eq!(d.evaluation_order().unwrap(), vec![n, plus]);
    }

    #[test]
    fn downstream_reachability() {
        let mut d = Diagram::new();
        let a = d.add_block(BlockTemplate::filter(FilterKind::Not)).unwrap();
        let b = d.add_block(BlockTemplate::filter(FilterKind::Not)).unwrap();
        let c = d.add_block(BlockTemplate::filter(FilterKind::Not)).unwrap();
        d.connect(PinRef::output(a, 0), PinRef::input(b, 0)).unwrap();
        d.connect(PinRef::output(b, 0), PinRef::input(c, 0)).unwrap();
        assert!(d.would_create_cycle(c, a));
        assert!(!d.would_create_cycle(a, c));
    }
}
