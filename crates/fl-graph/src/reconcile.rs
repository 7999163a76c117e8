//! Data storage pin reconciliation.
//!
//! A data storage block always has exactly one free input pin beyond the
//! connected ones, and one sequence label per connected source block. The
//! change needed to get there is computed as a pure `PinDelta` and then
//! applied.

use std::collections::{BTreeMap, BTreeSet};

use fl_core::BlockId;

use crate::block::{Block, Param, ParamValue, Pin};
use crate::diagram::Diagram;

/// Name of the label map parameter on data storage blocks.
pub const SEQUENCE_NAMES: &str = "sequence_names";

/// Changes that bring a data storage block back to its invariant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PinDelta {
    /// Free input pins to append.
    pub add_inputs: usize,
    /// Indices of free input pins to remove, ascending.
    pub remove_inputs: Vec<usize>,
    /// New labels keyed by source block id.
    pub add_labels: Vec<(String, String)>,
    /// Label keys whose source block is no longer connected.
    pub remove_labels: Vec<String>,
}

impl PinDelta {
    pub fn is_empty(&self) -> bool {
        self.add_inputs == 0
            && self.remove_inputs.is_empty()
            && self.add_labels.is_empty()
            && self.remove_labels.is_empty()
    }
}

/// Compute the delta for one data storage block.
///
/// `source_name` resolves a connected source block to its current name, which
/// seeds its label.
pub fn reconcile<F>(block: &Block, source_name: F) -> PinDelta
where
    F: Fn(BlockId) -> Option<String>,
{
    let mut delta = PinDelta::default();

    let connected = block.connected_inputs();
    let target = connected + 1;
    let current = block.inputs.len();
    if current < target {
        delta.add_inputs = target - current;
    } else if current > target {
        delta.remove_inputs = block
            .inputs
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_connected())
            .map(|(i, _)| i)
            .take(current - target)
            .collect();
    }

    let labels = block
        .param(SEQUENCE_NAMES)
        .and_then(|p| p.value.as_ref())
        .and_then(ParamValue::as_map)
        .cloned()
        .unwrap_or_default();

    // Source blocks in pin order, each once
    let mut sources: Vec<BlockId> = Vec::new();
    for pin in &block.inputs {
        if let Some(src) = pin.source {
            if !sources.contains(&src.block) {
                sources.push(src.block);
            }
        }
    }
    let source_keys: BTreeSet<String> = sources.iter().map(|id| id.to_string()).collect();

    delta.remove_labels = labels
        .keys()
        .filter(|k| !source_keys.contains(*k))
        .cloned()
        .collect();

    let mut taken: BTreeSet<String> = labels
        .iter()
        .filter(|(k, _)| source_keys.contains(*k))
        .map(|(_, v)| v.clone())
        .collect();
    for id in sources {
        let key = id.to_string();
        if labels.contains_key(&key) {
            continue;
        }
        let base = source_name(id).unwrap_or_else(|| key.clone());
        let label = unique_label(&base, &taken);
        taken.insert(label.clone());
        delta.add_labels.push((key, label));
    }

    delta
}

/// `base`, else `base1`, `base2`, ... until unused.
fn unique_label(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    (1..)
        .map(|n| format!("{base}{n}"))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

/// Apply a delta produced by `reconcile` for the same block.
pub fn apply_delta(block: &mut Block, delta: &PinDelta) {
    for &i in delta.remove_inputs.iter().rev() {
        if i < block.inputs.len() && !block.inputs[i].is_connected() {
            block.inputs.remove(i);
        }
    }
    let data_type = block.input_type().unwrap_or(crate::block::DataType::Numeric);
    for _ in 0..delta.add_inputs {
        block.inputs.push(Pin::input(data_type));
    }

    if delta.add_labels.is_empty() && delta.remove_labels.is_empty() {
        return;
    }
    if block.param(SEQUENCE_NAMES).is_none() {
        block.params.push(Param::new(SEQUENCE_NAMES));
    }
    if let Some(param) = block.param_mut(SEQUENCE_NAMES) {
        let mut labels: BTreeMap<String, String> = match param.value.take() {
            Some(ParamValue::Map(m)) => m,
            _ => BTreeMap::new(),
        };
        for key in &delta.remove_labels {
            labels.remove(key);
        }
        for (key, label) in &delta.add_labels {
            labels.insert(key.clone(), label.clone());
        }
        param.value = Some(ParamValue::Map(labels));
    }
}

impl Diagram {
    /// Reconcile every data storage block. Returns whether anything changed.
    pub fn reconcile_data_storage(&mut self) -> bool {
        let deltas: Vec<(usize, PinDelta)> = self
            .blocks()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.kind.is_data_storage())
            .map(|(i, b)| {
                let delta = reconcile(b, |id| self.find_block(id).map(|s| s.name.clone()));
                (i, delta)
            })
            .filter(|(_, d)| !d.is_empty())
            .collect();

        if deltas.is_empty() {
            return false;
        }
        for (i, delta) in &deltas {
            tracing::debug!("Reconciling data storage pins: {:?}", delta);
            apply_delta(&mut self.blocks_mut()[*i], delta);
        }
        self.rebuild_dependents();
        true
    }
}
