//! Diagram evaluation.

use std::collections::HashMap;

use fl_core::{BlockId, Tolerances};
use fl_graph::{BlockKind, Diagram, FilterKind, Value};

use crate::average::{MovingAverage, MovingAverageState};
use crate::error::EvalResult;
use crate::feed::DeviceReading;
use crate::filter;

/// Recomputes derived block values.
///
/// Leaves (device, timer and number entry blocks) keep the values pushed into
/// them. Every other block pulls its inputs through their sources, in
/// evaluation order. A missing or unknown input yields an unknown output.
///
/// The evaluator only writes `value` fields; it never changes the diagram's
/// structure, so it is always safe to re-run.
#[derive(Debug, Clone, Default)]
pub struct Evaluator {
    averages: HashMap<BlockId, MovingAverageState>,
    tolerances: Tolerances,
}

impl Evaluator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all moving-average history, e.g. when a new program is loaded.
    pub fn reset(&mut self) {
        self.averages.clear();
    }

    /// Recompute every derived value without advancing moving averages.
    pub fn recompute(&mut self, diagram: &mut Diagram) -> EvalResult<()> {
        self.pass(diagram, false)
    }

    /// Apply one device data batch, then recompute.
    ///
    /// Device and timer blocks are matched by name. Device blocks absent from
    /// the batch become unknown; timers keep their previous value. Moving
    /// averages advance by one sample.
    pub fn apply_device_data(
        &mut self,
        diagram: &mut Diagram,
        readings: &[DeviceReading],
    ) -> EvalResult<()> {
        let by_name: HashMap<&str, &Option<Value>> = readings
            .iter()
            .map(|r| (r.name.as_str(), &r.value))
            .collect();

        let ids: Vec<BlockId> = diagram.blocks().iter().map(|b| b.id).collect();
        for id in ids {
            let Some(block) = diagram.find_block_mut(id) else {
                continue;
            };
            if !block.kind.is_named_source() {
                continue;
            }
            match by_name.get(block.name.as_str()) {
                Some(value) => block.value = (*value).clone(),
                None if matches!(block.kind, BlockKind::Device(_)) => block.value = None,
                None => {}
            }
        }
        tracing::debug!("Applied {} device readings", readings.len());

        self.pass(diagram, true)
    }

    fn pass(&mut self, diagram: &mut Diagram, commit: bool) -> EvalResult<()> {
        let order = diagram.evaluation_order()?;
        self.averages
            .retain(|id, _| diagram.find_block(*id).is_some());

        for id in order {
            let Some(block) = diagram.find_block(id) else {
                continue;
            };
            if block.kind.is_leaf() {
                continue;
            }

            let inputs: Vec<Option<Value>> = block
                .inputs
                .iter()
                .map(|pin| {
                    pin.source
                        .and_then(|src| diagram.find_block(src.block))
                        .and_then(|src| src.value.clone())
                })
                .collect();

            let value = match &block.kind {
                BlockKind::Filter(
                    kind @ (FilterKind::SimpleMovingAverage | FilterKind::ExponentialMovingAverage),
                ) => {
                    let period = block.param("period").and_then(|p| p.effective_number());
                    let x = inputs.first().cloned().flatten().and_then(|v| v.as_number());
                    match (MovingAverage::for_filter(*kind, period), x) {
                        (Some(ma), Some(x)) => {
                            let state = self.averages.entry(id).or_default();
                            Some(Value::Number(ma.update(state, x, commit)))
                        }
                        _ => None,
                    }
                }
                BlockKind::Filter(kind) => filter::evaluate(*kind, &inputs, self.tolerances),
                BlockKind::Plot | BlockKind::Relay => inputs.into_iter().next().flatten(),
                _ => None,
            };

            diagram.set_value(id, value)?;
        }

        Ok(())
    }
}
