//! Conversion between a live `Diagram` and its `ProgramSpec`.

use fl_graph::{Block, BlockKind, Diagram, Pin, PinRef, Point};

use crate::schema::{BlockSpec, ProgramSpec, SourceSpec};
use crate::validate::validate_program;
use crate::ProgramResult;

/// Program-level metadata that lives outside the diagram.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgramInfo {
    pub name: String,
    pub displayed_name: String,
    pub archived: bool,
}

impl ProgramInfo {
    pub fn from_spec(spec: &ProgramSpec) -> Self {
        Self {
            name: spec.name.clone(),
            displayed_name: spec.displayed_name.clone(),
            archived: spec.archived,
        }
    }
}

/// Snapshot a diagram as a program.
pub fn to_spec(diagram: &Diagram, info: &ProgramInfo) -> ProgramSpec {
    ProgramSpec {
        name: info.name.clone(),
        displayed_name: info.displayed_name.clone(),
        archived: info.archived,
        blocks: diagram.blocks().iter().map(block_to_spec).collect(),
    }
}

/// Rebuild a diagram from a program. The program is validated first.
pub fn from_spec(spec: &ProgramSpec) -> ProgramResult<(Diagram, ProgramInfo)> {
    validate_program(spec)?;
    let mut diagram = Diagram::new();
    for block in &spec.blocks {
        diagram.insert_block(block_from_spec(block))?;
    }
    Ok((diagram, ProgramInfo::from_spec(spec)))
}

pub fn block_to_spec(block: &Block) -> BlockSpec {
    BlockSpec {
        id: block.id,
        name: block.name.clone(),
        block_type: block.kind.type_name().to_string(),
        units: block.units.clone(),
        has_seq: block.has_seq,
        input_type: block.input_type(),
        input_count: block.inputs.len(),
        output_type: block.output_type(),
        output_count: block.outputs.len(),
        value: block.value.clone(),
        params: block.params.clone(),
        sources: block
            .inputs
            .iter()
            .map(|p| {
                p.source.map(|s| SourceSpec {
                    block_id: s.block,
                    pin_index: s.index,
                })
            })
            .collect(),
        x: block.position.x,
        y: block.position.y,
    }
}

/// Build a block from its spec. Assumes the spec passed validation.
pub fn block_from_spec(spec: &BlockSpec) -> Block {
    let inputs = match spec.input_type {
        Some(t) => (0..spec.input_count)
            .map(|i| Pin {
                source: spec
                    .sources
                    .get(i)
                    .copied()
                    .flatten()
                    .map(|s| PinRef::output(s.block_id, s.pin_index)),
                ..Pin::input(t)
            })
            .collect(),
        None => Vec::new(),
    };
    let outputs = match spec.output_type {
        Some(t) => (0..spec.output_count).map(|_| Pin::output(t)).collect(),
        None => Vec::new(),
    };

    Block {
        id: spec.id,
        kind: BlockKind::from_type_name(&spec.block_type),
        name: spec.name.clone(),
        units: spec.units.clone(),
        has_seq: spec.has_seq,
        value: spec.value.clone(),
        params: spec.params.clone(),
        inputs,
        outputs,
        position: Point::new(spec.x, spec.y),
    }
}
