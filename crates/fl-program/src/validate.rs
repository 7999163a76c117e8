//! Program validation logic.

use std::collections::{HashMap, HashSet};

use fl_core::BlockId;
use fl_graph::BlockKind;

use crate::schema::{BlockSpec, ProgramSpec};

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Only one data storage block allowed per program")]
    DataStorageLimit,

    #[error("Connections form a cycle through block {id}")]
    Cycle { id: String },
}

pub fn validate_program(program: &ProgramSpec) -> Result<(), ValidationError> {
    let mut ids = HashSet::new();
    for block in &program.blocks {
        if !ids.insert(block.id) {
            return Err(ValidationError::DuplicateId {
                id: block.id.to_string(),
                context: "blocks".to_string(),
            });
        }
    }

    let storage = program
        .blocks
        .iter()
        .filter(|b| BlockKind::from_type_name(&b.block_type).is_data_storage())
        .count();
    if storage > 1 {
        return Err(ValidationError::DataStorageLimit);
    }

    let by_id: HashMap<BlockId, &BlockSpec> = program.blocks.iter().map(|b| (b.id, b)).collect();
    for block in &program.blocks {
        validate_block(block, &by_id)?;
    }

    validate_acyclic(program)
}

fn invalid(field: &str, value: impl ToString, reason: &str) -> ValidationError {
    ValidationError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_block(
    block: &BlockSpec,
    by_id: &HashMap<BlockId, &BlockSpec>,
) -> Result<(), ValidationError> {
    if block.input_count > 0 && block.input_type.is_none() {
        return Err(invalid(
            "input_type",
            &block.id,
            "block with inputs needs an input type",
        ));
    }
    if block.output_count > 0 && block.output_type.is_none() {
        return Err(invalid(
            "output_type",
            &block.id,
            "block with outputs needs an output type",
        ));
    }
    if block.input_count == 0 && block.input_type.is_some() {
        return Err(invalid(
            "input_type",
            &block.id,
            "block without inputs cannot declare an input type",
        ));
    }
    if block.output_count == 0 && block.output_type.is_some() {
        return Err(invalid(
            "output_type",
            &block.id,
            "block without outputs cannot declare an output type",
        ));
    }
    if block.sources.len() != block.input_count {
        return Err(invalid(
            "sources",
            block.sources.len(),
            "must have one entry per input pin",
        ));
    }
    if !block.x.is_finite() || !block.y.is_finite() {
        return Err(invalid("position", &block.id, "coordinates must be finite"));
    }

    for source in block.sources.iter().flatten() {
        let upstream = by_id
            .get(&source.block_id)
            .ok_or_else(|| ValidationError::MissingReference {
                id: source.block_id.to_string(),
                context: format!("sources of block {}", block.id),
            })?;
        if source.pin_index >= upstream.output_count {
            return Err(invalid(
                "pin_index",
                source.pin_index,
                "source block has no such output",
            ));
        }
        if upstream.output_type != block.input_type {
            return Err(invalid(
                "sources",
                source.block_id,
                "source output type does not match input type",
            ));
        }
    }

    Ok(())
}

fn validate_acyclic(program: &ProgramSpec) -> Result<(), ValidationError> {
    let mut in_degree: HashMap<BlockId, usize> = program.blocks.iter().map(|b| (b.id, 0)).collect();
    let mut adj: HashMap<BlockId, Vec<BlockId>> = HashMap::new();
    for (src, _, dest, _) in program.connections() {
        adj.entry(src).or_default().push(dest);
        if let Some(deg) = in_degree.get_mut(&dest) {
            *deg += 1;
        }
    }

    let mut queue: Vec<BlockId> = in_degree
        .iter()
        .filter(|(_, deg)| **deg == 0)
        .map(|(id, _)| *id)
        .collect();
    let mut visited = 0;
    while let Some(id) = queue.pop() {
        visited += 1;
        for next in adj.get(&id).into_iter().flatten() {
            if let Some(deg) = in_degree.get_mut(next) {
                *deg -= 1;
                if *deg == 0 {
                    queue.push(*next);
                }
            }
        }
    }

    if visited != program.blocks.len() {
        let stuck = in_degree
            .iter()
            .filter(|(_, deg)| **deg > 0)
            .map(|(id, _)| *id)
            .min();
        return Err(ValidationError::Cycle {
            id: stuck.map(|id| id.to_string()).unwrap_or_default(),
        });
    }
    Ok(())
}
