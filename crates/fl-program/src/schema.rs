//! Program file schema definitions.

use fl_core::BlockId;
use fl_graph::{DataType, Param, Value};
use serde::{Deserialize, Serialize};

/// Plain-data form of a diagram, used for persistence and undo history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProgramSpec {
    pub name: String,
    #[serde(rename = "displayedName", default)]
    pub displayed_name: String,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub blocks: Vec<BlockSpec>,
}

impl ProgramSpec {
    /// An empty program.
    pub fn empty(name: impl Into<String>, displayed_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            displayed_name: displayed_name.into(),
            archived: false,
            blocks: Vec::new(),
        }
    }

    pub fn block(&self, id: BlockId) -> Option<&BlockSpec> {
        self.blocks.iter().find(|b| b.id == id)
    }

    /// Every connection as `(source block, output index, dest block, input index)`.
    pub fn connections(&self) -> Vec<(BlockId, usize, BlockId, usize)> {
        self.blocks
            .iter()
            .flat_map(|b| {
                b.sources.iter().enumerate().filter_map(move |(i, s)| {
                    s.as_ref().map(|s| (s.block_id, s.pin_index, b.id, i))
                })
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BlockSpec {
    pub id: BlockId,
    pub name: String,
    #[serde(rename = "type")]
    pub block_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<String>,
    #[serde(default)]
    pub has_seq: bool,
    #[serde(default)]
    pub input_type: Option<DataType>,
    #[serde(default)]
    pub input_count: usize,
    #[serde(default)]
    pub output_type: Option<DataType>,
    #[serde(default)]
    pub output_count: usize,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Param>,
    /// One entry per input pin: the upstream output, or `null` if unconnected.
    #[serde(default)]
    pub sources: Vec<Option<SourceSpec>>,
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

/// Upstream end of a connection: source block and its output pin index.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceSpec {
    pub block_id: BlockId,
    pub pin_index: usize,
}
