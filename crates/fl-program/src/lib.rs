//! fl-program: program file format, conversion and validation.

pub mod convert;
pub mod schema;
pub mod validate;

pub use convert::{ProgramInfo, block_from_spec, block_to_spec, from_spec, to_spec};
pub use schema::*;
pub use validate::{ValidationError, validate_program};

use std::path::Path;

pub type ProgramResult<T> = Result<T, ProgramError>;

#[derive(thiserror::Error, Debug)]
pub enum ProgramError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Graph error: {0}")]
    Graph(#[from] fl_graph::GraphError),

    #[error("Unsupported file extension: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn load_yaml(path: &Path) -> ProgramResult<ProgramSpec> {
    let content = std::fs::read_to_string(path)?;
    let program: ProgramSpec = serde_yaml::from_str(&content)?;
    validate_program(&program)?;
    Ok(program)
}

pub fn save_yaml(path: &Path, program: &ProgramSpec) -> ProgramResult<()> {
    validate_program(program)?;
    let content = serde_yaml::to_string(program)?;
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_json(path: &Path) -> ProgramResult<ProgramSpec> {
    let content = std::fs::read_to_string(path)?;
    let program: ProgramSpec = serde_json::from_str(&content)?;
    validate_program(&program)?;
    Ok(program)
}

pub fn save_json(path: &Path, program: &ProgramSpec) -> ProgramResult<()> {
    validate_program(program)?;
    let content = serde_json::to_string_pretty(program)?;
    std::fs::write(path, content)?;
    Ok(())
}

fn extension(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase()
}

/// Load a program, picking the format from the file extension.
pub fn load(path: &Path) -> ProgramResult<ProgramSpec> {
    match extension(path).as_str() {
        "json" => load_json(path),
        "yaml" | "yml" => load_yaml(path),
        other => Err(ProgramError::UnsupportedFormat(other.to_string())),
    }
}

/// Save a program, picking the format from the file extension.
pub fn save(path: &Path, program: &ProgramSpec) -> ProgramResult<()> {
    match extension(path).as_str() {
        "json" => save_json(path, program),
        "yaml" | "yml" => save_yaml(path, program),
        other => Err(ProgramError::UnsupportedFormat(other.to_string())),
    }
}
