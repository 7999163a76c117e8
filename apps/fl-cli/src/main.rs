use clap::{Parser, Subcommand};
use fl_editor::{
    DisplayValue, Editor, EditorConfig, EditorEvent, EditorResult, Persistence, Projection,
};
use fl_eval::parse_batch;
use fl_program::{ProgramError, ProgramSpec};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "fl-cli")]
#[command(about = "flowlab CLI - dataflow program tools", long_about = None)]
struct Cli {
    /// Editor configuration file (YAML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a program file
    Validate {
        /// Path to the program file (.json, .yaml or .yml)
        program_path: PathBuf,
    },
    /// Print blocks, values and connections of a program
    Show {
        /// Path to the program file
        program_path: PathBuf,
    },
    /// Push recorded device data through a program
    Replay {
        /// Path to the program file
        program_path: PathBuf,
        /// Device data, one JSON array of {name, value} readings per line
        feed_path: PathBuf,
        /// Print one JSON object per batch
        #[arg(long)]
        json: bool,
        /// Write the program with its final values here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Convert a program between JSON and YAML
    Convert {
        /// Input program file
        input: PathBuf,
        /// Output program file; the format follows the extension
        output: PathBuf,
    },
}

/// Persistence for one-shot commands: nothing is written back.
struct Discard;

impl Persistence for Discard {
    fn begin_save(&mut self, spec: ProgramSpec) {
        tracing::debug!("Discarding save of {}", spec.name);
    }
}

fn main() -> EditorResult<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Validate { program_path } => cmd_validate(&program_path),
        Commands::Show { program_path } => cmd_show(&program_path, config),
        Commands::Replay {
            program_path,
            feed_path,
            json,
            output,
        } => cmd_replay(&program_path, &feed_path, json, output.as_deref(), config),
        Commands::Convert { input, output } => cmd_convert(&input, &output),
    }
}

fn load_config(path: Option<&Path>) -> EditorResult<EditorConfig> {
    let Some(path) = path else {
        return Ok(EditorConfig::default());
    };
    let content = std::fs::read_to_string(path).map_err(ProgramError::from)?;
    let config = serde_yaml::from_str(&content).map_err(ProgramError::from)?;
    Ok(config)
}

fn open(program_path: &Path, config: EditorConfig) -> EditorResult<Editor<Discard>> {
    let spec = fl_program::load(program_path)?;
    let mut editor = Editor::new(Discard, config);
    editor.handle(EditorEvent::Load {
        spec: Some(spec),
        displayed_name: String::new(),
    })?;
    Ok(editor)
}

fn cmd_validate(program_path: &Path) -> EditorResult<()> {
    println!("Validating program: {}", program_path.display());
    let spec = fl_program::load(program_path)?;
    fl_program::from_spec(&spec)?;
    println!(
        "✓ Program is valid ({} blocks, {} connections)",
        spec.blocks.len(),
        spec.connections().len()
    );
    Ok(())
}

fn display_text(value: &DisplayValue) -> String {
    match value {
        DisplayValue::Text(s) | DisplayValue::Entry(s) => s.clone(),
        DisplayValue::Image(Some(_)) => "[image]".to_string(),
        DisplayValue::Image(None) => "...".to_string(),
        DisplayValue::Plot(v) => v.map_or_else(|| "...".to_string(), |v| v.to_string()),
        DisplayValue::Blank => String::new(),
    }
}

fn block_label(projection: &Projection, id: fl_core::BlockId) -> String {
    projection
        .block(id)
        .map(|b| b.name.clone().unwrap_or_else(|| format!("{} {}", b.kind, b.id)))
        .unwrap_or_else(|| id.to_string())
}

fn cmd_show(program_path: &Path, config: EditorConfig) -> EditorResult<()> {
    let editor = open(program_path, config)?;
    let projection = editor.projection();

    println!(
        "Program {} ({})",
        projection.name,
        if projection.displayed_name.is_empty() {
            "untitled"
        } else {
            projection.displayed_name.as_str()
        }
    );
    if projection.blocks.is_empty() {
        println!("No blocks in program");
        return Ok(());
    }

    println!("Blocks:");
    for block in &projection.blocks {
        let units = block.units.as_deref().unwrap_or_default();
        println!(
            "  [{}] {:<24} {:<28} {} {}",
            block.id,
            block.kind,
            block.name.as_deref().unwrap_or("-"),
            display_text(&block.value),
            units
        );
        for param in &block.params {
            println!("      {} = {}", param.label, param.text);
        }
    }

    if !projection.connections.is_empty() {
        println!("Connections:");
        for c in &projection.connections {
            println!(
                "  {} out {} -> {} in {}",
                block_label(&projection, c.source.block),
                c.source.index,
                block_label(&projection, c.dest.block),
                c.dest.index
            );
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct BatchReport {
    batch: usize,
    values: BTreeMap<String, String>,
}

fn cmd_replay(
    program_path: &Path,
    feed_path: &Path,
    json: bool,
    output: Option<&Path>,
    config: EditorConfig,
) -> EditorResult<()> {
    let mut editor = open(program_path, config)?;
    let feed = std::fs::read_to_string(feed_path).map_err(ProgramError::from)?;

    let mut batches = 0;
    for line in feed.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let readings = parse_batch(line)?;
        editor.handle(EditorEvent::DeviceData(readings))?;
        batches += 1;

        let projection = editor.projection();
        let values: BTreeMap<String, String> = projection
            .blocks
            .iter()
            .filter(|b| !matches!(b.value, DisplayValue::Blank))
            .map(|b| (block_label(&projection, b.id), display_text(&b.value)))
            .collect();

        if json {
            let report = BatchReport {
                batch: batches,
                values,
            };
            println!(
                "{}",
                serde_json::to_string(&report).map_err(ProgramError::from)?
            );
        } else {
            let row = values
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("  ");
            println!("#{batches:<4} {row}");
        }
    }
    tracing::info!("Replayed {} batches", batches);

    if let Some(output) = output {
        fl_program::save(output, &editor.serialize())?;
        println!("✓ Wrote {}", output.display());
    }
    Ok(())
}

fn cmd_convert(input: &Path, output: &Path) -> EditorResult<()> {
    let spec = fl_program::load(input)?;
    fl_program::save(output, &spec)?;
    println!("✓ Converted {} -> {}", input.display(), output.display());
    Ok(())
}
