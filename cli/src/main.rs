use std::fs;
use std::path::{Path, PathBuf};

use canvas::config::{EngineConfig, HISTORY_LIMIT_ENV, STORAGE_PATH_ENV};
use canvas::doc::Document;
use canvas::editor::Editor;
use canvas::engine::EngineCore;
use canvas::persist::{ImportError, export_document, import_document};
use canvas::selection::Selection;
use clap::{Args, Parser, Subcommand};
use serde_json::{Value, json};
use tracing::{debug, info};


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: std::io::Error },
    #[error("import rejected: {0}")]
    Import(#[from] ImportError),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("no state file; pass --storage-path or set MINDBOARD_STORAGE_PATH")]
    MissingStoragePath,
}

#[derive(Parser, Debug)]
#[command(name = "mindboard", about = "Inspect and normalize mindboard documents")]
struct Cli {
    #[arg(long, global = true, env = HISTORY_LIMIT_ENV, help = "Undo depth; 0 keeps every snapshot")]
    history_limit: Option<usize>,

    #[arg(long, global = true, env = STORAGE_PATH_ENV, help = "File holding the persisted editor state")]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.history_limit, self.storage_path.clone())
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a document and report what survived.
    Check { file: PathBuf },
    /// Import then re-export a document in normalized form.
    Normalize {
        file: PathBuf,
        #[arg(long, help = "Output file path; stdout when omitted")]
        out: Option<PathBuf>,
    },
    /// Print the node forest.
    Tree { file: PathBuf },
    /// Print the camera that frames every node.
    Fit {
        file: PathBuf,
        #[arg(long, env = "MINDBOARD_VIEWPORT_WIDTH", default_value_t = 1280.0)]
        width: f64,
        #[arg(long, env = "MINDBOARD_VIEWPORT_HEIGHT", default_value_t = 800.0)]
        height: f64,
    },
    /// Work with the persisted editor state.
    State(StateCommand),
}

#[derive(Args, Debug)]
struct StateCommand {
    #[command(subcommand)]
    command: StateSubcommand,
}

#[derive(Subcommand, Debug)]
enum StateSubcommand {
    /// Summarize the stored document and selection.
    Show,
    /// Replace the stored document with an imported file.
    Load { file: PathBuf },
    /// Reset the stored document to a single root node.
    Reset,
}

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    let config = cli.engine_config();
    debug!(history_limit = ?config.history_limit, storage_path = ?config.storage_path, "config loaded");

    match cli.command {
        Command::Check { file } => {
            let doc = load(&file)?;
            print_json(&summary(&doc))
        }
        Command::Normalize { file, out } => {
            let doc = load(&file)?;
            let rendered = export_document(&doc)?;
            match out {
                Some(path) => {
                    fs::write(&path, rendered).map_err(|source| CliError::Write { path: path.clone(), source })?;
                    info!(path = %path.display(), "normalized document written");
                    Ok(())
                }
                None => {
                    println!("{rendered}");
                    Ok(())
                }
            }
        }
        Command::Tree { file } => {
            let doc = load(&file)?;
            print!("{}", render_tree(&doc));
            Ok(())
        }
        Command::Fit { file, width, height } => {
            let doc = load(&file)?;
            print_json(&fit_view(doc, width, height))
        }
        Command::State(state) => print_json(&run_state(&config, state.command)?),
    }
}

/// Apply a state subcommand through the persisted editor and summarize the
/// result. Every change is written back by the editor itself.
fn run_state(config: &EngineConfig, command: StateSubcommand) -> Result<Value, CliError> {
    let Some(path) = config.storage_path.as_deref() else {
        return Err(CliError::MissingStoragePath);
    };
    let mut editor = Editor::from_config(config);
    match command {
        StateSubcommand::Show => {}
        StateSubcommand::Load { file } => {
            let raw = fs::read_to_string(&file).map_err(|source| CliError::Read { path: file.clone(), source })?;
            editor.import_json(&raw)?;
            info!(path = %path.display(), "state replaced");
        }
        StateSubcommand::Reset => {
            editor.reset_document();
            info!(path = %path.display(), "state reset");
        }
    }
    Ok(state_summary(editor.document(), editor.selection()))
}

fn load(path: &Path) -> Result<Document, CliError> {
    let raw = fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_path_buf(), source })?;
    let doc = import_document(&raw)?;
    debug!(path = %path.display(), entities = doc.entity_count(), "document loaded");
    Ok(doc)
}

fn summary(doc: &Document) -> Value {
    json!({
        "nodes": doc.nodes.len(),
        "roots": doc.nodes.iter().filter(|n| n.parent_id.is_none()).count(),
        "annotations": doc.annotations.len(),
        "shapes": doc.shapes.len(),
    })
}

fn state_summary(doc: &Document, selection: &Selection) -> Value {
    let mut value = summary(doc);
    value["selection"] = match selection {
        Selection::None => Value::Null,
        Selection::Nodes(ids) => json!({"nodes": ids}),
        Selection::Annotation(id) => json!({"annotation": id}),
        Selection::Shape(id) => json!({"shape": id}),
    };
    value
}

/// One line per node, children indented under their parent in document order.
fn render_tree(doc: &Document) -> String {
    let index = doc.children_index();
    let mut out = String::new();
    let mut stack: Vec<(&str, usize)> =
        doc.nodes.iter().rev().filter(|n| n.parent_id.is_none()).map(|n| (n.id.as_str(), 0)).collect();

    while let Some((id, depth)) = stack.pop() {
        let Some(node) = doc.node(id) else {
            continue;
        };
        let label = if node.text.trim().is_empty() { "(untitled)" } else { node.text.as_str() };
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("- {label} [{id}]\n"));
        if let Some(children) = index.get(id) {
            stack.extend(children.iter().rev().map(|child| (*child, depth + 1)));
        }
    }
    out
}

fn fit_view(doc: Document, width: f64, height: f64) -> Value {
    let mut core = EngineCore::with_editor(Editor::with_document(doc));
    core.set_viewport(width, height);
    core.fit_to_content();
    let camera = core.camera();
    json!({
        "scale": camera.scale,
        "offsetX": camera.offset_x,
        "offsetY": camera.offset_y,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
