//! dtview - Main entry point
//!
//! Prints the hardware overview of one or more devicetree graph snapshots.

mod config;
mod render;

use anyhow::{bail, Context, Result};
use clap::Parser;
use dtview_core::{load_graph, BoardDatabase, BoardLookup};
use dtview_overview::{GraphSource, OverviewContext, OverviewProvider};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use config::{Config, ContextConfig, OutputFormat};

#[derive(Parser, Debug)]
#[command(name = "dtview")]
#[command(about = "Devicetree hardware overview")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "dtview.toml")]
    config: PathBuf,

    /// Graph snapshot to show, in addition to configured contexts
    #[arg(short, long)]
    graph: Option<PathBuf>,

    /// Board identifier for --graph
    #[arg(short, long)]
    board: Option<String>,

    /// Output format, overrides the configuration
    #[arg(short, long, value_enum)]
    format: Option<OutputFormat>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Write a default configuration file and exit
    #[arg(long)]
    init_config: bool,
}

fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Configured contexts plus the ad-hoc one from `--graph`
fn contexts(config: &Config, graph: Option<&Path>, board: Option<&str>) -> Vec<ContextConfig> {
    let mut contexts = config.contexts.clone();
    if let Some(graph) = graph {
        let name = graph
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "graph".to_string());
        contexts.push(ContextConfig {
            name,
            graph: graph.to_path_buf(),
            board: board.map(|b| b.to_string()),
        });
    }
    contexts
}

fn board_database(path: &Path) -> BoardDatabase {
    if !path.exists() {
        info!(path = %path.display(), "Board index not found, board metadata disabled");
        return BoardDatabase::empty();
    }
    match BoardDatabase::from_file(path) {
        Ok(db) => {
            info!(path = %path.display(), boards = db.index().board.len(), "Loaded board index");
            db
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to load board index");
            BoardDatabase::empty()
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(parse_level(&args.log_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    if args.init_config {
        config::save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    info!("dtview v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_config(&args.config)?;
    let contexts = contexts(&config, args.graph.as_deref(), args.board.as_deref());
    if contexts.is_empty() {
        bail!(
            "No graph snapshots to show: pass --graph or add a [[context]] to {}",
            args.config.display()
        );
    }

    let boards: Arc<dyn BoardLookup> = Arc::new(board_database(&config.boards.path));

    let mut overview_contexts = Vec::with_capacity(contexts.len());
    for context in contexts {
        let graph = load_graph(&context.graph)
            .with_context(|| format!("Failed to load graph for context '{}'", context.name))?;
        let source: Arc<dyn GraphSource> = Arc::new(Arc::new(graph));
        overview_contexts.push(OverviewContext::new(
            context.name,
            context.board,
            source,
            Arc::clone(&boards),
        ));
    }

    let provider = OverviewProvider::new(overview_contexts)
        .with_timeout(Duration::from_secs(config.output.timeout_secs));

    match args.format.unwrap_or(config.output.format) {
        OutputFormat::Text => print!("{}", render::render_text(&provider, config.output.show_tooltips)),
        OutputFormat::Json => println!("{}", render::render_json(&provider)?),
    }

    Ok(())
}
