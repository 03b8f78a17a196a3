//! Metagraph CLI
//!
//! - `build`: data dictionaries or literal definitions -> `MetadataGraph` JSON
//! - `docs`: grounding context -> per-table governance documentation via Ollama
//! - `annotate-owl`: add `rdfs:comment`s to the classes of an RDF/XML ontology

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use tracing::{info, warn};

use metagraph_core::{
    build_graph_from_definitions_with, build_graph_with, BuildOptions, EdgeDedup, MetadataGraph,
    RelationshipStrategy,
};
use metagraph_llm_sync::{
    grounding_from_graph, run_documentation_batch, GroundingItem, LlmConfig, OllamaGenerator,
    TextualLookup,
};

mod logging;

#[derive(Parser)]
#[command(name = "metagraph")]
#[command(
    author,
    version,
    about = "Metagraph: canonical metadata graphs for ontology work"
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `METAGRAPH_LOG` wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an ontology-ready metadata graph.
    Build(BuildArgs),
    /// Generate governance documentation for each grounded table.
    Docs(DocsArgs),
    /// Add generated `rdfs:comment`s to OWL classes that have none.
    AnnotateOwl {
        /// Input RDF/XML ontology
        input: PathBuf,
        /// Output RDF/XML ontology
        #[arg(short, long)]
        out: PathBuf,
    },
}

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("source")
        .required(true)
        .args(["definitions", "dictionaries"])
))]
struct BuildArgs {
    /// JSON array of `{table_name, columns: [{name, type}]}`
    #[arg(long)]
    definitions: Option<PathBuf>,
    /// Directory searched recursively for data-dictionary CSV exports
    #[arg(long)]
    dictionaries: Option<PathBuf>,
    #[arg(long, value_enum, default_value_t = StrategyArg::Heuristic)]
    strategy: StrategyArg,
    #[arg(long, value_enum, default_value_t = DedupArg::Keep)]
    dedup: DedupArg,
    /// Output metadata JSON
    #[arg(short, long, default_value = "ontology_ready_metadata.json")]
    out: PathBuf,
}

#[derive(Args)]
#[command(group(
    clap::ArgGroup::new("context")
        .required(true)
        .args(["grounding", "graph"])
))]
struct DocsArgs {
    /// Retrieval grounding JSON (array of per-table items)
    #[arg(long)]
    grounding: Option<PathBuf>,
    /// Metadata graph JSON written by `metagraph build`
    #[arg(long)]
    graph: Option<PathBuf>,
    /// Generated textual definitions JSON (array of rows keyed by table)
    #[arg(long)]
    textual: Option<PathBuf>,
    /// Output documentation JSON
    #[arg(short, long, default_value = "ontology_outputs.json")]
    out: PathBuf,
    /// Model name (default: `METAGRAPH_LLM_MODEL` or llama3.2)
    #[arg(long)]
    model: Option<String>,
    /// Ollama base URL (default: `METAGRAPH_OLLAMA_HOST`/`OLLAMA_HOST` or http://127.0.0.1:11434)
    #[arg(long)]
    host: Option<String>,
    /// Extra attempts after a failed model call
    #[arg(long)]
    retries: Option<u32>,
    #[arg(long)]
    retry_delay_ms: Option<u64>,
    /// Per-request timeout in seconds; 0 disables
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Stop at the first table that fails
    #[arg(long)]
    fail_fast: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum StrategyArg {
    /// Shared `*_id` column names
    Heuristic,
    /// Built-in business relationships
    Curated,
}

impl From<StrategyArg> for RelationshipStrategy {
    fn from(value: StrategyArg) -> Self {
        match value {
            StrategyArg::Heuristic => RelationshipStrategy::Heuristic,
            StrategyArg::Curated => RelationshipStrategy::curated(),
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum DedupArg {
    Keep,
    Exact,
    Unordered,
}

impl From<DedupArg> for EdgeDedup {
    fn from(value: DedupArg) -> Self {
        match value {
            DedupArg::Keep => EdgeDedup::Keep,
            DedupArg::Exact => EdgeDedup::Exact,
            DedupArg::Unordered => EdgeDedup::Unordered,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Build(args) => cmd_build(&args),
        Commands::Docs(args) => cmd_docs(&args),
        Commands::AnnotateOwl { input, out } => cmd_annotate_owl(&input, &out),
    }
}

fn cmd_build(args: &BuildArgs) -> Result<()> {
    let options = BuildOptions {
        strategy: args.strategy.into(),
        dedup: args.dedup.into(),
    };

    let graph = match (&args.definitions, &args.dictionaries) {
        (Some(path), _) => {
            println!("{} definitions {}", "Building".green().bold(), path.display());
            let definitions = metagraph_ingest_dict::read_definitions(path)?;
            build_graph_from_definitions_with(&definitions, &options)
        }
        (None, Some(dir)) => {
            println!("{} dictionaries {}", "Building".green().bold(), dir.display());
            let rows = metagraph_ingest_dict::load_dictionaries(dir)?;
            build_graph_with(&rows, &options)
        }
        (None, None) => bail!("one of --definitions or --dictionaries is required"),
    };

    let json = graph.to_json_pretty()?;
    fs::write(&args.out, json).with_context(|| format!("failed to write {}", args.out.display()))?;

    info!(
        tables = graph.tables().len(),
        relationships = graph.relationships().len(),
        out = %args.out.display(),
        "metadata graph written"
    );
    println!("  {} {} tables", "→".yellow(), graph.tables().len());
    println!("  {} {} relationships", "→".yellow(), graph.relationships().len());
    println!("{} {}", "wrote".green().bold(), args.out.display().to_string().bold());
    Ok(())
}

fn cmd_docs(args: &DocsArgs) -> Result<()> {
    let items = load_grounding(args)?;
    let textual = match &args.textual {
        Some(path) => TextualLookup::from_rows(read_json_rows(path)?),
        None => TextualLookup::default(),
    };

    let mut config = LlmConfig::from_env()?;
    if let Some(host) = &args.host {
        config.host = metagraph_llm_sync::config::normalize_host(host);
    }
    if let Some(model) = &args.model {
        config.model = model.clone();
    }
    if let Some(secs) = args.timeout_secs {
        config.timeout = metagraph_llm_sync::config::timeout_from_secs(secs);
    }
    if let Some(retries) = args.retries {
        config.retry.retries = retries;
    }
    if let Some(ms) = args.retry_delay_ms {
        config.retry.delay = Duration::from_millis(ms);
    }

    println!(
        "{} {} tables with {} at {}",
        "Documenting".green().bold(),
        items.len(),
        config.model.cyan(),
        config.host
    );
    let generator = OllamaGenerator::new(&config)?;
    let report = run_documentation_batch(&generator, &config.retry, &items, &textual, args.fail_fast);

    info!(
        documented = report.results.len(),
        failed = report.failures.len(),
        "documentation batch finished"
    );
    let json = serde_json::to_string_pretty(&report.results)?;
    fs::write(&args.out, json).with_context(|| format!("failed to write {}", args.out.display()))?;

    println!("  {} {} documented", "→".yellow(), report.results.len());
    for failure in &report.failures {
        warn!(table = %failure.table, "documentation failed");
        eprintln!("  {} {}: {}", "failed".red().bold(), failure.table, failure.error);
    }
    println!("{} {}", "wrote".green().bold(), args.out.display().to_string().bold());

    if !report.is_success() {
        return Err(anyhow!("{} table(s) failed", report.failures.len()));
    }
    Ok(())
}

fn load_grounding(args: &DocsArgs) -> Result<Vec<GroundingItem>> {
    if let Some(path) = &args.graph {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let graph = MetadataGraph::from_json(&text)
            .with_context(|| format!("invalid metadata graph in {}", path.display()))?;
        return Ok(grounding_from_graph(&graph));
    }

    let path = args
        .grounding
        .as_ref()
        .ok_or_else(|| anyhow!("one of --grounding or --graph is required"))?;
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid grounding JSON in {}", path.display()))
}

fn read_json_rows(path: &Path) -> Result<Vec<Value>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    match serde_json::from_str(&text).with_context(|| format!("invalid JSON in {}", path.display()))? {
        Value::Array(rows) => Ok(rows),
        _ => bail!("{} must hold a JSON array", path.display()),
    }
}

fn cmd_annotate_owl(input: &Path, out: &Path) -> Result<()> {
    println!("{} {}", "Annotating".green().bold(), input.display());
    let stats = metagraph_owl::annotate_file(input, out)?;

    println!("  {} {} rdf:Description blocks", "→".yellow(), stats.descriptions);
    println!("  {} {} classes", "→".yellow(), stats.classes);
    println!("  {} {} comments added", "→".yellow(), stats.added);
    println!("  {} {} skipped (already had comment)", "→".yellow(), stats.skipped_existing);
    println!("  {} {} skipped (no rdf:about/ID)", "→".yellow(), stats.skipped_no_id);
    println!("{} {}", "wrote".green().bold(), out.display().to_string().bold());
    Ok(())
}
