//! docshape: infer the structure of a document and its sub-collections.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docshape_cli::{export_report, print_details, print_summary};
use docshape_core::{AnalyzerConfig, DocumentStore};
use docshape_infer::StructureAnalyzer;
use docshape_store::{MemoryStore, SqliteStore};

#[derive(Parser)]
#[command(name = "docshape", about = "Document structure analyzer")]
struct Cli {
    /// Root document id. Read from stdin when omitted.
    document_id: Option<String>,

    /// Top-level collection holding the document
    #[arg(long, default_value = "vendor_store", env = "DOCSHAPE_COLLECTION")]
    collection: String,

    /// JSON snapshot file to read documents from
    #[arg(long, conflicts_with = "db", required_unless_present = "db")]
    snapshot: Option<PathBuf>,

    /// SQLite database to read documents from (opened read-only)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Export path (default: document_structure_<id>.json)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Documents sampled per top-level sub-collection
    #[arg(long)]
    max_docs: Option<usize>,

    /// Print field details for sub-collections whose name contains this text
    #[arg(long, value_name = "NAME")]
    detail: Option<String>,

    /// Print the full JSON report after the summary
    #[arg(long)]
    print_json: bool,

    /// Skip writing the JSON export
    #[arg(long)]
    no_export: bool,
}

fn open_store(cli: &Cli) -> anyhow::Result<Box<dyn DocumentStore>> {
    if let Some(path) = &cli.db {
        let store = SqliteStore::open_read_only(path)
            .map_err(|e| anyhow::anyhow!("Failed to open database: {}", e))?;
        info!("Reading documents from {}", store.db_path().display());
        return Ok(Box::new(store));
    }
    let path = cli
        .snapshot
        .as_ref()
        .context("either --snapshot or --db is required")?;
    let store = MemoryStore::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load snapshot {}: {}", path.display(), e))?;
    Ok(Box::new(store))
}

fn prompt_document_id() -> anyhow::Result<String> {
    print!("Enter the document ID to analyze: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AnalyzerConfig::from_env()?;
    if let Some(max_docs) = cli.max_docs {
        config.max_docs = max_docs;
    }
    config.validate()?;

    let document_id = match &cli.document_id {
        Some(id) => id.trim().to_string(),
        None => prompt_document_id()?,
    };
    if document_id.is_empty() {
        eprintln!("Please provide a valid document ID");
        std::process::exit(1);
    }

    let store = open_store(&cli)?;
    info!(collection = %cli.collection, document = %document_id, "Starting analysis");

    let analyzer = StructureAnalyzer::new(store.as_ref(), config);
    let report = analyzer.analyze_document(&cli.collection, &document_id);

    print_summary(&report);

    if !cli.no_export {
        if let Some(path) = export_report(&report, cli.output.as_deref()) {
            println!();
            println!("Complete structure analysis saved to: {}", path.display());
        }
    }

    if let Some(pattern) = &cli.detail {
        print_details(&report, pattern);
    }

    if cli.print_json {
        println!();
        println!("{}", "=".repeat(60));
        println!("JSON STRUCTURE PREVIEW:");
        println!("{}", "=".repeat(60));
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    std::process::exit(if report.is_error() { 1 } else { 0 });
}
