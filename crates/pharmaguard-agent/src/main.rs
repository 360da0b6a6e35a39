//! pharmaguard — command-line entry point.
//!
//!   pharmaguard analyze --vcf sample.vcf --drugs codeine,plavix [--pretty]
//!   pharmaguard drugs

mod config;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use pharmaguard_common::PharmaGuardError;
use pharmaguard_engine::{normalize_drug_list, Analyzer};
use pharmaguard_kb::KnowledgeBase;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pharmaguard", version)]
#[command(about = "Pharmacogenomic risk assessment from VCF files", long_about = None)]
struct Cli {
    /// Config file (overrides PHARMAGUARD_CONFIG and ./pharmaguard.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a VCF file against one or more drugs
    Analyze {
        /// Path to the VCF file
        #[arg(long)]
        vcf: PathBuf,

        /// Comma-separated drug names or aliases (e.g. "codeine,plavix")
        #[arg(long)]
        drugs: String,

        /// Indent the JSON report
        #[arg(long)]
        pretty: bool,
    },

    /// List supported drugs with their gene and aliases
    Drugs {
        #[arg(long)]
        pretty: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = config::Config::load(cli.config.as_deref())?;

    // Logs go to stderr; stdout carries the JSON report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("PharmaGuard {}", env!("CARGO_PKG_VERSION"));

    let kb = Arc::new(config.load_knowledge_base().context("loading knowledge base")?);

    match cli.command {
        Commands::Analyze { vcf, drugs, pretty } => {
            let analyzer = Analyzer::new(kb).with_options(config.analysis_options());
            let text = read_vcf(&vcf, config.analysis.max_file_bytes)?;
            let drugs = normalize_drug_list(&drugs);
            let report = analyzer.analyze(&text, &drugs).await?;
            print_json(&report, pretty)?;
        }
        Commands::Drugs { pretty } => {
            print_json(&drug_listing(&kb), pretty)?;
        }
    }

    Ok(())
}

/// Size-checked read. Invalid UTF-8 is replaced rather than rejected.
fn read_vcf(path: &Path, limit: usize) -> anyhow::Result<String> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("reading {}", path.display()))?
        .len();
    let size = usize::try_from(size).unwrap_or(usize::MAX);
    if size > limit {
        return Err(PharmaGuardError::InputTooLarge { size, limit }.into());
    }
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[derive(Serialize)]
struct DrugListing<'a> {
    name: &'a str,
    gene: pharmaguard_common::Gene,
    drug_class: &'a str,
    aliases: &'a [String],
}

fn drug_listing(kb: &KnowledgeBase) -> Vec<DrugListing<'_>> {
    kb.supported_drugs()
        .map(|d| DrugListing {
            name: &d.name,
            gene: d.gene,
            drug_class: &d.drug_class,
            aliases: &d.aliases,
        })
        .collect()
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let out = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{out}");
    Ok(())
}
