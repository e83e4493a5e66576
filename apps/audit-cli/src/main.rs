//! prose-audit - command line front end for the audit engine
//!
//! Two workflows:
//! - `audit` runs the layered checks over a markdown file and emits paired
//!   JSON + narrative markdown reports
//! - `build-kb` ingests JSONL chunk files into a knowledge-base snapshot

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use audit_engine::{write_reports, AuditEngine};
use kb_index::builder::{entries_from_chunks, load_urls_map, read_jsonl};
use kb_index::KbIndex;
use shared_types::PageMeta;

#[derive(Parser)]
#[command(name = "prose-audit", about = "Layered style audit for prose documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Audit a markdown document and write JSON + markdown reports
    Audit {
        /// Markdown file to audit
        #[arg(long)]
        markdown_file: PathBuf,

        /// Knowledge-base snapshot used to enrich findings
        #[arg(long, default_value = "kb/kb_index.json")]
        kb_index: PathBuf,

        /// Directory the report pair is written into
        #[arg(long, default_value = "reports")]
        output_dir: PathBuf,

        /// Source URL recorded in the report header
        #[arg(long)]
        url: Option<String>,

        /// Document title; defaults to the file stem
        #[arg(long)]
        title: Option<String>,
    },

    /// Build a knowledge-base snapshot from JSONL chunk files
    BuildKb {
        /// One or more JSONL files of corpus chunks
        #[arg(required = true)]
        chunks: Vec<PathBuf>,

        /// Optional CSV mapping source files to canonical URLs
        #[arg(long)]
        urls_map: Option<PathBuf>,

        /// Where the snapshot is written
        #[arg(long, default_value = "kb/kb_index.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("prose_audit=info".parse()?)
                .add_directive("audit_engine=info".parse()?)
                .add_directive("kb_index=info".parse()?),
        )
        .init();

    match Cli::parse().command {
        Command::Audit {
            markdown_file,
            kb_index,
            output_dir,
            url,
            title,
        } => run_audit(&markdown_file, &kb_index, &output_dir, url, title),
        Command::BuildKb {
            chunks,
            urls_map,
            out,
        } => run_build_kb(&chunks, urls_map.as_deref(), &out),
    }
}

fn run_audit(
    markdown_file: &Path,
    kb_path: &Path,
    output_dir: &Path,
    url: Option<String>,
    title: Option<String>,
) -> Result<()> {
    let text = fs::read_to_string(markdown_file)
        .with_context(|| format!("reading {}", markdown_file.display()))?;

    let kb = load_kb(kb_path);

    let title = title.unwrap_or_else(|| {
        markdown_file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string())
    });
    let page = PageMeta { url, title };

    let engine = AuditEngine::new();
    let report = engine.audit(page, &text, kb.as_ref());
    info!(
        issues = report.summary.issues_found,
        "audit complete"
    );

    let paths = write_reports(output_dir, &report)
        .with_context(|| format!("writing reports under {}", output_dir.display()))?;
    let out = serde_json::json!({
        "report_json": paths.json.display().to_string(),
        "report_md": paths.markdown.display().to_string(),
    });
    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

/// A missing or unreadable snapshot disables enrichment but never the audit
fn load_kb(path: &Path) -> Option<KbIndex> {
    match KbIndex::load(path) {
        Ok(index) => Some(index),
        Err(err) => {
            warn!(path = %path.display(), %err, "knowledge base unavailable; continuing without enrichment");
            None
        }
    }
}

fn run_build_kb(chunk_files: &[PathBuf], urls_map: Option<&Path>, out: &Path) -> Result<()> {
    let urls = urls_map.map(load_urls_map).unwrap_or_else(HashMap::new);

    let mut chunks = Vec::new();
    for file in chunk_files {
        let mut file_chunks =
            read_jsonl(file).with_context(|| format!("reading {}", file.display()))?;
        info!(file = %file.display(), chunks = file_chunks.len(), "loaded chunk file");
        chunks.append(&mut file_chunks);
    }

    let entries = entries_from_chunks(&chunks, &urls);
    info!(candidates = entries.len(), "extracted corpus entries");

    let index = KbIndex::build(entries).context("building knowledge-base index")?;
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    index
        .save(out)
        .with_context(|| format!("writing snapshot {}", out.display()))?;
    println!("{}", out.display());
    Ok(())
}
