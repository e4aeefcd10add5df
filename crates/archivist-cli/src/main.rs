//! Archivist: extract archival metadata from OCR text with local models.
//!
//! Usage:
//!   archivist [options] FILE...
//!   archivist [options] --source-dir DIR --document NAME
//!   archivist help

mod args;

use std::path::Path;

use archivist_core::{ExtractionTask, ExtractorConfig};
use archivist_runtime::{save_record, DirectorySource, MetadataPipeline, MetadataRecord};
use tracing::{error, info};

use crate::args::{parse_args, CliArgs, Command, Inputs, USAGE};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&argv) {
        Ok(Command::Run(cli)) => cli,
        Ok(Command::Help) => {
            println!("{}", USAGE);
            return Ok(());
        }
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };

    let config = load_config(cli.config.as_deref());
    info!(
        "Archivist starting (ollama: {}, policy: {:?}, mode: {}, priority: {})",
        config.ollama_url, config.selection_policy, cli.mode, cli.priority
    );

    let pipeline = MetadataPipeline::from_config(config)?;
    let failures = run(&pipeline, &cli).await;

    let status = pipeline.orchestrator().status();
    info!(
        "Run finished: {} cached results, {} models used",
        status.cached_results,
        status.model_stats.len()
    );

    if failures > 0 {
        eprintln!("{} document(s) failed", failures);
        std::process::exit(1);
    }
    Ok(())
}

/// Config file if given, otherwise defaults, then environment overrides.
fn load_config(path: Option<&Path>) -> ExtractorConfig {
    match path {
        Some(path) => {
            let mut config = ExtractorConfig::load(path);
            config.apply_env();
            config
        }
        None => ExtractorConfig::from_env(),
    }
}

/// Process every requested document and return how many failed.
async fn run(pipeline: &MetadataPipeline, cli: &CliArgs) -> usize {
    let mut failures = 0;
    match &cli.inputs {
        Inputs::Files(files) => {
            for file in files {
                if let Err(e) = process_file(pipeline, file, cli).await {
                    error!("{}: {}", file.display(), e);
                    failures += 1;
                }
            }
        }
        Inputs::Named {
            source_dir,
            documents,
        } => {
            let source = DirectorySource::new(source_dir);
            for name in documents {
                let outcome = match pipeline
                    .process_document(&source, name, cli.mode, cli.priority)
                    .await
                {
                    Ok(record) => {
                        let id = record.source_file.clone().unwrap_or_else(|| name.clone());
                        finish(&record, &source_dir.join(id), &cli.output)
                    }
                    Err(e) => Err(e.into()),
                };
                if let Err(e) = outcome {
                    error!("{}: {}", name, e);
                    failures += 1;
                }
            }
        }
    }
    failures
}

async fn process_file(
    pipeline: &MetadataPipeline,
    file: &Path,
    cli: &CliArgs,
) -> anyhow::Result<()> {
    let text = tokio::fs::read_to_string(file).await?;
    if text.trim().is_empty() {
        anyhow::bail!("no readable text");
    }

    let mut record = pipeline.process_text(&text, cli.mode, cli.priority).await;
    record.source_file = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());
    finish(&record, file, &cli.output)
}

fn finish(record: &MetadataRecord, source: &Path, output: &Path) -> anyhow::Result<()> {
    let path = save_record(record, source, output)?;
    print_summary(record, source, &path);
    Ok(())
}

fn print_summary(record: &MetadataRecord, source: &Path, saved: &Path) {
    let meta = &record.extraction_metadata;
    println!("\n{}", source.display());
    println!(
        "  type: {}  quality: {:.2}  time: {:.2}s",
        record.document_analysis.document_type,
        record.document_analysis.quality.overall_quality,
        meta.total_processing_time
    );
    for (field, detail) in &meta.field_details {
        let value = ExtractionTask::from_field(field)
            .map(|task| record.value(task))
            .unwrap_or_default();
        println!(
            "  {:<13} {:>5.2}  {:<22} {}",
            field,
            detail.confidence,
            detail.model_used,
            truncate(value, 70)
        );
    }
    println!("  mean confidence: {:.2}", record.mean_confidence());
    println!("  saved: {}", saved.display());
}

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        value.to_string()
    } else {
        let cut: String = value.chars().take(max).collect();
        format!("{}...", cut)
    }
}
