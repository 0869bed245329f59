//! Batch processing command for many PDF files.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, warn};

use pdfx_core::batch::{BatchCoordinator, BatchResult, BatchSummary, CancellationToken};
use pdfx_core::models::config::PdfConfig;
use pdfx_core::models::document::DocumentText;
use pdfx_core::pdf::{discover_pdfs, is_pdf, load_document_with};
use pdfx_core::rules::RuleSet;

use super::output::{write_csv, write_json, TableFormat};
use super::{load_config, save_images, save_text};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory, PDF file or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output file for accepted records (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format for accepted records
    #[arg(short, long, value_enum, default_value = "csv")]
    format: TableFormat,

    /// Write a JSON report with counts and rejection reasons
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Number of parallel workers (default: from config)
    #[arg(short = 'j', long)]
    jobs: Option<usize>,

    /// Only process PDFs directly inside the input directory
    #[arg(long)]
    no_recursive: bool,

    /// Save each document's extracted text to this directory
    #[arg(long, value_name = "DIR")]
    save_text: Option<PathBuf>,

    /// Save embedded images under DIR/images
    #[arg(long, value_name = "DIR")]
    extract_images: Option<PathBuf>,
}

/// Per-document side outputs written while text is extracted.
#[derive(Clone, Default)]
struct Exports {
    text_dir: Option<PathBuf>,
    image_dir: Option<PathBuf>,
}

/// JSON report written by `--report`.
#[derive(Serialize)]
struct BatchReport<'a> {
    generated_at: DateTime<Utc>,
    input: &'a str,
    jobs: usize,
    elapsed_ms: u64,
    #[serde(flatten)]
    summary: BatchSummary,
    /// Inputs never processed because the batch was cancelled.
    skipped_files: Vec<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration; rule errors stop the run before any document
    let config = load_config(config_path)?;
    let rules = config.rule_set()?;

    let recursive = config.batch.recursive && !args.no_recursive;
    let files = resolve_inputs(&args.input, recursive)?;

    if files.is_empty() {
        anyhow::bail!("No PDF files found for input: {}", args.input);
    }

    let jobs = args.jobs.unwrap_or(config.batch.jobs).max(1);
    eprintln!(
        "{} Found {} PDF files to process with {} rules",
        style("ℹ").blue(),
        files.len(),
        rules.len()
    );

    // Set up progress bar
    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files {msg}")?
            .progress_chars("=>-"),
    );

    // Ctrl-C stops new documents from being started
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing documents in progress");
            signal_token.cancel();
        }
    });

    let exports = Exports {
        text_dir: args.save_text.clone(),
        image_dir: args.extract_images.clone(),
    };
    let pdf_config = config.pdf.clone();
    let progress_bar = pb.clone();

    let (rules, files, batch) = tokio::task::spawn_blocking(move || {
        let batch = BatchCoordinator::new(&rules)
            .with_jobs(jobs)
            .with_cancellation(cancel)
            .with_progress(move |progress| {
                progress_bar.set_message(progress.source_id.to_string());
                progress_bar.inc(1);
            })
            .run_parallel(&files, |path| load_pdf(path, &pdf_config, &exports));
        (rules, files, batch)
    })
    .await?;

    signal_task.abort();
    pb.finish_and_clear();

    // Write accepted records
    let source_column = config.batch.source_column.as_deref();
    match &args.output {
        Some(path) => {
            let writer = BufWriter::new(File::create(path)?);
            write_records(writer, &rules, &batch, source_column, args.format)?;
            eprintln!(
                "{} {} records written to {}",
                style("✓").green(),
                batch.accepted_count(),
                path.display()
            );
        }
        None => write_records(io::stdout().lock(), &rules, &batch, source_column, args.format)?,
    }

    let elapsed = start.elapsed();

    if let Some(ref report_path) = args.report {
        write_report(
            report_path,
            &args.input,
            jobs,
            elapsed.as_millis() as u64,
            &batch,
            skipped_files(&batch, &files),
        )?;
        eprintln!(
            "{} Report written to {}",
            style("✓").green(),
            report_path.display()
        );
    }

    print_summary(&batch, elapsed);

    if batch.is_cancelled() {
        anyhow::bail!("Batch cancelled after {} documents", batch.len());
    }

    Ok(())
}

/// Expand the input argument into PDF paths.
///
/// An existing path is a file or directory; anything else is a glob pattern.
fn resolve_inputs(input: &str, recursive: bool) -> anyhow::Result<Vec<PathBuf>> {
    let path = Path::new(input);
    if path.exists() {
        return Ok(discover_pdfs(path, recursive)?);
    }

    let mut files: Vec<PathBuf> = glob(input)?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                warn!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|p| p.is_file() && is_pdf(p))
        .collect();
    files.sort();

    debug!("Glob {} matched {} PDF files", input, files.len());
    Ok(files)
}

/// Extract one document's text on a worker, writing any requested exports.
fn load_pdf(path: &Path, config: &PdfConfig, exports: &Exports) -> DocumentText {
    load_document_with(path, config, |document, pages| {
        let source_id = document.source_id();

        if let Some(ref dir) = exports.image_dir {
            match document.images() {
                Ok(images) => {
                    if let Err(e) = save_images(dir, &document.stem(), &images) {
                        warn!("Could not save images of {}: {}", source_id, e);
                    }
                }
                Err(e) => warn!("Image extraction failed for {}: {}", source_id, e),
            }
        }

        if let (Some(dir), Some(pages)) = (&exports.text_dir, pages) {
            if let Err(e) = save_text(dir, &document.stem(), &document.saved_text(pages, config)) {
                warn!("Could not save text of {}: {}", source_id, e);
            }
        }
    })
}

fn write_records<W: Write>(
    writer: W,
    rules: &RuleSet,
    batch: &BatchResult,
    source_column: Option<&str>,
    format: TableFormat,
) -> anyhow::Result<()> {
    match format {
        TableFormat::Csv => write_csv(writer, rules, batch.accepted(), source_column),
        TableFormat::Json => write_json(writer, batch.accepted(), source_column),
    }
}

fn write_report(
    path: &Path,
    input: &str,
    jobs: usize,
    elapsed_ms: u64,
    batch: &BatchResult,
    skipped_files: Vec<String>,
) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let report = BatchReport {
        generated_at: Utc::now(),
        input,
        jobs,
        elapsed_ms,
        summary: batch.summary(),
        skipped_files,
    };
    fs::write(path, serde_json::to_string_pretty(&report)?)?;
    Ok(())
}

/// Paths of the inputs a cancelled batch never reached.
fn skipped_files(batch: &BatchResult, files: &[PathBuf]) -> Vec<String> {
    batch
        .skipped()
        .iter()
        .filter_map(|&index| files.get(index))
        .map(|path| path.display().to_string())
        .collect()
}

fn print_summary(batch: &BatchResult, elapsed: std::time::Duration) {
    eprintln!();
    eprintln!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        batch.len(),
        elapsed
    );
    eprintln!(
        "   {} accepted, {} rejected",
        style(batch.accepted_count()).green(),
        style(batch.rejected_count()).red()
    );

    let rejections: Vec<_> = batch.rejections().collect();
    if !rejections.is_empty() {
        eprintln!();
        eprintln!("{}", style("Rejected files:").red());
        for rejection in &rejections {
            eprintln!("  - {}: {}", rejection.source_id, rejection.reason);
        }
    }

    if batch.is_cancelled() {
        eprintln!();
        eprintln!(
            "{} Cancelled: {} of {} files were not processed",
            style("!").yellow(),
            batch.skipped().len(),
            batch.input_len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_glob_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.pdf", "a.pdf", "c.txt"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let pattern = format!("{}/*", dir.path().display());
        let files = resolve_inputs(&pattern, true).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }

    #[test]
    fn test_load_pdf_reports_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        fs::write(&path, b"not a pdf").unwrap();

        let document = load_pdf(&path, &PdfConfig::default(), &Exports::default());
        assert!(document.text.is_err());
        assert!(document.source_id.ends_with("broken.pdf"));
    }

    #[test]
    fn test_skipped_files_names_unprocessed_inputs() {
        let rules = RuleSet::from_specs(&[]).unwrap();
        let files: Vec<PathBuf> = ["a.pdf", "b.pdf", "c.pdf"].iter().map(PathBuf::from).collect();

        let cancel = CancellationToken::new();
        cancel.cancel();
        let batch = BatchCoordinator::new(&rules)
            .with_cancellation(cancel)
            .run_parallel(&files, |path| DocumentText::extracted(path.display().to_string(), ""));

        assert!(batch.is_cancelled());
        assert_eq!(skipped_files(&batch, &files), vec!["a.pdf", "b.pdf", "c.pdf"]);

        let batch = BatchCoordinator::new(&rules)
            .run_parallel(&files, |path| DocumentText::extracted(path.display().to_string(), ""));
        assert!(skipped_files(&batch, &files).is_empty());
    }
}
