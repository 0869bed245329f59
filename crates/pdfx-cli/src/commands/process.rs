//! Process command - extract fields from a single PDF file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use pdfx_core::extract::RecordBuilder;
use pdfx_core::models::record::ExtractionResult;
use pdfx_core::pdf::{load_document_with, PdfDocument};
use pdfx_core::rules::RuleSet;

use super::output::{format_record_text, write_csv, OutputFormat};
use super::{load_config, save_images, save_text};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input PDF file
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Save the extracted text to this directory
    #[arg(long, value_name = "DIR")]
    save_text: Option<PathBuf>,

    /// Save embedded images under DIR/images
    #[arg(long, value_name = "DIR")]
    extract_images: Option<PathBuf>,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    // Load configuration
    let config = load_config(config_path)?;
    let rules = config.rule_set()?;

    // Check input file exists
    if !args.input.is_file() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message("Extracting text...");

    let builder = RecordBuilder::new(&rules);
    let source_id = args.input.display().to_string();

    let document = load_document_with(&args.input, &config.pdf, |document, pages| {
        export_images(document, &args);
        if let (Some(dir), Some(pages)) = (&args.save_text, pages) {
            match save_text(dir, &document.stem(), &document.saved_text(pages, &config.pdf)) {
                Ok(path) => pb.println(format!(
                    "{} Text saved to {}",
                    style("✓").green(),
                    path.display()
                )),
                Err(e) => warn!("Could not save text of {}: {}", source_id, e),
            }
        }
    });

    pb.set_message("Matching fields...");
    let record = match &document.text {
        Ok(text) => builder.build(document.source_id, text),
        Err(e) => {
            warn!("Text extraction failed for {}: {}", args.input.display(), e);
            builder.extraction_failed(document.source_id, e.clone())
        }
    };

    pb.finish_and_clear();

    // Format output
    let output = format_record(&record, &rules, config.batch.source_column.as_deref(), args.format)?;

    // Write output
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        eprintln!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        print!("{}", output);
    }

    match record.rejection() {
        None => eprintln!("{} Accepted", style("✓").green()),
        Some(reason) => eprintln!("{} Rejected: {}", style("✗").red(), reason),
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

fn export_images(document: &PdfDocument, args: &ProcessArgs) {
    let Some(ref dir) = args.extract_images else {
        return;
    };

    match document.images() {
        Ok(images) => match save_images(dir, &document.stem(), &images) {
            Ok(count) => eprintln!(
                "{} Extracted {} images to {}",
                style("✓").green(),
                count,
                dir.join("images").display()
            ),
            Err(e) => warn!("Could not save images of {}: {}", document.path().display(), e),
        },
        Err(e) => warn!("Image extraction failed for {}: {}", document.path().display(), e),
    }
}

fn format_record(
    record: &ExtractionResult,
    rules: &RuleSet,
    source_column: Option<&str>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(record)? + "\n"),
        OutputFormat::Csv => {
            let mut buf = Vec::new();
            write_csv(&mut buf, rules, [record], source_column)?;
            Ok(String::from_utf8(buf)?)
        }
        OutputFormat::Text => Ok(format_record_text(record)),
    }
}
