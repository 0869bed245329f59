//! Rules command - manage the field rules in the configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Subcommand};
use console::style;

use pdfx_core::extract::build;
use pdfx_core::models::config::{FieldSpec, PdfxConfig};

use super::config_path;
use super::output::format_record_text;

/// Arguments for the rules command.
#[derive(Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    command: RulesCommand,
}

#[derive(Subcommand)]
enum RulesCommand {
    /// Show the current configuration
    Show,

    /// Initialize a new configuration file with sample rules
    Init(InitArgs),

    /// Add a field rule
    Add(AddArgs),

    /// Remove a field rule by name
    Remove {
        /// Field name
        name: String,
    },

    /// Validate the configuration and list its rules
    Check,

    /// Show configuration file path
    Path,

    /// Apply the rules to a plain text file
    Test {
        /// Text file to match against
        file: PathBuf,
    },
}

#[derive(Args)]
struct InitArgs {
    /// Overwrite existing file
    #[arg(long)]
    force: bool,
}

#[derive(Args)]
struct AddArgs {
    /// Field name (output column)
    #[arg(long)]
    name: String,

    /// Regular expression for the field value
    #[arg(long)]
    pattern: String,

    /// Reject documents where this field is missing
    #[arg(long)]
    required: bool,
}

pub async fn run(args: RulesArgs, config: Option<&str>) -> anyhow::Result<()> {
    let path = config_path(config);
    match args.command {
        RulesCommand::Show => show_config(&path),
        RulesCommand::Init(init_args) => init_config(&path, init_args),
        RulesCommand::Add(add_args) => add_rule(&path, add_args),
        RulesCommand::Remove { name } => remove_rule(&path, &name),
        RulesCommand::Check => check_rules(&path),
        RulesCommand::Path => show_path(&path),
        RulesCommand::Test { file } => test_rules(&path, &file),
    }
}

/// Load the file if it exists, falling back to defaults.
fn load_or_default(path: &Path) -> anyhow::Result<PdfxConfig> {
    if path.exists() {
        Ok(PdfxConfig::from_file(path)?)
    } else {
        Ok(PdfxConfig::default())
    }
}

/// Validate `config` and write it to `path`.
fn save_validated(path: &Path, config: &PdfxConfig) -> anyhow::Result<()> {
    config.rule_set()?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    config.save(path)?;
    Ok(())
}

fn show_config(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        eprintln!(
            "{} No config file found, showing defaults.",
            style("ℹ").blue()
        );
    }

    let config = load_or_default(path)?;
    println!("{}", serde_json::to_string_pretty(&config)?);

    Ok(())
}

fn init_config(path: &Path, args: InitArgs) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    save_validated(path, &PdfxConfig::default())?;

    println!(
        "{} Created configuration file at {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}

fn add_rule(path: &Path, args: AddArgs) -> anyhow::Result<()> {
    let mut config = load_or_default(path)?;
    config
        .fields
        .push(FieldSpec::new(&args.name, &args.pattern, args.required));

    save_validated(path, &config)?;

    println!(
        "{} Added {} field '{}' = {}",
        style("✓").green(),
        if args.required { "required" } else { "optional" },
        args.name,
        args.pattern
    );

    Ok(())
}

fn remove_rule(path: &Path, name: &str) -> anyhow::Result<()> {
    let mut config = load_or_default(path)?;

    let before = config.fields.len();
    config.fields.retain(|field| field.name != name);
    if config.fields.len() == before {
        anyhow::bail!("No field named '{}' in {}", name, path.display());
    }

    save_validated(path, &config)?;

    println!("{} Removed field '{}'", style("✓").green(), name);

    Ok(())
}

fn check_rules(path: &Path) -> anyhow::Result<()> {
    let config = load_or_default(path)?;
    let rules = config.rule_set()?;

    println!(
        "{} {} rules are valid",
        style("✓").green(),
        rules.len()
    );
    for rule in &rules {
        let marker = if rule.is_required() {
            style("required").yellow()
        } else {
            style("optional").dim()
        };
        println!("  {} [{}] {}", rule.name(), marker, rule.pattern());
    }

    Ok(())
}

fn show_path(path: &Path) -> anyhow::Result<()> {
    println!("Configuration file: {}", path.display());

    if path.exists() {
        println!("Status: {}", style("exists").green());
    } else {
        println!("Status: {}", style("not created").yellow());
        println!();
        println!("Run 'pdfx rules init' to create a configuration file.");
    }

    Ok(())
}

fn test_rules(path: &Path, file: &Path) -> anyhow::Result<()> {
    let config = load_or_default(path)?;
    let rules = config.rule_set()?;

    let text = fs::read_to_string(file)?;
    let record = build(file.display().to_string(), &text, &rules);

    print!("{}", format_record_text(&record));

    Ok(())
}
