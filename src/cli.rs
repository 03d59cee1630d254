use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use tablesift::config::AppSettings;
use tablesift::export::{ExportFormat, export, export_to_path};
use tablesift::pipeline::{PipelineConfig, run_with_report, validate_pipeline};
use tablesift::table::{Table, load_csv_path};

#[derive(Parser)]
#[command(name = "tablesift", about = "Declarative filtering, sorting and aggregation of CSV tables")]
pub struct Cli {
    /// Settings file. Defaults to the platform config directory.
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run a pipeline configuration against a table and export the result
    Run {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Output file. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (csv or json). Defaults to the output extension, then settings.
        #[arg(short, long)]
        format: Option<ExportFormat>,
    },
    /// Show the inferred schema of a table
    Inspect {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Check a pipeline configuration against a table without running it
    Validate {
        /// Input CSV file
        #[arg(short, long)]
        input: PathBuf,

        /// Pipeline configuration (JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Write an empty pipeline configuration
    Template {
        /// Output file. Writes to stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

pub fn run_command(command: Commands, settings: &AppSettings) -> Result<()> {
    match command {
        Commands::Run {
            input,
            config,
            output,
            format,
        } => handle_run(&input, &config, output.as_deref(), format, settings),
        Commands::Inspect { input } => handle_inspect(&input, settings),
        Commands::Validate { input, config } => handle_validate(&input, &config, settings),
        Commands::Template { output } => handle_template(output.as_deref()),
    }
}

fn load_table(input: &Path, settings: &AppSettings) -> Result<Table> {
    let options = settings.load_options()?;
    load_csv_path(input, &options).with_context(|| format!("Failed to load {}", input.display()))
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(bytes)?;
    stdout.flush()?;
    Ok(())
}

#[expect(clippy::print_stderr)]
fn handle_run(
    input: &Path,
    config_path: &Path,
    output: Option<&Path>,
    format: Option<ExportFormat>,
    settings: &AppSettings,
) -> Result<()> {
    let table = load_table(input, settings)?;
    let config = PipelineConfig::from_file(config_path)?;
    let (result, report) = run_with_report(&table, &config)?;

    let format = format
        .or_else(|| output.and_then(ExportFormat::from_path))
        .unwrap_or(settings.default_export_format);

    match output {
        Some(path) => export_to_path(&result, format, path)?,
        None => write_stdout(&export(&result, format)?)?,
    }

    for warning in &report.warnings {
        eprintln!("warning: {warning}");
    }
    eprintln!("{}", report.summary());
    Ok(())
}

#[expect(clippy::print_stdout)]
fn handle_inspect(input: &Path, settings: &AppSettings) -> Result<()> {
    let table = load_table(input, settings)?;
    println!(
        "{}: {} rows, {} columns",
        input.display(),
        table.row_count(),
        table.column_count()
    );

    let width = table
        .column_names()
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0);
    for (name, kind) in table.schema() {
        println!("  {name:<width$}  {kind}");
    }
    Ok(())
}

#[expect(clippy::print_stdout)]
fn handle_validate(input: &Path, config_path: &Path, settings: &AppSettings) -> Result<()> {
    let table = load_table(input, settings)?;
    let config = PipelineConfig::from_file(config_path)?;

    let errors = validate_pipeline(&config, &table.schema());
    if errors.is_empty() {
        println!("Configuration is valid for {}", input.display());
        return Ok(());
    }

    for error in &errors {
        println!("{error}");
    }
    anyhow::bail!("{} problem(s) found", errors.len())
}

fn handle_template(output: Option<&Path>) -> Result<()> {
    let config = PipelineConfig::default();
    match output {
        Some(path) => config.to_file(path)?,
        None => {
            let mut json = config.to_json()?;
            json.push('\n');
            write_stdout(json.as_bytes())?;
        }
    }
    Ok(())
}
