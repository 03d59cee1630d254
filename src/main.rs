//! # tablesift command-line entry point
//!
//! ```text
//! main()
//!   │
//!   ├─> Parse CLI arguments (clap)
//!   ├─> Load settings (explicit --settings file or platform default)
//!   ├─> Install logging (stderr, optional rolling files)
//!   └─> Dispatch the subcommand
//! ```

mod cli;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use tablesift::config::load_settings;
use tablesift::logging::{self, LogSettings};

fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    let settings = load_settings(cli.settings.as_deref()).context("Failed to load settings")?;
    logging::init(&LogSettings::from(&settings))?;

    cli::run_command(cli.command, &settings)
}
