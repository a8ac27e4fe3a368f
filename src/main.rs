mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use expense_tracker::{logging, Config, LedgerStore};
use std::path::PathBuf;
use tracing::info;

/// Track expenses in the terminal. Nothing is saved when the screen closes.
#[derive(Debug, Parser)]
#[command(name = "expense-tracker", version)]
struct Cli {
    /// Config file (defaults to $EXPENSE_TRACKER_CONFIG or the user config dir)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the resolved configuration and exit
    #[arg(long)]
    show_config: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if cli.show_config {
        match Config::resolve_path(cli.config.as_deref()) {
            Some(path) => println!("config file: {}", path.display()),
            None => println!("config file: <none>"),
        }
        println!("{:#?}", config);
        return Ok(());
    }

    // The screen owns the terminal, so only log when a file is configured
    logging::init(&config.logging, logging::Fallback::Discard)?;
    info!(version = expense_tracker::VERSION, "starting expense screen");

    let mut app = ui::App::new(LedgerStore::new(), config.display.clone());
    ui::run_ui(&mut app)?;

    Ok(())
}
