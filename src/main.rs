//! `effconf`: derive effective test configurations from captured fixtures.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use effconf::config::load_with_fallback;
use effconf::{EffconfError, MaterializeArgs, MergeArgs};
use env_logger::Env;

mod commands;

#[derive(Parser)]
#[command(
    name = "effconf",
    version,
    about = "Merge hardcoded test configuration with captured fixtures"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the effective configurations for one baseline value
    Materialize(MaterializeArgs),
    /// Merge external JSON documents into a base document
    Merge(MergeArgs),
}

fn run(cli: Cli) -> Result<(), EffconfError> {
    match cli.command {
        Commands::Materialize(args) => {
            let args = load_with_fallback(args, "field").map_err(Box::new)?;
            commands::run_materialize(&args)
        }
        Commands::Merge(args) => {
            let args = load_with_fallback(args, "base").map_err(Box::new)?;
            commands::run_merge(&args)
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("effconf: {err}");
            ExitCode::FAILURE
        }
    }
}
