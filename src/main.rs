//! Command-line driver for opinion polarization runs.
//!
//! A simulation directory holds a `config.toml` and one `run-NNNN`
//! directory per independent run. Each invocation of a run writes a new
//! `trajectory-NNNN.msgpack` with the opinion, attention and information
//! snapshots of every tick, and refreshes `checkpoint.msgpack` so the run
//! can be continued later from the exact same random stream.

mod manager;

use crate::manager::Manager;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    /// Directory with `config.toml` where the runs are stored.
    #[arg(long)]
    sim_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Build the network and population, then run `run.step_count` ticks
    /// into a new `run-NNNN` directory.
    Create,

    /// Load the checkpoint of a run and append another `run.step_count`
    /// ticks as its next trajectory file.
    Resume {
        /// Index of the run to continue.
        #[arg(long)]
        run_idx: usize,
    },

    /// Delete every `run-NNNN` directory, keeping `config.toml`.
    Clean,
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let mgr = Manager::new(&args.sim_dir)
        .with_context(|| format!("failed to open simulation directory {:?}", args.sim_dir))?;

    match args.command {
        Command::Create => mgr.create_run().context("failed to create run")?,
        Command::Resume { run_idx } => mgr
            .resume_run(run_idx)
            .with_context(|| format!("failed to resume run {run_idx}"))?,
        Command::Clean => mgr.clean_sim().context("failed to clean simulation")?,
    }

    Ok(())
}
