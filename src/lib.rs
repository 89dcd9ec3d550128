pub mod cli;
pub mod config;
pub mod dataset;
pub mod db;
pub mod io_utils;
pub mod load;
pub mod normalize;
pub mod preview;
pub mod record;
pub mod table;
pub mod verify;

use std::{env, sync::OnceLock};

use anyhow::Result;
use clap::Parser;
use log::{LevelFilter, warn};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("scoreload", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub async fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    tokio::select! {
        result = dispatch(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            // Batches committed so far stay committed; exit cleanly.
            warn!("Operation cancelled by user");
            Ok(())
        }
    }
}

async fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Load(args) => load::execute(&args).await,
        Commands::Verify(args) => verify::execute(&args).await,
        Commands::Preview(args) => preview::execute(&args),
    }
}
