mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod logging;
mod metadata;
mod outline;
mod output;
mod page_range;
mod pdf;
mod progress;
mod prompt;
mod resolver;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Toc { path }) => {
            commands::toc::run(&path)?;
        }
        Some(Commands::Plan { path, layout }) => {
            commands::plan::run(&path, &layout)?;
        }
        None => {
            logging::init(&cli.split.log_file, cli.split.background)?;
            commands::split::run(&cli.split).await?;
        }
    }

    Ok(())
}
