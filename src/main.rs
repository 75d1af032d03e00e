mod cli;

use anyhow::{Context, Result};
use apiprobe::config::ConfigLoader;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let loaded = ConfigLoader::load(cli.config.as_deref()).context("Failed to load config file")?;

    apiprobe::logger::init_logger(loaded.config.debug_mode);

    cli::run(cli, loaded).await
}
