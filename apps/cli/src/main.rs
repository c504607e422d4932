//! Darkmatter CLI — run markdown documents through the builder pipeline.
//!
//! Parses a file through every lifecycle stage and prints the resulting
//! pipeline as JSON, or inspects which builders are registered per stage.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
