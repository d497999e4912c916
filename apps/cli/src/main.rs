//! QuestionBuilder CLI: compiles interview-question catalogs for an
//! automated recruiting conversation.
//!
//! Reads a conversation protocol and an applicant profile, extracts the
//! hiring facts with an LLM and writes a validated question catalog.

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
