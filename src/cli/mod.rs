//! CLI interface for changelog-gen

use anyhow::Result;
use clap::{Parser, Subcommand};

pub mod generate;

pub use generate::GenerateCommand;

/// changelog-gen: changelog generation from commit messages
#[derive(Parser)]
#[command(name = "changelog-gen")]
#[command(about = "Generate a changelog from commit messages", long_about = None)]
#[command(version)]
pub struct Cli {
    /// The main command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Main command categories
#[derive(Subcommand)]
pub enum Commands {
    /// Generates a changelog for a date or revision range.
    Generate(GenerateCommand),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Generate(generate_cmd) => generate_cmd.execute().await,
        }
    }
}
