//! Generate command — runs one changelog generation end to end.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::changelog;
use crate::config::ChangelogConfig;

/// Generate command options.
///
/// Flags mirror the config file keys; a flag given on the command line
/// overrides the same key from `--config`.
#[derive(Parser)]
pub struct GenerateCommand {
    /// Range start: a date (2013-03-26) or a revision token (v1.2.0, a sha).
    #[arg(long)]
    pub after: Option<String>,

    /// Range end: a date or a revision token. Defaults to now / HEAD.
    #[arg(long)]
    pub before: Option<String>,

    /// Read the raw log from this file instead of invoking git.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Extra `git log` argument; repeat to pass several. Replaces the
    /// default pretty/no-merges arguments.
    #[arg(long = "log-argument", value_name = "ARG")]
    pub log_arguments: Vec<String>,

    /// Output file (default: changelog.txt).
    #[arg(long, value_name = "FILE")]
    pub dest: Option<PathBuf>,

    /// How to combine with an existing destination: prepend or append.
    #[arg(long, value_name = "TYPE")]
    pub insert_type: Option<String>,

    /// Header text; its first line doubles as a dedup marker.
    #[arg(long, value_name = "TEXT")]
    pub file_header: Option<String>,

    /// YAML config file carrying templates, partials, and section patterns.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl GenerateCommand {
    /// Executes the generate command.
    pub async fn execute(self) -> Result<()> {
        let base = match &self.config {
            Some(path) => ChangelogConfig::load(path)?,
            None => ChangelogConfig::default(),
        };

        let config = base.overlay(self.into_config());

        let dest = config
            .dest
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::config::DEFAULT_DEST));

        let changelog = changelog::generate(&config)
            .await
            .context("Failed to generate changelog")?;

        println!("{changelog}");
        println!("Changelog created at {}.", dest.display());

        Ok(())
    }

    /// Converts the command-line flags into a config overlay.
    fn into_config(self) -> ChangelogConfig {
        ChangelogConfig {
            after: self.after,
            before: self.before,
            log: self.log,
            log_arguments: if self.log_arguments.is_empty() {
                None
            } else {
                Some(self.log_arguments)
            },
            dest: self.dest,
            insert_type: self.insert_type,
            file_header: self.file_header,
            ..Default::default()
        }
    }
}
