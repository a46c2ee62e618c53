//! Log sources — where raw commit-message text comes from.
//!
//! A run reads its log either from an explicit file or by invoking the git
//! CLI with a range filter built from the resolved [`Range`]. Either way the
//! raw text is normalized before classification.

use std::path::PathBuf;

use tokio::process::Command;
use tracing::debug;

use crate::changelog::error::ChangelogError;
use crate::changelog::range::Range;

/// Default pretty/filter arguments for `git log` when none are configured.
const DEFAULT_LOG_ARGUMENTS: &[&str] = &["--pretty=format:%s", "--no-merges"];

/// A provider of raw commit-message text for one run.
#[derive(Debug, Clone)]
pub enum LogSource {
    /// Read the log verbatim from a file, bypassing git entirely.
    ExplicitFile(PathBuf),
    /// Invoke `git log` with a range filter derived from the resolved range.
    GitCli {
        /// Replaces the default pretty/no-merges arguments when set.
        extra_arguments: Option<Vec<String>>,
    },
}

impl LogSource {
    /// Fetches the raw log text for the given range.
    ///
    /// Fails with [`ChangelogError::MissingInput`] if an explicit log file
    /// does not exist, and with [`ChangelogError::LogSource`] if the git
    /// invocation cannot spawn or exits non-zero. No destination is written
    /// in either case.
    pub async fn fetch(&self, range: &Range) -> Result<String, ChangelogError> {
        match self {
            LogSource::ExplicitFile(path) => {
                if !path.exists() {
                    return Err(ChangelogError::MissingInput(path.clone()));
                }

                std::fs::read_to_string(path).map_err(|e| {
                    ChangelogError::LogSource(format!(
                        "failed to read log file {}: {e}",
                        path.display()
                    ))
                })
            }
            LogSource::GitCli { extra_arguments } => {
                let args = git_log_arguments(range, extra_arguments.as_deref());
                debug!("git {}", args.join(" "));

                let output = Command::new("git").args(&args).output().await.map_err(|e| {
                    ChangelogError::LogSource(format!("failed to run git: {e}"))
                })?;

                if !output.status.success() {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    return Err(ChangelogError::LogSource(format!(
                        "git log exited with {}: {}",
                        output.status,
                        stderr.trim()
                    )));
                }

                Ok(String::from_utf8_lossy(&output.stdout).into_owned())
            }
        }
    }
}

/// Builds the full `git log` argument list for a resolved range.
///
/// Revision ranges become a single `A..B` span; date ranges become an
/// `--after`/`--before` filter pair. Caller-supplied extra arguments replace
/// the default pretty format but never the range filter.
fn git_log_arguments(range: &Range, extra: Option<&[String]>) -> Vec<String> {
    let mut args: Vec<String> = vec!["--no-pager".to_string(), "log".to_string()];

    if let Range::Revision { after, before } = range {
        args.push(format!("{after}..{before}"));
    }

    match extra {
        Some(extra) => args.extend(extra.iter().cloned()),
        None => args.extend(DEFAULT_LOG_ARGUMENTS.iter().map(ToString::to_string)),
    }

    if let Range::Date { after, before } = range {
        args.push(format!("--after={}", after.to_rfc3339()));
        args.push(format!("--before={}", before.to_rfc3339()));
    }

    args
}

/// Collapses runs of blank lines into single blank lines.
///
/// Some git pretty formats emit a double newline per record; classification
/// expects one logical line per record separator.
pub fn normalize_log(raw: &str) -> String {
    let mut normalized = String::with_capacity(raw.len());
    let mut blank_run = false;

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !blank_run {
                normalized.push('\n');
                blank_run = true;
            }
        } else {
            normalized.push_str(line);
            normalized.push('\n');
            blank_run = false;
        }
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Local, TimeZone};

    fn date_range() -> Range {
        Range::Date {
            after: Local.with_ymd_and_hms(2014, 4, 8, 0, 0, 0).unwrap(),
            before: Local.with_ymd_and_hms(2014, 8, 21, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn revision_range_uses_span_expression() {
        let range = Range::Revision {
            after: "v1.2.0".to_string(),
            before: "HEAD".to_string(),
        };

        let args = git_log_arguments(&range, None);
        assert_eq!(
            args,
            vec![
                "--no-pager",
                "log",
                "v1.2.0..HEAD",
                "--pretty=format:%s",
                "--no-merges",
            ]
        );
    }

    #[test]
    fn date_range_uses_after_before_pair() {
        let args = git_log_arguments(&date_range(), None);

        assert_eq!(args[0], "--no-pager");
        assert_eq!(args[1], "log");
        assert_eq!(args[2], "--pretty=format:%s");
        assert_eq!(args[3], "--no-merges");
        assert!(args[4].starts_with("--after=2014-04-08"));
        assert!(args[5].starts_with("--before=2014-08-21"));
    }

    #[test]
    fn extra_arguments_replace_pretty_defaults_only() {
        let extra = vec![
            "--pretty=* %h - %ad: %s".to_string(),
            "--no-merges".to_string(),
            "--date=short".to_string(),
        ];

        let args = git_log_arguments(&date_range(), Some(&extra));

        assert_eq!(args[2], "--pretty=* %h - %ad: %s");
        assert_eq!(args[4], "--date=short");
        assert!(args.last().is_some_and(|a| a.starts_with("--before=")));
    }

    #[test]
    fn missing_explicit_log_is_missing_input() {
        let source = LogSource::ExplicitFile(PathBuf::from("/nonexistent/log"));
        let range = Range::Revision {
            after: "a".to_string(),
            before: "b".to_string(),
        };

        let rt = tokio::runtime::Runtime::new().unwrap();
        let err = rt.block_on(source.fetch(&range));

        assert!(matches!(err, Err(ChangelogError::MissingInput(_))));
    }

    #[test]
    fn blank_line_runs_collapse() {
        let raw = "feat: one\n\n\n\nfix: two\n\nfeat: three\n";
        assert_eq!(normalize_log(raw), "feat: one\n\nfix: two\n\nfeat: three\n");
    }

    #[test]
    fn normalize_preserves_single_spaced_text() {
        let raw = "a\nb\nc\n";
        assert_eq!(normalize_log(raw), raw);
    }
}
