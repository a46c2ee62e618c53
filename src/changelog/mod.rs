//! Changelog generation engine.
//!
//! One run flows through five stages: range resolution, log fetch,
//! line classification, template rendering, and destination merge. The
//! stages are pure in-memory transformations except for the log fetch
//! (one external process at most) and the final read-modify-write of the
//! destination file. The destination is only touched after rendering has
//! fully succeeded, so a failed run never leaves a partial changelog.
//!
//! Runs share no state: templates, patterns, and the resolved range are all
//! per-run values. The destination read-modify-write is not locked, so
//! concurrent runs against the same destination are the caller's problem.

pub mod classify;
pub mod error;
pub mod merge;
pub mod range;
pub mod source;
pub mod template;

use anyhow::{Context, Result};
use chrono::Local;
use tracing::{debug, info};

pub use classify::{classify, ClassifiedChanges, MatchStrategy, SectionSpec};
pub use error::ChangelogError;
pub use merge::{merge, InsertMode};
pub use range::Range;
pub use source::{normalize_log, LogSource};
pub use template::{Renderer, TemplateSet};

use crate::config::ChangelogConfig;

/// Runs one changelog generation end to end and writes the destination.
///
/// Returns the final merged text, exactly as written.
pub async fn generate(config: &ChangelogConfig) -> Result<String> {
    let settings = config.resolve()?;

    let range = Range::resolve(settings.after.as_deref(), settings.before.as_deref());
    debug!(?range, "resolved range");

    let raw = settings.source.fetch(&range).await?;
    let log = normalize_log(&raw);

    let changes = classify(&log, &settings.specs, settings.strategy);
    for (name, entries) in changes.iter() {
        debug!(section = name, count = entries.len(), "classified section");
    }

    let renderer = Renderer::new(&settings.templates, &changes, Local::now())?;
    let changelog = renderer.render()?;

    // Rendering succeeded; only now is the destination involved.
    let existing = if settings.dest.exists() {
        Some(std::fs::read_to_string(&settings.dest).with_context(|| {
            format!("Failed to read destination: {}", settings.dest.display())
        })?)
    } else {
        None
    };

    let final_text = merge(
        existing.as_deref(),
        &changelog,
        settings.insert,
        settings.header.as_deref(),
    );

    if let Some(parent) = settings.dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create destination directory: {}", parent.display())
            })?;
        }
    }

    std::fs::write(&settings.dest, &final_text)
        .with_context(|| format!("Failed to write destination: {}", settings.dest.display()))?;

    info!(dest = %settings.dest.display(), "changelog written");

    Ok(final_text)
}
