//! Configuration for changelog generation runs.
//!
//! A run's options come from up to three layers: built-in defaults, an
//! optional YAML config file, and command-line flags. Later layers override
//! earlier ones key by key via an explicit shallow merge; absent keys keep
//! their defaults.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::changelog::classify::{MatchStrategy, SectionSpec};
use crate::changelog::error::ChangelogError;
use crate::changelog::merge::InsertMode;
use crate::changelog::source::LogSource;
use crate::changelog::template::TemplateSet;

/// Default destination file.
pub const DEFAULT_DEST: &str = "changelog.txt";

/// Built-in section patterns: commit messages tagged `feature:` or `fix:`.
const DEFAULT_FEATURE_PATTERN: &str = r"^(.*) feature: ?(.*)$";
const DEFAULT_FIX_PATTERN: &str = r"^(.*) fix: ?(.*)$";

/// Raw, partially-specified options for one generation run.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChangelogConfig {
    /// Range start: a date or a revision token.
    pub after: Option<String>,

    /// Range end: a date or a revision token.
    pub before: Option<String>,

    /// Explicit log file; bypasses the git invocation entirely.
    pub log: Option<PathBuf>,

    /// Replaces the default `git log` pretty/filter arguments.
    pub log_arguments: Option<Vec<String>>,

    /// Output file.
    pub dest: Option<PathBuf>,

    /// Top-level template override.
    #[serde(alias = "templates")]
    pub template: Option<String>,

    /// Partial overrides, merged over the built-in partials key by key.
    #[serde(default)]
    pub partials: HashMap<String, String>,

    /// User-defined sections; replaces the built-in features/fixes pair
    /// entirely when non-empty. Order is the match order.
    #[serde(default)]
    pub sections: Vec<SectionPattern>,

    /// Overrides just the built-in feature pattern.
    pub feature_regex: Option<String>,

    /// Overrides just the built-in fix pattern.
    pub fix_regex: Option<String>,

    /// How overlapping section patterns are arbitrated.
    pub match_strategy: Option<MatchStrategy>,

    /// `prepend` or `append`; absent means overwrite.
    pub insert_type: Option<String>,

    /// Header text whose first line doubles as a dedup marker.
    pub file_header: Option<String>,
}

/// One user-defined section: a name and its matching pattern.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionPattern {
    /// Section name, referenced from templates.
    pub name: String,
    /// Regular expression recognizing this section's commit lines.
    pub pattern: String,
}

/// Fully-resolved settings for one run, with patterns and templates compiled.
#[derive(Debug)]
pub struct RunSettings {
    /// Raw `after` endpoint, still to be range-resolved.
    pub after: Option<String>,
    /// Raw `before` endpoint, still to be range-resolved.
    pub before: Option<String>,
    /// Where the raw log text comes from.
    pub source: LogSource,
    /// Output file.
    pub dest: PathBuf,
    /// Compiled section patterns, in match order.
    pub specs: Vec<SectionSpec>,
    /// Active matching discipline.
    pub strategy: MatchStrategy,
    /// Templates for this run.
    pub templates: TemplateSet,
    /// How to combine with existing destination content.
    pub insert: InsertMode,
    /// Optional file header.
    pub header: Option<String>,
}

impl ChangelogConfig {
    /// Loads a configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: ChangelogConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Shallow merge: keys set in `overrides` replace this configuration's,
    /// absent keys keep their current value. Partials merge key by key;
    /// sections replace wholesale, since their order is part of their
    /// meaning.
    pub fn overlay(self, overrides: Self) -> Self {
        let mut partials = self.partials;
        partials.extend(overrides.partials);

        Self {
            after: overrides.after.or(self.after),
            before: overrides.before.or(self.before),
            log: overrides.log.or(self.log),
            log_arguments: overrides.log_arguments.or(self.log_arguments),
            dest: overrides.dest.or(self.dest),
            template: overrides.template.or(self.template),
            partials,
            sections: if overrides.sections.is_empty() {
                self.sections
            } else {
                overrides.sections
            },
            feature_regex: overrides.feature_regex.or(self.feature_regex),
            fix_regex: overrides.fix_regex.or(self.fix_regex),
            match_strategy: overrides.match_strategy.or(self.match_strategy),
            insert_type: overrides.insert_type.or(self.insert_type),
            file_header: overrides.file_header.or(self.file_header),
        }
    }

    /// Compiles this configuration into runtime settings.
    ///
    /// Bad patterns and bad insert types surface here, before any log is
    /// fetched or file touched. Malformed templates are caught by the
    /// renderer, which is still before the destination is read.
    pub fn resolve(&self) -> Result<RunSettings, ChangelogError> {
        let specs = if self.sections.is_empty() {
            let feature = self
                .feature_regex
                .as_deref()
                .unwrap_or(DEFAULT_FEATURE_PATTERN);
            let fix = self.fix_regex.as_deref().unwrap_or(DEFAULT_FIX_PATTERN);

            vec![
                SectionSpec::new("features", feature)?,
                SectionSpec::new("fixes", fix)?,
            ]
        } else {
            self.sections
                .iter()
                .map(|section| SectionSpec::new(&section.name, &section.pattern))
                .collect::<Result<Vec<_>, _>>()?
        };

        let source = match &self.log {
            Some(path) => LogSource::ExplicitFile(path.clone()),
            None => LogSource::GitCli {
                extra_arguments: self.log_arguments.clone(),
            },
        };

        Ok(RunSettings {
            after: self.after.clone(),
            before: self.before.clone(),
            source,
            dest: self
                .dest
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DEST)),
            specs,
            strategy: self.match_strategy.unwrap_or_default(),
            templates: TemplateSet::with_overrides(self.template.clone(), self.partials.clone()),
            insert: InsertMode::parse(self.insert_type.as_deref())?,
            header: self.file_header.clone(),
        })
    }
}
