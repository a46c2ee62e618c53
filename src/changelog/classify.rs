//! Line classification — splits raw log text into named change sections.

use regex::{Regex, RegexBuilder};

use crate::changelog::error::ChangelogError;

/// A named change category with its matching pattern.
///
/// Section order matters: under [`MatchStrategy::FirstMatchWins`] the first
/// section whose pattern matches a line claims it.
#[derive(Debug, Clone)]
pub struct SectionSpec {
    /// Section name, used as the data key during rendering.
    pub name: String,
    /// Compiled matcher for commit lines belonging to this section.
    pub pattern: Regex,
}

impl SectionSpec {
    /// Compiles a section pattern, case-insensitive and multi-line to match
    /// the way changelog patterns have historically been authored.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, ChangelogError> {
        let compiled = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .build()
            .map_err(|e| {
                ChangelogError::Configuration(format!("invalid section pattern: {e}"))
            })?;

        Ok(Self {
            name: name.into(),
            pattern: compiled,
        })
    }
}

/// How overlapping section patterns are arbitrated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStrategy {
    /// Each pattern makes its own pass over the whole text; a line may land
    /// in several sections.
    #[default]
    Independent,
    /// Line-by-line, sections tested in configured order; the first match
    /// claims the line and no later section sees it.
    FirstMatchWins,
}

/// Changes extracted from one log, keyed by section name.
///
/// Preserves section configuration order and, within a section, the order of
/// appearance in the raw log. Every configured section is present even when
/// it matched nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedChanges {
    sections: Vec<(String, Vec<String>)>,
}

impl ClassifiedChanges {
    /// Returns the entries for a section, or `None` for an unconfigured name.
    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.sections
            .iter()
            .find(|(section, _)| section == name)
            .map(|(_, entries)| entries.as_slice())
    }

    /// Iterates sections in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .iter()
            .map(|(name, entries)| (name.as_str(), entries.as_slice()))
    }
}

/// Classifies raw log text into per-section change lists.
pub fn classify(
    raw_text: &str,
    specs: &[SectionSpec],
    strategy: MatchStrategy,
) -> ClassifiedChanges {
    let mut sections: Vec<(String, Vec<String>)> = specs
        .iter()
        .map(|spec| (spec.name.clone(), Vec::new()))
        .collect();

    match strategy {
        MatchStrategy::Independent => {
            for (i, spec) in specs.iter().enumerate() {
                for captures in spec.pattern.captures_iter(raw_text) {
                    sections[i].1.push(concat_groups(&captures));
                }
            }
        }
        MatchStrategy::FirstMatchWins => {
            for line in raw_text.lines() {
                for (i, spec) in specs.iter().enumerate() {
                    if let Some(captures) = spec.pattern.captures(line) {
                        sections[i].1.push(concat_groups(&captures));
                        break;
                    }
                }
            }
        }
    }

    ClassifiedChanges { sections }
}

/// Concatenates all capture groups of a match and trims the result.
///
/// Groups that did not participate contribute nothing. The whole match
/// (group 0) is never used, so a pattern with no capture groups yields an
/// empty entry per match: the match still counts, its text does not.
fn concat_groups(captures: &regex::Captures<'_>) -> String {
    let mut change = String::new();
    for group in captures.iter().skip(1).flatten() {
        change.push_str(group.as_str());
    }

    change.trim().to_string()
}
