//! Template rendering — expands classified changes into the final document.
//!
//! The template language is a small, fixed subset of the usual logic-template
//! dialect: `{{> name}}` partial dispatch, `{{#if section}}…{{else}}…{{/if}}`
//! conditioned on a section being non-empty, `{{#each section}}…{{/each}}`
//! iteration, `{{this}}` (escaped) and `{{{this}}}` (literal) item output,
//! and a `{{date}}` field carrying the run date. Nothing else is supported;
//! a renderer is built per run and no template state outlives it.

use std::collections::HashMap;

use chrono::{DateTime, Local};

use crate::changelog::classify::ClassifiedChanges;
use crate::changelog::error::ChangelogError;

/// Default top-level template.
pub const DEFAULT_TEMPLATE: &str = "{{> features}}{{> fixes}}";

/// Built-in partials, overridable key by key.
const DEFAULT_PARTIALS: &[(&str, &str)] = &[
    (
        "features",
        "New features:\n\n{{#if features}}{{#each features}}{{> feature}}{{/each}}{{else}}{{> empty}}{{/if}}\n",
    ),
    ("feature", "  - {{{this}}}\n"),
    (
        "fixes",
        "Bug fixes:\n\n{{#if fixes}}{{#each fixes}}{{> fix}}{{/each}}{{else}}{{> empty}}{{/if}}\n",
    ),
    ("fix", "  - {{{this}}}\n"),
    ("empty", "  (none)\n\n"),
];

/// A top-level template plus its named partials.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    /// The document template.
    pub root: String,
    /// Partial name to partial template source.
    pub partials: HashMap<String, String>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self {
            root: DEFAULT_TEMPLATE.to_string(),
            partials: DEFAULT_PARTIALS
                .iter()
                .map(|(name, source)| ((*name).to_string(), (*source).to_string()))
                .collect(),
        }
    }
}

impl TemplateSet {
    /// Builds a template set from the defaults with user overrides applied.
    ///
    /// Partials merge key by key: a user supplying only `feature` keeps the
    /// default `features`, `fixes`, `fix`, and `empty` partials.
    pub fn with_overrides(
        template: Option<String>,
        partials: HashMap<String, String>,
    ) -> Self {
        let mut set = Self::default();

        if let Some(template) = template {
            set.root = template;
        }
        for (name, source) in partials {
            set.partials.insert(name, source);
        }

        set
    }
}

/// A parsed template node.
#[derive(Debug, Clone)]
enum Node {
    Text(String),
    /// `{{path}}` or `{{{path}}}`; `escape` distinguishes the two.
    Variable { path: String, escape: bool },
    /// `{{> name}}`.
    Partial(String),
    /// `{{#if section}}…{{else}}…{{/if}}`.
    If {
        section: String,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    /// `{{#each section}}…{{/each}}`.
    Each { section: String, body: Vec<Node> },
}

/// Renders one run's classified changes against one template set.
pub struct Renderer<'a> {
    changes: &'a ClassifiedChanges,
    partials: HashMap<String, Vec<Node>>,
    root: Vec<Node>,
    date: String,
}

impl<'a> Renderer<'a> {
    /// Parses the template set and binds it to this run's data.
    ///
    /// A syntactically invalid template or partial is rejected here, before
    /// anything is rendered.
    pub fn new(
        set: &TemplateSet,
        changes: &'a ClassifiedChanges,
        resolved_at: DateTime<Local>,
    ) -> Result<Self, ChangelogError> {
        let root = parse(&set.root)?;

        let mut partials = HashMap::new();
        for (name, source) in &set.partials {
            partials.insert(name.clone(), parse(source)?);
        }

        Ok(Self {
            changes,
            partials,
            root,
            date: resolved_at.format("%Y-%m-%d").to_string(),
        })
    }

    /// Produces the fully expanded document.
    pub fn render(&self) -> Result<String, ChangelogError> {
        let mut out = String::new();
        self.eval(&self.root, None, &mut out)?;
        Ok(out)
    }

    fn eval(
        &self,
        nodes: &[Node],
        item: Option<&str>,
        out: &mut String,
    ) -> Result<(), ChangelogError> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable { path, escape } => {
                    let value = self.lookup(path, item);
                    if *escape {
                        out.push_str(&escape_html(&value));
                    } else {
                        out.push_str(&value);
                    }
                }
                Node::Partial(name) => {
                    let partial = self.partials.get(name).ok_or_else(|| {
                        ChangelogError::Configuration(format!(
                            "template references undeclared partial '{name}'"
                        ))
                    })?;
                    self.eval(partial, item, out)?;
                }
                Node::If {
                    section,
                    then_branch,
                    else_branch,
                } => {
                    let non_empty = self
                        .changes
                        .get(section)
                        .is_some_and(|entries| !entries.is_empty());
                    if non_empty {
                        self.eval(then_branch, item, out)?;
                    } else {
                        self.eval(else_branch, item, out)?;
                    }
                }
                Node::Each { section, body } => {
                    for entry in self.changes.get(section).unwrap_or(&[]) {
                        self.eval(body, Some(entry), out)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Resolves a variable path against the current context.
    ///
    /// `this` is the current iteration item; `date` and `this.date` are the
    /// run's resolution date. Anything else renders as empty, matching the
    /// usual logic-template tolerance for absent fields.
    fn lookup(&self, path: &str, item: Option<&str>) -> String {
        match path {
            "this" => item.unwrap_or_default().to_string(),
            "date" | "this.date" => self.date.clone(),
            _ => String::new(),
        }
    }
}

/// Escapes HTML-significant characters for `{{…}}` output.
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Parses template source into a node list.
fn parse(source: &str) -> Result<Vec<Node>, ChangelogError> {
    let mut cursor = Cursor { source, pos: 0 };
    let (nodes, terminator) = parse_nodes(&mut cursor)?;

    if let Some(tag) = terminator {
        return Err(ChangelogError::Configuration(format!(
            "unexpected closing tag '{{{{{tag}}}}}' in template"
        )));
    }

    Ok(nodes)
}

struct Cursor<'s> {
    source: &'s str,
    pos: usize,
}

/// Parses nodes until a block terminator (`else`, `/if`, `/each`) or the end
/// of input. Returns the consumed terminator, if any; the caller decides
/// whether it was expected.
fn parse_nodes(cursor: &mut Cursor<'_>) -> Result<(Vec<Node>, Option<String>), ChangelogError> {
    let mut nodes = Vec::new();

    loop {
        let rest = &cursor.source[cursor.pos..];
        let Some(open) = rest.find("{{") else {
            if !rest.is_empty() {
                nodes.push(Node::Text(rest.to_string()));
                cursor.pos = cursor.source.len();
            }
            return Ok((nodes, None));
        };

        if open > 0 {
            nodes.push(Node::Text(rest[..open].to_string()));
        }
        cursor.pos += open;

        let (tag, escape) = read_tag(cursor)?;
        let tag = tag.trim();

        if let Some(name) = tag.strip_prefix('>') {
            nodes.push(Node::Partial(name.trim().to_string()));
        } else if let Some(section) = tag.strip_prefix("#if") {
            nodes.push(parse_if(cursor, section.trim())?);
        } else if let Some(section) = tag.strip_prefix("#each") {
            nodes.push(parse_each(cursor, section.trim())?);
        } else if tag == "else" || tag == "/if" || tag == "/each" {
            return Ok((nodes, Some(tag.to_string())));
        } else {
            nodes.push(Node::Variable {
                path: tag.to_string(),
                escape,
            });
        }
    }
}

fn parse_if(cursor: &mut Cursor<'_>, section: &str) -> Result<Node, ChangelogError> {
    if section.is_empty() {
        return Err(ChangelogError::Configuration(
            "'#if' block is missing a section name".to_string(),
        ));
    }

    let (then_branch, terminator) = parse_nodes(cursor)?;
    let (else_branch, terminator) = match terminator.as_deref() {
        Some("else") => {
            let (else_branch, terminator) = parse_nodes(cursor)?;
            (else_branch, terminator)
        }
        _ => (Vec::new(), terminator),
    };

    if terminator.as_deref() != Some("/if") {
        return Err(ChangelogError::Configuration(format!(
            "unclosed '#if {section}' block in template"
        )));
    }

    Ok(Node::If {
        section: section.to_string(),
        then_branch,
        else_branch,
    })
}

fn parse_each(cursor: &mut Cursor<'_>, section: &str) -> Result<Node, ChangelogError> {
    if section.is_empty() {
        return Err(ChangelogError::Configuration(
            "'#each' block is missing a section name".to_string(),
        ));
    }

    let (body, terminator) = parse_nodes(cursor)?;
    if terminator.as_deref() != Some("/each") {
        return Err(ChangelogError::Configuration(format!(
            "unclosed '#each {section}' block in template"
        )));
    }

    Ok(Node::Each {
        section: section.to_string(),
        body,
    })
}

/// Reads the tag body at the cursor, which must sit on `{{`.
///
/// Returns the inner text and whether output should be escaped (`{{…}}`)
/// rather than literal (`{{{…}}}`).
fn read_tag(cursor: &mut Cursor<'_>) -> Result<(String, bool), ChangelogError> {
    let rest = &cursor.source[cursor.pos..];

    let (prefix, suffix, escape) = if rest.starts_with("{{{") {
        ("{{{", "}}}", false)
    } else {
        ("{{", "}}", true)
    };

    let body_start = prefix.len();
    let Some(close) = rest[body_start..].find(suffix) else {
        return Err(ChangelogError::Configuration(
            "unterminated template tag".to_string(),
        ));
    };

    let tag = rest[body_start..body_start + close].to_string();
    cursor.pos += body_start + close + suffix.len();

    Ok((tag, escape))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changelog::classify::{classify, MatchStrategy, SectionSpec};

    fn changes_for(log: &str) -> ClassifiedChanges {
        let specs = vec![
            SectionSpec::new("features", r"^- feature #\d+: ?(.*)$").unwrap(),
            SectionSpec::new("fixes", r"^- fixes #\d+: ?(.*)$").unwrap(),
        ];
        classify(log, &specs, MatchStrategy::Independent)
    }

    fn render(set: &TemplateSet, changes: &ClassifiedChanges) -> Result<String, ChangelogError> {
        Renderer::new(set, changes, Local::now())?.render()
    }

    #[test]
    fn default_templates_render_both_sections() {
        let changes = changes_for("- feature #1: add export\n- fixes #2: crash on save\n");
        let out = render(&TemplateSet::default(), &changes).unwrap();

        assert_eq!(
            out,
            "New features:\n\n  - add export\n\nBug fixes:\n\n  - crash on save\n\n"
        );
    }

    #[test]
    fn empty_log_renders_empty_partial() {
        let changes = changes_for("");
        let out = render(&TemplateSet::default(), &changes).unwrap();

        assert_eq!(
            out,
            "New features:\n\n  (none)\n\n\nBug fixes:\n\n  (none)\n\n\n"
        );
    }

    #[test]
    fn partial_overrides_merge_over_defaults() {
        let mut partials = HashMap::new();
        partials.insert("feature".to_string(), "* {{{this}}}\n".to_string());

        let set = TemplateSet::with_overrides(None, partials);
        let changes = changes_for("- feature #1: add export\n");
        let out = render(&set, &changes).unwrap();

        // The overridden item partial is used; the untouched defaults
        // (section wrapper, fixes, empty) survive.
        assert!(out.contains("* add export\n"));
        assert!(out.contains("Bug fixes:"));
        assert!(out.contains("(none)"));
    }

    #[test]
    fn undeclared_partial_is_a_configuration_error() {
        let set = TemplateSet::with_overrides(Some("{{> missing}}".to_string()), HashMap::new());
        let changes = changes_for("");

        let err = render(&set, &changes);
        assert!(matches!(err, Err(ChangelogError::Configuration(_))));
    }

    #[test]
    fn double_braces_escape_and_triple_braces_do_not() {
        let mut partials = HashMap::new();
        partials.insert(
            "feature".to_string(),
            "{{this}}|{{{this}}}\n".to_string(),
        );

        let set = TemplateSet::with_overrides(None, partials);
        let changes = changes_for("- feature #1: a <b> & 'c'\n");
        let out = render(&set, &changes).unwrap();

        assert!(out.contains("a &lt;b&gt; &amp; &#x27;c&#x27;|a <b> & 'c'\n"));
    }

    #[test]
    fn date_field_is_available_in_both_contexts() {
        let mut partials = HashMap::new();
        partials.insert("feature".to_string(), "- {{this}} ({{this.date}})\n".to_string());

        let set = TemplateSet::with_overrides(
            Some("{{date}}\n{{#each features}}{{> feature}}{{/each}}".to_string()),
            partials,
        );
        let changes = changes_for("- feature #1: add export\n");
        let date = Local::now().format("%Y-%m-%d").to_string();
        let out = render(&set, &changes).unwrap();

        assert!(out.starts_with(&format!("{date}\n")));
        assert!(out.contains(&format!("- add export ({date})\n")));
    }

    #[test]
    fn unclosed_if_is_rejected() {
        let set = TemplateSet::with_overrides(
            Some("{{#if features}}never closed".to_string()),
            HashMap::new(),
        );
        let changes = changes_for("");

        assert!(matches!(
            render(&set, &changes),
            Err(ChangelogError::Configuration(_))
        ));
    }

    #[test]
    fn stray_closing_tag_is_rejected() {
        let set =
            TemplateSet::with_overrides(Some("text {{/each}}".to_string()), HashMap::new());
        let changes = changes_for("");

        assert!(matches!(
            render(&set, &changes),
            Err(ChangelogError::Configuration(_))
        ));
    }

    #[test]
    fn nested_blocks_parse() {
        let set = TemplateSet::with_overrides(
            Some(
                "{{#if features}}{{#if fixes}}both{{else}}features only{{/if}}{{/if}}"
                    .to_string(),
            ),
            HashMap::new(),
        );

        let both = changes_for("- feature #1: a\n- fixes #2: b\n");
        assert_eq!(render(&set, &both).unwrap(), "both");

        let features_only = changes_for("- feature #1: a\n");
        assert_eq!(render(&set, &features_only).unwrap(), "features only");
    }

    #[test]
    fn unknown_variable_renders_empty() {
        let set =
            TemplateSet::with_overrides(Some("a{{bogus}}b".to_string()), HashMap::new());
        let changes = changes_for("");

        assert_eq!(render(&set, &changes).unwrap(), "ab");
    }
}
