//! Destination merging — combines rendered text with existing file content.

use crate::changelog::error::ChangelogError;

/// How newly rendered text combines with pre-existing destination content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    /// Replace the destination outright.
    #[default]
    None,
    /// New text goes above the existing content.
    Prepend,
    /// New text goes below the existing content.
    Append,
}

impl InsertMode {
    /// Parses a configured insert type; anything but `prepend`/`append` is a
    /// fatal configuration error, surfaced before any write happens.
    pub fn parse(value: Option<&str>) -> Result<Self, ChangelogError> {
        match value {
            None => Ok(InsertMode::None),
            Some("prepend") => Ok(InsertMode::Prepend),
            Some("append") => Ok(InsertMode::Append),
            Some(other) => Err(ChangelogError::Configuration(format!(
                "'{other}' is not a valid insert type. Use 'prepend' or 'append'."
            ))),
        }
    }
}

/// Merges rendered changelog text with the destination's existing content.
///
/// The optional header's first line doubles as a deduplication marker: when
/// prepending over content that already starts with it, the embedded copy is
/// stripped so the header appears exactly once at the top. The dedup pass
/// removes a single duplicate only; it does not clean up extra header copies
/// introduced by hand-editing.
pub fn merge(
    existing: Option<&str>,
    new_text: &str,
    mode: InsertMode,
    header: Option<&str>,
) -> String {
    // An overwrite discards the existing content, so a header it carried is
    // gone along with it; the first-line comparison only means something when
    // the old content survives into the merged text.
    let existing_first_line = match mode {
        InsertMode::None => None,
        InsertMode::Prepend | InsertMode::Append => {
            existing.and_then(|content| content.lines().next())
        }
    };

    let mut merged = match (mode, existing) {
        (InsertMode::None, _) | (_, None) => new_text.to_string(),
        (InsertMode::Prepend, Some(existing)) => format!("{new_text}\n{existing}"),
        (InsertMode::Append, Some(existing)) => format!("{existing}\n{new_text}"),
    };

    let Some(header) = header else {
        return merged;
    };

    let header_first_line = header.lines().next().unwrap_or_default();

    if existing_first_line != Some(header_first_line) {
        // Fresh or overwritten destination, or one that never had this header.
        return format!("{header}\n\n{merged}");
    }

    if mode == InsertMode::Prepend {
        // The prepend step buried the existing copy of the header in the
        // middle of the document; drop that one copy and re-crown the top.
        let embedded = format!("{header}\n\n");
        merged = merged.replacen(&embedded, "", 1);
        return format!("{header}\n\n{merged}");
    }

    // Append against content already led by the header: assume a prior run
    // placed it correctly.
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "# Changelog\n\nAll notable changes.";

    #[test]
    fn none_mode_ignores_existing_content() {
        let merged = merge(Some("old stuff\n"), "new text\n", InsertMode::None, None);
        assert_eq!(merged, "new text\n");
    }

    #[test]
    fn missing_destination_yields_new_text_for_all_modes() {
        for mode in [InsertMode::None, InsertMode::Prepend, InsertMode::Append] {
            assert_eq!(merge(None, "new\n", mode, None), "new\n");
        }
    }

    #[test]
    fn prepend_puts_new_text_first() {
        let merged = merge(Some("old\n"), "new\n", InsertMode::Prepend, None);
        assert_eq!(merged, "new\n\nold\n");
    }

    #[test]
    fn append_puts_new_text_last() {
        let merged = merge(Some("old\n"), "new\n", InsertMode::Append, None);
        assert_eq!(merged, "old\n\nnew\n");
    }

    #[test]
    fn header_is_added_when_absent() {
        let merged = merge(Some("old\n"), "new\n", InsertMode::Prepend, Some(HEADER));
        assert!(merged.starts_with("# Changelog\n\nAll notable changes.\n\n"));
        assert_eq!(merged.matches("# Changelog").count(), 1);
    }

    #[test]
    fn prepend_deduplicates_existing_header() {
        let existing = format!("{HEADER}\n\nv1 notes\n");
        let merged = merge(
            Some(&existing),
            "v2 notes\n",
            InsertMode::Prepend,
            Some(HEADER),
        );

        assert_eq!(merged.matches("# Changelog").count(), 1);
        assert!(merged.starts_with("# Changelog"));
        // New entries come before the surviving old ones.
        let v2 = merged.find("v2 notes").unwrap();
        let v1 = merged.find("v1 notes").unwrap();
        assert!(v2 < v1);
    }

    #[test]
    fn overwrite_rerun_keeps_header() {
        // The first run's header is discarded with the rest of the old
        // content, so the new document must get its own copy.
        let existing = format!("{HEADER}\n\nv1 notes\n");
        let merged = merge(Some(&existing), "v2 notes\n", InsertMode::None, Some(HEADER));

        assert_eq!(merged, format!("{HEADER}\n\nv2 notes\n"));
    }

    #[test]
    fn append_does_not_reinsert_matching_header() {
        let existing = format!("{HEADER}\n\nv1 notes\n");
        let merged = merge(
            Some(&existing),
            "v2 notes\n",
            InsertMode::Append,
            Some(HEADER),
        );

        assert_eq!(merged.matches("# Changelog").count(), 1);
        assert!(merged.ends_with("v2 notes\n"));
    }

    #[test]
    fn invalid_insert_type_is_a_configuration_error() {
        let err = InsertMode::parse(Some("overwrite"));
        assert!(matches!(err, Err(ChangelogError::Configuration(_))));

        assert_eq!(InsertMode::parse(None).unwrap(), InsertMode::None);
        assert_eq!(
            InsertMode::parse(Some("prepend")).unwrap(),
            InsertMode::Prepend
        );
        assert_eq!(
            InsertMode::parse(Some("append")).unwrap(),
            InsertMode::Append
        );
    }
}
