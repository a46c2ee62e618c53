//! Range resolution — decides whether a run is date-based or revision-based.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use std::sync::OnceLock;

/// Symbolic token for the current head revision.
pub const HEAD_TOKEN: &str = "HEAD";

/// Number of days covered by a run when no `after` endpoint is given.
const DEFAULT_WINDOW_DAYS: i64 = 7;

/// A fully-resolved commit range for one generation run.
///
/// The mode is decided once during resolution and never changes for the
/// duration of the run.
#[derive(Debug, Clone, PartialEq)]
pub enum Range {
    /// Calendar interval; both endpoints are concrete instants.
    Date {
        /// Lower bound (inclusive).
        after: DateTime<Local>,
        /// Upper bound (inclusive).
        before: DateTime<Local>,
    },
    /// Revision interval; both endpoints are opaque revision tokens
    /// (tags, commit ids, symbolic refs).
    Revision {
        /// Older endpoint (exclusive, `A` in `A..B`).
        after: String,
        /// Newer endpoint (`B` in `A..B`).
        before: String,
    },
}

impl Range {
    /// Resolves the requested endpoints into a concrete range.
    ///
    /// With no `after` the run covers the last week regardless of any
    /// supplied `before`-only value's type. An `after` that parses as a
    /// calendar date selects date mode; anything else is treated as a
    /// revision token. A version tag like `1.2.3` or `v1.2.0` is always a
    /// revision token, even though a lenient date parser might accept it,
    /// so the tag check runs before any date parsing.
    pub fn resolve(after: Option<&str>, before: Option<&str>) -> Self {
        Self::resolve_at(after, before, Local::now())
    }

    /// Range resolution with an explicit notion of "now", for tests.
    pub fn resolve_at(after: Option<&str>, before: Option<&str>, now: DateTime<Local>) -> Self {
        let Some(after_raw) = after else {
            return Range::Date {
                after: now - Duration::days(DEFAULT_WINDOW_DAYS),
                before: before.and_then(parse_date).unwrap_or(now),
            };
        };

        if !is_version_tag(after_raw) {
            if let Some(after_date) = parse_date(after_raw) {
                return Range::Date {
                    after: after_date,
                    before: before.and_then(parse_date).unwrap_or(now),
                };
            }
        }

        // Not a date, so the value is a commit sha, tag, or symbolic ref.
        Range::Revision {
            after: after_raw.to_string(),
            before: before.unwrap_or(HEAD_TOKEN).to_string(),
        }
    }
}

/// Checks whether a value looks like a semantic-version tag.
#[allow(clippy::expect_used)]
fn is_version_tag(value: &str) -> bool {
    static VERSION_TAG: OnceLock<Regex> = OnceLock::new();
    let re = VERSION_TAG.get_or_init(|| {
        Regex::new(r"^v?\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?(?:\+[0-9A-Za-z.-]+)?$")
            .expect("version tag pattern is valid")
    });
    re.is_match(value)
}

/// Parses a calendar date or datetime string into a local instant.
///
/// Accepts `YYYY-MM-DD` (midnight local time), `YYYY-MM-DD HH:MM:SS`, and
/// RFC 3339 timestamps.
fn parse_date(value: &str) -> Option<DateTime<Local>> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Local.from_local_datetime(&midnight).single();
    }

    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Local.from_local_datetime(&datetime).single();
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}
