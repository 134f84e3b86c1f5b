//! Occurrence annotation kept on tracked records
//!
//! Repeat occurrences are recorded on the tracked record itself, in a free
//! text field shared with people who may edit it by hand:
//!
//! ```text
//! Count: 5
//! Last: 2024-03-01 09:15:02.123456
//! ```
//!
//! Anything that cannot be read back counts as a first occurrence.

use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";

fn count_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?i)^.*count:\s+([0-9]+)").expect("static pattern is valid"))
}

fn last_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?im)^last:\s*(.+?)\s*$").expect("static pattern is valid"))
}

/// How often a defect was reported and when it was last seen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceAnnotation {
    pub count: u64,
    pub last_seen: Option<NaiveDateTime>,
}

impl OccurrenceAnnotation {
    /// Read the count stored in a prior annotation, if it has one
    pub fn prior_count(text: Option<&str>) -> Option<u64> {
        let text = text.filter(|t| !t.is_empty())?;
        let captures = count_pattern().captures(text)?;
        match captures[1].parse() {
            Ok(count) => Some(count),
            Err(e) => {
                debug!("Ignoring unreadable occurrence count {:?}: {}", &captures[1], e);
                None
            }
        }
    }

    /// Parse a stored annotation; `None` when no count can be read
    pub fn parse(text: &str) -> Option<Self> {
        let count = Self::prior_count(Some(text))?;
        let last_seen = last_pattern()
            .captures(text)
            .and_then(|c| NaiveDateTime::parse_from_str(&c[1], "%Y-%m-%d %H:%M:%S%.f").ok());
        Some(Self { count, last_seen })
    }

    /// Successor of a prior annotation, stamped with the current local time
    pub fn next(prior: Option<&str>) -> Self {
        Self::next_at(prior, Local::now().naive_local())
    }

    /// Successor of a prior annotation, stamped with `now`
    pub fn next_at(prior: Option<&str>, now: NaiveDateTime) -> Self {
        let count = Self::prior_count(prior)
            .map(|count| count.saturating_add(1))
            .unwrap_or(1);
        Self {
            count,
            last_seen: Some(now),
        }
    }
}

impl fmt::Display for OccurrenceAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Count: {}\nLast: ", self.count)?;
        if let Some(last_seen) = self.last_seen {
            write!(f, "{}", last_seen.format(TIMESTAMP_FORMAT))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_micro_opt(hour, 15, 2, 123456)
            .unwrap()
    }

    #[test]
    fn test_increments_prior_count() {
        let next = OccurrenceAnnotation::next_at(Some("Count: 4\nLast: 2023-01-01"), at(9));
        assert_eq!(next.count, 5);
        assert_eq!(next.to_string(), "Count: 5\nLast: 2024-03-01 09:15:02.123456");
    }

    #[test]
    fn test_absent_or_garbled_prior_starts_at_one() {
        for prior in [None, Some(""), Some("Production, JDK 8"), Some("Count:4"), Some("Count: many")] {
            assert_eq!(OccurrenceAnnotation::next_at(prior, at(9)).count, 1, "prior {:?}", prior);
        }
    }

    #[test]
    fn test_count_is_case_insensitive_with_leading_text() {
        assert_eq!(OccurrenceAnnotation::prior_count(Some("seen COUNT:   12")), Some(12));
        assert_eq!(OccurrenceAnnotation::prior_count(Some("count:\t3\nLast: x")), Some(3));
    }

    #[test]
    fn test_count_must_be_on_first_line() {
        assert_eq!(OccurrenceAnnotation::prior_count(Some("Windows 10\nCount: 7")), None);
    }

    #[test]
    fn test_count_digits_are_ascii_only() {
        assert_eq!(OccurrenceAnnotation::prior_count(Some("Count: \u{0663}")), None);
        assert_eq!(OccurrenceAnnotation::next_at(Some("Count: \u{0663}"), at(9)).count, 1);
        assert_eq!(OccurrenceAnnotation::prior_count(Some("Count: 3")), Some(3));
    }

    #[test]
    fn test_overflowing_count_is_ignored() {
        let prior = "Count: 99999999999999999999999";
        assert_eq!(OccurrenceAnnotation::prior_count(Some(prior)), None);
        assert_eq!(OccurrenceAnnotation::next_at(Some(prior), at(1)).count, 1);
    }

    #[test]
    fn test_parse_round_trip() {
        let annotation = OccurrenceAnnotation::next_at(Some("Count: 9"), at(14));
        let parsed = OccurrenceAnnotation::parse(&annotation.to_string()).unwrap();
        assert_eq!(parsed, annotation);

        let again = OccurrenceAnnotation::next_at(Some(&annotation.to_string()), at(15));
        assert_eq!(again.count, annotation.count + 1);
    }

    #[test]
    fn test_parse_without_timestamp() {
        let parsed = OccurrenceAnnotation::parse("Count: 2\nLast: sometime").unwrap();
        assert_eq!(parsed.count, 2);
        assert!(parsed.last_seen.is_none());
        assert!(OccurrenceAnnotation::parse("nothing here").is_none());
    }
}
