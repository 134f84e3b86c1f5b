//! Tracked records and triage decisions

use crate::stacktrace::PrintedStacktrace;
use serde::{Deserialize, Serialize};

/// An existing record in the issue tracker, as far as triage cares
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueRecord {
    pub key: String,
    pub status: String,
    pub summary: Option<String>,
    pub environment: Option<String>,
    pub description: Option<String>,
}

impl IssueRecord {
    pub fn new<K: Into<String>, S: Into<String>>(key: K, status: S) -> Self {
        Self {
            key: key.into(),
            status: status.into(),
            ..Default::default()
        }
    }

    pub fn with_description<S: Into<String>>(mut self, description: S) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_environment<S: Into<String>>(mut self, environment: S) -> Self {
        self.environment = Some(environment.into());
        self
    }

    /// The stacktrace embedded between the first two delimiters of the description.
    ///
    /// Descriptions edited by hand may lose a delimiter; those yield an empty trace.
    pub fn embedded_stacktrace(&self, delimiter: &str) -> PrintedStacktrace {
        let description = self.description.as_deref().unwrap_or_default();
        if delimiter.is_empty() {
            return PrintedStacktrace::default();
        }

        let mut blocks = description.split(delimiter);
        match (blocks.next(), blocks.next(), blocks.next()) {
            (Some(_), Some(trace), Some(_)) => PrintedStacktrace::from_text(trace),
            _ => PrintedStacktrace::default(),
        }
    }

    /// Closed and resolved records must be reopened when the defect recurs
    pub fn is_closed_or_resolved(&self) -> bool {
        self.status.eq_ignore_ascii_case("closed") || self.status.eq_ignore_ascii_case("resolved")
    }
}

/// Result of triaging one report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum MatchDecision {
    /// The report repeats a tracked defect
    Duplicate {
        target_key: String,
        prior_annotation: Option<String>,
        is_closed_or_resolved: bool,
    },
    /// No tracked record matches
    New,
}

impl MatchDecision {
    /// Build a duplicate decision pointing at `record`
    pub fn duplicate_of(record: &IssueRecord) -> Self {
        Self::Duplicate {
            target_key: record.key.clone(),
            prior_annotation: record.environment.clone(),
            is_closed_or_resolved: record.is_closed_or_resolved(),
        }
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::Duplicate { .. })
    }
}
