//! Tracker settings shared by retrieval, triage and filing
//!
//! One immutable value carries everything that identifies "our" records in
//! the tracker: project, issue type, labels, the field projection requested
//! from searches and the transition used to reopen a record.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Fields requested from every search
pub const DEFAULT_FIELDS: [&str; 8] = [
    "id",
    "key",
    "created",
    "status",
    "labels",
    "summary",
    "description",
    "environment",
];

/// Identifies and shapes the records triage reads and writes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    pub project_key: String,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub summary_prefix: String,
    pub reopen_transition_id: String,
    pub fields: Vec<String>,
    pub open_statuses: Vec<String>,
    pub max_pages: usize,
    pub description_delimiter: String,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            project_key: "HAMISTIRF".to_string(),
            issue_type: "Bevinding".to_string(),
            labels: vec!["Beheer".to_string()],
            summary_prefix: "HaMIS Exception".to_string(),
            reopen_transition_id: "3".to_string(),
            fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
            open_statuses: vec![
                "Open".to_string(),
                "In Progress".to_string(),
                "Reopened".to_string(),
            ],
            max_pages: 50,
            description_delimiter: "{noformat}".to_string(),
        }
    }
}

/// Quote a value for use inside a single-quoted JQL literal
pub fn escape_jql_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '\'') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl TrackerSettings {
    pub fn validate(&self) -> Result<()> {
        if self.project_key.trim().is_empty() {
            return Err(Error::configuration("project key cannot be empty"));
        }
        if self.issue_type.trim().is_empty() {
            return Err(Error::configuration("issue type cannot be empty"));
        }
        if self.description_delimiter.is_empty() {
            return Err(Error::configuration("description delimiter cannot be empty"));
        }
        if self.max_pages == 0 {
            return Err(Error::configuration("max pages must be at least 1"));
        }
        Ok(())
    }

    /// Query for records whose summary contains `summary`
    pub fn duplicate_search_query(&self, summary: &str) -> String {
        format!(
            "project={}&issuetype={}&summary ~ '{}'",
            self.project_key,
            self.issue_type,
            escape_jql_literal(summary)
        )
    }

    /// Query for records still being worked on
    pub fn open_issues_query(&self) -> String {
        let statuses: Vec<String> = self
            .open_statuses
            .iter()
            .map(|status| {
                if status.contains(char::is_whitespace) {
                    format!("\"{}\"", status)
                } else {
                    status.clone()
                }
            })
            .collect();

        format!(
            "project={}&status in ({})&issuetype={}",
            self.project_key,
            statuses.join(","),
            self.issue_type
        )
    }

    /// Title of a newly filed record
    pub fn issue_summary(&self, summary: &str) -> String {
        format!("{}: {}", self.summary_prefix, summary)
    }

    /// Body of a newly filed record, embedding the printed stacktrace
    pub fn issue_description(&self, summary: &str, details: &str, stacktrace: &str) -> String {
        format!(
            "{}\n\nDetails:\n{}\n\nStacktrace:\n{delim}{}{delim}",
            summary,
            details,
            stacktrace,
            delim = self.description_delimiter
        )
    }
}
