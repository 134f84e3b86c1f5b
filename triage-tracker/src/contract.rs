//! Request and response contracts of the issue tracker
//!
//! The shapes follow Jira's REST API (`/rest/api/latest`). Only the fields
//! triage reads or writes are modelled.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use triage_core::{IssueRecord, TrackerSettings};

/// Operations triage needs from an issue tracker
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch one page of search results; non-200 is `RetrievalFailed`
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage>;

    /// Search response body exactly as the tracker sent it
    async fn search_raw(&self, request: &SearchRequest) -> Result<Value> {
        Ok(serde_json::to_value(self.search(request).await?)?)
    }

    /// File a new record; anything but 201 is `WriteFailed`
    async fn create_issue(&self, request: &CreateIssueRequest) -> Result<CreatedIssue>;

    /// Overwrite a record's environment field; anything but 204 is `WriteFailed`
    async fn update_environment(&self, key: &str, environment: &str) -> Result<()>;

    /// Apply a workflow transition, returning the tracker's response status
    async fn transition(&self, key: &str, transition_id: &str) -> Result<u16>;
}

/// Search query with paging offset and field projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub jql: String,
    #[serde(rename = "startAt")]
    pub start_at: u64,
    pub fields: Vec<String>,
}

impl SearchRequest {
    pub fn new<S: Into<String>>(jql: S, start_at: u64, fields: &[String]) -> Self {
        Self {
            jql: jql.into(),
            start_at,
            fields: fields.to_vec(),
        }
    }
}

/// One page of search results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    #[serde(rename = "startAt", default)]
    pub start_at: u64,
    #[serde(rename = "maxResults")]
    pub max_results: u64,
    pub total: u64,
    #[serde(default)]
    pub issues: Vec<TrackerIssue>,
}

/// An issue as returned by search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerIssue {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub status: Option<IssueStatus>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub created: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueStatus {
    pub name: String,
}

impl From<TrackerIssue> for IssueRecord {
    fn from(issue: TrackerIssue) -> Self {
        let fields = issue.fields;
        IssueRecord {
            key: issue.key,
            status: fields.status.map(|s| s.name).unwrap_or_default(),
            summary: fields.summary,
            environment: fields.environment,
            description: fields.description,
        }
    }
}

impl From<&IssueRecord> for TrackerIssue {
    fn from(record: &IssueRecord) -> Self {
        TrackerIssue {
            id: None,
            key: record.key.clone(),
            fields: IssueFields {
                summary: record.summary.clone(),
                description: record.description.clone(),
                environment: record.environment.clone(),
                status: Some(IssueStatus {
                    name: record.status.clone(),
                }),
                labels: Vec::new(),
                created: None,
            },
        }
    }
}

/// Payload for filing a new record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateIssueRequest {
    pub fields: NewIssueFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewIssueFields {
    pub project: ProjectRef,
    pub summary: String,
    pub description: String,
    pub issuetype: IssueTypeRef,
    pub labels: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueTypeRef {
    pub name: String,
}

impl CreateIssueRequest {
    /// Build the create payload for a report's summary, details and stacktrace
    pub fn for_report(settings: &TrackerSettings, summary: &str, details: &str, stacktrace: &str) -> Self {
        Self {
            fields: NewIssueFields {
                project: ProjectRef {
                    key: settings.project_key.clone(),
                },
                summary: settings.issue_summary(summary),
                description: settings.issue_description(summary, details, stacktrace),
                issuetype: IssueTypeRef {
                    name: settings.issue_type.clone(),
                },
                labels: settings.labels.clone(),
            },
        }
    }
}

/// Response to a successful create
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedIssue {
    #[serde(default)]
    pub id: Option<String>,
    pub key: String,
    #[serde(rename = "self", default)]
    pub self_url: Option<String>,
}

/// Body that overwrites the environment field
pub fn environment_update_body(environment: &str) -> Value {
    json!({ "update": { "environment": [{ "set": environment }] } })
}

/// Body that applies a workflow transition
pub fn transition_body(transition_id: &str) -> Value {
    json!({ "transition": { "id": transition_id } })
}
