//! In-memory issue tracker for tests
//!
//! Every stored record is assumed to match every search; paging, failures
//! and inconsistent totals can be configured per test.

use crate::{
    contract::{CreateIssueRequest, CreatedIssue, IssueTracker, SearchPage, SearchRequest, TrackerIssue},
    Error, Result,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use triage_core::IssueRecord;

#[derive(Default)]
struct TrackerState {
    records: Vec<IssueRecord>,
    searches: Vec<SearchRequest>,
    created: Vec<CreateIssueRequest>,
    updates: Vec<(String, String)>,
    transitions: Vec<(String, String)>,
}

pub struct InMemoryTracker {
    state: Mutex<TrackerState>,
    page_size: u64,
    declared_total: Option<u64>,
    search_failure: Option<(u64, u16)>,
    write_failure: Option<u16>,
    transition_status: u16,
}

impl Default for InMemoryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState::default()),
            page_size: 50,
            declared_total: None,
            search_failure: None,
            write_failure: None,
            transition_status: 204,
        }
    }

    pub fn with_records(records: Vec<IssueRecord>) -> Self {
        let tracker = Self::new();
        tracker.state.lock().records = records;
        tracker
    }

    pub fn page_size(mut self, page_size: u64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Report this total regardless of the stored records
    pub fn declared_total(mut self, total: u64) -> Self {
        self.declared_total = Some(total);
        self
    }

    pub fn fail_search_at(mut self, start_at: u64, status_code: u16) -> Self {
        self.search_failure = Some((start_at, status_code));
        self
    }

    pub fn fail_writes(mut self, status_code: u16) -> Self {
        self.write_failure = Some(status_code);
        self
    }

    pub fn transition_status(mut self, status_code: u16) -> Self {
        self.transition_status = status_code;
        self
    }

    pub fn records(&self) -> Vec<IssueRecord> {
        self.state.lock().records.clone()
    }

    pub fn search_requests(&self) -> Vec<SearchRequest> {
        self.state.lock().searches.clone()
    }

    pub fn search_offsets(&self) -> Vec<u64> {
        self.state.lock().searches.iter().map(|r| r.start_at).collect()
    }

    pub fn created(&self) -> Vec<CreateIssueRequest> {
        self.state.lock().created.clone()
    }

    pub fn updates(&self) -> Vec<(String, String)> {
        self.state.lock().updates.clone()
    }

    pub fn transitions(&self) -> Vec<(String, String)> {
        self.state.lock().transitions.clone()
    }
}

#[async_trait]
impl IssueTracker for InMemoryTracker {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage> {
        let mut state = self.state.lock();
        state.searches.push(request.clone());

        if let Some((start_at, status_code)) = self.search_failure {
            if start_at == request.start_at {
                return Err(Error::RetrievalFailed { status_code });
            }
        }

        let total = state.records.len() as u64;
        let start = (request.start_at.min(total)) as usize;
        let end = (request.start_at + self.page_size).min(total) as usize;
        let issues = state.records[start..end].iter().map(TrackerIssue::from).collect();

        Ok(SearchPage {
            start_at: request.start_at,
            max_results: self.page_size,
            total: self.declared_total.unwrap_or(total),
            issues,
        })
    }

    async fn create_issue(&self, request: &CreateIssueRequest) -> Result<CreatedIssue> {
        if let Some(status_code) = self.write_failure {
            return Err(Error::WriteFailed { status_code });
        }

        let mut state = self.state.lock();
        let key = format!(
            "{}-{}",
            request.fields.project.key,
            100 + state.created.len()
        );
        state.created.push(request.clone());
        state.records.push(IssueRecord {
            key: key.clone(),
            status: "Open".to_string(),
            summary: Some(request.fields.summary.clone()),
            environment: None,
            description: Some(request.fields.description.clone()),
        });

        Ok(CreatedIssue {
            id: None,
            key,
            self_url: None,
        })
    }

    async fn update_environment(&self, key: &str, environment: &str) -> Result<()> {
        if let Some(status_code) = self.write_failure {
            return Err(Error::WriteFailed { status_code });
        }

        let mut state = self.state.lock();
        state.updates.push((key.to_string(), environment.to_string()));
        if let Some(record) = state.records.iter_mut().find(|r| r.key == key) {
            record.environment = Some(environment.to_string());
        }
        Ok(())
    }

    async fn transition(&self, key: &str, transition_id: &str) -> Result<u16> {
        let mut state = self.state.lock();
        state
            .transitions
            .push((key.to_string(), transition_id.to_string()));
        if self.transition_status < 300 {
            if let Some(record) = state.records.iter_mut().find(|r| r.key == key) {
                record.status = "Reopened".to_string();
            }
        }
        Ok(self.transition_status)
    }
}
