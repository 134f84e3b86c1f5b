//! Paginated retrieval of candidate records
//!
//! The tracker decides the page size: every response declares `maxResults`
//! and `total`, and the next page starts at `startAt + maxResults` until the
//! declared total is covered. Pages are concatenated in ascending offset
//! order. A failed page aborts the whole retrieval.

use crate::{
    contract::{IssueTracker, SearchRequest},
    Error, Result,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use triage_core::{IssueRecord, TrackerSettings};

/// Collects every record whose summary contains a given text
pub struct CandidateRetriever {
    tracker: Arc<dyn IssueTracker>,
    settings: Arc<TrackerSettings>,
}

impl CandidateRetriever {
    pub fn new(tracker: Arc<dyn IssueTracker>, settings: Arc<TrackerSettings>) -> Self {
        Self { tracker, settings }
    }

    /// All records matching `summary`, in the tracker's result order
    pub async fn retrieve(&self, summary: &str) -> Result<Vec<IssueRecord>> {
        let jql = self.settings.duplicate_search_query(summary);
        let mut records = Vec::new();
        let mut start_at = 0;
        let mut declared_total = 0;

        for page_number in 1..=self.settings.max_pages {
            let request = SearchRequest::new(jql.as_str(), start_at, &self.settings.fields);
            let page = self.tracker.search(&request).await?;
            declared_total = page.total;

            debug!(
                "Page {} at offset {}: {} issues (maxResults {}, total {})",
                page_number,
                start_at,
                page.issues.len(),
                page.max_results,
                page.total
            );

            let page_was_empty = page.issues.is_empty();
            records.extend(page.issues.into_iter().map(IssueRecord::from));

            let next_start = match start_at.checked_add(page.max_results) {
                Some(next_start) => next_start,
                None => {
                    warn!(
                        "Tracker page size {} at offset {} overflows; stopping with {}",
                        page.max_results,
                        start_at,
                        records.len()
                    );
                    return Ok(records);
                }
            };
            if page.total <= next_start {
                info!("Retrieved {} candidate issues for {:?}", records.len(), summary);
                return Ok(records);
            }

            if page.max_results == 0 || page_was_empty {
                warn!(
                    "Tracker declared {} results but page at offset {} was empty; stopping with {}",
                    page.total,
                    start_at,
                    records.len()
                );
                return Ok(records);
            }

            start_at = next_start;
        }

        Err(Error::PaginationLimit {
            pages: self.settings.max_pages,
            total: declared_total,
        })
    }
}
