//! Duplicate detection for incoming exception reports

use crate::{contract::IssueTracker, retriever::CandidateRetriever, Result};
use std::sync::Arc;
use tracing::{debug, info};
use triage_core::{
    ExceptionReport, MatchDecision, PrintedStacktrace, StacktraceMatcher, TrackerSettings,
};

/// Decides whether a report repeats a tracked defect
pub struct TriageEngine {
    retriever: CandidateRetriever,
    matcher: StacktraceMatcher,
    settings: Arc<TrackerSettings>,
}

impl TriageEngine {
    pub fn new(tracker: Arc<dyn IssueTracker>, settings: Arc<TrackerSettings>) -> Self {
        Self::with_matcher(tracker, settings, StacktraceMatcher::default())
    }

    pub fn with_matcher(
        tracker: Arc<dyn IssueTracker>,
        settings: Arc<TrackerSettings>,
        matcher: StacktraceMatcher,
    ) -> Self {
        Self {
            retriever: CandidateRetriever::new(tracker, settings.clone()),
            matcher,
            settings,
        }
    }

    /// Triage a report against the records already in the tracker
    pub async fn triage(&self, report: &ExceptionReport) -> Result<MatchDecision> {
        report.validate()?;
        let stacktrace = PrintedStacktrace::format(report);
        self.triage_printed(report.summary(), &stacktrace).await
    }

    /// Triage an already printed stacktrace whose root cause message is `summary`
    pub async fn triage_printed(
        &self,
        summary: &str,
        stacktrace: &PrintedStacktrace,
    ) -> Result<MatchDecision> {
        let candidates = self.retriever.retrieve(summary).await?;
        debug!("Comparing against {} candidates", candidates.len());

        for candidate in &candidates {
            let candidate_trace = candidate.embedded_stacktrace(&self.settings.description_delimiter);
            let comparison = self.matcher.compare(stacktrace, &candidate_trace);
            if comparison.is_match {
                info!(
                    "Match ratio {:.4} with {} ({})",
                    comparison.ratio, candidate.key, candidate.status
                );
                return Ok(MatchDecision::duplicate_of(candidate));
            }
        }

        debug!("No matching candidate for {:?}", summary);
        Ok(MatchDecision::New)
    }
}
