//! Filing service: acts on triage decisions
//!
//! New defects become new records. Repeats bump the occurrence annotation
//! on the matched record and reopen it when it was already closed or
//! resolved. Nothing is written before the decision is made.

use crate::{
    contract::{CreateIssueRequest, IssueTracker, SearchRequest},
    services::triage::TriageEngine,
    Result,
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};
use triage_core::{
    ExceptionReport, MatchDecision, OccurrenceAnnotation, PrintedStacktrace, TrackerSettings,
};

/// What happened to a report after triage
#[derive(Debug, Clone, PartialEq)]
pub enum FilingOutcome {
    Created {
        key: String,
    },
    Updated {
        key: String,
        annotation: String,
        reopened: bool,
    },
}

impl FilingOutcome {
    pub fn key(&self) -> &str {
        match self {
            FilingOutcome::Created { key } | FilingOutcome::Updated { key, .. } => key,
        }
    }
}

/// Service that triages reports and records them in the tracker
pub struct ExceptionService {
    tracker: Arc<dyn IssueTracker>,
    settings: Arc<TrackerSettings>,
    engine: TriageEngine,
}

impl ExceptionService {
    pub fn new(tracker: Arc<dyn IssueTracker>, settings: TrackerSettings) -> Result<Self> {
        settings.validate()?;
        let settings = Arc::new(settings);
        Ok(Self {
            engine: TriageEngine::new(tracker.clone(), settings.clone()),
            tracker,
            settings,
        })
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.settings
    }

    /// Triage a report and create or update its record
    pub async fn report(&self, report: &ExceptionReport) -> Result<FilingOutcome> {
        report.validate()?;
        let summary = report.summary();
        let stacktrace = PrintedStacktrace::format(report);
        info!("Received exception report: {}", summary);

        match self.engine.triage_printed(summary, &stacktrace).await? {
            MatchDecision::Duplicate {
                target_key,
                prior_annotation,
                is_closed_or_resolved,
            } => {
                self.record_occurrence(target_key, prior_annotation.as_deref(), is_closed_or_resolved)
                    .await
            }
            MatchDecision::New => self.file_new(report, summary, &stacktrace).await,
        }
    }

    async fn file_new(
        &self,
        report: &ExceptionReport,
        summary: &str,
        stacktrace: &PrintedStacktrace,
    ) -> Result<FilingOutcome> {
        let request = CreateIssueRequest::for_report(
            &self.settings,
            summary,
            &report.details_block(),
            stacktrace.as_str(),
        );
        let created = self.tracker.create_issue(&request).await?;

        info!("Tracker issue added: {}", created.key);
        Ok(FilingOutcome::Created { key: created.key })
    }

    async fn record_occurrence(
        &self,
        key: String,
        prior_annotation: Option<&str>,
        reopen: bool,
    ) -> Result<FilingOutcome> {
        let annotation = OccurrenceAnnotation::next(prior_annotation).to_string();
        self.tracker.update_environment(&key, &annotation).await?;

        if reopen {
            info!(
                "Reopening {} with transition {}",
                key, self.settings.reopen_transition_id
            );
            // reopen failures are logged, never returned
            match self
                .tracker
                .transition(&key, &self.settings.reopen_transition_id)
                .await
            {
                Ok(status) => debug!("Transition of {} answered {}", key, status),
                Err(e) => warn!("Failed to reopen {}: {}", key, e),
            }
        }

        info!("Tracker issue already exists, updated: {}", key);
        Ok(FilingOutcome::Updated {
            key,
            annotation,
            reopened: reopen,
        })
    }

    /// First page of records that are still being worked on, as the tracker returned it
    pub async fn open_issues(&self) -> Result<Value> {
        let request = SearchRequest::new(self.settings.open_issues_query(), 0, &self.settings.fields);
        self.tracker.search_raw(&request).await
    }
}
