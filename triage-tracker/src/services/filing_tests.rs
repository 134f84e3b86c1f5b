/// Tests for the filing service
#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use crate::services::filing::{ExceptionService, FilingOutcome};
    use crate::testing::InMemoryTracker;
    use crate::Error;
    use std::sync::Arc;
    use triage_core::{ExceptionReport, IssueRecord, OccurrenceAnnotation, TrackerSettings};

    fn sample_report() -> ExceptionReport {
        ExceptionReport::from_json(
            r#"{
                "application": "hamis-web",
                "version": "2.3.1",
                "stacktrace": [
                    {"message": "Request processing failed", "stacktrace": [
                        {"className": "com.acme.web.Dispatcher", "methodName": "dispatch",
                         "fileName": "Dispatcher.java", "lineNumber": 120, "nativeMethod": false}
                    ]},
                    {"message": "java.lang.NullPointerException", "stacktrace": [
                        {"className": "com.acme.berth.BerthPlanner", "methodName": "assign",
                         "fileName": "BerthPlanner.java", "lineNumber": 77, "nativeMethod": false},
                        {"className": "sun.reflect.NativeMethodAccessorImpl", "methodName": "invoke0",
                         "fileName": null, "lineNumber": -2, "nativeMethod": true},
                        {"className": "com.acme.berth.BerthService", "methodName": "plan",
                         "fileName": "BerthService.java", "lineNumber": 31, "nativeMethod": false}
                    ]}
                ]
            }"#,
        )
        .unwrap()
    }

    fn service(tracker: Arc<InMemoryTracker>) -> ExceptionService {
        ExceptionService::new(tracker, TrackerSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_new_report_creates_issue() {
        let tracker = Arc::new(InMemoryTracker::new());
        let outcome = service(tracker.clone()).report(&sample_report()).await.unwrap();

        assert_eq!(outcome, FilingOutcome::Created { key: "HAMISTIRF-100".to_string() });

        let created = tracker.created();
        assert_eq!(created.len(), 1);
        let fields = &created[0].fields;
        assert_eq!(fields.summary, "HaMIS Exception: java.lang.NullPointerException");
        assert_eq!(fields.labels, vec!["Beheer".to_string()]);
        assert_eq!(
            fields.description,
            "java.lang.NullPointerException\n\nDetails:\n  application: hamis-web\n  version: 2.3.1\n\n\n\
             Stacktrace:\n{noformat}Caused by: Request processing failed\n\
             \tat com.acme.web.Dispatcher.dispatch(Dispatcher.java:120)\n\
             Caused by: java.lang.NullPointerException\n\
             \tat com.acme.berth.BerthPlanner.assign(BerthPlanner.java:77)\n\
             \tat com.acme.berth.BerthService.plan(BerthService.java:31)\n{noformat}"
        );
        assert!(tracker.updates().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_report_updates_count() {
        let tracker = Arc::new(InMemoryTracker::new());
        let service = service(tracker.clone());

        let first = service.report(&sample_report()).await.unwrap();
        let second = service.report(&sample_report()).await.unwrap();
        let third = service.report(&sample_report()).await.unwrap();

        assert!(matches!(first, FilingOutcome::Created { .. }));
        match (&second, &third) {
            (
                FilingOutcome::Updated { key: k2, annotation: a2, reopened: r2 },
                FilingOutcome::Updated { key: k3, annotation: a3, reopened: r3 },
            ) => {
                assert_eq!(k2, first.key());
                assert_eq!(k3, first.key());
                assert_eq!(OccurrenceAnnotation::parse(a2).unwrap().count, 1);
                assert_eq!(OccurrenceAnnotation::parse(a3).unwrap().count, 2);
                assert!(!r2 && !r3);
            }
            other => panic!("unexpected outcomes {:?}", other),
        }
        assert_eq!(tracker.created().len(), 1);
        assert!(tracker.transitions().is_empty());
    }

    #[tokio::test]
    async fn test_closed_duplicate_is_reopened() {
        let report = sample_report();
        let settings = TrackerSettings::default();
        let description = settings.issue_description(
            report.summary(),
            &report.details_block(),
            triage_core::PrintedStacktrace::format(&report).as_str(),
        );
        let tracker = Arc::new(InMemoryTracker::with_records(vec![IssueRecord::new("HAM-42", "Closed")
            .with_description(description)
            .with_environment("Count: 4\nLast: 2023-01-01")]));

        let outcome = service(tracker.clone()).report(&report).await.unwrap();

        match outcome {
            FilingOutcome::Updated { key, annotation, reopened } => {
                assert_eq!(key, "HAM-42");
                assert!(annotation.starts_with("Count: 5\nLast: "));
                assert!(reopened);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(tracker.transitions(), vec![("HAM-42".to_string(), "3".to_string())]);
        assert_eq!(tracker.records()[0].status, "Reopened");
    }

    #[tokio::test]
    async fn test_failed_reopen_is_not_fatal() {
        let report = sample_report();
        let settings = TrackerSettings::default();
        let description = settings.issue_description(
            report.summary(),
            "",
            triage_core::PrintedStacktrace::format(&report).as_str(),
        );
        let tracker = Arc::new(
            InMemoryTracker::with_records(vec![IssueRecord::new("HAM-8", "resolved").with_description(description)])
                .transition_status(400),
        );

        let outcome = service(tracker.clone()).report(&report).await.unwrap();
        assert!(matches!(outcome, FilingOutcome::Updated { reopened: true, .. }));
        assert_eq!(tracker.records()[0].status, "resolved");
    }

    #[tokio::test]
    async fn test_write_failure_surfaces() {
        let tracker = Arc::new(InMemoryTracker::new().fail_writes(400));
        let result = service(tracker).report(&sample_report()).await;

        assert!(matches!(result, Err(Error::WriteFailed { status_code: 400 })));
    }

    #[tokio::test]
    async fn test_open_issues_uses_open_status_query() {
        let tracker = Arc::new(InMemoryTracker::with_records(vec![IssueRecord::new("HAM-1", "Open")]));
        let page = service(tracker.clone()).open_issues().await.unwrap();

        assert_eq!(page["total"], 1);
        assert_eq!(page["issues"][0]["key"], "HAM-1");
        assert_eq!(
            tracker.search_requests()[0].jql,
            TrackerSettings::default().open_issues_query()
        );
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings = TrackerSettings {
            issue_type: String::new(),
            ..Default::default()
        };
        let result = ExceptionService::new(Arc::new(InMemoryTracker::new()), settings);
        assert!(matches!(result, Err(Error::Core(_))));
    }
}
