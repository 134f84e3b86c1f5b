//! Inbound exception report model
//!
//! A report is the JSON document a remote application posts when it hits an
//! unhandled exception. The `stacktrace` array holds the causal chain with the
//! outermost exception first and the root cause last; any other top-level
//! fields are free-form details about the reporting application.
//!
//! ```rust
//! use triage_core::report::ExceptionReport;
//!
//! let report = ExceptionReport::from_json(r#"{
//!     "application": "billing",
//!     "stacktrace": [
//!         {"message": "Request failed", "stacktrace": []},
//!         {"message": "NullPointerException", "stacktrace": [
//!             {"className": "com.acme.Invoice", "methodName": "total",
//!              "fileName": "Invoice.java", "lineNumber": 42, "nativeMethod": false}
//!         ]}
//!     ]
//! }"#).unwrap();
//!
//! assert_eq!(report.summary(), "NullPointerException");
//! assert_eq!(report.details_block(), "  application: billing\n");
//! ```

use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A structured exception report with its causal chain
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExceptionReport {
    #[serde(rename = "stacktrace")]
    pub frames: Vec<CausalFrame>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// One level of a chained exception
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CausalFrame {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub message: String,
    #[serde(rename = "stacktrace", default)]
    pub lines: Vec<StackLine>,
}

/// A single stack frame inside a causal frame
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StackLine {
    pub class_name: String,
    pub method_name: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub line_number: i64,
    #[serde(default)]
    pub native_method: bool,
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl ExceptionReport {
    /// Build a report from its frames, validating the causal chain
    pub fn new(frames: Vec<CausalFrame>) -> Result<Self> {
        let report = Self {
            frames,
            details: Map::new(),
        };
        report.validate()?;
        Ok(report)
    }

    /// Parse and validate a report from its JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse and validate a report from an already decoded JSON value
    pub fn from_value(value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(Error::invalid_report("report must be a JSON object"));
        }
        if value.get("stacktrace").is_none() {
            return Err(Error::invalid_report("report has no stacktrace field"));
        }

        let report: Self = serde_json::from_value(value)
            .map_err(|e| Error::invalid_report(format!("malformed stacktrace: {}", e)))?;
        report.validate()?;
        Ok(report)
    }

    /// Reject reports that cannot be triaged
    pub fn validate(&self) -> Result<()> {
        if self.frames.is_empty() {
            return Err(Error::invalid_report(
                "stacktrace must contain at least one causal frame",
            ));
        }
        Ok(())
    }

    /// Message of the root cause, the last frame of the chain
    pub fn summary(&self) -> &str {
        self.frames
            .last()
            .map(|frame| frame.message.as_str())
            .unwrap_or_default()
    }

    /// Render the extra report fields, one `  key: value` line each
    pub fn details_block(&self) -> String {
        let mut output = String::new();
        for (key, value) in &self.details {
            let rendered = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            output.push_str(&format!("  {}: {}\n", key, rendered));
        }
        output
    }
}

impl CausalFrame {
    pub fn new<S: Into<String>>(message: S, lines: Vec<StackLine>) -> Self {
        Self {
            message: message.into(),
            lines,
        }
    }
}

impl StackLine {
    pub fn new<C, M, F>(class_name: C, method_name: M, file_name: F, line_number: i64) -> Self
    where
        C: Into<String>,
        M: Into<String>,
        F: Into<String>,
    {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            file_name: Some(file_name.into()),
            line_number,
            native_method: false,
        }
    }

    /// Mark the frame as a native method
    pub fn native(mut self) -> Self {
        self.native_method = true;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summary_is_last_frame_message() {
        let report = ExceptionReport::new(vec![
            CausalFrame::new("Wrapper failure", vec![]),
            CausalFrame::new("Middle failure", vec![]),
            CausalFrame::new("Root cause", vec![]),
        ])
        .unwrap();

        assert_eq!(report.summary(), "Root cause");
    }

    #[test]
    fn test_empty_frames_rejected() {
        let result = ExceptionReport::new(vec![]);
        assert!(matches!(result, Err(Error::InvalidReport { .. })));

        let result = ExceptionReport::from_value(json!({"stacktrace": []}));
        assert!(matches!(result, Err(Error::InvalidReport { .. })));
    }

    #[test]
    fn test_missing_stacktrace_rejected() {
        let result = ExceptionReport::from_value(json!({"application": "billing"}));
        assert!(matches!(result, Err(Error::InvalidReport { .. })));

        let result = ExceptionReport::from_value(json!([1, 2, 3]));
        assert!(matches!(result, Err(Error::InvalidReport { .. })));

        let result = ExceptionReport::from_value(json!({"stacktrace": "oops"}));
        assert!(matches!(result, Err(Error::InvalidReport { .. })));
    }

    #[test]
    fn test_parse_inbound_schema() {
        let report = ExceptionReport::from_value(json!({
            "stacktrace": [{
                "message": null,
                "stacktrace": [
                    {"className": "java.lang.Thread", "methodName": "run",
                     "fileName": "Thread.java", "lineNumber": 748, "nativeMethod": false},
                    {"className": "sun.misc.Unsafe", "methodName": "park",
                     "fileName": null, "lineNumber": -2, "nativeMethod": true}
                ]
            }]
        }))
        .unwrap();

        assert_eq!(report.frames.len(), 1);
        assert_eq!(report.summary(), "");
        let lines = &report.frames[0].lines;
        assert_eq!(lines[0].class_name, "java.lang.Thread");
        assert_eq!(lines[0].file_name.as_deref(), Some("Thread.java"));
        assert!(!lines[0].native_method);
        assert!(lines[1].native_method);
        assert!(lines[1].file_name.is_none());
    }

    #[test]
    fn test_details_block_keeps_field_order() {
        let report = ExceptionReport::from_json(
            r#"{"version": "1.4.2", "stacktrace": [{"message": "boom", "stacktrace": []}],
                "user": "jdoe", "build": 17, "tags": ["a", "b"]}"#,
        )
        .unwrap();

        assert_eq!(
            report.details_block(),
            "  version: 1.4.2\n  user: jdoe\n  build: 17\n  tags: [\"a\",\"b\"]\n"
        );
    }

    #[test]
    fn test_details_block_empty_without_extra_fields() {
        let report = ExceptionReport::new(vec![CausalFrame::new("boom", vec![])]).unwrap();
        assert_eq!(report.details_block(), "");
    }
}
