//! Core domain models and matching rules for exception triage
//!
//! This crate contains the pure, I/O-free part of the triage service:
//! the inbound report model, the canonical printed stacktrace, the
//! similarity and throw-location rules used to spot duplicates, and the
//! occurrence annotation kept on tracked records.

pub mod error;
pub mod occurrence;
pub mod record;
pub mod report;
pub mod settings;
pub mod similarity;
pub mod stacktrace;

pub use error::{Error, Result};
pub use occurrence::OccurrenceAnnotation;
pub use record::{IssueRecord, MatchDecision};
pub use report::{CausalFrame, ExceptionReport, StackLine};
pub use settings::TrackerSettings;
pub use similarity::{SequenceMatcher, StacktraceMatcher};
pub use stacktrace::PrintedStacktrace;
