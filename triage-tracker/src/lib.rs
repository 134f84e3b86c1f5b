//! Issue tracker integration for exception triage
//!
//! This crate talks to the issue tracker (Jira's REST API), retrieves the
//! records that may already describe an incoming exception, decides whether
//! the exception is a duplicate and files or updates the record accordingly.

pub mod contract;
pub mod error;
pub mod jira;
pub mod retriever;
pub mod services;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use contract::IssueTracker;
pub use error::{Error, Result};
pub use jira::{JiraClient, JiraConfig};
pub use retriever::CandidateRetriever;
pub use services::{ExceptionService, FilingOutcome, TriageEngine};

/// Re-export core types for convenience
pub use triage_core as core;
