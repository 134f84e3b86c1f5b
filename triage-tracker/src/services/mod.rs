//! Business logic on top of the tracker contracts

pub mod filing;
pub mod triage;

#[cfg(test)]
mod filing_tests;

pub use filing::{ExceptionService, FilingOutcome};
pub use triage::TriageEngine;
