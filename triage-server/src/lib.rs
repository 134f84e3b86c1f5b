//! HTTP intake server for exception triage
//!
//! Receives serialized exception reports, decides whether each one is a
//! duplicate of a tracked defect and files or updates the tracker record.

pub mod api;
pub mod config;
pub mod error;
pub mod server;


pub use error::{AppError, Error, Result};

pub use triage_core as core;
pub use triage_tracker as tracker;
