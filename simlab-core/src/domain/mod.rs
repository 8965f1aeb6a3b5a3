//! Core domain types
//!
//! Jobs and their log streams as the client observes them, plus the upload
//! hand-off carried between submission steps.

pub mod job;
pub mod log;
pub mod upload;
