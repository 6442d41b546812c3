//! Sync engine
//!
//! - [`entry`]: sync entries and the built-in entity list
//! - [`validate`]: static checks over the entry list
//! - [`scheduler`]: chunked concurrent execution with per-item timeouts
//! - [`orchestrator`]: runs every entry through its adapter
//! - [`report`]: run summary
//! - [`error`]: configuration and per-entity errors

pub mod entry;
pub mod error;
pub mod orchestrator;
pub mod report;
pub mod scheduler;
pub mod validate;
