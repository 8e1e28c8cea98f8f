//! ipmirror: Jira-backed IP verification status
//!
//! Mirrors tracker issues into a local multi-sheet snapshot, serves
//! per-platform aggregations from it, and manages the saved filters and
//! role permissions that feed it.

pub mod cli;
pub mod core;
