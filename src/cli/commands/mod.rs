//! CLI command implementations

pub mod cases;
pub mod completions;
pub mod filter;
pub mod init;
pub mod project;
pub mod purge;
pub mod refresh;
pub mod role;
pub mod snapshot;
pub mod summary;
