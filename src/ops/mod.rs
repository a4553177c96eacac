//! High-level operations.
//!
//! This module contains the implementation of quay commands.

pub mod diag;
pub mod fetch;
pub mod gen;

pub use diag::{diag_imports, diag_tools, format_report, CheckResult, DiagReport};
pub use fetch::{clone_project, fetch, ClonedProject, FetchOptions, FetchReport};
pub use gen::{generate, resolve_merged, GenResult};
