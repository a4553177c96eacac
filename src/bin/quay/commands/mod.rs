//! Command implementations

pub mod clone;
pub mod completions;
pub mod diag;
pub mod fetch;
pub mod gen;
pub mod init;
pub mod list;
pub mod tree;
