//! Quay - import and export resolution for CMake projects
//!
//! A project declares the projects it imports and what it exports to its
//! importers in a `Quay.toml`. This crate walks the import graph over the
//! workspace directory, merges the exports of every imported project and
//! writes the result as a CMake file the root project includes.

pub mod core;
pub mod ops;
pub mod resolver;
pub mod util;

/// Test utilities for quay unit tests.
///
/// This module is only available when compiling with `--cfg test`. It
/// provides on-disk workspace fixtures and local git repositories.
#[cfg(test)]
pub mod test_support;

pub use core::{manifest::Manifest, workspace::Workspace};

pub use resolver::{ImportError, ImportGraph, MergedConfig, Registry};
pub use util::context::GlobalContext;
