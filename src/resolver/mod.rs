//! Import resolution.
//!
//! Resolution runs in two passes over on-disk manifests: [`walk`] builds
//! the [`ImportGraph`] of the root project, and [`merge`] flattens the
//! exports of every imported project into a [`MergedConfig`]. Both are
//! pure apart from reading manifests and checking paths.

pub mod errors;
pub mod graph;
pub mod merge;
pub mod registry;
pub mod walk;

pub use errors::{ImportError, MissingProject};
pub use graph::{ImportGraph, ProjectNode, ResolvedImport};
pub use merge::{merge, DirKind, MergeWarning, MergedConfig, MergedImport};
pub use registry::{is_source_location, Registry};
pub use walk::walk;
