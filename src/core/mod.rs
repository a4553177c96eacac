//! Core data structures for quay.
//!
//! This module contains the foundational types used throughout quay:
//! - Project identity (names, directory validation)
//! - Manifests (imports and exports)
//! - Workspace layout

pub mod manifest;
pub mod project;
pub mod workspace;

pub use manifest::{ConditionalDir, Exports, ImportSpec, Manifest};
pub use project::{
    is_valid_project_dir, is_valid_project_name, project_name_from_dir,
    project_name_from_location, MANIFEST_NAME,
};
pub use workspace::{Workspace, IMPORTS_FILE_NAME};
