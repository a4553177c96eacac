//! `quay init` command

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::cli::InitArgs;
use quay::core::manifest::generate_default_manifest;
use quay::core::project::{project_name_from_dir, MANIFEST_NAME};
use quay::util::{GlobalContext, Shell, Status};

/// Write a template manifest into `dir`, returning the project name.
pub fn init_project(dir: &Path) -> Result<String> {
    if !dir.is_dir() {
        bail!("directory does not exist: {}", dir.display());
    }
    let dir = dir
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", dir.display()))?;

    let manifest_path = dir.join(MANIFEST_NAME);
    if manifest_path.exists() {
        bail!("{} already exists", manifest_path.display());
    }

    let name = project_name_from_dir(&dir).with_context(|| {
        format!(
            "`{}` is not a valid project name (use letters, digits, `_`, `-` and `.`)",
            dir.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default()
        )
    })?;

    std::fs::write(&manifest_path, generate_default_manifest(&name))
        .with_context(|| format!("failed to write {}", manifest_path.display()))?;

    Ok(name)
}

pub fn execute(args: InitArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let path = args.path.unwrap_or_else(|| PathBuf::from("."));
    let dir = if path.is_absolute() {
        path
    } else {
        ctx.cwd().join(path)
    };

    let name = init_project(&dir)?;
    shell.status(Status::Created, format!("{} for project `{}`", MANIFEST_NAME, name));

    Ok(())
}
