//! Fetch missing imports with git.
//!
//! Fetching repeats walk-then-clone until the import graph is complete:
//! every pass clones the projects the previous walk found missing, and the
//! next walk discovers their imports in turn. Existing directories are
//! never touched.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{FetchOptions as GitFetchOptions, Repository};
use thiserror::Error;

use crate::core::project::project_name_from_location;
use crate::core::Workspace;
use crate::resolver::{walk, MissingProject, Registry};
use crate::util::fs::ensure_dir;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::shell::{Shell, Status};
use crate::util::Config;

/// A clone that failed.
#[derive(Debug, Error)]
#[error("failed to clone `{name}` from {url}")]
pub struct CloneError {
    pub name: String,
    pub url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl CloneError {
    fn new(name: &str, url: &str, source: anyhow::Error) -> Self {
        CloneError {
            name: name.to_string(),
            url: url.to_string(),
            source: source.into(),
        }
    }

    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::error(self.to_string())
            .with_note(self.source.to_string())
            .with_help(suggestions::FETCH_FAILED)
    }
}

/// Options for fetching imports.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Refuse to clone anything
    pub offline: bool,

    /// Clone depth for imports that do not set one (None = full clone)
    pub default_depth: Option<u32>,
}

impl FetchOptions {
    /// Fetch options from configuration.
    pub fn from_config(config: &Config) -> Self {
        FetchOptions {
            offline: config.offline(),
            default_depth: config.clone_depth(),
        }
    }
}

/// What to clone and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneSpec {
    pub url: String,
    pub branch: String,
    pub rev: Option<String>,
    pub depth: Option<u32>,
}

/// A project cloned by fetch or clone.
#[derive(Debug, Clone)]
pub struct ClonedProject {
    pub name: String,
    pub location: String,
    pub dir: PathBuf,
}

/// Outcome of a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchReport {
    /// Projects cloned, in clone order
    pub cloned: Vec<ClonedProject>,

    /// Number of walk passes
    pub passes: usize,
}

/// Clone every missing import of the workspace, transitively.
pub fn fetch(
    ws: &Workspace,
    registry: &Registry,
    options: &FetchOptions,
    shell: &Shell,
) -> Result<FetchReport> {
    let mut report = FetchReport::default();

    loop {
        let graph = walk(ws, registry)?;
        report.passes += 1;

        if graph.is_complete() {
            tracing::debug!("import graph complete after {} pass(es)", report.passes);
            return Ok(report);
        }

        if options.offline {
            bail!(
                "offline mode is enabled, not cloning {}",
                missing_list(graph.missing())
            );
        }

        for missing in graph.missing() {
            if missing.expected_dir.exists() {
                bail!(
                    "`{}` is still missing after being cloned to {}",
                    missing.name,
                    missing.expected_dir.display()
                );
            }

            let spec = graph
                .get(&missing.importer)
                .and_then(|importer| importer.import(&missing.name))
                .map(|import| CloneSpec {
                    url: missing.location.clone(),
                    branch: import.spec.branch.clone(),
                    rev: import.spec.rev.clone(),
                    depth: import.spec.depth.or(options.default_depth),
                })
                .unwrap_or_else(|| CloneSpec {
                    url: missing.location.clone(),
                    branch: ws.default_branch().to_string(),
                    rev: None,
                    depth: options.default_depth,
                });

            shell.status(
                Status::Fetching,
                format!("{} (imported by {})", missing.name, missing.importer),
            );
            let spinner = shell.spinner(format!("cloning {}", spec.url));
            clone_repo(&spec, &missing.expected_dir)
                .map_err(|e| CloneError::new(&missing.name, &spec.url, e))?;
            spinner.finish();
            shell.status(Status::Cloned, format!("{} ({})", missing.name, spec.branch));

            report.cloned.push(ClonedProject {
                name: missing.name.clone(),
                location: missing.location.clone(),
                dir: missing.expected_dir.clone(),
            });
        }
    }
}

fn missing_list(missing: &[MissingProject]) -> String {
    missing
        .iter()
        .map(|m| format!("`{}` ({})", m.name, m.location))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Clone a single project into `workspace_dir` by registry name or URL.
pub fn clone_project(
    workspace_dir: &Path,
    registry: &Registry,
    name_or_url: &str,
    branch: &str,
    options: &FetchOptions,
    shell: &Shell,
) -> Result<ClonedProject> {
    let location = registry.resolve_location(name_or_url)?;
    let name = project_name_from_location(&location)
        .with_context(|| format!("cannot derive a project name from `{}`", location))?;
    let dir = workspace_dir.join(&name);

    if dir.exists() {
        bail!("project `{}` already exists at {}", name, dir.display());
    }
    if options.offline {
        bail!("offline mode is enabled, not cloning `{}` ({})", name, location);
    }

    let spec = CloneSpec {
        url: location.clone(),
        branch: branch.to_string(),
        rev: None,
        depth: options.default_depth,
    };

    shell.status(Status::Cloning, format!("{} from {}", name, location));
    let spinner = shell.spinner(format!("cloning {}", location));
    clone_repo(&spec, &dir).map_err(|e| CloneError::new(&name, &location, e))?;
    spinner.finish();

    Ok(ClonedProject {
        name,
        location,
        dir,
    })
}

/// Clone a repository into `dest`.
///
/// The clone happens in a temporary directory next to `dest` and is
/// renamed into place once complete.
pub fn clone_repo(spec: &CloneSpec, dest: &Path) -> Result<()> {
    // A pinned revision needs the full history.
    let depth = match (&spec.rev, spec.depth) {
        (None, Some(depth)) => Some(
            i32::try_from(depth)
                .with_context(|| format!("clone depth {} is too large", depth))?,
        ),
        _ => None,
    };

    let parent = dest
        .parent()
        .with_context(|| format!("invalid clone destination: {}", dest.display()))?;
    ensure_dir(parent)?;

    let staging = tempfile::Builder::new()
        .prefix(".quay-clone-")
        .tempdir_in(parent)
        .with_context(|| format!("failed to create temporary directory in {}", parent.display()))?;
    let checkout = staging.path().join("checkout");

    tracing::info!("cloning {} (branch {})", spec.url, spec.branch);

    let mut fetch_options = GitFetchOptions::new();
    if let Some(depth) = depth {
        fetch_options.depth(depth);
    }

    let mut builder = RepoBuilder::new();
    builder.branch(&spec.branch);
    builder.fetch_options(fetch_options);
    let repo = builder.clone(&spec.url, &checkout)?;

    if let Some(rev) = &spec.rev {
        checkout_rev(&repo, rev)?;
    }

    update_submodules(&repo)?;
    drop(repo);

    std::fs::rename(&checkout, dest).with_context(|| {
        format!(
            "failed to move {} to {}",
            checkout.display(),
            dest.display()
        )
    })?;

    Ok(())
}

/// Check out `rev` with a detached HEAD.
fn checkout_rev(repo: &Repository, rev: &str) -> Result<()> {
    let object = repo
        .revparse_single(rev)
        .with_context(|| format!("revision `{}` not found", rev))?;
    let commit = object.peel_to_commit()?;

    repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().force()))?;
    repo.set_head_detached(commit.id())?;

    tracing::debug!("checked out {}", commit.id());
    Ok(())
}

/// Initialize and update all submodules, recursively.
fn update_submodules(repo: &Repository) -> Result<()> {
    for mut submodule in repo.submodules()? {
        let name = submodule.name().unwrap_or("<unnamed>").to_string();
        submodule
            .update(true, None)
            .with_context(|| format!("failed to update submodule `{}`", name))?;

        if let Ok(sub_repo) = submodule.open() {
            update_submodules(&sub_repo)?;
        }
    }
    Ok(())
}
