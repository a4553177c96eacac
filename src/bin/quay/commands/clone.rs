//! `quay clone` command

use std::sync::Arc;

use anyhow::Result;

use crate::cli::CloneArgs;
use quay::ops::{clone_project, FetchOptions};
use quay::util::{GlobalContext, Shell, Status};

pub fn execute(args: CloneArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    // Inside a project the clone lands next to it, elsewhere in cwd.
    let (workspace_dir, config) = match ctx.find_project_root() {
        Ok(root) => {
            let project = ctx.project_at(&root)?;
            (project.workspace.workspace_dir().to_path_buf(), project.config)
        }
        Err(_) => (ctx.cwd().to_path_buf(), ctx.load_config(None)),
    };

    let registry = ctx.load_registry(&config)?;
    let branch = args
        .branch
        .unwrap_or_else(|| config.default_branch().to_string());
    let options = FetchOptions::from_config(&config);

    let cloned = clone_project(
        &workspace_dir,
        &registry,
        &args.name,
        &branch,
        &options,
        shell,
    )?;

    shell.status(
        Status::Cloned,
        format!("`{}` into {}", cloned.name, cloned.dir.display()),
    );
    shell.note(format!(
        "run `quay fetch` in {} to clone its imports",
        cloned.dir.display()
    ));
    Ok(())
}
