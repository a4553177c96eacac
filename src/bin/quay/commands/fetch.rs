//! `quay fetch` command

use std::sync::Arc;

use anyhow::Result;

use quay::ops::{fetch, FetchOptions};
use quay::util::{GlobalContext, Shell, Status};

pub fn execute(ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let project = ctx.project()?;
    let options = FetchOptions::from_config(&project.config);
    let report = fetch(&project.workspace, &project.registry, &options, shell)?;

    if report.cloned.is_empty() {
        shell.status(Status::Fresh, "all imports are on disk");
    } else {
        shell.status(
            Status::Finished,
            format!(
                "fetched {} project(s) for `{}`",
                report.cloned.len(),
                project.workspace.name()
            ),
        );
    }

    Ok(())
}
