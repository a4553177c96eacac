//! `quay gen` command

use std::sync::Arc;

use anyhow::Result;

use quay::ops::generate;
use quay::util::fs::{relative_path, WriteOutcome};
use quay::util::{GlobalContext, Shell, Status};

pub fn execute(ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let project = ctx.project()?;
    let result = generate(&project.workspace, &project.registry)?;

    for warning in &result.warnings {
        shell.diagnostic(&warning.to_diagnostic());
    }

    let shown = relative_path(ctx.cwd(), &result.path);
    match result.outcome {
        WriteOutcome::Written => shell.status(
            Status::Generated,
            format!("{} ({} import(s))", shown.display(), result.imports),
        ),
        WriteOutcome::Unchanged => shell.status(Status::Fresh, shown.display()),
    }

    Ok(())
}
