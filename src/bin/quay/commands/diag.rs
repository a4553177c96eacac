//! `quay diag` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::{DiagArgs, DiagKind};
use quay::ops::{diag_imports, diag_tools, format_report};
use quay::util::{GlobalContext, Shell};

pub fn execute(args: DiagArgs, ctx: &GlobalContext, shell: &Arc<Shell>) -> Result<()> {
    let (title, report) = match args.what {
        DiagKind::Imports => {
            let project = ctx.project()?;
            let report = diag_imports(&project.workspace, &project.registry)?;
            (format!("Imports of `{}`", project.workspace.name()), report)
        }
        DiagKind::Tools => ("Tools".to_string(), diag_tools()),
    };

    print!("{}", format_report(&title, &report, shell.is_verbose()));

    if !report.all_required_passed() {
        bail!(
            "{} required check(s) failed",
            report.required_failed_count()
        );
    }
    Ok(())
}
