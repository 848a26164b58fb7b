//! add-version command - Record declared versions in ledgers and the baseline

use anyhow::{bail, Result};

use crate::engine::batch;
use crate::engine::update::{BaselineChange, LedgerChange, UpdateOptions, UpdateReport};
use crate::engine::Context;
use crate::ui::output;

/// Update one package, or every package when `package` is `None`.
pub fn add_version(
    ctx: &Context,
    package: Option<&str>,
    overwrite_version: bool,
    keep_going: bool,
) -> Result<()> {
    let packages = match package {
        Some(name) => vec![batch::resolve_package(ctx, name)?],
        None => batch::list_packages(ctx)?,
    };

    let options = UpdateOptions {
        overwrite: overwrite_version,
    };
    let report = batch::add_versions(ctx, &packages, options, keep_going)?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(update) => describe(ctx, update),
            Err(err) => output::error_chain(err),
        }
    }

    if report.skipped > 0 {
        output::warn(
            format!(
                "stopped after a failure; {} packages were not processed",
                report.skipped
            ),
            ctx.verbosity,
        );
    }

    let failures = report.failures();
    if failures > 0 {
        bail!("{} of {} packages failed to update", failures, packages.len());
    }
    Ok(())
}

fn describe(ctx: &Context, update: &UpdateReport) {
    let version = &update.version;
    let ledger_path = ctx.paths.ledger_path(&update.package);
    let ledger_path = ledger_path.display();

    let message = match update.ledger {
        LedgerChange::Created => format!("Added version `{version}` to `{ledger_path}` (new file)."),
        LedgerChange::Prepended | LedgerChange::Overwritten { .. } => {
            format!("Added version `{version}` to `{ledger_path}`.")
        }
        LedgerChange::Unchanged => format!("Version `{version}` is already in `{ledger_path}`"),
    };
    output::verbose(message, ctx.verbosity);

    if update.baseline == BaselineChange::Updated {
        output::verbose(
            format!(
                "Added version `{version}` to `{}`.",
                ctx.paths.baseline_path().display()
            ),
            ctx.verbosity,
        );
    }
}
