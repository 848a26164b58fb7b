//! verify command - Check every package's ledger and baseline entry

use std::collections::BTreeSet;

use anyhow::{bail, Result};

use crate::engine::{batch, Context};
use crate::ui::output;

/// Check every package that is not excluded.
///
/// Every package is checked even after failures; the command fails if any
/// package did.
pub fn verify(ctx: &Context, exclude: &[String], verify_git_trees: bool) -> Result<()> {
    let excluded: BTreeSet<&str> = ctx
        .exclude
        .iter()
        .chain(exclude)
        .map(String::as_str)
        .collect();

    let packages: Vec<_> = batch::list_packages(ctx)?
        .into_iter()
        .filter(|package| {
            let skip = excluded.contains(package.as_str());
            if skip {
                output::debug(format!("skipping excluded package {package}"), ctx.verbosity);
            }
            !skip
        })
        .collect();

    let report = batch::verify_packages(ctx, &packages, verify_git_trees)?;

    for outcome in &report.outcomes {
        match &outcome.result {
            Ok(confirmation) => output::verbose(confirmation, ctx.verbosity),
            Err(err) => output::error_chain(err),
        }
    }

    let failures = report.failures();
    if failures > 0 {
        bail!(
            "{} of {} packages failed verification",
            failures,
            packages.len()
        );
    }

    output::success(
        format!("Verified {} packages.", packages.len()),
        ctx.verbosity,
    );
    Ok(())
}
