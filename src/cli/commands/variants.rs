//! cli::commands::variants
//!
//! List the configured variant space.

use anyhow::Result;

use crate::cli::Context;
use crate::core::config::SyncConfig;
use crate::ui::output;

/// Run the variants command.
pub fn variants(ctx: &Context, count_only: bool) -> Result<()> {
    let verbosity = ctx.verbosity();
    let cwd = ctx.working_dir()?;

    let config = SyncConfig::load(ctx.config.as_deref(), &cwd)?;
    let space = config.variant_space()?;

    if count_only {
        println!("{}", space.size());
        return Ok(());
    }

    for key in space.all_variants() {
        output::print(space.canonical_name(&key), verbosity);
    }
    Ok(())
}
