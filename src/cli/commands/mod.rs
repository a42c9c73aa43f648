//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Validates command-specific arguments
//! 2. Calls the engine to execute
//! 3. Formats and displays output
//!
//! # Async Commands
//!
//! `sync` is async because it drives network I/O; its handler is a
//! synchronous wrapper that builds a tokio runtime and blocks on the
//! async implementation.

mod plan_cmd;
mod sync;
mod variants;

pub use plan_cmd::plan;
pub use sync::sync;
pub use variants::variants;

use anyhow::Result;

use super::args::Command;
use super::Context;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Sync {
            list,
            target,
            source_version,
            manifest,
            keep_extra,
            json,
        } => sync::sync(
            ctx,
            &list,
            &target,
            &source_version,
            manifest.as_deref(),
            keep_extra,
            json,
        ),
        Command::Plan {
            list,
            target,
            source_version,
            manifest,
        } => plan_cmd::plan(ctx, &list, &target, &source_version, manifest.as_deref()),
        Command::Variants { count } => variants::variants(ctx, count),
    }
}
