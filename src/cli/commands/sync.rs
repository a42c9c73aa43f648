//! cli::commands::sync
//!
//! Synchronize a target library against the remote source.
//!
//! # Design
//!
//! The handler wires configuration, the entity list, the change manifest,
//! the directory-backed tree, and the HTTP transport into the engine's
//! runner, then reports the run summary. Ctrl-C trips the cancellation
//! flag; the run stops at the next icon boundary with prior progress
//! preserved.
//!
//! # Example
//!
//! ```bash
//! # Sync to source version v4.0.1
//! gsync sync --list icons.json --target ./library --source-version v4.0.1
//!
//! # With a change manifest
//! gsync sync --list icons.json --target ./library \
//!     --source-version v4.0.1 --manifest changes.json
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use chrono::Local;

use crate::cli::Context;
use crate::core::config::SyncConfig;
use crate::core::entities::{EntityListProvider, JsonFileProvider};
use crate::core::types::VersionToken;
use crate::core::versions::ChangeManifest;
use crate::engine::{CancelFlag, ProgressEvent, ProgressSink, SyncRunner};
use crate::fetch::HttpTransport;
use crate::tree::dir::DirTree;
use crate::ui::output;
use crate::ui::Verbosity;

/// Run the sync command.
///
/// This is a synchronous wrapper that uses tokio to run the async implementation.
pub fn sync(
    ctx: &Context,
    list: &Path,
    target: &Path,
    source_version: &str,
    manifest: Option<&Path>,
    keep_extra: bool,
    json: bool,
) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(sync_async(
        ctx,
        list,
        target,
        source_version,
        manifest,
        keep_extra,
        json,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn sync_async(
    ctx: &Context,
    list: &Path,
    target: &Path,
    source_version: &str,
    manifest: Option<&Path>,
    keep_extra: bool,
    json: bool,
) -> Result<()> {
    // JSON mode keeps stdout machine-readable: the summary document is the
    // only thing printed there.
    let verbosity = if json { Verbosity::Quiet } else { ctx.verbosity() };
    let cwd = ctx.working_dir()?;

    let mut config = SyncConfig::load(ctx.config.as_deref(), &cwd)?;
    if keep_extra {
        config.reconcile.delete_extra = false;
    }

    let version = VersionToken::new(source_version).context("invalid --source-version")?;
    let manifest = match manifest {
        Some(path) => ChangeManifest::load(path)?,
        None => ChangeManifest::empty(),
    };
    let entities = JsonFileProvider::new(list).entities()?;

    let runner = SyncRunner::from_config(&config)?;
    let mut tree = DirTree::open(target)?;
    let transport = Arc::new(HttpTransport::new()?);

    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        });
    }

    output::print(
        format!(
            "syncing {} icon(s) to version {} (started {})",
            entities.len(),
            version,
            Local::now().format("%H:%M:%S")
        ),
        verbosity,
    );

    let sink = PrintSink { verbosity };
    let summary = runner
        .run(
            &mut tree,
            transport,
            &entities,
            &version,
            &manifest,
            &sink,
            &cancel,
        )
        .await;

    if summary.cancelled {
        output::warn(
            format!(
                "cancelled after {}/{} icon(s); completed icons are preserved",
                summary.reports.len(),
                summary.total
            ),
            verbosity,
        );
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        output::print(
            format!(
                "done: {} completed, {} failed of {}",
                summary.completed(),
                summary.failed(),
                summary.total
            ),
            verbosity,
        );
    }

    if summary.failed() > 0 {
        bail!("{} icon(s) failed; see warnings above", summary.failed());
    }
    Ok(())
}

/// Prints engine progress to the terminal.
struct PrintSink {
    verbosity: Verbosity,
}

impl ProgressSink for PrintSink {
    fn emit(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::RunStarted { .. } => {}
            ProgressEvent::EntityStarted { entity, index, total } => {
                output::debug(
                    format!("[{}/{}] {} starting", index + 1, total, entity),
                    self.verbosity,
                );
            }
            ProgressEvent::EntityDecided { entity, action } => {
                output::debug(format!("{entity}: {action}"), self.verbosity);
            }
            ProgressEvent::FetchAttempt { entity, attempt, stats } => {
                output::debug(
                    format!(
                        "{entity}: attempt {attempt}: {}/{} fetched in {} batch(es) ({:.0?})",
                        stats.successful, stats.total, stats.batches, stats.elapsed
                    ),
                    self.verbosity,
                );
            }
            ProgressEvent::RetryCooldown { entity, attempt, remaining } => {
                output::print(
                    format!(
                        "{entity}: backing off after attempt {attempt}, {}s remaining",
                        remaining.as_secs()
                    ),
                    self.verbosity,
                );
            }
            ProgressEvent::EntityCompleted { entity, written, completed, total } => {
                output::print(
                    format!(
                        "[{}] {} ({} written)",
                        output::format_percent(completed, total),
                        entity,
                        written
                    ),
                    self.verbosity,
                );
            }
            ProgressEvent::Warning { entity, message } => {
                output::warn(format!("{entity}: {message}"), self.verbosity);
            }
            ProgressEvent::RunFinished { .. } => {}
        }
    }
}
