//! cli::commands::plan_cmd
//!
//! Show what a sync would do, without fetching or mutating anything.
//!
//! Staleness needs fetched content, so a plan reports the classified
//! action plus missing/extra counts only.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context as _, Result};

use crate::cli::Context;
use crate::core::config::SyncConfig;
use crate::core::entities::{EntityListProvider, JsonFileProvider};
use crate::core::metadata::EntityMetadata;
use crate::core::types::{IconName, VersionToken};
use crate::core::versions::ChangeManifest;
use crate::engine::decision::{classify, EntityState};
use crate::engine::plan::build_plan;
use crate::tree::dir::DirTree;
use crate::tree::TargetTree;
use crate::ui::output;

/// Run the plan command.
pub fn plan(
    ctx: &Context,
    list: &Path,
    target: &Path,
    source_version: &str,
    manifest: Option<&Path>,
) -> Result<()> {
    let verbosity = ctx.verbosity();
    let cwd = ctx.working_dir()?;

    let config = SyncConfig::load(ctx.config.as_deref(), &cwd)?;
    let space = config.variant_space()?;
    let version = VersionToken::new(source_version).context("invalid --source-version")?;
    let manifest = match manifest {
        Some(path) => ChangeManifest::load(path)?,
        None => ChangeManifest::empty(),
    };
    let entities = JsonFileProvider::new(list).entities()?;

    // A missing target means every icon is a full generate; don't create
    // the directory just to look at it.
    let tree = if target.is_dir() {
        Some(DirTree::open(target)?)
    } else {
        None
    };

    for entity in &entities {
        let line = match &tree {
            Some(tree) => describe(tree, &space, entity, &version, &manifest)?,
            None => format!("{entity}: full-generate ({} missing)", space.size()),
        };
        output::print(line, verbosity);
    }
    Ok(())
}

fn describe(
    tree: &DirTree,
    space: &crate::core::variants::VariantSpace,
    entity: &IconName,
    version: &VersionToken,
    manifest: &ChangeManifest,
) -> Result<String> {
    if !tree.entity_exists(entity)? {
        return Ok(format!("{entity}: full-generate ({} missing)", space.size()));
    }

    let children = tree.list_children(entity)?;
    let stored = EntityMetadata::load(tree, entity)?;
    let present = children
        .iter()
        .filter_map(|entry| space.parse_name(&entry.name))
        .map(|key| key.comparison_key())
        .collect::<std::collections::HashSet<_>>()
        .len();

    let state = EntityState {
        exists: true,
        present,
        expected: space.size(),
        stored_version: stored.version_token.clone(),
    };
    let action = classify(entity, &state, version, manifest);

    let diff = build_plan(space, &children, &BTreeMap::new(), &stored, false);
    Ok(format!(
        "{entity}: {action} ({} missing, {} extra, {} present)",
        diff.missing.len(),
        diff.extra.len(),
        present
    ))
}
