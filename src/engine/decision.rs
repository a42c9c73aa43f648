//! engine::decision
//!
//! Per-entity update classification, evaluated once before any fetch.
//!
//! # State machine
//!
//! | Existing state            | Stored token    | Action            |
//! |---------------------------|-----------------|-------------------|
//! | absent                    | -               | `FullGenerate`    |
//! | present, incomplete       | any             | `FillGaps`        |
//! | present, complete         | absent          | `FullGenerate`    |
//! | present, complete         | equals current  | `Skip`            |
//! | present, complete         | differs         | `SmartUpdate`     |
//!
//! Before `SmartUpdate` is emitted, the version graph is consulted: a
//! proven no-change along the stored-to-current path downgrades to
//! `VersionBumpOnly`, which re-stamps the token without fetching.

use crate::core::types::{IconName, VersionToken};
use crate::core::versions::ChangeManifest;

/// What a run should do for one entity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateAction {
    /// Complete and already at the current version; nothing to do.
    Skip,
    /// Proven unchanged across versions; re-stamp the token only.
    VersionBumpOnly,
    /// Absent or untrusted; fetch everything and build from scratch.
    FullGenerate,
    /// Present but missing children; fetch everything, write only gaps.
    FillGaps,
    /// Complete but stale; fetch everything, write what the hashes say.
    SmartUpdate,
}

impl UpdateAction {
    /// Whether this action needs the fetch pipeline at all.
    pub fn needs_fetch(&self) -> bool {
        !matches!(self, UpdateAction::Skip | UpdateAction::VersionBumpOnly)
    }

    /// Whether existing matched children are eligible for content updates.
    /// `FillGaps` writes only missing children.
    pub fn updates_existing(&self) -> bool {
        matches!(self, UpdateAction::SmartUpdate | UpdateAction::FullGenerate)
    }
}

impl std::fmt::Display for UpdateAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            UpdateAction::Skip => "skip",
            UpdateAction::VersionBumpOnly => "version-bump-only",
            UpdateAction::FullGenerate => "full-generate",
            UpdateAction::FillGaps => "fill-gaps",
            UpdateAction::SmartUpdate => "smart-update",
        };
        write!(f, "{label}")
    }
}

/// Snapshot of an entity's target-side state, gathered before deciding.
#[derive(Debug, Clone)]
pub struct EntityState {
    /// Whether the entity container exists at all.
    pub exists: bool,
    /// Children currently present.
    pub present: usize,
    /// Full variant-space size.
    pub expected: usize,
    /// Version token from entity metadata, if stored and well formed.
    pub stored_version: Option<VersionToken>,
}

impl EntityState {
    fn complete(&self) -> bool {
        self.present == self.expected
    }
}

/// Classify the required action for one entity.
pub fn classify(
    entity: &IconName,
    state: &EntityState,
    current: &VersionToken,
    manifest: &ChangeManifest,
) -> UpdateAction {
    if !state.exists || state.present == 0 {
        return UpdateAction::FullGenerate;
    }
    if !state.complete() {
        return UpdateAction::FillGaps;
    }

    let stored = match &state.stored_version {
        Some(stored) => stored,
        // Complete but untagged: legacy state, trust nothing.
        None => return UpdateAction::FullGenerate,
    };

    if stored == current {
        return UpdateAction::Skip;
    }
    if !manifest.has_changed(entity, stored, current) {
        return UpdateAction::VersionBumpOnly;
    }
    UpdateAction::SmartUpdate
}
