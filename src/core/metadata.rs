//! core::metadata
//!
//! Typed per-entity sync metadata.
//!
//! # Design
//!
//! The target tree exposes an opaque string key/value store per entity.
//! This module gives that store a schema: a stored version token and a
//! map from variant comparison key to content hash, each under its own
//! well-known key. Reads return `None` for absent or malformed values
//! rather than erroring, because the tree may have been hand-edited
//! between runs and a bad record must degrade to "re-process", never to
//! a crash.

use std::collections::BTreeMap;

use crate::core::types::{ContentHash, IconName, VersionToken};
use crate::tree::{TargetTree, TreeError};

/// Metadata key holding the stored version token.
pub const VERSION_KEY: &str = "sync-version";

/// Metadata key holding the JSON map of comparison key to content hash.
pub const HASHES_KEY: &str = "sync-hashes";

/// The typed metadata record attached to one target entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntityMetadata {
    /// Version the entity was last reconciled against.
    pub version_token: Option<VersionToken>,
    /// Stored content hash per variant comparison key.
    pub content_hashes: BTreeMap<String, ContentHash>,
}

impl EntityMetadata {
    /// Read the record for `entity`.
    ///
    /// Absent or malformed values come back as their empty form; only
    /// tree-level failures error.
    pub fn load(tree: &dyn TargetTree, entity: &IconName) -> Result<Self, TreeError> {
        let version_token = tree
            .get_metadata(entity, VERSION_KEY)?
            .and_then(|raw| VersionToken::new(raw).ok());

        let content_hashes = tree
            .get_metadata(entity, HASHES_KEY)?
            .and_then(|raw| serde_json::from_str::<BTreeMap<String, ContentHash>>(&raw).ok())
            .unwrap_or_default();

        Ok(Self {
            version_token,
            content_hashes,
        })
    }

    /// Write the record for `entity`, replacing both keys.
    pub fn store(&self, tree: &mut dyn TargetTree, entity: &IconName) -> Result<(), TreeError> {
        if let Some(token) = &self.version_token {
            tree.set_metadata(entity, VERSION_KEY, token.as_str())?;
        }
        // Serializing a string map cannot fail.
        let json = serde_json::to_string(&self.content_hashes).unwrap_or_default();
        tree.set_metadata(entity, HASHES_KEY, &json)
    }

    /// Stored hash for a comparison key.
    pub fn hash_for(&self, comparison_key: &str) -> Option<&ContentHash> {
        self.content_hashes.get(comparison_key)
    }
}
