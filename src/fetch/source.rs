//! fetch::source
//!
//! Source references: (entity, variant key, version token) to fetchable
//! URL. Pure functions of their inputs.

use crate::core::types::{ContentHash, IconName, VersionToken};
use crate::core::variants::{VariantKey, VariantSpace};

/// One fetchable asset: the entity and variant it belongs to plus its URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceReference {
    pub entity: IconName,
    pub key: VariantKey,
    pub url: String,
}

/// A successfully fetched asset with its normalized-content digest.
#[derive(Debug, Clone)]
pub struct FetchedContent {
    pub reference: SourceReference,
    pub body: String,
    pub hash: ContentHash,
}

/// Builds asset URLs under a configured base.
///
/// Layout: `{base}/{version}/{entity}/{variant slug}.svg`, e.g.
/// `https://assets.glyphsync.dev/icons/v4.0.1/home/fill-0_grade-0_size-24_style-outlined_weight-400.svg`.
#[derive(Debug, Clone)]
pub struct SourceUrlBuilder {
    base_url: String,
}

impl SourceUrlBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }

    /// Reference for one variant of one entity at one version.
    pub fn reference(
        &self,
        entity: &IconName,
        version: &VersionToken,
        key: &VariantKey,
    ) -> SourceReference {
        let url = format!(
            "{}/{}/{}/{}.svg",
            self.base_url,
            version,
            entity,
            key.slug()
        );
        SourceReference {
            entity: entity.clone(),
            key: key.clone(),
            url,
        }
    }

    /// References for every variant in the space, in `all_variants` order.
    pub fn full_set(
        &self,
        space: &VariantSpace,
        entity: &IconName,
        version: &VersionToken,
    ) -> Vec<SourceReference> {
        space
            .all_variants()
            .iter()
            .map(|key| self.reference(entity, version, key))
            .collect()
    }
}
