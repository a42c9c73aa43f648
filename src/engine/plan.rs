//! engine::plan
//!
//! Reconciliation planning: partition the desired variant set against an
//! entity's existing children into missing / stale / up-to-date / extra.
//!
//! Planning is pure; application lives in [`crate::engine::reconcile`].

use std::collections::BTreeMap;

use crate::core::metadata::EntityMetadata;
use crate::core::types::ContentHash;
use crate::core::variants::{VariantKey, VariantSpace};
use crate::tree::{ChildEntry, ChildRef};

/// An existing child matched to its variant key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedChild {
    pub child: ChildRef,
    pub key: VariantKey,
}

/// The computed diff for one entity.
#[derive(Debug, Default)]
pub struct ReconciliationPlan {
    /// Desired keys with no existing child, in variant-space order.
    pub missing: Vec<VariantKey>,
    /// Existing children whose content hash differs from the fetched one.
    pub stale: Vec<MatchedChild>,
    /// Existing children needing no content change.
    pub up_to_date: Vec<MatchedChild>,
    /// Children outside the desired set, including unparseable orphans and
    /// duplicates.
    pub extra: Vec<ChildEntry>,
}

impl ReconciliationPlan {
    /// Whether applying the plan would change nothing.
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.stale.is_empty() && self.extra.is_empty()
    }
}

/// Compute the diff.
///
/// `new_hashes` maps variant comparison keys to the digests of freshly
/// fetched content. With `update_existing` unset (fill-gaps), matched
/// children are never stale. When comparing, a child whose stored hash is
/// absent or differs from the fetched digest is stale; an absent record
/// means the target is not trusted and must be rewritten.
///
/// An existing child whose name does not parse to a key in the space is
/// orphaned and classified `extra`, as is any duplicate claiming an
/// already-matched key.
pub fn build_plan(
    space: &VariantSpace,
    children: &[ChildEntry],
    new_hashes: &BTreeMap<String, ContentHash>,
    stored: &EntityMetadata,
    update_existing: bool,
) -> ReconciliationPlan {
    let mut plan = ReconciliationPlan::default();

    // Match children to keys; first claim wins, the rest are extra.
    let mut matched: BTreeMap<String, MatchedChild> = BTreeMap::new();
    for entry in children {
        match space.parse_name(&entry.name) {
            Some(key) => {
                let comparison = key.comparison_key();
                if matched.contains_key(&comparison) {
                    plan.extra.push(entry.clone());
                } else {
                    matched.insert(
                        comparison,
                        MatchedChild {
                            child: entry.child.clone(),
                            key,
                        },
                    );
                }
            }
            None => plan.extra.push(entry.clone()),
        }
    }

    for key in space.all_variants() {
        let comparison = key.comparison_key();
        let Some(existing) = matched.remove(&comparison) else {
            plan.missing.push(key);
            continue;
        };

        let stale = update_existing
            && match new_hashes.get(&comparison) {
                Some(new_hash) => stored.hash_for(&comparison) != Some(new_hash),
                // Nothing fetched for this key: nothing to compare.
                None => false,
            };
        if stale {
            plan.stale.push(existing);
        } else {
            plan.up_to_date.push(existing);
        }
    }

    // Matched keys outside the desired space (possible with a narrowed
    // axis configuration) are extra.
    for (_, leftover) in matched {
        plan.extra.push(ChildEntry {
            name: space.canonical_name(&leftover.key),
            child: leftover.child,
        });
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::digest;

    fn tiny_space() -> VariantSpace {
        use crate::core::variants::{AxisValue, VariantAxis};
        VariantSpace::new(vec![
            VariantAxis::new(
                "style",
                "Style",
                vec![AxisValue::new("a", "A"), AxisValue::new("b", "B")],
            ),
            VariantAxis::new(
                "size",
                "Size",
                vec![AxisValue::new("16", "16px"), AxisValue::new("32", "32px")],
            ),
        ])
        .unwrap()
    }

    fn entry(name: &str, id: &str) -> ChildEntry {
        ChildEntry {
            child: ChildRef::new(id),
            name: name.to_string(),
        }
    }

    #[test]
    fn empty_entity_is_all_missing() {
        let space = tiny_space();
        let plan = build_plan(
            &space,
            &[],
            &BTreeMap::new(),
            &EntityMetadata::default(),
            true,
        );
        assert_eq!(plan.missing.len(), 4);
        assert!(plan.stale.is_empty());
        assert!(plan.extra.is_empty());
        assert!(!plan.is_clean());
    }

    #[test]
    fn matching_hashes_are_up_to_date() {
        let space = tiny_space();
        let key = space.all_variants().into_iter().next().unwrap();
        let name = space.canonical_name(&key);
        let comparison = key.comparison_key();

        let mut new_hashes = BTreeMap::new();
        new_hashes.insert(comparison.clone(), digest("<svg/>"));
        let mut stored = EntityMetadata::default();
        stored.content_hashes.insert(comparison, digest("<svg/>"));

        let plan = build_plan(&space, &[entry(&name, "1")], &new_hashes, &stored, true);
        assert_eq!(plan.up_to_date.len(), 1);
        assert!(plan.stale.is_empty());
        assert_eq!(plan.missing.len(), 3);
    }

    #[test]
    fn differing_or_absent_stored_hash_is_stale() {
        let space = tiny_space();
        let key = space.all_variants().into_iter().next().unwrap();
        let name = space.canonical_name(&key);

        let mut new_hashes = BTreeMap::new();
        new_hashes.insert(key.comparison_key(), digest("<svg new/>"));

        // No stored record at all: assume changed.
        let plan = build_plan(
            &space,
            &[entry(&name, "1")],
            &new_hashes,
            &EntityMetadata::default(),
            true,
        );
        assert_eq!(plan.stale.len(), 1);

        let mut stored = EntityMetadata::default();
        stored
            .content_hashes
            .insert(key.comparison_key(), digest("<svg old/>"));
        let plan = build_plan(&space, &[entry(&name, "1")], &new_hashes, &stored, true);
        assert_eq!(plan.stale.len(), 1);
        assert!(plan.up_to_date.is_empty());
    }

    #[test]
    fn fill_gaps_never_marks_existing_stale() {
        let space = tiny_space();
        let key = space.all_variants().into_iter().next().unwrap();
        let name = space.canonical_name(&key);

        let mut new_hashes = BTreeMap::new();
        new_hashes.insert(key.comparison_key(), digest("<svg new/>"));

        let plan = build_plan(
            &space,
            &[entry(&name, "1")],
            &new_hashes,
            &EntityMetadata::default(),
            false,
        );
        assert!(plan.stale.is_empty());
        assert_eq!(plan.up_to_date.len(), 1);
    }

    #[test]
    fn unparseable_and_duplicate_children_are_extra() {
        let space = tiny_space();
        let key = space.all_variants().into_iter().next().unwrap();
        let name = space.canonical_name(&key);

        let children = vec![
            entry(&name, "1"),
            entry(&name, "2"),           // duplicate claim
            entry("hand edited junk", "3"), // orphan
        ];
        let plan = build_plan(
            &space,
            &children,
            &BTreeMap::new(),
            &EntityMetadata::default(),
            true,
        );
        assert_eq!(plan.extra.len(), 2);
        assert_eq!(plan.up_to_date.len(), 1);
        assert_eq!(plan.up_to_date[0].child, ChildRef::new("1"));
    }

    #[test]
    fn identical_second_pass_is_clean() {
        let space = tiny_space();
        let mut new_hashes = BTreeMap::new();
        let mut stored = EntityMetadata::default();
        let mut children = Vec::new();
        for (i, key) in space.all_variants().into_iter().enumerate() {
            let comparison = key.comparison_key();
            new_hashes.insert(comparison.clone(), digest("<svg/>"));
            stored.content_hashes.insert(comparison, digest("<svg/>"));
            children.push(entry(&space.canonical_name(&key), &i.to_string()));
        }

        let plan = build_plan(&space, &children, &new_hashes, &stored, true);
        assert!(plan.is_clean());
        assert_eq!(plan.up_to_date.len(), 4);
    }
}
