//! engine::reconcile
//!
//! Plan application: the only code that mutates the target tree.
//!
//! # Order of operations
//!
//! 1. Delete `extra` (when permitted) before any create, so a create never
//!    collides with stale leftover state
//! 2. Update `stale` in place, preserving identity and position
//! 3. Create `missing`
//! 4. Re-pick the default variant over the resulting children and enforce
//!    ordering (default first, remainder alphabetical) unconditionally,
//!    because downstream consumers rely on position
//! 5. Stamp the version token, even when zero children changed
//!
//! A single child's failure is recorded and skipped; it never aborts the
//! rest of the entity. A failed update drops that child's stored hash so
//! the next differing-version run rewrites it.

use std::collections::BTreeMap;

use super::plan::ReconciliationPlan;
use crate::core::metadata::EntityMetadata;
use crate::core::types::{ContentHash, IconName, VersionToken};
use crate::core::variants::{pick_default, PreferenceTable, VariantSpace};
use crate::fetch::FetchedContent;
use crate::tree::{TargetTree, TreeError};

/// One contained child-level failure.
#[derive(Debug)]
pub struct WriteFailure {
    /// Child name the operation targeted.
    pub name: String,
    pub error: TreeError,
}

/// Counts and failures from applying one plan.
#[derive(Debug, Default)]
pub struct ReconcileOutcome {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub failures: Vec<WriteFailure>,
}

impl ReconcileOutcome {
    /// Children touched by content writes.
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

/// Apply a plan to one entity.
///
/// `fetched` maps comparison keys to fetched content; `stored` is the
/// entity's prior metadata record. Returns `Err` only for entity-level
/// failures (the container itself cannot be read or created); child-level
/// failures land in the outcome.
#[allow(clippy::too_many_arguments)]
pub fn apply(
    tree: &mut dyn TargetTree,
    entity: &IconName,
    space: &VariantSpace,
    prefs: &PreferenceTable,
    plan: ReconciliationPlan,
    fetched: &BTreeMap<String, FetchedContent>,
    stored: &EntityMetadata,
    version: &VersionToken,
    delete_extra: bool,
) -> Result<ReconcileOutcome, TreeError> {
    tree.ensure_entity(entity)?;

    let mut outcome = ReconcileOutcome::default();
    let mut hashes: BTreeMap<String, ContentHash> = BTreeMap::new();

    // Deletes first.
    if delete_extra {
        for entry in &plan.extra {
            match tree.delete_child(entity, &entry.child) {
                Ok(()) => outcome.deleted += 1,
                Err(error) => outcome.failures.push(WriteFailure {
                    name: entry.name.clone(),
                    error,
                }),
            }
        }
    }

    // Untouched children keep whatever trust they had.
    for existing in &plan.up_to_date {
        let comparison = existing.key.comparison_key();
        if let Some(hash) = stored.hash_for(&comparison) {
            hashes.insert(comparison, hash.clone());
        }
    }

    for stale in &plan.stale {
        let comparison = stale.key.comparison_key();
        let name = space.canonical_name(&stale.key);
        let Some(content) = fetched.get(&comparison) else {
            outcome.failures.push(WriteFailure {
                name,
                error: TreeError::WriteFailed {
                    entity: entity.to_string(),
                    name: space.canonical_name(&stale.key),
                    reason: "no fetched content for stale variant".into(),
                },
            });
            continue;
        };
        match tree.update_child(entity, &stale.child, &content.body) {
            Ok(()) => {
                outcome.updated += 1;
                hashes.insert(comparison, content.hash.clone());
            }
            Err(error) => outcome.failures.push(WriteFailure { name, error }),
        }
    }

    for key in &plan.missing {
        let comparison = key.comparison_key();
        let name = space.canonical_name(key);
        let Some(content) = fetched.get(&comparison) else {
            outcome.failures.push(WriteFailure {
                name: name.clone(),
                error: TreeError::WriteFailed {
                    entity: entity.to_string(),
                    name,
                    reason: "no fetched content for missing variant".into(),
                },
            });
            continue;
        };
        match tree.create_child(entity, &name, &content.body) {
            Ok(_) => {
                outcome.created += 1;
                hashes.insert(comparison, content.hash.clone());
            }
            Err(error) => outcome.failures.push(WriteFailure { name, error }),
        }
    }

    enforce_ordering(tree, entity, space, prefs, &mut outcome);

    // Version stamp is unconditional: "checked at V, nothing needed" must
    // be durable.
    let record = EntityMetadata {
        version_token: Some(version.clone()),
        content_hashes: hashes,
    };
    record.store(tree, entity)?;

    Ok(outcome)
}

/// Re-stamp only the version token, leaving children and hashes alone.
pub fn bump_version(
    tree: &mut dyn TargetTree,
    entity: &IconName,
    stored: &EntityMetadata,
    version: &VersionToken,
) -> Result<(), TreeError> {
    let record = EntityMetadata {
        version_token: Some(version.clone()),
        content_hashes: stored.content_hashes.clone(),
    };
    record.store(tree, entity)
}

/// Default variant to the front, remainder alphabetical by name.
fn enforce_ordering(
    tree: &mut dyn TargetTree,
    entity: &IconName,
    space: &VariantSpace,
    prefs: &PreferenceTable,
    outcome: &mut ReconcileOutcome,
) {
    let children = match tree.list_children(entity) {
        Ok(children) => children,
        Err(error) => {
            outcome.failures.push(WriteFailure {
                name: entity.to_string(),
                error,
            });
            return;
        }
    };
    if children.len() < 2 {
        return;
    }

    let parsed: Vec<_> = children
        .iter()
        .filter_map(|entry| space.parse_name(&entry.name).map(|key| (entry, key)))
        .collect();
    let keys: Vec<_> = parsed.iter().map(|(_, key)| key.clone()).collect();
    // Legacy trees can carry comparison-key child names, which never equal
    // the canonical display name; match the picked default by key.
    let default_name = pick_default(space, &keys, prefs).and_then(|default| {
        parsed
            .iter()
            .find(|(_, key)| key == default)
            .map(|(entry, _)| entry.name.clone())
    });

    let mut ordered: Vec<_> = children.iter().collect();
    ordered.sort_by(|a, b| {
        let a_default = Some(&a.name) == default_name.as_ref();
        let b_default = Some(&b.name) == default_name.as_ref();
        b_default.cmp(&a_default).then_with(|| a.name.cmp(&b.name))
    });

    for (index, entry) in ordered.into_iter().enumerate() {
        if let Err(error) = tree.reorder_child(entity, &entry.child, index) {
            outcome.failures.push(WriteFailure {
                name: entry.name.clone(),
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::digest;
    use crate::core::variants::{AxisValue, VariantAxis, VariantKey};
    use crate::engine::plan::build_plan;
    use crate::tree::memory::MemoryTree;
    use crate::tree::ChildEntry;

    fn tiny_space() -> VariantSpace {
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

    fn icon(s: &str) -> IconName {
        IconName::new(s).unwrap()
    }

    fn token(s: &str) -> VersionToken {
        VersionToken::new(s).unwrap()
    }

    fn fetched_for(space: &VariantSpace, body_for: impl Fn(&VariantKey) -> String) -> BTreeMap<String, FetchedContent> {
        use crate::fetch::SourceReference;
        space
            .all_variants()
            .into_iter()
            .map(|key| {
                let body = body_for(&key);
                (
                    key.comparison_key(),
                    FetchedContent {
                        reference: SourceReference {
                            entity: icon("home"),
                            key: key.clone(),
                            url: format!("https://example.test/{}", key.slug()),
                        },
                        hash: digest(&body),
                        body,
                    },
                )
            })
            .collect()
    }

    fn full_generate(tree: &mut MemoryTree, space: &VariantSpace) -> ReconcileOutcome {
        let home = icon("home");
        let fetched = fetched_for(space, |key| format!("<svg {}/>", key.slug()));
        let plan = build_plan(space, &[], &fetched_hashes(&fetched), &EntityMetadata::default(), true);
        apply(
            tree,
            &home,
            space,
            &PreferenceTable::for_space(space),
            plan,
            &fetched,
            &EntityMetadata::default(),
            &token("v1"),
            true,
        )
        .unwrap()
    }

    fn fetched_hashes(fetched: &BTreeMap<String, FetchedContent>) -> BTreeMap<String, ContentHash> {
        fetched
            .iter()
            .map(|(k, v)| (k.clone(), v.hash.clone()))
            .collect()
    }

    #[test]
    fn full_generate_creates_everything_and_stamps() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        let outcome = full_generate(&mut tree, &space);

        assert_eq!(outcome.created, 4);
        assert!(outcome.failures.is_empty());

        let home = icon("home");
        let meta = EntityMetadata::load(&tree, &home).unwrap();
        assert_eq!(meta.version_token, Some(token("v1")));
        assert_eq!(meta.content_hashes.len(), 4);

        // Default variant (first value of every axis) leads the ordering.
        let names = tree.child_names(&home);
        assert_eq!(names[0], "Style=A, Size=16px");
        let mut rest = names[1..].to_vec();
        let mut sorted = rest.clone();
        sorted.sort();
        rest.sort();
        assert_eq!(rest, sorted);
    }

    #[test]
    fn second_identical_pass_changes_nothing_but_restamps() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        let fetched = fetched_for(&space, |key| format!("<svg {}/>", key.slug()));
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert!(plan.is_clean());

        let outcome = apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v2"),
            true,
        )
        .unwrap();
        assert_eq!(outcome.written(), 0);
        assert_eq!(outcome.deleted, 0);

        let meta = EntityMetadata::load(&tree, &home).unwrap();
        assert_eq!(meta.version_token, Some(token("v2")));
    }

    #[test]
    fn stale_children_are_updated_in_place() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        // One variant's content changed upstream.
        let changed_key = space.all_variants().into_iter().next().unwrap();
        let fetched = fetched_for(&space, |key| {
            if key == &changed_key {
                "<svg changed/>".to_string()
            } else {
                format!("<svg {}/>", key.slug())
            }
        });
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert_eq!(plan.stale.len(), 1);

        let outcome = apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v2"),
            true,
        )
        .unwrap();
        assert_eq!(outcome.updated, 1);
        assert_eq!(outcome.created, 0);

        let name = space.canonical_name(&changed_key);
        assert_eq!(tree.child_content(&home, &name), Some("<svg changed/>"));
    }

    #[test]
    fn extra_children_are_deleted_only_when_permitted() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");
        tree.create_child(&home, "hand edited junk", "<garbage/>").unwrap();

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        let fetched = fetched_for(&space, |key| format!("<svg {}/>", key.slug()));

        // Deletion off: the orphan survives.
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert_eq!(plan.extra.len(), 1);
        let outcome = apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v2"),
            false,
        )
        .unwrap();
        assert_eq!(outcome.deleted, 0);
        assert!(tree.child_names(&home).contains(&"hand edited junk".to_string()));

        // Deletion on: it goes.
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        let outcome = apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v2"),
            true,
        )
        .unwrap();
        assert_eq!(outcome.deleted, 1);
        assert!(!tree.child_names(&home).contains(&"hand edited junk".to_string()));
    }

    #[test]
    fn child_write_failure_is_contained_and_drops_its_hash() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        let victim_key = space.all_variants().into_iter().next().unwrap();
        let victim_name = space.canonical_name(&victim_key);
        tree.fail_writes_for(victim_name.clone());

        let fetched = fetched_for(&space, |_| "<svg all changed/>".to_string());
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert_eq!(plan.stale.len(), 4);

        let outcome = apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v2"),
            true,
        )
        .unwrap();
        assert_eq!(outcome.updated, 3);
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].name, victim_name);

        // The failed child keeps prior content; its hash entry is gone so
        // a later run re-checks it.
        assert_eq!(
            tree.child_content(&home, &victim_name),
            Some(format!("<svg {}/>", victim_key.slug()).as_str())
        );
        let meta = EntityMetadata::load(&tree, &home).unwrap();
        assert_eq!(meta.hash_for(&victim_key.comparison_key()), None);
        assert_eq!(meta.version_token, Some(token("v2")));
    }

    #[test]
    fn ordering_runs_even_when_nothing_changed() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");

        // Shove the default to the back by hand.
        let children = tree.list_children(&home).unwrap();
        let default = children[0].child.clone();
        tree.reorder_child(&home, &default, 3).unwrap();
        assert_ne!(tree.child_names(&home)[0], "Style=A, Size=16px");

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        let fetched = fetched_for(&space, |key| format!("<svg {}/>", key.slug()));
        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert!(plan.is_clean());

        apply(
            &mut tree,
            &home,
            &space,
            &PreferenceTable::for_space(&space),
            plan,
            &fetched,
            &stored,
            &token("v1"),
            true,
        )
        .unwrap();
        assert_eq!(tree.child_names(&home)[0], "Style=A, Size=16px");
    }

    #[test]
    fn comparison_key_named_children_still_get_the_default_fronted() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        // Older trees carry comparison-key child names; parsing accepts
        // them, and updates preserve them in place.
        for key in space.all_variants() {
            tree.create_child(&home, &key.comparison_key(), &format!("<svg {}/>", key.slug()))
                .unwrap();
        }

        let fetched = fetched_for(&space, |key| format!("<svg {}/>", key.slug()));
        let stored = EntityMetadata {
            version_token: Some(token("v1")),
            content_hashes: fetched_hashes(&fetched),
        };
        let prefs = PreferenceTable::new(
            vec![("style".into(), "b".into()), ("size".into(), "32".into())],
            vec!["style".into(), "size".into()],
        );

        let children = tree.list_children(&home).unwrap();
        let plan = build_plan(&space, &children, &fetched_hashes(&fetched), &stored, true);
        assert!(plan.is_clean());

        apply(
            &mut tree,
            &home,
            &space,
            &prefs,
            plan,
            &fetched,
            &stored,
            &token("v2"),
            true,
        )
        .unwrap();

        let names = tree.child_names(&home);
        assert_eq!(names[0], "size=32;style=b");
        assert_eq!(
            &names[1..],
            ["size=16;style=a", "size=16;style=b", "size=32;style=a"]
        );
    }

    #[test]
    fn version_bump_only_touches_metadata() {
        let space = tiny_space();
        let mut tree = MemoryTree::new();
        full_generate(&mut tree, &space);
        let home = icon("home");
        let before_ops = tree.operations().len();

        let stored = EntityMetadata::load(&tree, &home).unwrap();
        bump_version(&mut tree, &home, &stored, &token("v2")).unwrap();

        let meta = EntityMetadata::load(&tree, &home).unwrap();
        assert_eq!(meta.version_token, Some(token("v2")));
        assert_eq!(meta.content_hashes, stored.content_hashes);

        // Only metadata writes were issued.
        let new_ops = &tree.operations()[before_ops..];
        assert!(new_ops
            .iter()
            .all(|op| matches!(op, crate::tree::memory::TreeOp::SetMetadata { .. })));
    }
}
