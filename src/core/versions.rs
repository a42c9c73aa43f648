//! core::versions
//!
//! Version graph tracking across non-consecutive source revisions.
//!
//! # Architecture
//!
//! A [`ChangeManifest`] is a set of directed [`VersionEdge`]s, each carrying
//! the entity names that changed between two adjacent revisions (plus newly
//! added names and group renames). Edges are supplied externally per run;
//! this module only composes them. When a run jumps several revisions at
//! once, cumulative answers come from breadth-first search over the edge
//! set.
//!
//! # Invariants
//!
//! - The edge set must be acyclic; [`ChangeManifest::new`] rejects cyclic
//!   input at ingestion instead of letting the BFS tie-break resolve a
//!   cycle arbitrarily
//! - No path between two revisions is not an error: [`ChangeManifest::has_changed`]
//!   fails safe toward "assume changed"

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::types::{IconName, VersionToken};

/// Errors from manifest ingestion.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The edge set contains a cycle.
    #[error("cyclic version edges detected at: {0}")]
    CyclicEdges(String),

    /// A (from, to) pair appears on more than one edge.
    #[error("duplicate edge: {from} -> {to}")]
    DuplicateEdge { from: String, to: String },

    /// Failed to parse manifest JSON.
    #[error("failed to parse manifest: {0}")]
    Parse(#[from] serde_json::Error),

    /// Failed to read a manifest file.
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A group rename carried on an edge, keyed by a stable group number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRename {
    /// Stable group number.
    pub group: u64,
    /// Label before this edge.
    pub from: String,
    /// Label after this edge.
    pub to: String,
}

/// A direct revision-to-revision delta.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionEdge {
    /// Source revision.
    pub from: VersionToken,
    /// Target revision.
    pub to: VersionToken,
    /// Entity names that changed along this edge.
    #[serde(default)]
    pub changed: HashSet<IconName>,
    /// Entity names introduced along this edge.
    #[serde(default)]
    pub added: HashSet<IconName>,
    /// Group renames along this edge.
    #[serde(default)]
    pub renames: Vec<GroupRename>,
}

impl VersionEdge {
    /// Create an edge with change sets and no renames.
    pub fn new(
        from: VersionToken,
        to: VersionToken,
        changed: impl IntoIterator<Item = IconName>,
        added: impl IntoIterator<Item = IconName>,
    ) -> Self {
        Self {
            from,
            to,
            changed: changed.into_iter().collect(),
            added: added.into_iter().collect(),
            renames: Vec::new(),
        }
    }

    /// Whether this edge touches the entity (changed or newly added).
    fn touches(&self, entity: &IconName) -> bool {
        self.changed.contains(entity) || self.added.contains(entity)
    }
}

/// Serialized manifest file shape.
#[derive(Debug, Serialize, Deserialize)]
struct ManifestFile {
    edges: Vec<VersionEdge>,
}

/// A validated collection of version edges with indexed lookup.
#[derive(Debug, Clone, Default)]
pub struct ChangeManifest {
    edges: Vec<VersionEdge>,
    /// Outgoing edge indices per source revision.
    by_from: HashMap<VersionToken, Vec<usize>>,
}

impl ChangeManifest {
    /// An empty manifest: every cumulative query fails safe.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ingest and validate an edge set.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::CyclicEdges` for cyclic input and
    /// `ManifestError::DuplicateEdge` when the same (from, to) pair appears
    /// twice.
    pub fn new(edges: Vec<VersionEdge>) -> Result<Self, ManifestError> {
        let mut by_from: HashMap<VersionToken, Vec<usize>> = HashMap::new();
        let mut seen_pairs = HashSet::new();
        for (i, edge) in edges.iter().enumerate() {
            if !seen_pairs.insert((edge.from.clone(), edge.to.clone())) {
                return Err(ManifestError::DuplicateEdge {
                    from: edge.from.to_string(),
                    to: edge.to.to_string(),
                });
            }
            by_from.entry(edge.from.clone()).or_default().push(i);
        }

        let manifest = Self { edges, by_from };
        if let Some(at) = manifest.find_cycle() {
            return Err(ManifestError::CyclicEdges(at.to_string()));
        }
        Ok(manifest)
    }

    /// Parse a manifest from its JSON form (`{"edges": [...]}`).
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        let file: ManifestFile = serde_json::from_str(json)?;
        Self::new(file.edges)
    }

    /// Load a manifest from a JSON file.
    pub fn load(path: &std::path::Path) -> Result<Self, ManifestError> {
        let json = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// The validated edges.
    pub fn edges(&self) -> &[VersionEdge] {
        &self.edges
    }

    /// Find the direct edge between two revisions, if one exists.
    pub fn direct_edge(&self, from: &VersionToken, to: &VersionToken) -> Option<&VersionEdge> {
        self.outgoing(from).find(|edge| &edge.to == to)
    }

    /// Did `entity` change between `from` and `to`?
    ///
    /// A direct edge answers immediately from its change sets. Otherwise a
    /// breadth-first search composes edges, accumulating whether any edge
    /// along the path touched the entity. When multiple paths reach `to`,
    /// the first one discovered in BFS level order is authoritative - a
    /// documented choice, since manifests are expected to form a simple
    /// chain or tree. No path at all fails safe: the answer is `true`,
    /// re-processing a possibly-unchanged entity rather than silently
    /// skipping a changed one.
    ///
    /// Newly added entities count as changed: an entity introduced between
    /// the two revisions certainly differs from what the target holds.
    pub fn has_changed(&self, entity: &IconName, from: &VersionToken, to: &VersionToken) -> bool {
        if from == to {
            return false;
        }
        if let Some(edge) = self.direct_edge(from, to) {
            return edge.touches(entity);
        }

        let mut visited: HashSet<&VersionToken> = HashSet::new();
        let mut queue: VecDeque<(&VersionToken, bool)> = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, false));

        while let Some((version, touched)) = queue.pop_front() {
            for edge in self.outgoing(version) {
                let touched = touched || edge.touches(entity);
                if &edge.to == to {
                    return touched;
                }
                if visited.insert(&edge.to) {
                    queue.push_back((&edge.to, touched));
                }
            }
        }

        // No path: assume changed.
        true
    }

    /// Resolve the final label of group `group` across the path from `from`
    /// to `to`.
    ///
    /// Same BFS shape as [`Self::has_changed`], threading the current label
    /// forward: a rename applies only when the edge's rename list matches
    /// both the group id and the label-so-far. Absence of a path returns
    /// the original label unchanged.
    pub fn resolve_final_group_label(
        &self,
        group: u64,
        start_label: &str,
        from: &VersionToken,
        to: &VersionToken,
    ) -> String {
        if from == to {
            return start_label.to_string();
        }

        let mut visited: HashSet<&VersionToken> = HashSet::new();
        let mut queue: VecDeque<(&VersionToken, String)> = VecDeque::new();
        visited.insert(from);
        queue.push_back((from, start_label.to_string()));

        while let Some((version, label)) = queue.pop_front() {
            for edge in self.outgoing(version) {
                let label = apply_renames(&edge.renames, group, &label);
                if &edge.to == to {
                    return label;
                }
                if visited.insert(&edge.to) {
                    queue.push_back((&edge.to, label));
                }
            }
        }

        start_label.to_string()
    }

    fn outgoing(&self, from: &VersionToken) -> impl Iterator<Item = &VersionEdge> {
        self.by_from
            .get(from)
            .into_iter()
            .flatten()
            .map(|&i| &self.edges[i])
    }

    /// Detect a cycle in the edge set, returning a revision on the cycle.
    fn find_cycle(&self) -> Option<&VersionToken> {
        let mut visited = HashSet::new();
        let mut path = HashSet::new();

        for start in self.by_from.keys() {
            if self.has_cycle_from(start, &mut visited, &mut path) {
                return Some(start);
            }
        }
        None
    }

    fn has_cycle_from<'a>(
        &'a self,
        version: &'a VersionToken,
        visited: &mut HashSet<&'a VersionToken>,
        path: &mut HashSet<&'a VersionToken>,
    ) -> bool {
        if path.contains(version) {
            return true;
        }
        if visited.contains(version) {
            return false;
        }

        visited.insert(version);
        path.insert(version);

        for edge in self.outgoing(version) {
            if self.has_cycle_from(&edge.to, visited, path) {
                return true;
            }
        }

        path.remove(version);
        false
    }
}

fn apply_renames(renames: &[GroupRename], group: u64, label: &str) -> String {
    for rename in renames {
        if rename.group == group && rename.from == label {
            return rename.to.clone();
        }
    }
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(s: &str) -> VersionToken {
        VersionToken::new(s).unwrap()
    }

    fn icon(s: &str) -> IconName {
        IconName::new(s).unwrap()
    }

    fn chain_a_b_c() -> ChangeManifest {
        // A -> B changed {x}, B -> C changed {y}
        ChangeManifest::new(vec![
            VersionEdge::new(token("va"), token("vb"), [icon("x")], []),
            VersionEdge::new(token("vb"), token("vc"), [icon("y")], []),
        ])
        .unwrap()
    }

    #[test]
    fn direct_edge_answers_without_search() {
        let manifest = chain_a_b_c();
        assert!(manifest.has_changed(&icon("x"), &token("va"), &token("vb")));
        assert!(!manifest.has_changed(&icon("y"), &token("va"), &token("vb")));
    }

    #[test]
    fn cumulative_union_over_a_chain() {
        let manifest = chain_a_b_c();
        assert!(manifest.has_changed(&icon("x"), &token("va"), &token("vc")));
        assert!(manifest.has_changed(&icon("y"), &token("va"), &token("vc")));
        // Path exists and "z" is in no change set along it.
        assert!(!manifest.has_changed(&icon("z"), &token("va"), &token("vc")));
    }

    #[test]
    fn no_path_assumes_changed() {
        let manifest = chain_a_b_c();
        assert!(manifest.has_changed(&icon("x"), &token("vc"), &token("va")));
        assert!(manifest.has_changed(&icon("z"), &token("unknown"), &token("vc")));
        assert!(ChangeManifest::empty().has_changed(&icon("x"), &token("va"), &token("vb")));
    }

    #[test]
    fn same_version_never_changed() {
        let manifest = chain_a_b_c();
        assert!(!manifest.has_changed(&icon("x"), &token("va"), &token("va")));
    }

    #[test]
    fn added_entities_count_as_changed() {
        let manifest = ChangeManifest::new(vec![VersionEdge::new(
            token("va"),
            token("vb"),
            [],
            [icon("brand_new")],
        )])
        .unwrap();
        assert!(manifest.has_changed(&icon("brand_new"), &token("va"), &token("vb")));
    }

    #[test]
    fn rename_threads_forward_only_when_label_matches() {
        let mut edge1 = VersionEdge::new(token("va"), token("vb"), [], []);
        edge1.renames.push(GroupRename {
            group: 7,
            from: "Navigation".into(),
            to: "Wayfinding".into(),
        });
        let mut edge2 = VersionEdge::new(token("vb"), token("vc"), [], []);
        edge2.renames.push(GroupRename {
            group: 7,
            from: "Wayfinding".into(),
            to: "Maps".into(),
        });
        // Rename for a different group must not apply.
        edge2.renames.push(GroupRename {
            group: 9,
            from: "Maps".into(),
            to: "Other".into(),
        });
        let manifest = ChangeManifest::new(vec![edge1, edge2]).unwrap();

        assert_eq!(
            manifest.resolve_final_group_label(7, "Navigation", &token("va"), &token("vc")),
            "Maps"
        );
        // Label that never matched the chain passes through untouched.
        assert_eq!(
            manifest.resolve_final_group_label(7, "Media", &token("va"), &token("vc")),
            "Media"
        );
        // No path: original label unchanged.
        assert_eq!(
            manifest.resolve_final_group_label(7, "Navigation", &token("vc"), &token("va")),
            "Navigation"
        );
    }

    #[test]
    fn cyclic_edges_are_rejected_at_ingestion() {
        let result = ChangeManifest::new(vec![
            VersionEdge::new(token("va"), token("vb"), [], []),
            VersionEdge::new(token("vb"), token("va"), [], []),
        ]);
        assert!(matches!(result, Err(ManifestError::CyclicEdges(_))));
    }

    #[test]
    fn duplicate_edges_are_rejected() {
        let result = ChangeManifest::new(vec![
            VersionEdge::new(token("va"), token("vb"), [icon("x")], []),
            VersionEdge::new(token("va"), token("vb"), [icon("y")], []),
        ]);
        assert!(matches!(result, Err(ManifestError::DuplicateEdge { .. })));
    }

    #[test]
    fn bfs_level_order_is_authoritative_for_parallel_paths() {
        // va -> vb -> vd and va -> vc -> vd; both reach vd. The edge list
        // order makes the vb path the first discovered.
        let manifest = ChangeManifest::new(vec![
            VersionEdge::new(token("va"), token("vb"), [icon("x")], []),
            VersionEdge::new(token("va"), token("vc"), [], []),
            VersionEdge::new(token("vb"), token("vd"), [], []),
            VersionEdge::new(token("vc"), token("vd"), [], []),
        ])
        .unwrap();

        assert!(manifest.has_changed(&icon("x"), &token("va"), &token("vd")));
    }

    #[test]
    fn manifest_round_trips_through_json() {
        let manifest = chain_a_b_c();
        let json = serde_json::to_string(&ManifestFile {
            edges: manifest.edges().to_vec(),
        })
        .unwrap();
        let back = ChangeManifest::from_json(&json).unwrap();
        assert!(back.has_changed(&icon("x"), &token("va"), &token("vc")));
        assert!(!back.has_changed(&icon("z"), &token("va"), &token("vc")));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            ChangeManifest::from_json("{not json"),
            Err(ManifestError::Parse(_))
        ));
    }
}
