//! tree::memory
//!
//! In-memory target tree for deterministic testing.
//!
//! # Design
//!
//! Mirrors the adapter contract exactly: positional child order, opaque
//! stable references, string metadata. Failure scenarios are configurable
//! per child name so tests can exercise the engine's write-failure
//! containment, and every mutating call is recorded for verification.

use std::collections::BTreeMap;

use super::{ChildEntry, ChildRef, TargetTree, TreeError};
use crate::core::types::IconName;

/// Recorded mutating operation, for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeOp {
    EnsureEntity { entity: String },
    CreateChild { entity: String, name: String },
    UpdateChild { entity: String, name: String },
    DeleteChild { entity: String, name: String },
    ReorderChild { entity: String, name: String, index: usize },
    SetMetadata { entity: String, key: String },
}

#[derive(Debug, Default, Clone)]
struct EntityNode {
    /// Children in positional order.
    children: Vec<Child>,
    metadata: BTreeMap<String, String>,
}

#[derive(Debug, Clone)]
struct Child {
    id: u64,
    name: String,
    content: String,
}

/// In-memory target tree.
#[derive(Debug, Default)]
pub struct MemoryTree {
    entities: BTreeMap<String, EntityNode>,
    next_id: u64,
    /// Child names whose create/update calls fail.
    fail_writes_for: Vec<String>,
    /// Recorded mutating operations.
    operations: Vec<TreeOp>,
}

impl MemoryTree {
    /// Create an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make create/update fail for children with this exact name.
    pub fn fail_writes_for(&mut self, name: impl Into<String>) {
        self.fail_writes_for.push(name.into());
    }

    /// Recorded mutating operations, in call order.
    pub fn operations(&self) -> &[TreeOp] {
        &self.operations
    }

    /// Child content by name, for assertions.
    pub fn child_content(&self, entity: &IconName, name: &str) -> Option<&str> {
        self.entities
            .get(entity.as_str())?
            .children
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.content.as_str())
    }

    /// Child names in positional order, for assertions.
    pub fn child_names(&self, entity: &IconName) -> Vec<String> {
        self.entities
            .get(entity.as_str())
            .map(|node| node.children.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default()
    }

    fn node(&self, entity: &IconName) -> Result<&EntityNode, TreeError> {
        self.entities
            .get(entity.as_str())
            .ok_or_else(|| TreeError::EntityNotFound(entity.to_string()))
    }

    fn node_mut(&mut self, entity: &IconName) -> Result<&mut EntityNode, TreeError> {
        self.entities
            .get_mut(entity.as_str())
            .ok_or_else(|| TreeError::EntityNotFound(entity.to_string()))
    }

    fn position(node: &EntityNode, entity: &IconName, child: &ChildRef) -> Result<usize, TreeError> {
        node.children
            .iter()
            .position(|c| c.id.to_string() == child.as_str())
            .ok_or_else(|| TreeError::ChildNotFound {
                entity: entity.to_string(),
                child: child.to_string(),
            })
    }
}

impl TargetTree for MemoryTree {
    fn entity_exists(&self, entity: &IconName) -> Result<bool, TreeError> {
        Ok(self.entities.contains_key(entity.as_str()))
    }

    fn ensure_entity(&mut self, entity: &IconName) -> Result<(), TreeError> {
        self.operations.push(TreeOp::EnsureEntity {
            entity: entity.to_string(),
        });
        self.entities.entry(entity.to_string()).or_default();
        Ok(())
    }

    fn list_children(&self, entity: &IconName) -> Result<Vec<ChildEntry>, TreeError> {
        let node = self.node(entity)?;
        Ok(node
            .children
            .iter()
            .map(|c| ChildEntry {
                child: ChildRef::new(c.id.to_string()),
                name: c.name.clone(),
            })
            .collect())
    }

    fn read_child(&self, entity: &IconName, child: &ChildRef) -> Result<String, TreeError> {
        let node = self.node(entity)?;
        let pos = Self::position(node, entity, child)?;
        Ok(node.children[pos].content.clone())
    }

    fn create_child(
        &mut self,
        entity: &IconName,
        name: &str,
        content: &str,
    ) -> Result<ChildRef, TreeError> {
        if self.fail_writes_for.iter().any(|n| n == name) {
            return Err(TreeError::WriteFailed {
                entity: entity.to_string(),
                name: name.to_string(),
                reason: "injected failure".into(),
            });
        }

        let id = self.next_id;
        {
            let node = self.node_mut(entity)?;
            if node.children.iter().any(|c| c.name == name) {
                return Err(TreeError::ChildExists {
                    entity: entity.to_string(),
                    name: name.to_string(),
                });
            }
            node.children.push(Child {
                id,
                name: name.to_string(),
                content: content.to_string(),
            });
        }
        self.next_id += 1;
        self.operations.push(TreeOp::CreateChild {
            entity: entity.to_string(),
            name: name.to_string(),
        });
        Ok(ChildRef::new(id.to_string()))
    }

    fn update_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        content: &str,
    ) -> Result<(), TreeError> {
        let entity_name = entity.to_string();
        let fail = {
            let node = self.node(entity)?;
            let pos = Self::position(node, entity, child)?;
            let name = node.children[pos].name.clone();
            if self.fail_writes_for.iter().any(|n| *n == name) {
                Some(name)
            } else {
                self.operations.push(TreeOp::UpdateChild {
                    entity: entity_name.clone(),
                    name,
                });
                None
            }
        };
        if let Some(name) = fail {
            return Err(TreeError::WriteFailed {
                entity: entity_name,
                name,
                reason: "injected failure".into(),
            });
        }

        let node = self.node_mut(entity)?;
        let pos = Self::position(node, entity, child)?;
        node.children[pos].content = content.to_string();
        Ok(())
    }

    fn delete_child(&mut self, entity: &IconName, child: &ChildRef) -> Result<(), TreeError> {
        let entity_name = entity.to_string();
        let node = self.node_mut(entity)?;
        let pos = Self::position(node, entity, child)?;
        let removed = node.children.remove(pos);
        self.operations.push(TreeOp::DeleteChild {
            entity: entity_name,
            name: removed.name,
        });
        Ok(())
    }

    fn reorder_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        index: usize,
    ) -> Result<(), TreeError> {
        let entity_name = entity.to_string();
        let node = self.node_mut(entity)?;
        let pos = Self::position(node, entity, child)?;
        let moved = node.children.remove(pos);
        let index = index.min(node.children.len());
        let name = moved.name.clone();
        node.children.insert(index, moved);
        self.operations.push(TreeOp::ReorderChild {
            entity: entity_name,
            name,
            index,
        });
        Ok(())
    }

    fn get_metadata(&self, entity: &IconName, key: &str) -> Result<Option<String>, TreeError> {
        Ok(self.node(entity)?.metadata.get(key).cloned())
    }

    fn set_metadata(
        &mut self,
        entity: &IconName,
        key: &str,
        value: &str,
    ) -> Result<(), TreeError> {
        self.operations.push(TreeOp::SetMetadata {
            entity: entity.to_string(),
            key: key.to_string(),
        });
        self.node_mut(entity)?
            .metadata
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn icon(s: &str) -> IconName {
        IconName::new(s).unwrap()
    }

    #[test]
    fn create_list_read_round_trip() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        let a = tree.create_child(&home, "A", "content-a").unwrap();
        tree.create_child(&home, "B", "content-b").unwrap();

        let children = tree.list_children(&home).unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].name, "A");
        assert_eq!(tree.read_child(&home, &a).unwrap(), "content-a");
    }

    #[test]
    fn missing_entity_errors() {
        let tree = MemoryTree::new();
        assert!(matches!(
            tree.list_children(&icon("nope")),
            Err(TreeError::EntityNotFound(_))
        ));
        assert!(!tree.entity_exists(&icon("nope")).unwrap());
    }

    #[test]
    fn update_preserves_identity_and_position() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        tree.create_child(&home, "A", "a1").unwrap();
        let b = tree.create_child(&home, "B", "b1").unwrap();
        tree.create_child(&home, "C", "c1").unwrap();

        tree.update_child(&home, &b, "b2").unwrap();
        let children = tree.list_children(&home).unwrap();
        assert_eq!(children[1].name, "B");
        assert_eq!(tree.read_child(&home, &b).unwrap(), "b2");
    }

    #[test]
    fn reorder_moves_to_front() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        tree.create_child(&home, "A", "a").unwrap();
        tree.create_child(&home, "B", "b").unwrap();
        let c = tree.create_child(&home, "C", "c").unwrap();

        tree.reorder_child(&home, &c, 0).unwrap();
        assert_eq!(tree.child_names(&home), vec!["C", "A", "B"]);
    }

    #[test]
    fn injected_write_failure_leaves_prior_state() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        let a = tree.create_child(&home, "A", "original").unwrap();

        tree.fail_writes_for("A");
        assert!(tree.update_child(&home, &a, "new").is_err());
        assert_eq!(tree.read_child(&home, &a).unwrap(), "original");

        assert!(tree.create_child(&home, "A", "dup").is_err());
    }

    #[test]
    fn metadata_absence_is_none() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        assert_eq!(tree.get_metadata(&home, "k").unwrap(), None);
        tree.set_metadata(&home, "k", "v").unwrap();
        assert_eq!(tree.get_metadata(&home, "k").unwrap(), Some("v".into()));
    }

    #[test]
    fn operations_are_recorded_in_order() {
        let mut tree = MemoryTree::new();
        let home = icon("home");
        tree.ensure_entity(&home).unwrap();
        let a = tree.create_child(&home, "A", "a").unwrap();
        tree.delete_child(&home, &a).unwrap();

        assert_eq!(
            tree.operations(),
            &[
                TreeOp::EnsureEntity {
                    entity: "home".into()
                },
                TreeOp::CreateChild {
                    entity: "home".into(),
                    name: "A".into()
                },
                TreeOp::DeleteChild {
                    entity: "home".into(),
                    name: "A".into()
                },
            ]
        );
    }
}
