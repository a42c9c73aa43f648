//! tree
//!
//! Target-tree adapter: the single doorway to the host-owned tree.
//!
//! # Architecture
//!
//! The host application owns the persistent tree of entities and their
//! variant children; glyphsync only mutates it through the [`TargetTree`]
//! trait. Per the reconciliation contract, the engine is the only caller of
//! the mutating methods, and no two entities are ever mutated concurrently.
//!
//! Implementations:
//! - [`memory::MemoryTree`] - deterministic in-memory tree for tests
//! - [`dir::DirTree`] - directory-backed tree used by the CLI
//!
//! # Contract
//!
//! - A failed `create_child`/`update_child` leaves the prior child (if any)
//!   intact
//! - `list_children` reflects positional order; `reorder_child` moves a
//!   child to an index
//! - Metadata is an opaque string key/value store per entity; absence is a
//!   valid answer, not an error

pub mod dir;
pub mod memory;

use thiserror::Error;

use crate::core::types::IconName;

/// Errors from target-tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The entity container does not exist.
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// The referenced child does not exist under the entity.
    #[error("child not found under '{entity}': {child}")]
    ChildNotFound { entity: String, child: String },

    /// A child create/update was refused; prior state is intact.
    #[error("write failed for '{name}' under '{entity}': {reason}")]
    WriteFailed {
        entity: String,
        name: String,
        reason: String,
    },

    /// A child with that name already exists.
    #[error("child already exists under '{entity}': {name}")]
    ChildExists { entity: String, name: String },

    /// Underlying storage failure.
    #[error("tree i/o error at '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Opaque reference to a child within an entity.
///
/// References stay valid across content updates and reorders; a delete
/// invalidates the reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChildRef(String);

impl ChildRef {
    /// Wrap an implementation-specific identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ChildRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A listed child: its reference plus its current display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    /// Reference for subsequent operations.
    pub child: ChildRef,
    /// Display name, expected (but not guaranteed) to be a canonical
    /// variant name.
    pub name: String,
}

/// The target-tree adapter.
///
/// All host-tree reads and mutations flow through this trait.
pub trait TargetTree {
    /// Whether the entity container exists.
    fn entity_exists(&self, entity: &IconName) -> Result<bool, TreeError>;

    /// Create the entity container if absent.
    fn ensure_entity(&mut self, entity: &IconName) -> Result<(), TreeError>;

    /// List the entity's children in positional order.
    fn list_children(&self, entity: &IconName) -> Result<Vec<ChildEntry>, TreeError>;

    /// Read a child's raw content.
    fn read_child(&self, entity: &IconName, child: &ChildRef) -> Result<String, TreeError>;

    /// Create a child with the given name and content, appended at the end.
    fn create_child(
        &mut self,
        entity: &IconName,
        name: &str,
        content: &str,
    ) -> Result<ChildRef, TreeError>;

    /// Replace a child's content, preserving its identity and position.
    fn update_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        content: &str,
    ) -> Result<(), TreeError>;

    /// Delete a child.
    fn delete_child(&mut self, entity: &IconName, child: &ChildRef) -> Result<(), TreeError>;

    /// Move a child to the given index (clamped to the child count).
    fn reorder_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        index: usize,
    ) -> Result<(), TreeError>;

    /// Read an entity metadata value; absence is `Ok(None)`.
    fn get_metadata(&self, entity: &IconName, key: &str) -> Result<Option<String>, TreeError>;

    /// Write an entity metadata value.
    fn set_metadata(&mut self, entity: &IconName, key: &str, value: &str)
        -> Result<(), TreeError>;
}
