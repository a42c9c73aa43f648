//! tree::dir
//!
//! Directory-backed target tree.
//!
//! # Layout
//!
//! ```text
//! <root>/
//!   <icon>/
//!     index.json          # metadata map + positional child order
//!     <canonical name>.svg
//! ```
//!
//! Child references are the file stems (the canonical names). Content
//! writes go through a temp-file-then-rename step so a failed write leaves
//! the prior child intact. The index is advisory: files present on disk but
//! missing from the order list are appended sorted, and a malformed index
//! is treated as absent rather than an error, since the tree may be
//! hand-edited between runs.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::{ChildEntry, ChildRef, TargetTree, TreeError};
use crate::core::types::IconName;

const INDEX_FILE: &str = "index.json";
const CHILD_EXTENSION: &str = "svg";

/// Per-entity index file shape.
#[derive(Debug, Default, Serialize, Deserialize)]
struct EntityIndex {
    #[serde(default)]
    metadata: BTreeMap<String, String>,
    #[serde(default)]
    order: Vec<String>,
}

/// Directory-backed target tree.
#[derive(Debug)]
pub struct DirTree {
    root: PathBuf,
}

impl DirTree {
    /// Open a tree rooted at `root`, creating the root if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, TreeError> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|source| io_err(&root, source))?;
        Ok(Self { root })
    }

    /// The tree root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entity_dir(&self, entity: &IconName) -> PathBuf {
        self.root.join(entity.as_str())
    }

    fn child_path(&self, entity: &IconName, name: &str) -> PathBuf {
        self.entity_dir(entity)
            .join(format!("{name}.{CHILD_EXTENSION}"))
    }

    fn require_entity(&self, entity: &IconName) -> Result<PathBuf, TreeError> {
        let dir = self.entity_dir(entity);
        if !dir.is_dir() {
            return Err(TreeError::EntityNotFound(entity.to_string()));
        }
        Ok(dir)
    }

    fn load_index(&self, entity: &IconName) -> Result<EntityIndex, TreeError> {
        let path = self.require_entity(entity)?.join(INDEX_FILE);
        match std::fs::read_to_string(&path) {
            // Malformed index: the tree is not trusted; start fresh.
            Ok(raw) => Ok(serde_json::from_str(&raw).unwrap_or_default()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(EntityIndex::default()),
            Err(err) => Err(io_err(&path, err)),
        }
    }

    fn save_index(&self, entity: &IconName, index: &EntityIndex) -> Result<(), TreeError> {
        let path = self.entity_dir(entity).join(INDEX_FILE);
        let json = serde_json::to_string_pretty(index).map_err(|e| TreeError::Io {
            path: path.display().to_string(),
            source: std::io::Error::new(ErrorKind::InvalidData, e),
        })?;
        atomic_write(&path, &json)
    }

    /// Child file names on disk (without extension).
    fn disk_children(&self, dir: &Path) -> Result<Vec<String>, TreeError> {
        let mut names = Vec::new();
        let entries = std::fs::read_dir(dir).map_err(|e| io_err(dir, e))?;
        for entry in entries {
            let entry = entry.map_err(|e| io_err(dir, e))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(CHILD_EXTENSION) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Ordered child names: index order first (for files that still exist),
    /// then untracked files sorted.
    fn ordered_names(&self, entity: &IconName) -> Result<Vec<String>, TreeError> {
        let dir = self.require_entity(entity)?;
        let index = self.load_index(entity)?;
        let on_disk = self.disk_children(&dir)?;

        let mut ordered: Vec<String> = index
            .order
            .iter()
            .filter(|name| on_disk.contains(name))
            .cloned()
            .collect();
        for name in on_disk {
            if !ordered.contains(&name) {
                ordered.push(name);
            }
        }
        Ok(ordered)
    }
}

impl TargetTree for DirTree {
    fn entity_exists(&self, entity: &IconName) -> Result<bool, TreeError> {
        Ok(self.entity_dir(entity).is_dir())
    }

    fn ensure_entity(&mut self, entity: &IconName) -> Result<(), TreeError> {
        let dir = self.entity_dir(entity);
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        Ok(())
    }

    fn list_children(&self, entity: &IconName) -> Result<Vec<ChildEntry>, TreeError> {
        Ok(self
            .ordered_names(entity)?
            .into_iter()
            .map(|name| ChildEntry {
                child: ChildRef::new(name.clone()),
                name,
            })
            .collect())
    }

    fn read_child(&self, entity: &IconName, child: &ChildRef) -> Result<String, TreeError> {
        let path = self.child_path(entity, child.as_str());
        std::fs::read_to_string(&path).map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                TreeError::ChildNotFound {
                    entity: entity.to_string(),
                    child: child.to_string(),
                }
            } else {
                io_err(&path, err)
            }
        })
    }

    fn create_child(
        &mut self,
        entity: &IconName,
        name: &str,
        content: &str,
    ) -> Result<ChildRef, TreeError> {
        self.require_entity(entity)?;
        let path = self.child_path(entity, name);
        if path.exists() {
            return Err(TreeError::ChildExists {
                entity: entity.to_string(),
                name: name.to_string(),
            });
        }
        atomic_write(&path, content)?;

        let mut index = self.load_index(entity)?;
        index.order.retain(|n| n != name);
        index.order.push(name.to_string());
        self.save_index(entity, &index)?;
        Ok(ChildRef::new(name.to_string()))
    }

    fn update_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        content: &str,
    ) -> Result<(), TreeError> {
        let path = self.child_path(entity, child.as_str());
        if !path.is_file() {
            return Err(TreeError::ChildNotFound {
                entity: entity.to_string(),
                child: child.to_string(),
            });
        }
        atomic_write(&path, content)
    }

    fn delete_child(&mut self, entity: &IconName, child: &ChildRef) -> Result<(), TreeError> {
        let path = self.child_path(entity, child.as_str());
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(TreeError::ChildNotFound {
                    entity: entity.to_string(),
                    child: child.to_string(),
                })
            }
            Err(err) => return Err(io_err(&path, err)),
        }

        let mut index = self.load_index(entity)?;
        index.order.retain(|n| n != child.as_str());
        self.save_index(entity, &index)
    }

    fn reorder_child(
        &mut self,
        entity: &IconName,
        child: &ChildRef,
        index: usize,
    ) -> Result<(), TreeError> {
        let mut names = self.ordered_names(entity)?;
        let pos = names
            .iter()
            .position(|n| n == child.as_str())
            .ok_or_else(|| TreeError::ChildNotFound {
                entity: entity.to_string(),
                child: child.to_string(),
            })?;
        let moved = names.remove(pos);
        let index = index.min(names.len());
        names.insert(index, moved);

        let mut entity_index = self.load_index(entity)?;
        entity_index.order = names;
        self.save_index(entity, &entity_index)
    }

    fn get_metadata(&self, entity: &IconName, key: &str) -> Result<Option<String>, TreeError> {
        Ok(self.load_index(entity)?.metadata.get(key).cloned())
    }

    fn set_metadata(
        &mut self,
        entity: &IconName,
        key: &str,
        value: &str,
    ) -> Result<(), TreeError> {
        let mut index = self.load_index(entity)?;
        index.metadata.insert(key.to_string(), value.to_string());
        self.save_index(entity, &index)
    }
}

/// Write via a temp file and atomic rename; the prior file survives a
/// failed write.
fn atomic_write(path: &Path, content: &str) -> Result<(), TreeError> {
    let tmp = path.with_extension("tmp");
    std::fs::write(&tmp, content).map_err(|e| io_err(&tmp, e))?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(io_err(path, e));
    }
    Ok(())
}

fn io_err(path: &Path, source: std::io::Error) -> TreeError {
    TreeError::Io {
        path: path.display().to_string(),
        source,
    }
}
