//! Per-document object registry
//!
//! Names are the addressing scheme for clients; UUIDs are the internal
//! handles. The registry owns the name space: uniqueness, auto-renaming,
//! creation order, the hidden flag, and the record of deleted names that
//! feature resolution uses to tell a vanished input from a typo.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};

/// What kind of entity a name refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Object,
    Sketch,
    Plane,
    Axis,
    Assembly,
    Lcs,
}

impl EntityKind {
    /// Get the name of this kind
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Object => "object",
            EntityKind::Sketch => "sketch",
            EntityKind::Plane => "plane",
            EntityKind::Axis => "axis",
            EntityKind::Assembly => "assembly",
            EntityKind::Lcs => "lcs",
        }
    }
}

/// A registered entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityHandle {
    /// Internal identity
    pub id: Uuid,
    /// Registered name (unique among live entries)
    pub name: String,
    /// Entity kind
    pub kind: EntityKind,
    /// Monotone creation sequence number
    pub sequence: u64,
    /// Hidden entities stay addressable but are filtered from default views
    pub hidden: bool,
}

/// What to do when a requested name is already taken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamePolicy {
    /// Fail with `NameConflict`
    #[default]
    Reject,
    /// Append the first free `_N` suffix, N starting at 2
    AutoRename,
}

/// Name registry for one document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectRegistry {
    entries: Vec<EntityHandle>,
    #[serde(skip)]
    name_index: HashMap<String, usize>,
    next_sequence: u64,
    /// Names that once existed and were deleted
    deleted: HashSet<String>,
}

impl ObjectRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new entity under `name`, applying the conflict policy
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: EntityKind,
        policy: NamePolicy,
    ) -> ModelResult<EntityHandle> {
        let requested = name.into();
        let name = if self.name_index.contains_key(&requested) {
            match policy {
                NamePolicy::Reject => {
                    return Err(ModelError::NameConflict(format!(
                        "name '{requested}' already in use"
                    )));
                }
                NamePolicy::AutoRename => {
                    let mut n = 2u32;
                    loop {
                        let candidate = format!("{requested}_{n}");
                        if !self.name_index.contains_key(&candidate) {
                            break candidate;
                        }
                        n += 1;
                    }
                }
            }
        } else {
            requested
        };

        let handle = EntityHandle {
            id: Uuid::new_v4(),
            name: name.clone(),
            kind,
            sequence: self.next_sequence,
            hidden: false,
        };
        self.next_sequence += 1;
        self.name_index.insert(name.clone(), self.entries.len());
        self.entries.push(handle.clone());
        self.deleted.remove(&name);
        debug!(name = %handle.name, kind = kind.as_str(), "entity registered");
        Ok(handle)
    }

    /// Resolve a name to its handle
    pub fn resolve(&self, name: &str) -> ModelResult<&EntityHandle> {
        self.name_index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ModelError::NotFound(format!("no entity named '{name}'")))
    }

    /// Resolve a name, also checking the entity kind
    pub fn resolve_kind(&self, name: &str, kind: EntityKind) -> ModelResult<&EntityHandle> {
        let handle = self.name_index.get(name).map(|&i| &self.entries[i]);
        match handle {
            Some(h) if h.kind == kind => Ok(h),
            _ => Err(ModelError::NotFound(format!(
                "no {} named '{name}'",
                kind.as_str()
            ))),
        }
    }

    /// Delete an entity by name. A second delete of the same name is
    /// `NotFound`; deletion is not idempotent.
    pub fn delete(&mut self, name: &str) -> ModelResult<EntityHandle> {
        let index = self
            .name_index
            .remove(name)
            .ok_or_else(|| ModelError::NotFound(format!("no entity named '{name}'")))?;
        let handle = self.entries.remove(index);
        self.deleted.insert(handle.name.clone());
        // Indices after the removed entry shift down by one.
        for (i, entry) in self.entries.iter().enumerate().skip(index) {
            self.name_index.insert(entry.name.clone(), i);
        }
        debug!(name = %handle.name, "entity deleted");
        Ok(handle)
    }

    /// Whether a name is currently live
    pub fn contains(&self, name: &str) -> bool {
        self.name_index.contains_key(name)
    }

    /// Whether a name existed and was deleted (and is not currently live)
    pub fn was_deleted(&self, name: &str) -> bool {
        self.deleted.contains(name) && !self.name_index.contains_key(name)
    }

    /// Set or clear the hidden flag
    pub fn set_hidden(&mut self, name: &str, hidden: bool) -> ModelResult<()> {
        let index = *self
            .name_index
            .get(name)
            .ok_or_else(|| ModelError::NotFound(format!("no entity named '{name}'")))?;
        self.entries[index].hidden = hidden;
        Ok(())
    }

    /// Entries in creation order, optionally filtered by kind
    pub fn list(&self, kind: Option<EntityKind>) -> Vec<&EntityHandle> {
        self.entries
            .iter()
            .filter(|e| kind.is_none_or(|k| e.kind == k))
            .collect()
    }

    /// Rebuild the name index (call after deserialization)
    pub fn rebuild_index(&mut self) {
        self.name_index = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, e)| (e.name.clone(), i))
            .collect();
    }
}
