//! Documents and the document store
//!
//! A document owns its registry plus typed payload stores keyed by entity id.
//! The store hands out per-document locks so the dispatcher can serialize
//! commands within a document while keeping documents independent.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec3;
use mb_cad::{Axis3, GeometryKernel, PlaneFrame, Sketch, Solid};
use mb_assembly::{Assembly, AssemblyModel};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::datum::{self, PlaneDefinition};
use crate::error::{ModelError, ModelResult};
use crate::registry::{EntityHandle, EntityKind, NamePolicy, ObjectRegistry};

/// A solid with its provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolidRecord {
    /// Kernel handle
    pub solid: Solid,
    /// Operation that produced it ("extrude", "cut", "box", ...)
    pub operation: String,
    /// Names of the inputs the operation consumed
    pub inputs: Vec<String>,
    /// Optional mass attribute
    pub mass: Option<f32>,
    /// Optional material attribute
    pub material: Option<String>,
}

/// One modeling document
#[derive(Debug)]
pub struct Document {
    /// Document name
    pub name: String,
    /// Name registry
    pub registry: ObjectRegistry,
    /// Policy applied when an explicitly requested name is already taken
    pub conflict_policy: NamePolicy,
    pub(crate) planes: HashMap<Uuid, PlaneFrame>,
    pub(crate) axes: HashMap<Uuid, Axis3>,
    pub(crate) sketches: HashMap<Uuid, Sketch>,
    pub(crate) solids: HashMap<Uuid, SolidRecord>,
    pub(crate) assemblies: HashMap<Uuid, Assembly>,
}

impl Document {
    /// Create an empty document
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: ObjectRegistry::new(),
            conflict_policy: NamePolicy::Reject,
            planes: HashMap::new(),
            axes: HashMap::new(),
            sketches: HashMap::new(),
            solids: HashMap::new(),
            assemblies: HashMap::new(),
        }
    }

    /// Register a datum plane. An explicit name conflicts hard; the default
    /// name auto-renames.
    pub fn add_plane(
        &mut self,
        name: Option<String>,
        definition: &PlaneDefinition,
    ) -> ModelResult<EntityHandle> {
        let frame = definition.resolve()?;
        let (name, policy) = match name {
            Some(n) => (n, self.conflict_policy),
            None => ("Plane".to_string(), NamePolicy::AutoRename),
        };
        let handle = self.registry.register(name, EntityKind::Plane, policy)?;
        self.planes.insert(handle.id, frame);
        Ok(handle)
    }

    /// Register a reference axis
    pub fn add_axis(
        &mut self,
        name: Option<String>,
        point: Vec3,
        direction: Vec3,
    ) -> ModelResult<EntityHandle> {
        let axis = datum::reference_axis(point, direction)?;
        let (name, policy) = match name {
            Some(n) => (n, self.conflict_policy),
            None => ("Axis".to_string(), NamePolicy::AutoRename),
        };
        let handle = self.registry.register(name, EntityKind::Axis, policy)?;
        self.axes.insert(handle.id, axis);
        Ok(handle)
    }

    /// Resolve a plane name to its frame
    pub fn plane_frame(&self, name: &str) -> ModelResult<PlaneFrame> {
        let handle = self.registry.resolve_kind(name, EntityKind::Plane)?;
        self.planes
            .get(&handle.id)
            .copied()
            .ok_or_else(|| ModelError::NotFound(format!("no plane named '{name}'")))
    }

    /// Resolve an axis name
    pub fn axis(&self, name: &str) -> ModelResult<Axis3> {
        let handle = self.registry.resolve_kind(name, EntityKind::Axis)?;
        self.axes
            .get(&handle.id)
            .copied()
            .ok_or_else(|| ModelError::NotFound(format!("no axis named '{name}'")))
    }

    /// Resolve a sketch name
    pub fn sketch(&self, name: &str) -> ModelResult<&Sketch> {
        let handle = self.registry.resolve_kind(name, EntityKind::Sketch)?;
        self.sketches
            .get(&handle.id)
            .ok_or_else(|| ModelError::NotFound(format!("no sketch named '{name}'")))
    }

    pub(crate) fn sketch_mut(&mut self, name: &str) -> ModelResult<&mut Sketch> {
        let handle = self.registry.resolve_kind(name, EntityKind::Sketch)?;
        let id = handle.id;
        self.sketches
            .get_mut(&id)
            .ok_or_else(|| ModelError::NotFound(format!("no sketch named '{name}'")))
    }

    /// Resolve an object name to its solid record
    pub fn solid_record(&self, name: &str) -> ModelResult<&SolidRecord> {
        let handle = self.registry.resolve_kind(name, EntityKind::Object)?;
        self.solids
            .get(&handle.id)
            .ok_or_else(|| ModelError::NotFound(format!("no object named '{name}'")))
    }

    /// Create an assembly; the model is fixed at creation
    pub fn create_assembly(
        &mut self,
        name: impl Into<String>,
        model: AssemblyModel,
    ) -> ModelResult<EntityHandle> {
        let name = name.into();
        let handle =
            self.registry
                .register(name.clone(), EntityKind::Assembly, self.conflict_policy)?;
        self.assemblies.insert(handle.id, Assembly::new(name, model));
        Ok(handle)
    }

    /// Resolve an assembly name
    pub fn assembly(&self, name: &str) -> ModelResult<&Assembly> {
        let handle = self.registry.resolve_kind(name, EntityKind::Assembly)?;
        self.assemblies
            .get(&handle.id)
            .ok_or_else(|| ModelError::NotFound(format!("no assembly named '{name}'")))
    }

    /// Resolve an assembly name mutably
    pub fn assembly_mut(&mut self, name: &str) -> ModelResult<&mut Assembly> {
        let handle = self.registry.resolve_kind(name, EntityKind::Assembly)?;
        let id = handle.id;
        self.assemblies
            .get_mut(&id)
            .ok_or_else(|| ModelError::NotFound(format!("no assembly named '{name}'")))
    }

    /// Delete any entity by name, dropping its typed payload. Solid payloads
    /// are released kernel-side.
    pub fn delete_entity(&mut self, name: &str, kernel: &dyn GeometryKernel) -> ModelResult<()> {
        let handle = self.registry.delete(name)?;
        match handle.kind {
            EntityKind::Plane => {
                self.planes.remove(&handle.id);
            }
            EntityKind::Axis => {
                self.axes.remove(&handle.id);
            }
            EntityKind::Sketch => {
                self.sketches.remove(&handle.id);
            }
            EntityKind::Object => {
                if let Some(record) = self.solids.remove(&handle.id) {
                    kernel.release(&record.solid)?;
                }
            }
            EntityKind::Assembly => {
                self.assemblies.remove(&handle.id);
            }
            EntityKind::Lcs => {}
        }
        Ok(())
    }
}

/// Named documents plus the active-document marker
#[derive(Default)]
pub struct DocumentStore {
    documents: RwLock<Vec<(String, Arc<Mutex<Document>>)>>,
    active: Mutex<Option<String>>,
}

impl DocumentStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a document and make it active
    pub fn create_document(&self, name: &str) -> ModelResult<()> {
        let mut documents = self.documents.write();
        if documents.iter().any(|(n, _)| n == name) {
            return Err(ModelError::NameConflict(format!(
                "document '{name}' already exists"
            )));
        }
        documents.push((
            name.to_string(),
            Arc::new(Mutex::new(Document::new(name))),
        ));
        *self.active.lock() = Some(name.to_string());
        info!(document = name, "document created");
        Ok(())
    }

    /// Delete a document
    pub fn delete_document(&self, name: &str) -> ModelResult<()> {
        let mut documents = self.documents.write();
        let index = documents
            .iter()
            .position(|(n, _)| n == name)
            .ok_or_else(|| ModelError::NotFound(format!("no document named '{name}'")))?;
        documents.remove(index);
        let mut active = self.active.lock();
        if active.as_deref() == Some(name) {
            *active = None;
        }
        info!(document = name, "document deleted");
        Ok(())
    }

    /// Mark a document active
    pub fn set_active(&self, name: &str) -> ModelResult<()> {
        let documents = self.documents.read();
        if !documents.iter().any(|(n, _)| n == name) {
            return Err(ModelError::NotFound(format!("no document named '{name}'")));
        }
        *self.active.lock() = Some(name.to_string());
        Ok(())
    }

    /// Name of the active document, if any
    pub fn active_name(&self) -> Option<String> {
        self.active.lock().clone()
    }

    /// Document names in creation order
    pub fn list(&self) -> Vec<String> {
        self.documents.read().iter().map(|(n, _)| n.clone()).collect()
    }

    /// Resolve an explicit document name, falling back to the active one
    pub fn resolve(&self, explicit: Option<&str>) -> ModelResult<Arc<Mutex<Document>>> {
        match explicit {
            Some(name) => {
                let documents = self.documents.read();
                documents
                    .iter()
                    .find(|(n, _)| n == name)
                    .map(|(_, d)| Arc::clone(d))
                    .ok_or_else(|| ModelError::NotFound(format!("no document named '{name}'")))
            }
            None => {
                let active = self.active.lock().clone().ok_or_else(|| {
                    ModelError::NotFound("no active document and none specified".into())
                })?;
                self.resolve(Some(&active))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::BasePlane;

    #[test]
    fn create_makes_document_active() {
        let store = DocumentStore::new();
        store.create_document("widget").unwrap();
        assert_eq!(store.active_name().as_deref(), Some("widget"));

        store.create_document("fixture").unwrap();
        assert_eq!(store.active_name().as_deref(), Some("fixture"));

        // Fallback resolution follows the marker.
        let doc = store.resolve(None).unwrap();
        assert_eq!(doc.lock().name, "fixture");
    }

    #[test]
    fn duplicate_document_is_a_conflict() {
        let store = DocumentStore::new();
        store.create_document("one").unwrap();
        assert!(matches!(
            store.create_document("one"),
            Err(ModelError::NameConflict(_))
        ));
    }

    #[test]
    fn deleting_active_document_clears_marker() {
        let store = DocumentStore::new();
        store.create_document("only").unwrap();
        store.delete_document("only").unwrap();
        assert!(store.active_name().is_none());
        assert!(matches!(store.resolve(None), Err(ModelError::NotFound(_))));
    }

    #[test]
    fn plane_registration_and_lookup() {
        let mut doc = Document::new("d");
        let handle = doc
            .add_plane(
                Some("P1".into()),
                &PlaneDefinition::Base {
                    plane: BasePlane::Xy,
                    offset: 5.0,
                },
            )
            .unwrap();
        assert_eq!(handle.name, "P1");
        let frame = doc.plane_frame("P1").unwrap();
        assert_eq!(frame.origin.z, 5.0);

        assert!(matches!(
            doc.plane_frame("P2"),
            Err(ModelError::NotFound(_))
        ));
    }

    #[test]
    fn default_plane_names_auto_rename() {
        let mut doc = Document::new("d");
        let def = PlaneDefinition::Base {
            plane: BasePlane::Xy,
            offset: 0.0,
        };
        assert_eq!(doc.add_plane(None, &def).unwrap().name, "Plane");
        assert_eq!(doc.add_plane(None, &def).unwrap().name, "Plane_2");
    }
}
