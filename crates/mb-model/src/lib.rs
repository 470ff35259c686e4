//! Document model and feature orchestration
//!
//! This crate sits between the command surface and the geometry kernel:
//! documents hold named entities (planes, axes, sketches, objects,
//! assemblies), the registry maps client-facing names to internal handles,
//! and the feature layer validates every input before the kernel runs.

pub mod datum;
pub mod document;
pub mod error;
pub mod features;
pub mod registry;
pub mod sketcher;

pub use datum::{BasePlane, PlaneDefinition, reference_axis};
pub use document::{Document, DocumentStore, SolidRecord};
pub use error::{ModelError, ModelResult};
pub use features::{AxisSelector, ObjectInfo, PrimitiveSpec};
pub use registry::{EntityHandle, EntityKind, NamePolicy, ObjectRegistry};
pub use sketcher::ContourReport;
