//! Assembly Models and Queries
//!
//! This crate provides:
//! - Constraint-graph assemblies with an explicit solve lifecycle
//! - Coordinate-system (LCS) hierarchy assemblies resolved at query time
//! - Common queries over both models: parts, mass properties, BOM, export

pub mod bom;
pub mod error;
pub mod export;
pub mod graph;
pub mod hierarchy;
pub mod placement;
pub mod query;

// Re-exports for convenience
pub use bom::{BomFormat, BomGroupKey, BomRow, generate_bom, render_bom};
pub use error::{AssemblyError, AssemblyResult};
pub use export::{AssemblyExport, export_assembly, export_json};
pub use graph::{
    AssemblyConstraint, ConstraintAssembly, ConstraintKind, ElementRef, GraphPart, SolveReport,
    SolveState,
};
pub use hierarchy::{HierarchyAssembly, HierarchyPart, Lcs, LcsDefinition};
pub use placement::Placement;
pub use query::{Assembly, AssemblyModel, MassProperties, PartInfo};
