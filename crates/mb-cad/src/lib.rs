//! CAD Kernel Abstraction and Sketch System
//!
//! This crate provides:
//! - Abstract geometry kernel trait with a bounds-based built-in kernel
//! - 2D sketch system with batched elements and constraints
//! - Profile extraction (chaining sketch elements into loops)
//! - Feature operations (extrude, revolve, booleans, patterns, dress-ups)

pub mod feature;
pub mod kernel;
pub mod sketch;

// Re-exports for convenience
pub use feature::{ExtrudeDirection, Feature, FeatureError, FeatureResult};
pub use kernel::{
    Aabb, Axis3, BooleanType, BoundsKernel, CadError, CadResult, EdgeId, EdgeInfo, FaceId,
    FaceInfo, GeometryKernel, NullKernel, PlaneFrame, Profile2D, Solid, default_kernel,
};
pub use sketch::{
    Constraint, GeometryElement, POINT_CENTER, POINT_END, POINT_START, Sketch, SketchError,
    SketchResult,
};
