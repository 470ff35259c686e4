//! Geometry kernel abstraction
//!
//! The trait is the boundary contract; the bounds kernel is the built-in
//! implementation used by default and in tests.

mod bounds;
mod traits;

pub use bounds::BoundsKernel;
pub use traits::{
    Aabb, Axis3, BooleanType, CadError, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo,
    GeometryKernel, NullKernel, PlaneFrame, Profile2D, Solid, default_kernel,
};
