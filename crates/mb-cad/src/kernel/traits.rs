//! Geometry kernel trait definitions
//!
//! The kernel is a black box to the rest of the system: operations take named
//! inputs and parameters and return either a solid handle or a diagnostic.

use glam::{Quat, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for an edge within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId {
    /// ID of the solid this edge belongs to
    pub solid_id: Uuid,
    /// Index of the edge within the solid
    pub index: u32,
}

impl EdgeId {
    /// Create a new edge ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Unique identifier for a face within a solid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FaceId {
    /// ID of the solid this face belongs to
    pub solid_id: Uuid,
    /// Index of the face within the solid
    pub index: u32,
}

impl FaceId {
    /// Create a new face ID
    pub fn new(solid_id: Uuid, index: u32) -> Self {
        Self { solid_id, index }
    }
}

/// Information about an edge
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeInfo {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Start point of the edge
    pub start: Vec3,
    /// End point of the edge
    pub end: Vec3,
    /// Midpoint of the edge
    pub midpoint: Vec3,
    /// Length of the edge
    pub length: f32,
}

impl EdgeInfo {
    /// Create a new edge info
    pub fn new(id: EdgeId, start: Vec3, end: Vec3) -> Self {
        let midpoint = (start + end) * 0.5;
        let length = (end - start).length();
        Self {
            id,
            start,
            end,
            midpoint,
            length,
        }
    }
}

/// Information about a face
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaceInfo {
    /// Unique identifier for this face
    pub id: FaceId,
    /// Center point of the face
    pub center: Vec3,
    /// Normal vector of the face
    pub normal: Vec3,
    /// Approximate area of the face
    pub area: f32,
}

impl FaceInfo {
    /// Create a new face info
    pub fn new(id: FaceId, center: Vec3, normal: Vec3, area: f32) -> Self {
        Self {
            id,
            center,
            normal: normal.normalize(),
            area,
        }
    }
}

/// Error type for geometry kernel operations
#[derive(Debug, Clone, Error)]
pub enum CadError {
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Unknown solid: {0}")]
    UnknownSolid(Uuid),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Kernel not available: {0}")]
    KernelUnavailable(String),
}

/// Result type for kernel operations
pub type CadResult<T> = Result<T, CadError>;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    /// Create a bounding box from two corners (reordered as needed)
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Bounding box of a point set; `None` for an empty set
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut aabb = Self::new(first, first);
        for p in iter {
            aabb.min = aabb.min.min(p);
            aabb.max = aabb.max.max(p);
        }
        Some(aabb)
    }

    /// Size along each axis
    pub fn extents(&self) -> Vec3 {
        self.max - self.min
    }

    /// Geometric center
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Enclosed volume
    pub fn volume(&self) -> f32 {
        let e = self.extents();
        e.x * e.y * e.z
    }

    /// Smallest box containing both
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Aabb) -> Option<Aabb> {
        let min = self.min.max(other.min);
        let max = self.max.min(other.max);
        if min.x < max.x && min.y < max.y && min.z < max.z {
            Some(Aabb { min, max })
        } else {
            None
        }
    }

    /// The eight corner points
    pub fn corners(&self) -> [Vec3; 8] {
        let (lo, hi) = (self.min, self.max);
        [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ]
    }

    /// Box covering this box after a rigid transform
    pub fn transformed(&self, translation: Vec3, rotation: Quat) -> Aabb {
        Self::from_points(self.corners().map(|c| rotation * c + translation))
            .expect("corner set is non-empty")
    }
}

/// A 2D profile (polyline approximation of a sketch loop)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile2D {
    /// Points defining the profile (in order)
    pub points: Vec<Vec2>,
    /// Whether the profile is closed
    pub closed: bool,
}

impl Profile2D {
    /// Create a profile from points
    pub fn new(points: Vec<Vec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    /// Create a rectangle profile
    pub fn rectangle(center: Vec2, width: f32, height: f32) -> Self {
        let hw = width / 2.0;
        let hh = height / 2.0;
        Self::new(
            vec![
                center + Vec2::new(-hw, -hh),
                center + Vec2::new(hw, -hh),
                center + Vec2::new(hw, hh),
                center + Vec2::new(-hw, hh),
            ],
            true,
        )
    }

    /// Create a circle profile (approximated with segments)
    pub fn circle(center: Vec2, radius: f32, segments: u32) -> Self {
        let points: Vec<Vec2> = (0..segments)
            .map(|i| {
                let angle = (i as f32 / segments as f32) * std::f32::consts::TAU;
                center + Vec2::new(angle.cos() * radius, angle.sin() * radius)
            })
            .collect();
        Self::new(points, true)
    }
}

/// The 3D frame a sketch or profile lives on
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlaneFrame {
    /// Origin of the plane in 3D
    pub origin: Vec3,
    /// Plane normal (normalized)
    pub normal: Vec3,
    /// In-plane X direction
    pub x_axis: Vec3,
    /// In-plane Y direction
    pub y_axis: Vec3,
}

impl PlaneFrame {
    /// Frame for the global XY plane at an offset along +Z
    pub fn xy(offset: f32) -> Self {
        Self {
            origin: Vec3::Z * offset,
            normal: Vec3::Z,
            x_axis: Vec3::X,
            y_axis: Vec3::Y,
        }
    }

    /// Frame for the global XZ plane at an offset along +Y
    pub fn xz(offset: f32) -> Self {
        Self {
            origin: Vec3::Y * offset,
            normal: Vec3::Y,
            x_axis: Vec3::X,
            y_axis: Vec3::Z,
        }
    }

    /// Frame for the global YZ plane at an offset along +X
    pub fn yz(offset: f32) -> Self {
        Self {
            origin: Vec3::X * offset,
            normal: Vec3::X,
            x_axis: Vec3::Y,
            y_axis: Vec3::Z,
        }
    }

    /// Construct a frame from a point and normal, deriving in-plane axes
    pub fn from_point_normal(origin: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        let helper = if normal.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
        let x_axis = (helper - normal * helper.dot(normal)).normalize();
        let y_axis = normal.cross(x_axis);
        Self {
            origin,
            normal,
            x_axis,
            y_axis,
        }
    }

    /// Map a 2D plane coordinate to 3D
    pub fn to_world(&self, p: Vec2) -> Vec3 {
        self.origin + self.x_axis * p.x + self.y_axis * p.y
    }
}

/// A 3D solid body (opaque handle; geometric data lives kernel-side)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solid {
    /// Unique identifier
    pub id: Uuid,
}

impl Solid {
    /// Create a solid handle with a fresh ID
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for Solid {
    fn default() -> Self {
        Self::new()
    }
}

/// Axis definition for revolve and pattern operations
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Axis3 {
    /// Origin point of the axis
    pub origin: Vec3,
    /// Direction of the axis (normalized)
    pub direction: Vec3,
}

impl Axis3 {
    /// Create an axis from origin and direction
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Z axis at origin
    pub fn z() -> Self {
        Self::new(Vec3::ZERO, Vec3::Z)
    }
}

/// Boolean operation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BooleanType {
    /// Union (add)
    Union,
    /// Subtraction (cut)
    Subtract,
    /// Intersection (common)
    Intersect,
}

/// The main geometry kernel trait
///
/// Implementations provide the actual solid construction. The orchestration
/// layer validates inputs before calling in and treats every failure as a
/// diagnostic to surface verbatim.
pub trait GeometryKernel: Send + Sync {
    /// Get the name of this kernel
    fn name(&self) -> &str;

    /// Check if the kernel is available
    fn is_available(&self) -> bool;

    /// Extrude a 2D profile along the plane normal, forward and/or backward
    fn extrude(
        &self,
        profile: &Profile2D,
        frame: &PlaneFrame,
        forward: f32,
        backward: f32,
    ) -> CadResult<Solid>;

    /// Revolve a 2D profile around an axis by an angle in radians
    fn revolve(
        &self,
        profile: &Profile2D,
        frame: &PlaneFrame,
        axis: &Axis3,
        angle: f32,
    ) -> CadResult<Solid>;

    /// Sweep a profile along a path profile
    fn sweep(
        &self,
        profile: &Profile2D,
        profile_frame: &PlaneFrame,
        path: &Profile2D,
        path_frame: &PlaneFrame,
    ) -> CadResult<Solid>;

    /// Loft between multiple profiles
    fn loft(
        &self,
        sections: &[(Profile2D, PlaneFrame)],
        create_solid: bool,
        ruled: bool,
    ) -> CadResult<Solid>;

    /// Perform a boolean operation on two solids
    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid>;

    /// Create a box primitive
    fn create_box(&self, center: Vec3, size: Vec3) -> CadResult<Solid>;

    /// Create a cylinder primitive
    fn create_cylinder(
        &self,
        center: Vec3,
        radius: f32,
        height: f32,
        axis: Vec3,
    ) -> CadResult<Solid>;

    /// Create a sphere primitive
    fn create_sphere(&self, center: Vec3, radius: f32) -> CadResult<Solid>;

    /// Produce a rigidly transformed copy of a solid
    fn transformed(&self, solid: &Solid, translation: Vec3, rotation: Quat) -> CadResult<Solid>;

    /// Produce a mirrored copy of a solid across a plane
    fn mirrored(&self, solid: &Solid, plane_point: Vec3, plane_normal: Vec3) -> CadResult<Solid>;

    /// Apply fillet (rounded edge) to selected edges
    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f32) -> CadResult<Solid>;

    /// Apply chamfer (beveled edge) to selected edges
    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f32) -> CadResult<Solid>;

    /// Create a hollow shell from a solid
    fn shell(&self, solid: &Solid, thickness: f32, faces_to_remove: &[FaceId]) -> CadResult<Solid>;

    /// Get all edges of a solid with their geometric information
    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>>;

    /// Get all faces of a solid with their geometric information
    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>>;

    /// Bounding box of a solid
    fn bounding_box(&self, solid: &Solid) -> CadResult<Aabb>;

    /// Enclosed volume of a solid
    fn volume(&self, solid: &Solid) -> CadResult<f32>;

    /// Drop kernel-side data for a solid that is no longer referenced
    fn release(&self, solid: &Solid) -> CadResult<()>;
}

/// A null kernel that always returns errors (used when no kernel is available)
#[derive(Debug, Default)]
pub struct NullKernel;

impl NullKernel {
    fn unavailable<T>() -> CadResult<T> {
        Err(CadError::KernelUnavailable(
            "No geometry kernel available".into(),
        ))
    }
}

impl GeometryKernel for NullKernel {
    fn name(&self) -> &str {
        "null"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extrude(
        &self,
        _profile: &Profile2D,
        _frame: &PlaneFrame,
        _forward: f32,
        _backward: f32,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn revolve(
        &self,
        _profile: &Profile2D,
        _frame: &PlaneFrame,
        _axis: &Axis3,
        _angle: f32,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn sweep(
        &self,
        _profile: &Profile2D,
        _profile_frame: &PlaneFrame,
        _path: &Profile2D,
        _path_frame: &PlaneFrame,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn loft(
        &self,
        _sections: &[(Profile2D, PlaneFrame)],
        _create_solid: bool,
        _ruled: bool,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn boolean(&self, _a: &Solid, _b: &Solid, _op: BooleanType) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_box(&self, _center: Vec3, _size: Vec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_cylinder(
        &self,
        _center: Vec3,
        _radius: f32,
        _height: f32,
        _axis: Vec3,
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn create_sphere(&self, _center: Vec3, _radius: f32) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn transformed(&self, _solid: &Solid, _translation: Vec3, _rotation: Quat) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn mirrored(&self, _solid: &Solid, _plane_point: Vec3, _plane_normal: Vec3) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn fillet(&self, _solid: &Solid, _edges: &[EdgeId], _radius: f32) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn chamfer(&self, _solid: &Solid, _edges: &[EdgeId], _distance: f32) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn shell(
        &self,
        _solid: &Solid,
        _thickness: f32,
        _faces_to_remove: &[FaceId],
    ) -> CadResult<Solid> {
        Self::unavailable()
    }

    fn get_edges(&self, _solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        Self::unavailable()
    }

    fn get_faces(&self, _solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        Self::unavailable()
    }

    fn bounding_box(&self, _solid: &Solid) -> CadResult<Aabb> {
        Self::unavailable()
    }

    fn volume(&self, _solid: &Solid) -> CadResult<f32> {
        Self::unavailable()
    }

    fn release(&self, _solid: &Solid) -> CadResult<()> {
        Ok(())
    }
}

/// Get the default geometry kernel
pub fn default_kernel() -> Box<dyn GeometryKernel> {
    Box::new(super::BoundsKernel::new())
}
