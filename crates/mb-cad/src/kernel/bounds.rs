//! Bounds kernel
//!
//! A self-contained analytic kernel that models every solid as an
//! axis-aligned bound box plus an enclosed volume. It is deterministic and
//! dependency-free, which is what the orchestration layer needs: name
//! resolution, lineage, mass and bounding queries all behave exactly as they
//! would against a full B-Rep kernel, while the shape detail stays coarse.

use std::collections::HashMap;

use glam::{Quat, Vec2, Vec3};
use parking_lot::RwLock;
use tracing::debug;

use super::traits::{
    Aabb, Axis3, BooleanType, CadError, CadResult, EdgeId, EdgeInfo, FaceId, FaceInfo,
    GeometryKernel, PlaneFrame, Profile2D, Solid,
};

/// Kernel-side record for one solid
#[derive(Debug, Clone, Copy)]
struct SolidData {
    aabb: Aabb,
    volume: f32,
}

/// Analytic kernel tracking solids as bound boxes
#[derive(Debug, Default)]
pub struct BoundsKernel {
    solids: RwLock<HashMap<uuid::Uuid, SolidData>>,
}

/// Signed area of a closed 2D polygon (shoelace)
fn polygon_area(points: &[Vec2]) -> f32 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        sum += a.x * b.y - b.x * a.y;
    }
    (sum * 0.5).abs()
}

/// Centroid of a closed 2D polygon
fn polygon_centroid(points: &[Vec2]) -> Vec2 {
    if points.len() < 3 {
        return points.iter().copied().sum::<Vec2>() / points.len().max(1) as f32;
    }
    let mut cx = 0.0;
    let mut cy = 0.0;
    let mut area_sum = 0.0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let cross = a.x * b.y - b.x * a.y;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
        area_sum += cross;
    }
    if area_sum.abs() < f32::EPSILON {
        return points[0];
    }
    Vec2::new(cx, cy) / (3.0 * area_sum)
}

impl BoundsKernel {
    /// Create an empty kernel
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, data: SolidData) -> Solid {
        let solid = Solid::new();
        self.solids.write().insert(solid.id, data);
        debug!(solid = %solid.id, volume = data.volume, "bounds kernel registered solid");
        solid
    }

    fn data(&self, solid: &Solid) -> CadResult<SolidData> {
        self.solids
            .read()
            .get(&solid.id)
            .copied()
            .ok_or(CadError::UnknownSolid(solid.id))
    }

    fn require_closed(profile: &Profile2D) -> CadResult<()> {
        if profile.points.len() < 3 || !profile.closed {
            return Err(CadError::InvalidProfile(
                "profile must be a closed loop with at least 3 points".into(),
            ));
        }
        Ok(())
    }

    fn world_points(profile: &Profile2D, frame: &PlaneFrame) -> Vec<Vec3> {
        profile.points.iter().map(|p| frame.to_world(*p)).collect()
    }
}

impl GeometryKernel for BoundsKernel {
    fn name(&self) -> &str {
        "bounds"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extrude(
        &self,
        profile: &Profile2D,
        frame: &PlaneFrame,
        forward: f32,
        backward: f32,
    ) -> CadResult<Solid> {
        Self::require_closed(profile)?;
        let depth = forward + backward;
        if depth <= 0.0 {
            return Err(CadError::OperationFailed(
                "extrusion depth must be positive".into(),
            ));
        }
        let base = Self::world_points(profile, frame);
        let points = base
            .iter()
            .map(|p| *p - frame.normal * backward)
            .chain(base.iter().map(|p| *p + frame.normal * forward));
        let aabb = Aabb::from_points(points).expect("profile is non-empty");
        let volume = polygon_area(&profile.points) * depth;
        Ok(self.insert(SolidData { aabb, volume }))
    }

    fn revolve(
        &self,
        profile: &Profile2D,
        frame: &PlaneFrame,
        axis: &Axis3,
        angle: f32,
    ) -> CadResult<Solid> {
        Self::require_closed(profile)?;
        if angle.abs() <= f32::EPSILON {
            return Err(CadError::OperationFailed(
                "revolve angle must be non-zero".into(),
            ));
        }
        // Sample the swept positions of the profile points around the axis.
        let base = Self::world_points(profile, frame);
        let steps = 24;
        let mut swept = Vec::with_capacity(base.len() * (steps + 1));
        for i in 0..=steps {
            let theta = angle * (i as f32 / steps as f32);
            let rot = Quat::from_axis_angle(axis.direction, theta);
            for p in &base {
                swept.push(axis.origin + rot * (*p - axis.origin));
            }
        }
        let aabb = Aabb::from_points(swept).expect("swept set is non-empty");
        // Pappus: V = swept angle * (centroid distance from axis) * area.
        let area = polygon_area(&profile.points);
        let centroid = frame.to_world(polygon_centroid(&profile.points));
        let to_centroid = centroid - axis.origin;
        let radial = to_centroid - axis.direction * to_centroid.dot(axis.direction);
        let volume = angle.abs() * radial.length() * area;
        Ok(self.insert(SolidData { aabb, volume }))
    }

    fn sweep(
        &self,
        profile: &Profile2D,
        profile_frame: &PlaneFrame,
        path: &Profile2D,
        path_frame: &PlaneFrame,
    ) -> CadResult<Solid> {
        Self::require_closed(profile)?;
        if path.points.len() < 2 {
            return Err(CadError::InvalidProfile(
                "sweep path needs at least 2 points".into(),
            ));
        }
        let section = Self::world_points(profile, profile_frame);
        let spine = Self::world_points(path, path_frame);
        let start = spine[0];
        let mut points = Vec::with_capacity(section.len() * spine.len());
        for station in &spine {
            let delta = *station - start;
            points.extend(section.iter().map(|p| *p + delta));
        }
        let aabb = Aabb::from_points(points).expect("sweep set is non-empty");
        let length: f32 = spine.windows(2).map(|w| (w[1] - w[0]).length()).sum();
        let volume = polygon_area(&profile.points) * length;
        Ok(self.insert(SolidData { aabb, volume }))
    }

    fn loft(
        &self,
        sections: &[(Profile2D, PlaneFrame)],
        _create_solid: bool,
        _ruled: bool,
    ) -> CadResult<Solid> {
        if sections.len() < 2 {
            return Err(CadError::InvalidProfile(
                "loft needs at least 2 sections".into(),
            ));
        }
        let mut points = Vec::new();
        let mut area_sum = 0.0;
        for (profile, frame) in sections {
            Self::require_closed(profile)?;
            points.extend(Self::world_points(profile, frame));
            area_sum += polygon_area(&profile.points);
        }
        let aabb = Aabb::from_points(points).expect("sections are non-empty");
        let first = sections.first().expect("len checked").1.origin;
        let last = sections.last().expect("len checked").1.origin;
        let volume = (area_sum / sections.len() as f32) * (last - first).length();
        Ok(self.insert(SolidData { aabb, volume }))
    }

    fn boolean(&self, a: &Solid, b: &Solid, op: BooleanType) -> CadResult<Solid> {
        let da = self.data(a)?;
        let db = self.data(b)?;
        let overlap = da
            .aabb
            .intersection(&db.aabb)
            .map(|o| o.volume())
            .unwrap_or(0.0)
            .min(da.volume)
            .min(db.volume);
        let data = match op {
            BooleanType::Union => SolidData {
                aabb: da.aabb.union(&db.aabb),
                volume: da.volume + db.volume - overlap,
            },
            // A disjoint tool leaves the base untouched; that is the kernel's
            // definition of difference, not an error.
            BooleanType::Subtract => SolidData {
                aabb: da.aabb,
                volume: (da.volume - overlap).max(0.0),
            },
            BooleanType::Intersect => {
                let aabb = da.aabb.intersection(&db.aabb).ok_or_else(|| {
                    CadError::OperationFailed(
                        "boolean intersection produced a zero-volume result".into(),
                    )
                })?;
                SolidData {
                    aabb,
                    volume: overlap,
                }
            }
        };
        Ok(self.insert(data))
    }

    fn create_box(&self, center: Vec3, size: Vec3) -> CadResult<Solid> {
        if size.min_element() <= 0.0 {
            return Err(CadError::OperationFailed(
                "box dimensions must be positive".into(),
            ));
        }
        let half = size * 0.5;
        Ok(self.insert(SolidData {
            aabb: Aabb::new(center - half, center + half),
            volume: size.x * size.y * size.z,
        }))
    }

    fn create_cylinder(
        &self,
        center: Vec3,
        radius: f32,
        height: f32,
        axis: Vec3,
    ) -> CadResult<Solid> {
        if radius <= 0.0 || height <= 0.0 {
            return Err(CadError::OperationFailed(
                "cylinder radius and height must be positive".into(),
            ));
        }
        let a = axis.normalize();
        // Tight AABB of an arbitrary-axis cylinder.
        let half = Vec3::new(
            radius * (1.0 - a.x * a.x).max(0.0).sqrt() + height * 0.5 * a.x.abs(),
            radius * (1.0 - a.y * a.y).max(0.0).sqrt() + height * 0.5 * a.y.abs(),
            radius * (1.0 - a.z * a.z).max(0.0).sqrt() + height * 0.5 * a.z.abs(),
        );
        Ok(self.insert(SolidData {
            aabb: Aabb::new(center - half, center + half),
            volume: std::f32::consts::PI * radius * radius * height,
        }))
    }

    fn create_sphere(&self, center: Vec3, radius: f32) -> CadResult<Solid> {
        if radius <= 0.0 {
            return Err(CadError::OperationFailed(
                "sphere radius must be positive".into(),
            ));
        }
        Ok(self.insert(SolidData {
            aabb: Aabb::new(center - Vec3::splat(radius), center + Vec3::splat(radius)),
            volume: 4.0 / 3.0 * std::f32::consts::PI * radius.powi(3),
        }))
    }

    fn transformed(&self, solid: &Solid, translation: Vec3, rotation: Quat) -> CadResult<Solid> {
        let data = self.data(solid)?;
        Ok(self.insert(SolidData {
            aabb: data.aabb.transformed(translation, rotation),
            volume: data.volume,
        }))
    }

    fn mirrored(&self, solid: &Solid, plane_point: Vec3, plane_normal: Vec3) -> CadResult<Solid> {
        let data = self.data(solid)?;
        let n = plane_normal.normalize();
        let reflected = data
            .aabb
            .corners()
            .map(|c| c - 2.0 * n.dot(c - plane_point) * n);
        Ok(self.insert(SolidData {
            aabb: Aabb::from_points(reflected).expect("corner set is non-empty"),
            volume: data.volume,
        }))
    }

    fn fillet(&self, solid: &Solid, edges: &[EdgeId], radius: f32) -> CadResult<Solid> {
        let data = self.data(solid)?;
        if radius * 2.0 >= data.aabb.extents().min_element() {
            return Err(CadError::OperationFailed(
                "fillet radius exceeds solid extent".into(),
            ));
        }
        let infos = self.get_edges(solid)?;
        let mut removed = 0.0;
        for edge in edges {
            let info = infos
                .iter()
                .find(|e| e.id == *edge)
                .ok_or_else(|| CadError::OperationFailed(format!("no such edge {}", edge.index)))?;
            removed += (1.0 - std::f32::consts::FRAC_PI_4) * radius * radius * info.length;
        }
        Ok(self.insert(SolidData {
            aabb: data.aabb,
            volume: (data.volume - removed).max(0.0),
        }))
    }

    fn chamfer(&self, solid: &Solid, edges: &[EdgeId], distance: f32) -> CadResult<Solid> {
        let data = self.data(solid)?;
        if distance * 2.0 >= data.aabb.extents().min_element() {
            return Err(CadError::OperationFailed(
                "chamfer distance exceeds solid extent".into(),
            ));
        }
        let infos = self.get_edges(solid)?;
        let mut removed = 0.0;
        for edge in edges {
            let info = infos
                .iter()
                .find(|e| e.id == *edge)
                .ok_or_else(|| CadError::OperationFailed(format!("no such edge {}", edge.index)))?;
            removed += 0.5 * distance * distance * info.length;
        }
        Ok(self.insert(SolidData {
            aabb: data.aabb,
            volume: (data.volume - removed).max(0.0),
        }))
    }

    fn shell(&self, solid: &Solid, thickness: f32, faces_to_remove: &[FaceId]) -> CadResult<Solid> {
        let data = self.data(solid)?;
        let t = thickness.abs();
        let extents = data.aabb.extents();
        if t * 2.0 >= extents.min_element() {
            return Err(CadError::OperationFailed(
                "shell thickness exceeds solid extent".into(),
            ));
        }
        let faces = self.get_faces(solid)?;
        for face in faces_to_remove {
            if !faces.iter().any(|f| f.id == *face) {
                return Err(CadError::OperationFailed(format!(
                    "no such face {}",
                    face.index
                )));
            }
        }
        let inner = (extents - Vec3::splat(2.0 * t)).max(Vec3::ZERO);
        let volume = (data.volume - inner.x * inner.y * inner.z).max(0.0);
        Ok(self.insert(SolidData {
            aabb: data.aabb,
            volume,
        }))
    }

    fn get_edges(&self, solid: &Solid) -> CadResult<Vec<EdgeInfo>> {
        let data = self.data(solid)?;
        let c = data.aabb.corners();
        // Bottom loop, top loop, then verticals.
        let pairs = [
            (0, 1),
            (1, 3),
            (3, 2),
            (2, 0),
            (4, 5),
            (5, 7),
            (7, 6),
            (6, 4),
            (0, 4),
            (1, 5),
            (3, 7),
            (2, 6),
        ];
        Ok(pairs
            .iter()
            .enumerate()
            .map(|(i, (a, b))| EdgeInfo::new(EdgeId::new(solid.id, i as u32), c[*a], c[*b]))
            .collect())
    }

    fn get_faces(&self, solid: &Solid) -> CadResult<Vec<FaceInfo>> {
        let data = self.data(solid)?;
        let center = data.aabb.center();
        let e = data.aabb.extents();
        let half = e * 0.5;
        let faces = [
            (Vec3::NEG_X, half.x, e.y * e.z),
            (Vec3::X, half.x, e.y * e.z),
            (Vec3::NEG_Y, half.y, e.x * e.z),
            (Vec3::Y, half.y, e.x * e.z),
            (Vec3::NEG_Z, half.z, e.x * e.y),
            (Vec3::Z, half.z, e.x * e.y),
        ];
        Ok(faces
            .iter()
            .enumerate()
            .map(|(i, (normal, offset, area))| {
                FaceInfo::new(
                    FaceId::new(solid.id, i as u32),
                    center + *normal * *offset,
                    *normal,
                    *area,
                )
            })
            .collect())
    }

    fn bounding_box(&self, solid: &Solid) -> CadResult<Aabb> {
        Ok(self.data(solid)?.aabb)
    }

    fn volume(&self, solid: &Solid) -> CadResult<f32> {
        Ok(self.data(solid)?.volume)
    }

    fn release(&self, solid: &Solid) -> CadResult<()> {
        self.solids.write().remove(&solid.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn extrude_rectangle_bounds() {
        let kernel = BoundsKernel::new();
        let profile = Profile2D::rectangle(Vec2::new(50.0, 25.0), 100.0, 50.0);
        let solid = kernel
            .extrude(&profile, &PlaneFrame::xy(0.0), 20.0, 0.0)
            .unwrap();
        let aabb = kernel.bounding_box(&solid).unwrap();
        assert_relative_eq!(aabb.extents().x, 100.0);
        assert_relative_eq!(aabb.extents().y, 50.0);
        assert_relative_eq!(aabb.extents().z, 20.0);
        assert_relative_eq!(kernel.volume(&solid).unwrap(), 100_000.0);
    }

    #[test]
    fn cut_with_disjoint_tool_keeps_base_geometry() {
        let kernel = BoundsKernel::new();
        let base = kernel.create_box(Vec3::ZERO, Vec3::splat(10.0)).unwrap();
        let tool = kernel
            .create_cylinder(Vec3::splat(100.0), 2.0, 5.0, Vec3::Z)
            .unwrap();
        let result = kernel.boolean(&base, &tool, BooleanType::Subtract).unwrap();
        assert_eq!(
            kernel.bounding_box(&result).unwrap(),
            kernel.bounding_box(&base).unwrap()
        );
        assert_relative_eq!(
            kernel.volume(&result).unwrap(),
            kernel.volume(&base).unwrap()
        );
    }

    #[test]
    fn disjoint_intersection_fails() {
        let kernel = BoundsKernel::new();
        let a = kernel.create_box(Vec3::ZERO, Vec3::ONE).unwrap();
        let b = kernel.create_box(Vec3::splat(50.0), Vec3::ONE).unwrap();
        let err = kernel.boolean(&a, &b, BooleanType::Intersect).unwrap_err();
        assert!(matches!(err, CadError::OperationFailed(_)));
    }

    #[test]
    fn revolve_full_circle_volume() {
        let kernel = BoundsKernel::new();
        // 10x10 square centered 20 from the Z axis, revolved 360 degrees.
        let profile = Profile2D::rectangle(Vec2::new(20.0, 0.0), 10.0, 10.0);
        let solid = kernel
            .revolve(
                &profile,
                &PlaneFrame::xz(0.0),
                &Axis3::z(),
                std::f32::consts::TAU,
            )
            .unwrap();
        let expected = std::f32::consts::TAU * 20.0 * 100.0;
        assert_relative_eq!(kernel.volume(&solid).unwrap(), expected, epsilon = 1.0);
    }

    #[test]
    fn box_edges_and_faces() {
        let kernel = BoundsKernel::new();
        let solid = kernel
            .create_box(Vec3::ZERO, Vec3::new(2.0, 4.0, 6.0))
            .unwrap();
        assert_eq!(kernel.get_edges(&solid).unwrap().len(), 12);
        let faces = kernel.get_faces(&solid).unwrap();
        assert_eq!(faces.len(), 6);
        assert_relative_eq!(faces[5].center.z, 3.0);
    }

    #[test]
    fn release_forgets_solid() {
        let kernel = BoundsKernel::new();
        let solid = kernel.create_sphere(Vec3::ZERO, 1.0).unwrap();
        kernel.release(&solid).unwrap();
        assert!(matches!(
            kernel.volume(&solid),
            Err(CadError::UnknownSolid(_))
        ));
    }
}
