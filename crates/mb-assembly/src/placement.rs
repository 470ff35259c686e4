//! Rigid placements (position + orientation)

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A rigid transform placing a part or coordinate system in space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    /// Position
    pub position: Vec3,
    /// Orientation
    pub rotation: Quat,
}

impl Placement {
    /// The identity placement (origin, no rotation)
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    /// Create a placement from position and rotation
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Placement with translation only
    pub fn from_translation(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
        }
    }

    /// Placement from position and XYZ Euler angles in degrees
    pub fn from_position_euler(position: Vec3, euler_degrees: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(
                glam::EulerRot::XYZ,
                euler_degrees.x.to_radians(),
                euler_degrees.y.to_radians(),
                euler_degrees.z.to_radians(),
            ),
        }
    }

    /// Compose: apply `other` in this placement's local frame
    pub fn compose(&self, other: &Placement) -> Placement {
        Placement {
            position: self.position + self.rotation * other.position,
            rotation: self.rotation * other.rotation,
        }
    }

    /// The inverse placement
    pub fn inverse(&self) -> Placement {
        let inv_rotation = self.rotation.inverse();
        Placement {
            position: inv_rotation * -self.position,
            rotation: inv_rotation,
        }
    }

    /// Map a local point to world coordinates
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        self.position + self.rotation * p
    }

    /// Matrix form
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.position)
    }

    /// Whether two placements coincide within a tolerance
    pub fn approx_eq(&self, other: &Placement, tolerance: f32) -> bool {
        self.position.distance(other.position) <= tolerance
            && self.rotation.angle_between(other.rotation) <= tolerance
    }
}

impl Default for Placement {
    fn default() -> Self {
        Self::IDENTITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compose_then_invert_is_identity() {
        let a = Placement::from_position_euler(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.0, 90.0));
        let round_trip = a.compose(&a.inverse());
        assert!(round_trip.approx_eq(&Placement::IDENTITY, 1e-5));
    }

    #[test]
    fn transform_point_rotates_and_translates() {
        let p = Placement::from_position_euler(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.0, 0.0, 90.0));
        let mapped = p.transform_point(Vec3::X);
        assert!(mapped.distance(Vec3::new(10.0, 1.0, 0.0)) < 1e-5);
    }
}
