//! Datum geometry (reference planes and axes)

use glam::Vec3;
use mb_cad::{Axis3, PlaneFrame};
use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

const DEGENERATE_EPSILON: f32 = 1e-6;

/// Named base planes of the global frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BasePlane {
    Xy,
    Xz,
    Yz,
}

/// How a datum plane is defined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaneDefinition {
    /// Aligned with a base plane, offset along its normal
    Base {
        plane: BasePlane,
        #[serde(default)]
        offset: f32,
    },
    /// Through a point with a given normal
    PointNormal { point: Vec3, normal: Vec3 },
    /// Through three non-collinear points
    ThreePoints { a: Vec3, b: Vec3, c: Vec3 },
}

impl PlaneDefinition {
    /// Resolve the definition to a concrete plane frame.
    /// Degenerate definitions are `InvalidGeometry`.
    pub fn resolve(&self) -> ModelResult<PlaneFrame> {
        match self {
            PlaneDefinition::Base { plane, offset } => Ok(match plane {
                BasePlane::Xy => PlaneFrame::xy(*offset),
                BasePlane::Xz => PlaneFrame::xz(*offset),
                BasePlane::Yz => PlaneFrame::yz(*offset),
            }),
            PlaneDefinition::PointNormal { point, normal } => {
                if normal.length_squared() < DEGENERATE_EPSILON {
                    return Err(ModelError::InvalidGeometry(
                        "plane normal must be non-zero".into(),
                    ));
                }
                Ok(PlaneFrame::from_point_normal(*point, *normal))
            }
            PlaneDefinition::ThreePoints { a, b, c } => {
                let normal = (*b - *a).cross(*c - *a);
                if normal.length_squared() < DEGENERATE_EPSILON {
                    return Err(ModelError::InvalidGeometry(
                        "three-point plane definition is collinear".into(),
                    ));
                }
                Ok(PlaneFrame::from_point_normal(*a, normal))
            }
        }
    }
}

/// Build a reference axis from a point and direction
pub fn reference_axis(point: Vec3, direction: Vec3) -> ModelResult<Axis3> {
    if direction.length_squared() < DEGENERATE_EPSILON {
        return Err(ModelError::InvalidGeometry(
            "axis direction must be non-zero".into(),
        ));
    }
    Ok(Axis3::new(point, direction))
}
