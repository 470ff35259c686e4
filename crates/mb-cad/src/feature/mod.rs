//! Feature Operations
//!
//! Parametric feature operations (extrude, revolve, booleans, patterns,
//! dress-ups) that turn sketches and existing solids into new solids. A
//! feature holds references by ID; `execute` resolves them against the maps
//! it is given and drives the geometry kernel. Name resolution and lifecycle
//! (hiding consumed inputs, lineage) live a layer above.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::kernel::{Axis3, BooleanType, EdgeId, FaceId, GeometryKernel, Solid};
use crate::sketch::Sketch;

/// Feature-related errors
#[derive(Debug, Clone, Error)]
pub enum FeatureError {
    #[error("Sketch error: {0}")]
    Sketch(#[from] crate::sketch::SketchError),

    #[error("CAD kernel error: {0}")]
    Cad(#[from] crate::kernel::CadError),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("input not found: {0}")]
    InputNotFound(String),

    #[error("no closed profile: {0}")]
    NoProfile(String),
}

/// Result type for feature operations
pub type FeatureResult<T> = Result<T, FeatureError>;

/// Direction for extrusion relative to the sketch plane normal
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtrudeDirection {
    /// Extrude along the positive normal
    #[default]
    Positive,
    /// Extrude along the negative normal
    Negative,
    /// Extrude symmetrically about the sketch plane
    Symmetric,
}

/// A parametric feature that produces a solid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Feature {
    /// Extrude a sketch profile
    Extrude {
        /// Unique identifier
        id: Uuid,
        /// Reference to the sketch
        sketch_id: Uuid,
        /// Extrusion distance
        distance: f32,
        /// Extrusion direction
        direction: ExtrudeDirection,
    },

    /// Revolve a sketch profile around an axis
    Revolve {
        /// Unique identifier
        id: Uuid,
        /// Reference to the sketch
        sketch_id: Uuid,
        /// Axis origin
        axis_origin: Vec3,
        /// Axis direction
        axis_direction: Vec3,
        /// Rotation angle in degrees
        angle: f32,
    },

    /// Sweep a profile along a path sketch
    Sweep {
        /// Unique identifier
        id: Uuid,
        /// Profile sketch ID
        profile_sketch_id: Uuid,
        /// Path sketch ID
        path_sketch_id: Uuid,
    },

    /// Loft between multiple profile sketches
    Loft {
        /// Unique identifier
        id: Uuid,
        /// Profile sketch IDs (in order)
        profile_sketch_ids: Vec<Uuid>,
        /// Whether to create a solid (vs shell)
        create_solid: bool,
        /// Whether to use ruled surfaces
        ruled: bool,
    },

    /// Fuse a base body with one or more tool bodies
    Union {
        /// Unique identifier
        id: Uuid,
        /// Base body
        base: Uuid,
        /// Tool bodies, fused left to right
        tools: Vec<Uuid>,
    },

    /// Remove a single tool body from a base body
    Cut {
        /// Unique identifier
        id: Uuid,
        /// Base body
        base: Uuid,
        /// Tool body
        tool: Uuid,
    },

    /// Keep the common volume of a base body and tool bodies
    Intersect {
        /// Unique identifier
        id: Uuid,
        /// Base body
        base: Uuid,
        /// Tool bodies, intersected left to right
        tools: Vec<Uuid>,
    },

    /// Repeat a body along a direction
    LinearPattern {
        /// Unique identifier
        id: Uuid,
        /// Body to repeat
        body_id: Uuid,
        /// Pattern direction
        direction: Vec3,
        /// Distance between adjacent instances
        spacing: f32,
        /// Total instance count, including the original
        count: u32,
    },

    /// Repeat a body around an axis
    PolarPattern {
        /// Unique identifier
        id: Uuid,
        /// Body to repeat
        body_id: Uuid,
        /// Axis origin
        axis_origin: Vec3,
        /// Axis direction
        axis_direction: Vec3,
        /// Total sweep angle in degrees
        angle: f32,
        /// Total instance count, including the original
        count: u32,
    },

    /// Mirror a body across a plane
    Mirror {
        /// Unique identifier
        id: Uuid,
        /// Body to mirror
        body_id: Uuid,
        /// A point on the mirror plane
        plane_point: Vec3,
        /// Mirror plane normal
        plane_normal: Vec3,
        /// Fuse the mirrored copy with the original
        merge: bool,
    },

    /// Fillet edges
    Fillet {
        /// Unique identifier
        id: Uuid,
        /// Body to modify
        body_id: Uuid,
        /// Fillet radius
        radius: f32,
        /// Edge IDs to fillet
        edges: Vec<EdgeId>,
    },

    /// Chamfer edges
    Chamfer {
        /// Unique identifier
        id: Uuid,
        /// Body to modify
        body_id: Uuid,
        /// Chamfer distance
        distance: f32,
        /// Edge IDs to chamfer
        edges: Vec<EdgeId>,
    },

    /// Shell (hollow out a solid)
    Shell {
        /// Unique identifier
        id: Uuid,
        /// Body to modify
        body_id: Uuid,
        /// Wall thickness
        thickness: f32,
        /// Faces to remove (create openings)
        faces_to_remove: Vec<FaceId>,
    },

    /// Rigid transform of a body
    Transform {
        /// Unique identifier
        id: Uuid,
        /// Body to move
        body_id: Uuid,
        /// Translation
        translation: Vec3,
        /// XYZ Euler rotation in degrees
        rotation: Vec3,
    },
}

impl Feature {
    /// Get the unique ID of this feature
    pub fn id(&self) -> Uuid {
        match self {
            Feature::Extrude { id, .. }
            | Feature::Revolve { id, .. }
            | Feature::Sweep { id, .. }
            | Feature::Loft { id, .. }
            | Feature::Union { id, .. }
            | Feature::Cut { id, .. }
            | Feature::Intersect { id, .. }
            | Feature::LinearPattern { id, .. }
            | Feature::PolarPattern { id, .. }
            | Feature::Mirror { id, .. }
            | Feature::Fillet { id, .. }
            | Feature::Chamfer { id, .. }
            | Feature::Shell { id, .. }
            | Feature::Transform { id, .. } => *id,
        }
    }

    /// Get the type name of this feature
    pub fn type_name(&self) -> &'static str {
        match self {
            Feature::Extrude { .. } => "Extrude",
            Feature::Revolve { .. } => "Revolve",
            Feature::Sweep { .. } => "Sweep",
            Feature::Loft { .. } => "Loft",
            Feature::Union { .. } => "Union",
            Feature::Cut { .. } => "Cut",
            Feature::Intersect { .. } => "Intersect",
            Feature::LinearPattern { .. } => "LinearPattern",
            Feature::PolarPattern { .. } => "PolarPattern",
            Feature::Mirror { .. } => "Mirror",
            Feature::Fillet { .. } => "Fillet",
            Feature::Chamfer { .. } => "Chamfer",
            Feature::Shell { .. } => "Shell",
            Feature::Transform { .. } => "Transform",
        }
    }

    /// Create a new extrude feature
    pub fn extrude(sketch_id: Uuid, distance: f32, direction: ExtrudeDirection) -> Self {
        Feature::Extrude {
            id: Uuid::new_v4(),
            sketch_id,
            distance,
            direction,
        }
    }

    /// Create a new revolve feature (angle in degrees)
    pub fn revolve(sketch_id: Uuid, axis: Axis3, angle: f32) -> Self {
        Feature::Revolve {
            id: Uuid::new_v4(),
            sketch_id,
            axis_origin: axis.origin,
            axis_direction: axis.direction,
            angle,
        }
    }

    /// Create a new sweep feature
    pub fn sweep(profile_sketch_id: Uuid, path_sketch_id: Uuid) -> Self {
        Feature::Sweep {
            id: Uuid::new_v4(),
            profile_sketch_id,
            path_sketch_id,
        }
    }

    /// Create a new loft feature
    pub fn loft(profile_sketch_ids: Vec<Uuid>, create_solid: bool, ruled: bool) -> Self {
        Feature::Loft {
            id: Uuid::new_v4(),
            profile_sketch_ids,
            create_solid,
            ruled,
        }
    }

    /// Create a new union feature
    pub fn union(base: Uuid, tools: Vec<Uuid>) -> Self {
        Feature::Union {
            id: Uuid::new_v4(),
            base,
            tools,
        }
    }

    /// Create a new cut feature
    pub fn cut(base: Uuid, tool: Uuid) -> Self {
        Feature::Cut {
            id: Uuid::new_v4(),
            base,
            tool,
        }
    }

    /// Create a new intersect feature
    pub fn intersect(base: Uuid, tools: Vec<Uuid>) -> Self {
        Feature::Intersect {
            id: Uuid::new_v4(),
            base,
            tools,
        }
    }

    /// Create a new linear pattern feature
    pub fn linear_pattern(body_id: Uuid, direction: Vec3, spacing: f32, count: u32) -> Self {
        Feature::LinearPattern {
            id: Uuid::new_v4(),
            body_id,
            direction,
            spacing,
            count,
        }
    }

    /// Create a new polar pattern feature (angle in degrees)
    pub fn polar_pattern(body_id: Uuid, axis: Axis3, angle: f32, count: u32) -> Self {
        Feature::PolarPattern {
            id: Uuid::new_v4(),
            body_id,
            axis_origin: axis.origin,
            axis_direction: axis.direction,
            angle,
            count,
        }
    }

    /// Create a new mirror feature
    pub fn mirror(body_id: Uuid, plane_point: Vec3, plane_normal: Vec3, merge: bool) -> Self {
        Feature::Mirror {
            id: Uuid::new_v4(),
            body_id,
            plane_point,
            plane_normal,
            merge,
        }
    }

    /// Create a new fillet feature
    pub fn fillet(body_id: Uuid, edges: Vec<EdgeId>, radius: f32) -> Self {
        Feature::Fillet {
            id: Uuid::new_v4(),
            body_id,
            radius,
            edges,
        }
    }

    /// Create a new chamfer feature
    pub fn chamfer(body_id: Uuid, edges: Vec<EdgeId>, distance: f32) -> Self {
        Feature::Chamfer {
            id: Uuid::new_v4(),
            body_id,
            distance,
            edges,
        }
    }

    /// Create a new shell feature
    pub fn shell(body_id: Uuid, thickness: f32, faces_to_remove: Vec<FaceId>) -> Self {
        Feature::Shell {
            id: Uuid::new_v4(),
            body_id,
            thickness,
            faces_to_remove,
        }
    }

    /// Create a new transform feature (rotation in XYZ Euler degrees)
    pub fn transform(body_id: Uuid, translation: Vec3, rotation: Vec3) -> Self {
        Feature::Transform {
            id: Uuid::new_v4(),
            body_id,
            translation,
            rotation,
        }
    }

    /// Validate parameters that do not need resolved inputs
    pub fn validate(&self) -> FeatureResult<()> {
        match self {
            Feature::Extrude { distance, .. } if *distance <= 0.0 => Err(
                FeatureError::InvalidParameter(format!("extrude distance must be positive, got {distance}")),
            ),
            Feature::Revolve { angle, .. } if *angle <= 0.0 || *angle > 360.0 => {
                Err(FeatureError::InvalidParameter(format!(
                    "revolve angle must be in (0, 360], got {angle}"
                )))
            }
            Feature::Loft {
                profile_sketch_ids, ..
            } if profile_sketch_ids.len() < 2 => Err(FeatureError::InvalidParameter(
                "loft requires at least 2 profiles".into(),
            )),
            Feature::Union { tools, .. } | Feature::Intersect { tools, .. }
                if tools.is_empty() =>
            {
                Err(FeatureError::InvalidParameter(
                    "boolean requires at least one tool body".into(),
                ))
            }
            Feature::LinearPattern { count, spacing, .. } => {
                if *count < 2 {
                    Err(FeatureError::InvalidParameter(format!(
                        "pattern count must be at least 2, got {count}"
                    )))
                } else if *spacing <= 0.0 {
                    Err(FeatureError::InvalidParameter(format!(
                        "pattern spacing must be positive, got {spacing}"
                    )))
                } else {
                    Ok(())
                }
            }
            Feature::PolarPattern { count, angle, .. } => {
                if *count < 2 {
                    Err(FeatureError::InvalidParameter(format!(
                        "pattern count must be at least 2, got {count}"
                    )))
                } else if *angle <= 0.0 || *angle > 360.0 {
                    Err(FeatureError::InvalidParameter(format!(
                        "pattern angle must be in (0, 360], got {angle}"
                    )))
                } else {
                    Ok(())
                }
            }
            Feature::Fillet { radius, edges, .. } => {
                if *radius <= 0.0 {
                    Err(FeatureError::InvalidParameter(format!(
                        "fillet radius must be positive, got {radius}"
                    )))
                } else if edges.is_empty() {
                    Err(FeatureError::InvalidParameter(
                        "fillet requires at least one edge".into(),
                    ))
                } else {
                    Ok(())
                }
            }
            Feature::Chamfer {
                distance, edges, ..
            } => {
                if *distance <= 0.0 {
                    Err(FeatureError::InvalidParameter(format!(
                        "chamfer distance must be positive, got {distance}"
                    )))
                } else if edges.is_empty() {
                    Err(FeatureError::InvalidParameter(
                        "chamfer requires at least one edge".into(),
                    ))
                } else {
                    Ok(())
                }
            }
            Feature::Shell { thickness, .. } if *thickness <= 0.0 => {
                Err(FeatureError::InvalidParameter(format!(
                    "shell thickness must be positive, got {thickness}"
                )))
            }
            Feature::Mirror { plane_normal, .. } if plane_normal.length_squared() < 1e-12 => Err(
                FeatureError::InvalidParameter("mirror plane normal must be non-zero".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Execute this feature to produce a solid
    pub fn execute(
        &self,
        kernel: &dyn GeometryKernel,
        sketches: &HashMap<Uuid, Sketch>,
        bodies: &HashMap<Uuid, Solid>,
    ) -> FeatureResult<Solid> {
        self.validate()?;

        match self {
            Feature::Extrude {
                sketch_id,
                distance,
                direction,
                ..
            } => {
                let sketch = require_sketch(sketches, *sketch_id)?;
                let profile = require_profile(sketch, *sketch_id)?;
                let (forward, backward) = match direction {
                    ExtrudeDirection::Positive => (*distance, 0.0),
                    ExtrudeDirection::Negative => (0.0, *distance),
                    ExtrudeDirection::Symmetric => (*distance / 2.0, *distance / 2.0),
                };
                Ok(kernel.extrude(&profile, &sketch.plane, forward, backward)?)
            }

            Feature::Revolve {
                sketch_id,
                axis_origin,
                axis_direction,
                angle,
                ..
            } => {
                let sketch = require_sketch(sketches, *sketch_id)?;
                let profile = require_profile(sketch, *sketch_id)?;
                let axis = Axis3::new(*axis_origin, *axis_direction);
                Ok(kernel.revolve(&profile, &sketch.plane, &axis, angle.to_radians())?)
            }

            Feature::Sweep {
                profile_sketch_id,
                path_sketch_id,
                ..
            } => {
                let profile_sketch = require_sketch(sketches, *profile_sketch_id)?;
                let path_sketch = require_sketch(sketches, *path_sketch_id)?;
                let profile = require_profile(profile_sketch, *profile_sketch_id)?;
                let path = path_sketch
                    .profiles()
                    .into_iter()
                    .next_back()
                    .ok_or_else(|| {
                        FeatureError::NoProfile(format!(
                            "path sketch {path_sketch_id} has no geometry"
                        ))
                    })?;
                Ok(kernel.sweep(&profile, &profile_sketch.plane, &path, &path_sketch.plane)?)
            }

            Feature::Loft {
                profile_sketch_ids,
                create_solid,
                ruled,
                ..
            } => {
                let mut sections = Vec::with_capacity(profile_sketch_ids.len());
                for sketch_id in profile_sketch_ids {
                    let sketch = require_sketch(sketches, *sketch_id)?;
                    let profile = require_profile(sketch, *sketch_id)?;
                    sections.push((profile, sketch.plane));
                }
                Ok(kernel.loft(&sections, *create_solid, *ruled)?)
            }

            Feature::Union { base, tools, .. } => {
                let mut result = *require_body(bodies, *base)?;
                for tool in tools {
                    let tool = require_body(bodies, *tool)?;
                    result = kernel.boolean(&result, tool, BooleanType::Union)?;
                }
                Ok(result)
            }

            Feature::Cut { base, tool, .. } => {
                let base = require_body(bodies, *base)?;
                let tool = require_body(bodies, *tool)?;
                Ok(kernel.boolean(base, tool, BooleanType::Subtract)?)
            }

            Feature::Intersect { base, tools, .. } => {
                let mut result = *require_body(bodies, *base)?;
                for tool in tools {
                    let tool = require_body(bodies, *tool)?;
                    result = kernel.boolean(&result, tool, BooleanType::Intersect)?;
                }
                Ok(result)
            }

            Feature::LinearPattern {
                body_id,
                direction,
                spacing,
                count,
                ..
            } => {
                let seed = require_body(bodies, *body_id)?;
                let step = direction.normalize_or_zero();
                if step == Vec3::ZERO {
                    return Err(FeatureError::InvalidParameter(
                        "pattern direction must be non-zero".into(),
                    ));
                }
                let mut result = *seed;
                for i in 1..*count {
                    let offset = step * (*spacing * i as f32);
                    let instance = kernel.transformed(seed, offset, Quat::IDENTITY)?;
                    result = kernel.boolean(&result, &instance, BooleanType::Union)?;
                }
                Ok(result)
            }

            Feature::PolarPattern {
                body_id,
                axis_origin,
                axis_direction,
                angle,
                count,
                ..
            } => {
                let seed = require_body(bodies, *body_id)?;
                let axis = axis_direction.normalize_or_zero();
                if axis == Vec3::ZERO {
                    return Err(FeatureError::InvalidParameter(
                        "pattern axis must be non-zero".into(),
                    ));
                }
                // Angular step is sweep / count, so a 360 sweep never puts
                // the last instance back on the first.
                let step = angle / *count as f32;
                let mut result = *seed;
                for i in 1..*count {
                    let rotation = Quat::from_axis_angle(axis, (step * i as f32).to_radians());
                    // Rotate about the axis origin, not the world origin.
                    let translation = *axis_origin - rotation * *axis_origin;
                    let instance = kernel.transformed(seed, translation, rotation)?;
                    result = kernel.boolean(&result, &instance, BooleanType::Union)?;
                }
                Ok(result)
            }

            Feature::Mirror {
                body_id,
                plane_point,
                plane_normal,
                merge,
                ..
            } => {
                let seed = require_body(bodies, *body_id)?;
                let mirrored = kernel.mirrored(seed, *plane_point, *plane_normal)?;
                if *merge {
                    Ok(kernel.boolean(seed, &mirrored, BooleanType::Union)?)
                } else {
                    Ok(mirrored)
                }
            }

            Feature::Fillet {
                body_id,
                radius,
                edges,
                ..
            } => {
                let body = require_body(bodies, *body_id)?;
                Ok(kernel.fillet(body, edges, *radius)?)
            }

            Feature::Chamfer {
                body_id,
                distance,
                edges,
                ..
            } => {
                let body = require_body(bodies, *body_id)?;
                Ok(kernel.chamfer(body, edges, *distance)?)
            }

            Feature::Shell {
                body_id,
                thickness,
                faces_to_remove,
                ..
            } => {
                let body = require_body(bodies, *body_id)?;
                Ok(kernel.shell(body, *thickness, faces_to_remove)?)
            }

            Feature::Transform {
                body_id,
                translation,
                rotation,
                ..
            } => {
                let body = require_body(bodies, *body_id)?;
                let rotation = Quat::from_euler(
                    glam::EulerRot::XYZ,
                    rotation.x.to_radians(),
                    rotation.y.to_radians(),
                    rotation.z.to_radians(),
                );
                Ok(kernel.transformed(body, *translation, rotation)?)
            }
        }
    }
}

fn require_sketch(sketches: &HashMap<Uuid, Sketch>, id: Uuid) -> FeatureResult<&Sketch> {
    sketches
        .get(&id)
        .ok_or_else(|| FeatureError::InputNotFound(format!("sketch {id}")))
}

fn require_body(bodies: &HashMap<Uuid, Solid>, id: Uuid) -> FeatureResult<&Solid> {
    bodies
        .get(&id)
        .ok_or_else(|| FeatureError::InputNotFound(format!("body {id}")))
}

fn require_profile(sketch: &Sketch, id: Uuid) -> FeatureResult<crate::kernel::Profile2D> {
    sketch
        .closed_profile()
        .ok_or_else(|| FeatureError::NoProfile(format!("sketch {id} has no closed profile")))
}
