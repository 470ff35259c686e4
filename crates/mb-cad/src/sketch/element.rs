//! Sketch geometry elements
//!
//! A closed tagged set of 2D geometry kinds. Every element is validated
//! against its kind's schema before it is committed to a sketch; angles are
//! degrees, coordinates are plane-local.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// A 2D geometry element of a sketch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryElement {
    /// A standalone point
    Point { x: f32, y: f32 },

    /// A line segment
    Line { start: Vec2, end: Vec2 },

    /// A circular arc, angles in degrees counter-clockwise from +X
    Arc {
        center: Vec2,
        radius: f32,
        start_angle: f32,
        end_angle: f32,
    },

    /// A full circle
    Circle { center: Vec2, radius: f32 },

    /// A B-spline through control points
    Bspline {
        points: Vec<Vec2>,
        #[serde(default = "default_degree")]
        degree: u32,
        #[serde(default)]
        closed: bool,
    },

    /// An ellipse, `angle` rotates the major axis in degrees
    Ellipse {
        center: Vec2,
        major_radius: f32,
        minor_radius: f32,
        #[serde(default)]
        angle: f32,
    },
}

fn default_degree() -> u32 {
    3
}

/// Control-point index convention: 1 = start, 2 = end, 3 = center.
/// Which indices exist depends on the element kind.
pub const POINT_START: u32 = 1;
pub const POINT_END: u32 = 2;
pub const POINT_CENTER: u32 = 3;

impl GeometryElement {
    /// Get the type name of this element
    pub fn type_name(&self) -> &'static str {
        match self {
            GeometryElement::Point { .. } => "point",
            GeometryElement::Line { .. } => "line",
            GeometryElement::Arc { .. } => "arc",
            GeometryElement::Circle { .. } => "circle",
            GeometryElement::Bspline { .. } => "bspline",
            GeometryElement::Ellipse { .. } => "ellipse",
        }
    }

    /// Check numeric validity; returns the reason on failure
    pub fn validate(&self) -> Result<(), String> {
        match self {
            GeometryElement::Point { .. } | GeometryElement::Line { .. } => Ok(()),
            GeometryElement::Arc { radius, .. } | GeometryElement::Circle { radius, .. } => {
                if *radius > 0.0 {
                    Ok(())
                } else {
                    Err(format!("radius must be positive, got {radius}"))
                }
            }
            GeometryElement::Bspline { points, degree, .. } => {
                if *degree < 1 {
                    Err(format!("bspline degree must be at least 1, got {degree}"))
                } else if points.len() < 2 {
                    Err(format!(
                        "bspline needs at least 2 control points, got {}",
                        points.len()
                    ))
                } else {
                    Ok(())
                }
            }
            GeometryElement::Ellipse {
                major_radius,
                minor_radius,
                ..
            } => {
                if *major_radius <= 0.0 || *minor_radius <= 0.0 {
                    Err(format!(
                        "ellipse radii must be positive, got {major_radius} and {minor_radius}"
                    ))
                } else if minor_radius > major_radius {
                    Err(format!(
                        "ellipse minor radius {minor_radius} exceeds major radius {major_radius}"
                    ))
                } else {
                    Ok(())
                }
            }
        }
    }

    /// The position of a named control point, if the kind has it
    pub fn control_point(&self, index: u32) -> Option<Vec2> {
        match (self, index) {
            (GeometryElement::Point { x, y }, POINT_START) => Some(Vec2::new(*x, *y)),
            (GeometryElement::Line { start, .. }, POINT_START) => Some(*start),
            (GeometryElement::Line { end, .. }, POINT_END) => Some(*end),
            (
                GeometryElement::Arc {
                    center,
                    radius,
                    start_angle,
                    ..
                },
                POINT_START,
            ) => Some(center + Vec2::from_angle(start_angle.to_radians()) * *radius),
            (
                GeometryElement::Arc {
                    center,
                    radius,
                    end_angle,
                    ..
                },
                POINT_END,
            ) => Some(center + Vec2::from_angle(end_angle.to_radians()) * *radius),
            (GeometryElement::Arc { center, .. }, POINT_CENTER) => Some(*center),
            (GeometryElement::Circle { center, .. }, POINT_CENTER) => Some(*center),
            (GeometryElement::Bspline { points, .. }, POINT_START) => points.first().copied(),
            (GeometryElement::Bspline { points, .. }, POINT_END) => points.last().copied(),
            (GeometryElement::Ellipse { center, .. }, POINT_CENTER) => Some(*center),
            _ => None,
        }
    }

    /// Whether a control-point index is valid for this kind
    pub fn has_control_point(&self, index: u32) -> bool {
        self.control_point(index).is_some()
    }

    /// Sample the element as an in-order point sequence (for profiles)
    pub fn sample(&self, segments: u32) -> Vec<Vec2> {
        match self {
            GeometryElement::Point { x, y } => vec![Vec2::new(*x, *y)],
            GeometryElement::Line { start, end } => vec![*start, *end],
            GeometryElement::Arc {
                center,
                radius,
                start_angle,
                end_angle,
            } => {
                let start = start_angle.to_radians();
                let sweep = (end_angle - start_angle).to_radians();
                (0..=segments)
                    .map(|i| {
                        let theta = start + sweep * (i as f32 / segments as f32);
                        center + Vec2::from_angle(theta) * *radius
                    })
                    .collect()
            }
            GeometryElement::Circle { center, radius } => (0..segments)
                .map(|i| {
                    let theta = std::f32::consts::TAU * (i as f32 / segments as f32);
                    center + Vec2::from_angle(theta) * *radius
                })
                .collect(),
            GeometryElement::Bspline { points, .. } => points.clone(),
            GeometryElement::Ellipse {
                center,
                major_radius,
                minor_radius,
                angle,
            } => {
                let rot = Vec2::from_angle(angle.to_radians());
                (0..segments)
                    .map(|i| {
                        let theta = std::f32::consts::TAU * (i as f32 / segments as f32);
                        let local =
                            Vec2::new(theta.cos() * major_radius, theta.sin() * minor_radius);
                        center + rot.rotate(local)
                    })
                    .collect()
            }
        }
    }

    /// Whether the element is closed on its own (no chaining needed)
    pub fn is_self_closed(&self) -> bool {
        matches!(
            self,
            GeometryElement::Circle { .. }
                | GeometryElement::Ellipse { .. }
                | GeometryElement::Bspline { closed: true, .. }
        )
    }
}
