//! Sketch constraints
//!
//! Constraints reference elements by their 0-based sketch index and control
//! points by the 1 = start / 2 = end / 3 = center convention. References are
//! validated against the sketch at application time; a dangling reference is
//! an error, never silently dropped.

use serde::{Deserialize, Serialize};

use super::element::POINT_START;

/// A constraint between sketch elements
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Constraint {
    /// Two control points are at the same location
    Coincident {
        geo1: usize,
        point1: u32,
        geo2: usize,
        point2: u32,
    },

    /// Two curves are tangent
    Tangent { geo1: usize, geo2: usize },

    /// Distance between two control points
    Distance {
        geo1: usize,
        point1: u32,
        geo2: usize,
        point2: u32,
        value: f32,
    },

    /// A line is horizontal (parallel to X axis)
    Horizontal { geo: usize },

    /// A line is vertical (parallel to Y axis)
    Vertical { geo: usize },

    /// Angle between two lines, in degrees
    Angle {
        geo1: usize,
        geo2: usize,
        value: f32,
    },

    /// A control point is fixed at its current position
    Fix { geo: usize, point: u32 },
}

impl Constraint {
    /// Get the type name of this constraint
    pub fn type_name(&self) -> &'static str {
        match self {
            Constraint::Coincident { .. } => "coincident",
            Constraint::Tangent { .. } => "tangent",
            Constraint::Distance { .. } => "distance",
            Constraint::Horizontal { .. } => "horizontal",
            Constraint::Vertical { .. } => "vertical",
            Constraint::Angle { .. } => "angle",
            Constraint::Fix { .. } => "fix",
        }
    }

    /// All (element index, control point) references of this constraint.
    /// A `None` point means the constraint targets the whole element.
    pub fn references(&self) -> Vec<(usize, Option<u32>)> {
        match self {
            Constraint::Coincident {
                geo1,
                point1,
                geo2,
                point2,
            } => vec![(*geo1, Some(*point1)), (*geo2, Some(*point2))],
            Constraint::Tangent { geo1, geo2 } => vec![(*geo1, None), (*geo2, None)],
            Constraint::Distance {
                geo1,
                point1,
                geo2,
                point2,
                ..
            } => vec![(*geo1, Some(*point1)), (*geo2, Some(*point2))],
            Constraint::Horizontal { geo } | Constraint::Vertical { geo } => vec![(*geo, None)],
            Constraint::Angle { geo1, geo2, .. } => vec![(*geo1, None), (*geo2, None)],
            Constraint::Fix { geo, point } => vec![(*geo, Some(*point))],
        }
    }

    /// The dimensional value, if this constraint carries one
    pub fn value(&self) -> Option<f32> {
        match self {
            Constraint::Distance { value, .. } | Constraint::Angle { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Constraint pinning an element's start point in place (used to anchor
    /// the first point of a fresh contour at the origin)
    pub fn fix_start(geo: usize) -> Self {
        Constraint::Fix {
            geo,
            point: POINT_START,
        }
    }

    /// Create a coincident constraint
    pub fn coincident(geo1: usize, point1: u32, geo2: usize, point2: u32) -> Self {
        Constraint::Coincident {
            geo1,
            point1,
            geo2,
            point2,
        }
    }

    /// Create a distance constraint
    pub fn distance(geo1: usize, point1: u32, geo2: usize, point2: u32, value: f32) -> Self {
        Constraint::Distance {
            geo1,
            point1,
            geo2,
            point2,
            value,
        }
    }

    /// Create a horizontal constraint
    pub fn horizontal(geo: usize) -> Self {
        Constraint::Horizontal { geo }
    }

    /// Create a vertical constraint
    pub fn vertical(geo: usize) -> Self {
        Constraint::Vertical { geo }
    }

    /// Create an angle constraint (degrees)
    pub fn angle(geo1: usize, geo2: usize, value: f32) -> Self {
        Constraint::Angle { geo1, geo2, value }
    }

    /// Create a tangent constraint
    pub fn tangent(geo1: usize, geo2: usize) -> Self {
        Constraint::Tangent { geo1, geo2 }
    }

    /// Shift all element references by a delta. Used when a constraint batch
    /// indexes into its own element batch and the batch lands at a non-zero
    /// offset in the sketch.
    pub fn with_offset(mut self, delta: usize) -> Self {
        match &mut self {
            Constraint::Coincident { geo1, geo2, .. }
            | Constraint::Distance { geo1, geo2, .. }
            | Constraint::Angle { geo1, geo2, .. }
            | Constraint::Tangent { geo1, geo2 } => {
                *geo1 += delta;
                *geo2 += delta;
            }
            Constraint::Horizontal { geo }
            | Constraint::Vertical { geo }
            | Constraint::Fix { geo, .. } => *geo += delta,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_cover_both_elements() {
        let c = Constraint::coincident(0, 2, 1, 1);
        let refs = c.references();
        assert_eq!(refs, vec![(0, Some(2)), (1, Some(1))]);
    }

    #[test]
    fn dimensional_value() {
        assert_eq!(Constraint::distance(0, 1, 1, 1, 25.0).value(), Some(25.0));
        assert_eq!(Constraint::horizontal(0).value(), None);
    }
}
