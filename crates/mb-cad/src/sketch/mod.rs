//! 2D sketch system
//!
//! A sketch is an ordered sequence of geometry elements plus constraints,
//! anchored to a plane frame. Element indices are 0-based, assigned at
//! insertion, and monotone across batches; individual element deletion is
//! not supported, so indices are never reused.

mod constraint;
mod element;

pub use constraint::Constraint;
pub use element::{GeometryElement, POINT_CENTER, POINT_END, POINT_START};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::kernel::{PlaneFrame, Profile2D};

/// Sketch-related errors
#[derive(Debug, Clone, Error)]
pub enum SketchError {
    #[error("invalid geometry at element {index}: {reason}")]
    InvalidGeometry { index: usize, reason: String },

    #[error("invalid reference in constraint {index}: {reason}")]
    InvalidReference { index: usize, reason: String },
}

/// Result type for sketch operations
pub type SketchResult<T> = Result<T, SketchError>;

/// Arc/circle sampling density for profile extraction
const PROFILE_SEGMENTS: u32 = 32;

/// Endpoint matching tolerance when chaining elements into loops
const CHAIN_TOLERANCE: f32 = 1e-4;

/// A 2D sketch anchored to a plane
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sketch {
    /// Unique identifier
    pub id: Uuid,
    /// The plane this sketch lives on
    pub plane: PlaneFrame,
    elements: Vec<GeometryElement>,
    constraints: Vec<Constraint>,
}

impl Sketch {
    /// Create an empty sketch on the given plane
    pub fn new(plane: PlaneFrame) -> Self {
        Self {
            id: Uuid::new_v4(),
            plane,
            elements: Vec::new(),
            constraints: Vec::new(),
        }
    }

    /// Number of elements currently in the sketch
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    /// Whether the sketch has no elements yet
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Get an element by index
    pub fn element(&self, index: usize) -> Option<&GeometryElement> {
        self.elements.get(index)
    }

    /// Iterate all elements in insertion order
    pub fn elements(&self) -> impl Iterator<Item = &GeometryElement> {
        self.elements.iter()
    }

    /// Iterate all applied constraints
    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.constraints.iter()
    }

    /// Append a batch of elements, assigning sequential indices that continue
    /// from the current element count.
    ///
    /// The whole batch is validated before anything is committed: a
    /// degenerate element rejects the batch with `InvalidGeometry` (carrying
    /// its batch position) and the sketch is left untouched.
    pub fn add_batch(&mut self, batch: Vec<GeometryElement>) -> SketchResult<usize> {
        for (index, element) in batch.iter().enumerate() {
            element
                .validate()
                .map_err(|reason| SketchError::InvalidGeometry { index, reason })?;
        }
        let applied = batch.len();
        self.elements.extend(batch);
        debug!(sketch = %self.id, applied, total = self.elements.len(), "sketch batch committed");
        Ok(applied)
    }

    /// Apply constraints in input order.
    ///
    /// Constraints are committed one by one; the first constraint with a
    /// dangling element or control-point reference stops application and is
    /// reported by its position in the input. Constraints applied before the
    /// failing one stay applied, and elements are never rolled back.
    pub fn apply_constraints(&mut self, constraints: Vec<Constraint>) -> SketchResult<usize> {
        let mut applied = 0;
        for (index, constraint) in constraints.into_iter().enumerate() {
            self.check_references(&constraint)
                .map_err(|reason| SketchError::InvalidReference { index, reason })?;
            self.constraints.push(constraint);
            applied += 1;
        }
        Ok(applied)
    }

    fn check_references(&self, constraint: &Constraint) -> Result<(), String> {
        for (geo, point) in constraint.references() {
            let element = self.elements.get(geo).ok_or_else(|| {
                format!(
                    "{} constraint references element {geo}, sketch has {}",
                    constraint.type_name(),
                    self.elements.len()
                )
            })?;
            if let Some(point) = point
                && !element.has_control_point(point)
            {
                return Err(format!(
                    "{} constraint references point {point} of element {geo} ({}), which has no such point",
                    constraint.type_name(),
                    element.type_name()
                ));
            }
        }
        Ok(())
    }

    /// Extract profiles from the sketch geometry.
    ///
    /// Self-closed elements (circles, ellipses, closed splines) each become a
    /// closed profile. Chainable elements (lines, arcs, open splines) are
    /// joined end-to-end; chains whose ends meet become closed profiles,
    /// leftovers stay open (usable as sweep paths).
    pub fn profiles(&self) -> Vec<Profile2D> {
        let mut profiles = Vec::new();
        let mut chains: Vec<Vec<Vec2>> = Vec::new();

        for element in &self.elements {
            if element.is_self_closed() {
                profiles.push(Profile2D::new(element.sample(PROFILE_SEGMENTS), true));
                continue;
            }
            if matches!(element, GeometryElement::Point { .. }) {
                continue;
            }
            let polyline = element.sample(PROFILE_SEGMENTS);
            if polyline.len() >= 2 {
                chains.push(polyline);
            }
        }

        // Greedy chaining on endpoint proximity.
        while let Some(mut current) = chains.pop() {
            loop {
                let end = *current.last().expect("chains are non-empty");
                let next = chains.iter().position(|c| {
                    c.first().is_some_and(|p| p.distance(end) < CHAIN_TOLERANCE)
                        || c.last().is_some_and(|p| p.distance(end) < CHAIN_TOLERANCE)
                });
                match next {
                    Some(i) => {
                        let mut segment = chains.remove(i);
                        if segment
                            .last()
                            .is_some_and(|p| p.distance(end) < CHAIN_TOLERANCE)
                        {
                            segment.reverse();
                        }
                        current.extend(segment.into_iter().skip(1));
                    }
                    None => break,
                }
            }
            let closed = current
                .first()
                .zip(current.last())
                .is_some_and(|(a, b)| a.distance(*b) < CHAIN_TOLERANCE);
            let mut points = current;
            if closed {
                points.pop();
            }
            profiles.push(Profile2D::new(points, closed));
        }

        // Closed profiles first so feature executors can just take the front.
        profiles.sort_by_key(|p| !p.closed);
        profiles
    }

    /// The first closed profile, if the sketch has one
    pub fn closed_profile(&self) -> Option<Profile2D> {
        self.profiles().into_iter().find(|p| p.closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn rectangle_lines(width: f32, height: f32) -> Vec<GeometryElement> {
        let corners = [
            Vec2::ZERO,
            Vec2::new(width, 0.0),
            Vec2::new(width, height),
            Vec2::new(0.0, height),
        ];
        (0..4)
            .map(|i| GeometryElement::Line {
                start: corners[i],
                end: corners[(i + 1) % 4],
            })
            .collect()
    }

    #[test]
    fn batch_indices_are_monotone_across_batches() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        assert_eq!(sketch.add_batch(rectangle_lines(10.0, 5.0)).unwrap(), 4);
        assert_eq!(sketch.element_count(), 4);

        let more = vec![GeometryElement::Circle {
            center: Vec2::new(5.0, 2.5),
            radius: 1.0,
        }];
        assert_eq!(sketch.add_batch(more).unwrap(), 1);
        assert_eq!(sketch.element_count(), 5);
        assert!(sketch.element(4).is_some());
    }

    #[test]
    fn degenerate_element_rejects_whole_batch() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        let batch = vec![
            GeometryElement::Line {
                start: Vec2::ZERO,
                end: Vec2::ONE,
            },
            GeometryElement::Circle {
                center: Vec2::ZERO,
                radius: -1.0,
            },
        ];
        let err = sketch.add_batch(batch).unwrap_err();
        assert!(matches!(err, SketchError::InvalidGeometry { index: 1, .. }));
        assert_eq!(sketch.element_count(), 0);
    }

    #[test]
    fn out_of_range_constraint_fails_without_losing_elements() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        sketch.add_batch(rectangle_lines(10.0, 5.0)).unwrap();

        let constraints = vec![
            Constraint::horizontal(0),
            Constraint::coincident(0, POINT_END, 9, POINT_START),
        ];
        let err = sketch.apply_constraints(constraints).unwrap_err();
        assert!(matches!(err, SketchError::InvalidReference { index: 1, .. }));
        // Elements and the first constraint survive.
        assert_eq!(sketch.element_count(), 4);
        assert_eq!(sketch.constraints().count(), 1);
    }

    #[test]
    fn bad_control_point_is_invalid_reference() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        sketch
            .add_batch(vec![GeometryElement::Circle {
                center: Vec2::ZERO,
                radius: 2.0,
            }])
            .unwrap();
        // A circle has no start point.
        let err = sketch
            .apply_constraints(vec![Constraint::Fix {
                geo: 0,
                point: POINT_START,
            }])
            .unwrap_err();
        assert!(matches!(err, SketchError::InvalidReference { index: 0, .. }));
    }

    #[test]
    fn rectangle_chains_into_closed_profile() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        sketch.add_batch(rectangle_lines(100.0, 50.0)).unwrap();

        let profiles = sketch.profiles();
        assert_eq!(profiles.len(), 1);
        assert!(profiles[0].closed);
        assert_eq!(profiles[0].points.len(), 4);
    }

    #[test]
    fn open_chain_stays_open() {
        let mut sketch = Sketch::new(PlaneFrame::xy(0.0));
        sketch
            .add_batch(vec![
                GeometryElement::Line {
                    start: Vec2::ZERO,
                    end: Vec2::new(10.0, 0.0),
                },
                GeometryElement::Line {
                    start: Vec2::new(10.0, 0.0),
                    end: Vec2::new(10.0, 10.0),
                },
            ])
            .unwrap();
        let profiles = sketch.profiles();
        assert_eq!(profiles.len(), 1);
        assert!(!profiles[0].closed);
        assert!(sketch.closed_profile().is_none());
    }
}
