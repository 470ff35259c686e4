//! Sketch construction on documents

use mb_cad::{Constraint, GeometryElement, POINT_CENTER, POINT_START, Sketch};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::document::Document;
use crate::error::ModelResult;
use crate::registry::{EntityHandle, EntityKind, NamePolicy};

/// Counts reported back after a contour batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContourReport {
    /// Elements committed to the sketch
    pub applied_elements: usize,
    /// Constraints applied, including a synthesized origin fix
    pub applied_constraints: usize,
}

impl Document {
    /// Create a sketch on a named plane. The default name is
    /// `<plane>_sketch`, auto-renamed on collision.
    pub fn create_sketch(
        &mut self,
        plane_name: &str,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let frame = self.plane_frame(plane_name)?;
        let (name, policy) = match name {
            Some(n) => (n, self.conflict_policy),
            None => (format!("{plane_name}_sketch"), NamePolicy::AutoRename),
        };
        let handle = self.registry.register(name, EntityKind::Sketch, policy)?;
        self.sketches.insert(handle.id, Sketch::new(frame));
        debug!(sketch = %handle.name, plane = plane_name, "sketch created");
        Ok(handle)
    }

    /// Add a batch of elements and constraints to a sketch.
    ///
    /// Constraint indices are batch-relative and get offset by the sketch's
    /// pre-batch element count. With `fix_first_point_to_origin`, a fix
    /// constraint on the first element is synthesized, but only when the
    /// sketch was empty before this call.
    pub fn add_contour(
        &mut self,
        sketch_name: &str,
        elements: Vec<GeometryElement>,
        constraints: Vec<Constraint>,
        fix_first_point_to_origin: bool,
    ) -> ModelResult<ContourReport> {
        let sketch = self.sketch_mut(sketch_name)?;
        let was_empty = sketch.is_empty();
        let offset = sketch.element_count();

        let anchor = if fix_first_point_to_origin && was_empty {
            elements.first().map(origin_fix)
        } else {
            None
        };

        let applied_elements = sketch.add_batch(elements)?;

        let mut batch: Vec<Constraint> = Vec::with_capacity(constraints.len() + 1);
        batch.extend(anchor.flatten());
        batch.extend(constraints.into_iter().map(|c| c.with_offset(offset)));
        let applied_constraints = sketch.apply_constraints(batch)?;

        debug!(
            sketch = sketch_name,
            applied_elements, applied_constraints, "contour committed"
        );
        Ok(ContourReport {
            applied_elements,
            applied_constraints,
        })
    }
}

/// Fix constraint anchoring a fresh contour's first element. Elements
/// without a start point (circles, ellipses) anchor their center instead.
fn origin_fix(element: &GeometryElement) -> Option<Constraint> {
    if element.has_control_point(POINT_START) {
        Some(Constraint::fix_start(0))
    } else if element.has_control_point(POINT_CENTER) {
        Some(Constraint::Fix {
            geo: 0,
            point: POINT_CENTER,
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{BasePlane, PlaneDefinition};
    use crate::error::ModelError;
    use glam::Vec2;

    fn doc_with_plane() -> Document {
        let mut doc = Document::new("test");
        doc.add_plane(
            Some("P1".into()),
            &PlaneDefinition::Base {
                plane: BasePlane::Xy,
                offset: 0.0,
            },
        )
        .unwrap();
        doc
    }

    fn rectangle(width: f32, height: f32) -> Vec<GeometryElement> {
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
    fn sketch_name_derives_from_plane() {
        let mut doc = doc_with_plane();
        let handle = doc.create_sketch("P1", None).unwrap();
        assert_eq!(handle.name, "P1_sketch");

        // A second sketch on the same plane auto-renames.
        let second = doc.create_sketch("P1", None).unwrap();
        assert_eq!(second.name, "P1_sketch_2");
    }

    #[test]
    fn missing_plane_is_not_found() {
        let mut doc = Document::new("empty");
        let err = doc.create_sketch("nope", None).unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn contour_reports_applied_counts() {
        let mut doc = doc_with_plane();
        doc.create_sketch("P1", None).unwrap();

        let report = doc
            .add_contour("P1_sketch", rectangle(100.0, 50.0), Vec::new(), false)
            .unwrap();
        assert_eq!(report.applied_elements, 4);
        assert_eq!(report.applied_constraints, 0);
    }

    #[test]
    fn origin_fix_only_synthesized_for_empty_sketch() {
        let mut doc = doc_with_plane();
        doc.create_sketch("P1", None).unwrap();

        let first = doc
            .add_contour("P1_sketch", rectangle(10.0, 10.0), Vec::new(), true)
            .unwrap();
        assert_eq!(first.applied_constraints, 1);

        // Second batch on a non-empty sketch: flag is ignored.
        let second = doc
            .add_contour(
                "P1_sketch",
                vec![GeometryElement::Circle {
                    center: Vec2::new(5.0, 5.0),
                    radius: 2.0,
                }],
                Vec::new(),
                true,
            )
            .unwrap();
        assert_eq!(second.applied_constraints, 0);
    }

    #[test]
    fn batch_constraints_are_offset_into_the_sketch() {
        let mut doc = doc_with_plane();
        doc.create_sketch("P1", None).unwrap();
        doc.add_contour("P1_sketch", rectangle(10.0, 10.0), Vec::new(), false)
            .unwrap();

        // Constraint on batch element 0 of the second batch (sketch index 4).
        let report = doc
            .add_contour(
                "P1_sketch",
                vec![GeometryElement::Line {
                    start: Vec2::ZERO,
                    end: Vec2::new(1.0, 0.0),
                }],
                vec![Constraint::horizontal(0)],
                false,
            )
            .unwrap();
        assert_eq!(report.applied_constraints, 1);

        let sketch = doc.sketch("P1_sketch").unwrap();
        let last = sketch.constraints().last().unwrap();
        assert!(matches!(last, Constraint::Horizontal { geo: 4 }));
    }

    #[test]
    fn degenerate_element_surfaces_invalid_geometry() {
        let mut doc = doc_with_plane();
        doc.create_sketch("P1", None).unwrap();
        let err = doc
            .add_contour(
                "P1_sketch",
                vec![GeometryElement::Circle {
                    center: Vec2::ZERO,
                    radius: -1.0,
                }],
                Vec::new(),
                false,
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidGeometry(_)));
    }
}
