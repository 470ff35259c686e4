//! Feature orchestration on documents
//!
//! Every operation resolves all named inputs before touching the kernel, so
//! a recoverable failure never leaves half-registered state. Outputs land in
//! the registry under the given or derived name; consumed inputs are hidden,
//! not deleted, and the record keeps their names as lineage.

use std::collections::HashMap;

use glam::Vec3;
use mb_assembly::Placement;
use mb_cad::{
    Aabb, Axis3, EdgeId, ExtrudeDirection, FaceId, Feature, GeometryKernel, Sketch, Solid,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::datum;
use crate::document::{Document, SolidRecord};
use crate::error::{ModelError, ModelResult};
use crate::registry::{EntityHandle, EntityKind, NamePolicy};

/// Primitive solid shapes backing `create_object`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum PrimitiveSpec {
    Box { size: Vec3 },
    Cylinder { radius: f32, height: f32 },
    Sphere { radius: f32 },
}

impl PrimitiveSpec {
    fn type_name(&self) -> &'static str {
        match self {
            PrimitiveSpec::Box { .. } => "Box",
            PrimitiveSpec::Cylinder { .. } => "Cylinder",
            PrimitiveSpec::Sphere { .. } => "Sphere",
        }
    }

    fn validate(&self) -> ModelResult<()> {
        let ok = match self {
            PrimitiveSpec::Box { size } => size.min_element() > 0.0,
            PrimitiveSpec::Cylinder { radius, height } => *radius > 0.0 && *height > 0.0,
            PrimitiveSpec::Sphere { radius } => *radius > 0.0,
        };
        if ok {
            Ok(())
        } else {
            Err(ModelError::InvalidParameter(format!(
                "{} dimensions must be positive",
                self.type_name().to_lowercase()
            )))
        }
    }
}

/// Axis input: a registered axis by name, or an inline definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AxisSelector {
    Named(String),
    Explicit { point: Vec3, direction: Vec3 },
}

/// Object summary returned by queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub operation: String,
    pub inputs: Vec<String>,
    pub hidden: bool,
    pub mass: Option<f32>,
    pub material: Option<String>,
    pub bounding_box: Aabb,
    pub volume: f32,
}

impl Document {
    /// Resolve an object name for use as a feature input. A name that was
    /// deleted (rather than never existing) is an invalid reference.
    fn feature_solid(&self, name: &str) -> ModelResult<(Uuid, Solid)> {
        match self.registry.resolve_kind(name, EntityKind::Object) {
            Ok(handle) => {
                let record = self.solids.get(&handle.id).ok_or_else(|| {
                    ModelError::NotFound(format!("no object named '{name}'"))
                })?;
                Ok((handle.id, record.solid))
            }
            Err(err) => {
                if self.registry.was_deleted(name) {
                    Err(ModelError::InvalidReference(format!(
                        "input object '{name}' was deleted"
                    )))
                } else {
                    Err(err)
                }
            }
        }
    }

    /// Pick the output name and policy. Under the reject policy an explicit
    /// name conflicts here, before any kernel work happens.
    fn output_name(
        &self,
        explicit: Option<String>,
        default: String,
    ) -> ModelResult<(String, NamePolicy)> {
        match explicit {
            Some(name) => {
                if self.conflict_policy == NamePolicy::Reject && self.registry.contains(&name) {
                    Err(ModelError::NameConflict(format!(
                        "name '{name}' already in use"
                    )))
                } else {
                    Ok((name, self.conflict_policy))
                }
            }
            None => Ok((default, NamePolicy::AutoRename)),
        }
    }

    /// Register an output solid, record lineage, hide consumed inputs
    fn register_solid(
        &mut self,
        name: String,
        policy: NamePolicy,
        solid: Solid,
        operation: &str,
        inputs: Vec<String>,
        mass: Option<f32>,
        material: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let handle = self.registry.register(name, EntityKind::Object, policy)?;
        for input in &inputs {
            // Inputs were resolved above, so this cannot miss.
            self.registry.set_hidden(input, true)?;
        }
        self.solids.insert(
            handle.id,
            SolidRecord {
                solid,
                operation: operation.to_string(),
                inputs,
                mass,
                material,
            },
        );
        info!(object = %handle.name, operation, "object registered");
        Ok(handle)
    }

    fn resolve_axis(&self, selector: &AxisSelector) -> ModelResult<Axis3> {
        match selector {
            AxisSelector::Named(name) => self.axis(name),
            AxisSelector::Explicit { point, direction } => {
                datum::reference_axis(*point, *direction)
            }
        }
    }

    fn sketch_map(&self, names: &[&str]) -> ModelResult<(Vec<Uuid>, HashMap<Uuid, Sketch>)> {
        let mut ids = Vec::with_capacity(names.len());
        let mut map = HashMap::new();
        for name in names {
            let handle = self.registry.resolve_kind(name, EntityKind::Sketch)?;
            let sketch = self
                .sketches
                .get(&handle.id)
                .ok_or_else(|| ModelError::NotFound(format!("no sketch named '{name}'")))?;
            ids.push(handle.id);
            map.insert(handle.id, sketch.clone());
        }
        Ok((ids, map))
    }

    /// Create a primitive object at a placement
    pub fn create_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        spec: &PrimitiveSpec,
        placement: Placement,
        name: Option<String>,
        mass: Option<f32>,
        material: Option<String>,
    ) -> ModelResult<EntityHandle> {
        spec.validate()?;
        let (name, policy) = self.output_name(name, spec.type_name().to_string())?;

        let mut solid = match spec {
            PrimitiveSpec::Box { size } => kernel.create_box(placement.position, *size)?,
            PrimitiveSpec::Cylinder { radius, height } => {
                // Axis rotation is applied by the placement transform below.
                kernel.create_cylinder(placement.position, *radius, *height, Vec3::Z)?
            }
            PrimitiveSpec::Sphere { radius } => {
                kernel.create_sphere(placement.position, *radius)?
            }
        };
        if placement.rotation != glam::Quat::IDENTITY {
            // Rotate about the primitive's own center.
            let translation = placement.position - placement.rotation * placement.position;
            let rotated = kernel.transformed(&solid, translation, placement.rotation)?;
            kernel.release(&solid)?;
            solid = rotated;
        }

        self.register_solid(
            name,
            policy,
            solid,
            spec.type_name(),
            Vec::new(),
            mass,
            material,
        )
    }

    /// Extrude a sketch into a solid. Default name: `<sketch>_solid`.
    pub fn extrude_sketch(
        &mut self,
        kernel: &dyn GeometryKernel,
        sketch_name: &str,
        distance: f32,
        direction: ExtrudeDirection,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (ids, sketches) = self.sketch_map(&[sketch_name])?;
        let (name, policy) = self.output_name(name, format!("{sketch_name}_solid"))?;

        let feature = Feature::extrude(ids[0], distance, direction);
        let solid = feature.execute(kernel, &sketches, &HashMap::new())?;
        self.register_solid(
            name,
            policy,
            solid,
            "extrude",
            vec![sketch_name.to_string()],
            None,
            None,
        )
    }

    /// Revolve a sketch around an axis (angle in degrees)
    pub fn revolve_sketch(
        &mut self,
        kernel: &dyn GeometryKernel,
        sketch_name: &str,
        axis: &AxisSelector,
        angle: f32,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (ids, sketches) = self.sketch_map(&[sketch_name])?;
        let axis = self.resolve_axis(axis)?;
        let (name, policy) = self.output_name(name, format!("{sketch_name}_solid"))?;

        let feature = Feature::revolve(ids[0], axis, angle);
        let solid = feature.execute(kernel, &sketches, &HashMap::new())?;
        self.register_solid(
            name,
            policy,
            solid,
            "revolve",
            vec![sketch_name.to_string()],
            None,
            None,
        )
    }

    /// Sweep a profile sketch along a path sketch
    pub fn sweep_sketch(
        &mut self,
        kernel: &dyn GeometryKernel,
        profile_sketch: &str,
        path_sketch: &str,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (ids, sketches) = self.sketch_map(&[profile_sketch, path_sketch])?;
        let (name, policy) = self.output_name(name, "Sweep".to_string())?;

        let feature = Feature::sweep(ids[0], ids[1]);
        let solid = feature.execute(kernel, &sketches, &HashMap::new())?;
        self.register_solid(
            name,
            policy,
            solid,
            "sweep",
            vec![profile_sketch.to_string(), path_sketch.to_string()],
            None,
            None,
        )
    }

    /// Loft through two or more profile sketches
    pub fn loft_sketches(
        &mut self,
        kernel: &dyn GeometryKernel,
        sketch_names: &[String],
        ruled: bool,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let refs: Vec<&str> = sketch_names.iter().map(String::as_str).collect();
        let (ids, sketches) = self.sketch_map(&refs)?;
        let (name, policy) = self.output_name(name, "Loft".to_string())?;

        let feature = Feature::loft(ids, true, ruled);
        let solid = feature.execute(kernel, &sketches, &HashMap::new())?;
        self.register_solid(
            name,
            policy,
            solid,
            "loft",
            sketch_names.to_vec(),
            None,
            None,
        )
    }

    /// Fuse a base object with one or more tools. Default name: `Union`.
    pub fn boolean_union(
        &mut self,
        kernel: &dyn GeometryKernel,
        base: &str,
        tools: &[String],
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (base_id, base_solid) = self.feature_solid(base)?;
        let mut bodies = HashMap::from([(base_id, base_solid)]);
        let mut tool_ids = Vec::with_capacity(tools.len());
        for tool in tools {
            let (id, solid) = self.feature_solid(tool)?;
            bodies.insert(id, solid);
            tool_ids.push(id);
        }
        let (name, policy) = self.output_name(name, "Union".to_string())?;

        let feature = Feature::union(base_id, tool_ids);
        let solid = feature.execute(kernel, &sketches_none(), &bodies)?;
        let mut inputs = vec![base.to_string()];
        inputs.extend(tools.iter().cloned());
        self.register_solid(name, policy, solid, "union", inputs, None, None)
    }

    /// Remove a single tool from a base object. Default name: `Cut`.
    pub fn boolean_cut(
        &mut self,
        kernel: &dyn GeometryKernel,
        base: &str,
        tool: &str,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (base_id, base_solid) = self.feature_solid(base)?;
        let (tool_id, tool_solid) = self.feature_solid(tool)?;
        let (name, policy) = self.output_name(name, "Cut".to_string())?;

        let bodies = HashMap::from([(base_id, base_solid), (tool_id, tool_solid)]);
        let feature = Feature::cut(base_id, tool_id);
        let solid = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            solid,
            "cut",
            vec![base.to_string(), tool.to_string()],
            None,
            None,
        )
    }

    /// Keep the common volume of a base and tools. Default name:
    /// `Intersection`.
    pub fn boolean_intersection(
        &mut self,
        kernel: &dyn GeometryKernel,
        base: &str,
        tools: &[String],
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (base_id, base_solid) = self.feature_solid(base)?;
        let mut bodies = HashMap::from([(base_id, base_solid)]);
        let mut tool_ids = Vec::with_capacity(tools.len());
        for tool in tools {
            let (id, solid) = self.feature_solid(tool)?;
            bodies.insert(id, solid);
            tool_ids.push(id);
        }
        let (name, policy) = self.output_name(name, "Intersection".to_string())?;

        let feature = Feature::intersect(base_id, tool_ids);
        let solid = feature.execute(kernel, &sketches_none(), &bodies)?;
        let mut inputs = vec![base.to_string()];
        inputs.extend(tools.iter().cloned());
        self.register_solid(name, policy, solid, "intersection", inputs, None, None)
    }

    /// Fillet edges of an object (all edges when none are given)
    pub fn fillet_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        radius: f32,
        edges: Option<&[u32]>,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let edge_ids = self.edge_selection(kernel, &solid, edges)?;
        let (name, policy) = self.output_name(name, "Fillet".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::fillet(id, edge_ids, radius);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            out,
            "fillet",
            vec![object.to_string()],
            None,
            None,
        )
    }

    /// Chamfer edges of an object (all edges when none are given)
    pub fn chamfer_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        distance: f32,
        edges: Option<&[u32]>,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let edge_ids = self.edge_selection(kernel, &solid, edges)?;
        let (name, policy) = self.output_name(name, "Chamfer".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::chamfer(id, edge_ids, distance);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            out,
            "chamfer",
            vec![object.to_string()],
            None,
            None,
        )
    }

    fn edge_selection(
        &self,
        kernel: &dyn GeometryKernel,
        solid: &Solid,
        edges: Option<&[u32]>,
    ) -> ModelResult<Vec<EdgeId>> {
        match edges {
            Some(indices) => Ok(indices
                .iter()
                .map(|&i| EdgeId::new(solid.id, i))
                .collect()),
            None => Ok(kernel.get_edges(solid)?.into_iter().map(|e| e.id).collect()),
        }
    }

    /// Hollow out an object, optionally opening selected faces
    pub fn shell_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        thickness: f32,
        faces_to_remove: Option<&[u32]>,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let faces: Vec<FaceId> = faces_to_remove
            .unwrap_or_default()
            .iter()
            .map(|&i| FaceId::new(solid.id, i))
            .collect();
        let (name, policy) = self.output_name(name, "Shell".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::shell(id, thickness, faces);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            out,
            "shell",
            vec![object.to_string()],
            None,
            None,
        )
    }

    /// Mirror an object across a plane. With `merge`, the result fuses the
    /// original and its reflection under one name.
    pub fn mirror_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        plane_point: Vec3,
        plane_normal: Vec3,
        merge: bool,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let (name, policy) = self.output_name(name, "Mirror".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::mirror(id, plane_point, plane_normal, merge);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        // A merged mirror consumes the original; an independent copy leaves
        // it visible.
        let inputs = if merge {
            vec![object.to_string()]
        } else {
            Vec::new()
        };
        self.register_solid(name, policy, out, "mirror", inputs, None, None)
    }

    /// Repeat an object around an axis. Default name: `Pattern`.
    pub fn circular_pattern(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        axis: &AxisSelector,
        angle: f32,
        count: u32,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let axis = self.resolve_axis(axis)?;
        let (name, policy) = self.output_name(name, "Pattern".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::polar_pattern(id, axis, angle, count);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            out,
            "circular_pattern",
            vec![object.to_string()],
            None,
            None,
        )
    }

    /// Repeat an object along a direction. Default name: `Pattern`.
    pub fn linear_pattern(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        direction: Vec3,
        spacing: f32,
        count: u32,
        name: Option<String>,
    ) -> ModelResult<EntityHandle> {
        let (id, solid) = self.feature_solid(object)?;
        let (name, policy) = self.output_name(name, "Pattern".to_string())?;

        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::linear_pattern(id, direction, spacing, count);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;
        self.register_solid(
            name,
            policy,
            out,
            "linear_pattern",
            vec![object.to_string()],
            None,
            None,
        )
    }

    /// Move/rotate an object in place (rotation in XYZ Euler degrees).
    /// The name is kept; the old kernel solid is released.
    pub fn transform_object(
        &mut self,
        kernel: &dyn GeometryKernel,
        object: &str,
        translation: Vec3,
        rotation: Vec3,
    ) -> ModelResult<()> {
        let (id, solid) = self.feature_solid(object)?;
        let bodies = HashMap::from([(id, solid)]);
        let feature = Feature::transform(id, translation, rotation);
        let out = feature.execute(kernel, &sketches_none(), &bodies)?;

        let record = self
            .solids
            .get_mut(&id)
            .ok_or_else(|| ModelError::NotFound(format!("no object named '{object}'")))?;
        kernel.release(&record.solid)?;
        record.solid = out;
        debug!(object, "object transformed");
        Ok(())
    }

    /// Summary of one object, with kernel-side geometry queries
    pub fn get_object(
        &self,
        kernel: &dyn GeometryKernel,
        name: &str,
    ) -> ModelResult<ObjectInfo> {
        let handle = self.registry.resolve_kind(name, EntityKind::Object)?;
        let record = self
            .solids
            .get(&handle.id)
            .ok_or_else(|| ModelError::NotFound(format!("no object named '{name}'")))?;
        Ok(ObjectInfo {
            name: handle.name.clone(),
            operation: record.operation.clone(),
            inputs: record.inputs.clone(),
            hidden: handle.hidden,
            mass: record.mass,
            material: record.material.clone(),
            bounding_box: kernel.bounding_box(&record.solid)?,
            volume: kernel.volume(&record.solid)?,
        })
    }

    /// Summaries of all objects in creation order
    pub fn get_objects(
        &self,
        kernel: &dyn GeometryKernel,
        include_hidden: bool,
    ) -> ModelResult<Vec<ObjectInfo>> {
        let mut out = Vec::new();
        for handle in self.registry.list(Some(EntityKind::Object)) {
            if handle.hidden && !include_hidden {
                continue;
            }
            out.push(self.get_object(kernel, &handle.name)?);
        }
        Ok(out)
    }
}

fn sketches_none() -> HashMap<Uuid, Sketch> {
    HashMap::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::{BasePlane, PlaneDefinition};
    use approx::assert_relative_eq;
    use glam::Vec2;
    use mb_cad::{BoundsKernel, GeometryElement};

    fn doc_with_rect_sketch() -> (Document, BoundsKernel) {
        let mut doc = Document::new("test");
        doc.add_plane(
            Some("P1".into()),
            &PlaneDefinition::Base {
                plane: BasePlane::Xy,
                offset: 0.0,
            },
        )
        .unwrap();
        doc.create_sketch("P1", None).unwrap();
        let corners = [
            Vec2::ZERO,
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 50.0),
            Vec2::new(0.0, 50.0),
        ];
        let lines = (0..4)
            .map(|i| GeometryElement::Line {
                start: corners[i],
                end: corners[(i + 1) % 4],
            })
            .collect();
        doc.add_contour("P1_sketch", lines, Vec::new(), true).unwrap();
        (doc, BoundsKernel::new())
    }

    #[test]
    fn extrude_registers_derived_name_and_hides_sketch() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        let handle = doc
            .extrude_sketch(&kernel, "P1_sketch", 20.0, ExtrudeDirection::Positive, None)
            .unwrap();
        assert_eq!(handle.name, "P1_sketch_solid");

        let info = doc.get_object(&kernel, "P1_sketch_solid").unwrap();
        assert_relative_eq!(info.volume, 100_000.0, epsilon = 1.0);
        assert_eq!(info.inputs, ["P1_sketch"]);

        // The consumed sketch is hidden, not gone.
        let sketch_handle = doc.registry.resolve("P1_sketch").unwrap();
        assert!(sketch_handle.hidden);
    }

    #[test]
    fn deleted_consumed_input_is_invalid_reference() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.extrude_sketch(&kernel, "P1_sketch", 20.0, ExtrudeDirection::Positive, None)
            .unwrap();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Box {
                size: Vec3::splat(10.0),
            },
            Placement::IDENTITY,
            Some("tool".into()),
            None,
            None,
        )
        .unwrap();
        doc.delete_entity("tool", &kernel).unwrap();

        let err = doc
            .boolean_cut(&kernel, "P1_sketch_solid", "tool", None)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidReference(_)));

        // A name that never existed stays NotFound.
        let err = doc
            .boolean_cut(&kernel, "P1_sketch_solid", "never_was", None)
            .unwrap_err();
        assert!(matches!(err, ModelError::NotFound(_)));
    }

    #[test]
    fn explicit_name_conflict_precedes_kernel_work() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.extrude_sketch(&kernel, "P1_sketch", 20.0, ExtrudeDirection::Positive, None)
            .unwrap();
        let err = doc
            .extrude_sketch(
                &kernel,
                "P1_sketch",
                5.0,
                ExtrudeDirection::Positive,
                Some("P1_sketch_solid".into()),
            )
            .unwrap_err();
        assert!(matches!(err, ModelError::NameConflict(_)));
    }

    #[test]
    fn cut_hides_both_inputs() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.extrude_sketch(&kernel, "P1_sketch", 20.0, ExtrudeDirection::Positive, None)
            .unwrap();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Box {
                size: Vec3::splat(10.0),
            },
            Placement::from_translation(Vec3::new(500.0, 0.0, 0.0)),
            Some("far_tool".into()),
            None,
            None,
        )
        .unwrap();

        let handle = doc
            .boolean_cut(&kernel, "P1_sketch_solid", "far_tool", None)
            .unwrap();
        assert_eq!(handle.name, "Cut");
        assert!(doc.registry.resolve("P1_sketch_solid").unwrap().hidden);
        assert!(doc.registry.resolve("far_tool").unwrap().hidden);

        // Disjoint tool: cut result keeps the base geometry.
        let info = doc.get_object(&kernel, "Cut").unwrap();
        assert_relative_eq!(info.volume, 100_000.0, epsilon = 1.0);
    }

    #[test]
    fn circular_pattern_with_named_axis() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.add_axis(Some("spin".into()), Vec3::ZERO, Vec3::Z).unwrap();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Cylinder {
                radius: 5.0,
                height: 10.0,
            },
            Placement::from_translation(Vec3::new(40.0, 0.0, 0.0)),
            Some("peg".into()),
            None,
            None,
        )
        .unwrap();

        let handle = doc
            .circular_pattern(&kernel, "peg", &AxisSelector::Named("spin".into()), 360.0, 4, None)
            .unwrap();
        let info = doc.get_object(&kernel, &handle.name).unwrap();
        // Four disjoint instances: volumes add.
        let single = std::f32::consts::PI * 25.0 * 10.0;
        assert_relative_eq!(info.volume, 4.0 * single, epsilon = 10.0);
    }

    #[test]
    fn pattern_count_below_two_is_invalid_parameter() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Sphere { radius: 3.0 },
            Placement::IDENTITY,
            Some("ball".into()),
            None,
            None,
        )
        .unwrap();
        let err = doc
            .linear_pattern(&kernel, "ball", Vec3::X, 10.0, 1, None)
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter(_)));
    }

    #[test]
    fn get_objects_filters_hidden() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.extrude_sketch(&kernel, "P1_sketch", 20.0, ExtrudeDirection::Positive, None)
            .unwrap();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Box {
                size: Vec3::splat(10.0),
            },
            Placement::from_translation(Vec3::new(500.0, 0.0, 0.0)),
            None,
            None,
            None,
        )
        .unwrap();
        doc.boolean_cut(&kernel, "P1_sketch_solid", "Box", None)
            .unwrap();

        let visible = doc.get_objects(&kernel, false).unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].name, "Cut");

        let all = doc.get_objects(&kernel, true).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn transform_keeps_the_name_and_moves_geometry() {
        let (mut doc, kernel) = doc_with_rect_sketch();
        doc.create_object(
            &kernel,
            &PrimitiveSpec::Box {
                size: Vec3::splat(10.0),
            },
            Placement::IDENTITY,
            Some("block".into()),
            None,
            None,
        )
        .unwrap();

        doc.transform_object(&kernel, "block", Vec3::new(25.0, 0.0, 0.0), Vec3::ZERO)
            .unwrap();
        let info = doc.get_object(&kernel, "block").unwrap();
        assert_relative_eq!(info.bounding_box.center().x, 25.0, epsilon = 1e-3);
    }
}
