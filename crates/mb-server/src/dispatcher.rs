//! Command dispatcher
//!
//! The bridge owns the document store and a shared kernel handle. Commands
//! are serialized per document (each document sits behind its own mutex)
//! while different documents proceed independently. Recoverable failures are
//! rendered into the envelope and never leave a document half-updated.

use mb_assembly::{
    Assembly, AssemblyConstraint, AssemblyModel, ConstraintAssembly, ElementRef, Placement,
    export_json, generate_bom, render_bom,
};
use mb_assembly::bom::BomFormat;
use mb_assembly::graph::DEFAULT_TOLERANCE;
use mb_cad::{GeometryKernel, default_kernel};
use mb_model::{Document, DocumentStore, ModelError, ModelResult, NamePolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::command::{Command, Request};
use crate::envelope::Response;

/// Dispatcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Policy for explicitly requested names that are already taken
    pub name_conflict_policy: NamePolicy,
    /// Residual tolerance handed to constraint assemblies
    pub solver_tolerance: f32,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name_conflict_policy: NamePolicy::Reject,
            solver_tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// The command entry point
pub struct Bridge {
    store: DocumentStore,
    kernel: Box<dyn GeometryKernel>,
    config: DispatcherConfig,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new()
    }
}

impl Bridge {
    /// Bridge over the default kernel
    pub fn new() -> Self {
        Self::with_kernel(default_kernel())
    }

    /// Bridge over a specific kernel
    pub fn with_kernel(kernel: Box<dyn GeometryKernel>) -> Self {
        Self {
            store: DocumentStore::new(),
            kernel,
            config: DispatcherConfig::default(),
        }
    }

    /// Override the configuration
    pub fn with_config(mut self, config: DispatcherConfig) -> Self {
        self.config = config;
        self
    }

    /// Handle a raw JSON request. Parse failures (including unknown command
    /// names) come back as `InvalidParameter`.
    pub fn handle_json(&self, payload: &str) -> Response {
        match serde_json::from_str::<Request>(payload) {
            Ok(request) => self.handle(request),
            Err(err) => Response::failure(&ModelError::InvalidParameter(err.to_string())),
        }
    }

    /// Handle a parsed request
    pub fn handle(&self, request: Request) -> Response {
        let command = request.command.name();
        debug!(command, document = ?request.document, "dispatching command");
        match self.dispatch(request.document.as_deref(), request.command) {
            Ok(response) => {
                debug!(command, "command succeeded");
                response
            }
            Err(err) => {
                warn!(command, kind = err.kind(), error = %err, "command failed");
                Response::failure(&err)
            }
        }
    }

    fn dispatch(&self, document: Option<&str>, command: Command) -> ModelResult<Response> {
        // Document lifecycle runs against the store; everything else locks
        // one document.
        match command {
            Command::CreateDocument { name } => {
                self.store.create_document(&name)?;
                self.store.resolve(Some(&name))?.lock().conflict_policy =
                    self.config.name_conflict_policy;
                Ok(Response::message(format!("document '{name}' created")))
            }
            Command::DeleteDocument { name } => {
                self.store.delete_document(&name)?;
                Ok(Response::message(format!("document '{name}' deleted")))
            }
            Command::SetActiveDocument { name } => {
                self.store.set_active(&name)?;
                Ok(Response::message(format!("document '{name}' is active")))
            }
            other => {
                let doc = self.store.resolve(document)?;
                let mut doc = doc.lock();
                self.run(&mut doc, other)
            }
        }
    }

    fn run(&self, doc: &mut Document, command: Command) -> ModelResult<Response> {
        let kernel = self.kernel.as_ref();
        match command {
            Command::CreateDocument { .. }
            | Command::DeleteDocument { .. }
            | Command::SetActiveDocument { .. } => unreachable!("handled in dispatch"),

            Command::CreateObject {
                primitive,
                name,
                position,
                rotation,
                mass,
                material,
            } => {
                let placement = Placement::from_position_euler(position, rotation);
                let handle =
                    doc.create_object(kernel, &primitive, placement, name, mass, material)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::GetObject { name } => {
                Ok(Response::result(to_value(&doc.get_object(kernel, &name)?)?))
            }
            Command::GetObjects { include_hidden } => Ok(Response::result(to_value(
                &doc.get_objects(kernel, include_hidden)?,
            )?)),
            Command::DeleteObject { name } => {
                doc.delete_entity(&name, kernel)?;
                Ok(Response::message(format!("'{name}' deleted")))
            }

            Command::CreateDatumPlane { name, definition } => {
                let handle = doc.add_plane(name, &definition)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::CreateReferenceAxis {
                name,
                point,
                direction,
            } => {
                let handle = doc.add_axis(name, point, direction)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::CreateSketchOnPlane { plane, name } => {
                let handle = doc.create_sketch(&plane, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::AddContourToSketch {
                sketch,
                elements,
                constraints,
                fix_first_point_to_origin,
            } => {
                let report =
                    doc.add_contour(&sketch, elements, constraints, fix_first_point_to_origin)?;
                Ok(Response::result(to_value(&report)?))
            }

            Command::ExtrudeSketch {
                sketch,
                distance,
                direction,
                name,
            } => {
                let handle = doc.extrude_sketch(kernel, &sketch, distance, direction, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::Revolve {
                sketch,
                axis,
                angle,
                name,
            } => {
                let handle = doc.revolve_sketch(kernel, &sketch, &axis, angle, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::Loft {
                sketches,
                ruled,
                name,
            } => {
                let handle = doc.loft_sketches(kernel, &sketches, ruled, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::Sweep {
                profile,
                path,
                name,
            } => {
                let handle = doc.sweep_sketch(kernel, &profile, &path, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::BooleanUnion { base, tools, name } => {
                let handle = doc.boolean_union(kernel, &base, &tools, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::BooleanCut { base, tool, name } => {
                let handle = doc.boolean_cut(kernel, &base, &tool, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::BooleanIntersection { base, tools, name } => {
                let handle = doc.boolean_intersection(kernel, &base, &tools, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::Fillet {
                object,
                radius,
                edges,
                name,
            } => {
                let handle = doc.fillet_object(kernel, &object, radius, edges.as_deref(), name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::Chamfer {
                object,
                distance,
                edges,
                name,
            } => {
                let handle =
                    doc.chamfer_object(kernel, &object, distance, edges.as_deref(), name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::ShellObject {
                object,
                thickness,
                faces_to_remove,
                name,
            } => {
                let handle = doc.shell_object(
                    kernel,
                    &object,
                    thickness,
                    faces_to_remove.as_deref(),
                    name,
                )?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::MirrorObject {
                object,
                plane_point,
                plane_normal,
                merge,
                name,
            } => {
                let handle =
                    doc.mirror_object(kernel, &object, plane_point, plane_normal, merge, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::CircularPattern {
                object,
                axis,
                angle,
                count,
                name,
            } => {
                let handle = doc.circular_pattern(kernel, &object, &axis, angle, count, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::LinearPattern {
                object,
                direction,
                spacing,
                count,
                name,
            } => {
                let handle =
                    doc.linear_pattern(kernel, &object, direction, spacing, count, name)?;
                Ok(Response::result(json!({ "name": handle.name })))
            }
            Command::TransformObject {
                object,
                translation,
                rotation,
            } => {
                doc.transform_object(kernel, &object, translation, rotation)?;
                Ok(Response::message(format!("'{object}' transformed")))
            }

            Command::CreateAssembly { name, model } => {
                doc.create_assembly(name.clone(), model)?;
                if model == AssemblyModel::Constraint {
                    *doc.assembly_mut(&name)? = Assembly::Constraint(
                        ConstraintAssembly::new(name.clone())
                            .with_tolerance(self.config.solver_tolerance),
                    );
                }
                Ok(Response::message(format!(
                    "{} assembly '{name}' created",
                    model.as_str()
                )))
            }
            Command::AddAssemblyPart {
                assembly,
                part,
                mass,
                material,
            } => {
                doc.assembly_mut(&assembly)?
                    .as_constraint_mut()?
                    .add_part(part.clone(), mass, material)?;
                Ok(Response::message(format!("part '{part}' added")))
            }
            Command::AddAssemblyConstraint {
                assembly,
                name,
                kind,
                references,
            } => {
                let refs = references
                    .iter()
                    .map(|s| ElementRef::parse(s))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(ModelError::InvalidParameter)?;
                let constraint = AssemblyConstraint::new(name.clone(), kind, refs)?;
                doc.assembly_mut(&assembly)?
                    .as_constraint_mut()?
                    .add_constraint(constraint)?;
                Ok(Response::message(format!("constraint '{name}' added")))
            }
            Command::SolveAssembly { assembly } => {
                let report = doc.assembly_mut(&assembly)?.as_constraint_mut()?.solve()?;
                Ok(Response::result(to_value(&report)?))
            }
            Command::ListAssemblyConstraints { assembly } => {
                let constraints = doc
                    .assembly_mut(&assembly)?
                    .as_constraint_mut()?
                    .constraints()
                    .to_vec();
                Ok(Response::result(to_value(&constraints)?))
            }
            Command::DeleteAssemblyConstraint { assembly, name } => {
                doc.assembly_mut(&assembly)?
                    .as_constraint_mut()?
                    .delete_constraint(&name)?;
                Ok(Response::message(format!("constraint '{name}' deleted")))
            }
            Command::ModifyAssemblyConstraint {
                assembly,
                name,
                kind,
            } => {
                doc.assembly_mut(&assembly)?
                    .as_constraint_mut()?
                    .modify_constraint(&name, kind)?;
                Ok(Response::message(format!("constraint '{name}' modified")))
            }

            Command::CreateLcs {
                assembly,
                name,
                position,
                rotation,
            } => {
                doc.assembly_mut(&assembly)?
                    .as_hierarchy_mut()?
                    .create_lcs(name.clone(), Placement::from_position_euler(position, rotation))?;
                Ok(Response::message(format!("lcs '{name}' created")))
            }
            Command::AttachLcsToGeometry {
                assembly,
                lcs,
                part,
                element,
            } => {
                doc.assembly_mut(&assembly)?
                    .as_hierarchy_mut()?
                    .attach_lcs(&lcs, part, element)?;
                Ok(Response::message(format!("lcs '{lcs}' attached")))
            }
            Command::InsertAssemblyPart {
                assembly,
                part,
                mass,
                target_lcs,
                position,
                rotation,
                material,
                geometry,
            } => {
                let hierarchy = doc.assembly_mut(&assembly)?.as_hierarchy_mut()?;
                hierarchy.insert_part(
                    part.clone(),
                    mass,
                    &target_lcs,
                    Placement::from_position_euler(position, rotation),
                    material,
                )?;
                for attachment in geometry {
                    hierarchy.register_geometry(
                        part.clone(),
                        attachment.element,
                        Placement::from_position_euler(attachment.position, attachment.rotation),
                    );
                }
                Ok(Response::message(format!("part '{part}' inserted")))
            }
            Command::ListLcs { assembly } => {
                let lcs = doc
                    .assembly_mut(&assembly)?
                    .as_hierarchy_mut()?
                    .lcs_list()
                    .to_vec();
                Ok(Response::result(to_value(&lcs)?))
            }
            Command::DeleteLcs { assembly, lcs } => {
                doc.assembly_mut(&assembly)?
                    .as_hierarchy_mut()?
                    .delete_lcs(&lcs)?;
                Ok(Response::message(format!("lcs '{lcs}' deleted")))
            }
            Command::ModifyLcs {
                assembly,
                lcs,
                position,
                rotation,
            } => {
                doc.assembly_mut(&assembly)?
                    .as_hierarchy_mut()?
                    .modify_lcs(&lcs, Placement::from_position_euler(position, rotation))?;
                Ok(Response::message(format!("lcs '{lcs}' modified")))
            }

            Command::ListAssemblyParts { assembly } => {
                Ok(Response::result(to_value(&doc.assembly(&assembly)?.list_parts())?))
            }
            Command::CalculateAssemblyMass { assembly } => Ok(Response::result(to_value(
                &doc.assembly(&assembly)?.calculate_mass()?,
            )?)),
            Command::GenerateBom {
                assembly,
                group_by,
                format,
            } => {
                let rows = generate_bom(doc.assembly(&assembly)?, group_by);
                match format {
                    BomFormat::Json => Ok(Response::result(to_value(&rows)?)),
                    other => Ok(Response::result(Value::String(render_bom(&rows, other)))),
                }
            }
            Command::ExportAssembly { assembly } => {
                Ok(Response::result(export_json(doc.assembly(&assembly)?)?))
            }
        }
    }
}

fn to_value<T: Serialize>(value: &T) -> ModelResult<Value> {
    serde_json::to_value(value)
        .map_err(|err| ModelError::GeometryOperationFailed(err.to_string()))
}
