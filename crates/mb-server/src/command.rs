//! Command surface
//!
//! A closed enum of every operation a client can request. The wire shape is
//! `{ "command": "...", "document": "...", ...fields }`; the `document` field
//! is peeled off by [`Request`] and the rest selects a variant here.

use glam::Vec3;
use mb_assembly::{AssemblyModel, BomFormat, BomGroupKey, ConstraintKind};
use mb_cad::{Constraint, ExtrudeDirection, GeometryElement};
use mb_model::{AxisSelector, PlaneDefinition, PrimitiveSpec};
use serde::{Deserialize, Serialize};

fn full_turn() -> f32 {
    360.0
}

/// A command plus its optional document override
#[derive(Debug, Clone, Deserialize)]
pub struct Request {
    /// Target document; the active document when omitted
    #[serde(default)]
    pub document: Option<String>,
    /// The operation itself
    #[serde(flatten)]
    pub command: Command,
}

/// Geometry element registered on an inserted assembly part, so coordinate
/// systems can attach to it later
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometryAttachment {
    pub element: String,
    #[serde(default)]
    pub position: Vec3,
    /// XYZ Euler angles in degrees
    #[serde(default)]
    pub rotation: Vec3,
}

/// Every operation the server understands
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    // Document lifecycle
    CreateDocument {
        name: String,
    },
    DeleteDocument {
        name: String,
    },
    SetActiveDocument {
        name: String,
    },

    // Objects
    CreateObject {
        primitive: PrimitiveSpec,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        position: Vec3,
        /// XYZ Euler angles in degrees
        #[serde(default)]
        rotation: Vec3,
        #[serde(default)]
        mass: Option<f32>,
        #[serde(default)]
        material: Option<String>,
    },
    GetObject {
        name: String,
    },
    GetObjects {
        #[serde(default)]
        include_hidden: bool,
    },
    DeleteObject {
        name: String,
    },

    // Datums and sketches
    CreateDatumPlane {
        #[serde(default)]
        name: Option<String>,
        #[serde(flatten)]
        definition: PlaneDefinition,
    },
    CreateReferenceAxis {
        #[serde(default)]
        name: Option<String>,
        point: Vec3,
        direction: Vec3,
    },
    CreateSketchOnPlane {
        plane: String,
        #[serde(default)]
        name: Option<String>,
    },
    AddContourToSketch {
        sketch: String,
        elements: Vec<GeometryElement>,
        #[serde(default)]
        constraints: Vec<Constraint>,
        #[serde(default)]
        fix_first_point_to_origin: bool,
    },

    // Features
    ExtrudeSketch {
        sketch: String,
        distance: f32,
        #[serde(default)]
        direction: ExtrudeDirection,
        #[serde(default)]
        name: Option<String>,
    },
    Revolve {
        sketch: String,
        axis: AxisSelector,
        #[serde(default = "full_turn")]
        angle: f32,
        #[serde(default)]
        name: Option<String>,
    },
    Loft {
        sketches: Vec<String>,
        #[serde(default)]
        ruled: bool,
        #[serde(default)]
        name: Option<String>,
    },
    Sweep {
        profile: String,
        path: String,
        #[serde(default)]
        name: Option<String>,
    },
    BooleanUnion {
        base: String,
        tools: Vec<String>,
        #[serde(default)]
        name: Option<String>,
    },
    BooleanCut {
        base: String,
        tool: String,
        #[serde(default)]
        name: Option<String>,
    },
    BooleanIntersection {
        base: String,
        tools: Vec<String>,
        #[serde(default)]
        name: Option<String>,
    },
    Fillet {
        object: String,
        radius: f32,
        /// Edge indices; all edges when omitted
        #[serde(default)]
        edges: Option<Vec<u32>>,
        #[serde(default)]
        name: Option<String>,
    },
    Chamfer {
        object: String,
        distance: f32,
        #[serde(default)]
        edges: Option<Vec<u32>>,
        #[serde(default)]
        name: Option<String>,
    },
    ShellObject {
        object: String,
        thickness: f32,
        #[serde(default)]
        faces_to_remove: Option<Vec<u32>>,
        #[serde(default)]
        name: Option<String>,
    },
    MirrorObject {
        object: String,
        plane_point: Vec3,
        plane_normal: Vec3,
        #[serde(default)]
        merge: bool,
        #[serde(default)]
        name: Option<String>,
    },
    CircularPattern {
        object: String,
        axis: AxisSelector,
        #[serde(default = "full_turn")]
        angle: f32,
        count: u32,
        #[serde(default)]
        name: Option<String>,
    },
    LinearPattern {
        object: String,
        direction: Vec3,
        spacing: f32,
        count: u32,
        #[serde(default)]
        name: Option<String>,
    },
    TransformObject {
        object: String,
        #[serde(default)]
        translation: Vec3,
        /// XYZ Euler angles in degrees
        #[serde(default)]
        rotation: Vec3,
    },

    // Assemblies
    CreateAssembly {
        name: String,
        model: AssemblyModel,
    },
    AddAssemblyPart {
        assembly: String,
        part: String,
        #[serde(default)]
        mass: f32,
        #[serde(default)]
        material: Option<String>,
    },
    AddAssemblyConstraint {
        assembly: String,
        name: String,
        #[serde(flatten)]
        kind: ConstraintKind,
        /// `part.element` references, one per arity slot
        references: Vec<String>,
    },
    SolveAssembly {
        assembly: String,
    },
    ListAssemblyConstraints {
        assembly: String,
    },
    DeleteAssemblyConstraint {
        assembly: String,
        name: String,
    },
    ModifyAssemblyConstraint {
        assembly: String,
        name: String,
        #[serde(flatten)]
        kind: ConstraintKind,
    },
    CreateLcs {
        assembly: String,
        name: String,
        #[serde(default)]
        position: Vec3,
        /// XYZ Euler angles in degrees
        #[serde(default)]
        rotation: Vec3,
    },
    AttachLcsToGeometry {
        assembly: String,
        lcs: String,
        part: String,
        element: String,
    },
    InsertAssemblyPart {
        assembly: String,
        part: String,
        #[serde(default)]
        mass: f32,
        target_lcs: String,
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        rotation: Vec3,
        #[serde(default)]
        material: Option<String>,
        /// Geometry elements carried by the part
        #[serde(default)]
        geometry: Vec<GeometryAttachment>,
    },
    ListLcs {
        assembly: String,
    },
    DeleteLcs {
        assembly: String,
        lcs: String,
    },
    ModifyLcs {
        assembly: String,
        lcs: String,
        #[serde(default)]
        position: Vec3,
        #[serde(default)]
        rotation: Vec3,
    },
    ListAssemblyParts {
        assembly: String,
    },
    CalculateAssemblyMass {
        assembly: String,
    },
    GenerateBom {
        assembly: String,
        #[serde(default)]
        group_by: BomGroupKey,
        #[serde(default)]
        format: BomFormat,
    },
    ExportAssembly {
        assembly: String,
    },
}

impl Command {
    /// Wire name of the command (for logging)
    pub fn name(&self) -> &'static str {
        match self {
            Command::CreateDocument { .. } => "create_document",
            Command::DeleteDocument { .. } => "delete_document",
            Command::SetActiveDocument { .. } => "set_active_document",
            Command::CreateObject { .. } => "create_object",
            Command::GetObject { .. } => "get_object",
            Command::GetObjects { .. } => "get_objects",
            Command::DeleteObject { .. } => "delete_object",
            Command::CreateDatumPlane { .. } => "create_datum_plane",
            Command::CreateReferenceAxis { .. } => "create_reference_axis",
            Command::CreateSketchOnPlane { .. } => "create_sketch_on_plane",
            Command::AddContourToSketch { .. } => "add_contour_to_sketch",
            Command::ExtrudeSketch { .. } => "extrude_sketch",
            Command::Revolve { .. } => "revolve",
            Command::Loft { .. } => "loft",
            Command::Sweep { .. } => "sweep",
            Command::BooleanUnion { .. } => "boolean_union",
            Command::BooleanCut { .. } => "boolean_cut",
            Command::BooleanIntersection { .. } => "boolean_intersection",
            Command::Fillet { .. } => "fillet",
            Command::Chamfer { .. } => "chamfer",
            Command::ShellObject { .. } => "shell_object",
            Command::MirrorObject { .. } => "mirror_object",
            Command::CircularPattern { .. } => "circular_pattern",
            Command::LinearPattern { .. } => "linear_pattern",
            Command::TransformObject { .. } => "transform_object",
            Command::CreateAssembly { .. } => "create_assembly",
            Command::AddAssemblyPart { .. } => "add_assembly_part",
            Command::AddAssemblyConstraint { .. } => "add_assembly_constraint",
            Command::SolveAssembly { .. } => "solve_assembly",
            Command::ListAssemblyConstraints { .. } => "list_assembly_constraints",
            Command::DeleteAssemblyConstraint { .. } => "delete_assembly_constraint",
            Command::ModifyAssemblyConstraint { .. } => "modify_assembly_constraint",
            Command::CreateLcs { .. } => "create_lcs",
            Command::AttachLcsToGeometry { .. } => "attach_lcs_to_geometry",
            Command::InsertAssemblyPart { .. } => "insert_assembly_part",
            Command::ListLcs { .. } => "list_lcs",
            Command::DeleteLcs { .. } => "delete_lcs",
            Command::ModifyLcs { .. } => "modify_lcs",
            Command::ListAssemblyParts { .. } => "list_assembly_parts",
            Command::CalculateAssemblyMass { .. } => "calculate_assembly_mass",
            Command::GenerateBom { .. } => "generate_bom",
            Command::ExportAssembly { .. } => "export_assembly",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_peels_off_the_document_field() {
        let req: Request = serde_json::from_str(
            r#"{"command": "get_object", "document": "widget", "name": "Pad"}"#,
        )
        .unwrap();
        assert_eq!(req.document.as_deref(), Some("widget"));
        assert!(matches!(req.command, Command::GetObject { ref name } if name == "Pad"));
    }

    #[test]
    fn defaults_fill_in_omitted_fields() {
        let req: Request = serde_json::from_str(
            r#"{"command": "revolve", "sketch": "S", "axis": "A1"}"#,
        )
        .unwrap();
        match req.command {
            Command::Revolve { angle, name, axis, .. } => {
                assert_eq!(angle, 360.0);
                assert!(name.is_none());
                assert!(matches!(axis, AxisSelector::Named(ref n) if n == "A1"));
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_command_fails_to_parse() {
        let err = serde_json::from_str::<Request>(r#"{"command": "run_macro"}"#).unwrap_err();
        assert!(err.to_string().contains("unknown variant"));
    }

    #[test]
    fn constraint_kind_flattens_into_the_command() {
        let req: Request = serde_json::from_str(
            r#"{
                "command": "add_assembly_constraint",
                "assembly": "asm",
                "name": "c1",
                "type": "distance",
                "value": 5.0,
                "references": ["a.face1", "b.face2"]
            }"#,
        )
        .unwrap();
        match req.command {
            Command::AddAssemblyConstraint { kind, references, .. } => {
                assert_eq!(kind, ConstraintKind::Distance { value: 5.0 });
                assert_eq!(references.len(), 2);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }
}
