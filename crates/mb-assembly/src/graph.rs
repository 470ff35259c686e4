//! Constraint-graph assembly model
//!
//! Parts and named constraints form a graph; `solve` walks it to assign
//! placements. The assembly tracks an explicit solve state so callers can
//! tell a solved snapshot from one invalidated by later edits.

use std::collections::HashMap;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AssemblyError, AssemblyResult};
use crate::placement::Placement;

/// Default residual tolerance for the solver
pub const DEFAULT_TOLERANCE: f32 = 1e-4;

/// A reference to a geometric element of a part (`part.element`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementRef {
    /// Part name
    pub part: String,
    /// Element name within the part (face, edge, vertex, axis label)
    pub element: String,
}

impl ElementRef {
    /// Create an element reference
    pub fn new(part: impl Into<String>, element: impl Into<String>) -> Self {
        Self {
            part: part.into(),
            element: element.into(),
        }
    }

    /// Parse a `part.element` string
    pub fn parse(s: &str) -> Result<Self, String> {
        match s.split_once('.') {
            Some((part, element)) if !part.is_empty() && !element.is_empty() => {
                Ok(Self::new(part, element))
            }
            _ => Err(format!("expected 'part.element', got '{s}'")),
        }
    }
}

/// The kind of a constraint, with its dimensional value where applicable
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConstraintKind {
    /// Two planar elements lie in the same plane
    PlaneCoincident,
    /// Two axes are collinear
    Axial,
    /// Two points coincide
    PointsCoincident,
    /// A point lies on a line
    PointOnLine,
    /// A point lies on a plane
    PointOnPlane,
    /// Two parts share orientation
    SameOrientation,
    /// Two directions are parallel
    Parallel,
    /// Two directions are perpendicular
    Perpendicular,
    /// Angle between two directions, in degrees
    Angle { degrees: f32 },
    /// Distance between two elements
    Distance { value: f32 },
    /// Pin a part at a fixed placement
    Lock { placement: Placement },
}

impl ConstraintKind {
    /// Get the type name of this constraint kind
    pub fn type_name(&self) -> &'static str {
        match self {
            ConstraintKind::PlaneCoincident => "plane_coincident",
            ConstraintKind::Axial => "axial",
            ConstraintKind::PointsCoincident => "points_coincident",
            ConstraintKind::PointOnLine => "point_on_line",
            ConstraintKind::PointOnPlane => "point_on_plane",
            ConstraintKind::SameOrientation => "same_orientation",
            ConstraintKind::Parallel => "parallel",
            ConstraintKind::Perpendicular => "perpendicular",
            ConstraintKind::Angle { .. } => "angle",
            ConstraintKind::Distance { .. } => "distance",
            ConstraintKind::Lock { .. } => "lock",
        }
    }

    /// How many element references this kind takes
    pub fn arity(&self) -> usize {
        match self {
            ConstraintKind::Lock { .. } => 1,
            _ => 2,
        }
    }
}

/// A named constraint between parts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyConstraint {
    /// Constraint name (unique within the assembly)
    pub name: String,
    /// Kind and dimensional value
    pub kind: ConstraintKind,
    /// Referenced elements, one per arity slot
    pub refs: Vec<ElementRef>,
}

impl AssemblyConstraint {
    /// Create a constraint, checking the reference count against the kind
    pub fn new(
        name: impl Into<String>,
        kind: ConstraintKind,
        refs: Vec<ElementRef>,
    ) -> AssemblyResult<Self> {
        if refs.len() != kind.arity() {
            return Err(AssemblyError::InvalidParameter(format!(
                "{} constraint takes {} reference(s), got {}",
                kind.type_name(),
                kind.arity(),
                refs.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            kind,
            refs,
        })
    }
}

/// A part participating in the constraint graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphPart {
    /// Part name
    pub name: String,
    /// Mass
    pub mass: f32,
    /// Optional material label (BOM grouping)
    pub material: Option<String>,
    /// Solved placement, if the last solve reached this part
    pub placement: Option<Placement>,
}

/// Lifecycle of the constraint graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveState {
    /// No parts yet
    Empty,
    /// Parts present, no constraints
    PartsAdded,
    /// Constraints present, not solved since the last edit
    ConstraintsAdded,
    /// Last solve succeeded and nothing changed since
    Solved,
    /// Last solve failed and nothing changed since
    SolveFailed,
}

/// Outcome of a successful solve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolveReport {
    /// Placements per part, in part creation order
    pub placements: Vec<(String, Placement)>,
}

/// Assembly driven by a constraint graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintAssembly {
    /// Assembly name
    pub name: String,
    parts: Vec<GraphPart>,
    constraints: Vec<AssemblyConstraint>,
    state: SolveState,
    tolerance: f32,
    /// Constraint names reported by the last failed solve
    conflicts: Vec<String>,
}

impl ConstraintAssembly {
    /// Create an empty assembly
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
            constraints: Vec::new(),
            state: SolveState::Empty,
            tolerance: DEFAULT_TOLERANCE,
            conflicts: Vec::new(),
        }
    }

    /// Override the residual tolerance
    pub fn with_tolerance(mut self, tolerance: f32) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Current solve state
    pub fn state(&self) -> SolveState {
        self.state
    }

    /// Constraint names the last failed solve reported
    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    /// Parts in creation order
    pub fn parts(&self) -> &[GraphPart] {
        &self.parts
    }

    /// Get a part by name
    pub fn part(&self, name: &str) -> Option<&GraphPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Constraints in creation order
    pub fn constraints(&self) -> &[AssemblyConstraint] {
        &self.constraints
    }

    /// Add a part. Names are unique within the assembly.
    pub fn add_part(
        &mut self,
        name: impl Into<String>,
        mass: f32,
        material: Option<String>,
    ) -> AssemblyResult<()> {
        let name = name.into();
        if self.part(&name).is_some() {
            return Err(AssemblyError::NameConflict(name));
        }
        if mass < 0.0 {
            return Err(AssemblyError::InvalidParameter(format!(
                "mass must be non-negative, got {mass}"
            )));
        }
        self.parts.push(GraphPart {
            name,
            mass,
            material,
            placement: None,
        });
        self.touch();
        Ok(())
    }

    /// Add a constraint. Element references are validated structurally at
    /// solve time, not here.
    pub fn add_constraint(&mut self, constraint: AssemblyConstraint) -> AssemblyResult<()> {
        if self.constraints.iter().any(|c| c.name == constraint.name) {
            return Err(AssemblyError::NameConflict(constraint.name));
        }
        self.constraints.push(constraint);
        self.touch();
        Ok(())
    }

    /// Delete a constraint by name
    pub fn delete_constraint(&mut self, name: &str) -> AssemblyResult<AssemblyConstraint> {
        let index = self
            .constraints
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| AssemblyError::ConstraintNotFound(name.to_string()))?;
        let removed = self.constraints.remove(index);
        self.touch();
        Ok(removed)
    }

    /// Replace the kind (and value) of an existing constraint
    pub fn modify_constraint(&mut self, name: &str, kind: ConstraintKind) -> AssemblyResult<()> {
        let constraint = self
            .constraints
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| AssemblyError::ConstraintNotFound(name.to_string()))?;
        if constraint.refs.len() != kind.arity() {
            return Err(AssemblyError::InvalidParameter(format!(
                "{} constraint takes {} reference(s), existing constraint has {}",
                kind.type_name(),
                kind.arity(),
                constraint.refs.len()
            )));
        }
        constraint.kind = kind;
        self.touch();
        Ok(())
    }

    /// Recompute lifecycle state after any structural edit. A solved or
    /// failed snapshot is invalidated by the edit.
    fn touch(&mut self) {
        self.conflicts.clear();
        self.state = if !self.constraints.is_empty() {
            SolveState::ConstraintsAdded
        } else if !self.parts.is_empty() {
            SolveState::PartsAdded
        } else {
            SolveState::Empty
        };
    }

    /// Solve the constraint graph and assign part placements.
    ///
    /// Structural problems (a constraint naming an unknown part) abort before
    /// any solve work with `InvalidReference` and leave the state unchanged.
    /// Genuine conflicts transition to `SolveFailed` and name the offending
    /// constraints.
    pub fn solve(&mut self) -> AssemblyResult<SolveReport> {
        if self.parts.is_empty() {
            return Err(AssemblyError::InvalidParameter(
                "assembly has no parts".into(),
            ));
        }

        // Structural validation first; state stays as-is on failure.
        for constraint in &self.constraints {
            for r in &constraint.refs {
                if self.part(&r.part).is_none() {
                    return Err(AssemblyError::InvalidReference(format!(
                        "constraint '{}' references unknown part '{}'",
                        constraint.name, r.part
                    )));
                }
            }
        }

        // Trivial case: parts only.
        if self.constraints.is_empty() {
            for part in &mut self.parts {
                part.placement = Some(Placement::IDENTITY);
            }
            self.state = SolveState::Solved;
            return Ok(self.report());
        }

        // Locks pin placements; two locks disagreeing on one part is a
        // conflict before any propagation.
        let mut pinned: HashMap<String, (String, Placement)> = HashMap::new();
        for constraint in &self.constraints {
            if let ConstraintKind::Lock { placement } = &constraint.kind {
                let part = &constraint.refs[0].part;
                if let Some((prev_name, prev)) = pinned.get(part) {
                    if !prev.approx_eq(placement, self.tolerance) {
                        self.conflicts = vec![prev_name.clone(), constraint.name.clone()];
                        self.state = SolveState::SolveFailed;
                        warn!(assembly = %self.name, part, "conflicting lock constraints");
                        return Err(AssemblyError::SolveFailed(format!(
                            "conflicting locks on part '{part}': '{prev_name}' and '{}'",
                            constraint.name
                        )));
                    }
                } else {
                    pinned.insert(part.clone(), (constraint.name.clone(), *placement));
                }
            }
        }

        let mut placements: HashMap<String, Placement> = pinned
            .iter()
            .map(|(part, (_, placement))| (part.clone(), *placement))
            .collect();

        // Seed from the first part if nothing is locked.
        if placements.is_empty() {
            placements.insert(self.parts[0].name.clone(), Placement::IDENTITY);
        }

        // Propagate placements across constraint edges until a pass makes no
        // progress. Placed parts are never overwritten; disagreements show up
        // in the residual check below.
        loop {
            let mut progressed = false;
            for constraint in &self.constraints {
                if constraint.kind.arity() != 2 {
                    continue;
                }
                let (a, b) = (&constraint.refs[0].part, &constraint.refs[1].part);
                let (known, unknown) = match (placements.contains_key(a), placements.contains_key(b))
                {
                    (true, false) => (a, b),
                    (false, true) => (b, a),
                    _ => continue,
                };
                let base = placements[known];
                placements.insert(unknown.clone(), propose(&base, &constraint.kind));
                progressed = true;
            }
            if !progressed {
                break;
            }
        }

        // Parts no constraint reaches stay at the default placement.
        for part in &self.parts {
            placements
                .entry(part.name.clone())
                .or_insert(Placement::IDENTITY);
        }

        // Residual check over the full constraint set.
        let mut conflicts = Vec::new();
        for constraint in &self.constraints {
            let residual = residual(constraint, &placements);
            if residual > self.tolerance {
                debug!(constraint = %constraint.name, residual, "residual exceeds tolerance");
                conflicts.push(constraint.name.clone());
            }
        }
        if !conflicts.is_empty() {
            self.conflicts = conflicts.clone();
            self.state = SolveState::SolveFailed;
            return Err(AssemblyError::SolveFailed(format!(
                "unsatisfied constraints: {}",
                conflicts.join(", ")
            )));
        }

        for part in &mut self.parts {
            part.placement = placements.get(&part.name).copied();
        }
        self.conflicts.clear();
        self.state = SolveState::Solved;
        debug!(assembly = %self.name, parts = self.parts.len(), "solve succeeded");
        Ok(self.report())
    }

    fn report(&self) -> SolveReport {
        SolveReport {
            placements: self
                .parts
                .iter()
                .filter_map(|p| p.placement.map(|pl| (p.name.clone(), pl)))
                .collect(),
        }
    }
}

/// Placement proposal for the unplaced side of a binary constraint
fn propose(base: &Placement, kind: &ConstraintKind) -> Placement {
    match kind {
        ConstraintKind::Distance { value } => {
            base.compose(&Placement::from_translation(Vec3::X * *value))
        }
        ConstraintKind::Angle { degrees } => Placement {
            position: base.position,
            rotation: base.rotation * Quat::from_rotation_z(degrees.to_radians()),
        },
        ConstraintKind::Perpendicular => Placement {
            position: base.position,
            rotation: base.rotation * Quat::from_rotation_x(std::f32::consts::FRAC_PI_2),
        },
        _ => *base,
    }
}

/// Residual of a constraint under the candidate placements
fn residual(constraint: &AssemblyConstraint, placements: &HashMap<String, Placement>) -> f32 {
    let placement = |i: usize| placements.get(&constraint.refs[i].part).copied();
    match &constraint.kind {
        ConstraintKind::Lock { placement: target } => match placement(0) {
            Some(actual) => (actual.position.distance(target.position))
                .max(actual.rotation.angle_between(target.rotation)),
            None => f32::INFINITY,
        },
        ConstraintKind::Distance { value } => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => (a.position.distance(b.position) - value).abs(),
            _ => f32::INFINITY,
        },
        ConstraintKind::Angle { degrees } => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => {
                let x1 = a.rotation * Vec3::X;
                let x2 = b.rotation * Vec3::X;
                (x1.angle_between(x2) - degrees.to_radians()).abs()
            }
            _ => f32::INFINITY,
        },
        ConstraintKind::Parallel => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => {
                let z1 = a.rotation * Vec3::Z;
                let z2 = b.rotation * Vec3::Z;
                let angle = z1.angle_between(z2);
                angle.min(std::f32::consts::PI - angle)
            }
            _ => f32::INFINITY,
        },
        ConstraintKind::Perpendicular => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => {
                let z1 = a.rotation * Vec3::Z;
                let z2 = b.rotation * Vec3::Z;
                z1.dot(z2).abs()
            }
            _ => f32::INFINITY,
        },
        ConstraintKind::SameOrientation => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => a.rotation.angle_between(b.rotation),
            _ => f32::INFINITY,
        },
        ConstraintKind::PlaneCoincident
        | ConstraintKind::Axial
        | ConstraintKind::PointsCoincident => match (placement(0), placement(1)) {
            (Some(a), Some(b)) => a.position.distance(b.position),
            _ => f32::INFINITY,
        },
        // Point-level geometry is not tracked, so these are satisfied by
        // construction once both parts are placed.
        ConstraintKind::PointOnLine | ConstraintKind::PointOnPlane => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock(name: &str, part: &str, position: Vec3) -> AssemblyConstraint {
        AssemblyConstraint::new(
            name,
            ConstraintKind::Lock {
                placement: Placement::from_translation(position),
            },
            vec![ElementRef::new(part, "origin")],
        )
        .unwrap()
    }

    #[test]
    fn state_machine_tracks_edits() {
        let mut asm = ConstraintAssembly::new("gearbox");
        assert_eq!(asm.state(), SolveState::Empty);

        asm.add_part("housing", 2.0, None).unwrap();
        assert_eq!(asm.state(), SolveState::PartsAdded);

        asm.add_constraint(lock("fix_housing", "housing", Vec3::ZERO))
            .unwrap();
        assert_eq!(asm.state(), SolveState::ConstraintsAdded);

        asm.solve().unwrap();
        assert_eq!(asm.state(), SolveState::Solved);

        // Editing a solved assembly invalidates the snapshot.
        asm.add_part("shaft", 0.5, None).unwrap();
        assert_eq!(asm.state(), SolveState::ConstraintsAdded);
    }

    #[test]
    fn solve_without_constraints_is_trivially_solved() {
        let mut asm = ConstraintAssembly::new("plate_stack");
        asm.add_part("plate_a", 1.0, None).unwrap();
        asm.add_part("plate_b", 1.0, None).unwrap();

        let report = asm.solve().unwrap();
        assert_eq!(asm.state(), SolveState::Solved);
        assert_eq!(report.placements.len(), 2);
        assert!(report.placements.iter().all(|(_, p)| *p == Placement::IDENTITY));
    }

    #[test]
    fn dangling_reference_leaves_state_unchanged() {
        let mut asm = ConstraintAssembly::new("bad");
        asm.add_part("base", 1.0, None).unwrap();
        asm.add_constraint(lock("fix_ghost", "ghost", Vec3::ZERO))
            .unwrap();
        let before = asm.state();

        let err = asm.solve().unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidReference(_)));
        assert_eq!(asm.state(), before);
    }

    #[test]
    fn conflicting_locks_name_both_constraints() {
        let mut asm = ConstraintAssembly::new("clash");
        asm.add_part("base", 1.0, None).unwrap();
        asm.add_constraint(lock("lock_a", "base", Vec3::ZERO)).unwrap();
        asm.add_constraint(lock("lock_b", "base", Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();

        let err = asm.solve().unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("lock_a") && msg.contains("lock_b"));
        assert_eq!(asm.state(), SolveState::SolveFailed);
        assert_eq!(asm.conflicts(), ["lock_a", "lock_b"]);
    }

    #[test]
    fn distance_propagates_from_locked_part() {
        let mut asm = ConstraintAssembly::new("pair");
        asm.add_part("base", 1.0, None).unwrap();
        asm.add_part("arm", 0.5, None).unwrap();
        asm.add_constraint(lock("fix_base", "base", Vec3::ZERO)).unwrap();
        asm.add_constraint(
            AssemblyConstraint::new(
                "arm_offset",
                ConstraintKind::Distance { value: 30.0 },
                vec![ElementRef::new("base", "face1"), ElementRef::new("arm", "face1")],
            )
            .unwrap(),
        )
        .unwrap();

        asm.solve().unwrap();
        let arm = asm.part("arm").unwrap().placement.unwrap();
        assert!((arm.position.distance(Vec3::ZERO) - 30.0).abs() < 1e-3);
    }

    #[test]
    fn overconstrained_distance_reports_conflict() {
        let mut asm = ConstraintAssembly::new("over");
        asm.add_part("a", 1.0, None).unwrap();
        asm.add_part("b", 1.0, None).unwrap();
        asm.add_constraint(lock("fix_a", "a", Vec3::ZERO)).unwrap();
        asm.add_constraint(lock("fix_b", "b", Vec3::new(10.0, 0.0, 0.0)))
            .unwrap();
        asm.add_constraint(
            AssemblyConstraint::new(
                "wrong_gap",
                ConstraintKind::Distance { value: 25.0 },
                vec![ElementRef::new("a", "face1"), ElementRef::new("b", "face1")],
            )
            .unwrap(),
        )
        .unwrap();

        let err = asm.solve().unwrap_err();
        assert!(err.to_string().contains("wrong_gap"));
        assert_eq!(asm.state(), SolveState::SolveFailed);
    }

    #[test]
    fn delete_constraint_then_resolve() {
        let mut asm = ConstraintAssembly::new("fixable");
        asm.add_part("a", 1.0, None).unwrap();
        asm.add_constraint(lock("lock_a", "a", Vec3::ZERO)).unwrap();
        asm.add_constraint(lock("lock_bad", "a", Vec3::ONE)).unwrap();
        assert!(asm.solve().is_err());

        asm.delete_constraint("lock_bad").unwrap();
        asm.solve().unwrap();
        assert_eq!(asm.state(), SolveState::Solved);

        // Second delete of the same name fails.
        assert!(matches!(
            asm.delete_constraint("lock_bad"),
            Err(AssemblyError::ConstraintNotFound(_))
        ));
    }
}
