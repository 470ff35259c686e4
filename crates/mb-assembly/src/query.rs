//! Common query surface over both assembly models

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, AssemblyResult};
use crate::graph::ConstraintAssembly;
use crate::hierarchy::HierarchyAssembly;
use crate::placement::Placement;

/// Which assembly model an assembly uses (chosen at creation, immutable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyModel {
    /// Constraint graph with an explicit solve step
    Constraint,
    /// Coordinate-system hierarchy, composed at query time
    Hierarchy,
}

impl AssemblyModel {
    /// Get the name of this model
    pub fn as_str(&self) -> &'static str {
        match self {
            AssemblyModel::Constraint => "constraint",
            AssemblyModel::Hierarchy => "hierarchy",
        }
    }
}

/// Part summary returned by queries
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartInfo {
    /// Part name
    pub name: String,
    /// Mass
    pub mass: f32,
    /// Optional material label
    pub material: Option<String>,
    /// Resolved placement, if determined
    pub placement: Option<Placement>,
}

/// Mass properties of an assembly
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassProperties {
    /// Sum of part masses
    pub total_mass: f32,
    /// Mass-weighted centroid of part positions
    pub center_of_mass: Vec3,
    /// Number of parts included
    pub part_count: usize,
}

/// An assembly of either model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Assembly {
    /// Constraint-graph assembly
    Constraint(ConstraintAssembly),
    /// LCS-hierarchy assembly
    Hierarchy(HierarchyAssembly),
}

impl Assembly {
    /// Create an empty assembly of the given model
    pub fn new(name: impl Into<String>, model: AssemblyModel) -> Self {
        match model {
            AssemblyModel::Constraint => Assembly::Constraint(ConstraintAssembly::new(name)),
            AssemblyModel::Hierarchy => Assembly::Hierarchy(HierarchyAssembly::new(name)),
        }
    }

    /// Assembly name
    pub fn name(&self) -> &str {
        match self {
            Assembly::Constraint(a) => &a.name,
            Assembly::Hierarchy(a) => &a.name,
        }
    }

    /// Which model this assembly uses
    pub fn model(&self) -> AssemblyModel {
        match self {
            Assembly::Constraint(_) => AssemblyModel::Constraint,
            Assembly::Hierarchy(_) => AssemblyModel::Hierarchy,
        }
    }

    /// The constraint-graph assembly, or an error naming the actual model
    pub fn as_constraint_mut(&mut self) -> AssemblyResult<&mut ConstraintAssembly> {
        match self {
            Assembly::Constraint(a) => Ok(a),
            Assembly::Hierarchy(a) => Err(AssemblyError::InvalidParameter(format!(
                "assembly '{}' uses the hierarchy model",
                a.name
            ))),
        }
    }

    /// The hierarchy assembly, or an error naming the actual model
    pub fn as_hierarchy_mut(&mut self) -> AssemblyResult<&mut HierarchyAssembly> {
        match self {
            Assembly::Hierarchy(a) => Ok(a),
            Assembly::Constraint(a) => Err(AssemblyError::InvalidParameter(format!(
                "assembly '{}' uses the constraint model",
                a.name
            ))),
        }
    }

    /// Shared read-only view for queries
    pub fn as_constraint(&self) -> Option<&ConstraintAssembly> {
        match self {
            Assembly::Constraint(a) => Some(a),
            Assembly::Hierarchy(_) => None,
        }
    }

    /// List parts with their resolved placements where available
    pub fn list_parts(&self) -> Vec<PartInfo> {
        match self {
            Assembly::Constraint(a) => a
                .parts()
                .iter()
                .map(|p| PartInfo {
                    name: p.name.clone(),
                    mass: p.mass,
                    material: p.material.clone(),
                    placement: p.placement,
                })
                .collect(),
            Assembly::Hierarchy(a) => a
                .parts()
                .iter()
                .map(|p| PartInfo {
                    name: p.name.clone(),
                    mass: p.mass,
                    material: p.material.clone(),
                    placement: a.part_placement(&p.name).ok(),
                })
                .collect(),
        }
    }

    /// Total mass and center of mass. Every part needs a resolved placement;
    /// the first unresolved one aborts the calculation.
    pub fn calculate_mass(&self) -> AssemblyResult<MassProperties> {
        let mut total_mass = 0.0;
        let mut weighted = Vec3::ZERO;
        let mut count = 0;

        match self {
            Assembly::Constraint(a) => {
                for part in a.parts() {
                    let placement = part.placement.ok_or_else(|| {
                        AssemblyError::UnresolvedPlacement(format!(
                            "part '{}' has no solved placement",
                            part.name
                        ))
                    })?;
                    total_mass += part.mass;
                    weighted += placement.position * part.mass;
                    count += 1;
                }
            }
            Assembly::Hierarchy(a) => {
                for part in a.parts() {
                    let placement = a.part_placement(&part.name)?;
                    total_mass += part.mass;
                    weighted += placement.position * part.mass;
                    count += 1;
                }
            }
        }

        let center_of_mass = if total_mass > 0.0 {
            weighted / total_mass
        } else {
            Vec3::ZERO
        };
        Ok(MassProperties {
            total_mass,
            center_of_mass,
            part_count: count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_requires_solved_placements() {
        let mut asm = Assembly::new("unsolved", AssemblyModel::Constraint);
        asm.as_constraint_mut()
            .unwrap()
            .add_part("base", 2.0, None)
            .unwrap();

        let err = asm.calculate_mass().unwrap_err();
        assert!(matches!(err, AssemblyError::UnresolvedPlacement(_)));

        asm.as_constraint_mut().unwrap().solve().unwrap();
        let mass = asm.calculate_mass().unwrap();
        assert_eq!(mass.total_mass, 2.0);
        assert_eq!(mass.part_count, 1);
    }

    #[test]
    fn model_mismatch_is_reported() {
        let mut asm = Assembly::new("frame", AssemblyModel::Hierarchy);
        let err = asm.as_constraint_mut().unwrap_err();
        assert!(err.to_string().contains("hierarchy model"));
    }

    #[test]
    fn hierarchy_mass_weights_positions() {
        let mut asm = Assembly::new("pair", AssemblyModel::Hierarchy);
        {
            let h = asm.as_hierarchy_mut().unwrap();
            h.create_lcs("root", Placement::IDENTITY).unwrap();
            h.create_lcs(
                "far",
                Placement::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            )
            .unwrap();
            h.insert_part("a", 1.0, "root", Placement::IDENTITY, None)
                .unwrap();
            h.insert_part("b", 3.0, "far", Placement::IDENTITY, None)
                .unwrap();
        }
        let mass = asm.calculate_mass().unwrap();
        assert_eq!(mass.total_mass, 4.0);
        assert!((mass.center_of_mass.x - 7.5).abs() < 1e-5);
    }
}
