//! Coordinate-system hierarchy assembly model
//!
//! No global solve: parts attach to named local coordinate systems (LCS) and
//! every placement is composed on demand. An LCS either stores its placement
//! directly or follows a geometry element of a part; the geometry table is
//! owned by the assembly, so deleting a part leaves followers stale rather
//! than silently frozen.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AssemblyError, AssemblyResult};
use crate::placement::Placement;

/// How an LCS gets its placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum LcsDefinition {
    /// Fixed placement stored on the LCS itself
    Stored { placement: Placement },
    /// Follows a geometry element of a part, resolved at query time
    Attached { part: String, element: String },
}

/// A named local coordinate system
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lcs {
    /// LCS name (unique within the assembly)
    pub name: String,
    /// Placement source
    pub definition: LcsDefinition,
}

/// A part inserted into the hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyPart {
    /// Part name
    pub name: String,
    /// Mass
    pub mass: f32,
    /// Optional material label (BOM grouping)
    pub material: Option<String>,
    /// LCS the part's origin is attached to; `None` means unresolved
    pub attached_to: Option<String>,
    /// Offset applied in the target LCS frame
    pub offset: Placement,
}

/// Assembly driven by an LCS hierarchy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HierarchyAssembly {
    /// Assembly name
    pub name: String,
    lcs: Vec<Lcs>,
    parts: Vec<HierarchyPart>,
    /// Geometry elements the assembly knows about: (part, element) → placement
    geometry: HashMap<(String, String), Placement>,
}

impl HierarchyAssembly {
    /// Create an empty assembly
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lcs: Vec::new(),
            parts: Vec::new(),
            geometry: HashMap::new(),
        }
    }

    /// Coordinate systems in creation order
    pub fn lcs_list(&self) -> &[Lcs] {
        &self.lcs
    }

    /// Parts in creation order
    pub fn parts(&self) -> &[HierarchyPart] {
        &self.parts
    }

    /// Get a part by name
    pub fn part(&self, name: &str) -> Option<&HierarchyPart> {
        self.parts.iter().find(|p| p.name == name)
    }

    /// Get an LCS by name
    pub fn lcs(&self, name: &str) -> Option<&Lcs> {
        self.lcs.iter().find(|l| l.name == name)
    }

    /// Register a geometry element a follower LCS can attach to
    pub fn register_geometry(
        &mut self,
        part: impl Into<String>,
        element: impl Into<String>,
        placement: Placement,
    ) {
        self.geometry
            .insert((part.into(), element.into()), placement);
    }

    /// Create an LCS with a stored placement
    pub fn create_lcs(
        &mut self,
        name: impl Into<String>,
        placement: Placement,
    ) -> AssemblyResult<()> {
        let name = name.into();
        if self.lcs(&name).is_some() {
            return Err(AssemblyError::NameConflict(name));
        }
        self.lcs.push(Lcs {
            name,
            definition: LcsDefinition::Stored { placement },
        });
        Ok(())
    }

    /// Re-attach an LCS to a geometry element. The element must exist now;
    /// placement still resolves at query time, so later deletion of the part
    /// makes the LCS stale instead of frozen.
    pub fn attach_lcs(
        &mut self,
        lcs_name: &str,
        part: impl Into<String>,
        element: impl Into<String>,
    ) -> AssemblyResult<()> {
        let (part, element) = (part.into(), element.into());
        if !self.geometry.contains_key(&(part.clone(), element.clone())) {
            return Err(AssemblyError::InvalidReference(format!(
                "no geometry element '{element}' on part '{part}'"
            )));
        }
        let lcs = self
            .lcs
            .iter_mut()
            .find(|l| l.name == lcs_name)
            .ok_or_else(|| AssemblyError::LcsNotFound(lcs_name.to_string()))?;
        lcs.definition = LcsDefinition::Attached { part, element };
        Ok(())
    }

    /// Replace an LCS placement with a stored one
    pub fn modify_lcs(&mut self, lcs_name: &str, placement: Placement) -> AssemblyResult<()> {
        let lcs = self
            .lcs
            .iter_mut()
            .find(|l| l.name == lcs_name)
            .ok_or_else(|| AssemblyError::LcsNotFound(lcs_name.to_string()))?;
        lcs.definition = LcsDefinition::Stored { placement };
        Ok(())
    }

    /// Delete an LCS. Parts attached to it are detached, not deleted; their
    /// placements become unresolved.
    pub fn delete_lcs(&mut self, lcs_name: &str) -> AssemblyResult<()> {
        let index = self
            .lcs
            .iter()
            .position(|l| l.name == lcs_name)
            .ok_or_else(|| AssemblyError::LcsNotFound(lcs_name.to_string()))?;
        self.lcs.remove(index);
        let mut detached = 0;
        for part in &mut self.parts {
            if part.attached_to.as_deref() == Some(lcs_name) {
                part.attached_to = None;
                detached += 1;
            }
        }
        if detached > 0 {
            debug!(assembly = %self.name, lcs = lcs_name, detached, "detached parts on LCS delete");
        }
        Ok(())
    }

    /// Insert a part by attaching its local origin to a target LCS
    pub fn insert_part(
        &mut self,
        name: impl Into<String>,
        mass: f32,
        target_lcs: &str,
        offset: Placement,
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
        if self.lcs(target_lcs).is_none() {
            return Err(AssemblyError::LcsNotFound(target_lcs.to_string()));
        }
        self.parts.push(HierarchyPart {
            name,
            mass,
            material,
            attached_to: Some(target_lcs.to_string()),
            offset,
        });
        Ok(())
    }

    /// Delete a part and its geometry entries. LCS following that geometry
    /// become stale and surface it on the next placement query.
    pub fn delete_part(&mut self, name: &str) -> AssemblyResult<()> {
        let index = self
            .parts
            .iter()
            .position(|p| p.name == name)
            .ok_or_else(|| AssemblyError::PartNotFound(name.to_string()))?;
        self.parts.remove(index);
        self.geometry.retain(|(part, _), _| part != name);
        Ok(())
    }

    /// Resolve the placement of an LCS
    pub fn lcs_placement(&self, lcs_name: &str) -> AssemblyResult<Placement> {
        let lcs = self
            .lcs(lcs_name)
            .ok_or_else(|| AssemblyError::LcsNotFound(lcs_name.to_string()))?;
        match &lcs.definition {
            LcsDefinition::Stored { placement } => Ok(*placement),
            LcsDefinition::Attached { part, element } => self
                .geometry
                .get(&(part.clone(), element.clone()))
                .copied()
                .ok_or_else(|| {
                    AssemblyError::StaleGeometryReference(format!(
                        "LCS '{lcs_name}' follows deleted geometry '{part}.{element}'"
                    ))
                }),
        }
    }

    /// Resolve the placement of a part (target LCS placement composed with
    /// the part's offset)
    pub fn part_placement(&self, part_name: &str) -> AssemblyResult<Placement> {
        let part = self
            .part(part_name)
            .ok_or_else(|| AssemblyError::PartNotFound(part_name.to_string()))?;
        let lcs_name = part.attached_to.as_deref().ok_or_else(|| {
            AssemblyError::UnresolvedPlacement(format!(
                "part '{part_name}' is not attached to any coordinate system"
            ))
        })?;
        Ok(self.lcs_placement(lcs_name)?.compose(&part.offset))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn base_assembly() -> HierarchyAssembly {
        let mut asm = HierarchyAssembly::new("frame");
        asm.create_lcs("root", Placement::IDENTITY).unwrap();
        asm.create_lcs("mount", Placement::from_translation(Vec3::new(0.0, 0.0, 50.0)))
            .unwrap();
        asm
    }

    #[test]
    fn part_placement_composes_lcs_and_offset() {
        let mut asm = base_assembly();
        asm.insert_part(
            "bracket",
            0.2,
            "mount",
            Placement::from_translation(Vec3::new(10.0, 0.0, 0.0)),
            None,
        )
        .unwrap();

        let placement = asm.part_placement("bracket").unwrap();
        assert!(placement.position.distance(Vec3::new(10.0, 0.0, 50.0)) < 1e-5);
    }

    #[test]
    fn attached_lcs_goes_stale_when_part_is_deleted() {
        let mut asm = base_assembly();
        asm.insert_part("motor", 1.5, "root", Placement::IDENTITY, None)
            .unwrap();
        asm.register_geometry(
            "motor",
            "shaft_face",
            Placement::from_translation(Vec3::new(0.0, 0.0, 30.0)),
        );
        asm.create_lcs("shaft_tip", Placement::IDENTITY).unwrap();
        asm.attach_lcs("shaft_tip", "motor", "shaft_face").unwrap();

        assert!(asm.lcs_placement("shaft_tip").is_ok());

        asm.delete_part("motor").unwrap();
        let err = asm.lcs_placement("shaft_tip").unwrap_err();
        assert!(matches!(err, AssemblyError::StaleGeometryReference(_)));
    }

    #[test]
    fn deleting_lcs_detaches_parts() {
        let mut asm = base_assembly();
        asm.insert_part("bracket", 0.2, "mount", Placement::IDENTITY, None)
            .unwrap();
        asm.delete_lcs("mount").unwrap();

        let err = asm.part_placement("bracket").unwrap_err();
        assert!(matches!(err, AssemblyError::UnresolvedPlacement(_)));
        // The part itself still exists.
        assert!(asm.part("bracket").is_some());
    }

    #[test]
    fn attach_to_unknown_geometry_is_rejected() {
        let mut asm = base_assembly();
        let err = asm.attach_lcs("root", "ghost", "face1").unwrap_err();
        assert!(matches!(err, AssemblyError::InvalidReference(_)));
    }

    #[test]
    fn insert_into_missing_lcs_fails() {
        let mut asm = base_assembly();
        let err = asm
            .insert_part("bracket", 0.2, "nowhere", Placement::IDENTITY, None)
            .unwrap_err();
        assert!(matches!(err, AssemblyError::LcsNotFound(_)));
    }
}
