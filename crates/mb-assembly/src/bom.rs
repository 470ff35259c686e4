//! Bill-of-materials generation
//!
//! Rows group parts by a key (name by default, material optionally) with a
//! count and summed mass, rendered as JSON, CSV, or a Markdown table.

use serde::{Deserialize, Serialize};

use crate::query::Assembly;

/// How BOM rows are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomGroupKey {
    /// One row per distinct part name
    #[default]
    Name,
    /// One row per material label
    Material,
}

/// Output rendering for a BOM
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BomFormat {
    #[default]
    Json,
    Csv,
    Markdown,
}

/// One BOM row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BomRow {
    /// Group key value
    pub key: String,
    /// Number of parts in the group
    pub count: usize,
    /// Summed mass of the group
    pub total_mass: f32,
}

/// Material label used for parts without one
const UNSPECIFIED_MATERIAL: &str = "unspecified";

/// Build BOM rows for an assembly, in order of first appearance
pub fn generate_bom(assembly: &Assembly, group_key: BomGroupKey) -> Vec<BomRow> {
    let mut rows: Vec<BomRow> = Vec::new();
    for part in assembly.list_parts() {
        let key = match group_key {
            BomGroupKey::Name => part.name.clone(),
            BomGroupKey::Material => part
                .material
                .clone()
                .unwrap_or_else(|| UNSPECIFIED_MATERIAL.to_string()),
        };
        match rows.iter_mut().find(|r| r.key == key) {
            Some(row) => {
                row.count += 1;
                row.total_mass += part.mass;
            }
            None => rows.push(BomRow {
                key,
                count: 1,
                total_mass: part.mass,
            }),
        }
    }
    rows
}

/// Render rows in the requested format; JSON comes back as a string too so
/// the caller can embed it uniformly.
pub fn render_bom(rows: &[BomRow], format: BomFormat) -> String {
    match format {
        BomFormat::Json => {
            serde_json::to_string_pretty(rows).unwrap_or_else(|_| "[]".to_string())
        }
        BomFormat::Csv => {
            let mut out = String::from("item,count,total_mass\n");
            for row in rows {
                out.push_str(&format!(
                    "{},{},{}\n",
                    csv_escape(&row.key),
                    row.count,
                    row.total_mass
                ));
            }
            out
        }
        BomFormat::Markdown => {
            let mut out = String::from("| Item | Count | Total Mass |\n|---|---|---|\n");
            for row in rows {
                out.push_str(&format!(
                    "| {} | {} | {} |\n",
                    row.key, row.count, row.total_mass
                ));
            }
            out
        }
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::placement::Placement;
    use crate::query::AssemblyModel;

    fn sample_assembly() -> Assembly {
        let mut asm = Assembly::new("bom_test", AssemblyModel::Hierarchy);
        {
            let h = asm.as_hierarchy_mut().unwrap();
            h.create_lcs("root", Placement::IDENTITY).unwrap();
            h.insert_part("bolt_a", 0.05, "root", Placement::IDENTITY, Some("steel".into()))
                .unwrap();
            h.insert_part("bolt_b", 0.05, "root", Placement::IDENTITY, Some("steel".into()))
                .unwrap();
            h.insert_part("spacer", 0.02, "root", Placement::IDENTITY, None)
                .unwrap();
        }
        asm
    }

    #[test]
    fn group_by_material_sums_mass() {
        let rows = generate_bom(&sample_assembly(), BomGroupKey::Material);
        assert_eq!(rows.len(), 2);
        let steel = rows.iter().find(|r| r.key == "steel").unwrap();
        assert_eq!(steel.count, 2);
        assert!((steel.total_mass - 0.1).abs() < 1e-6);
        assert!(rows.iter().any(|r| r.key == "unspecified"));
    }

    #[test]
    fn group_by_name_keeps_rows_distinct() {
        let rows = generate_bom(&sample_assembly(), BomGroupKey::Name);
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.count == 1));
    }

    #[test]
    fn renders_csv_and_markdown() {
        let rows = generate_bom(&sample_assembly(), BomGroupKey::Material);
        let csv = render_bom(&rows, BomFormat::Csv);
        assert!(csv.starts_with("item,count,total_mass\n"));
        assert!(csv.contains("steel,2,"));

        let md = render_bom(&rows, BomFormat::Markdown);
        assert!(md.contains("| steel | 2 |"));

        let json = render_bom(&rows, BomFormat::Json);
        let parsed: Vec<BomRow> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.len(), 2);
    }
}
