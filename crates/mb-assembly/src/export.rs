//! Assembly export to the JSON interchange form

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::{AssemblyError, AssemblyResult};
use crate::query::{Assembly, PartInfo};

/// The serialized interchange document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssemblyExport {
    /// Assembly name
    pub name: String,
    /// Model name ("constraint" or "hierarchy")
    pub model: String,
    /// Parts with resolved placements where available
    pub parts: Vec<PartInfo>,
}

/// Build the interchange document for an assembly
pub fn export_document(assembly: &Assembly) -> AssemblyExport {
    AssemblyExport {
        name: assembly.name().to_string(),
        model: assembly.model().as_str().to_string(),
        parts: assembly.list_parts(),
    }
}

/// Serialize an assembly to a writer as pretty JSON
pub fn export_assembly<W: Write>(assembly: &Assembly, writer: W) -> AssemblyResult<()> {
    let doc = export_document(assembly);
    serde_json::to_writer_pretty(writer, &doc)
        .map_err(|e| AssemblyError::ExportFailed(e.to_string()))
}

/// Serialize an assembly to a JSON value (for command responses)
pub fn export_json(assembly: &Assembly) -> AssemblyResult<serde_json::Value> {
    serde_json::to_value(export_document(assembly))
        .map_err(|e| AssemblyError::ExportFailed(e.to_string()))
}
