//! Assembly-related errors

/// Assembly-related errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssemblyError {
    #[error("part not found: {0}")]
    PartNotFound(String),
    #[error("constraint not found: {0}")]
    ConstraintNotFound(String),
    #[error("coordinate system not found: {0}")]
    LcsNotFound(String),
    #[error("name already in use: {0}")]
    NameConflict(String),
    #[error("invalid reference: {0}")]
    InvalidReference(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("solve failed: {0}")]
    SolveFailed(String),
    #[error("stale geometry reference: {0}")]
    StaleGeometryReference(String),
    #[error("unresolved placement: {0}")]
    UnresolvedPlacement(String),
    #[error("export failed: {0}")]
    ExportFailed(String),
}

/// Result type for assembly operations
pub type AssemblyResult<T> = Result<T, AssemblyError>;
