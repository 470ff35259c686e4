//! Model-layer error taxonomy
//!
//! Every failure surfaced to a client falls into one of these kinds; the
//! server prefixes the kind name when rendering the response envelope.

use thiserror::Error;

/// Model-layer errors
#[derive(Debug, Clone, Error)]
pub enum ModelError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    NameConflict(String),
    #[error("{0}")]
    InvalidReference(String),
    #[error("{0}")]
    InvalidGeometry(String),
    #[error("{0}")]
    InvalidParameter(String),
    #[error("{0}")]
    GeometryOperationFailed(String),
    #[error("{0}")]
    SolveFailed(String),
    #[error("{0}")]
    StaleGeometryReference(String),
    #[error("{0}")]
    UnresolvedPlacement(String),
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

impl ModelError {
    /// Stable kind name used as the envelope error prefix
    pub fn kind(&self) -> &'static str {
        match self {
            ModelError::NotFound(_) => "NotFound",
            ModelError::NameConflict(_) => "NameConflict",
            ModelError::InvalidReference(_) => "InvalidReference",
            ModelError::InvalidGeometry(_) => "InvalidGeometry",
            ModelError::InvalidParameter(_) => "InvalidParameter",
            ModelError::GeometryOperationFailed(_) => "GeometryOperationFailed",
            ModelError::SolveFailed(_) => "SolveFailed",
            ModelError::StaleGeometryReference(_) => "StaleGeometryReference",
            ModelError::UnresolvedPlacement(_) => "UnresolvedPlacement",
        }
    }
}

impl From<mb_cad::SketchError> for ModelError {
    fn from(err: mb_cad::SketchError) -> Self {
        match &err {
            mb_cad::SketchError::InvalidGeometry { .. } => {
                ModelError::InvalidGeometry(err.to_string())
            }
            mb_cad::SketchError::InvalidReference { .. } => {
                ModelError::InvalidReference(err.to_string())
            }
        }
    }
}

impl From<mb_cad::CadError> for ModelError {
    fn from(err: mb_cad::CadError) -> Self {
        match &err {
            mb_cad::CadError::InvalidProfile(_) => ModelError::InvalidGeometry(err.to_string()),
            mb_cad::CadError::UnknownSolid(_) => ModelError::InvalidReference(err.to_string()),
            mb_cad::CadError::OperationFailed(_) | mb_cad::CadError::KernelUnavailable(_) => {
                ModelError::GeometryOperationFailed(err.to_string())
            }
        }
    }
}

impl From<mb_cad::FeatureError> for ModelError {
    fn from(err: mb_cad::FeatureError) -> Self {
        match err {
            mb_cad::FeatureError::Sketch(e) => e.into(),
            mb_cad::FeatureError::Cad(e) => e.into(),
            mb_cad::FeatureError::InvalidParameter(msg) => ModelError::InvalidParameter(msg),
            mb_cad::FeatureError::InputNotFound(msg) => ModelError::InvalidReference(msg),
            mb_cad::FeatureError::NoProfile(msg) => ModelError::InvalidGeometry(msg),
        }
    }
}

impl From<mb_assembly::AssemblyError> for ModelError {
    fn from(err: mb_assembly::AssemblyError) -> Self {
        use mb_assembly::AssemblyError as E;
        match &err {
            E::PartNotFound(_) | E::ConstraintNotFound(_) | E::LcsNotFound(_) => {
                ModelError::NotFound(err.to_string())
            }
            E::NameConflict(_) => ModelError::NameConflict(err.to_string()),
            E::InvalidReference(_) => ModelError::InvalidReference(err.to_string()),
            E::InvalidParameter(_) => ModelError::InvalidParameter(err.to_string()),
            E::SolveFailed(_) => ModelError::SolveFailed(err.to_string()),
            E::StaleGeometryReference(_) => ModelError::StaleGeometryReference(err.to_string()),
            E::UnresolvedPlacement(_) => ModelError::UnresolvedPlacement(err.to_string()),
            E::ExportFailed(_) => ModelError::GeometryOperationFailed(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_are_stable() {
        assert_eq!(ModelError::NotFound("x".into()).kind(), "NotFound");
        assert_eq!(
            ModelError::GeometryOperationFailed("x".into()).kind(),
            "GeometryOperationFailed"
        );
    }

    #[test]
    fn sketch_errors_map_to_taxonomy() {
        let err: ModelError = mb_cad::SketchError::InvalidGeometry {
            index: 1,
            reason: "radius must be positive".into(),
        }
        .into();
        assert_eq!(err.kind(), "InvalidGeometry");
        assert!(err.to_string().contains("element 1"));
    }
}
