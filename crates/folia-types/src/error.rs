//! Error types for the Folia engine.
//!
//! All crates return `FoliaResult<T>` from fallible operations.
//! Precondition failures are reported before any computation starts;
//! local numerical degeneracies (zero-length edges, zero-area
//! triangles) are handled by fallback values inside the algorithms and
//! never surface here.

use thiserror::Error;

/// Unified error type for the Folia engine.
#[derive(Debug, Error)]
pub enum FoliaError {
    /// Mesh data is malformed or inconsistent.
    #[error("Invalid mesh: {0}")]
    InvalidMesh(String),

    /// Surface has no vertices to operate on.
    #[error("Surface has no vertices")]
    EmptySurface,

    /// Two surfaces that must correspond vertex-for-vertex do not.
    #[error("Vertex count mismatch: reference has {reference}, subject has {subject}")]
    VertexCountMismatch {
        reference: usize,
        subject: usize,
    },

    /// Configuration value is invalid.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A per-vertex mask or column has the wrong length.
    #[error("Attribute length mismatch: expected {expected}, got {actual}")]
    AttributeLengthMismatch {
        expected: usize,
        actual: usize,
    },
}

/// Convenience alias for `Result<T, FoliaError>`.
pub type FoliaResult<T> = Result<T, FoliaError>;
