//! Numerical constants and fallback guard values.
//!
//! The guard values preserve a fixed policy — penalize large
//! distortion, never divide by exact zero — while the literals remain
//! overridable through the per-pass config structs.

/// Squared-distance tolerance for treating a query point as lying
/// exactly on a vertex during barycentric projection.
pub const ON_VERTEX_TOLERANCE_SQ: f32 = 0.01 * 0.01;

/// Signed-area tolerance for triangle containment tests. Slightly
/// negative so points exactly on an edge or vertex are accepted as
/// degenerate hits rather than rejected.
pub const TILE_AREA_TOLERANCE: f32 = -0.01;

/// Edge lengths below this are treated as zero; force and distortion
/// computations skip the edge instead of dividing by it.
pub const MIN_EDGE_LENGTH: f32 = 1.0e-20;

/// Distortion ratio substituted when the reference area is zero but the
/// subject area is not.
pub const DISTORTION_PENALTY_RATIO: f32 = 10000.0;

/// Floor applied to distortion ratios before taking log2, so a zero
/// subject area cannot produce -inf.
pub const DISTORTION_MIN_RATIO: f32 = 1.0e-8;

/// Epsilon for degenerate triangle detection (area threshold).
pub const DEGENERATE_AREA_THRESHOLD: f32 = 1.0e-10;
