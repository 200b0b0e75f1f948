//! Scalar type alias for the engine.
//!
//! Surface coordinates and per-vertex attributes are single precision,
//! matching the caller-owned coordinate buffers the engine reads and
//! writes in place. The alias makes it easy to experiment with `f64`
//! precision if needed.

/// The floating-point type used throughout the engine.
pub type Scalar = f32;
