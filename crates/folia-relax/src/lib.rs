//! # folia-relax
//!
//! Iterative mesh relaxation: the computational heart of the engine.
//!
//! ## Key Operations
//!
//! - [`smooth_surface`] — areal, linear, and landmark-constrained
//!   smoothing with edge/landmark cadences and optional periodic
//!   reprojection onto a sphere
//! - [`morph_surface`] — flat or spherical morphing driven by linear
//!   (distance-error) and angular (fan-angle-error) forces measured
//!   against a reference surface
//! - [`inflate_and_smooth_fingers`] — cycles of smoothing and
//!   ellipsoidal inflation with targeted smoothing of
//!   compressed/stretched regions
//!
//! All three run single-threaded or over a small pool of long-lived
//! worker threads, each owning a disjoint vertex range, synchronized
//! with an iteration barrier (see [`engine`]).

pub mod config;
pub mod engine;
pub mod inflate;
pub mod morphing;
pub mod neighbors;
pub mod smoothing;

pub use config::{
    InflateConfig, MorphTarget, MorphingConfig, SmoothingConfig, SmoothingMode,
};
pub use inflate::inflate_and_smooth_fingers;
pub use morphing::{morph_surface, FiducialSphereCorrection, MorphingForces, VertexForces};
pub use neighbors::{NeighborInfo, NeighborTable};
pub use smoothing::{smooth_surface, SmoothingMasks};
