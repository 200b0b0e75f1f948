//! # folia-measure
//!
//! Single-pass (non-iterative) surface measurements.
//!
//! ## Key Operations
//!
//! - [`surface_distortion`] — per-vertex areal and linear distortion
//!   between two meshes with identical topology
//! - [`sulcal_depth`] — depth of each surface vertex relative to an
//!   enclosing hull envelope mesh
//! - [`crossover_counts`] — flipped-triangle census for flat and
//!   spherical surfaces
//! - [`Descriptive`] — summary statistics over a scalar column

pub mod crossover;
pub mod depth;
pub mod distortion;
pub mod stats;

pub use crossover::{crossover_counts, CrossoverCounts, CrossoverSurface};
pub use depth::{sulcal_depth, DepthColumns, DepthConfig};
pub use distortion::{surface_distortion, DistortionColumns, DistortionConfig};
pub use stats::Descriptive;
