//! Relaxation parameter bundles.
//!
//! One config struct per operation, serde-serializable so callers can
//! persist run configurations.

use serde::{Deserialize, Serialize};

/// Which smoothing estimate drives each vertex update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SmoothingMode {
    /// New position from area-weighted incident-triangle centroids.
    Areal,
    /// New position from the plain average of neighbor positions.
    Linear,
    /// Linear smoothing where landmark vertices stay fixed and their
    /// neighbors track a mirrored-reflection position.
    LandmarkConstrained,
    /// Linear smoothing where landmark neighbors keep a fixed offset
    /// from their own neighbor average, captured once at setup.
    LandmarkNeighborConstrained,
}

/// Parameters for [`smooth_surface`](crate::smooth_surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmoothingConfig {
    /// Total relaxation passes.
    pub iterations: u32,

    /// Blend gain in (0, 1]: `output = strength * estimate +
    /// (1 - strength) * old`.
    pub strength: f32,

    /// Edge vertices are relaxed only every this-many iterations.
    /// 0 = never.
    pub edge_iterations: u32,

    /// Landmark-adjacent vertices are relaxed only every this-many
    /// iterations, counted independently of the edge cadence.
    /// 0 = never.
    pub landmark_neighbor_iterations: u32,

    /// Rescale every vertex back onto the surface's original sphere
    /// radius every this-many iterations. 0 = never. Required to keep
    /// spherical meshes from drifting off the sphere under repeated
    /// relaxation.
    pub project_to_sphere_every_x_iterations: u32,

    /// Worker threads; 1 runs on the calling thread.
    pub threads: usize,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            iterations: 50,
            strength: 1.0,
            edge_iterations: 10,
            landmark_neighbor_iterations: 10,
            project_to_sphere_every_x_iterations: 0,
            threads: 1,
        }
    }
}

/// Target geometry of a morphing run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MorphTarget {
    /// Flat surface in the XY plane; +Z is the outward reference.
    Flat,
    /// Sphere about the origin; forces act in the tangent plane and
    /// positions are rescaled back onto the sphere each iteration.
    Spherical,
}

/// Parameters for [`morph_surface`](crate::morph_surface).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorphingConfig {
    /// Total relaxation passes. 0 computes forces without moving any
    /// vertex.
    pub iterations: u32,

    /// Gain on the distance-error (linear) force.
    pub linear_force: f32,

    /// Gain on the fan-angle-error (angular) force.
    pub angular_force: f32,

    /// Global gain on the combined displacement.
    pub step_size: f32,

    /// Gain on the inverse-force correction a movable vertex receives
    /// from each frozen neighbor.
    pub no_morph_neighbor_step_size: f32,

    /// Invert the angular force where the local triangle orientation
    /// has flipped. Detection always runs; this gates whether the
    /// result is applied. Off by default pending confirmation from
    /// domain owners.
    pub crossover_correction: bool,

    /// Worker threads; 1 runs on the calling thread.
    pub threads: usize,
}

impl Default for MorphingConfig {
    fn default() -> Self {
        Self {
            iterations: 1,
            linear_force: 0.5,
            angular_force: 0.3,
            step_size: 0.5,
            no_morph_neighbor_step_size: 0.5,
            crossover_correction: false,
            threads: 1,
        }
    }
}

/// Parameters for
/// [`inflate_and_smooth_fingers`](crate::inflate_and_smooth_fingers).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InflateConfig {
    /// Smoothing/inflation cycles. Measurement runs once more after
    /// the final cycle.
    pub cycles: u32,

    /// Strength of the regular areal smoothing in each cycle.
    pub smoothing_strength: f32,

    /// Iterations of the regular areal smoothing in each cycle.
    pub smoothing_iterations: u32,

    /// Ellipsoidal inflation factor per cycle; 1.0 = no inflation.
    pub inflation_factor: f32,

    /// Vertices whose neighbor-averaged compressed/stretched value
    /// exceeds this get targeted "finger" smoothing.
    pub compress_stretch_threshold: f32,

    /// Strength of the targeted finger smoothing.
    pub finger_smoothing_strength: f32,

    /// Iterations of the targeted finger smoothing. 0 disables it.
    pub finger_smoothing_iterations: u32,
}

impl Default for InflateConfig {
    fn default() -> Self {
        Self {
            cycles: 6,
            smoothing_strength: 1.0,
            smoothing_iterations: 200,
            inflation_factor: 1.1,
            compress_stretch_threshold: 1.0,
            finger_smoothing_strength: 1.0,
            finger_smoothing_iterations: 0,
        }
    }
}
