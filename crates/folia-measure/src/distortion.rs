//! Areal and linear distortion between two corresponding meshes.
//!
//! Both meshes must share the same triangle connectivity; only the
//! vertex positions differ (e.g. a fiducial surface and the flat or
//! spherical surface morphed from it).

use serde::{Deserialize, Serialize};

use folia_mesh::{ScalarColumns, SurfaceMesh, TopologyHelper};
use folia_types::constants::{DISTORTION_MIN_RATIO, DISTORTION_PENALTY_RATIO};
use folia_types::{FoliaError, FoliaResult};

/// Parameters for [`surface_distortion`].
///
/// The guard constants keep a fixed policy (penalize heavily, never
/// divide by exact zero) while the literal values stay adjustable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistortionConfig {
    /// Ratio substituted when exactly one of the two areas (or edge
    /// lengths) is zero.
    pub penalty_ratio: f32,
    /// Floor applied to areal ratios before taking log2.
    pub min_ratio: f32,
    /// Name for the areal distortion output column.
    pub areal_column: String,
    /// Name for the linear distortion output column.
    pub linear_column: String,
}

impl Default for DistortionConfig {
    fn default() -> Self {
        Self {
            penalty_ratio: DISTORTION_PENALTY_RATIO,
            min_ratio: DISTORTION_MIN_RATIO,
            areal_column: "areal-dist".to_string(),
            linear_column: "linear-dist".to_string(),
        }
    }
}

/// Column indices written by [`surface_distortion`].
#[derive(Debug, Clone, Copy)]
pub struct DistortionColumns {
    pub areal: usize,
    pub linear: usize,
}

/// Measure distortion of `surface` relative to `reference`, writing
/// two new columns into `columns`.
///
/// Per-triangle areal distortion is `log2(current / reference)` area;
/// per-vertex areal distortion averages the vertex's incident
/// triangles. Per-vertex linear distortion averages
/// `current / reference` edge length over the vertex's neighbors.
/// Identical surfaces yield areal 0 and linear 1 everywhere.
pub fn surface_distortion(
    surface: &SurfaceMesh,
    reference: &SurfaceMesh,
    columns: &mut ScalarColumns,
    config: &DistortionConfig,
) -> FoliaResult<DistortionColumns> {
    let n = surface.vertex_count();
    if n == 0 {
        return Err(FoliaError::EmptySurface);
    }
    if reference.vertex_count() != n {
        return Err(FoliaError::VertexCountMismatch {
            reference: reference.vertex_count(),
            subject: n,
        });
    }
    if surface.triangles != reference.triangles {
        return Err(FoliaError::InvalidMesh(
            "Distortion requires identical triangle connectivity".to_string(),
        ));
    }
    if columns.vertex_count() != n {
        return Err(FoliaError::AttributeLengthMismatch {
            expected: n,
            actual: columns.vertex_count(),
        });
    }

    let topology = TopologyHelper::build(&surface.triangles, n, false);

    // Per-triangle areal distortion first; vertices average their
    // incident triangles.
    let tri_count = surface.triangle_count();
    let mut tri_distortion = vec![0.0f32; tri_count];
    for t in 0..tri_count {
        let current = surface.triangle_surface_area(t);
        let baseline = reference.triangle_surface_area(t);
        let ratio = guarded_ratio(current, baseline, config.penalty_ratio);
        tri_distortion[t] = ratio.max(config.min_ratio).log2();
    }

    let areal = columns.add_column(&config.areal_column);
    let linear = columns.add_column(&config.linear_column);

    for v in 0..n {
        let tiles = topology.incident_triangles(v);
        if !tiles.is_empty() {
            let sum: f32 = tiles.iter().map(|&t| tri_distortion[t as usize]).sum();
            columns.set_value(v, areal, sum / tiles.len() as f32);
        }

        let neighbors = topology.neighbors(v);
        if !neighbors.is_empty() {
            let mut sum = 0.0f32;
            for &neighbor in neighbors {
                let current = surface.position(v).distance(surface.position(neighbor as usize));
                let baseline = reference
                    .position(v)
                    .distance(reference.position(neighbor as usize));
                sum += guarded_ratio(current, baseline, config.penalty_ratio);
            }
            columns.set_value(v, linear, sum / neighbors.len() as f32);
        }
    }

    tracing::debug!(vertices = n, triangles = tri_count, "distortion pass complete");
    Ok(DistortionColumns { areal, linear })
}

/// `current / baseline` with the zero guards: both zero means no
/// distortion (ratio 1), a one-sided zero gets the penalty ratio.
fn guarded_ratio(current: f32, baseline: f32, penalty: f32) -> f32 {
    if baseline > 0.0 && current > 0.0 {
        current / baseline
    } else if baseline == 0.0 && current == 0.0 {
        1.0
    } else {
        penalty
    }
}
