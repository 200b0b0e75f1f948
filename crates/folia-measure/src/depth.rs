//! Sulcal depth of a surface relative to an enclosing hull envelope.
//!
//! For each surface vertex: find the nearest hull vertex, take the
//! signed distance to that vertex's tangent plane for the sign, and
//! report the point-to-point distance with that sign. Two refinements
//! keep the pairing honest on convoluted surfaces:
//!
//! - With normal consistency enabled, both the surface and the hull
//!   are inflated to obtain smooth normals; a hull vertex whose
//!   inflated normal opposes the surface vertex's is rejected, and the
//!   nearest consistent hull vertex is found by scan instead. This
//!   keeps deep folds from pairing with the wrong side of the hull.
//! - A surface vertex closer to the hull than the hull's own local
//!   neighbor spacing takes its depth from the dot with the raw hull
//!   normal, where the tangent-plane distance is unreliable.
//!
//! The hull's triangles are assumed to wind so face normals point
//! outward.

use glam::Vec3;

use serde::{Deserialize, Serialize};

use folia_math::signed_distance_to_plane;
use folia_mesh::normals::{normal_at, vertex_normals};
use folia_mesh::{ScalarColumns, SurfaceMesh, TopologyHelper};
use folia_relax::{
    inflate_and_smooth_fingers, smooth_surface, InflateConfig, SmoothingConfig, SmoothingMasks,
    SmoothingMode,
};
use folia_spatial::PointLocator;
use folia_types::{FoliaError, FoliaResult};

/// Parameters for [`sulcal_depth`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepthConfig {
    /// Areal smoothing applied to the hull before measuring.
    /// 0 = use the hull as given.
    pub hull_smoothing_iterations: u32,

    /// Neighbor-average smoothing applied to the smoothed-depth
    /// column. 0 leaves both columns identical.
    pub depth_smoothing_iterations: u32,

    /// Reject nearest-hull pairings whose inflated normals disagree
    /// with the surface vertex's, falling back to the nearest
    /// consistent hull vertex.
    pub normal_consistency: bool,

    /// Name for the raw depth column.
    pub depth_column: String,

    /// Name for the smoothed depth column.
    pub smoothed_depth_column: String,
}

impl Default for DepthConfig {
    fn default() -> Self {
        Self {
            hull_smoothing_iterations: 10,
            depth_smoothing_iterations: 5,
            normal_consistency: true,
            depth_column: "Depth".to_string(),
            smoothed_depth_column: "Smoothed Depth".to_string(),
        }
    }
}

/// Column indices written by [`sulcal_depth`].
#[derive(Debug, Clone, Copy)]
pub struct DepthColumns {
    pub depth: usize,
    pub smoothed_depth: usize,
}

/// Inflation recipe for the surface whose normals gate the pairing.
fn surface_inflation() -> InflateConfig {
    InflateConfig {
        cycles: 6,
        smoothing_strength: 1.0,
        smoothing_iterations: 200,
        inflation_factor: 1.1,
        compress_stretch_threshold: 1.0,
        finger_smoothing_strength: 1.0,
        finger_smoothing_iterations: 0,
    }
}

/// Light hull smoothing: its normals supply the tangent-plane sign.
fn hull_low_inflation() -> InflateConfig {
    InflateConfig {
        cycles: 1,
        smoothing_strength: 1.0,
        smoothing_iterations: 30,
        inflation_factor: 1.0,
        compress_stretch_threshold: 1.0,
        finger_smoothing_strength: 1.0,
        finger_smoothing_iterations: 0,
    }
}

/// Heavy hull inflation: its normals drive the consistency check.
fn hull_high_inflation() -> InflateConfig {
    InflateConfig {
        cycles: 6,
        smoothing_strength: 1.0,
        smoothing_iterations: 50,
        inflation_factor: 1.1,
        compress_stretch_threshold: 3.0,
        finger_smoothing_strength: 1.0,
        finger_smoothing_iterations: 60,
    }
}

/// Measure sulcal depth of `surface` against `hull`, writing a raw and
/// a smoothed depth column into `columns`.
pub fn sulcal_depth(
    surface: &SurfaceMesh,
    hull: &SurfaceMesh,
    columns: &mut ScalarColumns,
    config: &DepthConfig,
) -> FoliaResult<DepthColumns> {
    let n = surface.vertex_count();
    if n == 0 || hull.vertex_count() == 0 {
        return Err(FoliaError::EmptySurface);
    }
    if columns.vertex_count() != n {
        return Err(FoliaError::AttributeLengthMismatch {
            expected: n,
            actual: columns.vertex_count(),
        });
    }

    let surface_topology = TopologyHelper::build(&surface.triangles, n, false);
    let hull_topology = TopologyHelper::build(&hull.triangles, hull.vertex_count(), false);

    // Inflated copies supply smooth normals for the consistency check;
    // only normal directions are read, so the translation the
    // inflation applies is harmless.
    let (inflated_surface_normals, inflated_hull_normals, low_smooth_hull_normals) =
        if config.normal_consistency {
            let mut inflated_surface = surface.clone();
            inflate_and_smooth_fingers(&mut inflated_surface, surface, &surface_inflation())?;

            let mut inflated_hull = hull.clone();
            inflate_and_smooth_fingers(&mut inflated_hull, hull, &hull_high_inflation())?;

            let mut low_smooth_hull = hull.clone();
            inflate_and_smooth_fingers(&mut low_smooth_hull, hull, &hull_low_inflation())?;

            (
                Some(vertex_normals(&inflated_surface.coords, &surface.triangles)),
                Some(vertex_normals(&inflated_hull.coords, &hull.triangles)),
                Some(vertex_normals(&low_smooth_hull.coords, &hull.triangles)),
            )
        } else {
            (None, None, None)
        };

    // Working hull, optionally smoothed before measurement.
    let mut hull_work = hull.clone();
    if config.hull_smoothing_iterations > 0 {
        let smoothing = SmoothingConfig {
            iterations: config.hull_smoothing_iterations,
            strength: 1.0,
            edge_iterations: 0,
            landmark_neighbor_iterations: 0,
            project_to_sphere_every_x_iterations: 0,
            threads: 1,
        };
        smooth_surface(
            &mut hull_work,
            SmoothingMode::Areal,
            &smoothing,
            SmoothingMasks::default(),
        )?;
    }

    let hull_normals = vertex_normals(&hull_work.coords, &hull_work.triangles);
    let hull_reach = greatest_neighbor_distance(&hull_work, &hull_topology);
    let hull_locator = PointLocator::build(&hull_work, true, false, None);

    let depth = columns.add_column(&config.depth_column);
    let smoothed_depth = columns.add_column(&config.smoothed_depth_column);

    let normals_agree = |surface_vertex: usize, hull_vertex: usize| -> bool {
        match (&inflated_surface_normals, &inflated_hull_normals) {
            (Some(surface_smooth), Some(hull_smooth)) => {
                normal_at(hull_smooth, hull_vertex).dot(normal_at(surface_smooth, surface_vertex))
                    > 0.0
            }
            _ => true,
        }
    };

    for i in 0..n {
        if !surface_topology.has_neighbors(i) {
            continue;
        }

        let surface_xyz = surface.position(i);

        let mut hull_vertex = hull_locator.nearest_point(&hull_work, surface_xyz);

        // The nearest hull vertex may sit on the far side of a fold;
        // fall back to the nearest hull vertex whose outward direction
        // agrees with the surface's.
        if let Some(h) = hull_vertex {
            if config.normal_consistency && !normals_agree(i, h as usize) {
                let mut nearest_distance = f32::MAX;
                hull_vertex = None;
                for m in 0..hull_work.vertex_count() {
                    if !hull_topology.has_neighbors(m) {
                        continue;
                    }
                    let dist_sq = hull_work.position(m).distance_squared(surface_xyz);
                    if dist_sq < nearest_distance && normals_agree(i, m) {
                        hull_vertex = Some(m as u32);
                        nearest_distance = dist_sq;
                    }
                }
            }
        }

        let Some(h) = hull_vertex else {
            continue;
        };
        let h = h as usize;

        let hull_xyz = hull_work.position(h);
        let hull_normal = normal_at(&hull_normals, h);
        let plane_normal = match &low_smooth_hull_normals {
            Some(normals) => normal_at(normals, h),
            None => hull_normal,
        };

        let distance_from_plane = signed_distance_to_plane(plane_normal, hull_xyz, surface_xyz);
        let mut distance = hull_xyz.distance(surface_xyz);

        if distance < hull_reach[h] {
            // Too close for the tangent plane to be trustworthy; the
            // projection onto the raw hull normal carries the sign.
            distance = (surface_xyz - hull_xyz).dot(hull_normal);
        } else if distance_from_plane < 0.0 {
            distance = -distance;
        }

        columns.set_value(i, depth, distance);
        columns.set_value(i, smoothed_depth, distance);
    }

    if config.depth_smoothing_iterations > 0 {
        columns.smooth_average_neighbors(
            smoothed_depth,
            1.0,
            config.depth_smoothing_iterations,
            &surface_topology,
        )?;
    }

    tracing::debug!(vertices = n, hull_vertices = hull.vertex_count(), "sulcal depth complete");
    Ok(DepthColumns {
        depth,
        smoothed_depth,
    })
}

/// Largest distance from each vertex to any of its neighbors.
fn greatest_neighbor_distance(mesh: &SurfaceMesh, topology: &TopologyHelper) -> Vec<f32> {
    let mut reach = vec![0.0f32; mesh.vertex_count()];
    for v in 0..mesh.vertex_count() {
        let mut max_sq = 0.0f32;
        let p: Vec3 = mesh.position(v);
        for &neighbor in topology.neighbors(v) {
            max_sq = max_sq.max(p.distance_squared(mesh.position(neighbor as usize)));
        }
        reach[v] = max_sq.sqrt();
    }
    reach
}
