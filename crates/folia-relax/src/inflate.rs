//! Surface inflation with targeted smoothing of compressed regions.
//!
//! Alternates cycles of areal smoothing and ellipsoidal inflation,
//! measuring compressed/stretched distortion against a fiducial
//! surface after each cycle and giving the worst-distorted vertices
//! ("fingers") extra smoothing. Used standalone and by the sulcal
//! depth pass, which needs inflated surfaces for stable normals.

use folia_math::triangle_area;
use folia_mesh::{SurfaceMesh, TopologyHelper};
use folia_types::constants::{DISTORTION_MIN_RATIO, DISTORTION_PENALTY_RATIO};
use folia_types::{FoliaError, FoliaResult};

use crate::config::{InflateConfig, SmoothingConfig, SmoothingMode};
use crate::smoothing::{smooth_surface, SmoothingMasks};

/// Inflate `mesh` in place over the configured number of cycles.
///
/// Both `mesh` and (a working copy of) `fiducial` are referenced to
/// their centers of mass; `mesh` is left translated accordingly.
pub fn inflate_and_smooth_fingers(
    mesh: &mut SurfaceMesh,
    fiducial: &SurfaceMesh,
    config: &InflateConfig,
) -> FoliaResult<()> {
    let n = mesh.vertex_count();
    if n == 0 {
        return Err(FoliaError::EmptySurface);
    }
    if fiducial.vertex_count() != n {
        return Err(FoliaError::VertexCountMismatch {
            reference: fiducial.vertex_count(),
            subject: n,
        });
    }

    let inflation = config.inflation_factor - 1.0;

    let mut fiducial = fiducial.clone();
    mesh.translate_to_center_of_mass();
    fiducial.translate_to_center_of_mass();

    let (min, max) = fiducial.bounds();
    let extent = max - min;

    let fiducial_area = fiducial.surface_area();

    let topology = TopologyHelper::build(&mesh.triangles, n, true);

    let regular = SmoothingConfig {
        iterations: config.smoothing_iterations,
        strength: config.smoothing_strength,
        edge_iterations: 1,
        landmark_neighbor_iterations: 0,
        project_to_sphere_every_x_iterations: 0,
        threads: 1,
    };

    let mut compressed_stretched = vec![0.0f32; n];
    let mut averaged = vec![0.0f32; n];

    // The final pass measures without smoothing or inflating.
    for cycle in 0..=config.cycles {
        if cycle < config.cycles {
            smooth_surface(mesh, SmoothingMode::Areal, &regular, SmoothingMasks::default())?;

            // Incremental ellipsoidal inflation: vertices far inside
            // the fiducial envelope inflate more.
            for v in 0..n {
                let p = mesh.position(v);
                let r = (p / extent).length();
                let k = 1.0 + inflation * (1.0 - r);
                mesh.set_position(v, p * k);
            }
        }

        let area_ratio = mesh.surface_area() / fiducial_area;

        for v in 0..n {
            let neighbors = topology.neighbors(v);
            let node = mesh.position(v);
            let fiducial_node = fiducial.position(v);

            let mut max_linear = 0.0f32;
            let mut compression_sum = 0.0f32;
            let mut valid = 0.0f32;

            for (j, &neighbor) in neighbors.iter().enumerate() {
                let neighbor_pos = mesh.position(neighbor as usize);
                let fiducial_neighbor = fiducial.position(neighbor as usize);

                let dist = node.distance(neighbor_pos);
                let fiducial_dist = fiducial_node.distance(fiducial_neighbor);
                if fiducial_dist > 0.0 {
                    max_linear = max_linear.max(dist / fiducial_dist);
                }

                let next = neighbors[(j + 1) % neighbors.len()] as usize;
                let tile_area = triangle_area(node, neighbor_pos, mesh.position(next));
                let fiducial_tile_area = triangle_area(
                    fiducial_node,
                    fiducial_neighbor,
                    fiducial.position(next),
                );

                let mut distort = if tile_area > 0.0 {
                    fiducial_tile_area / tile_area
                } else if fiducial_tile_area != 0.0 {
                    DISTORTION_PENALTY_RATIO
                } else {
                    1.0
                };
                if distort < DISTORTION_MIN_RATIO {
                    distort = DISTORTION_MIN_RATIO;
                }
                compression_sum += distort;
                valid += 1.0;
            }

            let average_compression = if valid > 0.0 {
                compression_sum / valid
            } else {
                0.0
            };
            compressed_stretched[v] = max_linear * average_compression * area_ratio;
        }

        // Neighbor-average the metric (self included) before
        // thresholding.
        for v in 0..n {
            let neighbors = topology.neighbors(v);
            let mut value = compressed_stretched[v];
            if !neighbors.is_empty() {
                for &neighbor in neighbors {
                    value += compressed_stretched[neighbor as usize];
                }
                value /= (neighbors.len() + 1) as f32;
            }
            averaged[v] = value;
        }

        let need_smoothing: Vec<bool> = averaged
            .iter()
            .map(|&v| v > config.compress_stretch_threshold)
            .collect();
        let flagged = need_smoothing.iter().filter(|&&f| f).count();
        tracing::debug!(cycle, flagged, area_ratio, "inflation cycle measured");

        if cycle < config.cycles && config.finger_smoothing_iterations > 0 && flagged > 0 {
            let fingers = SmoothingConfig {
                iterations: config.finger_smoothing_iterations,
                strength: config.finger_smoothing_strength,
                edge_iterations: 1,
                landmark_neighbor_iterations: 0,
                project_to_sphere_every_x_iterations: 0,
                threads: 1,
            };
            smooth_surface(
                mesh,
                SmoothingMode::Areal,
                &fingers,
                SmoothingMasks {
                    smooth_only: Some(&need_smoothing),
                    landmarks: None,
                },
            )?;
        }
    }

    Ok(())
}
