//! Surface smoothing.
//!
//! Each iteration recomputes vertex positions from neighbor geometry:
//! areal smoothing pulls a vertex toward the area-weighted centroids
//! of its incident triangles, linear smoothing toward the plain
//! average of its neighbors. Landmark-constrained variants freeze
//! landmark vertices and steer their neighbors.
//!
//! Vertices with no incident triangles are never moved and never
//! divide by their neighbor count.

use glam::Vec3;

use folia_math::triangle_area;
use folia_mesh::{SurfaceMesh, TopologyHelper, VertexClass};
use folia_types::{FoliaError, FoliaResult};

use crate::config::{SmoothingConfig, SmoothingMode};
use crate::engine::{run_relaxation, IterationPass, OutputCoords, RelaxKernel, RelaxSchedule};

/// Per-vertex eligibility masks for a smoothing run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothingMasks<'a> {
    /// Vertices marked `false` are frozen for the whole run.
    pub smooth_only: Option<&'a [bool]>,
    /// Vertices marked `true` are landmarks: fixed under areal/linear
    /// modes and anchors for the landmark-constrained modes.
    pub landmarks: Option<&'a [bool]>,
}

/// How a vertex participates in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeType {
    Normal,
    DoNotSmooth,
    Landmark,
    LandmarkNeighbor,
}

#[derive(Debug, Clone, Copy)]
struct SmoothNodeInfo {
    node_type: NodeType,
    /// Not interior: relaxed only on the edge cadence.
    edge_node: bool,
    /// Landmark's captured offset from its neighbor average
    /// (landmark-neighbor-constrained mode only).
    offset: Vec3,
    /// How many of this vertex's neighbors are landmarks.
    landmark_neighbor_count: u32,
}

/// Smooth `mesh` in place.
///
/// Landmark-neighbor-constrained mode applies a one-time coordinate
/// nudge to landmark-adjacent vertices during setup, before any
/// iteration runs.
pub fn smooth_surface(
    mesh: &mut SurfaceMesh,
    mode: SmoothingMode,
    config: &SmoothingConfig,
    masks: SmoothingMasks<'_>,
) -> FoliaResult<()> {
    let n = mesh.vertex_count();
    if n == 0 {
        return Err(FoliaError::EmptySurface);
    }
    if !(config.strength > 0.0 && config.strength <= 1.0) {
        return Err(FoliaError::InvalidConfig(format!(
            "Smoothing strength must be in (0, 1], got {}",
            config.strength
        )));
    }
    if config.iterations == 0 {
        return Ok(());
    }
    if let Some(mask) = masks.smooth_only {
        if mask.len() != n {
            return Err(FoliaError::AttributeLengthMismatch {
                expected: n,
                actual: mask.len(),
            });
        }
    }
    if let Some(mask) = masks.landmarks {
        if mask.len() != n {
            return Err(FoliaError::AttributeLengthMismatch {
                expected: n,
                actual: mask.len(),
            });
        }
    }

    let topology = TopologyHelper::build(&mesh.triangles, n, true);

    let mut node_info = vec![
        SmoothNodeInfo {
            node_type: NodeType::Normal,
            edge_node: false,
            offset: Vec3::ZERO,
            landmark_neighbor_count: 0,
        };
        n
    ];

    if let Some(mask) = masks.smooth_only {
        for (v, &keep) in mask.iter().enumerate() {
            if !keep {
                node_info[v].node_type = NodeType::DoNotSmooth;
            }
        }
    }

    let mut landmark_scale = 1.0f32;
    if let Some(landmarks) = masks.landmarks {
        let mut have_scale = false;
        for v in 0..n {
            let neighbors = topology.neighbors(v);
            if landmarks[v] {
                node_info[v].node_type = NodeType::Landmark;
                if mode == SmoothingMode::LandmarkNeighborConstrained && !neighbors.is_empty() {
                    let mut sum = Vec3::ZERO;
                    for &neighbor in neighbors {
                        sum += mesh.position(neighbor as usize);
                    }
                    node_info[v].offset =
                        mesh.position(v) - sum / neighbors.len() as f32;
                }
            } else {
                for &neighbor in neighbors {
                    if landmarks[neighbor as usize] {
                        node_info[v].landmark_neighbor_count += 1;
                    } else if !have_scale {
                        // The scale of a typical non-landmark edge sets
                        // how far mirrored reflections reach.
                        have_scale = true;
                        landmark_scale = mesh
                            .position(v)
                            .distance(mesh.position(neighbor as usize))
                            / 3.0f32.sqrt();
                    }
                }
                if node_info[v].landmark_neighbor_count > 0 {
                    node_info[v].node_type = NodeType::LandmarkNeighbor;
                }
            }
        }

        // One-time nudge: shift each landmark neighbor by the average
        // of its adjacent landmarks' captured offsets.
        if mode == SmoothingMode::LandmarkNeighborConstrained {
            for v in 0..n {
                if node_info[v].node_type != NodeType::LandmarkNeighbor {
                    continue;
                }
                let mut sum = Vec3::ZERO;
                for &neighbor in topology.neighbors(v) {
                    if node_info[neighbor as usize].node_type == NodeType::Landmark {
                        sum += node_info[neighbor as usize].offset;
                    }
                }
                let shift = sum / node_info[v].landmark_neighbor_count as f32;
                let p = mesh.position(v);
                mesh.set_position(v, p + shift);
            }
        }
    }

    for v in 0..n {
        node_info[v].edge_node = topology.classification(v) != VertexClass::Interior;
    }

    let sphere_radius = mesh.spherical_radius(|v| topology.has_neighbors(v));

    let kernel = SmoothKernel {
        mode,
        strength: config.strength,
        inverse_strength: 1.0 - config.strength,
        landmark_scale,
        node_info: &node_info,
        topology: &topology,
    };
    let schedule = RelaxSchedule {
        iterations: config.iterations,
        edge_every: config.edge_iterations,
        landmark_neighbor_every: config.landmark_neighbor_iterations,
        project_to_sphere_every: config.project_to_sphere_every_x_iterations,
        sphere_radius,
        threads: config.threads,
    };

    let result = run_relaxation(&kernel, &mesh.coords, &schedule);
    mesh.coords.copy_from_slice(&result);
    Ok(())
}

struct SmoothKernel<'a> {
    mode: SmoothingMode,
    strength: f32,
    inverse_strength: f32,
    landmark_scale: f32,
    node_info: &'a [SmoothNodeInfo],
    topology: &'a TopologyHelper,
}

impl SmoothKernel<'_> {
    #[inline]
    fn position(coords: &[f32], v: usize) -> Vec3 {
        Vec3::new(coords[v * 3], coords[v * 3 + 1], coords[v * 3 + 2])
    }

    fn blend(&self, old: Vec3, estimate: Vec3) -> Vec3 {
        old * self.inverse_strength + estimate * self.strength
    }

    /// Mirrored-reflection update for a landmark neighbor under the
    /// landmark-constrained mode: each adjacent landmark contributes a
    /// position reflected through itself away from its two flanking
    /// neighbors.
    fn landmark_constrained_estimate(
        &self,
        input: &[f32],
        v: usize,
        neighbors: &[u32],
    ) -> Option<Vec3> {
        let count = neighbors.len();
        if count <= 2 {
            return None;
        }

        let mut average = Vec3::ZERO;
        for &neighbor in neighbors {
            average += Self::position(input, neighbor as usize);
        }
        average /= count as f32;

        for (k, &neighbor) in neighbors.iter().enumerate() {
            if self.node_info[neighbor as usize].node_type != NodeType::Landmark {
                continue;
            }
            let previous = neighbors[(k + count - 1) % count];
            let next = neighbors[(k + 1) % count];

            let a = Self::position(input, previous as usize);
            let b = Self::position(input, next as usize);
            let landmark = Self::position(input, neighbor as usize);

            let reflection = (landmark * 2.0 - a - b).normalize_or_zero();
            average += landmark + reflection * self.landmark_scale;
        }

        let landmark_count = self.node_info[v].landmark_neighbor_count as f32;
        Some(average / (landmark_count + 1.0))
    }

    fn areal_estimate(&self, input: &[f32], v: usize, neighbors: &[u32]) -> Option<Vec3> {
        let count = neighbors.len();
        if count <= 1 {
            return None;
        }

        let my = Self::position(input, v);

        // Two passes over the fan: total area first, weights second.
        // The fan is a handful of triangles, so recomputing the areas
        // beats buffering them.
        let mut total_area = 0.0f32;
        for j in 0..count {
            let n1 = Self::position(input, neighbors[j] as usize);
            let n2 = Self::position(input, neighbors[(j + 1) % count] as usize);
            total_area += triangle_area(my, n1, n2);
        }

        // Zero total area means the vertex and all neighbors coincide.
        if total_area <= 0.0 {
            return None;
        }

        let mut estimate = Vec3::ZERO;
        for j in 0..count {
            let n1 = Self::position(input, neighbors[j] as usize);
            let n2 = Self::position(input, neighbors[(j + 1) % count] as usize);
            let area = triangle_area(my, n1, n2);
            if area > 0.0 {
                let center = (my + n1 + n2) / 3.0;
                estimate += center * (area / total_area);
            }
        }
        Some(estimate)
    }

    fn linear_estimate(input: &[f32], neighbors: &[u32]) -> Option<Vec3> {
        let count = neighbors.len();
        if count <= 1 {
            return None;
        }
        let mut sum = Vec3::ZERO;
        for &neighbor in neighbors {
            sum += Self::position(input, neighbor as usize);
        }
        Some(sum / count as f32)
    }
}

impl RelaxKernel for SmoothKernel<'_> {
    fn relax_range(
        &self,
        pass: &IterationPass,
        range: std::ops::Range<usize>,
        input: &[f32],
        output: &mut OutputCoords,
    ) {
        for v in range {
            output.copy_from_input(input, v);

            let info = self.node_info[v];
            let mut smooth_it = true;
            if info.edge_node {
                smooth_it = pass.relax_edges;
            }

            match info.node_type {
                NodeType::Normal => {}
                NodeType::DoNotSmooth | NodeType::Landmark => {
                    smooth_it = false;
                }
                NodeType::LandmarkNeighbor => {
                    if self.mode == SmoothingMode::LandmarkNeighborConstrained {
                        smooth_it = pass.relax_landmark_neighbors;
                    }
                    if self.mode == SmoothingMode::LandmarkConstrained {
                        smooth_it = false;
                        let neighbors = self.topology.neighbors(v);
                        if let Some(estimate) =
                            self.landmark_constrained_estimate(input, v, neighbors)
                        {
                            let old = Self::position(input, v);
                            output.write(v, self.blend(old, estimate));
                        }
                    }
                }
            }

            if !smooth_it {
                continue;
            }

            let neighbors = self.topology.neighbors(v);
            let estimate = match self.mode {
                SmoothingMode::Areal => self.areal_estimate(input, v, neighbors),
                SmoothingMode::Linear
                | SmoothingMode::LandmarkConstrained
                | SmoothingMode::LandmarkNeighborConstrained => {
                    Self::linear_estimate(input, neighbors)
                }
            };

            if let Some(estimate) = estimate {
                let old = Self::position(input, v);
                output.write(v, self.blend(old, estimate));
            }
        }
    }
}
