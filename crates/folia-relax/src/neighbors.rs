//! Per-vertex neighbor information captured from a reference surface.
//!
//! Built once per morphing run, consumed every iteration: the ordered
//! neighbor list, baseline inter-neighbor distances, and the baseline
//! fan angles the angular force compares against. Never mutated after
//! construction except for the one-time fiducial/sphere distortion
//! correction applied while building.

use glam::Vec3;

use folia_math::interior_angle;
use folia_mesh::{TopologyHelper, VertexClass};

/// Baseline geometry around one vertex, measured on the reference
/// surface.
#[derive(Debug, Clone)]
pub struct NeighborInfo {
    /// Index of this vertex.
    pub vertex: u32,
    /// Connectivity classification from the topology helper.
    pub classification: VertexClass,
    /// Fan-ordered neighbor indices.
    pub neighbors: Vec<u32>,
    /// Reference distance to each neighbor.
    pub baseline_distance: Vec<f32>,
    /// Reference angle at neighbor `i` in the corner
    /// `(vertex, neighbor i, neighbor i+1)`.
    pub angle_at_neighbor: Vec<f32>,
    /// Reference angle at neighbor `i+1` in the same corner.
    pub angle_at_next: Vec<f32>,
}

impl NeighborInfo {
    /// Number of neighbors.
    #[inline]
    pub fn neighbor_count(&self) -> usize {
        self.neighbors.len()
    }
}

/// One-time scaling of baseline distances by per-vertex
/// fiducial/sphere area ratios.
///
/// Each edge's baseline distance is scaled by the mean of its two
/// endpoint ratios, blended with the raw distance by `fraction`
/// (0 = raw, 1 = fully corrected).
#[derive(Debug, Clone, Copy)]
pub struct FiducialSphereCorrection<'a> {
    /// Per-vertex fiducial/sphere ratio; length must equal the vertex
    /// count.
    pub ratios: &'a [f32],
    /// Blend between raw and corrected distances, in [0, 1].
    pub fraction: f32,
}

/// Baseline neighbor information for every vertex of a surface.
#[derive(Debug, Clone)]
pub struct NeighborTable {
    pub info: Vec<NeighborInfo>,
}

impl NeighborTable {
    /// Capture baseline distances and fan angles from
    /// `reference_coords` (interleaved), using a fan-sorted topology
    /// helper.
    ///
    /// Corner vertices see a single triangle, so only their first
    /// neighbor pair carries angles; the rest stay zero.
    pub fn build(
        reference_coords: &[f32],
        topology: &TopologyHelper,
        correction: Option<FiducialSphereCorrection<'_>>,
    ) -> Self {
        let n = topology.vertex_count();
        let at = |v: u32| {
            let v = v as usize * 3;
            Vec3::new(
                reference_coords[v],
                reference_coords[v + 1],
                reference_coords[v + 2],
            )
        };

        let mut info = Vec::with_capacity(n);
        for v in 0..n {
            let neighbors: Vec<u32> = topology.neighbors(v).to_vec();
            let count = neighbors.len();
            let classification = topology.classification(v);
            let my = at(v as u32);

            let mut baseline_distance = vec![0.0f32; count];
            let mut angle_at_neighbor = vec![0.0f32; count];
            let mut angle_at_next = vec![0.0f32; count];

            for i in 0..count {
                baseline_distance[i] = my.distance(at(neighbors[i]));

                if count > 1 {
                    let next = (i + 1) % count;
                    let current_pos = at(neighbors[i]);
                    let next_pos = at(neighbors[next]);

                    if classification == VertexClass::Corner {
                        if i == 0 {
                            angle_at_neighbor[0] = interior_angle(my, current_pos, next_pos);
                            angle_at_next[0] = interior_angle(current_pos, next_pos, my);
                        }
                    } else {
                        angle_at_neighbor[i] = interior_angle(my, current_pos, next_pos);
                        angle_at_next[i] = interior_angle(current_pos, next_pos, my);
                    }
                }
            }

            if let Some(correction) = correction {
                let my_ratio = correction.ratios[v];
                let inverse = 1.0 - correction.fraction;
                for (i, &neighbor) in neighbors.iter().enumerate() {
                    let neighbor_ratio = correction.ratios[neighbor as usize];
                    let blend = inverse
                        + correction.fraction * ((my_ratio + neighbor_ratio) * 0.5);
                    baseline_distance[i] *= blend;
                }
            }

            info.push(NeighborInfo {
                vertex: v as u32,
                classification,
                neighbors,
                baseline_distance,
                angle_at_neighbor,
                angle_at_next,
            });
        }

        Self { info }
    }
}
