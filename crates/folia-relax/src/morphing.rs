//! Surface morphing toward flat or spherical target geometry.
//!
//! Each vertex is driven by two forces measured against baseline
//! geometry captured from a reference surface:
//!
//! - *Linear force* pushes each edge back toward its reference length,
//!   doubled when the edge has compressed below half its reference
//!   length.
//! - *Angular force* pushes each triangle-fan corner back toward its
//!   reference angles, directed in-plane orthogonal to the edge.
//!
//! Vertices marked "do not morph" never move, but their forces are
//! still computed each iteration: movable neighbors subtract a scaled
//! copy ("inverse force") so a frozen vertex cannot drag them along.

use std::cell::UnsafeCell;

use glam::Vec3;

use folia_math::{interior_angle, normalized_cross, triangle_normal};
use folia_mesh::{SurfaceMesh, TopologyHelper, VertexClass};
use folia_types::constants::MIN_EDGE_LENGTH;
use folia_types::{FoliaError, FoliaResult};

use crate::config::{MorphTarget, MorphingConfig};
use crate::engine::{run_relaxation, IterationPass, OutputCoords, RelaxKernel, RelaxSchedule};
use crate::neighbors::{NeighborInfo, NeighborTable};

pub use crate::neighbors::FiducialSphereCorrection;

/// Force vectors accumulated at one vertex during an iteration.
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexForces {
    pub linear: Vec3,
    pub angular: Vec3,
    pub total: Vec3,
}

/// Per-vertex forces from the last iteration of a morphing run.
#[derive(Debug, Clone)]
pub struct MorphingForces {
    pub forces: Vec<VertexForces>,
}

/// Morph `mesh` in place toward the target geometry, preserving
/// distances and angles measured on `reference`.
///
/// With `config.iterations == 0` the forces are computed and returned
/// without moving any vertex (forces-only mode).
pub fn morph_surface(
    mesh: &mut SurfaceMesh,
    reference: &SurfaceMesh,
    target: MorphTarget,
    config: &MorphingConfig,
    should_morph: Option<&[bool]>,
    correction: Option<FiducialSphereCorrection<'_>>,
) -> FoliaResult<MorphingForces> {
    let n = mesh.vertex_count();
    if n == 0 {
        return Err(FoliaError::EmptySurface);
    }
    if reference.vertex_count() != n {
        return Err(FoliaError::VertexCountMismatch {
            reference: reference.vertex_count(),
            subject: n,
        });
    }
    if let Some(mask) = should_morph {
        if mask.len() != n {
            return Err(FoliaError::AttributeLengthMismatch {
                expected: n,
                actual: mask.len(),
            });
        }
    }
    if let Some(correction) = &correction {
        if correction.ratios.len() != n {
            return Err(FoliaError::AttributeLengthMismatch {
                expected: n,
                actual: correction.ratios.len(),
            });
        }
    }

    // Topology comes from the morphing surface; baseline geometry from
    // the reference surface.
    let topology = TopologyHelper::build(&mesh.triangles, n, true);
    let table = NeighborTable::build(&reference.coords, &topology, correction);

    let morph_mask: Vec<bool> = match should_morph {
        Some(mask) => mask.to_vec(),
        None => vec![true; n],
    };
    let all_morphed = morph_mask.iter().all(|&m| m);

    let sphere_radius = mesh.spherical_radius(|v| topology.has_neighbors(v));

    let forces_only = config.iterations == 0;
    let iterations = config.iterations.max(1);

    let kernel = MorphKernel {
        target,
        linear_force: config.linear_force,
        angular_force: config.angular_force,
        step_size: config.step_size,
        no_morph_neighbor_step_size: config.no_morph_neighbor_step_size,
        crossover_correction: config.crossover_correction,
        sphere_radius,
        table: &table,
        should_morph: &morph_mask,
        all_morphed,
        forces: ForceTable::new(n),
    };
    let schedule = RelaxSchedule {
        iterations,
        edge_every: 0,
        landmark_neighbor_every: 0,
        project_to_sphere_every: 0,
        sphere_radius,
        threads: config.threads,
    };

    let result = run_relaxation(&kernel, &mesh.coords, &schedule);
    if !forces_only {
        mesh.coords.copy_from_slice(&result);
    }

    Ok(MorphingForces {
        forces: kernel.forces.into_vec(),
    })
}

/// Force accumulators shared across workers.
///
/// Safety protocol: during an iteration each worker writes only the
/// vertices in its own range; the only cross-range reads target
/// frozen ("do not morph") vertices, which are written exclusively by
/// the coordinator's serial pre-pass between iterations.
struct ForceTable {
    cells: Vec<UnsafeCell<VertexForces>>,
}

unsafe impl Sync for ForceTable {}

impl ForceTable {
    fn new(n: usize) -> Self {
        Self {
            cells: (0..n).map(|_| UnsafeCell::new(VertexForces::default())).collect(),
        }
    }

    /// Read the forces of vertex `v`.
    ///
    /// # Safety
    /// `v` must not be concurrently written (a frozen vertex, or a
    /// vertex in the calling worker's own range).
    #[inline]
    unsafe fn get(&self, v: usize) -> VertexForces {
        unsafe { *self.cells[v].get() }
    }

    /// Write the forces of vertex `v`.
    ///
    /// # Safety
    /// `v` must be owned by the caller: in the calling worker's range,
    /// or frozen and written from the coordinator's serial pre-pass.
    #[inline]
    unsafe fn set(&self, v: usize, forces: VertexForces) {
        unsafe {
            *self.cells[v].get() = forces;
        }
    }

    fn into_vec(self) -> Vec<VertexForces> {
        self.cells.into_iter().map(UnsafeCell::into_inner).collect()
    }
}

struct MorphKernel<'a> {
    target: MorphTarget,
    linear_force: f32,
    angular_force: f32,
    step_size: f32,
    no_morph_neighbor_step_size: f32,
    crossover_correction: bool,
    sphere_radius: f32,
    table: &'a NeighborTable,
    should_morph: &'a [bool],
    all_morphed: bool,
    forces: ForceTable,
}

impl MorphKernel<'_> {
    #[inline]
    fn position(coords: &[f32], v: usize) -> Vec3 {
        Vec3::new(coords[v * 3], coords[v * 3 + 1], coords[v * 3 + 2])
    }

    /// Linear force on `vertex` from neighbor `k`.
    fn linear_force_from(
        &self,
        input: &[f32],
        info: &NeighborInfo,
        vertex: usize,
        neighbor: usize,
        k: usize,
    ) -> Vec3 {
        let node = Self::position(input, vertex);
        let neighbor_pos = Self::position(input, neighbor);

        let distance = node.distance(neighbor_pos);
        if distance < MIN_EDGE_LENGTH {
            return Vec3::ZERO;
        }

        let baseline = info.baseline_distance[k];
        let mut error = baseline - distance;

        let ratio = if baseline != 0.0 {
            distance / baseline
        } else {
            0.0
        };
        // Strongly resist over-compression.
        if ratio < 0.5 {
            error *= 2.0;
        }
        error *= self.linear_force;

        // Push this vertex relative to its neighbor.
        (node - neighbor_pos) * (error / distance)
    }

    /// Angular force on the vertex from its fan corner `k`
    /// (neighbors `k` and `k+1`).
    fn angular_force_from(&self, input: &[f32], info: &NeighborInfo, k: usize) -> Vec3 {
        let count = info.neighbor_count();
        if count < 1 {
            return Vec3::ZERO;
        }

        let neighbor = info.neighbors[k] as usize;
        let next = info.neighbors[(k + 1) % count] as usize;

        let node = Self::position(input, info.vertex as usize);
        let neighbor_pos = Self::position(input, neighbor);
        let next_pos = Self::position(input, next);

        let mut normal = triangle_normal(node, neighbor_pos, next_pos);

        let mut crossover = detect_crossover(self.target, node, neighbor_pos, next_pos, normal);
        if !self.crossover_correction {
            crossover = false;
        }
        if crossover {
            normal = -normal;
        }

        let mut out = Vec3::ZERO;

        // Corner at the first neighbor.
        let angle = interior_angle(node, neighbor_pos, next_pos);
        let diff = if crossover {
            info.angle_at_neighbor[k] + angle
        } else {
            info.angle_at_neighbor[k] - angle
        };
        let edge = neighbor_pos - node;
        let magnitude = edge.length() * diff.sin();
        let direction = normalized_cross(edge, normal);
        if direction.length_squared() > 0.0 {
            let mut force = direction * (self.angular_force * magnitude);
            if crossover {
                force = -force;
            }
            out += force;
        }

        // Corner at the next neighbor.
        let angle = interior_angle(neighbor_pos, next_pos, node);
        let diff = if crossover {
            info.angle_at_next[k] + angle
        } else {
            info.angle_at_next[k] - angle
        };
        let edge = next_pos - node;
        let magnitude = edge.length() * diff.sin();
        let direction = normalized_cross(normal, edge);
        if direction.length_squared() > 0.0 {
            let mut force = direction * (self.angular_force * magnitude);
            if crossover {
                force = -force;
            }
            out += force;
        }

        out
    }

    /// Combined forces on one vertex, including the inverse-force
    /// corrections from frozen neighbors when `with_inverse` is set.
    ///
    /// # Safety
    /// Caller must own `vertex` in the force table's protocol sense.
    unsafe fn accumulate_forces(
        &self,
        input: &[f32],
        info: &NeighborInfo,
        vertex: usize,
        with_inverse: bool,
    ) -> VertexForces {
        let mut forces = VertexForces::default();
        let count = info.neighbor_count();
        let divisor = count as f32;

        if self.linear_force > 0.0 {
            for (k, &neighbor) in info.neighbors.iter().enumerate() {
                let neighbor = neighbor as usize;
                let component = self.linear_force_from(input, info, vertex, neighbor, k) / divisor;
                forces.total += component;
                forces.linear += component;

                if with_inverse && !self.should_morph[neighbor] {
                    // Frozen vertices are only written by the serial
                    // pre-pass, so this cross-range read is safe.
                    let inverse = unsafe { self.forces.get(neighbor) }.linear
                        * (self.no_morph_neighbor_step_size / divisor);
                    forces.total -= inverse;
                    forces.linear -= inverse;
                }
            }
        }

        if self.angular_force > 0.0 {
            if info.classification == VertexClass::Corner {
                // A corner sees a single triangle; halve the averaging
                // denominator instead of walking the (absent) fan.
                let component = self.angular_force_from(input, info, 0) / (divisor - 1.0);
                forces.total += component;
                forces.angular += component;
            } else {
                for (k, &neighbor) in info.neighbors.iter().enumerate() {
                    let neighbor = neighbor as usize;
                    let component = self.angular_force_from(input, info, k) / divisor;
                    forces.total += component;
                    forces.angular += component;

                    if with_inverse && !self.should_morph[neighbor] {
                        let inverse = unsafe { self.forces.get(neighbor) }.angular
                            * (self.no_morph_neighbor_step_size / divisor);
                        forces.total -= inverse;
                        forces.angular -= inverse;
                    }
                }
            }
        }

        forces
    }
}

impl RelaxKernel for MorphKernel<'_> {
    /// Refresh forces on frozen vertices. Their movable neighbors read
    /// these during the parallel phase, so they cannot be computed
    /// inside it.
    fn begin_iteration(&self, input: &[f32]) {
        if self.all_morphed {
            return;
        }
        for (vertex, info) in self.table.info.iter().enumerate() {
            if self.should_morph[vertex] {
                continue;
            }
            let forces = if info.neighbor_count() > 1 {
                // Workers are parked; the coordinator owns every cell.
                unsafe { self.accumulate_forces(input, info, vertex, false) }
            } else {
                VertexForces::default()
            };
            unsafe { self.forces.set(vertex, forces) };
        }
    }

    fn relax_range(
        &self,
        _pass: &IterationPass,
        range: std::ops::Range<usize>,
        input: &[f32],
        output: &mut OutputCoords,
    ) {
        for vertex in range {
            let position = Self::position(input, vertex);
            let mut new_position = position;

            let info = &self.table.info[vertex];
            if info.neighbor_count() > 1 && self.should_morph[vertex] {
                // This worker owns `vertex`; cross-range reads inside
                // touch only frozen vertices.
                let mut forces = unsafe { self.accumulate_forces(input, info, vertex, true) };

                // On a sphere, forces act in the tangent plane.
                if self.target == MorphTarget::Spherical {
                    forces.total = project_to_tangent(position, forces.total);
                    forces.angular = project_to_tangent(position, forces.angular);
                    forces.linear = project_to_tangent(position, forces.linear);
                }

                unsafe { self.forces.set(vertex, forces) };
                new_position = position + forces.total * self.step_size;
            }

            if self.target == MorphTarget::Spherical && info.neighbor_count() > 0 {
                let radius = new_position.length();
                if radius > 0.0 {
                    new_position *= self.sphere_radius / radius;
                }
            }

            output.write(vertex, new_position);
        }
    }
}

/// Remove the radial component of `force` at a point on a sphere
/// about the origin.
fn project_to_tangent(position: Vec3, force: Vec3) -> Vec3 {
    let normal = position.normalize_or_zero();
    force - normal * normal.dot(force)
}

/// Has this fan triangle flipped relative to the outward reference
/// direction? Flat surfaces compare against +Z; spherical surfaces
/// against the triangle's averaged radial direction.
fn detect_crossover(
    target: MorphTarget,
    node: Vec3,
    neighbor: Vec3,
    next: Vec3,
    normal: Vec3,
) -> bool {
    match target {
        MorphTarget::Flat => normal.z < 0.0,
        MorphTarget::Spherical => {
            let outward = ((node + neighbor + next) / 3.0).normalize_or_zero();
            outward.length_squared() > 0.0 && outward.dot(normal) < 0.0
        }
    }
}
