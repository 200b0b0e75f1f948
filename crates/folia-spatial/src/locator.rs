//! Nearest-point and radius queries over a mesh's vertex set.
//!
//! Vertices are binned into a uniform grid once at construction.
//! Nearest-point queries expand outward in cell shells from the query
//! cell; radius queries visit the cells overlapping the search sphere.
//!
//! Callers sometimes insert new vertices into a live mesh (e.g.
//! subdivision) after building the locator. Rebuilding the grid each
//! time would be expensive, so with `allow_appends` the queries also
//! brute-force scan every vertex at or beyond the original count and
//! merge the two results. Appends are typically few relative to the
//! indexed set, so the linear scan stays cheap.

use std::collections::HashMap;

use glam::Vec3;

use folia_mesh::{SurfaceMesh, TopologyHelper};

/// Target mean number of points per grid cell.
const POINTS_PER_CELL: f32 = 8.0;

/// Immutable spatial index over a fixed subset of a mesh's vertices.
pub struct PointLocator {
    /// Cell key → indices into `points`.
    grid: HashMap<(i32, i32, i32), Vec<u32>>,
    /// Snapshot of the indexed positions and their mesh vertex index.
    points: Vec<(Vec3, u32)>,
    cell_size: f32,
    /// Inclusive cell-key bounds of the occupied grid.
    key_min: (i32, i32, i32),
    key_max: (i32, i32, i32),
    /// Vertex count of the mesh at build time.
    original_vertex_count: usize,
    allow_appends: bool,
}

impl PointLocator {
    /// Build a locator over `mesh`'s vertices.
    ///
    /// - `limit_to_connected` — index only vertices that participate in
    ///   at least one triangle.
    /// - `allow_appends` — queries additionally scan vertices appended
    ///   to the mesh after construction.
    /// - `vertex_mask` — when given, index only vertices whose mask
    ///   entry is true (applied on top of the connectivity filter).
    pub fn build(
        mesh: &SurfaceMesh,
        limit_to_connected: bool,
        allow_appends: bool,
        vertex_mask: Option<&[bool]>,
    ) -> Self {
        let n = mesh.vertex_count();

        let topology = if limit_to_connected {
            Some(TopologyHelper::build(&mesh.triangles, n, false))
        } else {
            None
        };

        let mut points: Vec<(Vec3, u32)> = Vec::new();
        for v in 0..n {
            if let Some(topology) = &topology {
                if !topology.has_neighbors(v) {
                    continue;
                }
            }
            if let Some(mask) = vertex_mask {
                if !mask.get(v).copied().unwrap_or(false) {
                    continue;
                }
            }
            points.push((mesh.position(v), v as u32));
        }

        let (cell_size, key_min, key_max, grid) = build_grid(&points);

        tracing::debug!(
            indexed = points.len(),
            total = n,
            cell_size,
            "point locator built"
        );

        Self {
            grid,
            points,
            cell_size,
            key_min,
            key_max,
            original_vertex_count: n,
            allow_appends,
        }
    }

    /// Number of indexed points.
    pub fn indexed_count(&self) -> usize {
        self.points.len()
    }

    /// Mesh vertex nearest to `xyz` by Euclidean distance.
    ///
    /// `mesh` must be the surface the locator was built over; with
    /// `allow_appends` it may have grown since, and the appended
    /// vertices compete with the indexed set. Returns `None` only when
    /// the locator indexed no points and no vertices were appended.
    pub fn nearest_point(&self, mesh: &SurfaceMesh, xyz: Vec3) -> Option<u32> {
        let mut best: Option<(f32, u32)> = self.nearest_indexed(xyz);

        if self.allow_appends && mesh.vertex_count() > self.original_vertex_count {
            for v in self.original_vertex_count..mesh.vertex_count() {
                let dist_sq = mesh.position(v).distance_squared(xyz);
                if best.map_or(true, |(d, _)| dist_sq < d) {
                    best = Some((dist_sq, v as u32));
                }
            }
        }

        best.map(|(_, v)| v)
    }

    /// All vertices within `radius` of `xyz`, unordered.
    ///
    /// Follows the same two-source merge policy as [`nearest_point`]:
    /// indexed vertices come from the grid, appended vertices from a
    /// linear scan.
    ///
    /// [`nearest_point`]: PointLocator::nearest_point
    pub fn points_within_radius(&self, mesh: &SurfaceMesh, xyz: Vec3, radius: f32) -> Vec<u32> {
        let mut found = Vec::new();
        let radius_sq = radius * radius;

        if !self.points.is_empty() {
            let lo = self.cell_of(xyz - Vec3::splat(radius));
            let hi = self.cell_of(xyz + Vec3::splat(radius));
            for cx in lo.0..=hi.0 {
                for cy in lo.1..=hi.1 {
                    for cz in lo.2..=hi.2 {
                        if let Some(slots) = self.grid.get(&(cx, cy, cz)) {
                            for &slot in slots {
                                let (p, v) = self.points[slot as usize];
                                if p.distance_squared(xyz) <= radius_sq {
                                    found.push(v);
                                }
                            }
                        }
                    }
                }
            }
        }

        if self.allow_appends && mesh.vertex_count() > self.original_vertex_count {
            for v in self.original_vertex_count..mesh.vertex_count() {
                if mesh.position(v).distance_squared(xyz) <= radius_sq {
                    found.push(v as u32);
                }
            }
        }

        found
    }

    /// Nearest indexed point as `(distance², vertex)`.
    fn nearest_indexed(&self, xyz: Vec3) -> Option<(f32, u32)> {
        if self.points.is_empty() {
            return None;
        }

        let center = self.cell_of(xyz);

        // Farthest occupied cell from the query, in Chebyshev rings.
        let max_ring = [
            (center.0 - self.key_min.0).abs(),
            (self.key_max.0 - center.0).abs(),
            (center.1 - self.key_min.1).abs(),
            (self.key_max.1 - center.1).abs(),
            (center.2 - self.key_min.2).abs(),
            (self.key_max.2 - center.2).abs(),
        ]
        .into_iter()
        .max()
        .unwrap_or(0);

        let mut best: Option<(f32, u32)> = None;

        for ring in 0..=max_ring {
            // Cells in ring `ring` lie at least (ring - 1) cell sizes
            // from any point inside the center cell; once that bound
            // exceeds the best hit, farther rings cannot improve it.
            if let Some((best_dist_sq, _)) = best {
                let lower_bound = (ring - 1).max(0) as f32 * self.cell_size;
                if lower_bound * lower_bound > best_dist_sq {
                    break;
                }
            }

            self.scan_ring(center, ring, |slot| {
                let (p, v) = self.points[slot as usize];
                let dist_sq = p.distance_squared(xyz);
                if best.map_or(true, |(d, _)| dist_sq < d) {
                    best = Some((dist_sq, v));
                }
            });
        }

        best
    }

    /// Visit every indexed point in cells at Chebyshev distance `ring`
    /// from `center`.
    fn scan_ring(&self, center: (i32, i32, i32), ring: i32, mut visit: impl FnMut(u32)) {
        for dx in -ring..=ring {
            for dy in -ring..=ring {
                for dz in -ring..=ring {
                    if dx.abs().max(dy.abs()).max(dz.abs()) != ring {
                        continue;
                    }
                    let key = (center.0 + dx, center.1 + dy, center.2 + dz);
                    if let Some(slots) = self.grid.get(&key) {
                        for &slot in slots {
                            visit(slot);
                        }
                    }
                }
            }
        }
    }

    fn cell_of(&self, p: Vec3) -> (i32, i32, i32) {
        let inv = 1.0 / self.cell_size;
        (
            (p.x * inv).floor() as i32,
            (p.y * inv).floor() as i32,
            (p.z * inv).floor() as i32,
        )
    }
}

/// Bin the points into a uniform grid sized for a target points-per-cell
/// density.
#[allow(clippy::type_complexity)]
fn build_grid(
    points: &[(Vec3, u32)],
) -> (
    f32,
    (i32, i32, i32),
    (i32, i32, i32),
    HashMap<(i32, i32, i32), Vec<u32>>,
) {
    if points.is_empty() {
        return (1.0, (0, 0, 0), (0, 0, 0), HashMap::new());
    }

    let mut min = Vec3::splat(f32::MAX);
    let mut max = Vec3::splat(f32::MIN);
    for &(p, _) in points {
        min = min.min(p);
        max = max.max(p);
    }

    let extent = (max - min).max_element().max(1.0e-6);
    let cells_per_axis = ((points.len() as f32 / POINTS_PER_CELL).cbrt().ceil()).max(1.0);
    let cell_size = (extent / cells_per_axis).max(1.0e-6);

    let inv = 1.0 / cell_size;
    let mut grid: HashMap<(i32, i32, i32), Vec<u32>> = HashMap::new();
    let mut key_min = (i32::MAX, i32::MAX, i32::MAX);
    let mut key_max = (i32::MIN, i32::MIN, i32::MIN);

    for (slot, &(p, _)) in points.iter().enumerate() {
        let key = (
            (p.x * inv).floor() as i32,
            (p.y * inv).floor() as i32,
            (p.z * inv).floor() as i32,
        );
        key_min = (key_min.0.min(key.0), key_min.1.min(key.1), key_min.2.min(key.2));
        key_max = (key_max.0.max(key.0), key_max.1.max(key.1), key_max.2.max(key.2));
        grid.entry(key).or_default().push(slot as u32);
    }

    (cell_size, key_min, key_max, grid)
}
