//! Barycentric projection of arbitrary 3D points onto a surface.
//!
//! The projector finds the vertex nearest a query point, then tests
//! the triangles around that vertex (and optionally around its
//! topological neighbors) for containment using a signed-area test
//! appropriate to the surface shape. A slightly negative area
//! tolerance accepts points exactly on an edge or vertex as degenerate
//! hits instead of rejecting them.

use std::collections::HashSet;

use glam::Vec3;

use folia_math::{
    ray_intersect_plane, signed_area_2d, signed_area_3d, signed_distance_to_plane,
    triangle_normal,
};
use folia_mesh::{SurfaceMesh, TopologyHelper};
use folia_types::constants::{ON_VERTEX_TOLERANCE_SQ, TILE_AREA_TOLERANCE};

use crate::locator::PointLocator;

/// Shape hint selecting the containment test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceHint {
    /// Flat surface in the XY plane: 2D signed-area test on X/Y only.
    Flat,
    /// Sphere centered at the origin: the query is carried along the
    /// ray from the origin onto each candidate triangle's plane before
    /// testing. Valid because spherical meshes are star-shaped from
    /// the origin.
    Sphere,
    /// Anything else: the query is orthogonally projected onto each
    /// candidate triangle's plane and tested against the triangle's
    /// own normal.
    Other,
}

/// Tunable tolerances for the projection search.
#[derive(Debug, Clone, Copy)]
pub struct ProjectorConfig {
    /// Squared distance under which a query counts as "on" the nearest
    /// vertex.
    pub on_vertex_tolerance_sq: f32,
    /// Signed-area tolerance for the per-edge containment test.
    /// Slightly negative so boundary points are accepted as
    /// degenerate.
    pub tile_area_tolerance: f32,
}

impl Default for ProjectorConfig {
    fn default() -> Self {
        Self {
            on_vertex_tolerance_sq: ON_VERTEX_TOLERANCE_SQ,
            tile_area_tolerance: TILE_AREA_TOLERANCE,
        }
    }
}

/// Result of a barycentric projection.
#[derive(Debug, Clone, Copy)]
pub struct BarycentricProjection {
    /// Vertex nearest the query point, if the surface had any.
    pub nearest_vertex: Option<u32>,
    /// The enclosing triangle, or `None` when the search exhausted.
    pub triangle: Option<u32>,
    /// The triangle's vertices. For an on-vertex degenerate hit the
    /// nearest vertex is repeated three times.
    pub vertices: [u32; 3],
    /// Barycentric weights, one per edge of the triangle. `[0, 1, 0]`
    /// for an on-vertex hit.
    pub weights: [f32; 3],
    /// True when the point landed exactly on an edge or vertex.
    pub degenerate: bool,
}

/// Result of a nearest-tile projection: a barycentric hit when the
/// point lands in a triangle, otherwise the searched triangle whose
/// plane passes closest.
#[derive(Debug, Clone, Copy)]
pub struct NearestTileProjection {
    /// The chosen triangle; `None` only when the mesh has no
    /// triangles.
    pub triangle: Option<u32>,
    pub vertices: [u32; 3],
    pub weights: [f32; 3],
    /// True when the barycentric projection landed inside the
    /// triangle, false when the result is the nearest-plane fallback.
    pub inside: bool,
    /// Signed distance from the query point to the triangle's plane
    /// (positive above, by the triangle's normal).
    pub signed_distance: f32,
    /// `|signed_distance|`.
    pub distance: f32,
    /// `normal * signed_distance`.
    pub offset: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SearchStatus {
    NotFound,
    FoundDegenerate,
    Found,
}

struct SearchState {
    status: SearchStatus,
    visited: HashSet<u32>,
    tile: u32,
    nodes: [u32; 3],
    areas: [f32; 3],
}

/// Projects points onto a surface via a point locator and the mesh
/// topology. Built once; the locator and topology snapshot are
/// immutable afterwards.
pub struct PointProjector {
    locator: PointLocator,
    topology: TopologyHelper,
    hint: SurfaceHint,
    config: ProjectorConfig,
}

impl PointProjector {
    /// Build a projector for `mesh`.
    ///
    /// Set `mesh_may_grow` if vertices will be appended to the mesh
    /// after construction (see the locator's append mode). An `Other`
    /// hint is downgraded to `Flat` when every vertex has z == 0,
    /// which makes the cheaper 2D test valid.
    pub fn new(mesh: &SurfaceMesh, hint: SurfaceHint, mesh_may_grow: bool) -> Self {
        Self::with_config(mesh, hint, mesh_may_grow, ProjectorConfig::default())
    }

    /// As [`new`](PointProjector::new), with explicit tolerances.
    pub fn with_config(
        mesh: &SurfaceMesh,
        hint: SurfaceHint,
        mesh_may_grow: bool,
        config: ProjectorConfig,
    ) -> Self {
        let mut hint = hint;
        if hint == SurfaceHint::Other {
            let flat = (0..mesh.vertex_count()).all(|v| mesh.coords[v * 3 + 2] == 0.0);
            if flat {
                hint = SurfaceHint::Flat;
            }
        }

        Self {
            locator: PointLocator::build(mesh, true, mesh_may_grow, None),
            topology: TopologyHelper::build(&mesh.triangles, mesh.vertex_count(), false),
            hint,
            config,
        }
    }

    /// Vertex nearest the query point.
    pub fn project_to_nearest_vertex(&self, mesh: &SurfaceMesh, xyz: Vec3) -> Option<u32> {
        self.locator.nearest_point(mesh, xyz)
    }

    /// Project `xyz` into a triangle of the surface.
    ///
    /// Tests the triangles around the nearest vertex; if none contain
    /// the point and `check_neighbors` is set, widens to the triangles
    /// around each of that vertex's topological neighbors. A query
    /// within tolerance of the nearest vertex that still misses every
    /// triangle reports a degenerate on-vertex hit.
    pub fn project_barycentric(
        &self,
        mesh: &SurfaceMesh,
        xyz: Vec3,
        check_neighbors: bool,
    ) -> BarycentricProjection {
        let mut result = BarycentricProjection {
            nearest_vertex: None,
            triangle: None,
            vertices: [0; 3],
            weights: [0.0; 3],
            degenerate: false,
        };

        let Some(nearest) = self.locator.nearest_point(mesh, xyz) else {
            return result;
        };
        result.nearest_vertex = Some(nearest);

        let mut state = SearchState {
            status: SearchStatus::NotFound,
            visited: HashSet::new(),
            tile: 0,
            nodes: [0; 3],
            areas: [0.0; 3],
        };

        self.check_vertex_tiles(mesh, &mut state, nearest, xyz);

        // A degenerate hit is kept but the search continues: a strictly
        // interior hit in a neighboring triangle wins over a boundary
        // tie.
        if state.status != SearchStatus::Found && check_neighbors {
            for &neighbor in self.topology.neighbors(nearest as usize) {
                self.check_vertex_tiles(mesh, &mut state, neighbor, xyz);
                if state.status == SearchStatus::Found {
                    break;
                }
            }
        }

        if state.status == SearchStatus::NotFound {
            let nearest_pos = mesh.position(nearest as usize);
            if nearest_pos.distance_squared(xyz) <= self.config.on_vertex_tolerance_sq {
                state.status = SearchStatus::FoundDegenerate;
                state.tile = u32::MAX;
                state.nodes = [nearest; 3];
                state.areas = [0.0, 1.0, 0.0];
            }
        }

        match state.status {
            SearchStatus::NotFound => {}
            SearchStatus::Found | SearchStatus::FoundDegenerate => {
                // An on-vertex hit carries no triangle (tile stays at
                // the sentinel); the repeated vertices identify it.
                result.triangle = (state.tile != u32::MAX).then_some(state.tile);
                result.vertices = state.nodes;
                result.weights = state.areas;
                result.degenerate = state.status == SearchStatus::FoundDegenerate;
            }
        }
        result
    }

    /// Project `xyz`, falling back to the searched triangle with the
    /// smallest absolute plane distance when no triangle contains the
    /// point.
    ///
    /// The signed plane distance doubles as "height above/below the
    /// surface" for depth-style measurements.
    pub fn project_barycentric_nearest_tile(
        &self,
        mesh: &SurfaceMesh,
        xyz: Vec3,
    ) -> NearestTileProjection {
        let mut out = NearestTileProjection {
            triangle: None,
            vertices: [0; 3],
            weights: [0.0; 3],
            inside: false,
            signed_distance: 0.0,
            distance: 0.0,
            offset: Vec3::ZERO,
        };

        let Some(nearest) = self.locator.nearest_point(mesh, xyz) else {
            return out;
        };

        let mut state = SearchState {
            status: SearchStatus::NotFound,
            visited: HashSet::new(),
            tile: 0,
            nodes: [0; 3],
            areas: [0.0; 3],
        };

        self.check_vertex_tiles(mesh, &mut state, nearest, xyz);
        if state.status != SearchStatus::Found {
            for &neighbor in self.topology.neighbors(nearest as usize) {
                self.check_vertex_tiles(mesh, &mut state, neighbor, xyz);
                if state.status == SearchStatus::Found {
                    break;
                }
            }
        }

        if state.status != SearchStatus::NotFound {
            let [a, b, c] = triangle_positions(mesh, state.nodes);
            let normal = triangle_normal(a, b, c);
            let signed = signed_distance_to_plane(normal, a, xyz);
            out.triangle = Some(state.tile);
            out.vertices = state.nodes;
            out.weights = state.areas;
            out.inside = true;
            out.signed_distance = signed;
            out.distance = signed.abs();
            out.offset = normal * signed;
            return out;
        }

        // Fallback: nearest plane among every triangle the search
        // visited, still signed.
        for &tile in &state.visited {
            let nodes = mesh.triangle(tile as usize);
            let [a, b, c] = triangle_positions(mesh, nodes);
            let normal = triangle_normal(a, b, c);
            let signed = signed_distance_to_plane(normal, a, xyz);
            if out.triangle.is_none() || signed.abs() < out.distance {
                out.triangle = Some(tile);
                out.vertices = nodes;
                out.signed_distance = signed;
                out.distance = signed.abs();
                out.offset = normal * signed;
            }
        }

        out
    }

    /// Flat-surface variant: choose the "best" triangle around the
    /// nearest vertex by summed squared distances to its three
    /// vertices, then report 2D signed areas against it. Used by flat
    /// multiresolution morphing; only meaningful for flat surfaces.
    pub fn project_barycentric_best_tile_2d(
        &self,
        mesh: &SurfaceMesh,
        xyz: Vec3,
    ) -> Option<BarycentricProjection> {
        let nearest = self.locator.nearest_point(mesh, xyz)?;

        let mut best_tile: Option<u32> = None;
        let mut best_distance = f32::MAX;
        for &tile in self.topology.incident_triangles(nearest as usize) {
            let nodes = mesh.triangle(tile as usize);
            let d1 = mesh.position(nodes[0] as usize).distance_squared(xyz);
            let d2 = mesh.position(nodes[1] as usize).distance_squared(xyz);
            let d3 = mesh.position(nodes[2] as usize).distance_squared(xyz);
            let dist = (d1 * d1 + d2 * d2 + d3 * d3).sqrt();
            if best_tile.is_none() || dist < best_distance {
                best_tile = Some(tile);
                best_distance = dist;
            }
        }

        let tile = best_tile?;
        let nodes = mesh.triangle(tile as usize);
        let [a, b, c] = triangle_positions(mesh, nodes);
        Some(BarycentricProjection {
            nearest_vertex: Some(nearest),
            triangle: Some(tile),
            vertices: nodes,
            weights: [
                signed_area_2d(a, xyz, b),
                signed_area_2d(b, xyz, c),
                signed_area_2d(c, xyz, a),
            ],
            degenerate: false,
        })
    }

    /// Test every unvisited triangle around `vertex` for containment.
    fn check_vertex_tiles(
        &self,
        mesh: &SurfaceMesh,
        state: &mut SearchState,
        vertex: u32,
        xyz: Vec3,
    ) {
        for &tile in self.topology.incident_triangles(vertex as usize) {
            self.check_tile(mesh, state, tile, xyz);
            if state.status == SearchStatus::Found {
                break;
            }
        }
    }

    /// Containment test for one triangle, recording a hit in `state`.
    fn check_tile(&self, mesh: &SurfaceMesh, state: &mut SearchState, tile: u32, xyz: Vec3) {
        if !state.visited.insert(tile) {
            return;
        }

        let nodes = mesh.triangle(tile as usize);
        let [p1, p2, p3] = triangle_positions(mesh, nodes);

        let (normal, query) = match self.hint {
            SurfaceHint::Flat => (Vec3::Z, xyz),
            SurfaceHint::Sphere => {
                // Carry the query along the ray from the origin onto
                // the triangle's plane.
                let Some((intersection, _)) = ray_intersect_plane(p1, p2, p3, Vec3::ZERO, xyz)
                else {
                    return;
                };
                (triangle_normal(p1, p2, p3), intersection)
            }
            SurfaceHint::Other => {
                let normal = triangle_normal(p1, p2, p3);
                let query = xyz - normal * signed_distance_to_plane(normal, p1, xyz);
                (normal, query)
            }
        };

        if let Some((areas, strict)) = self.triangle_areas(p1, p2, p3, normal, query) {
            state.status = if strict {
                SearchStatus::Found
            } else {
                SearchStatus::FoundDegenerate
            };
            state.tile = tile;
            state.nodes = nodes;
            state.areas = areas;
        }
    }

    /// Signed areas of the three corner triangles formed by the query
    /// point against each edge.
    ///
    /// Returns `Some((areas, strict))` when the point is inside;
    /// `strict` is false when any area only passed the (negative)
    /// tolerance, meaning the point sits on an edge or vertex. Returns
    /// `None` when the point is outside.
    fn triangle_areas(
        &self,
        p1: Vec3,
        p2: Vec3,
        p3: Vec3,
        normal: Vec3,
        query: Vec3,
    ) -> Option<([f32; 3], bool)> {
        let tolerance = self.config.tile_area_tolerance;

        let (areas, triangle_area) = match self.hint {
            SurfaceHint::Flat => {
                let a1 = signed_area_2d(p1, p2, query);
                if a1 <= tolerance {
                    return None;
                }
                let a2 = signed_area_2d(p2, p3, query);
                if a2 <= tolerance {
                    return None;
                }
                let a3 = signed_area_2d(p3, p1, query);
                if a3 <= tolerance {
                    return None;
                }
                ([a1, a2, a3], signed_area_2d(p1, p2, p3))
            }
            SurfaceHint::Sphere | SurfaceHint::Other => {
                let a1 = signed_area_3d(normal, p1, p2, query);
                if a1 < tolerance {
                    return None;
                }
                let a2 = signed_area_3d(normal, p2, p3, query);
                if a2 < tolerance {
                    return None;
                }
                let a3 = signed_area_3d(normal, p3, p1, query);
                if a3 < tolerance {
                    return None;
                }
                ([a1, a2, a3], folia_math::triangle_area(p1, p2, p3))
            }
        };

        let strict = areas.iter().all(|&a| a > 0.0);
        let mut areas = areas.map(f32::abs);
        if triangle_area <= 0.0 {
            // All three corners coincide; weight the first vertex.
            areas = [1.0, 0.0, 0.0];
        }
        Some((areas, strict))
    }
}

/// Map barycentric weights back to a 3D point.
///
/// The weights are per-edge areas, so vertex `k` is weighted by the
/// area opposite it: `[w1, w2, w0]` against `[v0, v1, v2]`. Degenerates
/// to the first vertex when the weights sum to zero.
pub fn unproject_point(vertices: [Vec3; 3], weights: [f32; 3]) -> Vec3 {
    let total = weights[0] + weights[1] + weights[2];
    if total != 0.0 {
        (vertices[0] * weights[1] + vertices[1] * weights[2] + vertices[2] * weights[0]) / total
    } else {
        vertices[0]
    }
}

fn triangle_positions(mesh: &SurfaceMesh, nodes: [u32; 3]) -> [Vec3; 3] {
    [
        mesh.position(nodes[0] as usize),
        mesh.position(nodes[1] as usize),
        mesh.position(nodes[2] as usize),
    ]
}
