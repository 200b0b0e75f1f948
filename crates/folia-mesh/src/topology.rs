//! Mesh topology queries.
//!
//! Builds adjacency data structures from the triangle index buffer:
//! per-vertex neighbor lists (optionally ordered to follow the triangle
//! fan), per-vertex incident-triangle lists, boundary-edge counts, and
//! vertex classification.
//!
//! The helper is a snapshot: it is built once from a triangle set and
//! must be rebuilt (never patched) if the triangles change.

use std::collections::HashMap;

/// Classification of a vertex by its local connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexClass {
    /// Surrounded by a closed triangle fan.
    Interior,
    /// Touches at least one boundary edge of an open surface.
    Edge,
    /// Participates in exactly one triangle.
    Corner,
    /// Participates in no triangle at all. Never relaxed, never
    /// divides by its neighbor count.
    Disconnected,
}

/// Half-edge record used while fan-sorting a vertex's neighbors.
#[derive(Debug, Clone, Copy)]
struct FanEdge {
    /// Neighbor reached first when walking this triangle's winding.
    a: u32,
    /// Neighbor reached second.
    b: u32,
    /// The triangle that contributed this edge.
    tile: u32,
}

/// Precomputed topology information for a triangle set.
#[derive(Debug, Clone)]
pub struct TopologyHelper {
    neighbors: Vec<Vec<u32>>,
    vertex_triangles: Vec<Vec<u32>>,
    boundary_edge_counts: Vec<u32>,
    classification: Vec<VertexClass>,
    max_neighbors: usize,
    sorted: bool,
}

impl TopologyHelper {
    /// Build topology for `vertex_count` vertices from a flat triangle
    /// index buffer.
    ///
    /// With `sort_neighbors`, each vertex's neighbor list follows the
    /// triangle fan around the vertex, starting from a boundary edge
    /// when the fan is open. The morphing and areal-smoothing kernels
    /// require this ordering: they walk "this neighbor, next neighbor"
    /// pairs assuming consistent winding.
    pub fn build(triangles: &[u32], vertex_count: usize, sort_neighbors: bool) -> Self {
        let tri_count = triangles.len() / 3;

        let mut vertex_triangles: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        let mut neighbors: Vec<Vec<u32>> = vec![Vec::new(); vertex_count];
        let mut fans: Vec<Vec<FanEdge>> = if sort_neighbors {
            vec![Vec::new(); vertex_count]
        } else {
            Vec::new()
        };

        // Edge → incident-triangle count, keyed by canonical vertex pair.
        let mut edge_tiles: HashMap<(u32, u32), u32> = HashMap::new();

        for t in 0..tri_count {
            let n1 = triangles[t * 3];
            let n2 = triangles[t * 3 + 1];
            let n3 = triangles[t * 3 + 2];

            vertex_triangles[n1 as usize].push(t as u32);
            vertex_triangles[n2 as usize].push(t as u32);
            vertex_triangles[n3 as usize].push(t as u32);

            if sort_neighbors {
                fans[n1 as usize].push(FanEdge { a: n2, b: n3, tile: t as u32 });
                fans[n2 as usize].push(FanEdge { a: n3, b: n1, tile: t as u32 });
                fans[n3 as usize].push(FanEdge { a: n1, b: n2, tile: t as u32 });
            } else {
                add_neighbor(&mut neighbors[n1 as usize], n2);
                add_neighbor(&mut neighbors[n1 as usize], n3);
                add_neighbor(&mut neighbors[n2 as usize], n1);
                add_neighbor(&mut neighbors[n2 as usize], n3);
                add_neighbor(&mut neighbors[n3 as usize], n1);
                add_neighbor(&mut neighbors[n3 as usize], n2);
            }

            for (u, v) in [(n1, n2), (n2, n3), (n3, n1)] {
                let key = if u < v { (u, v) } else { (v, u) };
                *edge_tiles.entry(key).or_insert(0) += 1;
            }
        }

        if sort_neighbors {
            for (v, fan) in fans.iter().enumerate() {
                let (ordered, tiles) = sort_fan(fan);
                neighbors[v] = ordered;
                vertex_triangles[v] = tiles;
            }
        }

        let mut boundary_edge_counts = vec![0u32; vertex_count];
        for (&(u, v), &count) in &edge_tiles {
            if count == 1 {
                boundary_edge_counts[u as usize] += 1;
                boundary_edge_counts[v as usize] += 1;
            }
        }

        let classification = (0..vertex_count)
            .map(|v| {
                if vertex_triangles[v].is_empty() {
                    VertexClass::Disconnected
                } else if vertex_triangles[v].len() == 1 {
                    VertexClass::Corner
                } else if boundary_edge_counts[v] > 0 {
                    VertexClass::Edge
                } else {
                    VertexClass::Interior
                }
            })
            .collect();

        let max_neighbors = neighbors.iter().map(Vec::len).max().unwrap_or(0);

        Self {
            neighbors,
            vertex_triangles,
            boundary_edge_counts,
            classification,
            max_neighbors,
            sorted: sort_neighbors,
        }
    }

    /// Whether vertex `v` participates in any triangle.
    pub fn has_neighbors(&self, v: usize) -> bool {
        self.neighbors.get(v).is_some_and(|n| !n.is_empty())
    }

    /// Neighbor vertex indices of `v`. Fan-ordered when the helper was
    /// built with sorting. Empty for out-of-range or disconnected
    /// vertices.
    pub fn neighbors(&self, v: usize) -> &[u32] {
        self.neighbors.get(v).map_or(&[], Vec::as_slice)
    }

    /// Number of neighbors of `v`.
    pub fn neighbor_count(&self, v: usize) -> usize {
        self.neighbors(v).len()
    }

    /// Triangles incident on `v`. Aligned with the neighbor fan when
    /// the helper was built with sorting.
    pub fn incident_triangles(&self, v: usize) -> &[u32] {
        self.vertex_triangles.get(v).map_or(&[], Vec::as_slice)
    }

    /// Largest neighbor count over all vertices.
    pub fn max_neighbor_count(&self) -> usize {
        self.max_neighbors
    }

    /// Classification of vertex `v`.
    pub fn classification(&self, v: usize) -> VertexClass {
        self.classification
            .get(v)
            .copied()
            .unwrap_or(VertexClass::Disconnected)
    }

    /// Per-vertex count of boundary edges (edges used by exactly one
    /// triangle).
    pub fn boundary_edge_counts(&self) -> &[u32] {
        &self.boundary_edge_counts
    }

    /// Whether neighbor lists follow the triangle fan.
    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Number of vertices the helper was built over.
    pub fn vertex_count(&self) -> usize {
        self.neighbors.len()
    }
}

fn add_neighbor(list: &mut Vec<u32>, n: u32) {
    if !list.contains(&n) {
        list.push(n);
    }
}

/// Order a vertex's half-edges into a walk around its triangle fan.
///
/// Vertices on the boundary of an open surface must start from the
/// half-edge whose first node appears in no other half-edge; this holds
/// whenever the triangles are consistently wound. Closed fans can start
/// anywhere.
fn sort_fan(fan: &[FanEdge]) -> (Vec<u32>, Vec<u32>) {
    if fan.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut start = None;
    for (k, edge) in fan.iter().enumerate() {
        let elsewhere = fan
            .iter()
            .enumerate()
            .any(|(m, other)| m != k && (other.a == edge.a || other.b == edge.a));
        if !elsewhere && start.is_none() {
            start = Some(k);
        }
    }
    let start = start.unwrap_or(0);

    let mut ordered = Vec::with_capacity(fan.len() + 1);
    let mut tiles = Vec::with_capacity(fan.len());

    let first = fan[start].a;
    let mut current = fan[start].a;
    let mut next = fan[start].b;
    ordered.push(current);
    tiles.push(fan[start].tile);

    for _ in 1..fan.len() {
        ordered.push(next);
        // The continuing half-edge contains `next` but not `current`.
        let continuation = fan.iter().find(|e| {
            (e.a == next && e.b != current) || (e.b == next && e.a != current)
        });
        match continuation {
            Some(e) => {
                tiles.push(e.tile);
                let other = if e.a == next { e.b } else { e.a };
                current = next;
                next = other;
            }
            None => {
                return (ordered, tiles);
            }
        }
    }

    // Open fans end on a neighbor that never restarts the walk.
    if next != first {
        ordered.push(next);
    }

    (ordered, tiles)
}
