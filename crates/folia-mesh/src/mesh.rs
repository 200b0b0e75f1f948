//! Core surface mesh type.
//!
//! Coordinates are stored interleaved (`[x0, y0, z0, x1, y1, z1, ...]`)
//! so a whole position buffer can be handed to the relaxation engine's
//! double-buffering as a single slice.

use glam::Vec3;

use folia_math::triangle_area;
use folia_types::{FoliaError, FoliaResult};

/// A triangulated surface: vertex positions plus triangle connectivity.
///
/// The coordinate buffer has length `3 * vertex_count`; the index
/// buffer has length `3 * triangle_count` with each consecutive triple
/// naming one triangle's vertices.
#[derive(Debug, Clone)]
pub struct SurfaceMesh {
    /// Interleaved vertex coordinates.
    pub coords: Vec<f32>,
    /// Triangle vertex indices, flat: `[t0v0, t0v1, t0v2, t1v0, ...]`.
    pub triangles: Vec<u32>,
}

impl SurfaceMesh {
    /// Wrap caller-provided buffers, validating their consistency.
    pub fn new(coords: Vec<f32>, triangles: Vec<u32>) -> FoliaResult<Self> {
        let mesh = Self { coords, triangles };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.coords.len() / 3
    }

    /// Number of triangles.
    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len() / 3
    }

    /// The vertex indices of triangle `t`.
    #[inline]
    pub fn triangle(&self, t: usize) -> [u32; 3] {
        [
            self.triangles[t * 3],
            self.triangles[t * 3 + 1],
            self.triangles[t * 3 + 2],
        ]
    }

    /// Position of vertex `v`.
    #[inline]
    pub fn position(&self, v: usize) -> Vec3 {
        Vec3::new(
            self.coords[v * 3],
            self.coords[v * 3 + 1],
            self.coords[v * 3 + 2],
        )
    }

    /// Overwrite the position of vertex `v`.
    #[inline]
    pub fn set_position(&mut self, v: usize, p: Vec3) {
        self.coords[v * 3] = p.x;
        self.coords[v * 3 + 1] = p.y;
        self.coords[v * 3 + 2] = p.z;
    }

    /// Append a vertex, returning its index.
    ///
    /// Supports callers that grow a live mesh (e.g. subdivision) after
    /// spatial indices were built; see the locator's append mode.
    pub fn append_vertex(&mut self, p: Vec3) -> u32 {
        let index = self.vertex_count() as u32;
        self.coords.extend_from_slice(&[p.x, p.y, p.z]);
        index
    }

    /// Check buffer lengths and index validity.
    pub fn validate(&self) -> FoliaResult<()> {
        if self.coords.len() % 3 != 0 {
            return Err(FoliaError::InvalidMesh(format!(
                "Coordinate buffer length {} is not a multiple of 3",
                self.coords.len()
            )));
        }
        if self.triangles.len() % 3 != 0 {
            return Err(FoliaError::InvalidMesh(format!(
                "Triangle buffer length {} is not a multiple of 3",
                self.triangles.len()
            )));
        }
        let n = self.vertex_count() as u32;
        for (t, tri) in self.triangles.chunks_exact(3).enumerate() {
            if tri.iter().any(|&v| v >= n) {
                return Err(FoliaError::InvalidMesh(format!(
                    "Triangle {t} references a vertex out of range (vertex count {n})"
                )));
            }
            if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
                return Err(FoliaError::InvalidMesh(format!(
                    "Triangle {t} repeats a vertex index"
                )));
            }
        }
        Ok(())
    }

    /// Area of triangle `t` at the current coordinates.
    pub fn triangle_surface_area(&self, t: usize) -> f32 {
        let [a, b, c] = self.triangle(t);
        triangle_area(
            self.position(a as usize),
            self.position(b as usize),
            self.position(c as usize),
        )
    }

    /// Total surface area over all triangles.
    pub fn surface_area(&self) -> f32 {
        (0..self.triangle_count())
            .map(|t| self.triangle_surface_area(t))
            .sum()
    }

    /// Axis-aligned bounding box as `(min, max)`.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for v in 0..self.vertex_count() {
            let p = self.position(v);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }

    /// Unweighted centroid of all vertices.
    pub fn center_of_mass(&self) -> Vec3 {
        let n = self.vertex_count();
        if n == 0 {
            return Vec3::ZERO;
        }
        let mut sum = Vec3::ZERO;
        for v in 0..n {
            sum += self.position(v);
        }
        sum / n as f32
    }

    /// Translate every vertex by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        for v in 0..self.vertex_count() {
            let p = self.position(v);
            self.set_position(v, p + offset);
        }
    }

    /// Translate the mesh so its centroid sits at the origin.
    pub fn translate_to_center_of_mass(&mut self) {
        let com = self.center_of_mass();
        self.translate(-com);
    }

    /// Radius of a spherical surface, read from the first connected
    /// vertex.
    ///
    /// `has_neighbors` reports whether a vertex participates in any
    /// triangle; disconnected vertices may have been parked at the
    /// origin and must not be sampled.
    pub fn spherical_radius(&self, has_neighbors: impl Fn(usize) -> bool) -> f32 {
        for v in 0..self.vertex_count() {
            if has_neighbors(v) {
                return self.position(v).length();
            }
        }
        0.0
    }
}
