//! Crossover (flipped-triangle) census.
//!
//! A flat surface's triangles should all face +Z; a spherical
//! surface's triangles should face away from the origin. Triangles
//! violating that have folded over ("crossed over") during
//! relaxation, and the count is the standard per-iteration quality
//! measure for morphing runs.

use folia_math::triangle_normal;
use folia_mesh::SurfaceMesh;

/// Which outward reference the check uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossoverSurface {
    /// Flat in the XY plane: a triangle crosses over when its normal
    /// has negative Z.
    Flat,
    /// Sphere about the origin: a triangle crosses over when its
    /// normal opposes its centroid's radial direction.
    Spherical,
}

/// Counts from a crossover check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossoverCounts {
    /// Triangles facing the wrong way.
    pub triangles: u32,
    /// Distinct vertices touched by those triangles.
    pub vertices: u32,
}

/// Count crossed-over triangles and the vertices they touch.
pub fn crossover_counts(mesh: &SurfaceMesh, surface: CrossoverSurface) -> CrossoverCounts {
    let mut crossed = vec![false; mesh.vertex_count()];
    let mut triangles = 0u32;

    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        let pa = mesh.position(a as usize);
        let pb = mesh.position(b as usize);
        let pc = mesh.position(c as usize);
        let normal = triangle_normal(pa, pb, pc);

        let crossover = match surface {
            CrossoverSurface::Flat => normal.z < 0.0,
            CrossoverSurface::Spherical => {
                let outward = ((pa + pb + pc) / 3.0).normalize_or_zero();
                outward.length_squared() > 0.0 && outward.dot(normal) < 0.0
            }
        };

        if crossover {
            triangles += 1;
            crossed[a as usize] = true;
            crossed[b as usize] = true;
            crossed[c as usize] = true;
        }
    }

    CrossoverCounts {
        triangles,
        vertices: crossed.iter().filter(|&&c| c).count() as u32,
    }
}
