//! Vertex normal computation.
//!
//! A vertex's normal is the average of its incident triangles' unit
//! normals, normalized. Disconnected vertices get the zero vector.

use glam::Vec3;

use folia_math::triangle_normal;

/// Compute per-vertex normals for `triangles` over an interleaved
/// coordinate buffer, returning an interleaved normal buffer of the
/// same length.
///
/// Taking the coordinates separately lets the relaxation engine ask
/// for normals of an intermediate position buffer without committing
/// it to the mesh.
pub fn vertex_normals(coords: &[f32], triangles: &[u32]) -> Vec<f32> {
    let n = coords.len() / 3;
    let mut normals = vec![0.0f32; n * 3];
    let mut contributions = vec![0u32; n];

    let at = |v: usize| Vec3::new(coords[v * 3], coords[v * 3 + 1], coords[v * 3 + 2]);

    for tri in triangles.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let tile_normal = triangle_normal(at(a), at(b), at(c));
        for v in [a, b, c] {
            normals[v * 3] += tile_normal.x;
            normals[v * 3 + 1] += tile_normal.y;
            normals[v * 3 + 2] += tile_normal.z;
            contributions[v] += 1;
        }
    }

    for v in 0..n {
        if contributions[v] > 0 {
            let inv = 1.0 / contributions[v] as f32;
            let averaged = Vec3::new(
                normals[v * 3] * inv,
                normals[v * 3 + 1] * inv,
                normals[v * 3 + 2] * inv,
            )
            .normalize_or_zero();
            normals[v * 3] = averaged.x;
            normals[v * 3 + 1] = averaged.y;
            normals[v * 3 + 2] = averaged.z;
        }
    }

    normals
}

/// Read the normal of vertex `v` out of an interleaved normal buffer.
#[inline]
pub fn normal_at(normals: &[f32], v: usize) -> Vec3 {
    Vec3::new(normals[v * 3], normals[v * 3 + 1], normals[v * 3 + 2])
}
