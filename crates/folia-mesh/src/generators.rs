//! Procedural mesh generators for tests and benchmarks.
//!
//! Deterministic, resolution-configurable meshes with consistent
//! counter-clockwise winding.

use glam::Vec3;

use crate::mesh::SurfaceMesh;

/// Flat rectangular quad grid in the XY plane at Z = 0.
///
/// The grid spans `[-width/2, width/2]` in X and `[-height/2, height/2]`
/// in Y, centered at the origin.
///
/// # Arguments
/// - `cols` — quads along X (vertex count = cols + 1)
/// - `rows` — quads along Y (vertex count = rows + 1)
pub fn quad_grid(cols: usize, rows: usize, width: f32, height: f32) -> SurfaceMesh {
    let verts_x = cols + 1;
    let verts_y = rows + 1;

    let mut coords = Vec::with_capacity(verts_x * verts_y * 3);
    let mut triangles = Vec::with_capacity(cols * rows * 6);

    let half_w = width / 2.0;
    let half_h = height / 2.0;

    for j in 0..verts_y {
        for i in 0..verts_x {
            let u = i as f32 / cols as f32;
            let v = j as f32 / rows as f32;
            coords.push(-half_w + u * width);
            coords.push(-half_h + v * height);
            coords.push(0.0);
        }
    }

    for j in 0..rows {
        for i in 0..cols {
            let bl = (j * verts_x + i) as u32;
            let br = bl + 1;
            let tl = bl + verts_x as u32;
            let tr = tl + 1;

            // Counter-clockwise viewed from +Z
            triangles.extend_from_slice(&[bl, br, tl]);
            triangles.extend_from_slice(&[br, tr, tl]);
        }
    }

    SurfaceMesh { coords, triangles }
}

/// Unit square fan: four corners plus one center vertex, four
/// triangles. The center can be lifted off the plane with `center_z`.
///
/// The smallest mesh with an interior vertex; handy for smoothing
/// fixed-point checks.
pub fn square_fan(center_z: f32) -> SurfaceMesh {
    let coords = vec![
        -0.5, -0.5, 0.0, // 0
        0.5, -0.5, 0.0, // 1
        0.5, 0.5, 0.0, // 2
        -0.5, 0.5, 0.0, // 3
        0.0, 0.0, center_z, // 4 center
    ];
    let triangles = vec![
        0, 1, 4, //
        1, 2, 4, //
        2, 3, 4, //
        3, 0, 4,
    ];
    SurfaceMesh { coords, triangles }
}

/// UV sphere of the given radius.
///
/// `rings` latitude bands (≥ 2) and `segments` longitude steps (≥ 3).
/// Poles are single vertices; every other vertex has a closed fan.
pub fn uv_sphere(radius: f32, rings: usize, segments: usize) -> SurfaceMesh {
    let rings = rings.max(2);
    let segments = segments.max(3);

    let mut coords: Vec<f32> = Vec::new();
    let mut triangles: Vec<u32> = Vec::new();

    // North pole
    coords.extend_from_slice(&[0.0, 0.0, radius]);

    // Interior rings, from near the north pole southward
    for r in 1..rings {
        let theta = std::f32::consts::PI * r as f32 / rings as f32;
        let (sin_t, cos_t) = theta.sin_cos();
        for s in 0..segments {
            let phi = std::f32::consts::TAU * s as f32 / segments as f32;
            let (sin_p, cos_p) = phi.sin_cos();
            coords.push(radius * sin_t * cos_p);
            coords.push(radius * sin_t * sin_p);
            coords.push(radius * cos_t);
        }
    }

    // South pole
    let south = (coords.len() / 3) as u32;
    coords.extend_from_slice(&[0.0, 0.0, -radius]);

    let ring_start = |r: usize| 1 + ((r - 1) * segments) as u32;

    // North cap
    for s in 0..segments as u32 {
        let next = (s + 1) % segments as u32;
        triangles.extend_from_slice(&[0, ring_start(1) + s, ring_start(1) + next]);
    }

    // Bands between interior rings
    for r in 1..rings - 1 {
        let upper = ring_start(r);
        let lower = ring_start(r + 1);
        for s in 0..segments as u32 {
            let next = (s + 1) % segments as u32;
            triangles.extend_from_slice(&[upper + s, lower + s, lower + next]);
            triangles.extend_from_slice(&[upper + s, lower + next, upper + next]);
        }
    }

    // South cap
    let last = ring_start(rings - 1);
    for s in 0..segments as u32 {
        let next = (s + 1) % segments as u32;
        triangles.extend_from_slice(&[south, last + next, last + s]);
    }

    SurfaceMesh { coords, triangles }
}

/// Project every vertex of `mesh` onto the sphere of the given radius
/// about the origin, in place. Vertices at the origin stay put.
pub fn project_to_sphere(mesh: &mut SurfaceMesh, radius: f32) {
    for v in 0..mesh.vertex_count() {
        let p = mesh.position(v);
        let len = p.length();
        if len > 0.0 {
            mesh.set_position(v, p * (radius / len));
        }
    }
}

/// Sphere triangulated from an inflated cube: a quad grid on each of
/// the six cube faces, welded along the shared edges, projected onto
/// the sphere of the given radius.
pub fn cube_sphere(radius: f32, subdivisions: usize) -> SurfaceMesh {
    let n = subdivisions.max(1);
    let step = 2.0 / n as f32;

    // Weld by keying grid corners to integer lattice coordinates.
    let mut coords: Vec<f32> = Vec::new();
    let mut triangles: Vec<u32> = Vec::new();
    let mut lookup: std::collections::HashMap<(i32, i32, i32), u32> =
        std::collections::HashMap::new();

    let mut vertex_for = |key: (i32, i32, i32), coords: &mut Vec<f32>| -> u32 {
        *lookup.entry(key).or_insert_with(|| {
            let p = Vec3::new(
                -1.0 + key.0 as f32 * step,
                -1.0 + key.1 as f32 * step,
                -1.0 + key.2 as f32 * step,
            );
            let index = (coords.len() / 3) as u32;
            coords.extend_from_slice(&[p.x, p.y, p.z]);
            index
        })
    };

    // Each face: (fixed axis, fixed lattice value, axes that vary).
    // Winding is chosen per face so normals point away from the cube.
    let faces: [(usize, i32, usize, usize, bool); 6] = [
        (0, 0, 1, 2, true),          // -X
        (0, n as i32, 1, 2, false),  // +X
        (1, 0, 0, 2, false),         // -Y
        (1, n as i32, 0, 2, true),   // +Y
        (2, 0, 0, 1, true),          // -Z
        (2, n as i32, 0, 1, false),  // +Z
    ];

    for (axis, level, u_axis, v_axis, flip) in faces {
        for j in 0..n as i32 {
            for i in 0..n as i32 {
                let mut corner = |du: i32, dv: i32| {
                    let mut key = [0i32; 3];
                    key[axis] = level;
                    key[u_axis] = i + du;
                    key[v_axis] = j + dv;
                    vertex_for((key[0], key[1], key[2]), &mut coords)
                };
                let a = corner(0, 0);
                let b = corner(1, 0);
                let c = corner(1, 1);
                let d = corner(0, 1);
                if flip {
                    triangles.extend_from_slice(&[a, d, c, a, c, b]);
                } else {
                    triangles.extend_from_slice(&[a, b, c, a, c, d]);
                }
            }
        }
    }

    let mut mesh = SurfaceMesh { coords, triangles };
    project_to_sphere(&mut mesh, radius);
    mesh
}
