//! Integration tests for folia-spatial.

use glam::Vec3;

use folia_mesh::generators::{quad_grid, uv_sphere};
use folia_mesh::SurfaceMesh;
use folia_spatial::{unproject_point, PointLocator, PointProjector, SurfaceHint};

const EPS: f32 = 1.0e-4;

// ─── PointLocator Tests ───────────────────────────────────────

#[test]
fn every_vertex_is_its_own_nearest_point() {
    let mesh = uv_sphere(10.0, 6, 12);
    let locator = PointLocator::build(&mesh, true, false, None);
    for v in 0..mesh.vertex_count() {
        assert_eq!(
            locator.nearest_point(&mesh, mesh.position(v)),
            Some(v as u32),
            "vertex {v} is not its own nearest point"
        );
    }
}

#[test]
fn nearest_point_from_offset_query() {
    let mesh = quad_grid(4, 4, 4.0, 4.0);
    let locator = PointLocator::build(&mesh, true, false, None);
    // Slightly off a known vertex, well away from the mesh plane.
    let v = 12;
    let query = mesh.position(v) + Vec3::new(0.01, -0.02, 0.5);
    assert_eq!(locator.nearest_point(&mesh, query), Some(v as u32));
}

#[test]
fn empty_locator_returns_none() {
    let mesh = SurfaceMesh {
        coords: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        triangles: vec![],
    };
    let locator = PointLocator::build(&mesh, true, false, None);
    assert_eq!(locator.indexed_count(), 0);
    assert_eq!(locator.nearest_point(&mesh, Vec3::ZERO), None);
}

#[test]
fn connectivity_filter_skips_disconnected_vertices() {
    let mut mesh = quad_grid(2, 2, 2.0, 2.0);
    let query = Vec3::new(5.0, 5.0, 0.0);
    let stray = mesh.append_vertex(query);
    let filtered = PointLocator::build(&mesh, true, false, None);
    let unfiltered = PointLocator::build(&mesh, false, false, None);

    assert_ne!(filtered.nearest_point(&mesh, query), Some(stray));
    assert_eq!(unfiltered.nearest_point(&mesh, query), Some(stray));
}

#[test]
fn vertex_mask_restricts_candidates() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let mut mask = vec![false; mesh.vertex_count()];
    mask[8] = true;
    let locator = PointLocator::build(&mesh, true, false, Some(&mask));
    // Query right on vertex 0; only vertex 8 is indexed.
    assert_eq!(locator.nearest_point(&mesh, mesh.position(0)), Some(8));
}

#[test]
fn appended_vertices_compete_with_the_index() {
    let mut mesh = quad_grid(2, 2, 2.0, 2.0);
    let locator = PointLocator::build(&mesh, true, true, None);

    let query = Vec3::new(0.1, 0.1, 0.05);
    let indexed_answer = locator.nearest_point(&mesh, query).unwrap();

    let appended = mesh.append_vertex(query);
    assert_eq!(locator.nearest_point(&mesh, query), Some(appended));
    assert_ne!(indexed_answer, appended);
}

#[test]
fn appended_vertices_ignored_without_append_mode() {
    let mut mesh = quad_grid(2, 2, 2.0, 2.0);
    let locator = PointLocator::build(&mesh, true, false, None);
    let query = Vec3::new(0.1, 0.1, 0.05);
    let before = locator.nearest_point(&mesh, query);
    mesh.append_vertex(query);
    assert_eq!(locator.nearest_point(&mesh, query), before);
}

#[test]
fn radius_query_finds_neighborhood() {
    let mesh = quad_grid(4, 4, 4.0, 4.0);
    let locator = PointLocator::build(&mesh, true, false, None);

    // Around the grid center: the center vertex plus its 4 axis
    // neighbors at distance 1.
    let found = locator.points_within_radius(&mesh, Vec3::ZERO, 1.1);
    assert_eq!(found.len(), 5);
    assert!(found.contains(&12));

    let tight = locator.points_within_radius(&mesh, Vec3::ZERO, 0.5);
    assert_eq!(tight, vec![12]);
}

#[test]
fn radius_query_sees_appended_vertices() {
    let mut mesh = quad_grid(2, 2, 2.0, 2.0);
    let locator = PointLocator::build(&mesh, true, true, None);
    let appended = mesh.append_vertex(Vec3::new(0.2, 0.0, 0.0));
    let found = locator.points_within_radius(&mesh, Vec3::ZERO, 0.3);
    assert!(found.contains(&appended));
}

// ─── PointProjector Tests ─────────────────────────────────────

#[test]
fn flat_projection_round_trip() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);

    for t in 0..mesh.triangle_count() {
        let [a, b, c] = mesh.triangle(t);
        let (pa, pb, pc) = (
            mesh.position(a as usize),
            mesh.position(b as usize),
            mesh.position(c as usize),
        );
        let query = pa * 0.2 + pb * 0.3 + pc * 0.5;

        let hit = projector.project_barycentric(&mesh, query, true);
        let tri = hit.triangle.expect("interior point must land in a triangle");
        assert_eq!(tri as usize, t);
        assert!(!hit.degenerate);

        let verts = [
            mesh.position(hit.vertices[0] as usize),
            mesh.position(hit.vertices[1] as usize),
            mesh.position(hit.vertices[2] as usize),
        ];
        let back = unproject_point(verts, hit.weights);
        assert!((back - query).length() < EPS, "round trip failed for triangle {t}");
    }
}

#[test]
fn edge_point_reports_degenerate() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);

    // Midpoint of the shared diagonal of cell (0,0).
    let [_, b, c] = mesh.triangle(0);
    let query = (mesh.position(b as usize) + mesh.position(c as usize)) * 0.5;
    let hit = projector.project_barycentric(&mesh, query, true);
    assert!(hit.triangle.is_some());
    assert!(hit.degenerate);
}

#[test]
fn nearest_vertex_delegates_to_locator() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);
    let v = 4;
    let query = mesh.position(v) + Vec3::new(0.02, 0.01, 0.0);
    assert_eq!(projector.project_to_nearest_vertex(&mesh, query), Some(v as u32));
}

#[test]
fn nearest_tile_reports_signed_height() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);

    let above = projector.project_barycentric_nearest_tile(&mesh, Vec3::new(0.3, 0.2, 0.5));
    assert!(above.inside);
    assert!((above.signed_distance - 0.5).abs() < EPS);
    assert!((above.distance - 0.5).abs() < EPS);
    assert!((above.offset - Vec3::new(0.0, 0.0, 0.5)).length() < EPS);

    let below = projector.project_barycentric_nearest_tile(&mesh, Vec3::new(0.3, 0.2, -0.25));
    assert!((below.signed_distance + 0.25).abs() < EPS);
}

#[test]
fn nearest_tile_falls_back_outside_the_mesh() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);

    // Far beyond the boundary: no containing triangle exists, but the
    // fallback still reports the searched triangle of least plane
    // distance.
    let result = projector.project_barycentric_nearest_tile(&mesh, Vec3::new(3.0, 0.0, 0.1));
    assert!(!result.inside);
    assert!(result.triangle.is_some());
    assert!((result.distance - 0.1).abs() < EPS);
}

#[test]
fn sphere_projection_uses_radial_ray() {
    let mesh = uv_sphere(10.0, 6, 12);
    let projector = PointProjector::new(&mesh, SurfaceHint::Sphere, false);

    for t in [0, 17, 40] {
        let [a, b, c] = mesh.triangle(t);
        let centroid = (mesh.position(a as usize)
            + mesh.position(b as usize)
            + mesh.position(c as usize))
            / 3.0;
        // Query well above the surface along the radial direction.
        let query = centroid * 1.8;
        let hit = projector.project_barycentric(&mesh, query, true);
        let tri = hit.triangle.expect("radial query must land in its triangle") as usize;
        assert_eq!(tri, t);

        // Unprojection recovers the ray/plane intersection, which for
        // a centroid ray is the centroid itself.
        let verts = [
            mesh.position(hit.vertices[0] as usize),
            mesh.position(hit.vertices[1] as usize),
            mesh.position(hit.vertices[2] as usize),
        ];
        let back = unproject_point(verts, hit.weights);
        assert!((back - centroid).length() < 1.0e-3);
    }
}

#[test]
fn other_hint_downgrades_to_flat_for_planar_mesh() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Other, false);
    let hit = projector.project_barycentric(&mesh, Vec3::new(0.3, 0.2, 0.0), true);
    assert!(hit.triangle.is_some());
}

#[test]
fn other_hint_projects_onto_tilted_surface() {
    // The flat grid tilted out of the XY plane forces the general
    // plane-projection path.
    let mut mesh = quad_grid(2, 2, 2.0, 2.0);
    for v in 0..mesh.vertex_count() {
        let p = mesh.position(v);
        mesh.set_position(v, Vec3::new(p.x, p.y, 0.5 * p.x + 0.1));
    }
    let projector = PointProjector::new(&mesh, SurfaceHint::Other, false);

    let [a, b, c] = mesh.triangle(2);
    let on_surface = (mesh.position(a as usize)
        + mesh.position(b as usize)
        + mesh.position(c as usize))
        / 3.0;
    let hit = projector.project_barycentric(&mesh, on_surface, true);
    assert_eq!(hit.triangle, Some(2));
}

#[test]
fn best_tile_2d_picks_a_containing_tile() {
    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let projector = PointProjector::new(&mesh, SurfaceHint::Flat, false);

    let [a, b, c] = mesh.triangle(5);
    let query = (mesh.position(a as usize) + mesh.position(b as usize) + mesh.position(c as usize))
        / 3.0;
    let hit = projector
        .project_barycentric_best_tile_2d(&mesh, query)
        .expect("nearest vertex exists");
    let tri = hit.triangle.unwrap() as usize;
    let tri_nodes = mesh.triangle(tri);
    // The best tile shares the nearest vertex and contains the query.
    assert!(tri_nodes.contains(&hit.nearest_vertex.unwrap()));
}

#[test]
fn unproject_weight_rotation() {
    let verts = [Vec3::ZERO, Vec3::X, Vec3::Y];
    // Weight layout is per-edge areas: [w1, w2, w0] maps onto the
    // vertices, so weights (0, 1, 0) select the third... and a pure
    // w[1] selects the first vertex.
    let first = unproject_point(verts, [0.0, 1.0, 0.0]);
    assert!((first - verts[0]).length() < EPS);

    let zero_sum = unproject_point(verts, [0.0, 0.0, 0.0]);
    assert_eq!(zero_sum, verts[0]);
}
