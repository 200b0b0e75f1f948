//! Integration tests for folia-relax.

use glam::Vec3;

use folia_mesh::generators::{cube_sphere, quad_grid, square_fan, uv_sphere};
use folia_mesh::{SurfaceMesh, TopologyHelper, VertexClass};
use folia_relax::{
    inflate_and_smooth_fingers, morph_surface, smooth_surface, InflateConfig, MorphTarget,
    MorphingConfig, SmoothingConfig, SmoothingMasks, SmoothingMode,
};
use folia_types::FoliaError;

const EPS: f32 = 1.0e-4;

fn no_cadence(iterations: u32, strength: f32) -> SmoothingConfig {
    SmoothingConfig {
        iterations,
        strength,
        edge_iterations: 0,
        landmark_neighbor_iterations: 0,
        project_to_sphere_every_x_iterations: 0,
        threads: 1,
    }
}

// ─── Smoothing Tests ──────────────────────────────────────────

#[test]
fn linear_smoothing_fixed_point_on_regular_grid() {
    // Every interior vertex of a uniform grid already sits at the
    // centroid of its neighbors; edges are off-cadence, so nothing
    // may move.
    let mut mesh = quad_grid(4, 4, 4.0, 4.0);
    let before = mesh.coords.clone();
    smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(10, 1.0),
        SmoothingMasks::default(),
    )
    .unwrap();
    for (a, b) in before.iter().zip(&mesh.coords) {
        assert!((a - b).abs() < EPS);
    }
}

#[test]
fn areal_smoothing_fixed_point_on_regular_grid() {
    let mut mesh = quad_grid(4, 4, 4.0, 4.0);
    let before = mesh.coords.clone();
    smooth_surface(
        &mut mesh,
        SmoothingMode::Areal,
        &no_cadence(10, 1.0),
        SmoothingMasks::default(),
    )
    .unwrap();
    for (a, b) in before.iter().zip(&mesh.coords) {
        assert!((a - b).abs() < EPS);
    }
}

#[test]
fn lifted_center_lands_on_corner_average() {
    // Center vertex floats above the plane; one full-strength linear
    // pass puts it exactly at the average of the four corners.
    let mut mesh = square_fan(0.3);
    let corners_before: Vec<Vec3> = (0..4).map(|v| mesh.position(v)).collect();

    smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(1, 1.0),
        SmoothingMasks::default(),
    )
    .unwrap();

    assert!(mesh.position(4).length() < EPS);
    for (v, before) in corners_before.iter().enumerate() {
        assert!((mesh.position(v) - *before).length() < EPS);
    }
}

#[test]
fn edge_cadence_gates_boundary_vertices() {
    let mut gated = quad_grid(3, 3, 3.0, 3.0);
    // Perturb a boundary vertex; with edge cadence longer than the
    // run, it must stay put.
    let boundary = 1;
    gated.set_position(boundary, gated.position(boundary) + Vec3::new(0.0, -0.2, 0.0));
    let perturbed = gated.position(boundary);

    let config = SmoothingConfig {
        edge_iterations: 100,
        ..no_cadence(3, 1.0)
    };
    smooth_surface(&mut gated, SmoothingMode::Linear, &config, SmoothingMasks::default())
        .unwrap();
    assert!((gated.position(boundary) - perturbed).length() < EPS);

    // With the cadence hitting every iteration it moves.
    let config = SmoothingConfig {
        edge_iterations: 1,
        ..no_cadence(3, 1.0)
    };
    smooth_surface(&mut gated, SmoothingMode::Linear, &config, SmoothingMasks::default())
        .unwrap();
    assert!((gated.position(boundary) - perturbed).length() > 1.0e-3);
}

#[test]
fn frozen_vertices_never_move() {
    let mut mesh = uv_sphere(5.0, 6, 12);
    let frozen = 7;
    let mut smooth_only = vec![true; mesh.vertex_count()];
    smooth_only[frozen] = false;
    let before = mesh.position(frozen);

    smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(20, 0.8),
        SmoothingMasks {
            smooth_only: Some(&smooth_only),
            landmarks: None,
        },
    )
    .unwrap();

    assert_eq!(mesh.position(frozen), before);
}

#[test]
fn landmarks_stay_fixed_under_linear_smoothing() {
    let mut mesh = uv_sphere(5.0, 6, 12);
    let landmark = 20;
    let mut landmarks = vec![false; mesh.vertex_count()];
    landmarks[landmark] = true;
    let before = mesh.position(landmark);

    smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(10, 1.0),
        SmoothingMasks {
            smooth_only: None,
            landmarks: Some(&landmarks),
        },
    )
    .unwrap();

    assert_eq!(mesh.position(landmark), before);
}

#[test]
fn landmark_neighbor_constrained_applies_setup_nudge() {
    let mut mesh = square_fan(0.0);
    // Landmark at the center, lifted so it holds an offset from its
    // neighbor average.
    mesh.set_position(4, Vec3::new(0.0, 0.0, 1.0));
    let mut landmarks = vec![false; 5];
    landmarks[4] = true;

    let config = SmoothingConfig {
        landmark_neighbor_iterations: 0,
        ..no_cadence(1, 1.0)
    };
    smooth_surface(
        &mut mesh,
        SmoothingMode::LandmarkNeighborConstrained,
        &config,
        SmoothingMasks {
            smooth_only: None,
            landmarks: Some(&landmarks),
        },
    )
    .unwrap();

    // The landmark itself never moves.
    assert!((mesh.position(4) - Vec3::new(0.0, 0.0, 1.0)).length() < EPS);
    // Its neighbors were nudged along the captured offset (+Z).
    for v in 0..4 {
        assert!(mesh.position(v).z > 0.2);
    }
}

#[test]
fn sphere_projection_cadence_keeps_radius() {
    let mut mesh = uv_sphere(10.0, 6, 12);
    let config = SmoothingConfig {
        project_to_sphere_every_x_iterations: 1,
        ..no_cadence(5, 0.5)
    };
    smooth_surface(&mut mesh, SmoothingMode::Linear, &config, SmoothingMasks::default())
        .unwrap();
    for v in 0..mesh.vertex_count() {
        assert!((mesh.position(v).length() - 10.0).abs() < 1.0e-3);
    }
}

#[test]
fn smoothing_rejects_bad_strength() {
    let mut mesh = square_fan(0.0);
    let result = smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(1, 0.0),
        SmoothingMasks::default(),
    );
    assert!(matches!(result, Err(FoliaError::InvalidConfig(_))));
}

#[test]
fn smoothing_rejects_empty_surface() {
    let mut mesh = SurfaceMesh {
        coords: vec![],
        triangles: vec![],
    };
    let result = smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(1, 1.0),
        SmoothingMasks::default(),
    );
    assert!(matches!(result, Err(FoliaError::EmptySurface)));
}

#[test]
fn zero_iterations_is_a_no_op() {
    let mut mesh = square_fan(0.4);
    let before = mesh.coords.clone();
    smooth_surface(
        &mut mesh,
        SmoothingMode::Linear,
        &no_cadence(0, 1.0),
        SmoothingMasks::default(),
    )
    .unwrap();
    assert_eq!(mesh.coords, before);
}

// ─── Concurrency Tests ────────────────────────────────────────

#[test]
fn smoothing_is_thread_count_invariant() {
    let reference = uv_sphere(10.0, 8, 16);

    let mut single = reference.clone();
    smooth_surface(
        &mut single,
        SmoothingMode::Linear,
        &no_cadence(7, 0.7),
        SmoothingMasks::default(),
    )
    .unwrap();

    for threads in [2, 3, 5] {
        let mut multi = reference.clone();
        let config = SmoothingConfig {
            threads,
            ..no_cadence(7, 0.7)
        };
        smooth_surface(&mut multi, SmoothingMode::Linear, &config, SmoothingMasks::default())
            .unwrap();
        assert_eq!(
            single.coords, multi.coords,
            "{threads}-thread run diverged from single-threaded"
        );
    }
}

#[test]
fn morphing_is_thread_count_invariant() {
    let reference = cube_sphere(1.0, 4);
    let mut subject = cube_sphere(1.0, 4);
    for v in 0..subject.vertex_count() {
        subject.set_position(v, subject.position(v) * 1.2);
    }

    let mut config = MorphingConfig {
        iterations: 5,
        threads: 1,
        ..MorphingConfig::default()
    };

    let mut single = subject.clone();
    morph_surface(&mut single, &reference, MorphTarget::Spherical, &config, None, None).unwrap();

    config.threads = 4;
    let mut multi = subject.clone();
    morph_surface(&mut multi, &reference, MorphTarget::Spherical, &config, None, None).unwrap();

    assert_eq!(single.coords, multi.coords);
}

// ─── Morphing Tests ───────────────────────────────────────────

#[test]
fn morphing_rejects_vertex_count_mismatch() {
    let mut mesh = quad_grid(2, 2, 1.0, 1.0);
    let reference = quad_grid(3, 3, 1.0, 1.0);
    let result = morph_surface(
        &mut mesh,
        &reference,
        MorphTarget::Flat,
        &MorphingConfig::default(),
        None,
        None,
    );
    assert!(matches!(result, Err(FoliaError::VertexCountMismatch { .. })));
}

#[test]
fn forces_only_mode_computes_without_moving() {
    let reference = quad_grid(4, 4, 4.0, 4.0);
    let mut mesh = quad_grid(4, 4, 4.0, 4.0);
    // Stretch the morphing surface so every edge is too long.
    for v in 0..mesh.vertex_count() {
        mesh.set_position(v, mesh.position(v) * 1.5);
    }
    let before = mesh.coords.clone();

    let config = MorphingConfig {
        iterations: 0,
        ..MorphingConfig::default()
    };
    let result =
        morph_surface(&mut mesh, &reference, MorphTarget::Flat, &config, None, None).unwrap();

    assert_eq!(mesh.coords, before, "forces-only mode must not move vertices");
    assert_eq!(result.forces.len(), mesh.vertex_count());

    // Stretched edges pull inward: a nonzero linear force somewhere,
    // mirrored into the total.
    let strongest = result
        .forces
        .iter()
        .map(|f| f.linear.length())
        .fold(0.0f32, f32::max);
    assert!(strongest > 1.0e-3);
    let total = result
        .forces
        .iter()
        .map(|f| f.total.length())
        .fold(0.0f32, f32::max);
    assert!(total > 1.0e-3);
}

#[test]
fn sphere_forces_only_mode_leaves_cube_sphere_untouched() {
    let reference = cube_sphere(1.0, 3);
    let mut mesh = cube_sphere(1.0, 3);
    // Exaggerate the cube-corner distortion so forces are visible.
    for v in 0..mesh.vertex_count() {
        let p = mesh.position(v);
        mesh.set_position(v, (p + Vec3::splat(0.05 * p.x * p.y)).normalize());
    }
    let before = mesh.coords.clone();

    let config = MorphingConfig {
        iterations: 0,
        ..MorphingConfig::default()
    };
    let result =
        morph_surface(&mut mesh, &reference, MorphTarget::Spherical, &config, None, None)
            .unwrap();

    assert_eq!(mesh.coords, before);
    assert_eq!(result.forces.len(), mesh.vertex_count());
    let strongest = result
        .forces
        .iter()
        .map(|f| f.total.length())
        .fold(0.0f32, f32::max);
    assert!(strongest > 1.0e-4);
}

#[test]
fn flat_morphing_restores_stretched_spacing() {
    let reference = quad_grid(4, 4, 4.0, 4.0);
    let mut mesh = quad_grid(4, 4, 4.0, 4.0);
    for v in 0..mesh.vertex_count() {
        mesh.set_position(v, mesh.position(v) * 1.3);
    }

    let error = |mesh: &SurfaceMesh| -> f32 {
        let topology = TopologyHelper::build(&mesh.triangles, mesh.vertex_count(), true);
        let mut sum = 0.0f32;
        let mut count = 0u32;
        for v in 0..mesh.vertex_count() {
            for &n in topology.neighbors(v) {
                let current = mesh.position(v).distance(mesh.position(n as usize));
                let wanted = reference.position(v).distance(reference.position(n as usize));
                sum += (current - wanted).abs();
                count += 1;
            }
        }
        sum / count as f32
    };

    let before = error(&mesh);
    let config = MorphingConfig {
        iterations: 40,
        linear_force: 0.5,
        angular_force: 0.0,
        step_size: 0.5,
        ..MorphingConfig::default()
    };
    morph_surface(&mut mesh, &reference, MorphTarget::Flat, &config, None, None).unwrap();
    let after = error(&mesh);

    assert!(
        after < before * 0.5,
        "edge-length error did not shrink: {before} -> {after}"
    );
}

#[test]
fn spherical_morphing_stays_on_sphere() {
    let reference = cube_sphere(2.0, 4);
    let mut mesh = cube_sphere(2.0, 4);
    // Tangential perturbation of one vertex.
    let v = 10;
    mesh.set_position(v, (mesh.position(v) + Vec3::new(0.1, 0.05, 0.0)).normalize() * 2.0);

    let config = MorphingConfig {
        iterations: 10,
        ..MorphingConfig::default()
    };
    morph_surface(&mut mesh, &reference, MorphTarget::Spherical, &config, None, None).unwrap();

    for v in 0..mesh.vertex_count() {
        assert!(
            (mesh.position(v).length() - 2.0).abs() < 1.0e-3,
            "vertex {v} drifted off the sphere"
        );
    }
}

#[test]
fn frozen_morph_vertices_hold_position() {
    let reference = quad_grid(4, 4, 4.0, 4.0);
    let mut mesh = quad_grid(4, 4, 4.0, 4.0);
    for v in 0..mesh.vertex_count() {
        mesh.set_position(v, mesh.position(v) * 1.4);
    }

    let mut should_morph = vec![true; mesh.vertex_count()];
    should_morph[12] = false;
    let frozen_before = mesh.position(12);

    let config = MorphingConfig {
        iterations: 15,
        ..MorphingConfig::default()
    };
    morph_surface(
        &mut mesh,
        &reference,
        MorphTarget::Flat,
        &config,
        Some(&should_morph),
        None,
    )
    .unwrap();

    assert_eq!(mesh.position(12), frozen_before);
    // Everything else was free to move.
    assert!((mesh.position(6) - reference.position(6) * 1.4).length() > 1.0e-3);
}

#[test]
fn fiducial_sphere_correction_scales_baselines() {
    use folia_relax::{FiducialSphereCorrection, NeighborTable};

    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let topology = TopologyHelper::build(&mesh.triangles, mesh.vertex_count(), true);

    let raw = NeighborTable::build(&mesh.coords, &topology, None);
    let ratios = vec![2.0f32; mesh.vertex_count()];
    let corrected = NeighborTable::build(
        &mesh.coords,
        &topology,
        Some(FiducialSphereCorrection {
            ratios: &ratios,
            fraction: 1.0,
        }),
    );

    // fraction 1 with uniform ratio 2 doubles every baseline.
    for v in 0..mesh.vertex_count() {
        for (a, b) in raw.info[v]
            .baseline_distance
            .iter()
            .zip(&corrected.info[v].baseline_distance)
        {
            assert!((b - a * 2.0).abs() < EPS);
        }
    }

    // fraction 0 reproduces the raw distances exactly.
    let untouched = NeighborTable::build(
        &mesh.coords,
        &topology,
        Some(FiducialSphereCorrection {
            ratios: &ratios,
            fraction: 0.0,
        }),
    );
    for v in 0..mesh.vertex_count() {
        assert_eq!(
            raw.info[v].baseline_distance,
            untouched.info[v].baseline_distance
        );
    }
}

#[test]
fn corner_vertices_only_capture_first_fan_angles() {
    use folia_relax::NeighborTable;

    let mesh = quad_grid(2, 2, 2.0, 2.0);
    let topology = TopologyHelper::build(&mesh.triangles, mesh.vertex_count(), true);
    let table = NeighborTable::build(&mesh.coords, &topology, None);

    assert_eq!(table.info[0].classification, VertexClass::Corner);
    assert!(table.info[0].angle_at_neighbor[0] > 0.0);
    for k in 1..table.info[0].neighbor_count() {
        assert_eq!(table.info[0].angle_at_neighbor[k], 0.0);
    }
}

// ─── Inflation Tests ──────────────────────────────────────────

#[test]
fn inflation_grows_surface_area() {
    let fiducial = uv_sphere(1.0, 6, 12);
    let mut mesh = uv_sphere(1.0, 6, 12);
    let before = mesh.surface_area();

    let config = InflateConfig {
        cycles: 2,
        smoothing_strength: 1.0,
        smoothing_iterations: 5,
        inflation_factor: 1.4,
        compress_stretch_threshold: 100.0,
        finger_smoothing_strength: 1.0,
        finger_smoothing_iterations: 0,
    };
    inflate_and_smooth_fingers(&mut mesh, &fiducial, &config).unwrap();

    assert!(mesh.surface_area() > before);
}

#[test]
fn inflation_rejects_vertex_count_mismatch() {
    let fiducial = uv_sphere(1.0, 6, 12);
    let mut mesh = uv_sphere(1.0, 4, 8);
    let result = inflate_and_smooth_fingers(&mut mesh, &fiducial, &InflateConfig::default());
    assert!(matches!(result, Err(FoliaError::VertexCountMismatch { .. })));
}

// ─── Config Tests ─────────────────────────────────────────────

#[test]
fn configs_round_trip_through_serde() {
    let smoothing = SmoothingConfig::default();
    let json = serde_json::to_string(&smoothing).unwrap();
    let back: SmoothingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.iterations, smoothing.iterations);
    assert_eq!(back.strength, smoothing.strength);

    let morphing = MorphingConfig::default();
    let json = serde_json::to_string(&morphing).unwrap();
    let back: MorphingConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.linear_force, morphing.linear_force);
    assert!(!back.crossover_correction);
}
