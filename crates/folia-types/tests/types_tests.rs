//! Integration tests for folia-types.

use folia_types::constants;
use folia_types::FoliaError;

// ─── Error Tests ──────────────────────────────────────────────

#[test]
fn invalid_mesh_display() {
    let err = FoliaError::InvalidMesh("triangle 3 references vertex 99".into());
    assert!(err.to_string().contains("triangle 3"));
}

#[test]
fn vertex_count_mismatch_display() {
    let err = FoliaError::VertexCountMismatch {
        reference: 100,
        subject: 90,
    };
    let text = err.to_string();
    assert!(text.contains("100"));
    assert!(text.contains("90"));
}

#[test]
fn empty_surface_display() {
    let err = FoliaError::EmptySurface;
    assert!(err.to_string().contains("no vertices"));
}

#[test]
fn attribute_length_mismatch_display() {
    let err = FoliaError::AttributeLengthMismatch {
        expected: 10,
        actual: 7,
    };
    assert!(err.to_string().contains("expected 10"));
}

// ─── Constant Sanity ──────────────────────────────────────────

#[test]
fn tolerances_have_expected_signs() {
    assert!(constants::ON_VERTEX_TOLERANCE_SQ > 0.0);
    assert!(constants::TILE_AREA_TOLERANCE < 0.0);
    assert!(constants::MIN_EDGE_LENGTH > 0.0);
    assert!(constants::DISTORTION_PENALTY_RATIO > 1.0);
    assert!(constants::DISTORTION_MIN_RATIO > 0.0);
}
