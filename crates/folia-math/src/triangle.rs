//! Triangle area, normal, and angle computations.

use glam::Vec3;

/// Unsigned area of the triangle `(a, b, c)`.
///
/// Uses the squared-edge-length form, which is stable for the thin
/// triangles that show up mid-relaxation.
pub fn triangle_area(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let e1 = a.distance_squared(b);
    let e2 = b.distance_squared(c);
    let e3 = c.distance_squared(a);
    0.25 * (4.0 * e1 * e3 - (e1 - e2 + e3) * (e1 - e2 + e3)).abs().sqrt()
}

/// Signed area of the triangle `(a, b, c)` in the XY plane.
///
/// Positive when the vertices wind counter-clockwise viewed from +Z.
/// Only the X and Y components participate.
pub fn signed_area_2d(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    (a.x * b.y + b.x * c.y + c.x * a.y - a.y * b.x - b.y * c.x - c.y * a.x) * 0.5
}

/// Signed area of the triangle `(a, b, c)` in 3D.
///
/// The magnitude is the unsigned area; the sign is negative when the
/// triangle's own normal opposes `reference_normal`.
pub fn signed_area_3d(reference_normal: Vec3, a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let area = triangle_area(a, b, c);
    if reference_normal.dot(triangle_normal(a, b, c)) < 0.0 {
        -area
    } else {
        area
    }
}

/// Unit normal of the triangle `(a, b, c)`.
///
/// Returns the zero vector for a degenerate triangle.
pub fn triangle_normal(a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    (b - a).cross(c - a).normalize_or_zero()
}

/// Interior angle at `b` of the corner `(a, b, c)`, in radians.
///
/// Returns 0 when either arm of the corner has zero length.
pub fn interior_angle(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    let ba = a - b;
    let bc = c - b;
    let len_ba = ba.length();
    let len_bc = bc.length();
    if len_ba <= 0.0 || len_bc <= 0.0 {
        return 0.0;
    }
    let dot = (ba / len_ba).dot(bc / len_bc).clamp(-1.0, 1.0);
    dot.acos()
}
