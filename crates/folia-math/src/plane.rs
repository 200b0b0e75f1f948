//! Point/plane and ray/plane queries.

use glam::Vec3;

use crate::triangle::triangle_normal;

/// Signed distance from `point` to the plane through `on_plane` with
/// unit normal `normal`. Positive on the side the normal points toward.
pub fn signed_distance_to_plane(normal: Vec3, on_plane: Vec3, point: Vec3) -> f32 {
    normal.dot(point - on_plane)
}

/// Intersect the ray `origin + t * direction` with the plane of the
/// triangle `(a, b, c)`.
///
/// Returns the intersection point and the parametric distance `t`
/// along the normalized ray, or `None` when the ray is parallel to the
/// plane. `t` may be negative (intersection behind the origin).
pub fn ray_intersect_plane(
    a: Vec3,
    b: Vec3,
    c: Vec3,
    origin: Vec3,
    direction: Vec3,
) -> Option<(Vec3, f32)> {
    let ray = direction.normalize_or_zero();
    let normal = triangle_normal(a, b, c);

    let denom = normal.dot(ray);
    if denom == 0.0 {
        return None;
    }

    let d = -normal.dot(a);
    let t = -(normal.dot(origin) + d) / denom;
    Some((origin + ray * t, t))
}
