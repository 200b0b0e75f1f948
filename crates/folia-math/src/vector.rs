//! Vector helpers that glam does not provide directly.

use glam::Vec3;

/// Rescale `v` to the given length. A zero vector is returned
/// unchanged.
pub fn with_length(v: Vec3, length: f32) -> Vec3 {
    let len = v.length();
    if len > 0.0 {
        v * (length / len)
    } else {
        v
    }
}

/// Cross product of the normalized inputs, normalized again.
///
/// Used for in-plane force directions, where only the direction
/// matters and the inputs may differ wildly in magnitude. Returns the
/// zero vector when the inputs are parallel or degenerate.
pub fn normalized_cross(a: Vec3, b: Vec3) -> Vec3 {
    a.normalize_or_zero()
        .cross(b.normalize_or_zero())
        .normalize_or_zero()
}
