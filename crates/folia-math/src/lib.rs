//! # folia-math
//!
//! Small 3D geometry kernel shared by the mesh, projection, relaxation,
//! and measurement crates.
//!
//! ## Key Operations
//!
//! - Triangle areas: unsigned, signed in the XY plane, signed in 3D
//!   against a reference normal
//! - Triangle normals and interior angles
//! - Signed point-to-plane distance and ray/plane intersection
//! - Vector length manipulation helpers

pub mod plane;
pub mod triangle;
pub mod vector;

pub use plane::{ray_intersect_plane, signed_distance_to_plane};
pub use triangle::{
    interior_angle, signed_area_2d, signed_area_3d, triangle_area, triangle_normal,
};
pub use vector::{normalized_cross, with_length};
