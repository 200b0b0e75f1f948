//! # folia-spatial
//!
//! Spatial queries over surface meshes.
//!
//! ## Key Types
//!
//! - [`PointLocator`] — nearest-point and radius queries over a vertex
//!   set, built once over a uniform grid and queried many times. Can
//!   optionally keep answering correctly after vertices are appended
//!   to the mesh.
//! - [`PointProjector`] — projects arbitrary 3D points onto the mesh
//!   surface, returning an enclosing triangle and barycentric weights,
//!   with per-surface-type containment tests and graceful fallbacks.

pub mod locator;
pub mod projector;

pub use locator::PointLocator;
pub use projector::{
    unproject_point, BarycentricProjection, NearestTileProjection, PointProjector,
    ProjectorConfig, SurfaceHint,
};
