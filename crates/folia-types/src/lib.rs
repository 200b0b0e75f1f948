//! # folia-types
//!
//! Shared types, error definitions, and numerical constants for the
//! Folia surface-relaxation engine.
//!
//! This crate has zero domain logic — it defines the vocabulary that
//! all other Folia crates share.

pub mod constants;
pub mod error;
pub mod scalar;

pub use error::{FoliaError, FoliaResult};
pub use scalar::Scalar;
