//! Nimbus Engine - the numeric core of the pipeline
//!
//! Three per-column transformations, applied in order:
//! - [`classify`] labels a series `trend`, `cyclic`, or `random`
//! - [`salt`] applies a label-specific, deterministically seeded perturbation
//! - [`solter`] applies adaptive exponentially-weighted window smoothing
//!
//! Every engine is a pure function over `&[f64]`: equal-length output,
//! no interior state, and deterministic for a given seed and configuration.

#![warn(unreachable_pub)]

pub mod classify;
pub mod config;
pub mod salt;
pub mod smooth;
pub mod stats;

pub use classify::{classify, ClassifyError, Label};
pub use config::{ClassifyConfig, EngineConfig, SaltConfig, SmoothConfig};
pub use salt::{derive_seed, salt, SaltError};
pub use smooth::{moving_average, solter, SmoothError};
