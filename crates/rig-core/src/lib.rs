//! Core types for `rig-calibration-rs`.
//!
//! This crate contains:
//! - linear algebra type aliases (`Real`, `Vec3`, `Pt3`, ...),
//! - device identities and ordered device-pair map keys,
//! - pure geometry utilities shared by the solver and the floor detector.

/// Linear algebra type aliases and geometry helpers.
pub mod math;

/// Tracking-device identities and pair keys.
pub mod device;

pub use device::*;
pub use math::*;
