//! Closed-form solvers for `rig-calibration-rs`.
//!
//! - [`affine`]: least-squares affine map between two devices' sample sets.
//! - [`floor`]: per-device floor-plane fit (up correction + height offset).

mod affine;
mod floor;

pub use affine::*;
pub use floor::*;
