//! Floor-plane fit.
//!
//! A floor-capable device reports a floor-plane normal plus a point on that
//! plane, both in its own frame. The fit yields the device's "up"
//! correction and its height above the floor. Degenerate reports (near-zero
//! normal, NaN geometry) fall back to safe defaults instead of propagating.

use log::warn;
use rig_core::{project_point_on_plane, up, Pt3, Quat, Real, Vec3};
use serde::{Deserialize, Serialize};

/// Magnitude below which a reported normal counts as degenerate.
const NORMAL_EPS: Real = 1e-6;

/// Per-device floor data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloorFit {
    /// Unit floor normal in device space (canonical up when degenerate).
    pub normal: Vec3,
    /// Signed height of the device origin above the floor plane.
    pub distance: Real,
    /// Rotation taking `normal` onto canonical up (the inverse of the
    /// device's tilt), so conversion code applies it to raw points directly.
    pub pitch: Quat,
}

impl Default for FloorFit {
    fn default() -> Self {
        Self {
            normal: up(),
            distance: 0.0,
            pitch: Quat::identity(),
        }
    }
}

/// Fit floor data from a device-reported plane.
///
/// The same input always yields the same output; feeding a stored fit's
/// plane back in reproduces the fit.
pub fn fit_floor(normal: Vec3, point_on_plane: Pt3) -> FloorFit {
    let normal = if normal.norm() < NORMAL_EPS {
        warn!("degenerate floor normal {:?}, falling back to canonical up", normal);
        up()
    } else {
        normal.normalize()
    };

    let projected = project_point_on_plane(&normal, &point_on_plane, &Pt3::origin());
    let mut distance = (Pt3::origin() - projected).dot(&normal);
    if distance.is_nan() {
        warn!("floor distance is NaN, clamping to 0");
        distance = 0.0;
    }

    // The device's tilt carries up onto its reported normal; store the
    // inverse so applying `pitch` levels device-space data.
    let tilt = Quat::rotation_between(&up(), &normal)
        // Antiparallel normal: any half turn through a horizontal axis works.
        .unwrap_or_else(|| Quat::from_axis_angle(&Vec3::x_axis(), std::f64::consts::PI));

    FloorFit {
        normal,
        distance,
        pitch: tilt.inverse(),
    }
}
