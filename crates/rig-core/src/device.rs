//! Tracking-device identities.
//!
//! A [`Device`] is a pure tag: it names a tracking source and serves as a
//! map key in the transform registry. [`DevicePair`] is the ordered key for
//! pairwise transforms, replacing ad-hoc `"DeviceX-DeviceY"` string keys.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One tracked hardware source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    /// First depth/skeleton tracker (floor-capable).
    TrackerA,
    /// Second depth/skeleton tracker (floor-capable).
    TrackerB,
    /// Handheld motion controller.
    MotionController,
    /// Positionally tracked head-mounted display.
    HeadsetPositional,
    /// No device; conversions from this source are pass-through.
    None,
}

impl Device {
    /// Whether the device can report a floor plane.
    pub fn is_floor_capable(&self) -> bool {
        matches!(self, Device::TrackerA | Device::TrackerB)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Device::TrackerA => "TrackerA",
            Device::TrackerB => "TrackerB",
            Device::MotionController => "MotionController",
            Device::HeadsetPositional => "HeadsetPositional",
            Device::None => "None",
        };
        write!(f, "{}", name)
    }
}

/// Ordered device pair: the key for a transform mapping `from`-space points
/// into `to`-space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DevicePair {
    pub from: Device,
    pub to: Device,
}

impl DevicePair {
    pub fn new(from: Device, to: Device) -> Self {
        Self { from, to }
    }

    /// The key of the inverse transform.
    pub fn reversed(&self) -> Self {
        Self {
            from: self.to,
            to: self.from,
        }
    }
}

impl fmt::Display for DevicePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.from, self.to)
    }
}
