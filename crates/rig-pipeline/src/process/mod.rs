//! Calibration process state machines.
//!
//! One calibration process runs per device pair, driven by the host's frame
//! tick. Every pair variant shares the same phase contract:
//!
//! `Initial → Preparation → ReadyToCalibrate → Calibration → ShowResults`,
//! with a terminal `Invalid` reachable from any phase on unrecoverable
//! device failure. Nothing is committed to the registry before
//! `ShowResults` completes; cancelling is just [`CalibrationFlow::reset`].
//!
//! Acquisition and presentation are collaborators: acquisition is consumed
//! through [`DeviceInput`], presentation reads [`StatusText`].

mod engine;
mod flows;

pub use engine::{FlowOptions, StatusText};
pub use flows::{make_flow, ControllerTrackerFlow, HeadsetTrackerFlow, TrackerTrackerFlow};

use anyhow::Result;
use rig_core::{Device, DevicePair, Pt3, Quat, Real, Vec3};
use rig_linear::AffineFit;

use crate::frames::CoordinateFrames;
use crate::persist::TransformStore;

/// Phase of a calibration process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Preparation,
    ReadyToCalibrate,
    Calibration,
    ShowResults,
    Invalid,
}

/// Supported device-pair combinations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairKind {
    /// Second depth tracker calibrated against the first.
    TrackerTracker,
    /// Motion controller calibrated against a depth tracker.
    ControllerTracker,
    /// Headset positional tracking calibrated against a depth tracker.
    HeadsetTracker,
}

impl PairKind {
    /// The pair this kind calibrates, ordered source → master-side device.
    pub fn device_pair(&self) -> DevicePair {
        match self {
            PairKind::TrackerTracker => DevicePair::new(Device::TrackerB, Device::TrackerA),
            PairKind::ControllerTracker => {
                DevicePair::new(Device::MotionController, Device::TrackerA)
            }
            PairKind::HeadsetTracker => {
                DevicePair::new(Device::HeadsetPositional, Device::TrackerA)
            }
        }
    }
}

/// Acquisition collaborator interface: everything the state machine needs
/// from the device layer, polled once per tick.
pub trait DeviceInput {
    /// Is the device connected and delivering data?
    fn is_available(&self, device: Device) -> bool;

    /// Does the device currently see a live tracked target (e.g. a body)?
    fn has_tracked_target(&self, device: Device) -> bool;

    /// Current tracked point for the calibration target, device space.
    fn point(&self, device: Device) -> Option<Pt3>;

    /// Current tracked rotation for the calibration target, device space.
    fn rotation(&self, device: Device) -> Option<Quat>;

    /// Floor plane (normal, point on plane) for floor-capable devices.
    fn floor_plane(&self, device: Device) -> Option<(Vec3, Pt3)>;

    /// Pitch angle in degrees for devices that report one (used for the
    /// controller leveling display).
    fn pitch_angle_degrees(&self, _device: Device) -> Option<Real> {
        None
    }

    /// Operator confirmation signal (button press) for gated variants.
    fn confirmed(&self) -> bool {
        false
    }
}

/// The shared contract every device-pair calibration variant implements.
pub trait CalibrationFlow {
    fn kind(&self) -> PairKind;

    /// The device pair being calibrated (source → master-side).
    fn pair(&self) -> DevicePair;

    fn phase(&self) -> Phase;

    /// Status text for the presentation collaborator.
    fn status(&self) -> &StatusText;

    /// The committed fit, available once `ShowResults` has run.
    fn result(&self) -> Option<&AffineFit>;

    /// Advance the process by one frame tick of `dt` seconds.
    fn tick(
        &mut self,
        dt: Real,
        input: &dyn DeviceInput,
        frames: &mut CoordinateFrames,
        store: &dyn TransformStore,
    ) -> Result<()>;

    /// Abort: discard the sample run and return to `Initial`.
    fn reset(&mut self);
}
