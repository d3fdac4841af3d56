//! Device-pair calibration variants.
//!
//! All three variants drive the shared [`ProcessCore`]; they differ only in
//! the `ReadyToCalibrate` gate. The tracker↔tracker and headset↔tracker
//! flows pass straight through; the controller↔tracker flow shows the
//! controller's pitch angle and waits for an explicit operator
//! confirmation before sampling starts.

use anyhow::Result;
use rig_core::{DevicePair, Real};
use rig_linear::AffineFit;

use crate::frames::CoordinateFrames;
use crate::persist::TransformStore;

use super::engine::{FlowOptions, ProcessCore, StatusText};
use super::{CalibrationFlow, DeviceInput, PairKind, Phase};

macro_rules! delegate_flow_accessors {
    () => {
        fn pair(&self) -> DevicePair {
            self.core.pair
        }

        fn phase(&self) -> Phase {
            self.core.phase
        }

        fn status(&self) -> &StatusText {
            &self.core.status
        }

        fn result(&self) -> Option<&AffineFit> {
            self.core.result.as_ref()
        }

        fn reset(&mut self) {
            self.core.reset();
        }
    };
}

/// Depth tracker ↔ depth tracker calibration.
pub struct TrackerTrackerFlow {
    core: ProcessCore,
}

impl TrackerTrackerFlow {
    pub fn new(options: FlowOptions) -> Self {
        Self {
            core: ProcessCore::new(PairKind::TrackerTracker.device_pair(), options),
        }
    }
}

impl CalibrationFlow for TrackerTrackerFlow {
    fn kind(&self) -> PairKind {
        PairKind::TrackerTracker
    }

    delegate_flow_accessors!();

    fn tick(
        &mut self,
        dt: Real,
        input: &dyn DeviceInput,
        frames: &mut CoordinateFrames,
        store: &dyn TransformStore,
    ) -> Result<()> {
        match self.core.phase {
            Phase::Initial => self.core.tick_initial(dt, input),
            Phase::Preparation => self.core.tick_preparation(dt, input),
            // Both devices track the same body; nothing to line up first.
            Phase::ReadyToCalibrate => self.core.set_phase(Phase::Calibration),
            Phase::Calibration => self.core.tick_calibration(dt, input),
            Phase::ShowResults => return self.core.tick_show_results(input, frames, store),
            Phase::Invalid => {}
        }
        Ok(())
    }
}

/// Motion controller ↔ depth tracker calibration.
pub struct ControllerTrackerFlow {
    core: ProcessCore,
}

impl ControllerTrackerFlow {
    pub fn new(options: FlowOptions) -> Self {
        Self {
            core: ProcessCore::new(PairKind::ControllerTracker.device_pair(), options),
        }
    }
}

impl CalibrationFlow for ControllerTrackerFlow {
    fn kind(&self) -> PairKind {
        PairKind::ControllerTracker
    }

    delegate_flow_accessors!();

    fn tick(
        &mut self,
        dt: Real,
        input: &dyn DeviceInput,
        frames: &mut CoordinateFrames,
        store: &dyn TransformStore,
    ) -> Result<()> {
        match self.core.phase {
            Phase::Initial => self.core.tick_initial(dt, input),
            Phase::Preparation => self.core.tick_preparation(dt, input),
            Phase::ReadyToCalibrate => {
                // Let the operator level the controller, then confirm.
                self.core.status.upper = "Hold the controller level".into();
                self.core.status.lower = match input
                    .pitch_angle_degrees(self.core.pair.from)
                {
                    Some(pitch) => format!("Pitch {:+.1}°, press confirm to start", pitch),
                    None => "Press confirm to start".into(),
                };
                if input.confirmed() {
                    self.core.set_phase(Phase::Calibration);
                }
            }
            Phase::Calibration => self.core.tick_calibration(dt, input),
            Phase::ShowResults => return self.core.tick_show_results(input, frames, store),
            Phase::Invalid => {}
        }
        Ok(())
    }
}

/// Headset positional tracking ↔ depth tracker calibration.
pub struct HeadsetTrackerFlow {
    core: ProcessCore,
}

impl HeadsetTrackerFlow {
    pub fn new(options: FlowOptions) -> Self {
        Self {
            core: ProcessCore::new(PairKind::HeadsetTracker.device_pair(), options),
        }
    }
}

impl CalibrationFlow for HeadsetTrackerFlow {
    fn kind(&self) -> PairKind {
        PairKind::HeadsetTracker
    }

    delegate_flow_accessors!();

    fn tick(
        &mut self,
        dt: Real,
        input: &dyn DeviceInput,
        frames: &mut CoordinateFrames,
        store: &dyn TransformStore,
    ) -> Result<()> {
        match self.core.phase {
            Phase::Initial => self.core.tick_initial(dt, input),
            Phase::Preparation => self.core.tick_preparation(dt, input),
            // The headset is worn by the tracked body; start sampling as
            // soon as the body is seen.
            Phase::ReadyToCalibrate => self.core.set_phase(Phase::Calibration),
            Phase::Calibration => self.core.tick_calibration(dt, input),
            Phase::ShowResults => return self.core.tick_show_results(input, frames, store),
            Phase::Invalid => {}
        }
        Ok(())
    }
}

/// Build the calibration process for a device-pair kind.
pub fn make_flow(kind: PairKind, options: FlowOptions) -> Box<dyn CalibrationFlow> {
    match kind {
        PairKind::TrackerTracker => Box::new(TrackerTrackerFlow::new(options)),
        PairKind::ControllerTracker => Box::new(ControllerTrackerFlow::new(options)),
        PairKind::HeadsetTracker => Box::new(HeadsetTrackerFlow::new(options)),
    }
}
