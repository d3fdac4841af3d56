//! Calibration pipeline for `rig-calibration-rs`.
//!
//! This crate holds everything stateful: the gated sample buffer filled
//! during a calibration run, the per-device-pair calibration state machines,
//! the coordinate-frame registry with the runtime conversion entry points,
//! and JSON persistence of calibration results.
//!
//! ```ignore
//! use rig_core::Device;
//! use rig_pipeline::{make_flow, CoordinateFrames, FlowOptions, JsonStore, PairKind};
//!
//! let mut frames = CoordinateFrames::default();
//! let store = JsonStore::new("calibration.json");
//! rig_pipeline::load_or_seed(&store, &mut frames)?;
//!
//! let mut flow = make_flow(PairKind::TrackerTracker, FlowOptions::default());
//! // every frame:
//! flow.tick(dt, &input, &mut frames, &store)?;
//! let world = frames.convert_location(point, Device::TrackerB);
//! ```

/// Gated sample buffer for one calibration run.
pub mod samples;

/// Coordinate-frame registry and runtime conversion.
pub mod frames;

/// Persistence of calibration results.
pub mod persist;

/// Calibration process state machines.
pub mod process;

pub use frames::{CoordinateFrames, FrameTransform};
pub use persist::{load_or_seed, CalibrationFile, JsonStore, TransformStore};
pub use process::{
    make_flow, CalibrationFlow, DeviceInput, FlowOptions, PairKind, Phase, StatusText,
};
pub use samples::{SamplePair, SampleRun, SampleRunConfig};
