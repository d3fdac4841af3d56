//! End-to-end calibration scenarios driven through the public API.

use std::cell::{Cell, RefCell};

use anyhow::Result;
use rig_core::{Device, DevicePair, Pt3, Quat, Vec3};
use rig_pipeline::{
    make_flow, CalibrationFile, CoordinateFrames, DeviceInput, FlowOptions, PairKind, Phase,
    SampleRunConfig, TransformStore,
};

/// Scripted acquisition stub: both trackers watch the same moving target,
/// TrackerA seeing it shifted by a fixed offset.
struct ScriptedInput {
    position: Cell<Pt3>,
    offset: Vec3,
    available: bool,
    tracking: bool,
}

impl ScriptedInput {
    fn new(offset: Vec3) -> Self {
        Self {
            position: Cell::new(Pt3::new(0.1, 0.2, 0.0)),
            offset,
            available: true,
            tracking: true,
        }
    }
}

impl DeviceInput for ScriptedInput {
    fn is_available(&self, _device: Device) -> bool {
        self.available
    }

    fn has_tracked_target(&self, _device: Device) -> bool {
        self.tracking
    }

    fn point(&self, device: Device) -> Option<Pt3> {
        let p = self.position.get();
        match device {
            Device::TrackerA => Some(p + self.offset),
            _ => Some(p),
        }
    }

    fn rotation(&self, _device: Device) -> Option<Quat> {
        Some(Quat::identity())
    }

    fn floor_plane(&self, device: Device) -> Option<(Vec3, Pt3)> {
        device
            .is_floor_capable()
            .then(|| (Vec3::y(), Pt3::new(0.0, -1.0, 0.0)))
    }
}

/// In-memory store counting saves.
#[derive(Default)]
struct MemStore {
    file: RefCell<Option<CalibrationFile>>,
    saves: Cell<usize>,
}

impl TransformStore for MemStore {
    fn load(&self) -> Result<Option<CalibrationFile>> {
        Ok(self.file.borrow().clone())
    }

    fn save(&self, file: &CalibrationFile) -> Result<()> {
        *self.file.borrow_mut() = Some(file.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

fn fast_options(target_samples: usize) -> FlowOptions {
    FlowOptions {
        warmup: 2.0,
        device_check_window: 5.0,
        sample_config: SampleRunConfig {
            target_samples,
            samples_per_second: 10.0,
            min_movement: 0.2,
        },
    }
}

/// Well-separated, non-coplanar target path.
const TARGET_PATH: [[f64; 3]; 12] = [
    [0.1, 0.2, 0.0],
    [1.1, 0.5, 0.3],
    [0.4, 1.6, 0.9],
    [1.8, 0.3, 1.5],
    [0.2, 1.1, 2.2],
    [1.5, 1.9, 0.6],
    [0.7, 0.4, 1.8],
    [1.9, 1.2, 2.4],
    [0.3, 1.8, 1.2],
    [1.2, 0.8, 0.2],
    [0.6, 1.4, 2.8],
    [1.7, 0.6, 1.0],
];

#[test]
fn tracker_pair_calibration_recovers_translation() {
    let shift = Vec3::new(1.0, 0.0, 5.0);
    let input = ScriptedInput::new(shift);
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::TrackerTracker, fast_options(6));

    let pair = DevicePair::new(Device::TrackerB, Device::TrackerA);
    assert_eq!(flow.pair(), pair);

    for step in 0..60 {
        input
            .position
            .set(Pt3::from(Vec3::from(TARGET_PATH[step % TARGET_PATH.len()])));
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
        if flow.phase() == Phase::ShowResults && flow.result().is_some() {
            break;
        }
    }

    assert_eq!(flow.phase(), Phase::ShowResults);
    let fit = flow.result().expect("calibration should have produced a fit");

    // Pure translation between the two trackers: identity rotation, the
    // exact offset, near-zero residual.
    assert!((fit.translation - shift).norm() < 1e-6, "{:?}", fit.translation);
    assert!(fit.rotation.angle() < 1e-6);
    assert!(fit.mean_error < 1e-6);

    // Committed to the registry in both directions.
    assert!(frames.has_pair(pair));
    assert!(frames.has_pair(pair.reversed()));

    // Runtime conversion now lands TrackerB points in master space.
    let p = Pt3::new(0.5, 1.0, -0.2);
    let converted = frames.convert_location(p, Device::TrackerB);
    assert!((converted - (p + shift)).norm() < 1e-6);

    // Floor data captured for both floor-capable trackers.
    assert!((frames.floor(Device::TrackerA).distance - 1.0).abs() < 1e-9);
    assert!((frames.floor(Device::TrackerB).distance - 1.0).abs() < 1e-9);

    // Persisted exactly once.
    assert_eq!(store.saves.get(), 1);
    assert!(store.file.borrow().is_some());
}

#[test]
fn show_results_commits_only_once() {
    let input = ScriptedInput::new(Vec3::new(0.0, 0.5, 0.0));
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::TrackerTracker, fast_options(6));

    for step in 0..40 {
        input
            .position
            .set(Pt3::from(Vec3::from(TARGET_PATH[step % TARGET_PATH.len()])));
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
    }
    assert_eq!(flow.phase(), Phase::ShowResults);

    // The process idles in ShowResults; repeated ticks must not re-solve or
    // re-persist.
    for _ in 0..10 {
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
    }
    assert_eq!(store.saves.get(), 1);
}

#[test]
fn unavailable_device_fails_with_message() {
    let mut input = ScriptedInput::new(Vec3::zeros());
    input.available = false;
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::TrackerTracker, fast_options(6));

    for _ in 0..30 {
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
        if flow.phase() == Phase::Invalid {
            break;
        }
    }

    assert_eq!(flow.phase(), Phase::Invalid);
    assert!(flow.status().lower.contains("TrackerB"));
    // Nothing committed, nothing persisted.
    assert!(!frames.has_pair(flow.pair()));
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn second_device_gets_its_own_check_window() {
    struct SplitInput {
        inner: ScriptedInput,
        tracker_a_up: Cell<bool>,
    }

    impl DeviceInput for SplitInput {
        fn is_available(&self, device: Device) -> bool {
            match device {
                Device::TrackerA => self.tracker_a_up.get(),
                _ => true,
            }
        }
        fn has_tracked_target(&self, device: Device) -> bool {
            self.inner.has_tracked_target(device)
        }
        fn point(&self, device: Device) -> Option<Pt3> {
            self.inner.point(device)
        }
        fn rotation(&self, device: Device) -> Option<Quat> {
            self.inner.rotation(device)
        }
        fn floor_plane(&self, device: Device) -> Option<(Vec3, Pt3)> {
            self.inner.floor_plane(device)
        }
    }

    let input = SplitInput {
        inner: ScriptedInput::new(Vec3::zeros()),
        tracker_a_up: Cell::new(false),
    };
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::TrackerTracker, fast_options(6));

    // TrackerB connects right after warm-up; TrackerA stays down. Its check
    // window starts when TrackerB connects, so the process must give up
    // after warmup + one window, not warmup + two.
    for step in 0..12 {
        if step == 9 {
            input.tracker_a_up.set(true);
        }
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
    }

    assert_eq!(flow.phase(), Phase::Invalid);
    assert!(flow.status().lower.contains("TrackerA"));
}

#[test]
fn reset_discards_run_and_returns_to_initial() {
    let input = ScriptedInput::new(Vec3::new(2.0, 0.0, 0.0));
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::TrackerTracker, fast_options(20));

    // Get partway into Calibration, then abort.
    for step in 0..12 {
        input
            .position
            .set(Pt3::from(Vec3::from(TARGET_PATH[step % TARGET_PATH.len()])));
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
    }
    assert_eq!(flow.phase(), Phase::Calibration);

    flow.reset();
    assert_eq!(flow.phase(), Phase::Initial);
    assert!(flow.result().is_none());
    // No partial commit happened before ShowResults.
    assert!(!frames.has_pair(flow.pair()));
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn controller_flow_waits_for_confirmation() {
    struct ConfirmableInput {
        inner: ScriptedInput,
        confirmed: Cell<bool>,
    }

    impl DeviceInput for ConfirmableInput {
        fn is_available(&self, device: Device) -> bool {
            self.inner.is_available(device)
        }
        fn has_tracked_target(&self, device: Device) -> bool {
            self.inner.has_tracked_target(device)
        }
        fn point(&self, device: Device) -> Option<Pt3> {
            self.inner.point(device)
        }
        fn rotation(&self, device: Device) -> Option<Quat> {
            self.inner.rotation(device)
        }
        fn floor_plane(&self, device: Device) -> Option<(Vec3, Pt3)> {
            self.inner.floor_plane(device)
        }
        fn pitch_angle_degrees(&self, _device: Device) -> Option<f64> {
            Some(3.2)
        }
        fn confirmed(&self) -> bool {
            self.confirmed.get()
        }
    }

    let input = ConfirmableInput {
        inner: ScriptedInput::new(Vec3::new(0.5, 0.0, 0.0)),
        confirmed: Cell::new(false),
    };
    let store = MemStore::default();
    let mut frames = CoordinateFrames::default();
    let mut flow = make_flow(PairKind::ControllerTracker, fast_options(6));

    // Without confirmation the flow parks in ReadyToCalibrate.
    for _ in 0..15 {
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
    }
    assert_eq!(flow.phase(), Phase::ReadyToCalibrate);
    assert!(flow.status().lower.contains("confirm"));

    // Confirm, then sampling proceeds to completion.
    input.confirmed.set(true);
    for step in 0..40 {
        input
            .inner
            .position
            .set(Pt3::from(Vec3::from(TARGET_PATH[step % TARGET_PATH.len()])));
        flow.tick(1.0, &input, &mut frames, &store).unwrap();
        if flow.phase() == Phase::ShowResults && flow.result().is_some() {
            break;
        }
    }
    assert_eq!(flow.phase(), Phase::ShowResults);
    assert!(frames.has_pair(DevicePair::new(
        Device::MotionController,
        Device::TrackerA
    )));
}
