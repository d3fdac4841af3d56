//! Shared state-machine core used by every device-pair variant.

use anyhow::{Context, Result};
use log::info;
use rig_core::{DevicePair, Real};
use rig_linear::{fit_affine_map, fit_floor, AffineFit};

use crate::frames::CoordinateFrames;
use crate::persist::{CalibrationFile, TransformStore};
use crate::samples::{SampleRun, SampleRunConfig};

use super::{DeviceInput, Phase};

/// Status text for the presentation collaborator, refreshed every tick.
#[derive(Debug, Clone, Default)]
pub struct StatusText {
    pub upper: String,
    pub lower: String,
}

/// Timing and sampling options for a calibration process.
#[derive(Debug, Clone, Copy)]
pub struct FlowOptions {
    /// Warm-up delay before the first device check, seconds.
    pub warmup: Real,
    /// How long each device gets to come up before the process fails.
    pub device_check_window: Real,
    pub sample_config: SampleRunConfig,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            warmup: 2.0,
            device_check_window: 10.0,
            sample_config: SampleRunConfig::default(),
        }
    }
}

/// Phase state, timers, sample run and results shared by all variants.
///
/// The pair variants differ only in the `ReadyToCalibrate` gate; everything
/// else funnels through here.
pub(super) struct ProcessCore {
    pub pair: DevicePair,
    pub options: FlowOptions,
    pub phase: Phase,
    pub elapsed: Real,
    first_device_ok: bool,
    pub run: SampleRun,
    pub status: StatusText,
    pub result: Option<AffineFit>,
    finished: bool,
}

impl ProcessCore {
    pub fn new(pair: DevicePair, options: FlowOptions) -> Self {
        Self {
            pair,
            options,
            phase: Phase::Initial,
            elapsed: 0.0,
            first_device_ok: false,
            run: SampleRun::new(options.sample_config),
            status: StatusText::default(),
            result: None,
            finished: false,
        }
    }

    pub fn set_phase(&mut self, phase: Phase) {
        info!("calibration {}: {:?} -> {:?}", self.pair, self.phase, phase);
        self.phase = phase;
        self.elapsed = 0.0;
    }

    pub fn fail(&mut self, message: String) {
        self.status.upper = "Calibration failed".into();
        self.status.lower = message;
        self.set_phase(Phase::Invalid);
    }

    pub fn reset(&mut self) {
        self.run = SampleRun::new(self.options.sample_config);
        self.status = StatusText::default();
        self.result = None;
        self.finished = false;
        self.first_device_ok = false;
        self.set_phase(Phase::Initial);
    }

    /// `Initial`: warm up, then bring each device up in turn, each within
    /// its own check window so status text can report per-device progress.
    pub fn tick_initial(&mut self, dt: Real, input: &dyn DeviceInput) {
        self.elapsed += dt;

        if self.elapsed < self.options.warmup {
            self.status.upper = "Starting calibration".into();
            self.status.lower = "Initializing...".into();
            return;
        }

        let window = self.options.device_check_window;
        if !self.first_device_ok {
            self.status.lower = format!("Connecting to {}...", self.pair.from);
            if input.is_available(self.pair.from) {
                self.first_device_ok = true;
                // Restart the timer so the second device gets a full window
                // regardless of how long the first one took.
                self.elapsed = 0.0;
            } else if self.elapsed > self.options.warmup + window {
                self.fail(format!("{} is not available", self.pair.from));
            }
            return;
        }

        self.status.lower = format!("Connecting to {}...", self.pair.to);
        if input.is_available(self.pair.to) {
            self.set_phase(Phase::Preparation);
        } else if self.elapsed > window {
            self.fail(format!("{} is not available", self.pair.to));
        }
    }

    /// `Preparation`: loop until the master-side device sees a live target.
    pub fn tick_preparation(&mut self, dt: Real, input: &dyn DeviceInput) {
        self.elapsed += dt;
        self.status.upper = "Get ready".into();
        self.status.lower = format!("Step in front of {}", self.pair.to);
        if input.has_tracked_target(self.pair.to) {
            self.set_phase(Phase::ReadyToCalibrate);
        }
    }

    /// `Calibration`: pace-gated sampling until the run completes.
    pub fn tick_calibration(&mut self, dt: Real, input: &dyn DeviceInput) {
        self.status.upper = "Calibrating".into();
        self.status.lower = format!(
            "Keep the target moving ({}/{} samples)",
            self.run.len(),
            self.run.target()
        );

        if !self.run.tick(dt) {
            return;
        }
        if let (Some(a), Some(b)) = (input.point(self.pair.from), input.point(self.pair.to)) {
            self.run.try_add(a, b);
        }
        if self.run.is_complete() {
            self.set_phase(Phase::ShowResults);
        }
    }

    /// `ShowResults`: solve, commit, persist — exactly once.
    pub fn tick_show_results(
        &mut self,
        input: &dyn DeviceInput,
        frames: &mut CoordinateFrames,
        store: &dyn TransformStore,
    ) -> Result<()> {
        if self.finished {
            return Ok(());
        }

        let (source, target) = self.run.point_lists();
        let fit = match fit_affine_map(&source, &target) {
            Ok(fit) => fit,
            Err(e) => {
                self.fail(format!("transform solve failed: {}", e));
                return Err(e).context("transform solve failed");
            }
        };

        frames.set_pair_transform(self.pair, &fit);

        for device in [self.pair.from, self.pair.to] {
            if !device.is_floor_capable() {
                continue;
            }
            if let Some((normal, on_plane)) = input.floor_plane(device) {
                frames.set_floor(device, fit_floor(normal, on_plane));
            }
        }

        let file = CalibrationFile::from_frames(frames);
        store
            .save(&file)
            .context("failed to persist calibration results")?;

        self.status.upper = "Calibration complete".into();
        self.status.lower = format!(
            "Total error {:.3}, mean error {:.4}",
            fit.total_error, fit.mean_error
        );
        info!(
            "calibration {} committed: total error {:.4}, mean {:.4}",
            self.pair, fit.total_error, fit.mean_error
        );

        self.result = Some(fit);
        self.finished = true;
        Ok(())
    }
}
