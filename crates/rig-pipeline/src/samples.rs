//! Gated sample buffer for one calibration run.
//!
//! A [`SampleRun`] owns the ordered correspondence samples collected for one
//! device pair and the two gates that keep the set solvable: a fixed
//! sampling interval (pacing) and a per-device minimum-movement threshold
//! (the principal guard against near-duplicate, rank-deficient sample
//! sets). Rejected samples are not errors; sampling just continues.

use log::debug;
use rig_core::{Pt3, Real};

/// Sampling never runs faster than this interval, whatever the configured
/// rate says.
const MIN_SAMPLING_INTERVAL: Real = 0.1;

#[derive(Debug, Clone, Copy)]
pub struct SampleRunConfig {
    /// Number of accepted samples that completes the run.
    pub target_samples: usize,
    /// Desired sampling rate; the derived interval is clamped to
    /// [`MIN_SAMPLING_INTERVAL`].
    pub samples_per_second: Real,
    /// Minimum distance either device must have moved from its last
    /// accepted point for a new sample to count.
    pub min_movement: Real,
}

impl Default for SampleRunConfig {
    fn default() -> Self {
        Self {
            target_samples: 30,
            samples_per_second: 1.0,
            min_movement: 0.2,
        }
    }
}

/// One correspondence observation: the same physical point as measured by
/// each device of the pair.
#[derive(Debug, Clone, Copy)]
pub struct SamplePair {
    pub a: Pt3,
    pub b: Pt3,
}

/// Ordered sample collection for one calibration run.
#[derive(Debug, Clone)]
pub struct SampleRun {
    config: SampleRunConfig,
    samples: Vec<SamplePair>,
    last_a: Option<Pt3>,
    last_b: Option<Pt3>,
    since_last: Real,
}

impl SampleRun {
    pub fn new(config: SampleRunConfig) -> Self {
        Self {
            config,
            samples: Vec::with_capacity(config.target_samples),
            last_a: None,
            last_b: None,
            since_last: 0.0,
        }
    }

    /// Effective sampling interval in seconds.
    pub fn sampling_interval(&self) -> Real {
        (1.0 / self.config.samples_per_second).max(MIN_SAMPLING_INTERVAL)
    }

    /// Advance the pacing clock. Returns true when a sample may be
    /// considered this tick; at most once per sampling interval.
    pub fn tick(&mut self, dt: Real) -> bool {
        self.since_last += dt;
        if self.since_last >= self.sampling_interval() {
            self.since_last = 0.0;
            true
        } else {
            false
        }
    }

    /// Offer a correspondence sample.
    ///
    /// Rejected (no mutation) when either point is the zero/default point,
    /// or when either device has moved less than the configured threshold
    /// since its last accepted point. Accepted samples update both devices'
    /// last-accepted points.
    pub fn try_add(&mut self, a: Pt3, b: Pt3) -> bool {
        if a == Pt3::origin() || b == Pt3::origin() {
            return false;
        }
        if let Some(last) = self.last_a {
            if (a - last).norm() < self.config.min_movement {
                return false;
            }
        }
        if let Some(last) = self.last_b {
            if (b - last).norm() < self.config.min_movement {
                return false;
            }
        }

        self.samples.push(SamplePair { a, b });
        self.last_a = Some(a);
        self.last_b = Some(b);
        debug!(
            "sample {}/{} accepted",
            self.samples.len(),
            self.config.target_samples
        );
        true
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn target(&self) -> usize {
        self.config.target_samples
    }

    pub fn is_complete(&self) -> bool {
        self.samples.len() >= self.config.target_samples
    }

    pub fn samples(&self) -> &[SamplePair] {
        &self.samples
    }

    /// The two parallel point lists for the solver.
    pub fn point_lists(&self) -> (Vec<Pt3>, Vec<Pt3>) {
        (
            self.samples.iter().map(|s| s.a).collect(),
            self.samples.iter().map(|s| s.b).collect(),
        )
    }
}
