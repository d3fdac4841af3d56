//! Persistence of calibration results.
//!
//! [`CalibrationFile`] is the flat serde form of the registry: one record
//! per device pair (rotation + translation) and one per floor-capable
//! device (normal + distance). [`TransformStore`] abstracts where it lives;
//! [`JsonStore`] is the file-backed implementation. A missing file is not
//! an error: [`load_or_seed`] seeds identity defaults and writes a template
//! for the operator to find.

use anyhow::{Context, Result};
use log::info;
use rig_core::{Device, DevicePair, Mat4, Pt3, Quat, Real, Vec3};
use rig_linear::fit_floor;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::frames::CoordinateFrames;

/// One persisted pairwise transform (forward direction only; the inverse is
/// derived on load).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairRecord {
    pub pair: DevicePair,
    pub rotation: Quat,
    pub translation: Vec3,
}

/// One persisted floor fit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorRecord {
    pub device: Device,
    pub normal: Vec3,
    pub distance: Real,
}

/// Flat, serde-friendly snapshot of a [`CoordinateFrames`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub master: Device,
    pub yaw_offset_deg: Real,
    pub position_offset: Vec3,
    pub apply_master_correction: bool,
    pub snap_floor_to_origin: bool,
    pub pairs: Vec<PairRecord>,
    pub floors: Vec<FloorRecord>,
}

impl CalibrationFile {
    /// Snapshot the registry. Each registered pair is written once, in the
    /// solved direction (derived reverse entries are skipped); inverses are
    /// rebuilt on load. Records are sorted so the same registry always
    /// serializes identically.
    pub fn from_frames(frames: &CoordinateFrames) -> Self {
        let mut pairs: Vec<PairRecord> = frames
            .pairs()
            .filter(|(_, t)| !t.derived_inverse)
            .map(|(pair, t)| PairRecord {
                pair,
                rotation: t.rotation,
                translation: t.translation,
            })
            .collect();
        pairs.sort_by_key(|r| r.pair.to_string());

        let mut floors: Vec<FloorRecord> = frames
            .floors()
            .map(|(device, f)| FloorRecord {
                device,
                normal: f.normal,
                distance: f.distance,
            })
            .collect();
        floors.sort_by_key(|r| r.device.to_string());

        Self {
            master: frames.master(),
            yaw_offset_deg: frames.yaw_offset_degrees(),
            position_offset: frames.position_offset(),
            apply_master_correction: frames.apply_master_correction(),
            snap_floor_to_origin: frames.snap_floor_to_origin(),
            pairs,
            floors,
        }
    }

    /// Hydrate a registry from this snapshot. Every pair record also writes
    /// its derived inverse entry; floor pitches are re-derived from the
    /// stored normal and distance.
    pub fn apply_to(&self, frames: &mut CoordinateFrames) {
        frames.set_master(self.master);
        frames.set_yaw_offset_degrees(self.yaw_offset_deg);
        frames.set_position_offset(self.position_offset);
        frames.set_apply_master_correction(self.apply_master_correction);
        frames.set_snap_floor_to_origin(self.snap_floor_to_origin);

        for record in &self.pairs {
            let mut matrix = Mat4::identity();
            matrix
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(record.rotation.to_rotation_matrix().matrix());
            matrix[(0, 3)] = record.translation.x;
            matrix[(1, 3)] = record.translation.y;
            matrix[(2, 3)] = record.translation.z;
            frames.set_pair_matrix(record.pair, matrix);
        }

        for record in &self.floors {
            // A point on the plane sits `distance` below the origin along
            // the normal.
            let on_plane = Pt3::origin() - record.normal.normalize() * record.distance;
            frames.set_floor(record.device, fit_floor(record.normal, on_plane));
        }
    }
}

/// Where calibration snapshots live.
pub trait TransformStore {
    /// `Ok(None)` when no snapshot exists yet.
    fn load(&self) -> Result<Option<CalibrationFile>>;
    fn save(&self, file: &CalibrationFile) -> Result<()>;
}

/// JSON file-backed [`TransformStore`].
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

impl TransformStore for JsonStore {
    fn load(&self) -> Result<Option<CalibrationFile>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let text = fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let file = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Some(file))
    }

    fn save(&self, file: &CalibrationFile) -> Result<()> {
        let text = serde_json::to_string_pretty(file).context("failed to encode calibration")?;
        fs::write(&self.path, text)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        Ok(())
    }
}

/// Load a persisted calibration into `frames`, or seed the store with an
/// identity-valued template when none exists.
pub fn load_or_seed(store: &dyn TransformStore, frames: &mut CoordinateFrames) -> Result<()> {
    match store.load()? {
        Some(file) => {
            file.apply_to(frames);
            info!(
                "loaded calibration: master {}, {} pair(s), {} floor(s)",
                file.master,
                file.pairs.len(),
                file.floors.len()
            );
        }
        None => {
            let template = CalibrationFile::from_frames(frames);
            store.save(&template).context("failed to seed calibration template")?;
            info!("no calibration found, wrote identity template");
        }
    }
    Ok(())
}
