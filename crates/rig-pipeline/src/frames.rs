//! Coordinate-frame registry and runtime conversion.
//!
//! [`CoordinateFrames`] owns the master-device choice, the pairwise
//! transform graph (forward and inverse entries always written together),
//! per-device floor data, and the yaw/position offsets. Its
//! [`convert_location`](CoordinateFrames::convert_location) and
//! [`convert_rotation`](CoordinateFrames::convert_rotation) functions are
//! the only interface the rest of the application uses to interpret
//! device-native 3D data; they are called every frame for every tracked
//! entity, never allocate, and never fail — missing entries resolve to
//! identity.

use log::{info, warn};
use rig_core::{
    orthonormalize, quaternion_from_rotation, rotation_columns, transform_point, Device,
    DevicePair, Mat3, Mat4, Pt3, Quat, Real, Vec3,
};
use rig_linear::{AffineFit, FloorFit};
use std::collections::HashMap;

/// One direction of a registered pairwise transform, kept in the three
/// forms consumers need.
#[derive(Debug, Clone, Copy)]
pub struct FrameTransform {
    pub matrix: Mat4,
    pub rotation: Quat,
    pub translation: Vec3,
    /// True for the algebraically-derived reverse entry of a registered
    /// pair; persistence snapshots only the solved direction.
    pub derived_inverse: bool,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            matrix: Mat4::identity(),
            rotation: Quat::identity(),
            translation: Vec3::zeros(),
            derived_inverse: false,
        }
    }
}

impl FrameTransform {
    /// Derive the quaternion/translation forms from an affine matrix whose
    /// upper 3×3 block is (close to) a rotation.
    pub fn from_matrix(matrix: Mat4) -> Self {
        let basis = orthonormalize(&rotation_columns(&matrix));
        let mut block = Mat3::zeros();
        for (c, v) in basis.iter().enumerate() {
            block.set_column(c, v);
        }
        Self {
            matrix,
            rotation: quaternion_from_rotation(&block),
            translation: Vec3::new(matrix[(0, 3)], matrix[(1, 3)], matrix[(2, 3)]),
            derived_inverse: false,
        }
    }
}

/// Process-wide coordinate-system state.
#[derive(Debug, Clone)]
pub struct CoordinateFrames {
    master: Device,
    yaw_offset_deg: Real,
    position_offset: Vec3,
    apply_master_correction: bool,
    snap_floor_to_origin: bool,
    transforms: HashMap<DevicePair, FrameTransform>,
    floors: HashMap<Device, FloorFit>,
}

impl Default for CoordinateFrames {
    fn default() -> Self {
        Self::new(Device::TrackerA)
    }
}

impl CoordinateFrames {
    pub fn new(master: Device) -> Self {
        Self {
            master,
            yaw_offset_deg: 0.0,
            position_offset: Vec3::zeros(),
            apply_master_correction: true,
            snap_floor_to_origin: false,
            transforms: HashMap::new(),
            floors: HashMap::new(),
        }
    }

    pub fn master(&self) -> Device {
        self.master
    }

    pub fn set_master(&mut self, master: Device) {
        self.master = master;
    }

    pub fn yaw_offset_degrees(&self) -> Real {
        self.yaw_offset_deg
    }

    pub fn set_yaw_offset_degrees(&mut self, degrees: Real) {
        self.yaw_offset_deg = degrees;
    }

    pub fn position_offset(&self) -> Vec3 {
        self.position_offset
    }

    pub fn set_position_offset(&mut self, offset: Vec3) {
        self.position_offset = offset;
    }

    pub fn apply_master_correction(&self) -> bool {
        self.apply_master_correction
    }

    pub fn set_apply_master_correction(&mut self, apply: bool) {
        self.apply_master_correction = apply;
    }

    pub fn snap_floor_to_origin(&self) -> bool {
        self.snap_floor_to_origin
    }

    pub fn set_snap_floor_to_origin(&mut self, snap: bool) {
        self.snap_floor_to_origin = snap;
    }

    /// Register a solved pairwise fit: writes the forward entry and its
    /// algebraic inverse in one step, keeping the invariant that both
    /// directions of every registered pair exist and agree.
    pub fn set_pair_transform(&mut self, pair: DevicePair, fit: &AffineFit) {
        self.transforms.insert(
            pair,
            FrameTransform {
                matrix: fit.transform,
                rotation: fit.rotation,
                translation: fit.translation,
                derived_inverse: false,
            },
        );
        let mut reverse = FrameTransform::from_matrix(fit.inverse);
        reverse.derived_inverse = true;
        self.transforms.insert(pair.reversed(), reverse);
        info!("registered pair transform {} (and inverse)", pair);
    }

    /// Register a pairwise transform from a bare matrix (persistence load
    /// path); the inverse entry is derived here.
    pub fn set_pair_matrix(&mut self, pair: DevicePair, matrix: Mat4) {
        let inverse = matrix.try_inverse().unwrap_or_else(|| {
            warn!("stored transform for {} is not invertible, using identity inverse", pair);
            Mat4::identity()
        });
        self.transforms.insert(pair, FrameTransform::from_matrix(matrix));
        let mut reverse = FrameTransform::from_matrix(inverse);
        reverse.derived_inverse = true;
        self.transforms.insert(pair.reversed(), reverse);
    }

    /// Registered transform for `pair`, or identity when absent.
    pub fn pair_transform(&self, pair: DevicePair) -> FrameTransform {
        self.transforms.get(&pair).copied().unwrap_or_default()
    }

    pub fn has_pair(&self, pair: DevicePair) -> bool {
        self.transforms.contains_key(&pair)
    }

    /// Iterate registered pair entries (both directions).
    pub fn pairs(&self) -> impl Iterator<Item = (DevicePair, &FrameTransform)> {
        self.transforms.iter().map(|(k, v)| (*k, v))
    }

    pub fn set_floor(&mut self, device: Device, fit: FloorFit) {
        self.floors.insert(device, fit);
    }

    /// Floor data for `device`, or the identity floor when absent.
    pub fn floor(&self, device: Device) -> FloorFit {
        self.floors.get(&device).copied().unwrap_or_default()
    }

    pub fn floors(&self) -> impl Iterator<Item = (Device, &FloorFit)> {
        self.floors.iter().map(|(k, v)| (*k, v))
    }

    fn yaw_rotation(&self) -> Quat {
        Quat::from_axis_angle(&Vec3::y_axis(), self.yaw_offset_deg.to_radians())
    }

    /// Convert a device-native location into the master frame.
    pub fn convert_location(&self, point: Pt3, source: Device) -> Pt3 {
        let mut p = point;
        let mut frame = source;

        if source != self.master && self.apply_master_correction {
            let t = self.pair_transform(DevicePair::new(source, self.master));
            p = transform_point(&t.matrix, &p);
            frame = self.master;
        }

        let floor = self.floor(frame);
        p = floor.pitch * p;
        if self.snap_floor_to_origin {
            p.y += floor.distance;
        }

        p = self.yaw_rotation() * p;
        if frame == self.master {
            p += self.position_offset;
        }
        p
    }

    /// Convert a device-native rotation into the master frame. Mirrors
    /// [`convert_location`](Self::convert_location) without the
    /// translation/floor-distance steps.
    pub fn convert_rotation(&self, rotation: Quat, source: Device) -> Quat {
        let mut q = rotation;
        let mut frame = source;

        if source != self.master && self.apply_master_correction {
            let t = self.pair_transform(DevicePair::new(source, self.master));
            q = t.rotation * q;
            frame = self.master;
        }

        q = self.floor(frame).pitch * q;
        self.yaw_rotation() * q
    }
}
