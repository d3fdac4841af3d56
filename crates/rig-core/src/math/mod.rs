//! Mathematical type definitions and small shared helpers.
//!
//! Everything downstream works with these aliases so the scalar type and
//! vertical-axis convention live in exactly one place.

use nalgebra::{Matrix3, Matrix4, Point3, UnitQuaternion, Vector3};

pub mod geometry;

pub use geometry::{
    orthonormalize, project_point_on_plane, quaternion_from_rotation, rotation_columns,
    signed_plane_distance, transform_point,
};

/// Scalar type used throughout the library (currently `f64`).
pub type Real = f64;

/// 3D vector with [`Real`] components.
pub type Vec3 = Vector3<Real>;
/// 3D point with [`Real`] coordinates.
pub type Pt3 = Point3<Real>;
/// 3×3 matrix with [`Real`] entries.
pub type Mat3 = Matrix3<Real>;
/// 4×4 matrix with [`Real`] entries.
pub type Mat4 = Matrix4<Real>;
/// Unit quaternion with [`Real`] components.
pub type Quat = UnitQuaternion<Real>;

/// Canonical "up" direction of the master frame (+Y).
pub fn up() -> Vec3 {
    Vec3::y()
}
