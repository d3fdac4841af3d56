//! Pure geometry utilities.
//!
//! These are the numerical building blocks shared by the affine solver and
//! the floor detector: Gram–Schmidt orthonormalization, rotation extraction
//! from affine transforms, and point/plane arithmetic. All functions are
//! side-effect free.

use nalgebra::Quaternion;

use super::{Mat3, Mat4, Pt3, Quat, Real, Vec3};

/// Stabilized (modified) Gram–Schmidt orthonormalization.
///
/// Output vectors are unit length and mutually orthogonal, produced in the
/// same order as the inputs. Each input is re-projected against every
/// previously *produced* vector, which keeps the process stable when the
/// inputs are nearly parallel.
pub fn orthonormalize(vectors: &[Vec3]) -> Vec<Vec3> {
    let mut basis: Vec<Vec3> = Vec::with_capacity(vectors.len());

    for v in vectors {
        let mut w = *v;
        for b in &basis {
            w -= b * w.dot(b);
        }
        basis.push(w.normalize());
    }

    basis
}

/// Extract the upper 3×3 block of an affine transform as column vectors.
pub fn rotation_columns(m: &Mat4) -> [Vec3; 3] {
    [
        Vec3::new(m[(0, 0)], m[(1, 0)], m[(2, 0)]),
        Vec3::new(m[(0, 1)], m[(1, 1)], m[(2, 1)]),
        Vec3::new(m[(0, 2)], m[(1, 2)], m[(2, 2)]),
    ]
}

/// Convert an orthonormal rotation matrix to a unit quaternion.
///
/// Uses the four-branch method: the branch with the largest trace term is
/// selected so the divisor stays well away from zero, which keeps the
/// conversion stable for rotations at or near 180°.
pub fn quaternion_from_rotation(m: &Mat3) -> Quat {
    let trace = m[(0, 0)] + m[(1, 1)] + m[(2, 2)];

    let q = if trace > 0.0 {
        let s = (trace + 1.0).sqrt() * 2.0;
        Quaternion::new(
            0.25 * s,
            (m[(2, 1)] - m[(1, 2)]) / s,
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(1, 0)] - m[(0, 1)]) / s,
        )
    } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
        let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
        Quaternion::new(
            (m[(2, 1)] - m[(1, 2)]) / s,
            0.25 * s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
        )
    } else if m[(1, 1)] > m[(2, 2)] {
        let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
        Quaternion::new(
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            0.25 * s,
            (m[(1, 2)] + m[(2, 1)]) / s,
        )
    } else {
        let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
        Quaternion::new(
            (m[(1, 0)] - m[(0, 1)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
            (m[(1, 2)] + m[(2, 1)]) / s,
            0.25 * s,
        )
    };

    Quat::from_quaternion(q)
}

/// Orthogonal projection of `point` onto the plane through `point_on_plane`
/// with (not necessarily unit) `normal`.
pub fn project_point_on_plane(normal: &Vec3, point_on_plane: &Pt3, point: &Pt3) -> Pt3 {
    let n = normal.normalize();
    let d = (point - point_on_plane).dot(&n);
    point - n * d
}

/// Signed distance from `point` to the plane through `point_on_plane` with
/// `normal`. Positive on the side the normal points toward.
pub fn signed_plane_distance(normal: &Vec3, point_on_plane: &Pt3, point: &Pt3) -> Real {
    (point - point_on_plane).dot(&normal.normalize())
}

/// Apply an affine 4×4 transform to a 3D point.
pub fn transform_point(m: &Mat4, p: &Pt3) -> Pt3 {
    let v = m * p.to_homogeneous();
    Pt3::new(v.x, v.y, v.z)
}
