//! Least-squares affine frame fit.
//!
//! Given N ≥ 4 corresponding 3D points measured by two devices, solves the
//! over-determined system `A·T ≈ B` (A: N×4 homogeneous source rows, B: N×3
//! target rows) through the normal equations, then orthonormalizes the
//! rotation block so the committed transform is rigid up to the fitted
//! translation. Residual magnitude is reported, never used to reject the
//! fit: the caller decides whether the error is acceptable.

use log::debug;
use nalgebra::DMatrix;
use rig_core::{
    orthonormalize, quaternion_from_rotation, rotation_columns, transform_point, Mat3, Mat4, Pt3,
    Quat, Real, Vec3,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AffineFitError {
    #[error("need at least 4 sample pairs, got {0}")]
    NotEnoughSamples(usize),
    #[error("sample count mismatch: {sources} source vs {targets} target")]
    MismatchedSamples { sources: usize, targets: usize },
    #[error("degenerate sample set: least-squares system is rank-deficient")]
    DegenerateSamples,
    #[error("solved transform is not invertible")]
    NonInvertible,
}

/// Result of a pairwise frame fit: the same transform in the three forms
/// runtime consumers need (matrix multiply, quaternion composition, raw
/// offset), plus the fit residual.
#[derive(Debug, Clone)]
pub struct AffineFit {
    /// Source-space points into target-space (rotation orthonormalized).
    pub transform: Mat4,
    /// Algebraic inverse of `transform`.
    pub inverse: Mat4,
    /// Orthonormalized rotation block as a unit quaternion.
    pub rotation: Quat,
    /// Translation column of the fitted map.
    pub translation: Vec3,
    /// Σ‖T(source_i) − target_i‖ over all samples.
    pub total_error: Real,
    /// `total_error / N`.
    pub mean_error: Real,
}

/// Fit the least-squares affine map taking `source` points onto `target`
/// points.
///
/// A coplanar or collinear sample set makes the 4×4 normal-equation matrix
/// singular; that surfaces as [`AffineFitError::DegenerateSamples`] rather
/// than a silent identity or garbage transform.
pub fn fit_affine_map(source: &[Pt3], target: &[Pt3]) -> Result<AffineFit, AffineFitError> {
    let n = source.len();
    if target.len() != n {
        return Err(AffineFitError::MismatchedSamples {
            sources: n,
            targets: target.len(),
        });
    }
    if n < 4 {
        return Err(AffineFitError::NotEnoughSamples(n));
    }

    let mut a = DMatrix::<Real>::zeros(n, 4);
    let mut b = DMatrix::<Real>::zeros(n, 3);
    for (i, (s, t)) in source.iter().zip(target.iter()).enumerate() {
        a[(i, 0)] = s.x;
        a[(i, 1)] = s.y;
        a[(i, 2)] = s.z;
        a[(i, 3)] = 1.0;
        b[(i, 0)] = t.x;
        b[(i, 1)] = t.y;
        b[(i, 2)] = t.z;
    }

    // T = (AᵗA)⁻¹ Aᵗ B, a 4×3 affine map on row vectors.
    let at = a.transpose();
    let ata = &at * &a;
    let ata_inv = ata
        .try_inverse()
        .ok_or(AffineFitError::DegenerateSamples)?;
    let t = ata_inv * at * &b;

    // Transpose into the conventional column-vector form.
    let mut affine = Mat4::identity();
    for r in 0..3 {
        for c in 0..4 {
            affine[(r, c)] = t[(c, r)];
        }
    }

    // Residual of the least-squares map itself, before orthonormalization.
    let total_error: Real = source
        .iter()
        .zip(target.iter())
        .map(|(s, t)| (transform_point(&affine, s) - t).norm())
        .sum();
    let mean_error = total_error / n as Real;

    // Snap the rotation-ish block to a true rotation; keep the fitted
    // translation column as-is. A collinear/coplanar *target* set leaves
    // AᵗA invertible but the fitted block rank-deficient, in which case
    // Gram–Schmidt normalizes a zero vector; surface that instead of
    // returning a NaN transform.
    let basis = orthonormalize(&rotation_columns(&affine));
    if basis
        .iter()
        .any(|v| !(v.x.is_finite() && v.y.is_finite() && v.z.is_finite()))
    {
        return Err(AffineFitError::DegenerateSamples);
    }
    let mut transform = affine;
    let mut rotation_block = Mat3::zeros();
    for (c, v) in basis.iter().enumerate() {
        transform[(0, c)] = v.x;
        transform[(1, c)] = v.y;
        transform[(2, c)] = v.z;
        rotation_block.set_column(c, v);
    }

    let inverse = transform
        .try_inverse()
        .ok_or(AffineFitError::NonInvertible)?;
    let rotation = quaternion_from_rotation(&rotation_block);
    let translation = Vec3::new(transform[(0, 3)], transform[(1, 3)], transform[(2, 3)]);

    debug!(
        "affine fit over {} samples: total error {:.4}, mean {:.4}",
        n, total_error, mean_error
    );

    Ok(AffineFit {
        transform,
        inverse,
        rotation,
        translation,
        total_error,
        mean_error,
    })
}
