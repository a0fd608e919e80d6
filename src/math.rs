//! Math helpers layered on glam.
//!
//! The value types themselves (`Vec3`, `Quat`, `Affine3A`, `Mat4`) come from
//! glam; this module adds the decomposition and orientation operations the
//! scene and collision layers need with well-defined behavior at the edges:
//!
//! - [`decompose_scale`] / [`decompose_rotation`] invert the TRS
//!   construction. A zero-length basis column is left unmodified during
//!   rotation extraction rather than treated as an error.
//! - [`try_invert`] reports singularity through `Option` so callers can skip
//!   the dependent computation instead of propagating NaN.
//! - [`look_rotation`] builds an orthonormal basis by Gram-Schmidt and
//!   refuses degenerate forward/up pairs.

use glam::{Affine3A, Mat3, Quat, Vec3};

/// Tolerance used for near-zero denominators and degenerate bases.
pub const EPSILON: f32 = 1e-6;

/// Reads the translation column of an affine transform.
#[inline]
#[must_use]
pub fn decompose_translation(m: &Affine3A) -> Vec3 {
    m.translation.into()
}

/// Extracts per-axis scale as the length of each basis column.
///
/// Always non-negative; reflections are not recovered.
#[inline]
#[must_use]
pub fn decompose_scale(m: &Affine3A) -> Vec3 {
    Vec3::new(
        m.matrix3.x_axis.length(),
        m.matrix3.y_axis.length(),
        m.matrix3.z_axis.length(),
    )
}

/// Extracts the rotation of an affine transform as a quaternion.
///
/// Scale is removed by dividing each basis column by its length before the
/// trace-based quaternion extraction. Columns with (near) zero scale are
/// left unmodified, so a degenerate transform yields a best-effort rotation
/// rather than NaN.
#[must_use]
pub fn decompose_rotation(m: &Affine3A) -> Quat {
    let scale = decompose_scale(m);

    let mut x_axis = Vec3::from(m.matrix3.x_axis);
    let mut y_axis = Vec3::from(m.matrix3.y_axis);
    let mut z_axis = Vec3::from(m.matrix3.z_axis);
    if scale.x > EPSILON {
        x_axis /= scale.x;
    }
    if scale.y > EPSILON {
        y_axis /= scale.y;
    }
    if scale.z > EPSILON {
        z_axis /= scale.z;
    }

    Quat::from_mat3(&Mat3::from_cols(x_axis, y_axis, z_axis)).normalize()
}

/// Inverts an affine transform, reporting failure on a singular matrix.
///
/// Returns `None` when the determinant of the linear part is exactly zero
/// (e.g. a zero scale component). Callers that may see degenerate
/// transforms must check the result.
#[must_use]
pub fn try_invert(m: &Affine3A) -> Option<Affine3A> {
    if m.matrix3.determinant() == 0.0 {
        return None;
    }
    Some(m.inverse())
}

/// Builds the rotation that orients `-Z` along `forward` with `up` as the
/// vertical reference.
///
/// The basis is orthonormalized by Gram-Schmidt: `forward` is normalized,
/// crossed with `up` to obtain `right`, and `right × forward` gives the
/// corrected up. Returns `None` when `forward` is (near) zero or collinear
/// with `up`.
#[must_use]
pub fn look_rotation(forward: Vec3, up: Vec3) -> Option<Quat> {
    if forward.length_squared() < EPSILON {
        return None;
    }
    let forward = forward.normalize();
    if forward.cross(up).length_squared() < 1e-4 {
        return None;
    }

    let right = forward.cross(up).normalize();
    let corrected_up = right.cross(forward).normalize();

    Some(Quat::from_mat3(&Mat3::from_cols(right, corrected_up, -forward)))
}
