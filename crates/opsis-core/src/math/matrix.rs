// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the `Mat4` type and associated operations.

use super::{Vec3, Vec4, EPSILON};
use std::ops::Mul;

/// A 4x4 column-major matrix used for 3D affine transformations.
///
/// Points transform as `m * Vec4::from_vec3(p, 1.0)`. Composition follows the
/// column-vector convention: in the product `a * b`, `b` is applied to a
/// point first, then `a`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Mat4 {
    /// The columns of the matrix. `cols[3]` holds the translation.
    pub cols: [Vec4; 4],
}

impl Mat4 {
    /// The 4x4 identity matrix.
    pub const IDENTITY: Self = Self {
        cols: [
            Vec4::new(1.0, 0.0, 0.0, 0.0),
            Vec4::new(0.0, 1.0, 0.0, 0.0),
            Vec4::new(0.0, 0.0, 1.0, 0.0),
            Vec4::new(0.0, 0.0, 0.0, 1.0),
        ],
    };

    /// Creates a new matrix from four column vectors.
    #[inline]
    pub const fn from_cols(c0: Vec4, c1: Vec4, c2: Vec4, c3: Vec4) -> Self {
        Self {
            cols: [c0, c1, c2, c3],
        }
    }

    /// Returns a row of the matrix as a `Vec4`.
    #[inline]
    pub fn get_row(&self, index: usize) -> Vec4 {
        Vec4 {
            x: self.cols[0][index],
            y: self.cols[1][index],
            z: self.cols[2][index],
            w: self.cols[3][index],
        }
    }

    /// Creates a translation matrix.
    #[inline]
    pub fn from_translation(v: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(1.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 1.0, 0.0),
                Vec4::new(v.x, v.y, v.z, 1.0),
            ],
        }
    }

    /// Creates a non-uniform scaling matrix.
    #[inline]
    pub fn from_scale(scale: Vec3) -> Self {
        Self {
            cols: [
                Vec4::new(scale.x, 0.0, 0.0, 0.0),
                Vec4::new(0.0, scale.y, 0.0, 0.0),
                Vec4::new(0.0, 0.0, scale.z, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a matrix for a rotation around the X-axis.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle of rotation in radians.
    #[inline]
    pub fn from_rotation_x(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                Vec4::new(1.0, 0.0, 0.0, 0.0),
                Vec4::new(0.0, c, s, 0.0),
                Vec4::new(0.0, -s, c, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a matrix for a rotation around the Y-axis.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle of rotation in radians.
    #[inline]
    pub fn from_rotation_y(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                Vec4::new(c, 0.0, -s, 0.0),
                Vec4::new(0.0, 1.0, 0.0, 0.0),
                Vec4::new(s, 0.0, c, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Creates a matrix for a rotation around the Z-axis.
    ///
    /// # Arguments
    ///
    /// * `angle`: The angle of rotation in radians.
    #[inline]
    pub fn from_rotation_z(angle: f32) -> Self {
        let (s, c) = angle.sin_cos();
        Self {
            cols: [
                Vec4::new(c, s, 0.0, 0.0),
                Vec4::new(-s, c, 0.0, 0.0),
                Vec4::new(0.0, 0.0, 1.0, 0.0),
                Vec4::new(0.0, 0.0, 0.0, 1.0),
            ],
        }
    }

    /// Transforms a point by this matrix, assuming `w = 1`.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        (*self * Vec4::from_vec3(p, 1.0)).truncate()
    }

    /// Computes the inverse of this matrix, assuming it is affine
    /// (the bottom row is `[0, 0, 0, 1]`).
    ///
    /// # Returns
    ///
    /// `None` if the upper-left 3x3 block is singular.
    pub fn affine_inverse(&self) -> Option<Self> {
        let m = |c: usize, r: usize| self.cols[c][r];

        // Cofactors of the upper-left 3x3 block.
        let c00 = m(1, 1) * m(2, 2) - m(2, 1) * m(1, 2);
        let c01 = m(2, 0) * m(1, 2) - m(1, 0) * m(2, 2);
        let c02 = m(1, 0) * m(2, 1) - m(2, 0) * m(1, 1);

        let det = m(0, 0) * c00 + m(0, 1) * c01 + m(0, 2) * c02;
        if det.abs() < EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;

        let c10 = m(2, 1) * m(0, 2) - m(0, 1) * m(2, 2);
        let c11 = m(0, 0) * m(2, 2) - m(2, 0) * m(0, 2);
        let c12 = m(2, 0) * m(0, 1) - m(0, 0) * m(2, 1);
        let c20 = m(0, 1) * m(1, 2) - m(1, 1) * m(0, 2);
        let c21 = m(1, 0) * m(0, 2) - m(0, 0) * m(1, 2);
        let c22 = m(0, 0) * m(1, 1) - m(1, 0) * m(0, 1);

        // inv3 is the inverse of the 3x3 block, laid out in columns.
        let inv3 = [
            Vec3::new(c00 * inv_det, c10 * inv_det, c20 * inv_det),
            Vec3::new(c01 * inv_det, c11 * inv_det, c21 * inv_det),
            Vec3::new(c02 * inv_det, c12 * inv_det, c22 * inv_det),
        ];

        let t = self.cols[3].truncate();
        let inv_t = -(inv3[0] * t.x + inv3[1] * t.y + inv3[2] * t.z);

        Some(Self {
            cols: [
                Vec4::from_vec3(inv3[0], 0.0),
                Vec4::from_vec3(inv3[1], 0.0),
                Vec4::from_vec3(inv3[2], 0.0),
                Vec4::from_vec3(inv_t, 1.0),
            ],
        })
    }
}

impl Default for Mat4 {
    /// Returns the identity matrix.
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mul<Mat4> for Mat4 {
    type Output = Self;
    /// Multiplies this matrix by another `Mat4`. Note that matrix
    /// multiplication is not commutative.
    #[inline]
    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut cols = [Vec4::ZERO; 4];
        for (c, col) in cols.iter_mut().enumerate() {
            let rhs_col = rhs.cols[c];
            *col = Vec4 {
                x: self.get_row(0).dot(rhs_col),
                y: self.get_row(1).dot(rhs_col),
                z: self.get_row(2).dot(rhs_col),
                w: self.get_row(3).dot(rhs_col),
            };
        }
        Mat4 { cols }
    }
}

impl Mul<Vec4> for Mat4 {
    type Output = Vec4;
    /// Transforms a `Vec4` by this matrix.
    #[inline]
    fn mul(self, rhs: Vec4) -> Self::Output {
        self.cols[0] * rhs.x + self.cols[1] * rhs.y + self.cols[2] * rhs.z + self.cols[3] * rhs.w
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{approx_eq, FRAC_PI_2};

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn mat4_approx_eq(a: Mat4, b: Mat4) -> bool {
        (0..4).all(|c| {
            approx_eq(a.cols[c].x, b.cols[c].x)
                && approx_eq(a.cols[c].y, b.cols[c].y)
                && approx_eq(a.cols[c].z, b.cols[c].z)
                && approx_eq(a.cols[c].w, b.cols[c].w)
        })
    }

    #[test]
    fn test_identity_default() {
        assert_eq!(Mat4::default(), Mat4::IDENTITY);
        let p = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(Mat4::IDENTITY.transform_point(p), p);
    }

    #[test]
    fn test_translation() {
        let m = Mat4::from_translation(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(
            m.transform_point(Vec3::ZERO),
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_scale_then_translate_composition() {
        // In `t * s`, the scale applies to a point first.
        let t = Mat4::from_translation(Vec3::new(1.0, 0.0, 0.0));
        let s = Mat4::from_scale(Vec3::splat(2.0));
        let m = t * s;
        assert!(vec3_approx_eq(
            m.transform_point(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(3.0, 0.0, 0.0)
        ));
    }

    #[test]
    fn test_rotation_z_quarter_turn() {
        use approx::assert_relative_eq;

        let p = Mat4::from_rotation_z(FRAC_PI_2).transform_point(Vec3::X);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(p.y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn test_affine_inverse_round_trip() {
        let m = Mat4::from_translation(Vec3::new(1.0, -2.0, 3.0))
            * Mat4::from_rotation_y(0.7)
            * Mat4::from_scale(Vec3::new(2.0, 1.0, 0.5));
        let inv = m.affine_inverse().expect("matrix should be invertible");
        assert!(mat4_approx_eq(m * inv, Mat4::IDENTITY));
        assert!(mat4_approx_eq(inv * m, Mat4::IDENTITY));
    }

    #[test]
    fn test_affine_inverse_singular() {
        let m = Mat4::from_scale(Vec3::new(1.0, 0.0, 1.0));
        assert!(m.affine_inverse().is_none());
    }
}
