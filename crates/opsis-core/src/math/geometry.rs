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

//! Provides the axis-aligned bounding box used for culling and scene bounds.

use super::{Mat4, Vec3, Vec4};

/// Represents an Axis-Aligned Bounding Box (AABB).
///
/// An AABB is a rectangular prism aligned with the coordinate axes, defined by
/// its minimum and maximum corner points. The renderer uses it both as the
/// bound of scene content and as the culling box attribute, where the
/// [`Aabb::INVALID`] sentinel doubles as "no box set".
#[derive(Debug, Clone, Copy, PartialEq)]
#[repr(C)]
pub struct Aabb {
    /// The corner of the box with the smallest coordinates on all axes.
    pub min: Vec3,
    /// The corner of the box with the largest coordinates on all axes.
    pub max: Vec3,
}

impl Aabb {
    /// An invalid `Aabb` where `min` components are positive infinity and
    /// `max` are negative infinity.
    ///
    /// This is the neutral element for [`merge`](Self::merge): merging any
    /// valid `Aabb` with `INVALID` yields that valid `Aabb`. It is also the
    /// "empty box" value of the culling attributes.
    pub const INVALID: Self = Self {
        min: Vec3::new(f32::INFINITY, f32::INFINITY, f32::INFINITY),
        max: Vec3::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::NEG_INFINITY),
    };

    /// Creates a new `Aabb` from two corner points.
    ///
    /// The `min` field receives the component-wise minimum and `max` the
    /// component-wise maximum, regardless of argument order.
    #[inline]
    pub fn from_min_max(min_pt: Vec3, max_pt: Vec3) -> Self {
        Self {
            min: min_pt.min(max_pt),
            max: min_pt.max(max_pt),
        }
    }

    /// Creates a new `Aabb` from a center point and its half-extents.
    #[inline]
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        let he = half_extents.abs();
        Self {
            min: center - he,
            max: center + he,
        }
    }

    /// Calculates the center point of the `Aabb`.
    #[inline]
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Calculates the half-extents (half the size on each axis) of the `Aabb`.
    #[inline]
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Checks if the `Aabb` is valid (i.e., `min <= max` on all axes).
    ///
    /// The culling filter treats an invalid box as "unset".
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Checks if this `Aabb` intersects with another `Aabb`.
    ///
    /// Two `Aabb`s intersect if they overlap on all three axes. Boxes that
    /// only touch at the boundary are considered to be intersecting.
    #[inline]
    pub fn intersects(&self, other: &Aabb) -> bool {
        (self.min.x <= other.max.x && self.max.x >= other.min.x)
            && (self.min.y <= other.max.y && self.max.y >= other.min.y)
            && (self.min.z <= other.max.z && self.max.z >= other.min.z)
    }

    /// Creates a new `Aabb` that encompasses both this `Aabb` and another one.
    #[inline]
    pub fn merge(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Computes the bounding box that encloses this `Aabb` after an affine
    /// transformation.
    ///
    /// Transforms the center and re-derives the extents by projecting the
    /// original extents onto the axes of the transformed space, which is
    /// cheaper than transforming all 8 corners. An invalid box transforms to
    /// an invalid box.
    pub fn transform(&self, matrix: &Mat4) -> Self {
        if !self.is_valid() {
            return Self::INVALID;
        }

        let center = self.center();
        let half_extents = self.half_extents();
        let transformed_center = (*matrix * Vec4::from_vec3(center, 1.0)).truncate();

        let x_abs = matrix.cols[0].truncate().abs();
        let y_abs = matrix.cols[1].truncate().abs();
        let z_abs = matrix.cols[2].truncate().abs();

        let new_half_extents =
            x_abs * half_extents.x + y_abs * half_extents.y + z_abs * half_extents.z;

        Aabb::from_center_half_extents(transformed_center, new_half_extents)
    }
}

impl Default for Aabb {
    /// Returns the default `Aabb`, which is `Aabb::INVALID`.
    #[inline]
    fn default() -> Self {
        Self::INVALID
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::approx_eq;

    fn vec3_approx_eq(a: Vec3, b: Vec3) -> bool {
        approx_eq(a.x, b.x) && approx_eq(a.y, b.y) && approx_eq(a.z, b.z)
    }

    fn aabb_approx_eq(a: Aabb, b: Aabb) -> bool {
        vec3_approx_eq(a.min, b.min) && vec3_approx_eq(a.max, b.max)
    }

    #[test]
    fn test_from_min_max_orders_corners() {
        let aabb = Aabb::from_min_max(Vec3::new(4.0, 5.0, 6.0), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.min, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.max, Vec3::new(4.0, 5.0, 6.0));
    }

    #[test]
    fn test_invalid_is_merge_neutral() {
        let aabb = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        assert!(!Aabb::INVALID.is_valid());
        assert_eq!(Aabb::INVALID.merge(&aabb), aabb);
        assert_eq!(aabb.merge(&Aabb::INVALID), aabb);
    }

    #[test]
    fn test_intersects_touching_boxes() {
        let a = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        let b = Aabb::from_min_max(Vec3::ONE, Vec3::splat(2.0));
        let c = Aabb::from_min_max(Vec3::splat(1.001), Vec3::splat(2.0));
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_merge_unions_extents() {
        let a = Aabb::from_min_max(Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 1.0));
        let b = Aabb::from_min_max(Vec3::new(0.0, -2.0, 0.0), Vec3::new(3.0, 1.0, 1.0));
        let m = a.merge(&b);
        assert_eq!(m.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(m.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_transform_translation_and_scale() {
        let aabb = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE);
        let m = Mat4::from_translation(Vec3::new(0.0, 0.0, 10.0)) * Mat4::from_scale(Vec3::splat(0.5));
        let t = aabb.transform(&m);
        assert!(aabb_approx_eq(
            t,
            Aabb::from_min_max(Vec3::new(-0.5, -0.5, 9.5), Vec3::new(0.5, 0.5, 10.5))
        ));
    }

    #[test]
    fn test_transform_invalid_stays_invalid() {
        let t = Aabb::INVALID.transform(&Mat4::from_translation(Vec3::ONE));
        assert!(!t.is_valid());
    }
}
