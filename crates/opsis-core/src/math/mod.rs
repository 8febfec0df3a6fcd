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

//! Provides the mathematics primitives the renderer is built on.
//!
//! This module contains the vector, matrix, bounding-box and color types used
//! by the scene-description protocol: transforms are column-major 4x4
//! matrices, bounds are axis-aligned boxes, and colors are plain linear RGB /
//! RGBA records.
//!
//! All angular quantities are expressed in **radians** unless a function name
//! says otherwise.

// --- Fundamental Constants ---

/// A small constant for floating-point comparisons.
pub const EPSILON: f32 = 1e-5;

// Re-export standard mathematical constants for convenience.
pub use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI, TAU};

// --- Declare Sub-Modules ---

pub mod color;
pub mod geometry;
pub mod matrix;
pub mod vector;

// --- Re-export Principal Types ---

pub use self::color::{Color3, Color4};
pub use self::geometry::Aabb;
pub use self::matrix::Mat4;
pub use self::vector::{Vec2, Vec3, Vec4};

// --- Utility Functions ---

/// Compares two `f32` values for approximate equality using [`EPSILON`].
///
/// # Examples
///
/// ```
/// use opsis_core::math::approx_eq;
/// assert!(approx_eq(1.0, 1.0 + 1e-6));
/// assert!(!approx_eq(1.0, 1.1));
/// ```
#[inline]
pub fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() <= EPSILON
}
