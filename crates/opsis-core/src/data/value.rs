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

//! Defines the `Value` variant carried by options, attributes and call
//! parameters.

use crate::math::{Aabb, Color3, Color4, Mat4, Vec2, Vec3};
use std::collections::HashMap;

/// A string-keyed parameter dictionary.
pub type ValueMap = HashMap<String, Value>;

/// The closed set of typed payloads a scene-description call can carry.
///
/// The renderer's open-ended, string-keyed dictionaries (options, attributes,
/// geometry parameters) all map names to this variant; each recognized key
/// expects one specific payload type and rejects or ignores the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i32),
    /// A single-precision float.
    Float(f32),
    /// A two-component vector.
    Vec2(Vec2),
    /// A three-component vector.
    Vec3(Vec3),
    /// An RGB color.
    Color3(Color3),
    /// An RGBA color.
    Color4(Color4),
    /// An axis-aligned box.
    Box3(Aabb),
    /// A 4x4 matrix.
    Matrix(Mat4),
    /// A string.
    String(String),
    /// A vector of floats.
    FloatVector(Vec<f32>),
    /// A vector of three-component vectors, e.g. point positions.
    Vec3Vector(Vec<Vec3>),
}

impl Value {
    /// Returns the payload type's name, for diagnostics.
    pub const fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Vec2(_) => "Vec2",
            Value::Vec3(_) => "Vec3",
            Value::Color3(_) => "Color3",
            Value::Color4(_) => "Color4",
            Value::Box3(_) => "Box3",
            Value::Matrix(_) => "Matrix",
            Value::String(_) => "String",
            Value::FloatVector(_) => "FloatVector",
            Value::Vec3Vector(_) => "Vec3Vector",
        }
    }

    /// Returns the boolean payload, if this is a `Bool`.
    #[inline]
    pub const fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the integer payload, if this is an `Int`.
    #[inline]
    pub const fn as_int(&self) -> Option<i32> {
        match *self {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the payload as a float.
    ///
    /// `Int` payloads convert losslessly for the magnitudes scene
    /// descriptions use; every other variant yields `None`.
    #[inline]
    pub fn as_float(&self) -> Option<f32> {
        match *self {
            Value::Float(v) => Some(v),
            Value::Int(v) => Some(v as f32),
            _ => None,
        }
    }

    /// Returns the two-component payload, if this is a `Vec2`.
    #[inline]
    pub const fn as_vec2(&self) -> Option<Vec2> {
        match *self {
            Value::Vec2(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the three-component payload, if this is a `Vec3`.
    #[inline]
    pub const fn as_vec3(&self) -> Option<Vec3> {
        match *self {
            Value::Vec3(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the RGB payload, if this is a `Color3`.
    #[inline]
    pub const fn as_color3(&self) -> Option<Color3> {
        match *self {
            Value::Color3(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the RGBA payload, if this is a `Color4`.
    #[inline]
    pub const fn as_color4(&self) -> Option<Color4> {
        match *self {
            Value::Color4(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the box payload, if this is a `Box3`.
    #[inline]
    pub const fn as_box3(&self) -> Option<Aabb> {
        match *self {
            Value::Box3(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the matrix payload, if this is a `Matrix`.
    #[inline]
    pub const fn as_matrix(&self) -> Option<Mat4> {
        match *self {
            Value::Matrix(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the string payload, if this is a `String`.
    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the float-vector payload, if this is a `FloatVector`.
    #[inline]
    pub fn as_float_vector(&self) -> Option<&[f32]> {
        match self {
            Value::FloatVector(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the `Vec3`-vector payload, if this is a `Vec3Vector`.
    #[inline]
    pub fn as_vec3_vector(&self) -> Option<&[Vec3]> {
        match self {
            Value::Vec3Vector(v) => Some(v),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<f32> for Value {
    #[inline]
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<Vec2> for Value {
    #[inline]
    fn from(v: Vec2) -> Self {
        Value::Vec2(v)
    }
}

impl From<Vec3> for Value {
    #[inline]
    fn from(v: Vec3) -> Self {
        Value::Vec3(v)
    }
}

impl From<Color3> for Value {
    #[inline]
    fn from(v: Color3) -> Self {
        Value::Color3(v)
    }
}

impl From<Color4> for Value {
    #[inline]
    fn from(v: Color4) -> Self {
        Value::Color4(v)
    }
}

impl From<Aabb> for Value {
    #[inline]
    fn from(v: Aabb) -> Self {
        Value::Box3(v)
    }
}

impl From<Mat4> for Value {
    #[inline]
    fn from(v: Mat4) -> Self {
        Value::Matrix(v)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    #[inline]
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<f32>> for Value {
    #[inline]
    fn from(v: Vec<f32>) -> Self {
        Value::FloatVector(v)
    }
}

impl From<Vec<Vec3>> for Value {
    #[inline]
    fn from(v: Vec<Vec3>) -> Self {
        Value::Vec3Vector(v)
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_match_variant() {
        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Int(3).as_int(), Some(3));
        assert_eq!(Value::Float(1.5).as_float(), Some(1.5));
        assert_eq!(Value::from("sphere").as_str(), Some("sphere"));
        assert_eq!(Value::Bool(true).as_float(), None);
        assert_eq!(Value::Float(1.5).as_str(), None);
    }

    #[test]
    fn test_as_float_promotes_int() {
        assert_eq!(Value::Int(360).as_float(), Some(360.0));
    }

    #[test]
    fn test_from_impls() {
        assert_eq!(Value::from(Vec2::new(1.0, 2.0)).as_vec2(), Some(Vec2::new(1.0, 2.0)));
        assert_eq!(
            Value::from(Color3::new(0.0, 1.0, 2.0)).as_color3(),
            Some(Color3::new(0.0, 1.0, 2.0))
        );
        let b = Aabb::from_min_max(Vec3::ZERO, Vec3::ONE);
        assert_eq!(Value::from(b).as_box3(), Some(b));
    }

    #[test]
    fn test_type_name() {
        assert_eq!(Value::Bool(false).type_name(), "Bool");
        assert_eq!(Value::from("x").type_name(), "String");
    }
}
