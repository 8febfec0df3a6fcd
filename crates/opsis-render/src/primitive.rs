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

//! Geometric primitives accepted by the `geometry` call.

use opsis_core::{Aabb, Value, ValueMap, Vec3};
use std::collections::HashMap;

/// Interpolation class of a primitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// One value for the whole primitive.
    Constant,
    /// One value per face.
    Uniform,
    /// One value per vertex.
    Vertex,
    /// One value per parametric corner.
    Varying,
    /// One value per face-vertex.
    FaceVarying,
}

/// A named datum attached to a primitive at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct PrimitiveVariable {
    /// How the value maps onto the primitive.
    pub interpolation: Interpolation,
    /// The payload.
    pub value: Value,
}

impl PrimitiveVariable {
    /// Creates a new variable.
    pub fn new(interpolation: Interpolation, value: impl Into<Value>) -> Self {
        Self {
            interpolation,
            value: value.into(),
        }
    }
}

/// The primitive variables of one geometry submission.
pub type PrimitiveVariableMap = HashMap<String, PrimitiveVariable>;

/// A geometric primitive, described in its own local space.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// A z-capped sphere.
    Sphere {
        /// Sphere radius.
        radius: f32,
        /// Lower z cap as a fraction of the radius, in `[-1, 1]`.
        z_min: f32,
        /// Upper z cap as a fraction of the radius, in `[-1, 1]`.
        z_max: f32,
        /// Sweep angle in degrees.
        theta_max: f32,
    },
    /// A point cloud.
    Points {
        /// Point positions in local space.
        positions: Vec<Vec3>,
    },
}

impl Primitive {
    /// Creates a sphere primitive.
    pub fn sphere(radius: f32, z_min: f32, z_max: f32, theta_max: f32) -> Self {
        Self::Sphere {
            radius,
            z_min,
            z_max,
            theta_max,
        }
    }

    /// Builds a primitive from a `geometry` call.
    ///
    /// Returns `None` for unsupported kinds; the renderer logs and skips
    /// those rather than erroring, so a stream authored for a richer renderer
    /// still plays back.
    pub fn from_call(
        kind: &str,
        params: &ValueMap,
        variables: &PrimitiveVariableMap,
    ) -> Option<Self> {
        let float_param = |name: &str, default: f32| {
            params.get(name).and_then(Value::as_float).unwrap_or(default)
        };
        match kind {
            "sphere" => Some(Self::Sphere {
                radius: float_param("radius", 1.0),
                z_min: float_param("zMin", -1.0),
                z_max: float_param("zMax", 1.0),
                theta_max: float_param("thetaMax", 360.0),
            }),
            "points" => {
                let positions = variables
                    .get("P")
                    .and_then(|v| v.value.as_vec3_vector())
                    .map(<[Vec3]>::to_vec)
                    .unwrap_or_default();
                Some(Self::Points { positions })
            }
            _ => None,
        }
    }

    /// Returns the protocol kind name of this primitive.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Sphere { .. } => "sphere",
            Self::Points { .. } => "points",
        }
    }

    /// Computes the local-space bound of this primitive.
    pub fn bound(&self) -> Aabb {
        match self {
            Self::Sphere {
                radius,
                z_min,
                z_max,
                ..
            } => Aabb::from_min_max(
                Vec3::new(-radius, -radius, z_min * radius),
                Vec3::new(*radius, *radius, z_max * radius),
            ),
            Self::Points { positions } => positions
                .iter()
                .fold(Aabb::INVALID, |b, p| b.merge(&Aabb::from_min_max(*p, *p))),
        }
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_bound_respects_z_caps() {
        let full = Primitive::sphere(1.5, -1.0, 1.0, 360.0);
        assert_eq!(
            full.bound(),
            Aabb::from_min_max(Vec3::splat(-1.5), Vec3::splat(1.5))
        );

        let hemisphere = Primitive::sphere(1.5, 0.0, 1.0, 360.0);
        assert_eq!(
            hemisphere.bound(),
            Aabb::from_min_max(Vec3::new(-1.5, -1.5, 0.0), Vec3::new(1.5, 1.5, 1.5))
        );
    }

    #[test]
    fn test_from_call_sphere_defaults() {
        let p = Primitive::from_call("sphere", &ValueMap::new(), &PrimitiveVariableMap::new())
            .unwrap();
        assert_eq!(p, Primitive::sphere(1.0, -1.0, 1.0, 360.0));
    }

    #[test]
    fn test_from_call_sphere_params() {
        let mut params = ValueMap::new();
        params.insert("radius".to_string(), Value::from(2.0));
        params.insert("zMin".to_string(), Value::from(0.0));
        let p = Primitive::from_call("sphere", &params, &PrimitiveVariableMap::new()).unwrap();
        assert_eq!(p, Primitive::sphere(2.0, 0.0, 1.0, 360.0));
    }

    #[test]
    fn test_from_call_points_reads_positions() {
        let mut vars = PrimitiveVariableMap::new();
        let positions = vec![Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0)];
        vars.insert(
            "P".to_string(),
            PrimitiveVariable::new(Interpolation::Vertex, positions.clone()),
        );
        let p = Primitive::from_call("points", &ValueMap::new(), &vars).unwrap();
        assert_eq!(p, Primitive::Points { positions });
        assert_eq!(
            p.bound(),
            Aabb::from_min_max(Vec3::ZERO, Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn test_from_call_unknown_kind() {
        assert_eq!(
            Primitive::from_call("teapot", &ValueMap::new(), &PrimitiveVariableMap::new()),
            None
        );
    }
}
