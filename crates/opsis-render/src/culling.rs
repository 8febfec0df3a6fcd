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

//! The bound-test gate consulted before emitting geometry or expanding
//! procedurals.

use crate::attributes::{AttributeState, CullingSpace};
use opsis_core::{Aabb, Mat4};

/// Tests an element bound against the scoped culling attributes.
///
/// `local_bound` is the element's bound in its own space (primitives report
/// theirs; procedurals supply one). In `object` space the bound is compared
/// against the culling box directly; in `world` space it is first transformed
/// by `world`, the accumulated local-to-world matrix.
///
/// Returns `true` when the element survives: either no culling box is set in
/// the current scope, or the box intersects the (possibly transformed) bound.
/// Elements with an invalid bound are never culled.
pub fn accepts(state: &AttributeState, local_bound: &Aabb, world: &Mat4) -> bool {
    if !state.culling_box.is_valid() {
        return true;
    }
    let bound = match state.culling_space {
        CullingSpace::Object => *local_bound,
        CullingSpace::World => local_bound.transform(world),
    };
    if !bound.is_valid() {
        return true;
    }
    state.culling_box.intersects(&bound)
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use opsis_core::{Value, Vec3};

    fn state_with_box(space: &str, culling_box: Aabb) -> AttributeState {
        let mut s = AttributeState::default();
        s.set("gl:cullingSpace", &Value::from(space)).unwrap();
        s.set("gl:cullingBox", &Value::from(culling_box)).unwrap();
        s
    }

    #[test]
    fn test_unset_box_accepts_everything() {
        let s = AttributeState::default();
        let b = Aabb::from_min_max(Vec3::splat(100.0), Vec3::splat(101.0));
        assert!(accepts(&s, &b, &Mat4::IDENTITY));
    }

    #[test]
    fn test_object_space_ignores_transform() {
        let s = state_with_box(
            "object",
            Aabb::from_min_max(Vec3::new(2.0, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0)),
        );
        let b = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE);
        // Local bound misses the box even though a translation would move it in.
        let world = Mat4::from_translation(Vec3::new(2.5, 0.0, 0.0));
        assert!(!accepts(&s, &b, &world));
    }

    #[test]
    fn test_world_space_applies_transform() {
        let s = state_with_box(
            "world",
            Aabb::from_min_max(Vec3::new(2.0, -1.0, -1.0), Vec3::new(3.0, 1.0, 1.0)),
        );
        let b = Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE);
        assert!(!accepts(&s, &b, &Mat4::IDENTITY));
        let world = Mat4::from_translation(Vec3::new(2.5, 0.0, 0.0));
        assert!(accepts(&s, &b, &world));
    }

    #[test]
    fn test_invalid_element_bound_survives() {
        let s = state_with_box("object", Aabb::from_min_max(Vec3::ZERO, Vec3::ONE));
        assert!(accepts(&s, &Aabb::INVALID, &Mat4::IDENTITY));
    }
}
