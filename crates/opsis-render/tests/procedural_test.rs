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

//! Integration tests for the concurrent procedural evaluator: recursive
//! fan-out, the expansion barrier, culling of procedural bounds, failure
//! isolation, and cross-instance independence.

use opsis_core::{Aabb, Color3, Mat4, Vec3};
use opsis_render::{
    Draw, DrawHandler, GroupNode, Procedural, RenderError, Renderer, SceneNode,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

const MAX_LEVEL: usize = 5;

fn deferred() -> Renderer {
    let mut r = Renderer::new();
    r.set_option("gl:mode", "deferred").unwrap();
    r
}

fn count_leaves(group: &Arc<GroupNode>) -> usize {
    group
        .children()
        .iter()
        .map(|child| match child {
            SceneNode::Group(g) => count_leaves(g),
            SceneNode::Primitive(_) => 1,
            SceneNode::Instance(i) => count_leaves(i.definition().root()),
        })
        .sum()
}

/// Builds a pyramid of spheres: one sphere per level, binary fan-out below
/// it, down to `MAX_LEVEL`. Records which worker threads expansion ran on.
struct PyramidProcedural {
    level: usize,
    threads: Arc<Mutex<HashSet<ThreadId>>>,
}

impl PyramidProcedural {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            level: 0,
            threads: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    fn child(&self) -> Arc<Self> {
        Arc::new(Self {
            level: self.level + 1,
            threads: Arc::clone(&self.threads),
        })
    }
}

impl Procedural for PyramidProcedural {
    fn bound(&self) -> Aabb {
        Aabb::from_min_max(Vec3::splat(-1.0), Vec3::splat(1.0))
    }

    fn render(&self, renderer: &mut Renderer) -> Result<(), RenderError> {
        self.threads.lock().unwrap().insert(thread::current().id());

        let fraction = self.level as f32 / MAX_LEVEL as f32;
        renderer.attribute_begin()?;
        renderer.set_attribute("color", Color3::new(fraction, 0.0, 1.0 - fraction))?;

        renderer.transform_begin()?;
        renderer.concat_transform(Mat4::from_translation(Vec3::new(0.0, 0.5, 0.0)));
        renderer.concat_transform(Mat4::from_scale(Vec3::splat(0.5)));
        renderer.geometry("sphere", &Default::default(), Default::default())?;
        renderer.transform_end()?;

        if self.level < MAX_LEVEL {
            renderer.transform_begin()?;
            renderer.concat_transform(Mat4::from_translation(Vec3::new(0.0, -0.5, 0.0)));
            for i in 0..2 {
                renderer.transform_begin()?;
                renderer.concat_transform(Mat4::from_translation(Vec3::new(
                    i as f32 - 0.5,
                    0.0,
                    0.0,
                )));
                renderer.concat_transform(Mat4::from_scale(Vec3::splat(0.5)));
                renderer.procedural(self.child())?;
                renderer.transform_end()?;
            }
            renderer.transform_end()?;
        }

        renderer.attribute_end()?;
        Ok(())
    }
}

/// Emits a single unit sphere.
struct LeafProcedural;

impl Procedural for LeafProcedural {
    fn bound(&self) -> Aabb {
        Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE)
    }

    fn render(&self, renderer: &mut Renderer) -> Result<(), RenderError> {
        renderer.sphere(1.0, -1.0, 1.0, 360.0, Default::default())
    }
}

/// Always fails during expansion.
struct FailingProcedural;

impl Procedural for FailingProcedural {
    fn bound(&self) -> Aabb {
        Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE)
    }

    fn render(&self, _renderer: &mut Renderer) -> Result<(), RenderError> {
        Err(RenderError::Expansion {
            message: "deliberate failure".to_string(),
        })
    }
}

/// Emits one sphere, then a succeeding and a failing child procedural.
struct MixedParentProcedural;

impl Procedural for MixedParentProcedural {
    fn bound(&self) -> Aabb {
        Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE)
    }

    fn render(&self, renderer: &mut Renderer) -> Result<(), RenderError> {
        renderer.sphere(1.0, -1.0, 1.0, 360.0, Default::default())?;
        renderer.procedural(Arc::new(LeafProcedural))?;
        renderer.procedural(Arc::new(FailingProcedural))?;
        Ok(())
    }
}

/// Draw handler that counts submissions.
struct CountingHandler(Arc<AtomicUsize>);

impl DrawHandler for CountingHandler {
    fn draw(&mut self, _draw: Draw<'_>) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recursive fan-out
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_binary_fanout_depth_five_yields_63_leaves() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut r = deferred();
    r.world_begin().unwrap();
    let pyramid = PyramidProcedural::new();
    r.procedural(pyramid.clone()).unwrap();

    // The call is a barrier: the whole subtree is attached before worldEnd.
    assert_eq!(count_leaves(r.scene().unwrap().root()), 63);
    r.world_end().unwrap();

    assert_eq!(count_leaves(r.scene().unwrap().root()), 63);
    assert!(r.scene().unwrap().bound().is_valid());
}

#[test]
fn test_expansion_uses_multiple_workers() {
    let mut r = deferred();
    r.world_begin().unwrap();
    let pyramid = PyramidProcedural::new();
    r.procedural(pyramid.clone()).unwrap();
    r.world_end().unwrap();

    let used = pyramid.threads.lock().unwrap().len();
    assert!(used >= 1);
    if rayon::current_num_threads() > 1 {
        assert!(
            used > 1,
            "expected expansion to spread over the pool, got {used} worker(s)"
        );
    }
}

#[test]
fn test_expansion_state_is_isolated_from_caller() {
    let mut r = deferred();
    r.world_begin().unwrap();
    r.set_attribute("color", Color3::new(0.25, 0.5, 0.75)).unwrap();
    r.concat_transform(Mat4::from_translation(Vec3::new(0.0, 0.0, -5.0)));
    let before = r.get_transform();

    r.procedural(PyramidProcedural::new()).unwrap();

    // Expansion mutated its own snapshot only.
    assert_eq!(
        r.get_attribute("color"),
        Some(Color3::new(0.25, 0.5, 0.75).into())
    );
    assert_eq!(r.get_transform(), before);
    r.world_end().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Culling of procedural bounds
// ─────────────────────────────────────────────────────────────────────────────

fn count_with_object_culling(culling_box: Option<Aabb>) -> usize {
    let mut r = deferred();
    r.world_begin().unwrap();

    r.sphere(1.5, 0.0, 1.0, 360.0, Default::default()).unwrap();
    r.procedural(PyramidProcedural::new()).unwrap();

    r.attribute_begin().unwrap();
    r.set_attribute("gl:cullingSpace", "object").unwrap();
    if let Some(b) = culling_box {
        r.set_attribute("gl:cullingBox", b).unwrap();
    }
    r.sphere(1.5, 0.0, 1.0, 360.0, Default::default()).unwrap();
    r.procedural(PyramidProcedural::new()).unwrap();
    r.attribute_end().unwrap();

    r.world_end().unwrap();
    count_leaves(r.scene().unwrap().root())
}

#[test]
fn test_object_space_culling_halves_element_count() {
    let unculled = count_with_object_culling(None);
    assert_eq!(unculled, 128);

    // A box that misses both the sphere's and the procedural's local bounds
    // removes the whole scoped block; no expansion is attempted for it.
    let culled = count_with_object_culling(Some(Aabb::from_min_max(
        Vec3::new(2.0, -1.0, -1.0),
        Vec3::new(3.0, 1.0, 1.0),
    )));
    assert_eq!(culled * 2, unculled);
}

#[test]
fn test_world_space_culling_inside_expansion() {
    let mut r = deferred();
    r.world_begin().unwrap();
    r.set_attribute("gl:cullingSpace", "world").unwrap();
    r.set_attribute(
        "gl:cullingBox",
        Aabb::from_min_max(Vec3::new(0.001, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0)),
    )
    .unwrap();

    // Half inside the box: kept.
    r.sphere(1.0, 0.0, 1.0, 360.0, Default::default()).unwrap();
    // The culling state flows into every expansion context; of the 63
    // elements the full pyramid renders, 32 survive the box.
    r.procedural(PyramidProcedural::new()).unwrap();

    r.transform_begin().unwrap();
    r.concat_transform(Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0)));
    // Everything in this block lies outside the box.
    r.sphere(1.0, 0.0, 1.0, 360.0, Default::default()).unwrap();
    r.procedural(PyramidProcedural::new()).unwrap();
    r.transform_end().unwrap();

    r.world_end().unwrap();
    assert_eq!(count_leaves(r.scene().unwrap().root()), 33);
}

// ─────────────────────────────────────────────────────────────────────────────
// Failure isolation
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_failed_subtree_detaches_siblings_survive() {
    let mut r = deferred();
    r.world_begin().unwrap();

    let result = r.procedural(Arc::new(MixedParentProcedural));
    assert_eq!(
        result,
        Err(RenderError::Expansion {
            message: "deliberate failure".to_string()
        })
    );

    // The parent's own sphere and the succeeding sibling are attached; the
    // failed subtree left nothing behind.
    assert_eq!(count_leaves(r.scene().unwrap().root()), 2);
    r.world_end().unwrap();
}

#[test]
fn test_failure_does_not_disturb_earlier_content() {
    let mut r = deferred();
    r.world_begin().unwrap();

    r.set_attribute("name", "keeper").unwrap();
    r.sphere(1.0, -1.0, 1.0, 360.0, Default::default()).unwrap();
    assert!(r.procedural(Arc::new(FailingProcedural)).is_err());
    r.procedural(Arc::new(LeafProcedural)).unwrap();

    r.world_end().unwrap();
    assert_eq!(count_leaves(r.scene().unwrap().root()), 2);
}

#[test]
fn test_unbalanced_expansion_reports_error() {
    struct UnbalancedProcedural;

    impl Procedural for UnbalancedProcedural {
        fn bound(&self) -> Aabb {
            Aabb::from_min_max(Vec3::splat(-1.0), Vec3::ONE)
        }

        fn render(&self, renderer: &mut Renderer) -> Result<(), RenderError> {
            renderer.attribute_begin()
        }
    }

    let mut r = deferred();
    r.world_begin().unwrap();
    assert_eq!(
        r.procedural(Arc::new(UnbalancedProcedural)),
        Err(RenderError::UnbalancedScope { call: "procedural" })
    );
    assert_eq!(count_leaves(r.scene().unwrap().root()), 0);
    r.world_end().unwrap();
}

// ─────────────────────────────────────────────────────────────────────────────
// Immediate-mode expansion
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_immediate_mode_expands_inline() {
    let count = Arc::new(AtomicUsize::new(0));
    let mut r = Renderer::new();
    r.set_option("gl:mode", "immediate").unwrap();
    r.set_draw_handler(Box::new(CountingHandler(Arc::clone(&count))));

    r.world_begin().unwrap();
    r.set_attribute("color", Color3::new(0.1, 0.2, 0.3)).unwrap();
    let pyramid = PyramidProcedural::new();
    r.procedural(pyramid.clone()).unwrap();
    // Inline expansion restores the caller's state when it returns.
    assert_eq!(
        r.get_attribute("color"),
        Some(Color3::new(0.1, 0.2, 0.3).into())
    );
    r.world_end().unwrap();

    assert_eq!(count.load(Ordering::SeqCst), 63);
    assert_eq!(pyramid.threads.lock().unwrap().len(), 1);
}

// ─────────────────────────────────────────────────────────────────────────────
// Cross-instance independence
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_100_parallel_renderers_are_independent() {
    let mut handles = Vec::new();
    for i in 0..100usize {
        handles.push(thread::spawn(move || {
            let expected = i % 5 + 1;
            let mut r = deferred();
            r.world_begin().unwrap();
            for _ in 0..expected {
                r.sphere(1.0, -1.0, 1.0, 360.0, Default::default()).unwrap();
            }
            r.world_end().unwrap();
            assert_eq!(r.scene().unwrap().root().children().len(), expected);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_parallel_renderers_with_concurrent_expansion() {
    let mut handles = Vec::new();
    for _ in 0..8 {
        handles.push(thread::spawn(|| {
            let mut r = deferred();
            r.world_begin().unwrap();
            r.procedural(PyramidProcedural::new()).unwrap();
            r.world_end().unwrap();
            assert_eq!(count_leaves(r.scene().unwrap().root()), 63);
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
