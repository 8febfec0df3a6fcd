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

//! Procedural content and the worker-pool machinery that expands it.
//!
//! A procedural is a lazily expanded unit of content: it reports a bound for
//! culling and, when expanded, emits further scene-description calls against
//! the renderer handle it is given — including further procedurals, to any
//! depth. In deferred mode expansion runs on the rayon worker pool; each
//! expansion gets an isolated snapshot of the caller's state, and a
//! top-level `procedural()` call blocks until its whole subtree has expanded
//! and attached.

use crate::error::RenderError;
use crate::renderer::Renderer;
use opsis_core::Aabb;
use std::sync::{Arc, Condvar, Mutex};

/// A lazily expanded unit of scene content.
///
/// Implementations must be thread-safe: in deferred mode `render` runs on
/// worker threads, and a single procedural object may be referenced from
/// several subtrees at once.
pub trait Procedural: Send + Sync {
    /// Returns the bound of the content this procedural would produce, in
    /// the space of the `procedural()` call site.
    fn bound(&self) -> Aabb;

    /// Expands the content by issuing calls against `renderer`.
    ///
    /// The handle carries a private snapshot of the caller's attribute,
    /// transform and culling state; mutations stay within this subtree.
    fn render(&self, renderer: &mut Renderer) -> Result<(), RenderError>;
}

/// Tracks one tree of expansion tasks and blocks until all of them finish.
///
/// Every task spawned for a subtree — however deeply nested — registers here
/// before it is handed to the pool, so `wait` returning means the entire
/// tree has completed and attached (or been detached on failure).
#[derive(Debug, Default)]
pub(crate) struct Expander {
    pending: Mutex<usize>,
    done: Condvar,
    errors: Mutex<Vec<RenderError>>,
}

impl Expander {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Schedules `task` on the worker pool.
    pub(crate) fn spawn(self: &Arc<Self>, task: impl FnOnce() + Send + 'static) {
        *self.pending.lock().unwrap() += 1;
        let expander = Arc::clone(self);
        rayon::spawn(move || {
            task();
            expander.finish_one();
        });
    }

    fn finish_one(&self) {
        let mut pending = self.pending.lock().unwrap();
        *pending -= 1;
        if *pending == 0 {
            self.done.notify_all();
        }
    }

    /// Records a subtree failure. The first recorded error is the one the
    /// barrier surfaces.
    pub(crate) fn record_error(&self, error: RenderError) {
        self.errors.lock().unwrap().push(error);
    }

    /// Blocks until every spawned task has finished, then reports the first
    /// recorded error, if any.
    pub(crate) fn wait(&self) -> Result<(), RenderError> {
        let mut pending = self.pending.lock().unwrap();
        while *pending > 0 {
            pending = self.done.wait(pending).unwrap();
        }
        drop(pending);

        let mut errors = self.errors.lock().unwrap();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors.remove(0))
        }
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_wait_sees_all_nested_spawns() {
        let expander = Expander::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let outer = Arc::clone(&expander);
        let outer_counter = Arc::clone(&counter);
        expander.spawn(move || {
            outer_counter.fetch_add(1, Ordering::SeqCst);
            for _ in 0..4 {
                let c = Arc::clone(&outer_counter);
                outer.spawn(move || {
                    c.fetch_add(1, Ordering::SeqCst);
                });
            }
        });

        expander.wait().unwrap();
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn test_wait_surfaces_first_error() {
        let expander = Expander::new();
        let e = Arc::clone(&expander);
        expander.spawn(move || {
            e.record_error(RenderError::Expansion {
                message: "boom".to_string(),
            });
        });
        assert_eq!(
            expander.wait(),
            Err(RenderError::Expansion {
                message: "boom".to_string()
            })
        );
    }

    #[test]
    fn test_wait_with_no_tasks_returns_immediately() {
        let expander = Expander::new();
        assert_eq!(expander.wait(), Ok(()));
    }
}
