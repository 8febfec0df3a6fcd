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

//! The backend seam through which draw output leaves the renderer.
//!
//! The renderer itself never talks to a graphics API. The immediate backend
//! submits each surviving primitive through [`DrawHandler`] as it arrives;
//! [`Scene::render`](crate::scene::Scene::render) replays a deferred graph
//! through the same trait.

use crate::attributes::AttributeState;
use crate::primitive::{Primitive, PrimitiveVariableMap};
use opsis_core::Mat4;

/// One primitive submission, fully resolved.
#[derive(Debug)]
pub struct Draw<'a> {
    /// The primitive, in its local space.
    pub primitive: &'a Primitive,
    /// The primitive variables supplied at submission.
    pub variables: &'a PrimitiveVariableMap,
    /// The accumulated local-to-world transform.
    pub transform: Mat4,
    /// The attribute state in effect at submission.
    pub state: &'a AttributeState,
}

/// Receives draw output from the immediate backend and from scene traversal.
///
/// Implementations bind these callbacks to an actual graphics API; that
/// binding is outside this crate's scope.
pub trait DrawHandler: Send {
    /// Handles one primitive submission.
    fn draw(&mut self, draw: Draw<'_>);
}

/// The default handler: logs each submission at debug level.
#[derive(Debug, Default)]
pub struct LogDrawHandler;

impl DrawHandler for LogDrawHandler {
    fn draw(&mut self, draw: Draw<'_>) {
        log::debug!(
            "draw {} \"{}\" ({} variables)",
            draw.primitive.kind(),
            draw.state.name,
            draw.variables.len()
        );
    }
}
