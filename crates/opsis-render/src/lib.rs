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

//! # Opsis Render
//!
//! A renderer that consumes an imperative stream of scene-description calls
//! (framing, attribute/transform scoping, geometry submission, instancing,
//! procedural expansion) and either draws immediately through a backend trait
//! or builds a persistent, introspectable scene graph.
//!
//! The call protocol lives on [`Renderer`]. Deferred mode exposes the built
//! graph through [`Scene`]; immediate mode submits draws through a
//! [`DrawHandler`]. Procedural content ([`Procedural`]) expands concurrently
//! on a worker pool with per-subtree state isolation.

#![warn(missing_docs)]

pub mod attributes;
pub mod culling;
pub mod draw;
pub mod error;
pub mod instancing;
pub mod options;
pub mod primitive;
pub mod procedural;
pub mod renderer;
pub mod scene;

pub use attributes::{
    AttributeState, BlendEquation, BlendFactor, CullingSpace, ShaderSpec, TextPrimitiveKind,
};
pub use draw::{Draw, DrawHandler, LogDrawHandler};
pub use error::{ErrorKind, RenderError};
pub use instancing::InstanceDefinition;
pub use options::{Options, RenderMode};
pub use primitive::{Interpolation, Primitive, PrimitiveVariable, PrimitiveVariableMap};
pub use procedural::Procedural;
pub use renderer::{CameraSpec, Renderer};
pub use scene::{GroupNode, InstanceNode, PrimitiveNode, Scene, SceneNode};
