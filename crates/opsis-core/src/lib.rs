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

//! # Opsis Core
//!
//! Foundational crate containing the math primitives and typed value
//! representation shared by every part of the renderer.

#![warn(missing_docs)]

pub mod data;
pub mod math;

pub use data::{Value, ValueMap};
pub use math::{Aabb, Color3, Color4, Mat4, Vec2, Vec3, Vec4};
