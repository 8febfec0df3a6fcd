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

//! The copy-on-push attribute record scoped by `attributeBegin`/`attributeEnd`.
//!
//! Attribute keys map to typed fields through an explicit registry.
//! Unrecognized keys — whether addressed at other renderers or simply unknown
//! — are discarded without storage and without diagnostics.

use crate::error::RenderError;
use opsis_core::{Aabb, Color3, Color4, Value, ValueMap};
use std::sync::Arc;

// --- Enumerated attribute values ---

/// A named blend factor, as accepted by `gl:blend:srcFactor` and
/// `gl:blend:dstFactor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    /// `zero`
    Zero,
    /// `one`
    One,
    /// `srcColor`
    SrcColor,
    /// `oneMinusSrcColor`
    OneMinusSrcColor,
    /// `dstColor`
    DstColor,
    /// `oneMinusDstColor`
    OneMinusDstColor,
    /// `srcAlpha`
    SrcAlpha,
    /// `oneMinusSrcAlpha`
    OneMinusSrcAlpha,
    /// `dstAlpha`
    DstAlpha,
    /// `oneMinusDstAlpha`
    OneMinusDstAlpha,
    /// `constantColor`
    ConstantColor,
    /// `oneMinusConstantColor`
    OneMinusConstantColor,
    /// `constantAlpha`
    ConstantAlpha,
    /// `oneMinusConstantAlpha`
    OneMinusConstantAlpha,
    /// `srcAlphaSaturate`
    SrcAlphaSaturate,
}

impl BlendFactor {
    /// Parses a factor from its protocol name.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "zero" => Self::Zero,
            "one" => Self::One,
            "srcColor" => Self::SrcColor,
            "oneMinusSrcColor" => Self::OneMinusSrcColor,
            "dstColor" => Self::DstColor,
            "oneMinusDstColor" => Self::OneMinusDstColor,
            "srcAlpha" => Self::SrcAlpha,
            "oneMinusSrcAlpha" => Self::OneMinusSrcAlpha,
            "dstAlpha" => Self::DstAlpha,
            "oneMinusDstAlpha" => Self::OneMinusDstAlpha,
            "constantColor" => Self::ConstantColor,
            "oneMinusConstantColor" => Self::OneMinusConstantColor,
            "constantAlpha" => Self::ConstantAlpha,
            "oneMinusConstantAlpha" => Self::OneMinusConstantAlpha,
            "srcAlphaSaturate" => Self::SrcAlphaSaturate,
            _ => return None,
        })
    }

    /// Returns the protocol name of this factor.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::SrcColor => "srcColor",
            Self::OneMinusSrcColor => "oneMinusSrcColor",
            Self::DstColor => "dstColor",
            Self::OneMinusDstColor => "oneMinusDstColor",
            Self::SrcAlpha => "srcAlpha",
            Self::OneMinusSrcAlpha => "oneMinusSrcAlpha",
            Self::DstAlpha => "dstAlpha",
            Self::OneMinusDstAlpha => "oneMinusDstAlpha",
            Self::ConstantColor => "constantColor",
            Self::OneMinusConstantColor => "oneMinusConstantColor",
            Self::ConstantAlpha => "constantAlpha",
            Self::OneMinusConstantAlpha => "oneMinusConstantAlpha",
            Self::SrcAlphaSaturate => "srcAlphaSaturate",
        }
    }
}

/// A named blend equation, as accepted by `gl:blend:equation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendEquation {
    /// `add`
    Add,
    /// `subtract`
    Subtract,
    /// `reverseSubtract`
    ReverseSubtract,
    /// `min`
    Min,
    /// `max`
    Max,
}

impl BlendEquation {
    /// Parses an equation from its protocol name.
    pub fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "add" => Self::Add,
            "subtract" => Self::Subtract,
            "reverseSubtract" => Self::ReverseSubtract,
            "min" => Self::Min,
            "max" => Self::Max,
            _ => return None,
        })
    }

    /// Returns the protocol name of this equation.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Subtract => "subtract",
            Self::ReverseSubtract => "reverseSubtract",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// The space the culling box is compared in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullingSpace {
    /// Compare element bounds in their local space.
    #[default]
    Object,
    /// Transform element bounds by the accumulated matrix first.
    World,
}

impl CullingSpace {
    /// Parses a space from its protocol name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "object" => Some(Self::Object),
            "world" => Some(Self::World),
            _ => None,
        }
    }

    /// Returns the protocol name of this space.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::World => "world",
        }
    }
}

/// How text primitives are realized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextPrimitiveKind {
    /// Triangulated glyph meshes.
    #[default]
    Mesh,
    /// Textured sprites.
    Sprite,
}

impl TextPrimitiveKind {
    /// Parses a kind from its protocol name.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "mesh" => Some(Self::Mesh),
            "sprite" => Some(Self::Sprite),
            _ => None,
        }
    }

    /// Returns the protocol name of this kind.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Mesh => "mesh",
            Self::Sprite => "sprite",
        }
    }
}

/// A shader assignment recorded by the `shader` call.
///
/// Compilation and parameter binding are a backend concern; the renderer only
/// carries the assignment through the attribute stack.
#[derive(Debug, Clone, PartialEq)]
pub struct ShaderSpec {
    /// The shader stage, e.g. `"surface"`.
    pub kind: String,
    /// The shader name, resolved against the shader search path by backends.
    pub name: String,
    /// Shader parameter values.
    pub parameters: ValueMap,
}

// --- Attribute state ---

/// The full set of scoped shading attributes.
///
/// One record is copied on every `attributeBegin` and dropped on the matching
/// `attributeEnd`; geometry snapshots the record at submission.
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeState {
    /// Base surface color.
    pub color: Color3,
    /// Opacity; stored with all channels equal (the set value is averaged).
    pub opacity: Color3,
    /// The derived RGBA color: `color` in the RGB lanes, averaged opacity in
    /// alpha, unless explicitly overridden through `gl:color`.
    pub gl_color: Color4,
    /// Constant blend color.
    pub blend_color: Color4,
    /// Source blend factor.
    pub blend_src_factor: BlendFactor,
    /// Destination blend factor.
    pub blend_dst_factor: BlendFactor,
    /// Blend equation.
    pub blend_equation: BlendEquation,
    /// Whether the subtree is shaded as transparent.
    pub shade_transparent: bool,
    /// Whether transparent primitives are depth-sorted before drawing.
    pub sort_for_transparency: bool,
    /// Name stamped onto nodes created in this scope.
    pub name: String,
    /// Whether both faces of surfaces are drawn.
    pub double_sided: bool,
    /// Point smoothing flag.
    pub smooth_points: bool,
    /// Line smoothing flag.
    pub smooth_lines: bool,
    /// Polygon smoothing flag.
    pub smooth_polygons: bool,
    /// The space the culling box is compared in.
    pub culling_space: CullingSpace,
    /// The culling box; an invalid box disables culling in this scope.
    pub culling_box: Aabb,
    /// How text primitives are realized.
    pub text_primitive_kind: TextPrimitiveKind,
    /// The current shader assignment, if any.
    pub shader: Option<Arc<ShaderSpec>>,
}

impl Default for AttributeState {
    fn default() -> Self {
        Self {
            color: Color3::WHITE,
            opacity: Color3::WHITE,
            gl_color: Color4::WHITE,
            blend_color: Color4::WHITE,
            blend_src_factor: BlendFactor::SrcAlpha,
            blend_dst_factor: BlendFactor::OneMinusSrcAlpha,
            blend_equation: BlendEquation::Add,
            shade_transparent: false,
            sort_for_transparency: true,
            name: "unnamed".to_string(),
            double_sided: true,
            smooth_points: false,
            smooth_lines: false,
            smooth_polygons: false,
            culling_space: CullingSpace::Object,
            culling_box: Aabb::INVALID,
            text_primitive_kind: TextPrimitiveKind::Mesh,
            shader: None,
        }
    }
}

impl AttributeState {
    fn type_error(name: &str, expected: &str, value: &Value) -> RenderError {
        RenderError::InvalidAttributeValue {
            name: name.to_string(),
            message: format!("expected {expected}, got {}", value.type_name()),
        }
    }

    /// Applies a single `setAttribute` call to this record.
    ///
    /// Recognized keys validate their payload; everything else is discarded
    /// with no storage and no diagnostics.
    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), RenderError> {
        match name {
            "color" => {
                let c = value
                    .as_color3()
                    .ok_or_else(|| Self::type_error(name, "Color3", value))?;
                self.color = c;
                // The derived RGBA tracks the RGB lanes, preserving alpha.
                self.gl_color = Color4::new(c.r, c.g, c.b, self.gl_color.a);
            }
            "opacity" => {
                let c = value
                    .as_color3()
                    .ok_or_else(|| Self::type_error(name, "Color3", value))?;
                let average = c.average();
                self.opacity = Color3::grey(average);
                self.gl_color.a = average;
            }
            "gl:color" => {
                self.gl_color = value
                    .as_color4()
                    .ok_or_else(|| Self::type_error(name, "Color4", value))?;
            }
            "gl:blend:color" => {
                self.blend_color = value
                    .as_color4()
                    .ok_or_else(|| Self::type_error(name, "Color4", value))?;
            }
            "gl:blend:srcFactor" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?;
                self.blend_src_factor =
                    BlendFactor::parse(s).ok_or_else(|| RenderError::InvalidBlendFactor {
                        value: s.to_string(),
                    })?;
            }
            "gl:blend:dstFactor" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?;
                self.blend_dst_factor =
                    BlendFactor::parse(s).ok_or_else(|| RenderError::InvalidBlendFactor {
                        value: s.to_string(),
                    })?;
            }
            "gl:blend:equation" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?;
                self.blend_equation =
                    BlendEquation::parse(s).ok_or_else(|| RenderError::InvalidBlendEquation {
                        value: s.to_string(),
                    })?;
            }
            "gl:shade:transparent" => {
                self.shade_transparent = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "gl:primitive:sortForTransparency" => {
                self.sort_for_transparency = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "name" => {
                self.name = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?
                    .to_string();
            }
            "doubleSided" => {
                self.double_sided = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "gl:smoothing:points" => {
                self.smooth_points = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "gl:smoothing:lines" => {
                self.smooth_lines = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "gl:smoothing:polygons" => {
                self.smooth_polygons = value
                    .as_bool()
                    .ok_or_else(|| Self::type_error(name, "Bool", value))?;
            }
            "gl:cullingSpace" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?;
                self.culling_space =
                    CullingSpace::parse(s).ok_or_else(|| RenderError::InvalidAttributeValue {
                        name: name.to_string(),
                        message: format!("expected \"object\" or \"world\", got \"{s}\""),
                    })?;
            }
            "gl:cullingBox" => {
                self.culling_box = value
                    .as_box3()
                    .ok_or_else(|| Self::type_error(name, "Box3", value))?;
            }
            "gl:textPrimitive:type" => {
                let s = value
                    .as_str()
                    .ok_or_else(|| Self::type_error(name, "String", value))?;
                self.text_primitive_kind = TextPrimitiveKind::parse(s).ok_or_else(|| {
                    RenderError::InvalidAttributeValue {
                        name: name.to_string(),
                        message: format!("expected \"mesh\" or \"sprite\", got \"{s}\""),
                    }
                })?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Reads a single attribute back. Unknown keys yield `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "color" => Some(Value::from(self.color)),
            "opacity" => Some(Value::from(self.opacity)),
            "gl:color" => Some(Value::from(self.gl_color)),
            "gl:blend:color" => Some(Value::from(self.blend_color)),
            "gl:blend:srcFactor" => Some(Value::from(self.blend_src_factor.name())),
            "gl:blend:dstFactor" => Some(Value::from(self.blend_dst_factor.name())),
            "gl:blend:equation" => Some(Value::from(self.blend_equation.name())),
            "gl:shade:transparent" => Some(Value::from(self.shade_transparent)),
            "gl:primitive:sortForTransparency" => Some(Value::from(self.sort_for_transparency)),
            "name" => Some(Value::from(self.name.clone())),
            "doubleSided" => Some(Value::from(self.double_sided)),
            "gl:smoothing:points" => Some(Value::from(self.smooth_points)),
            "gl:smoothing:lines" => Some(Value::from(self.smooth_lines)),
            "gl:smoothing:polygons" => Some(Value::from(self.smooth_polygons)),
            "gl:cullingSpace" => Some(Value::from(self.culling_space.name())),
            "gl:cullingBox" => Some(Value::from(self.culling_box)),
            "gl:textPrimitive:type" => Some(Value::from(self.text_primitive_kind.name())),
            _ => None,
        }
    }
}

// --- Tests ---
