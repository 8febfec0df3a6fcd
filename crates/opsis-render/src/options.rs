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

//! Renderer-wide configuration set through `setOption`/`getOption`.
//!
//! Recognized keys map to typed fields; the unqualified and `gl:`-qualified
//! spellings of a key alias the same storage cell. `user:` keys pass through
//! to an open dictionary. Keys addressed at other renderers are silently
//! ignored.

use crate::error::RenderError;
use opsis_core::{Value, ValueMap, Vec2};

/// Execution mode selected by the `gl:mode` option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Draw directly on geometry submission; retain nothing.
    #[default]
    Immediate,
    /// Build a persistent, queryable scene graph.
    Deferred,
}

/// The renderer's option table.
///
/// Options may only be mutated before framing begins; the [`Renderer`]
/// enforces that and delegates key resolution here.
///
/// [`Renderer`]: crate::renderer::Renderer
#[derive(Debug, Clone)]
pub struct Options {
    /// Colon-separated search path for textures.
    pub texture_search_path: String,
    /// Colon-separated search path for shader sources.
    pub shader_search_path: String,
    /// Colon-separated search path for shader include files.
    pub shader_include_search_path: String,
    /// Shutter open/close interval.
    pub shutter: Vec2,
    /// Execution mode, resolved at `worldBegin`.
    pub mode: RenderMode,
    user: ValueMap,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            texture_search_path: String::new(),
            shader_search_path: String::new(),
            shader_include_search_path: String::new(),
            shutter: Vec2::ZERO,
            mode: RenderMode::Immediate,
            user: ValueMap::new(),
        }
    }
}

impl Options {
    fn expect_string(name: &str, value: &Value) -> Result<String, RenderError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| RenderError::InvalidOptionValue {
                name: name.to_string(),
                message: format!("expected String, got {}", value.type_name()),
            })
    }

    /// Sets a single option.
    ///
    /// Unrecognized keys are ignored without diagnostics, except `user:` keys,
    /// which are stored verbatim and read back through [`get`](Self::get).
    pub fn set(&mut self, name: &str, value: &Value) -> Result<(), RenderError> {
        match name {
            "searchPath:texture" | "gl:searchPath:texture" => {
                self.texture_search_path = Self::expect_string(name, value)?;
            }
            "searchPath:shader" | "gl:searchPath:shader" => {
                self.shader_search_path = Self::expect_string(name, value)?;
            }
            "searchPath:shaderInclude" | "gl:searchPath:shaderInclude" => {
                self.shader_include_search_path = Self::expect_string(name, value)?;
            }
            "shutter" => {
                self.shutter =
                    value
                        .as_vec2()
                        .ok_or_else(|| RenderError::InvalidOptionValue {
                            name: name.to_string(),
                            message: format!("expected Vec2, got {}", value.type_name()),
                        })?;
            }
            "gl:mode" => {
                self.mode = match Self::expect_string(name, value)?.as_str() {
                    "immediate" => RenderMode::Immediate,
                    "deferred" => RenderMode::Deferred,
                    other => {
                        return Err(RenderError::InvalidOptionValue {
                            name: name.to_string(),
                            message: format!("expected \"immediate\" or \"deferred\", got \"{other}\""),
                        })
                    }
                };
            }
            _ if name.starts_with("user:") => {
                self.user.insert(name.to_string(), value.clone());
            }
            _ => {}
        }
        Ok(())
    }

    /// Reads a single option. Recognized keys always yield a value (their
    /// default when never set); unknown keys yield `None`.
    pub fn get(&self, name: &str) -> Option<Value> {
        match name {
            "searchPath:texture" | "gl:searchPath:texture" => {
                Some(Value::from(self.texture_search_path.clone()))
            }
            "searchPath:shader" | "gl:searchPath:shader" => {
                Some(Value::from(self.shader_search_path.clone()))
            }
            "searchPath:shaderInclude" | "gl:searchPath:shaderInclude" => {
                Some(Value::from(self.shader_include_search_path.clone()))
            }
            "shutter" => Some(Value::from(self.shutter)),
            "gl:mode" => Some(Value::from(match self.mode {
                RenderMode::Immediate => "immediate",
                RenderMode::Deferred => "deferred",
            })),
            _ if name.starts_with("user:") => self.user.get(name).cloned(),
            _ => None,
        }
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alias_shares_one_cell() {
        let mut o = Options::default();
        o.set("searchPath:texture", &Value::from("a")).unwrap();
        assert_eq!(o.get("gl:searchPath:texture"), Some(Value::from("a")));

        o.set("gl:searchPath:texture", &Value::from("b")).unwrap();
        assert_eq!(o.get("searchPath:texture"), Some(Value::from("b")));
    }

    #[test]
    fn test_mode_parsing() {
        let mut o = Options::default();
        assert_eq!(o.mode, RenderMode::Immediate);
        o.set("gl:mode", &Value::from("deferred")).unwrap();
        assert_eq!(o.mode, RenderMode::Deferred);
        assert!(o.set("gl:mode", &Value::from("direct")).is_err());
        // A failed set leaves the previous value in place.
        assert_eq!(o.mode, RenderMode::Deferred);
    }

    #[test]
    fn test_shutter_default_and_set() {
        let mut o = Options::default();
        assert_eq!(o.get("shutter"), Some(Value::from(Vec2::ZERO)));
        o.set("shutter", &Value::from(Vec2::new(1.0, 2.0))).unwrap();
        assert_eq!(o.shutter, Vec2::new(1.0, 2.0));
    }

    #[test]
    fn test_foreign_keys_ignored_user_keys_kept() {
        let mut o = Options::default();
        o.set("ri:pixelSamples", &Value::from(16)).unwrap();
        assert_eq!(o.get("ri:pixelSamples"), None);

        o.set("user:myFlag", &Value::from(true)).unwrap();
        assert_eq!(o.get("user:myFlag"), Some(Value::from(true)));
    }

    #[test]
    fn test_wrong_payload_type_rejected() {
        let mut o = Options::default();
        assert!(o.set("shutter", &Value::from("late")).is_err());
        assert!(o.set("searchPath:shader", &Value::from(1)).is_err());
    }
}
