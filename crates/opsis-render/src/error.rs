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

//! Defines the error types surfaced by the scene-description protocol.

use std::fmt;

/// Coarse classification of a [`RenderError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller issued an ill-formed call sequence or an invalid value.
    Usage,
    /// The operation needs backing state the renderer does not currently hold.
    State,
    /// A procedural expansion failed; the error carries the first failure.
    Expansion,
}

/// An error raised by a scene-description call.
///
/// Errors surface synchronously to the call that triggered them and leave
/// prior state untouched; in particular they never corrupt scope-stack depth.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderError {
    /// A begin/end pair is unbalanced at the point of this call.
    UnbalancedScope {
        /// The call that detected the imbalance.
        call: &'static str,
    },
    /// `worldBegin` was issued while a world block is already open.
    AlreadyInWorld,
    /// The call is only valid inside a world block or an instance capture.
    NotInWorld {
        /// The offending call.
        call: &'static str,
    },
    /// The call is only valid before `worldBegin`.
    NotBeforeWorld {
        /// The offending call.
        call: &'static str,
    },
    /// Options are frozen once framing has begun.
    OptionLocked {
        /// The option key that was being set.
        name: String,
    },
    /// A recognized option key received an unusable payload.
    InvalidOptionValue {
        /// The option key.
        name: String,
        /// What went wrong.
        message: String,
    },
    /// A recognized attribute key received an unusable payload.
    InvalidAttributeValue {
        /// The attribute key.
        name: String,
        /// What went wrong.
        message: String,
    },
    /// A blend factor name outside the recognized constant set.
    InvalidBlendFactor {
        /// The rejected name.
        value: String,
    },
    /// A blend equation name outside the recognized constant set.
    InvalidBlendEquation {
        /// The rejected name.
        value: String,
    },
    /// `instanceBegin` was issued while another capture is open.
    NestedInstanceCapture {
        /// The name of the capture being opened.
        name: String,
    },
    /// An instance capture is still open at a call that requires it closed.
    InstanceCaptureOpen {
        /// The call that requires the capture to be closed.
        call: &'static str,
    },
    /// `instance` referenced a name with no registered definition.
    UnknownInstance {
        /// The unresolved instance name.
        name: String,
    },
    /// `command` was issued with an unrecognized command name.
    UnknownCommand {
        /// The unrecognized command name.
        name: String,
    },
    /// A call is missing a required parameter.
    MissingParameter {
        /// The call or command.
        call: &'static str,
        /// The missing parameter name.
        name: &'static str,
    },
    /// The operation requires a deferred scene graph and none exists.
    SceneUnavailable,
    /// A procedural expansion failed.
    Expansion {
        /// Description of the first failure in the subtree.
        message: String,
    },
}

impl RenderError {
    /// Returns the coarse classification of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            RenderError::SceneUnavailable => ErrorKind::State,
            RenderError::Expansion { .. } => ErrorKind::Expansion,
            _ => ErrorKind::Usage,
        }
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::UnbalancedScope { call } => {
                write!(f, "Unbalanced scope at '{call}'")
            }
            RenderError::AlreadyInWorld => {
                write!(f, "worldBegin called inside an open world block")
            }
            RenderError::NotInWorld { call } => {
                write!(f, "'{call}' is only valid inside a world block or instance capture")
            }
            RenderError::NotBeforeWorld { call } => {
                write!(f, "'{call}' is only valid before worldBegin")
            }
            RenderError::OptionLocked { name } => {
                write!(f, "Cannot set option '{name}' once framing has begun")
            }
            RenderError::InvalidOptionValue { name, message } => {
                write!(f, "Invalid value for option '{name}': {message}")
            }
            RenderError::InvalidAttributeValue { name, message } => {
                write!(f, "Invalid value for attribute '{name}': {message}")
            }
            RenderError::InvalidBlendFactor { value } => {
                write!(f, "Unrecognized blend factor '{value}'")
            }
            RenderError::InvalidBlendEquation { value } => {
                write!(f, "Unrecognized blend equation '{value}'")
            }
            RenderError::NestedInstanceCapture { name } => {
                write!(f, "Cannot begin instance '{name}' inside another instance capture")
            }
            RenderError::InstanceCaptureOpen { call } => {
                write!(f, "'{call}' is invalid while an instance capture is open")
            }
            RenderError::UnknownInstance { name } => {
                write!(f, "No instance registered under '{name}'")
            }
            RenderError::UnknownCommand { name } => {
                write!(f, "Unknown command '{name}'")
            }
            RenderError::MissingParameter { call, name } => {
                write!(f, "'{call}' requires parameter '{name}'")
            }
            RenderError::SceneUnavailable => {
                write!(f, "No scene graph available; the renderer is not in deferred mode")
            }
            RenderError::Expansion { message } => {
                write!(f, "Procedural expansion failed: {message}")
            }
        }
    }
}

impl std::error::Error for RenderError {}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            RenderError::UnbalancedScope { call: "attributeEnd" }.kind(),
            ErrorKind::Usage
        );
        assert_eq!(RenderError::SceneUnavailable.kind(), ErrorKind::State);
        assert_eq!(
            RenderError::Expansion {
                message: "boom".into()
            }
            .kind(),
            ErrorKind::Expansion
        );
    }

    #[test]
    fn test_display_contains_context() {
        let e = RenderError::InvalidBlendFactor {
            value: "bogus".into(),
        };
        assert!(e.to_string().contains("bogus"));
    }
}
