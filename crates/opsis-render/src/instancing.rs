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

//! Named, reusable subgraphs captured once and instantiated many times.

use crate::scene::GroupNode;
use opsis_core::Aabb;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

/// A detached subgraph captured between `instanceBegin` and `instanceEnd`.
///
/// The content is built once and shared read-only across every
/// instantiation; only the instantiation transform varies per reference.
#[derive(Debug)]
pub struct InstanceDefinition {
    name: String,
    root: Arc<GroupNode>,
    bound: OnceLock<Aabb>,
}

impl InstanceDefinition {
    pub(crate) fn new(name: String, root: Arc<GroupNode>) -> Arc<Self> {
        Arc::new(Self {
            name,
            root,
            bound: OnceLock::new(),
        })
    }

    /// Returns the name the definition is registered under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the definition's root group.
    pub fn root(&self) -> &Arc<GroupNode> {
        &self.root
    }

    /// Returns the bound of the captured content, in the capture's root
    /// space. Computed on first use; the content is immutable after
    /// `instanceEnd`, so the cache never goes stale.
    pub fn bound(&self) -> Aabb {
        *self.bound.get_or_init(|| self.root.bound())
    }
}

/// The renderer-wide table of instance definitions.
#[derive(Debug, Default)]
pub(crate) struct InstanceRegistry {
    definitions: RwLock<HashMap<String, Arc<InstanceDefinition>>>,
}

impl InstanceRegistry {
    /// Registers a definition, replacing any previous one of the same name.
    pub(crate) fn register(&self, definition: Arc<InstanceDefinition>) {
        self.definitions
            .write()
            .unwrap()
            .insert(definition.name().to_string(), definition);
    }

    /// Looks up a definition by name.
    pub(crate) fn lookup(&self, name: &str) -> Option<Arc<InstanceDefinition>> {
        self.definitions.read().unwrap().get(name).cloned()
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeState;
    use crate::primitive::{Primitive, PrimitiveVariableMap};
    use crate::scene::{PrimitiveNode, SceneNode};
    use opsis_core::{Mat4, Vec3};

    fn definition_with_sphere(name: &str, at: Vec3) -> Arc<InstanceDefinition> {
        let root = GroupNode::new(None, Mat4::IDENTITY, Arc::new(AttributeState::default()));
        root_attach(&root, at);
        InstanceDefinition::new(name.to_string(), root)
    }

    fn root_attach(root: &Arc<GroupNode>, at: Vec3) {
        let node = PrimitiveNode::new(
            "unnamed".to_string(),
            Mat4::from_translation(at),
            Arc::new(AttributeState::default()),
            Primitive::sphere(1.0, -1.0, 1.0, 360.0),
            PrimitiveVariableMap::new(),
        );
        root.attach(SceneNode::Primitive(node));
    }

    #[test]
    fn test_bound_cached_after_first_query() {
        let def = definition_with_sphere("a", Vec3::new(2.0, 0.0, 0.0));
        let b = def.bound();
        assert_eq!(b.min, Vec3::new(1.0, -1.0, -1.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, 1.0));
        assert_eq!(def.bound(), b);
    }

    #[test]
    fn test_registry_replaces_same_name() {
        let registry = InstanceRegistry::default();
        registry.register(definition_with_sphere("a", Vec3::ZERO));
        registry.register(definition_with_sphere("a", Vec3::new(5.0, 0.0, 0.0)));
        let found = registry.lookup("a").unwrap();
        assert_eq!(found.bound().min, Vec3::new(4.0, -1.0, -1.0));
        assert!(registry.lookup("b").is_none());
    }
}
