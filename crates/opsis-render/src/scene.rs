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

//! The persistent scene graph built by the deferred backend.
//!
//! Nodes are shared through `Arc` and child lists sit behind `RwLock`, so the
//! graph can be read while procedural expansion attaches content. All
//! structural mutation funnels through the child-list locks; a node is never
//! observable half-built.
//!
//! Transforms are stored relative to the enclosing group, so a node's bound
//! is naturally expressed in its parent's space.

use crate::attributes::AttributeState;
use crate::draw::{Draw, DrawHandler};
use crate::instancing::InstanceDefinition;
use crate::primitive::{Primitive, PrimitiveVariableMap};
use opsis_core::{Aabb, Mat4};
use std::sync::{Arc, RwLock};

// --- Nodes ---

/// A node of the scene graph.
///
/// Clones are cheap handles onto the same underlying node.
#[derive(Debug, Clone)]
pub enum SceneNode {
    /// An interior node holding children.
    Group(Arc<GroupNode>),
    /// A leaf primitive.
    Primitive(Arc<PrimitiveNode>),
    /// A reference to a shared instance definition.
    Instance(Arc<InstanceNode>),
}

impl SceneNode {
    /// Returns the node's name, stamped from the `name` attribute at creation.
    pub fn name(&self) -> Option<&str> {
        match self {
            SceneNode::Group(n) => n.name(),
            SceneNode::Primitive(n) => Some(n.name()),
            SceneNode::Instance(n) => Some(n.name()),
        }
    }

    /// Returns the node's local transform, relative to its parent group.
    pub fn transform(&self) -> Mat4 {
        match self {
            SceneNode::Group(n) => n.transform(),
            SceneNode::Primitive(n) => n.transform(),
            SceneNode::Instance(n) => n.transform(),
        }
    }

    /// Computes the node's bound in its parent's space.
    pub fn bound(&self) -> Aabb {
        match self {
            SceneNode::Group(n) => n.bound(),
            SceneNode::Primitive(n) => n.bound(),
            SceneNode::Instance(n) => n.bound(),
        }
    }

    /// Identity comparison: do both handles point at the same node?
    pub(crate) fn same(&self, other: &SceneNode) -> bool {
        match (self, other) {
            (SceneNode::Group(a), SceneNode::Group(b)) => Arc::ptr_eq(a, b),
            (SceneNode::Primitive(a), SceneNode::Primitive(b)) => Arc::ptr_eq(a, b),
            (SceneNode::Instance(a), SceneNode::Instance(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// An interior scene node with an ordered child list.
#[derive(Debug)]
pub struct GroupNode {
    name: Option<String>,
    transform: Mat4,
    state: Arc<AttributeState>,
    children: RwLock<Vec<SceneNode>>,
}

impl GroupNode {
    pub(crate) fn new(
        name: Option<String>,
        transform: Mat4,
        state: Arc<AttributeState>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            transform,
            state,
            children: RwLock::new(Vec::new()),
        })
    }

    /// Returns the group's name, if it has one. The scene root is unnamed.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the group's transform relative to its parent.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Returns the attribute snapshot taken when the group was opened.
    pub fn state(&self) -> &AttributeState {
        &self.state
    }

    /// Returns a snapshot of the ordered child list.
    pub fn children(&self) -> Vec<SceneNode> {
        self.children.read().unwrap().clone()
    }

    /// Computes the group's bound in its parent's space: the union of the
    /// children's bounds, transformed by the group's own matrix.
    ///
    /// Bounds are computed on demand rather than cached; the graph stays
    /// mutable (attachment, removal) without invalidation bookkeeping.
    pub fn bound(&self) -> Aabb {
        let union = self
            .children
            .read()
            .unwrap()
            .iter()
            .fold(Aabb::INVALID, |b, child| b.merge(&child.bound()));
        union.transform(&self.transform)
    }

    pub(crate) fn attach(&self, node: SceneNode) {
        self.children.write().unwrap().push(node);
    }

    /// Detaches `target` if it is a direct child. Returns whether it was.
    pub(crate) fn detach(&self, target: &SceneNode) -> bool {
        let mut children = self.children.write().unwrap();
        match children.iter().position(|c| c.same(target)) {
            Some(index) => {
                children.remove(index);
                true
            }
            None => false,
        }
    }

    /// Detaches the first node named `name`, searching depth-first in child
    /// order. Does not descend into instance definitions: their content is
    /// shared by every instantiation.
    pub(crate) fn remove_named(&self, name: &str) -> bool {
        // Locks are taken along a single root-to-leaf path of a tree, so the
        // nested acquisition cannot cycle.
        let mut children = self.children.write().unwrap();
        for index in 0..children.len() {
            if children[index].name() == Some(name) {
                children.remove(index);
                return true;
            }
            if let SceneNode::Group(group) = &children[index] {
                if group.remove_named(name) {
                    return true;
                }
            }
        }
        false
    }
}

/// A leaf node holding one primitive and its submission context.
#[derive(Debug)]
pub struct PrimitiveNode {
    name: String,
    transform: Mat4,
    state: Arc<AttributeState>,
    primitive: Primitive,
    variables: PrimitiveVariableMap,
}

impl PrimitiveNode {
    pub(crate) fn new(
        name: String,
        transform: Mat4,
        state: Arc<AttributeState>,
        primitive: Primitive,
        variables: PrimitiveVariableMap,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            transform,
            state,
            primitive,
            variables,
        })
    }

    /// Returns the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the node's transform relative to its parent group.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Returns the attribute snapshot taken at submission.
    pub fn state(&self) -> &AttributeState {
        &self.state
    }

    /// Returns the primitive.
    pub fn primitive(&self) -> &Primitive {
        &self.primitive
    }

    /// Returns the primitive variables supplied at submission.
    pub fn variables(&self) -> &PrimitiveVariableMap {
        &self.variables
    }

    /// Computes the node's bound in its parent's space.
    pub fn bound(&self) -> Aabb {
        self.primitive.bound().transform(&self.transform)
    }
}

/// A leaf node referencing a shared [`InstanceDefinition`].
#[derive(Debug)]
pub struct InstanceNode {
    name: String,
    transform: Mat4,
    definition: Arc<InstanceDefinition>,
}

impl InstanceNode {
    pub(crate) fn new(
        name: String,
        transform: Mat4,
        definition: Arc<InstanceDefinition>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            transform,
            definition,
        })
    }

    /// Returns the node's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the instantiation transform of this reference.
    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    /// Returns the referenced definition.
    pub fn definition(&self) -> &Arc<InstanceDefinition> {
        &self.definition
    }

    /// Computes the node's bound: the definition's bound transformed by the
    /// instantiation transform.
    pub fn bound(&self) -> Aabb {
        self.definition.bound().transform(&self.transform)
    }
}

// --- Scene ---

/// Handle onto the graph built by a deferred render.
///
/// The handle stays valid for the life of the graph; clones share it.
#[derive(Debug, Clone)]
pub struct Scene {
    root: Arc<GroupNode>,
}

impl Scene {
    pub(crate) fn new(root: Arc<GroupNode>) -> Self {
        Self { root }
    }

    /// Returns the root group.
    pub fn root(&self) -> &Arc<GroupNode> {
        &self.root
    }

    /// Computes the bound of the whole scene.
    pub fn bound(&self) -> Aabb {
        self.root.bound()
    }

    /// Traverses the graph depth-first, composing transforms, and submits
    /// every primitive through `handler`.
    pub fn render(&self, handler: &mut dyn DrawHandler) {
        render_group(&self.root, Mat4::IDENTITY, handler);
    }

    /// Detaches the first node named `name` anywhere in the graph.
    ///
    /// Returns `false` — and mutates nothing — when no node matches.
    pub fn remove_object(&self, name: &str) -> bool {
        self.root.remove_named(name)
    }
}

/// Draws `group` and everything below it with `parent` as the accumulated
/// transform of the group's parent.
pub(crate) fn render_group(group: &Arc<GroupNode>, parent: Mat4, handler: &mut dyn DrawHandler) {
    let world = parent * group.transform();
    for child in group.children() {
        match child {
            SceneNode::Group(g) => render_group(&g, world, handler),
            SceneNode::Primitive(p) => handler.draw(Draw {
                primitive: p.primitive(),
                variables: p.variables(),
                transform: world * p.transform(),
                state: p.state(),
            }),
            SceneNode::Instance(i) => {
                render_group(i.definition().root(), world * i.transform(), handler)
            }
        }
    }
}

// --- Tests ---

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitive::PrimitiveVariableMap;
    use opsis_core::Vec3;

    fn prim(name: &str, transform: Mat4) -> SceneNode {
        SceneNode::Primitive(PrimitiveNode::new(
            name.to_string(),
            transform,
            Arc::new(AttributeState::default()),
            Primitive::sphere(1.0, -1.0, 1.0, 360.0),
            PrimitiveVariableMap::new(),
        ))
    }

    fn group(name: Option<&str>, transform: Mat4) -> Arc<GroupNode> {
        GroupNode::new(
            name.map(str::to_string),
            transform,
            Arc::new(AttributeState::default()),
        )
    }

    #[test]
    fn test_group_bound_unions_children_in_parent_space() {
        let root = group(None, Mat4::IDENTITY);
        root.attach(prim("a", Mat4::from_translation(Vec3::new(2.0, 0.0, 0.0))));
        root.attach(prim("b", Mat4::from_translation(Vec3::new(-2.0, 0.0, 0.0))));
        let b = root.bound();
        assert_eq!(b.min, Vec3::new(-3.0, -1.0, -1.0));
        assert_eq!(b.max, Vec3::new(3.0, 1.0, 1.0));
    }

    #[test]
    fn test_nested_group_transform_composes_in_bound() {
        let root = group(None, Mat4::IDENTITY);
        let inner = group(Some("inner"), Mat4::from_translation(Vec3::new(0.0, 10.0, 0.0)));
        inner.attach(prim("a", Mat4::IDENTITY));
        root.attach(SceneNode::Group(inner));
        let b = root.bound();
        assert_eq!(b.min, Vec3::new(-1.0, 9.0, -1.0));
        assert_eq!(b.max, Vec3::new(1.0, 11.0, 1.0));
    }

    #[test]
    fn test_remove_named_detaches_exactly_one() {
        let root = group(None, Mat4::IDENTITY);
        root.attach(prim("a", Mat4::IDENTITY));
        root.attach(prim("dup", Mat4::IDENTITY));
        root.attach(prim("dup", Mat4::IDENTITY));
        let scene = Scene::new(root);

        assert!(scene.remove_object("dup"));
        assert_eq!(scene.root().children().len(), 2);
        assert!(!scene.remove_object("missing"));
        assert_eq!(scene.root().children().len(), 2);
    }

    #[test]
    fn test_remove_named_searches_nested_groups() {
        let root = group(None, Mat4::IDENTITY);
        let inner = group(Some("inner"), Mat4::IDENTITY);
        inner.attach(prim("deep", Mat4::IDENTITY));
        root.attach(SceneNode::Group(inner.clone()));
        let scene = Scene::new(root);

        assert!(scene.remove_object("deep"));
        assert!(inner.children().is_empty());
    }

    #[test]
    fn test_empty_group_bound_is_invalid() {
        assert!(!group(None, Mat4::IDENTITY).bound().is_valid());
    }
}
