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

//! The renderer facade: the full scene-description call protocol.
//!
//! A [`Renderer`] consumes an imperative stream of calls. Before `worldBegin`
//! it accepts options, camera placement and instance captures; inside the
//! world block it scopes attributes and transforms, submits geometry and
//! expands procedurals. In deferred mode content lands in a persistent
//! [`Scene`]; in immediate mode it leaves through the [`DrawHandler`].
//!
//! Transforms applied before `worldBegin` position the camera and are never
//! folded into the world-block transform, which starts at identity in both
//! modes. `concatTransform` composes `current = current * m` — the new
//! matrix applies in local space first — and that order holds everywhere.

use crate::attributes::{AttributeState, ShaderSpec};
use crate::culling;
use crate::draw::{Draw, DrawHandler, LogDrawHandler};
use crate::error::RenderError;
use crate::instancing::{InstanceDefinition, InstanceRegistry};
use crate::options::{Options, RenderMode};
use crate::primitive::{Primitive, PrimitiveVariableMap};
use crate::procedural::{Expander, Procedural};
use crate::scene::{self, GroupNode, InstanceNode, PrimitiveNode, Scene, SceneNode};
use opsis_core::{Mat4, Value, ValueMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// A camera recorded before `worldBegin`, together with the pre-world
/// transform current at the call.
#[derive(Debug, Clone)]
pub struct CameraSpec {
    /// The camera name.
    pub name: String,
    /// Camera parameters (resolution, projection, ...), passed through to
    /// backends uninterpreted.
    pub parameters: ValueMap,
    /// The camera placement transform.
    pub transform: Mat4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    PreWorld,
    World,
}

#[derive(Debug, Clone, Copy)]
enum Scope {
    Attribute { opened_group: bool },
    Transform,
}

/// One open group of a graph build site, with the accumulated world
/// transform at the moment the group was opened and its cached inverse
/// (used to stamp children with parent-relative transforms).
struct GroupEntry {
    node: Arc<GroupNode>,
    inv_world: Mat4,
}

impl GroupEntry {
    fn new(node: Arc<GroupNode>, world: Mat4) -> Self {
        let inv_world = world.affine_inverse().unwrap_or_else(|| {
            log::warn!("non-invertible transform at group open; stamping children in world space");
            Mat4::IDENTITY
        });
        Self { node, inv_world }
    }
}

/// State suspended by `instanceBegin` and restored by `instanceEnd`.
struct CaptureFrame {
    name: String,
    root: Arc<GroupNode>,
    saved_transforms: Vec<Mat4>,
    saved_attributes: Vec<AttributeState>,
    saved_scopes: Vec<Scope>,
    saved_groups: Vec<GroupEntry>,
}

/// State shared between a renderer and its procedural expansion contexts.
///
/// The destination graph is the only resource mutated from several threads;
/// every structural mutation goes through the child-list locks inside
/// [`GroupNode`].
struct Shared {
    options: RwLock<Options>,
    world_started: AtomicBool,
    root: RwLock<Option<Arc<GroupNode>>>,
    instances: InstanceRegistry,
    draw: Mutex<Box<dyn DrawHandler>>,
}

/// The scene-description renderer.
///
/// Distinct instances share no mutable state and may be driven from separate
/// threads independently.
pub struct Renderer {
    shared: Arc<Shared>,
    phase: Phase,
    mode: RenderMode,
    /// Camera-placement transform stack, active outside the world block.
    pre_world: Vec<Mat4>,
    pre_world_opens: usize,
    /// World/capture transform stack; one matrix per open frame.
    transforms: Vec<Mat4>,
    attributes: Vec<AttributeState>,
    scopes: Vec<Scope>,
    groups: Vec<GroupEntry>,
    capture: Option<CaptureFrame>,
    /// Present only on procedural expansion contexts.
    expander: Option<Arc<Expander>>,
    camera: Option<CameraSpec>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with default options and the logging draw handler.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                options: RwLock::new(Options::default()),
                world_started: AtomicBool::new(false),
                root: RwLock::new(None),
                instances: InstanceRegistry::default(),
                draw: Mutex::new(Box::new(LogDrawHandler)),
            }),
            phase: Phase::PreWorld,
            mode: RenderMode::Immediate,
            pre_world: vec![Mat4::IDENTITY],
            pre_world_opens: 0,
            transforms: Vec::new(),
            attributes: Vec::new(),
            scopes: Vec::new(),
            groups: Vec::new(),
            capture: None,
            expander: None,
            camera: None,
        }
    }

    /// Builds the isolated handle a procedural expansion runs against.
    fn expansion_context(
        shared: Arc<Shared>,
        expander: Arc<Expander>,
        state: AttributeState,
        world: Mat4,
        subtree: Arc<GroupNode>,
    ) -> Self {
        Self {
            shared,
            phase: Phase::World,
            mode: RenderMode::Deferred,
            pre_world: vec![Mat4::IDENTITY],
            pre_world_opens: 0,
            transforms: vec![world],
            attributes: vec![state],
            scopes: Vec::new(),
            groups: vec![GroupEntry::new(subtree, world)],
            capture: None,
            expander: Some(expander),
            camera: None,
        }
    }

    /// Replaces the draw handler the immediate backend submits through.
    pub fn set_draw_handler(&mut self, handler: Box<dyn DrawHandler>) {
        *self.shared.draw.lock().unwrap() = handler;
    }

    // --- Predicates ---

    /// Inside the world block or an instance capture: scoping, state and
    /// geometry calls are legal.
    fn in_content(&self) -> bool {
        self.capture.is_some() || self.phase == Phase::World
    }

    /// Submissions land in a graph (deferred world, or any capture) rather
    /// than going out through the draw handler.
    fn building_graph(&self) -> bool {
        self.capture.is_some() || (self.phase == Phase::World && self.mode == RenderMode::Deferred)
    }

    // --- Options ---

    /// Sets a renderer option. Options freeze once framing has begun.
    pub fn set_option(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RenderError> {
        if self.shared.world_started.load(Ordering::SeqCst) {
            return Err(RenderError::OptionLocked {
                name: name.to_string(),
            });
        }
        self.shared.options.write().unwrap().set(name, &value.into())
    }

    /// Reads a renderer option; recognized keys yield their default when
    /// never set.
    pub fn get_option(&self, name: &str) -> Option<Value> {
        self.shared.options.read().unwrap().get(name)
    }

    // --- Camera ---

    /// Declares the camera, capturing the current pre-world transform as its
    /// placement.
    pub fn camera(&mut self, name: &str, parameters: ValueMap) -> Result<(), RenderError> {
        if self.capture.is_some() {
            return Err(RenderError::InstanceCaptureOpen { call: "camera" });
        }
        if self.phase == Phase::World {
            return Err(RenderError::NotBeforeWorld { call: "camera" });
        }
        self.camera = Some(CameraSpec {
            name: name.to_string(),
            parameters,
            transform: *self.pre_world.last().unwrap(),
        });
        Ok(())
    }

    /// Returns the declared camera, if any.
    pub fn current_camera(&self) -> Option<&CameraSpec> {
        self.camera.as_ref()
    }

    // --- Framing ---

    /// Opens the world block. Resolves the execution mode from `gl:mode`,
    /// freezes options, and resets the world transform to identity; the
    /// pre-world (camera) transform stays tracked separately.
    pub fn world_begin(&mut self) -> Result<(), RenderError> {
        if self.capture.is_some() {
            return Err(RenderError::InstanceCaptureOpen { call: "worldBegin" });
        }
        if self.phase == Phase::World {
            return Err(RenderError::AlreadyInWorld);
        }
        self.shared.world_started.store(true, Ordering::SeqCst);
        self.mode = self.shared.options.read().unwrap().mode;
        self.phase = Phase::World;
        self.transforms = vec![Mat4::IDENTITY];
        self.attributes = vec![AttributeState::default()];
        self.scopes.clear();
        match self.mode {
            RenderMode::Deferred => {
                let root =
                    GroupNode::new(None, Mat4::IDENTITY, Arc::new(AttributeState::default()));
                *self.shared.root.write().unwrap() = Some(Arc::clone(&root));
                self.groups = vec![GroupEntry::new(root, Mat4::IDENTITY)];
            }
            RenderMode::Immediate => {
                *self.shared.root.write().unwrap() = None;
                self.groups.clear();
            }
        }
        Ok(())
    }

    /// Closes the world block. Invalid while any attribute/transform scope or
    /// instance capture remains open. The deferred graph persists and stays
    /// reachable through [`scene`](Self::scene).
    pub fn world_end(&mut self) -> Result<(), RenderError> {
        if self.capture.is_some() {
            return Err(RenderError::InstanceCaptureOpen { call: "worldEnd" });
        }
        if self.phase != Phase::World || !self.scopes.is_empty() {
            return Err(RenderError::UnbalancedScope { call: "worldEnd" });
        }
        self.phase = Phase::PreWorld;
        self.transforms.clear();
        self.attributes.clear();
        self.groups.clear();
        Ok(())
    }

    // --- Scoping ---

    /// Opens an attribute scope, which also saves the current transform. In
    /// a graph build this opens an implicit group node.
    pub fn attribute_begin(&mut self) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld {
                call: "attributeBegin",
            });
        }
        let state = self.attributes.last().unwrap().clone();
        let world = *self.transforms.last().unwrap();
        let opened_group = if self.building_graph() {
            let entry = self.groups.last().unwrap();
            let group = GroupNode::new(
                Some(state.name.clone()),
                entry.inv_world * world,
                Arc::new(state.clone()),
            );
            entry.node.attach(SceneNode::Group(Arc::clone(&group)));
            self.groups.push(GroupEntry::new(group, world));
            true
        } else {
            false
        };
        self.attributes.push(state);
        self.transforms.push(world);
        self.scopes.push(Scope::Attribute { opened_group });
        Ok(())
    }

    /// Closes the innermost attribute scope, restoring attributes and
    /// transform to their values before the matching `attributeBegin`.
    pub fn attribute_end(&mut self) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld {
                call: "attributeEnd",
            });
        }
        let opened_group = match self.scopes.last() {
            Some(Scope::Attribute { opened_group }) => *opened_group,
            _ => {
                return Err(RenderError::UnbalancedScope {
                    call: "attributeEnd",
                })
            }
        };
        self.scopes.pop();
        self.attributes.pop();
        self.transforms.pop();
        if opened_group {
            self.groups.pop();
        }
        Ok(())
    }

    /// Opens a transform scope. Legal outside the world block, where it
    /// scopes the camera-placement transform instead.
    pub fn transform_begin(&mut self) -> Result<(), RenderError> {
        if self.in_content() {
            let top = *self.transforms.last().unwrap();
            self.transforms.push(top);
            self.scopes.push(Scope::Transform);
        } else {
            let top = *self.pre_world.last().unwrap();
            self.pre_world.push(top);
            self.pre_world_opens += 1;
        }
        Ok(())
    }

    /// Closes the innermost transform scope, restoring the transform to its
    /// value before the matching `transformBegin`.
    pub fn transform_end(&mut self) -> Result<(), RenderError> {
        if self.in_content() {
            if !matches!(self.scopes.last(), Some(Scope::Transform)) {
                return Err(RenderError::UnbalancedScope {
                    call: "transformEnd",
                });
            }
            self.scopes.pop();
            self.transforms.pop();
            Ok(())
        } else if self.pre_world_opens > 0 {
            self.pre_world_opens -= 1;
            self.pre_world.pop();
            Ok(())
        } else {
            Err(RenderError::UnbalancedScope {
                call: "transformEnd",
            })
        }
    }

    // --- Transforms ---

    /// Replaces the current transform outright.
    pub fn set_transform(&mut self, m: Mat4) {
        if self.in_content() {
            *self.transforms.last_mut().unwrap() = m;
        } else {
            *self.pre_world.last_mut().unwrap() = m;
        }
    }

    /// Returns the current transform: the accumulated world transform inside
    /// the world block, or the camera-placement transform outside it.
    pub fn get_transform(&self) -> Mat4 {
        if self.in_content() {
            *self.transforms.last().unwrap()
        } else {
            *self.pre_world.last().unwrap()
        }
    }

    /// Composes `m` onto the current transform as `current * m`: the new
    /// matrix applies in local space before the existing transform.
    pub fn concat_transform(&mut self, m: Mat4) {
        if self.in_content() {
            let top = self.transforms.last_mut().unwrap();
            *top = *top * m;
        } else {
            let top = self.pre_world.last_mut().unwrap();
            *top = *top * m;
        }
    }

    // --- Attributes & shading ---

    /// Sets a scoped attribute. Unrecognized keys — including those of other
    /// renderers — are discarded silently.
    pub fn set_attribute(&mut self, name: &str, value: impl Into<Value>) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld {
                call: "setAttribute",
            });
        }
        self.attributes.last_mut().unwrap().set(name, &value.into())
    }

    /// Reads a scoped attribute back. Yields `None` for unknown keys and
    /// outside the world block.
    pub fn get_attribute(&self, name: &str) -> Option<Value> {
        self.attributes.last()?.get(name)
    }

    /// Records the current shader assignment in the attribute state.
    pub fn shader(
        &mut self,
        kind: &str,
        name: &str,
        parameters: ValueMap,
    ) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld { call: "shader" });
        }
        self.attributes.last_mut().unwrap().shader = Some(Arc::new(ShaderSpec {
            kind: kind.to_string(),
            name: name.to_string(),
            parameters,
        }));
        Ok(())
    }

    // --- Geometry ---

    /// Submits geometry by kind name. Unsupported kinds are logged and
    /// skipped so a stream authored for a richer renderer still plays back.
    pub fn geometry(
        &mut self,
        kind: &str,
        params: &ValueMap,
        variables: PrimitiveVariableMap,
    ) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld { call: "geometry" });
        }
        match Primitive::from_call(kind, params, &variables) {
            Some(primitive) => self.submit(primitive, variables),
            None => {
                log::warn!("geometry kind \"{kind}\" is not supported; skipping");
                Ok(())
            }
        }
    }

    /// Convenience sphere submission.
    pub fn sphere(
        &mut self,
        radius: f32,
        z_min: f32,
        z_max: f32,
        theta_max: f32,
        variables: PrimitiveVariableMap,
    ) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld { call: "sphere" });
        }
        self.submit(Primitive::sphere(radius, z_min, z_max, theta_max), variables)
    }

    /// Routes one surviving primitive to the active backend.
    fn submit(
        &mut self,
        primitive: Primitive,
        variables: PrimitiveVariableMap,
    ) -> Result<(), RenderError> {
        let world = *self.transforms.last().unwrap();
        let state = self.attributes.last().unwrap();
        if !culling::accepts(state, &primitive.bound(), &world) {
            return Ok(());
        }
        if self.building_graph() {
            let entry = self.groups.last().unwrap();
            let node = PrimitiveNode::new(
                state.name.clone(),
                entry.inv_world * world,
                Arc::new(state.clone()),
                primitive,
                variables,
            );
            entry.node.attach(SceneNode::Primitive(node));
        } else {
            let mut handler = self.shared.draw.lock().unwrap();
            handler.draw(Draw {
                primitive: &primitive,
                variables: &variables,
                transform: world,
                state,
            });
        }
        Ok(())
    }

    // --- Instancing ---

    /// Opens an instance capture: subsequent calls build a detached subgraph
    /// with a fresh transform (identity root) and default attributes.
    /// Legal outside the world block.
    pub fn instance_begin(&mut self, name: &str, _options: &ValueMap) -> Result<(), RenderError> {
        if self.capture.is_some() {
            return Err(RenderError::NestedInstanceCapture {
                name: name.to_string(),
            });
        }
        let root = GroupNode::new(None, Mat4::IDENTITY, Arc::new(AttributeState::default()));
        self.capture = Some(CaptureFrame {
            name: name.to_string(),
            root: Arc::clone(&root),
            saved_transforms: std::mem::replace(&mut self.transforms, vec![Mat4::IDENTITY]),
            saved_attributes: std::mem::replace(
                &mut self.attributes,
                vec![AttributeState::default()],
            ),
            saved_scopes: std::mem::take(&mut self.scopes),
            saved_groups: std::mem::replace(
                &mut self.groups,
                vec![GroupEntry::new(root, Mat4::IDENTITY)],
            ),
        });
        Ok(())
    }

    /// Finalizes the open capture and registers it under its name.
    pub fn instance_end(&mut self) -> Result<(), RenderError> {
        if self.capture.is_none() || !self.scopes.is_empty() {
            return Err(RenderError::UnbalancedScope {
                call: "instanceEnd",
            });
        }
        let frame = self.capture.take().unwrap();
        self.transforms = frame.saved_transforms;
        self.attributes = frame.saved_attributes;
        self.scopes = frame.saved_scopes;
        self.groups = frame.saved_groups;
        self.shared
            .instances
            .register(InstanceDefinition::new(frame.name, frame.root));
        Ok(())
    }

    /// References a registered instance at the current transform. Each call
    /// is an independent attachment sharing the definition's content; only
    /// the instantiation transform varies per site.
    pub fn instance(&mut self, name: &str) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld { call: "instance" });
        }
        let definition =
            self.shared
                .instances
                .lookup(name)
                .ok_or_else(|| RenderError::UnknownInstance {
                    name: name.to_string(),
                })?;
        let world = *self.transforms.last().unwrap();
        if self.building_graph() {
            let entry = self.groups.last().unwrap();
            let node = InstanceNode::new(
                self.attributes.last().unwrap().name.clone(),
                entry.inv_world * world,
                definition,
            );
            entry.node.attach(SceneNode::Instance(node));
        } else {
            let mut handler = self.shared.draw.lock().unwrap();
            scene::render_group(definition.root(), world, &mut **handler);
        }
        Ok(())
    }

    // --- Procedurals ---

    /// Expands procedural content.
    ///
    /// The procedural's bound is culled exactly like geometry. In immediate
    /// mode (and inside instance captures) expansion runs inline between an
    /// implicit state save/restore. In the deferred world block expansion is
    /// scheduled on the worker pool: a call made from outside any expansion
    /// blocks until the procedural's entire subtree — however many workers
    /// recursive fan-out used — has expanded and attached; nested calls made
    /// during an expansion schedule their subtree and fence at that
    /// enclosing barrier, so sibling subtrees expand concurrently.
    ///
    /// Siblings attach in program order: each call synchronously reserves
    /// its slot in the parent group before expansion begins. A failed
    /// subtree detaches its slot, leaves siblings untouched, and surfaces
    /// the first error from the barrier call.
    pub fn procedural(&mut self, procedural: Arc<dyn Procedural>) -> Result<(), RenderError> {
        if !self.in_content() {
            return Err(RenderError::NotInWorld { call: "procedural" });
        }
        let world = *self.transforms.last().unwrap();
        if !culling::accepts(
            self.attributes.last().unwrap(),
            &procedural.bound(),
            &world,
        ) {
            return Ok(());
        }

        if self.capture.is_some() || self.mode == RenderMode::Immediate {
            return self.expand_inline(procedural);
        }

        let state = self.attributes.last().unwrap().clone();
        let entry = self.groups.last().unwrap();

        // Reserve the subtree's group now, in program order; expansion fills
        // it from a worker. The group's graph parent never changes, so a
        // failed subtree can always detach itself cleanly.
        let subtree = GroupNode::new(
            Some(state.name.clone()),
            entry.inv_world * world,
            Arc::new(state.clone()),
        );
        let parent = Arc::clone(&entry.node);
        parent.attach(SceneNode::Group(Arc::clone(&subtree)));

        let (expander, is_barrier) = match &self.expander {
            Some(e) => (Arc::clone(e), false),
            None => (Expander::new(), true),
        };

        let shared = Arc::clone(&self.shared);
        let task_expander = Arc::clone(&expander);
        expander.spawn(move || {
            let mut context = Renderer::expansion_context(
                shared,
                Arc::clone(&task_expander),
                state,
                world,
                Arc::clone(&subtree),
            );
            let result = procedural
                .render(&mut context)
                .and_then(|()| context.finish_expansion());
            if let Err(error) = result {
                parent.detach(&SceneNode::Group(subtree));
                task_expander.record_error(error);
            }
        });

        if is_barrier {
            expander.wait()
        } else {
            Ok(())
        }
    }

    /// Synchronous expansion used by the immediate backend and inside
    /// instance captures, wrapped in an implicit attribute scope.
    fn expand_inline(&mut self, procedural: Arc<dyn Procedural>) -> Result<(), RenderError> {
        let scope_depth = self.scopes.len();
        let parent = self.groups.last().map(|e| Arc::clone(&e.node));
        self.attribute_begin()?;
        let opened = self.groups.last().map(|e| Arc::clone(&e.node));

        let result = procedural.render(self);
        let balanced = self.scopes.len() == scope_depth + 1;
        match result {
            Ok(()) if balanced => self.attribute_end(),
            outcome => {
                self.unwind_to(scope_depth);
                // Drop the partially built capture group; siblings are
                // unaffected.
                if let (Some(parent), Some(opened)) = (parent, opened) {
                    if !Arc::ptr_eq(&parent, &opened) {
                        parent.detach(&SceneNode::Group(opened));
                    }
                }
                match outcome {
                    Ok(()) => Err(RenderError::UnbalancedScope { call: "procedural" }),
                    Err(error) => Err(error),
                }
            }
        }
    }

    /// Verifies an expansion left its scopes balanced.
    fn finish_expansion(&self) -> Result<(), RenderError> {
        if self.scopes.is_empty() {
            Ok(())
        } else {
            Err(RenderError::UnbalancedScope { call: "procedural" })
        }
    }

    /// Pops scopes back to `depth`, restoring stack invariants after a
    /// failed inline expansion.
    fn unwind_to(&mut self, depth: usize) {
        while self.scopes.len() > depth {
            match self.scopes.pop().unwrap() {
                Scope::Attribute { opened_group } => {
                    self.attributes.pop();
                    self.transforms.pop();
                    if opened_group {
                        self.groups.pop();
                    }
                }
                Scope::Transform => {
                    self.transforms.pop();
                }
            }
        }
    }

    // --- Introspection & commands ---

    /// Returns the scene built by the deferred backend.
    pub fn scene(&self) -> Result<Scene, RenderError> {
        self.shared
            .root
            .read()
            .unwrap()
            .as_ref()
            .map(|root| Scene::new(Arc::clone(root)))
            .ok_or(RenderError::SceneUnavailable)
    }

    /// Executes a named command.
    ///
    /// `removeObject` detaches the first node matching the `name` parameter
    /// anywhere in the deferred graph and returns `Bool(true)` on success,
    /// `Bool(false)` when nothing matched.
    pub fn command(&mut self, name: &str, parameters: &ValueMap) -> Result<Value, RenderError> {
        match name {
            "removeObject" => {
                let object = parameters
                    .get("name")
                    .and_then(Value::as_str)
                    .ok_or(RenderError::MissingParameter {
                        call: "removeObject",
                        name: "name",
                    })?;
                let scene = self.scene()?;
                Ok(Value::Bool(scene.remove_object(object)))
            }
            _ => Err(RenderError::UnknownCommand {
                name: name.to_string(),
            }),
        }
    }
}
