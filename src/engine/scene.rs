//! Scene - Owner of the node tree, components and activator state.
//!
//! Everything the activator touches lives here, so lifecycle hooks receive
//! `&mut Scene` and can re-enter any operation (toggle nodes, add or destroy
//! components) while a walk is in progress.
//!
//! A root node (no parent) is launched by [`Scene::set_active`] or
//! [`Scene::activate_node`]; until then it sits outside the live hierarchy
//! even if its local flag is set. Below a root, [`Scene::set_active`] drives
//! activation whenever the parent is active in hierarchy.
//!
//! # Example
//!
//! ```ignore
//! let mut scene = Scene::new(ActivatorConfig::default());
//! let root = scene.add_node(None, "root", true)?;
//! let player = scene.add_node(Some(root), "player", true)?;
//! scene.add_component(player, Rc::new(Spinner))?;
//!
//! scene.activate_node(root, true)?;   // pre-load, on-load, on-enable
//! scene.set_active(player, false)?;   // on-disable
//! ```

use std::collections::HashMap;
use std::rc::Rc;

use spark_signals::{signal, ReactiveSet, Signal};

use super::component::{Behavior, Component};
use super::node::{Node, PostActivatedHook};
use super::registry::{ComponentId, NodeId, Registry};
use crate::activator::{self, ComponentScheduler, DefaultScheduler, InvokerRef, NodeActivator};
use crate::config::{ActivatorConfig, ExecutionMode};
use crate::error::{ActivatorError, Result};
use crate::types::ObjFlags;

/// Observer of `active-in-hierarchy-changed` on one node.
pub type HierarchyListener = Rc<dyn Fn(&mut Scene, NodeId)>;

/// Handle returned by listener registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct Scene {
    pub(crate) nodes: Registry<Node>,
    pub(crate) components: Registry<Component>,
    pub(crate) activator: NodeActivator,
    scheduler: Rc<dyn ComponentScheduler>,
    config: ActivatorConfig,
    listeners: HashMap<NodeId, Vec<(ListenerId, HierarchyListener)>>,
    next_listener: u64,
    incidents: Vec<ActivatorError>,
    editor_focus: Option<NodeId>,
    /// Nodes currently active in hierarchy. Deriveds iterating this set
    /// react when nodes activate or deactivate.
    active_nodes: ReactiveSet<NodeId>,
    /// Bumped once per top-level activation call.
    hierarchy_revision: Signal<u64>,
}

impl Scene {
    pub fn new(config: ActivatorConfig) -> Self {
        Self::with_scheduler(config, Rc::new(DefaultScheduler::new()))
    }

    pub fn with_scheduler(config: ActivatorConfig, scheduler: Rc<dyn ComponentScheduler>) -> Self {
        Self {
            nodes: Registry::new(),
            components: Registry::new(),
            activator: NodeActivator::new(config.task_pool_capacity),
            scheduler,
            config,
            listeners: HashMap::new(),
            next_listener: 0,
            incidents: Vec::new(),
            editor_focus: None,
            active_nodes: ReactiveSet::new(),
            hierarchy_revision: signal(0u64),
        }
    }

    pub fn config(&self) -> &ActivatorConfig {
        &self.config
    }

    pub fn mode(&self) -> ExecutionMode {
        self.config.mode
    }

    pub fn scheduler(&self) -> Rc<dyn ComponentScheduler> {
        self.scheduler.clone()
    }

    pub fn activator(&self) -> &NodeActivator {
        &self.activator
    }

    /// Drop all pooled tasks and the in-flight stack.
    ///
    /// Refused while an activation is in progress.
    pub fn reset_activator(&mut self) -> bool {
        if self.activator.is_activating() {
            tracing::warn!(
                depth = self.activator.depth(),
                "refusing to reset activator during activation"
            );
            return false;
        }
        self.activator.reset();
        true
    }

    // =========================================================================
    // Tree Construction
    // =========================================================================

    /// Create a node. With a parent that is active in hierarchy, an active
    /// node is activated immediately.
    pub fn add_node(
        &mut self,
        parent: Option<NodeId>,
        name: impl Into<String>,
        active: bool,
    ) -> Result<NodeId> {
        if let Some(parent) = parent {
            if !self.contains_node(parent) {
                return Err(ActivatorError::MissingNode(parent));
            }
        }

        let node = NodeId::from_raw(self.nodes.insert(Node::new(name, parent, active)));
        let Some(parent) = parent else {
            return Ok(node);
        };

        if let Some(parent_node) = self.nodes.get_mut(parent.raw()) {
            parent_node.children.push(node);
        }
        if active && self.is_active_in_hierarchy(parent) {
            activator::activate_node(self, node, true)?;
        }
        Ok(node)
    }

    /// Unlink a node from its parent, deactivating it if needed.
    pub fn detach_node(&mut self, node: NodeId) -> Result<()> {
        let Some(parent) = self.nodes.get_mut(node.raw()).and_then(|n| n.parent.take()) else {
            return Ok(());
        };
        if let Some(parent_node) = self.nodes.get_mut(parent.raw()) {
            parent_node.children.retain(|&child| child != node);
        }
        if self.is_active_in_hierarchy(node) {
            activator::activate_node(self, node, false)?;
        }
        Ok(())
    }

    /// Deactivate, destroy every component and descendant, and free the node.
    pub fn destroy_node(&mut self, node: NodeId) -> Result<()> {
        if !self.contains_node(node) {
            return Ok(());
        }
        self.detach_node(node)?;
        if self.is_active_in_hierarchy(node) {
            activator::activate_node(self, node, false)?;
        }
        self.destroy_subtree(node)
    }

    fn destroy_subtree(&mut self, node: NodeId) -> Result<()> {
        for child in self.children(node) {
            self.destroy_subtree(child)?;
        }
        for comp in self.components(node) {
            self.destroy_component(comp)?;
        }
        self.listeners.remove(&node);
        self.active_nodes.remove(&node);
        if self.editor_focus == Some(node) {
            self.editor_focus = None;
        }
        self.nodes.remove(node.raw());
        Ok(())
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Attach an enabled component. If the node is already active in
    /// hierarchy the component is activated right away, outside any batch.
    pub fn add_component(
        &mut self,
        node: NodeId,
        behavior: Rc<dyn Behavior>,
    ) -> Result<ComponentId> {
        if !self.contains_node(node) {
            return Err(ActivatorError::MissingNode(node));
        }

        let comp = ComponentId::from_raw(self.components.insert(Component::new(node, behavior)));
        if let Some(owner) = self.nodes.get_mut(node.raw()) {
            owner.components.push(Some(comp));
        }

        if self.is_active_in_hierarchy(node) {
            activator::activate_comp(self, comp, None)?;
        }
        Ok(comp)
    }

    /// Remove the first slot holding `comp` from the node's sequence.
    ///
    /// Detach only: no lifecycle hook runs and the component record stays.
    /// Callbacks still queued for a component of this node are dropped.
    pub fn remove_component(&mut self, node: NodeId, comp: ComponentId) -> bool {
        let owned = self.node_of(comp) == Some(node);
        let Some(owner) = self.nodes.get_mut(node.raw()) else {
            return false;
        };
        let Some(index) = owner.components.iter().position(|slot| *slot == Some(comp)) else {
            return false;
        };
        owner.components.remove(index);

        if owned {
            let dropped = self.activator.forget(comp);
            if dropped > 0 {
                tracing::trace!(component = %comp, dropped, "dropped queued callbacks");
            }
        }
        true
    }

    /// Run on-disable/on-destroy, detach the component and free it.
    pub fn destroy_component(&mut self, comp: ComponentId) -> Result<()> {
        let Some(node) = self.node_of(comp) else {
            return Ok(());
        };
        let result = activator::destroy_comp(self, comp);
        self.remove_component(node, comp);
        self.components.remove(comp.raw());
        result
    }

    /// Editor reset of a component's properties.
    pub fn reset_component(&mut self, comp: ComponentId) -> Result<()> {
        activator::reset_comp(self, comp)
    }

    // =========================================================================
    // Activity
    // =========================================================================

    /// Set a node's local active flag.
    ///
    /// Below a root, activation runs when the parent is active in hierarchy.
    /// A root is activated or deactivated whenever its hierarchy state
    /// differs from `active`, so this also launches a root added active.
    pub fn set_active(&mut self, node: NodeId, active: bool) -> Result<()> {
        let Some(target) = self.nodes.get_mut(node.raw()) else {
            return Ok(());
        };
        let parent = target.parent;
        let settled = match parent {
            Some(_) => target.active == active,
            None => target.active == active && target.active_in_hierarchy == active,
        };
        if settled {
            return Ok(());
        }
        target.active = active;

        match parent {
            Some(parent) if self.is_active_in_hierarchy(parent) => {
                activator::activate_node(self, node, active)
            }
            Some(_) => Ok(()),
            None => activator::activate_node(self, node, active),
        }
    }

    /// Set a component's local enabled flag, enabling or disabling it
    /// through the scheduler when its node is active in hierarchy.
    pub fn set_enabled(&mut self, comp: ComponentId, enabled: bool) -> Result<()> {
        let Some(target) = self.components.get_mut(comp.raw()) else {
            return Ok(());
        };
        if target.enabled == enabled {
            return Ok(());
        }
        target.enabled = enabled;

        let node = target.node;
        if self.is_active_in_hierarchy(node) {
            let scheduler = self.scheduler();
            if enabled {
                scheduler.enable_comp(self, comp, None)?;
            } else {
                scheduler.disable_comp(self, comp)?;
            }
        }
        Ok(())
    }

    /// Run an activation or deactivation walk over `node`'s subtree.
    ///
    /// On a root this also sets the local flag. Below a root the call must
    /// agree with the local flags (node active and parent active in
    /// hierarchy for `true`, the opposite for `false`); otherwise it is
    /// reported as [`ActivatorError::HierarchyMismatch`] and nothing changes.
    /// Activating an already active subtree walks it again, picking up
    /// components and children that the last walk did not reach.
    pub fn activate_node(&mut self, node: NodeId, active: bool) -> Result<()> {
        let Some(target) = self.nodes.get_mut(node.raw()) else {
            return Ok(());
        };

        let parent = target.parent;
        match parent {
            None => {
                // A deactivating root keeps its flag; the walk reports the call
                if !target.is_deactivating() {
                    target.active = active;
                }
            }
            Some(parent) => {
                let effective = target.active && self.is_active_in_hierarchy(parent);
                if effective != active {
                    let name = self.name(node).unwrap_or_default().to_string();
                    self.report(ActivatorError::HierarchyMismatch { node, name, active });
                    return Ok(());
                }
            }
        }
        activator::activate_node(self, node, active)
    }

    pub fn set_post_activated(&mut self, node: NodeId, hook: Option<PostActivatedHook>) {
        if let Some(target) = self.nodes.get_mut(node.raw()) {
            target.post_activated = hook;
        }
    }

    pub(crate) fn post_activated_hook(&self, node: NodeId) -> Option<PostActivatedHook> {
        self.nodes.get(node.raw()).and_then(|n| n.post_activated.clone())
    }

    pub(crate) fn set_active_in_hierarchy(&mut self, node: NodeId, active: bool) {
        let Some(target) = self.nodes.get_mut(node.raw()) else {
            return;
        };
        target.active_in_hierarchy = active;
        if active {
            self.active_nodes.insert(node);
        } else {
            self.active_nodes.remove(&node);
        }
    }

    pub(crate) fn set_node_flag(&mut self, node: NodeId, flag: ObjFlags, on: bool) {
        if let Some(target) = self.nodes.get_mut(node.raw()) {
            target.flags.set(flag, on);
        }
    }

    pub(crate) fn set_component_flag(&mut self, comp: ComponentId, flag: ObjFlags, on: bool) {
        if let Some(target) = self.components.get_mut(comp.raw()) {
            target.flags.set(flag, on);
        }
    }

    pub(crate) fn enqueue(&mut self, at: InvokerRef, comp: ComponentId) {
        if let Some(invoker) = self.activator.invoker_mut(at) {
            invoker.add(comp);
        }
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Listen for `active-in-hierarchy-changed` on `node`.
    pub fn on_active_in_hierarchy_changed(
        &mut self,
        node: NodeId,
        listener: impl Fn(&mut Scene, NodeId) + 'static,
    ) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners
            .entry(node)
            .or_default()
            .push((id, Rc::new(listener)));
        id
    }

    pub fn off_active_in_hierarchy_changed(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(list) = self.listeners.get_mut(&node) else {
            return false;
        };
        let before = list.len();
        list.retain(|(listener_id, _)| *listener_id != id);
        let removed = list.len() != before;
        if list.is_empty() {
            self.listeners.remove(&node);
        }
        removed
    }

    pub(crate) fn emit_active_in_hierarchy_changed(&mut self, node: NodeId) {
        self.hierarchy_revision.set(self.hierarchy_revision.get() + 1);

        // Listeners may register or remove listeners while running
        let listeners: Vec<HierarchyListener> = match self.listeners.get(&node) {
            Some(list) => list.iter().map(|(_, listener)| listener.clone()).collect(),
            None => return,
        };
        for listener in listeners {
            listener(self, node);
        }
    }

    /// Number of top-level activation calls completed so far.
    pub fn hierarchy_revision(&self) -> u64 {
        self.hierarchy_revision.get()
    }

    /// Nodes currently active in hierarchy.
    ///
    /// Note: This creates a reactive dependency when called from a derived/effect.
    pub fn active_nodes(&self) -> Vec<NodeId> {
        self.active_nodes.iter().cloned().collect()
    }

    // =========================================================================
    // Incidents
    // =========================================================================

    /// Log a contained error and keep it for inspection.
    pub(crate) fn report(&mut self, error: ActivatorError) {
        tracing::error!(
            error = %error,
            structural = error.is_structural(),
            "activation incident"
        );
        self.incidents.push(error);
    }

    pub fn incidents(&self) -> &[ActivatorError] {
        &self.incidents
    }

    pub fn take_incidents(&mut self) -> Vec<ActivatorError> {
        std::mem::take(&mut self.incidents)
    }

    // =========================================================================
    // Editor Focus
    // =========================================================================

    pub fn set_editor_focus(&mut self, node: Option<NodeId>) {
        self.editor_focus = node;
    }

    pub fn editor_focus(&self) -> Option<NodeId> {
        self.editor_focus
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn node(&self, node: NodeId) -> Option<&Node> {
        self.nodes.get(node.raw())
    }

    pub fn component(&self, comp: ComponentId) -> Option<&Component> {
        self.components.get(comp.raw())
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(node.raw())
    }

    pub fn contains_component(&self, comp: ComponentId) -> bool {
        self.components.contains(comp.raw())
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn name(&self, node: NodeId) -> Option<&str> {
        self.node(node).map(Node::name)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).and_then(Node::parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.node(node)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    /// Well-formed components attached to `node`, in order.
    pub fn components(&self, node: NodeId) -> Vec<ComponentId> {
        self.node(node)
            .map(|n| {
                n.components
                    .iter()
                    .flatten()
                    .copied()
                    .filter(|&comp| self.node_of(comp) == Some(node))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_active(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(Node::is_active)
    }

    pub fn is_active_in_hierarchy(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(Node::is_active_in_hierarchy)
    }

    pub fn node_flags(&self, node: NodeId) -> ObjFlags {
        self.node(node).map(Node::flags).unwrap_or_default()
    }

    pub fn node_of(&self, comp: ComponentId) -> Option<NodeId> {
        self.component(comp).map(Component::node)
    }

    pub fn is_enabled(&self, comp: ComponentId) -> bool {
        self.component(comp).is_some_and(Component::is_enabled)
    }

    pub fn component_flags(&self, comp: ComponentId) -> ObjFlags {
        self.component(comp).map(Component::flags).unwrap_or_default()
    }

    pub fn behavior(&self, comp: ComponentId) -> Option<Rc<dyn Behavior>> {
        self.component(comp).map(Component::behavior)
    }

    /// True if `node` is `root` or one of its descendants.
    pub fn is_within(&self, node: NodeId, root: NodeId) -> bool {
        is_within(&self.nodes, node, root)
    }
}

pub(crate) fn is_within(nodes: &Registry<Node>, node: NodeId, root: NodeId) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == root {
            return true;
        }
        current = nodes.get(id.raw()).and_then(|n| n.parent);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Hooks;

    struct Inert;

    impl Behavior for Inert {
        fn hooks(&self) -> Hooks {
            Hooks::NONE
        }
    }

    #[test]
    fn test_add_nodes() {
        let mut scene = Scene::new(ActivatorConfig::default());

        let root = scene.add_node(None, "root", true).unwrap();
        let a = scene.add_node(Some(root), "a", true).unwrap();
        let b = scene.add_node(Some(root), "b", false).unwrap();

        assert_eq!(scene.children(root), vec![a, b]);
        assert_eq!(scene.parent(a), Some(root));
        assert_eq!(scene.name(b), Some("b"));
        assert!(!scene.is_active_in_hierarchy(a));
        assert_eq!(scene.node_count(), 3);
    }

    #[test]
    fn test_missing_parent() {
        let mut scene = Scene::new(ActivatorConfig::default());
        let root = scene.add_node(None, "root", true).unwrap();
        scene.destroy_node(root).unwrap();

        let err = scene.add_node(Some(root), "orphan", true).unwrap_err();
        assert!(matches!(err, ActivatorError::MissingNode(id) if id == root));
        assert!(scene.add_component(root, Rc::new(Inert)).is_err());
    }

    #[test]
    fn test_is_within() {
        let mut scene = Scene::new(ActivatorConfig::default());
        let root = scene.add_node(None, "root", true).unwrap();
        let a = scene.add_node(Some(root), "a", true).unwrap();
        let leaf = scene.add_node(Some(a), "leaf", true).unwrap();
        let b = scene.add_node(Some(root), "b", true).unwrap();

        assert!(scene.is_within(leaf, root));
        assert!(scene.is_within(leaf, a));
        assert!(scene.is_within(a, a));
        assert!(!scene.is_within(leaf, b));
        assert!(!scene.is_within(root, a));
    }

    #[test]
    fn test_remove_component_detaches_only() {
        let mut scene = Scene::new(ActivatorConfig::default());
        let root = scene.add_node(None, "root", true).unwrap();
        let comp = scene.add_component(root, Rc::new(Inert)).unwrap();

        assert!(scene.remove_component(root, comp));
        assert!(!scene.remove_component(root, comp));
        assert!(scene.components(root).is_empty());
        assert!(scene.contains_component(comp));
    }

    #[test]
    fn test_destroy_node_frees_subtree() {
        let mut scene = Scene::new(ActivatorConfig::default());
        let root = scene.add_node(None, "root", true).unwrap();
        let a = scene.add_node(Some(root), "a", true).unwrap();
        let leaf = scene.add_node(Some(a), "leaf", true).unwrap();
        let comp = scene.add_component(leaf, Rc::new(Inert)).unwrap();

        scene.destroy_node(a).unwrap();

        assert!(!scene.contains_node(a));
        assert!(!scene.contains_node(leaf));
        assert!(!scene.contains_component(comp));
        assert_eq!(scene.children(root), Vec::<NodeId>::new());
        assert_eq!(scene.node_count(), 1);
    }

    #[test]
    fn test_listener_registration() {
        let mut scene = Scene::new(ActivatorConfig::default());
        let root = scene.add_node(None, "root", true).unwrap();

        let id = scene.on_active_in_hierarchy_changed(root, |_, _| {});
        assert!(scene.off_active_in_hierarchy_changed(root, id));
        assert!(!scene.off_active_in_hierarchy_changed(root, id));
    }

    #[test]
    fn test_reset_activator_when_idle() {
        let mut scene = Scene::new(ActivatorConfig::default());
        assert!(scene.reset_activator());
        assert_eq!(scene.activator().depth(), 0);
    }
}
