//! Node Activator - Activation and deactivation walks.
//!
//! Activation is deferred: the recursive walk only marks nodes active and
//! queues callbacks into the task on top of the stack. Once the whole
//! subtree is walked the task flushes pre-load, then on-load, then
//! on-enable, so every pre-load in the subtree runs before any on-load and
//! every on-load before any on-enable.
//!
//! Deactivation is eager: on-disable fires during the walk. Afterwards every
//! task still in flight drops its pending entries for the deactivated
//! subtree.
//!
//! ```text
//! activate_node(root, true)
//!   push task ─► walk subtree (queue)
//!             ─► flush preload ─► flush on_load ─► flush on_enable ─► pop task
//!
//! activate_node(root, false)
//!   walk subtree (disable now) ─► cancel pending entries in every in-flight task
//! ```

use crate::config::FaultPolicy;
use crate::engine::{ComponentId, NodeId, Scene};
use crate::error::{ActivatorError, Result};
use crate::types::{Hooks, LifecycleHook, ObjFlags};

use super::invoker::{self, Invoker, InvokerRef, Stage};
use super::task::{ActivateTask, TaskPool};

// =============================================================================
// Activator State
// =============================================================================

/// Handle to the task an activation walk writes into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskRef {
    depth: usize,
}

impl TaskRef {
    pub fn invoker(self, stage: Stage) -> InvokerRef {
        InvokerRef {
            depth: self.depth,
            stage,
        }
    }
}

/// Stack of in-flight activation tasks plus the pool they come from.
pub struct NodeActivator {
    stack: Vec<ActivateTask>,
    pool: TaskPool,
}

impl NodeActivator {
    pub fn new(pool_capacity: usize) -> Self {
        Self {
            stack: Vec::new(),
            pool: TaskPool::new(pool_capacity),
        }
    }

    /// Empty the stack and the pool.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.pool = TaskPool::new(self.pool.capacity());
    }

    /// Number of top-level activations currently in flight.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn is_activating(&self) -> bool {
        !self.stack.is_empty()
    }

    pub fn pooled_tasks(&self) -> usize {
        self.pool.len()
    }

    pub fn pool_capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Components still queued in the in-flight task at `depth`.
    pub fn pending(&self, depth: usize, stage: Stage) -> &[ComponentId] {
        self.stack
            .get(depth)
            .map(|task| task.invoker(stage).pending())
            .unwrap_or(&[])
    }

    pub(crate) fn invoker_mut(&mut self, at: InvokerRef) -> Option<&mut Invoker> {
        self.stack
            .get_mut(at.depth)
            .map(|task| task.invoker_mut(at.stage))
    }

    /// Drop every pending entry for `comp` from the in-flight tasks.
    pub(crate) fn forget(&mut self, comp: ComponentId) -> usize {
        let mut removed = 0;
        for task in self.stack.iter_mut() {
            for stage in Stage::ALL {
                let invoker = task.invoker_mut(stage);
                while invoker.remove(comp) {
                    removed += 1;
                }
            }
        }
        removed
    }

    fn push_task(&mut self) -> TaskRef {
        let task = self.pool.get();
        self.stack.push(task);
        TaskRef {
            depth: self.stack.len() - 1,
        }
    }

    fn pop_task(&mut self, task: TaskRef) {
        debug_assert_eq!(self.stack.len(), task.depth + 1, "activation stack unbalanced");
        if let Some(task) = self.stack.pop() {
            self.pool.put(task);
        }
    }
}

// =============================================================================
// Hook Dispatch
// =============================================================================

/// Run one lifecycle hook if the component exposes it.
///
/// Faults follow the scene's [`FaultPolicy`]: contained faults are logged
/// with the hook name and recorded, propagated faults abort the caller.
pub(crate) fn call_hook(scene: &mut Scene, comp: ComponentId, hook: LifecycleHook) -> Result<()> {
    let Some(behavior) = scene.behavior(comp) else {
        return Ok(());
    };
    if !behavior.hooks().contains(hook.capability()) {
        return Ok(());
    }

    let outcome = match hook {
        LifecycleHook::Preload => behavior.preload(scene, comp),
        LifecycleHook::OnLoad => behavior.on_load(scene, comp),
        LifecycleHook::OnEnable => behavior.on_enable(scene, comp),
        LifecycleHook::OnDisable => behavior.on_disable(scene, comp),
        LifecycleHook::OnDestroy => behavior.on_destroy(scene, comp),
        LifecycleHook::ResetInEditor => behavior.reset_in_editor(scene, comp),
        LifecycleHook::OnFocusInEditor => behavior.on_focus_in_editor(scene, comp),
        LifecycleHook::OnLostFocusInEditor => behavior.on_lost_focus_in_editor(scene, comp),
    };

    let Err(source) = outcome else {
        return Ok(());
    };
    let error = ActivatorError::HookFailed {
        hook: hook.name(),
        component: comp,
        source,
    };
    match scene.config().fault_policy {
        FaultPolicy::Contain => {
            scene.report(error);
            Ok(())
        }
        FaultPolicy::Propagate => Err(error),
    }
}

// =============================================================================
// Node Activation
// =============================================================================

/// Activate or deactivate `node` and its subtree.
///
/// Does not consult the local flags; [`Scene::activate_node`] and
/// [`Scene::set_active`] decide when a walk is due.
///
/// Emits `active-in-hierarchy-changed` on `node` once all work for the call
/// is done. Returns `Err` only for hook faults under
/// [`FaultPolicy::Propagate`]; the task stack is rebalanced before returning.
pub(crate) fn activate_node(scene: &mut Scene, node: NodeId, active: bool) -> Result<()> {
    if active {
        let task = scene.activator.push_task();
        tracing::debug!(node = %node, depth = task.depth, "activation started");

        let result = activate_and_flush(scene, node, task);

        scene.activator.pop_task(task);
        result?;
    } else {
        if scene.node_flags(node).contains(ObjFlags::DEACTIVATING) {
            report_already_deactivating(scene, node);
            return Ok(());
        }
        tracing::debug!(node = %node, "deactivation started");

        let result = deactivate_node_recursively(scene, node);
        cancel_inactive(scene, node);
        result?;
    }

    scene.emit_active_in_hierarchy_changed(node);
    Ok(())
}

fn activate_and_flush(scene: &mut Scene, node: NodeId, task: TaskRef) -> Result<()> {
    activate_node_recursively(scene, node, task)?;
    for stage in Stage::ALL {
        invoker::invoke(scene, task.invoker(stage))?;
    }
    Ok(())
}

fn activate_node_recursively(scene: &mut Scene, node: NodeId, task: TaskRef) -> Result<()> {
    let Some(target) = scene.node(node) else {
        return Ok(());
    };
    if target.is_deactivating() {
        // Activating inside a deactivation would loop forever
        let error = ActivatorError::ReentrantActivation {
            node,
            name: target.name().to_string(),
        };
        scene.report(error);
        return Ok(());
    }

    scene.set_active_in_hierarchy(node, true);

    // Components added from here on were activated when added
    let mut origin_count = component_slots(scene, node);
    let mut index = 0;
    while index < origin_count {
        let Some(slot) = component_slot(scene, node, index) else {
            break;
        };
        match slot {
            Some(comp) if scene.node_of(comp) == Some(node) => {
                activate_comp(scene, comp, Some(task))?;
                index += 1;
            }
            _ => {
                component_corrupted(scene, node, slot, index);
                origin_count -= 1;
            }
        }
    }

    let child_count = scene.node(node).map_or(0, |n| n.children.len());
    for index in 0..child_count {
        let Some(child) = child_at(scene, node, index) else {
            break;
        };
        if scene.is_active(child) {
            activate_node_recursively(scene, child, task)?;
        }
    }

    post_activated(scene, node, true);
    Ok(())
}

// =============================================================================
// Node Deactivation
// =============================================================================

fn deactivate_node_recursively(scene: &mut Scene, node: NodeId) -> Result<()> {
    if !scene.contains_node(node) {
        return Ok(());
    }
    if scene.node_flags(node).contains(ObjFlags::DEACTIVATING) {
        report_already_deactivating(scene, node);
        return Ok(());
    }

    scene.set_node_flag(node, ObjFlags::DEACTIVATING, true);
    scene.set_active_in_hierarchy(node, false);

    let result = deactivate_contents(scene, node);
    scene.set_node_flag(node, ObjFlags::DEACTIVATING, false);
    result
}

/// Returns early when user code reactivated `node` from the root; the node
/// owns its consistency from then on.
fn deactivate_contents(scene: &mut Scene, node: NodeId) -> Result<()> {
    let origin_count = component_slots(scene, node);
    for index in 0..origin_count {
        let Some(Some(comp)) = component_slot(scene, node, index) else {
            continue;
        };
        if !scene.is_enabled(comp) {
            continue;
        }

        let scheduler = scene.scheduler();
        scheduler.disable_comp(scene, comp)?;

        if scene.is_active_in_hierarchy(node) {
            tracing::debug!(node = %node, "reactivated during deactivation");
            return Ok(());
        }
    }

    let child_count = scene.node(node).map_or(0, |n| n.children.len());
    for index in 0..child_count {
        let Some(child) = child_at(scene, node, index) else {
            break;
        };
        if !scene.is_active_in_hierarchy(child) {
            continue;
        }

        deactivate_node_recursively(scene, child)?;

        if scene.is_active_in_hierarchy(node) {
            tracing::debug!(node = %node, "reactivated during deactivation");
            return Ok(());
        }
    }

    post_activated(scene, node, false);
    Ok(())
}

/// Drop queued entries of the deactivated subtree from every in-flight task.
fn cancel_inactive(scene: &mut Scene, root: NodeId) {
    let Scene {
        activator,
        nodes,
        components,
        ..
    } = scene;

    let mut cancelled = 0;
    for task in activator.stack.iter_mut() {
        cancelled += task.cancel_where(|comp| {
            let Some(component) = components.get(comp.raw()) else {
                return true;
            };
            let active = nodes
                .get(component.node.raw())
                .is_some_and(|n| n.active_in_hierarchy);
            !active && crate::engine::is_within(nodes, component.node, root)
        });
    }
    if cancelled > 0 {
        tracing::debug!(node = %root, cancelled, "cancelled pending callbacks");
    }
}

fn report_already_deactivating(scene: &mut Scene, node: NodeId) {
    let name = scene.name(node).unwrap_or_default().to_string();
    scene.report(ActivatorError::AlreadyDeactivating { node, name });
}

fn post_activated(scene: &mut Scene, node: NodeId, active: bool) {
    if let Some(hook) = scene.post_activated_hook(node) {
        hook(scene, node, active);
    }
}

// =============================================================================
// Component Activation
// =============================================================================

/// Load (if not yet started) and enable a component.
///
/// With a task, pre-load/on-load/on-enable are queued into its invokers;
/// without one they run immediately.
pub fn activate_comp(scene: &mut Scene, comp: ComponentId, task: Option<TaskRef>) -> Result<()> {
    let Some(component) = scene.component(comp) else {
        return Ok(());
    };
    let node = component.node();
    let flags = component.flags();
    let behavior = component.behavior();
    let hooks = behavior.hooks();
    let mode = scene.mode();

    let may_load = mode.is_playing() || behavior.execute_in_edit_mode();
    if !flags.contains(ObjFlags::ON_LOAD_STARTED) && may_load {
        scene.set_component_flag(comp, ObjFlags::ON_LOAD_STARTED, true);

        if hooks.contains(Hooks::PRELOAD) {
            match task {
                Some(task) => scene.enqueue(task.invoker(Stage::Preload), comp),
                None => call_hook(scene, comp, LifecycleHook::Preload)?,
            }
        }
        if hooks.contains(Hooks::ON_LOAD) {
            match task {
                Some(task) => scene.enqueue(task.invoker(Stage::OnLoad), comp),
                None => call_hook(scene, comp, LifecycleHook::OnLoad)?,
            }
        }

        scene.set_component_flag(comp, ObjFlags::ON_LOAD_CALLED, true);

        if hooks.contains(Hooks::ON_LOAD) && !mode.is_playing() {
            let focused = scene.editor_focus() == Some(node);
            if focused && hooks.contains(Hooks::ON_FOCUS_IN_EDITOR) {
                call_hook(scene, comp, LifecycleHook::OnFocusInEditor)?;
            } else if hooks.contains(Hooks::ON_LOST_FOCUS_IN_EDITOR) {
                call_hook(scene, comp, LifecycleHook::OnLostFocusInEditor)?;
            }
        }
    }

    if scene.is_enabled(comp) {
        if !scene.is_active_in_hierarchy(node) {
            // Deactivated while loading
            return Ok(());
        }
        let scheduler = scene.scheduler();
        scheduler.enable_comp(scene, comp, task.map(|task| task.invoker(Stage::OnEnable)))?;
    }
    Ok(())
}

// =============================================================================
// Destroy / Reset
// =============================================================================

/// Disable, then run on-destroy if the component finished loading.
pub fn destroy_comp(scene: &mut Scene, comp: ComponentId) -> Result<()> {
    // on-disable always precedes on-destroy
    let scheduler = scene.scheduler();
    scheduler.disable_comp(scene, comp)?;

    let Some(component) = scene.component(comp) else {
        return Ok(());
    };
    let loaded = component.flags().contains(ObjFlags::ON_LOAD_CALLED);
    let behavior = component.behavior();
    let may_run = scene.mode().is_playing() || behavior.execute_in_edit_mode();

    if loaded && may_run && behavior.hooks().contains(Hooks::ON_DESTROY) {
        call_hook(scene, comp, LifecycleHook::OnDestroy)?;
    }
    Ok(())
}

/// Editor-only property reset. A no-op outside the editor.
pub fn reset_comp(scene: &mut Scene, comp: ComponentId) -> Result<()> {
    if !scene.mode().is_editor() {
        tracing::trace!(component = %comp, "reset ignored outside the editor");
        return Ok(());
    }
    call_hook(scene, comp, LifecycleHook::ResetInEditor)
}

// =============================================================================
// Corruption
// =============================================================================

fn component_slots(scene: &Scene, node: NodeId) -> usize {
    scene.node(node).map_or(0, |n| n.components.len())
}

fn component_slot(scene: &Scene, node: NodeId, index: usize) -> Option<Option<ComponentId>> {
    scene.node(node).and_then(|n| n.components.get(index).copied())
}

fn child_at(scene: &Scene, node: NodeId, index: usize) -> Option<NodeId> {
    scene.node(node).and_then(|n| n.children.get(index).copied())
}

/// Report a bad slot and splice it out of the node's sequence.
fn component_corrupted(scene: &mut Scene, node: NodeId, slot: Option<ComponentId>, index: usize) {
    let name = scene.name(node).unwrap_or_default().to_string();
    tracing::error!(node = %node, index, value = ?slot, "corrupted component value");
    scene.report(ActivatorError::CorruptedComponent { node, name, index });

    let removed = match slot {
        Some(comp) => scene.remove_component(node, comp),
        None => false,
    };
    if !removed {
        if let Some(target) = scene.nodes.get_mut(node.raw()) {
            if index < target.components.len() {
                target.components.remove(index);
            }
        }
    }
}
