//! Invoker - Deferred dispatch queue for one lifecycle stage.
//!
//! Two policies:
//! - **Unordered** (pre-load): every queued component is dispatched, no
//!   matter what earlier callbacks did to the tree.
//! - **Ordered one-shot** (on-load, on-enable): dispatched in enqueue order;
//!   after each callback the component's node is re-checked and the rest of
//!   the batch is dropped if it left the hierarchy.
//!
//! Queues live on the activator's task stack inside the [`Scene`], and
//! callbacks receive `&mut Scene`, so dispatch re-reads the queue through an
//! [`InvokerRef`] on every step. A callback may append entries (they are
//! dispatched in the same flush) or cancel pending ones.

use crate::engine::{ComponentId, Scene};
use crate::error::Result;
use crate::types::LifecycleHook;

use super::node_activator::call_hook;

// =============================================================================
// Stage / Policy
// =============================================================================

/// Lifecycle stage served by an invoker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Preload,
    OnLoad,
    OnEnable,
}

/// Dispatch order and early-exit behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokePolicy {
    Unordered,
    OrderedOneShot,
}

impl Stage {
    /// Flush order within one activation task.
    pub const ALL: [Stage; 3] = [Stage::Preload, Stage::OnLoad, Stage::OnEnable];

    pub fn policy(self) -> InvokePolicy {
        match self {
            Stage::Preload => InvokePolicy::Unordered,
            Stage::OnLoad | Stage::OnEnable => InvokePolicy::OrderedOneShot,
        }
    }
}

/// Locates an invoker on the activator's in-flight task stack.
///
/// Only valid during the call that handed it out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvokerRef {
    pub(crate) depth: usize,
    pub(crate) stage: Stage,
}

impl InvokerRef {
    pub fn stage(self) -> Stage {
        self.stage
    }

    /// Queue a component on the referenced invoker.
    pub fn add(self, scene: &mut Scene, comp: ComponentId) {
        scene.enqueue(self, comp);
    }
}

// =============================================================================
// Invoker
// =============================================================================

pub struct Invoker {
    stage: Stage,
    queue: Vec<ComponentId>,
    /// Index of the first entry not yet dispatched.
    next: usize,
}

impl Invoker {
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            queue: Vec::new(),
            next: 0,
        }
    }

    pub fn policy(&self) -> InvokePolicy {
        self.stage.policy()
    }

    pub fn add(&mut self, comp: ComponentId) {
        self.queue.push(comp);
    }

    /// Drop a pending entry. Unordered queues swap-remove.
    pub fn remove(&mut self, comp: ComponentId) -> bool {
        let Some(offset) = self.queue[self.next..].iter().position(|&c| c == comp) else {
            return false;
        };
        let index = self.next + offset;
        match self.policy() {
            InvokePolicy::Unordered => {
                self.queue.swap_remove(index);
            }
            InvokePolicy::OrderedOneShot => {
                self.queue.remove(index);
            }
        }
        true
    }

    /// Entries not yet dispatched.
    pub fn pending(&self) -> &[ComponentId] {
        &self.queue[self.next..]
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Remove pending entries matching `cancel`, keeping order.
    ///
    /// Entries already dispatched (or being dispatched) are kept.
    pub fn cancel_where(&mut self, mut cancel: impl FnMut(ComponentId) -> bool) -> usize {
        let next = self.next;
        let before = self.queue.len();
        let mut index = 0;
        self.queue.retain(|&comp| {
            let keep = index < next || !cancel(comp);
            index += 1;
            keep
        });
        before - self.queue.len()
    }

    pub(crate) fn next_pending(&mut self) -> Option<ComponentId> {
        let comp = self.queue.get(self.next).copied()?;
        self.next += 1;
        Some(comp)
    }

    /// Empty the queue, keeping its allocation.
    pub fn clear(&mut self) {
        self.queue.clear();
        self.next = 0;
    }
}

// =============================================================================
// Dispatch
// =============================================================================

/// Dispatch every queued component on the referenced invoker, then clear it.
pub fn invoke(scene: &mut Scene, at: InvokerRef) -> Result<()> {
    let result = dispatch_all(scene, at);
    if let Some(invoker) = scene.activator.invoker_mut(at) {
        invoker.clear();
    }
    result
}

fn dispatch_all(scene: &mut Scene, at: InvokerRef) -> Result<()> {
    let policy = at.stage().policy();
    loop {
        let next = scene
            .activator
            .invoker_mut(at)
            .and_then(|invoker| invoker.next_pending());
        let Some(comp) = next else {
            break;
        };

        dispatch(scene, comp, at.stage())?;

        if policy == InvokePolicy::OrderedOneShot {
            // Deactivated by this callback or a sibling's
            let deactivated = scene
                .node_of(comp)
                .is_some_and(|node| !scene.is_active_in_hierarchy(node));
            if deactivated {
                tracing::trace!(
                    component = %comp,
                    stage = ?at.stage(),
                    "batch stopped after deactivation"
                );
                break;
            }
        }
    }
    Ok(())
}

fn dispatch(scene: &mut Scene, comp: ComponentId, stage: Stage) -> Result<()> {
    match stage {
        Stage::Preload => call_hook(scene, comp, LifecycleHook::Preload),
        Stage::OnLoad => call_hook(scene, comp, LifecycleHook::OnLoad),
        Stage::OnEnable => {
            let scheduler = scene.scheduler();
            scheduler.invoke_on_enable(scene, comp)
        }
    }
}
