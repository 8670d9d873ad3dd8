//! Component - Behavior attached to a node.
//!
//! Components are owned by exactly one node. User logic lives behind the
//! [`Behavior`] trait; the component record only keeps the flags the
//! activator and scheduler need.
//!
//! # Example
//!
//! ```ignore
//! use spark_activator::{Behavior, ComponentId, Hooks, HookResult, Scene};
//!
//! struct Spinner;
//!
//! impl Behavior for Spinner {
//!     fn hooks(&self) -> Hooks {
//!         Hooks::ON_LOAD | Hooks::ON_ENABLE
//!     }
//!
//!     fn on_load(&self, scene: &mut Scene, comp: ComponentId) -> HookResult {
//!         // Hooks may re-enter the scene, e.g. to toggle nodes.
//!         Ok(())
//!     }
//! }
//! ```

use std::rc::Rc;

use super::registry::{ComponentId, NodeId};
use super::scene::Scene;
use crate::error::HookResult;
use crate::types::{Hooks, ObjFlags};

// =============================================================================
// Behavior
// =============================================================================

/// User-defined component logic.
///
/// Every hook has a no-op default. The activator only calls hooks listed in
/// [`hooks`](Behavior::hooks), so a behavior must declare what it implements.
/// Hooks take `&self`; keep mutable state in `Cell`/`RefCell`.
pub trait Behavior {
    /// Capability set checked before each dispatch.
    fn hooks(&self) -> Hooks;

    /// Whether the behavior loads while the editor is not playing.
    fn execute_in_edit_mode(&self) -> bool {
        false
    }

    fn preload(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_load(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_enable(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_disable(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_destroy(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn reset_in_editor(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_focus_in_editor(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }

    fn on_lost_focus_in_editor(&self, _scene: &mut Scene, _comp: ComponentId) -> HookResult {
        Ok(())
    }
}

// =============================================================================
// Component Record
// =============================================================================

pub struct Component {
    pub(crate) node: NodeId,
    pub(crate) enabled: bool,
    pub(crate) flags: ObjFlags,
    pub(crate) behavior: Rc<dyn Behavior>,
}

impl Component {
    pub(crate) fn new(node: NodeId, behavior: Rc<dyn Behavior>) -> Self {
        Self {
            node,
            enabled: true,
            flags: ObjFlags::NONE,
            behavior,
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn flags(&self) -> ObjFlags {
        self.flags
    }

    pub fn hooks(&self) -> Hooks {
        self.behavior.hooks()
    }

    pub fn behavior(&self) -> Rc<dyn Behavior> {
        self.behavior.clone()
    }
}
