//! Node - A position in the scene tree.
//!
//! A node owns its children and its components. It carries two activity
//! states: the local `active` flag set by callers, and `active_in_hierarchy`,
//! which only the activator writes while walking the tree.

use std::rc::Rc;

use super::registry::{ComponentId, NodeId};
use super::scene::Scene;
use crate::types::ObjFlags;

/// Called once a node's components and descendants have been walked.
///
/// The flag is `true` after activation and `false` after deactivation.
pub type PostActivatedHook = Rc<dyn Fn(&mut Scene, NodeId, bool)>;

pub struct Node {
    pub(crate) name: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    /// `None` or an id that does not resolve to one of this node's
    /// components is a corrupted slot, repaired during activation.
    pub(crate) components: Vec<Option<ComponentId>>,
    pub(crate) active: bool,
    pub(crate) active_in_hierarchy: bool,
    pub(crate) flags: ObjFlags,
    pub(crate) post_activated: Option<PostActivatedHook>,
}

impl Node {
    pub(crate) fn new(name: impl Into<String>, parent: Option<NodeId>, active: bool) -> Self {
        Self {
            name: name.into(),
            parent,
            children: Vec::new(),
            components: Vec::new(),
            active,
            active_in_hierarchy: false,
            flags: ObjFlags::NONE,
            post_activated: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_active_in_hierarchy(&self) -> bool {
        self.active_in_hierarchy
    }

    pub fn is_deactivating(&self) -> bool {
        self.flags.contains(ObjFlags::DEACTIVATING)
    }

    pub fn flags(&self) -> ObjFlags {
        self.flags
    }
}
