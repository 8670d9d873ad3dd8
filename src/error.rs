//! Activator errors.
//!
//! Structural problems (reentrant activation, double deactivation, corrupted
//! component slots, activation calls that contradict the local flags) are
//! never returned to callers. They are logged and recorded in the scene's
//! incident log, and the walk moves on.
//! Only hook faults can surface as `Err`, and only under
//! [`FaultPolicy::Propagate`](crate::config::FaultPolicy::Propagate).

use thiserror::Error;

use crate::engine::{ComponentId, NodeId};

/// Result alias used throughout the activator.
pub type Result<T> = std::result::Result<T, ActivatorError>;

/// Result type returned by behavior hooks.
pub type HookResult = anyhow::Result<()>;

#[derive(Debug, Error)]
pub enum ActivatorError {
    /// Activation reached a node that is still inside its own deactivation.
    #[error("cannot activate node '{name}' ({node}) while it is deactivating")]
    ReentrantActivation { node: NodeId, name: String },

    /// Deactivation reached a node that is already deactivating.
    #[error("node '{name}' ({node}) is already deactivating")]
    AlreadyDeactivating { node: NodeId, name: String },

    /// A component slot did not hold a component owned by the node.
    #[error("component slot {index} of node '{name}' ({node}) is corrupted")]
    CorruptedComponent {
        node: NodeId,
        name: String,
        index: usize,
    },

    /// A direct activation call disagreed with the node's local flags: the
    /// node or its parent is inactive, or deactivating it would leave an
    /// active parent with an inactive child that is locally active.
    #[error("cannot set node '{name}' ({node}) active={active} against its hierarchy")]
    HierarchyMismatch {
        node: NodeId,
        name: String,
        active: bool,
    },

    /// A scene operation named a node that does not exist.
    #[error("unknown node {0}")]
    MissingNode(NodeId),

    /// User code inside a lifecycle hook failed.
    #[error("{hook} failed on component {component}")]
    HookFailed {
        hook: &'static str,
        component: ComponentId,
        #[source]
        source: anyhow::Error,
    },
}

impl ActivatorError {
    /// Structural errors are contained by the walk and never propagate.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ActivatorError::ReentrantActivation { .. }
                | ActivatorError::AlreadyDeactivating { .. }
                | ActivatorError::CorruptedComponent { .. }
                | ActivatorError::HierarchyMismatch { .. }
        )
    }
}
