//! Activator - Lifecycle ordering for node subtrees.
//!
//! - Invoker: deferred dispatch queue for one lifecycle stage
//! - ActivateTask / TaskPool: the three invokers of one top-level activation, pooled
//! - NodeActivator: in-flight task stack plus the activation/deactivation walks
//! - ComponentScheduler: enable/disable seam, with a default implementation
//!
//! # Ordering
//!
//! For one `activate_node(root, true)` call, every pre-load in the subtree
//! runs before any on-load, and every on-load before any on-enable. Hooks
//! may re-enter the activator; a nested deactivation cancels the callbacks
//! still queued for its subtree in every in-flight task.

mod invoker;
mod node_activator;
mod scheduler;
mod task;

pub use invoker::*;
pub use node_activator::{activate_comp, destroy_comp, reset_comp, NodeActivator, TaskRef};

pub(crate) use node_activator::activate_node;
pub use scheduler::*;
pub use task::*;
