//! # spark-activator
//!
//! Hierarchical lifecycle activation for scene trees.
//!
//! Turns a subtree of nodes and their components on or off, dispatching
//! pre-load, on-load, on-enable, on-disable and on-destroy in a fixed order
//! while staying safe when user code inside those callbacks activates or
//! deactivates nodes itself.
//!
//! ## Architecture
//!
//! ```text
//! Scene ─► NodeActivator ─► ActivateTask (preload | on_load | on_enable Invokers)
//!                       └─► ComponentScheduler (enable / disable)
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Flag sets and lifecycle hook names
//! - [`engine`] - Scene, nodes, components, slot registry
//! - [`activator`] - Invokers, task pool, activation walks, scheduler seam
//! - [`config`] - Execution mode, pool capacity, fault policy
//! - [`error`] - Activator errors
//! - [`logging`] - Tracing subscriber setup

pub mod activator;
pub mod config;
pub mod engine;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used items
pub use types::*;

pub use engine::{
    Behavior, Component, ComponentId, HierarchyListener, ListenerId, Node, NodeId,
    PostActivatedHook, Registry, Scene,
};

pub use activator::{
    activate_comp, destroy_comp, reset_comp, ActivateTask, ComponentScheduler, DefaultScheduler,
    InvokePolicy, Invoker, InvokerRef, NodeActivator, Stage, TaskPool, TaskRef,
};

pub use config::{ActivatorConfig, ExecutionMode, FaultPolicy};

pub use error::{ActivatorError, HookResult, Result};

pub use logging::init_logging;
