//! Scene Engine - Nodes, components and their storage.
//!
//! The engine manages the data the activator walks:
//! - Registry: generational slot arena with index reuse
//! - Node: tree links, local/hierarchy activity, transient flags
//! - Component: owning node, enabled flag, user [`Behavior`]
//! - Scene: owner of everything, entry point for tree and activity changes
//!
//! # Architecture
//!
//! Nodes and components are handles into registries owned by the [`Scene`]:
//!
//! ```text
//! NodeId(0): root   (parent=None,    children=[1, 2], components=[c0])
//! NodeId(1): player (parent=Some(0), children=[],     components=[c1, c2])
//! NodeId(2): hud    (parent=Some(0), children=[],     components=[])
//! ```
//!
//! Hooks receive `&mut Scene`, so user code can restructure the tree while
//! the activator is walking it.

mod component;
mod node;
mod registry;
mod scene;

pub use component::*;
pub use node::*;
pub use registry::*;
pub use scene::{HierarchyListener, ListenerId, Scene};

pub(crate) use scene::is_within;
