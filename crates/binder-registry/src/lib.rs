//! Entity storage and dependency ordering for one module.
//!
//! - [`EntityArena`] - identifier-indexed entity storage with alias support
//! - [`DependencyGraph`] - must-be-declared-before edges
//! - [`resolve_order`] - deterministic dependency-respecting order

mod arena;
mod dependency_graph;
mod resolver;

pub use arena::{EntityArena, EntityId};
pub use dependency_graph::{DependencyGraph, DependencyKind};
pub use resolver::resolve_order;
