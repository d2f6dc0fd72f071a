//! Declaration-order resolution.
//!
//! Produces a total order of a module's entities in which every entity comes
//! after everything it depends on. The order is a depth-first post-order over
//! roots taken in declaration order, with dependencies visited in declaration
//! order too, so entities with no constraint between them keep their relative
//! input order and the result is identical on every run.

use binder_core::ConfigError;

use crate::arena::{EntityArena, EntityId};
use crate::dependency_graph::DependencyGraph;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Visiting,
    Visited,
}

struct Frame {
    id: EntityId,
    deps: Vec<EntityId>,
    next: usize,
}

/// Compute the declaration order of every entity in the arena.
///
/// Fails with [`ConfigError::CyclicDependency`] naming every identifier on
/// the first cycle found.
pub fn resolve_order(
    arena: &EntityArena,
    graph: &DependencyGraph,
) -> Result<Vec<EntityId>, ConfigError> {
    let mut marks = vec![Mark::Unvisited; arena.len()];
    let mut order = Vec::with_capacity(arena.len());
    let mut stack: Vec<Frame> = Vec::new();

    for root in arena.ids() {
        if marks[root.index()] != Mark::Unvisited {
            continue;
        }
        marks[root.index()] = Mark::Visiting;
        stack.push(Frame {
            id: root,
            deps: graph.dependencies_of(root),
            next: 0,
        });

        while let Some(frame) = stack.last_mut() {
            if frame.next < frame.deps.len() {
                let dep = frame.deps[frame.next];
                frame.next += 1;
                match marks[dep.index()] {
                    Mark::Unvisited => {
                        marks[dep.index()] = Mark::Visiting;
                        stack.push(Frame {
                            id: dep,
                            deps: graph.dependencies_of(dep),
                            next: 0,
                        });
                    }
                    Mark::Visiting => return Err(cycle_error(arena, &stack, dep)),
                    Mark::Visited => {}
                }
            } else {
                let id = frame.id;
                stack.pop();
                marks[id.index()] = Mark::Visited;
                order.push(id);
            }
        }
    }

    tracing::debug!(entities = order.len(), "declaration order resolved");
    Ok(order)
}

fn cycle_error(arena: &EntityArena, stack: &[Frame], reentered: EntityId) -> ConfigError {
    let start = stack
        .iter()
        .position(|f| f.id == reentered)
        .unwrap_or_default();
    let cycle = stack[start..]
        .iter()
        .map(|f| arena.get(f.id).id().clone())
        .collect();
    ConfigError::CyclicDependency { cycle }
}
