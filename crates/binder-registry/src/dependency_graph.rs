//! Dependency Graph - must-be-declared-before edges between entities.
//!
//! Uses `petgraph::DiGraph` with:
//! - Nodes: [`EntityId`] (one per arena entity, same index)
//! - Edges: dependent -> dependency, weighted by [`DependencyKind`]

use binder_core::{ConfigError, Entity, QualifiedName, TypeRef};
use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use rustc_hash::FxHashSet;

use crate::arena::{EntityArena, EntityId};

/// Why one entity must precede another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Base class before derived class.
    Base,
    /// Type used by a parameter, return value, field or nested typedef.
    Member,
    /// Typedef target before the typedef.
    Target,
    /// Listed in the entity's explicit dependencies.
    Explicit,
}

/// Directed dependency graph over an arena.
#[derive(Debug)]
pub struct DependencyGraph {
    graph: DiGraph<EntityId, DependencyKind>,
}

impl DependencyGraph {
    /// Collect every dependency edge of every entity.
    ///
    /// Identifiers listed in `externals` are declared by other modules; edges
    /// to them are satisfied without being recorded. Any other identifier
    /// that does not resolve in the arena is a configuration error.
    pub fn build(arena: &EntityArena, externals: &[QualifiedName]) -> Result<Self, ConfigError> {
        let externals: FxHashSet<&QualifiedName> = externals.iter().collect();

        let mut graph = DiGraph::with_capacity(arena.len(), arena.len());
        for id in arena.ids() {
            graph.add_node(id);
        }

        for (id, entity) in arena.iter() {
            for (target, kind) in referenced_identifiers(entity) {
                let resolved = arena.resolve(target);
                if resolved.is_empty() {
                    if externals.contains(target) || arena.is_known(target) {
                        continue;
                    }
                    return Err(ConfigError::UnresolvedDependency {
                        entity: entity.id().clone(),
                        missing: target.clone(),
                    });
                }
                for &dependency in resolved {
                    if dependency == id {
                        continue;
                    }
                    graph.update_edge(node(id), node(dependency), kind);
                }
            }
        }

        tracing::trace!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        Ok(Self { graph })
    }

    /// Direct dependencies of an entity, in declaration order.
    pub fn dependencies_of(&self, id: EntityId) -> Vec<EntityId> {
        let mut deps: Vec<EntityId> = self
            .graph
            .neighbors_directed(node(id), Direction::Outgoing)
            .map(|n| self.graph[n])
            .collect();
        deps.sort_unstable();
        deps.dedup();
        deps
    }

    /// Check whether `dependent` directly depends on `dependency`.
    pub fn depends_on(&self, dependent: EntityId, dependency: EntityId) -> bool {
        self.graph.contains_edge(node(dependent), node(dependency))
    }

    /// Kind of the direct edge, if any.
    pub fn edge_kind(&self, dependent: EntityId, dependency: EntityId) -> Option<DependencyKind> {
        self.graph
            .find_edge(node(dependent), node(dependency))
            .map(|e| self.graph[e])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}

#[inline]
fn node(id: EntityId) -> NodeIndex {
    NodeIndex::new(id.index())
}

/// Every identifier an entity needs declared before it, with the reason.
fn referenced_identifiers(entity: &Entity) -> Vec<(&QualifiedName, DependencyKind)> {
    let mut refs: Vec<(&QualifiedName, DependencyKind)> = Vec::new();

    match entity {
        Entity::Class(class) => {
            refs.extend(class.bases.iter().map(|b| (b, DependencyKind::Base)));
            refs.extend(
                class
                    .member_types()
                    .filter_map(decl_of)
                    .map(|d| (d, DependencyKind::Member)),
            );
        }
        Entity::Function(function) => {
            refs.extend(
                function
                    .overloads
                    .iter()
                    .flat_map(|o| o.referenced_types())
                    .filter_map(decl_of)
                    .map(|d| (d, DependencyKind::Member)),
            );
        }
        Entity::Typedef(typedef) => {
            if let Some(target) = &typedef.target.decl {
                refs.push((target, DependencyKind::Target));
            }
        }
        Entity::Enum(_) | Entity::Template(_) => {}
    }

    refs.extend(
        entity
            .explicit_dependencies()
            .iter()
            .map(|d| (d, DependencyKind::Explicit)),
    );
    refs
}

fn decl_of(ty: &TypeRef) -> Option<&QualifiedName> {
    ty.decl.as_ref()
}
