//! EntityArena - identifier-indexed storage for one module's entities.
//!
//! Entities reference each other by [`QualifiedName`], never by ownership.
//! The arena assigns each entity a dense [`EntityId`] in declaration order
//! and keeps the name index used to resolve dependency edges.
//!
//! # Aliases
//!
//! Some identifiers stand for entities without being entities themselves:
//!
//! - A template identifier stands for every instantiation of it.
//! - A nested typedef (`Outer::Iterator`) stands for its owning class.
//!
//! Both resolve through [`EntityArena::resolve`].

use binder_core::{ConfigError, Entity, QualifiedName};
use rustc_hash::{FxHashMap, FxHashSet};

/// Dense index of an entity, equal to its declaration position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u32);

impl EntityId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier-indexed entity storage.
#[derive(Debug, Default)]
pub struct EntityArena {
    /// Entities in declaration order (PRIMARY storage).
    entities: Vec<Entity>,

    /// Identifier -> entity.
    by_id: FxHashMap<QualifiedName, EntityId>,

    /// Identifier -> entities it stands for (templates, nested typedefs).
    aliases: FxHashMap<QualifiedName, Vec<EntityId>>,

    /// Entities inserted exclusively; nothing merges into them.
    sealed: FxHashSet<EntityId>,
}

impl EntityArena {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from entities in declaration order.
    ///
    /// Free functions sharing an identifier are merged into one overload set.
    /// Any other identifier collision is a configuration error.
    pub fn build(entities: impl IntoIterator<Item = Entity>) -> Result<Self, ConfigError> {
        let mut arena = Self::new();
        for entity in entities {
            arena.insert(entity)?;
        }
        Ok(arena)
    }

    /// Insert one entity, merging free-function overloads.
    pub fn insert(&mut self, entity: Entity) -> Result<EntityId, ConfigError> {
        let id = entity.id().clone();

        if let Some(&existing) = self.by_id.get(&id) {
            let mergeable = !self.sealed.contains(&existing);
            return match (&mut self.entities[existing.index()], entity) {
                (Entity::Function(first), Entity::Function(more)) if mergeable => {
                    first.overloads.extend(more.overloads);
                    first.dependencies.extend(more.dependencies);
                    if first.doc.is_none() {
                        first.doc = more.doc;
                    }
                    Ok(existing)
                }
                (first, duplicate) => Err(ConfigError::DuplicateEntity {
                    id,
                    existing: first.kind().to_string(),
                    duplicate: duplicate.kind().to_string(),
                }),
            };
        }
        self.push(id, entity)
    }

    /// Insert one entity that must own its identifier outright.
    ///
    /// Template instances go through here: a free-function instance never
    /// merges with another function of the same identifier, and later
    /// free functions never merge into it.
    pub fn insert_exclusive(&mut self, entity: Entity) -> Result<EntityId, ConfigError> {
        let id = entity.id().clone();
        if let Some(&existing) = self.by_id.get(&id) {
            return Err(ConfigError::DuplicateEntity {
                id,
                existing: self.entities[existing.index()].kind().to_string(),
                duplicate: entity.kind().to_string(),
            });
        }
        let entity_id = self.push(id, entity)?;
        self.sealed.insert(entity_id);
        Ok(entity_id)
    }

    fn push(&mut self, id: QualifiedName, entity: Entity) -> Result<EntityId, ConfigError> {
        if self.aliases.contains_key(&id) {
            return Err(ConfigError::DuplicateEntity {
                id,
                existing: "alias".to_string(),
                duplicate: entity.kind().to_string(),
            });
        }

        let entity_id = EntityId(self.entities.len() as u32);
        if let Entity::Class(class) = &entity {
            for typedef in &class.typedefs {
                self.aliases
                    .entry(typedef.id.clone())
                    .or_default()
                    .push(entity_id);
            }
        }
        self.by_id.insert(id, entity_id);
        self.entities.push(entity);
        Ok(entity_id)
    }

    /// Register an identifier that stands for other entities.
    pub fn add_alias(
        &mut self,
        alias: QualifiedName,
        targets: Vec<EntityId>,
    ) -> Result<(), ConfigError> {
        if let Some(&existing) = self.by_id.get(&alias) {
            return Err(ConfigError::DuplicateEntity {
                id: alias,
                existing: self.entities[existing.index()].kind().to_string(),
                duplicate: "template".to_string(),
            });
        }
        self.aliases.entry(alias).or_default().extend(targets);
        Ok(())
    }

    /// Look up an entity by its own identifier.
    pub fn lookup(&self, id: &QualifiedName) -> Option<EntityId> {
        self.by_id.get(id).copied()
    }

    /// Resolve an identifier to the entities it denotes.
    ///
    /// Returns an empty slice when the identifier is unknown.
    pub fn resolve(&self, id: &QualifiedName) -> &[EntityId] {
        if let Some(entity_id) = self.by_id.get(id) {
            return std::slice::from_ref(entity_id);
        }
        self.aliases.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check whether an identifier names an entity or an alias, even an
    /// alias that stands for nothing (a template with no instantiations).
    pub fn is_known(&self, id: &QualifiedName) -> bool {
        self.by_id.contains_key(id) || self.aliases.contains_key(id)
    }

    /// Get an entity.
    pub fn get(&self, id: EntityId) -> &Entity {
        &self.entities[id.index()]
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Iterate entities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i as u32), e))
    }

    /// All entity ids in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = EntityId> {
        (0..self.entities.len()).map(|i| EntityId(i as u32))
    }

    /// Consume the arena, yielding entities in declaration order.
    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}
