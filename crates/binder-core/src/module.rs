//! Module definition as delivered by the header parser.

use serde::{Deserialize, Serialize};

use crate::{Entity, QualifiedName};

/// Emission-unit capacity: when exceeded, output is split into continuation units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capacity {
    /// Maximum entities per unit.
    Entities(usize),
    /// Maximum estimated emitted lines per unit.
    Lines(usize),
}

impl Capacity {
    pub fn limit(self) -> usize {
        match self {
            Capacity::Entities(n) | Capacity::Lines(n) => n,
        }
    }
}

/// Top-level namespace: an ordered set of entities plus load-time metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDef {
    /// Module name (becomes the extension module name).
    pub name: String,
    /// Package the module lives in, used for runtime imports.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
    /// Native headers declaring the module's entities.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Other generated modules imported when this one loads.
    #[serde(default)]
    pub imports: Vec<String>,
    /// Identifiers declared by other modules. They satisfy dependency
    /// edges but are never emitted here.
    #[serde(default)]
    pub externals: Vec<QualifiedName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<Capacity>,
    pub entities: Vec<Entity>,
}

impl ModuleDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            package: None,
            includes: Vec::new(),
            imports: Vec::new(),
            externals: Vec::new(),
            capacity: None,
            entities: Vec::new(),
        }
    }

    pub fn with_entity(mut self, entity: impl Into<Entity>) -> Self {
        self.entities.push(entity.into());
        self
    }

    pub fn with_include(mut self, include: impl Into<String>) -> Self {
        self.includes.push(include.into());
        self
    }

    pub fn with_capacity(mut self, capacity: Capacity) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_external(mut self, id: impl Into<QualifiedName>) -> Self {
        self.externals.push(id.into());
        self
    }
}
