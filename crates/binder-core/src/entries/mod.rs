//! Entity-model entries.
//!
//! This module provides the closed set of declarative units a module is
//! made of. [`Entity`] is a sum type so every consumer matches all variants.
//!
//! ## Entry Types
//!
//! - [`ClassEntry`] - Classes with constructors, methods, fields, nested typedefs
//! - [`EnumEntry`] - Tagged (scoped) and untagged enumerations
//! - [`FunctionEntry`] - Free functions with their overload sets
//! - [`TypedefEntry`] - Ordering-only aliases
//! - [`TemplateEntry`] - Class/function templates plus requested instantiations

mod class;
mod enum_entry;
mod function;
mod template;
mod typedef;

pub use class::{ClassEntry, FieldEntry};
pub use enum_entry::{EnumEntry, EnumValue};
pub use function::{Constructor, FunctionEntry, MethodEntry, Overload, Param};
pub use template::{Instantiation, TemplateBody, TemplateEntry, TemplateParam};
pub use typedef::TypedefEntry;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QualifiedName;

/// Discriminant of [`Entity`], for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Class,
    Enum,
    Function,
    Typedef,
    Template,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityKind::Class => "class",
            EntityKind::Enum => "enum",
            EntityKind::Function => "function",
            EntityKind::Typedef => "typedef",
            EntityKind::Template => "template",
        };
        f.write_str(s)
    }
}

/// One declarative unit to be emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Entity {
    Class(ClassEntry),
    Enum(EnumEntry),
    Function(FunctionEntry),
    Typedef(TypedefEntry),
    Template(TemplateEntry),
}

impl Entity {
    /// Stable identifier (qualified native name).
    pub fn id(&self) -> &QualifiedName {
        match self {
            Entity::Class(c) => &c.id,
            Entity::Enum(e) => &e.id,
            Entity::Function(f) => &f.id,
            Entity::Typedef(t) => &t.id,
            Entity::Template(t) => &t.id,
        }
    }

    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Class(_) => EntityKind::Class,
            Entity::Enum(_) => EntityKind::Enum,
            Entity::Function(_) => EntityKind::Function,
            Entity::Typedef(_) => EntityKind::Typedef,
            Entity::Template(_) => EntityKind::Template,
        }
    }

    /// Python-visible name.
    pub fn display_name(&self) -> String {
        match self {
            Entity::Class(c) => c.display_name(),
            Entity::Enum(e) => e.display_name(),
            Entity::Function(f) => f.display_name(),
            Entity::Typedef(t) => t.id.flattened(),
            Entity::Template(t) => t.id.flattened(),
        }
    }

    pub fn doc(&self) -> Option<&str> {
        match self {
            Entity::Class(c) => c.doc.as_deref(),
            Entity::Enum(e) => e.doc.as_deref(),
            Entity::Function(f) => f.doc.as_deref(),
            Entity::Typedef(_) => None,
            Entity::Template(t) => t.doc.as_deref(),
        }
    }

    /// Explicitly declared must-be-declared-before identifiers.
    pub fn explicit_dependencies(&self) -> &[QualifiedName] {
        match self {
            Entity::Class(c) => &c.dependencies,
            Entity::Enum(e) => &e.dependencies,
            Entity::Function(f) => &f.dependencies,
            Entity::Typedef(_) => &[],
            Entity::Template(t) => &t.dependencies,
        }
    }

    /// Replace the Python-visible name.
    pub fn rename(&mut self, name: impl Into<String>) {
        let name = Some(name.into());
        match self {
            Entity::Class(c) => c.name = name,
            Entity::Enum(e) => e.name = name,
            Entity::Function(f) => f.name = name,
            Entity::Typedef(_) | Entity::Template(_) => {}
        }
    }

    pub fn as_class(&self) -> Option<&ClassEntry> {
        match self {
            Entity::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_enum(&self) -> Option<&EnumEntry> {
        match self {
            Entity::Enum(e) => Some(e),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionEntry> {
        match self {
            Entity::Function(f) => Some(f),
            _ => None,
        }
    }
}

impl From<ClassEntry> for Entity {
    fn from(entry: ClassEntry) -> Self {
        Entity::Class(entry)
    }
}

impl From<EnumEntry> for Entity {
    fn from(entry: EnumEntry) -> Self {
        Entity::Enum(entry)
    }
}

impl From<FunctionEntry> for Entity {
    fn from(entry: FunctionEntry) -> Self {
        Entity::Function(entry)
    }
}

impl From<TypedefEntry> for Entity {
    fn from(entry: TypedefEntry) -> Self {
        Entity::Typedef(entry)
    }
}

impl From<TemplateEntry> for Entity {
    fn from(entry: TemplateEntry) -> Self {
        Entity::Template(entry)
    }
}
