//! Template definitions and their requested instantiations.

use serde::{Deserialize, Serialize};

use crate::{QualifiedName, TypeRef};

use super::{ClassEntry, FunctionEntry};

/// A type-parameter slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateParam {
    /// Slot name as spelled in the body (`T`, `K`).
    pub name: String,
    /// Used when an instantiation omits this argument.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<TypeRef>,
}

impl TemplateParam {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: None,
        }
    }

    pub fn with_default(mut self, default: TypeRef) -> Self {
        self.default = Some(default);
        self
    }
}

/// The parameterized definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TemplateBody {
    Class(ClassEntry),
    Function(FunctionEntry),
}

/// One requested concrete instantiation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instantiation {
    /// Appended to the template identifier to form the instance identifier.
    pub suffix: String,
    /// Concrete type arguments, positionally matched to the slots.
    pub args: Vec<TypeRef>,
    /// Python-visible name; defaults to the flattened instance identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Instantiation {
    pub fn new(suffix: impl Into<String>, args: Vec<TypeRef>) -> Self {
        Self {
            suffix: suffix.into(),
            args,
            name: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

/// Entity-model entry for a class or function template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    pub id: QualifiedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub params: Vec<TemplateParam>,
    pub body: TemplateBody,
    #[serde(default)]
    pub instantiations: Vec<Instantiation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<QualifiedName>,
}

impl TemplateEntry {
    pub fn new(id: impl Into<QualifiedName>, params: Vec<TemplateParam>, body: TemplateBody) -> Self {
        Self {
            id: id.into(),
            doc: None,
            params,
            body,
            instantiations: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_instantiation(mut self, instantiation: Instantiation) -> Self {
        self.instantiations.push(instantiation);
        self
    }

    /// Slot names in declaration order.
    pub fn slot_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }
}
