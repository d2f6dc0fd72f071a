//! Class type entry.

use serde::{Deserialize, Serialize};

use crate::{QualifiedName, TypeRef, Visibility};

use super::{Constructor, MethodEntry, TypedefEntry};

/// A public data member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    pub ty: TypeRef,
    /// Registered read-only (const members, or by request).
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
}

impl FieldEntry {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            readonly: false,
            visibility: Visibility::Public,
            doc: None,
        }
    }

    pub fn as_readonly(mut self) -> Self {
        self.readonly = true;
        self
    }
}

/// Entity-model entry for a native class.
///
/// Also serves as the body of a class template, in which case spellings
/// mention the template's parameter slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassEntry {
    /// Qualified native name.
    pub id: QualifiedName,
    /// Python-visible name; defaults to the flattened identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Spelling used as the registered native type; defaults to the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_type: Option<String>,
    /// Holder type spelling (e.g. `opencascade::handle<Geom_Curve>`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub holder: Option<String>,

    // === Inheritance ===
    /// Base classes; each must be registered first.
    #[serde(default)]
    pub bases: Vec<QualifiedName>,

    // === Members ===
    #[serde(default)]
    pub constructors: Vec<Constructor>,
    #[serde(default)]
    pub methods: Vec<MethodEntry>,
    #[serde(default)]
    pub fields: Vec<FieldEntry>,
    /// Nested typedefs; markers only.
    #[serde(default)]
    pub typedefs: Vec<TypedefEntry>,

    // === Ordering / Injection ===
    /// Extra must-be-declared-before identifiers.
    #[serde(default)]
    pub dependencies: Vec<QualifiedName>,
    #[serde(default)]
    pub before_type: Vec<String>,
    #[serde(default)]
    pub after_type: Vec<String>,

    // === Modifiers ===
    /// Abstract classes get no constructors.
    #[serde(default)]
    pub is_abstract: bool,
}

impl ClassEntry {
    /// Create an empty class entry.
    pub fn new(id: impl Into<QualifiedName>) -> Self {
        Self {
            id: id.into(),
            name: None,
            doc: None,
            native_type: None,
            holder: None,
            bases: Vec::new(),
            constructors: Vec::new(),
            methods: Vec::new(),
            fields: Vec::new(),
            typedefs: Vec::new(),
            dependencies: Vec::new(),
            before_type: Vec::new(),
            after_type: Vec::new(),
            is_abstract: false,
        }
    }

    // === Builder Methods ===

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_native_type(mut self, native_type: impl Into<String>) -> Self {
        self.native_type = Some(native_type.into());
        self
    }

    pub fn with_holder(mut self, holder: impl Into<String>) -> Self {
        self.holder = Some(holder.into());
        self
    }

    /// Add a base class.
    pub fn with_base(mut self, base: impl Into<QualifiedName>) -> Self {
        self.bases.push(base.into());
        self
    }

    pub fn with_constructor(mut self, ctor: Constructor) -> Self {
        self.constructors.push(ctor);
        self
    }

    pub fn with_method(mut self, method: MethodEntry) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_field(mut self, field: FieldEntry) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_typedef(mut self, typedef: TypedefEntry) -> Self {
        self.typedefs.push(typedef);
        self
    }

    pub fn depends_on(mut self, id: impl Into<QualifiedName>) -> Self {
        self.dependencies.push(id.into());
        self
    }

    pub fn as_abstract(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    // === Query Methods ===

    /// Python-visible name: the override, else the flattened identifier.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.flattened())
    }

    /// The native spelling registered with the host framework.
    pub fn native_spelling(&self) -> String {
        self.native_type.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// Every type mentioned by a member signature or field.
    pub fn member_types(&self) -> impl Iterator<Item = &TypeRef> {
        let ctor_types = self
            .constructors
            .iter()
            .flat_map(|c| c.params.iter().map(|p| &p.ty));
        let method_types = self
            .methods
            .iter()
            .flat_map(|m| m.overloads.iter())
            .flat_map(|o| o.referenced_types());
        let field_types = self.fields.iter().map(|f| &f.ty);
        let typedef_types = self.typedefs.iter().map(|t| &t.target);
        ctor_types
            .chain(method_types)
            .chain(field_types)
            .chain(typedef_types)
    }
}
