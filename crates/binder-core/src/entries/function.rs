//! Functions, methods, constructors and their overloads.

use serde::{Deserialize, Serialize};

use crate::{KeepAlive, QualifiedName, RefQualifier, ReturnPolicy, ReturnType, TypeRef, Visibility};

/// A single parameter of an overload or constructor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Param {
    /// Parameter name, used as the keyword-argument label.
    pub name: String,
    /// Parameter type.
    pub ty: TypeRef,
    /// Default value expression, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

impl Param {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// Attach a default value.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }
}

/// One concrete signature among several sharing a name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overload {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default, rename = "return")]
    pub ret: ReturnType,
    /// Method is `const`-qualified.
    #[serde(default)]
    pub is_const: bool,
    /// Method carries a `&` / `&&` qualifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_qualifier: Option<RefQualifier>,
    /// Static member function.
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    /// Explicit return value policy; replaces the inferred one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<ReturnPolicy>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keep_alive: Vec<KeepAlive>,
}

impl Overload {
    /// Create a public, non-const overload with no parameters.
    pub fn new(ret: ReturnType) -> Self {
        Self {
            params: Vec::new(),
            ret,
            is_const: false,
            ref_qualifier: None,
            is_static: false,
            visibility: Visibility::Public,
            doc: None,
            policy: None,
            keep_alive: Vec::new(),
        }
    }

    // === Builder Methods ===

    /// Add a parameter.
    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    /// Mark as a `const` method.
    pub fn as_const(mut self) -> Self {
        self.is_const = true;
        self
    }

    /// Mark as a static member function.
    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn with_ref_qualifier(mut self, qualifier: RefQualifier) -> Self {
        self.ref_qualifier = Some(qualifier);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Override the inferred return value policy.
    pub fn with_policy(mut self, policy: ReturnPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: KeepAlive) -> Self {
        self.keep_alive.push(keep_alive);
        self
    }

    // === Query Methods ===

    /// Parameter types in declaration order.
    pub fn param_types(&self) -> Vec<TypeRef> {
        self.params.iter().map(|p| p.ty.clone()).collect()
    }

    /// Index of the first parameter with a default value.
    pub fn first_default(&self) -> Option<usize> {
        self.params.iter().position(|p| p.default.is_some())
    }

    /// Every type this overload mentions (parameters, then return).
    pub fn referenced_types(&self) -> impl Iterator<Item = &TypeRef> {
        self.params.iter().map(|p| &p.ty).chain(std::iter::once(&self.ret.ty))
    }
}

/// A class method: one name with its overloads.
///
/// Several entries may share a name; the disambiguator groups them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodEntry {
    /// Native member name (`AddNode`, `operator+`).
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub overloads: Vec<Overload>,
}

impl MethodEntry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            overloads: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_overload(mut self, overload: Overload) -> Self {
        self.overloads.push(overload);
        self
    }
}

/// A free function registered on the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionEntry {
    pub id: QualifiedName,
    /// Python-visible name; defaults to the simple native name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Native callable spelling; defaults to the identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub overloads: Vec<Overload>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<QualifiedName>,
}

impl FunctionEntry {
    pub fn new(id: impl Into<QualifiedName>) -> Self {
        Self {
            id: id.into(),
            name: None,
            native_name: None,
            doc: None,
            overloads: Vec::new(),
            dependencies: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_overload(mut self, overload: Overload) -> Self {
        self.overloads.push(overload);
        self
    }

    pub fn with_native_name(mut self, native_name: impl Into<String>) -> Self {
        self.native_name = Some(native_name.into());
        self
    }

    /// Python-visible name: the override, else the simple native name.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.name.clone())
    }

    /// The native spelling taken by address in the registration statement.
    pub fn native_spelling(&self) -> String {
        self.native_name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

/// A class constructor.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Constructor {
    #[serde(default)]
    pub params: Vec<Param>,
    #[serde(default)]
    pub visibility: Visibility,
}

impl Constructor {
    /// The default constructor.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }
}
