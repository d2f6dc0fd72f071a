//! Native type references and return-value descriptors.
//!
//! Types are kept as the verbatim spelling the header parser produced. The
//! only structured part of a [`TypeRef`] is the optional declaration it
//! refers to, which is what creates a dependency edge between entities.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QualifiedName;

/// A reference to a native type as used in a signature or field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    /// Verbatim native spelling (e.g. `const Test_Node &`).
    pub spelling: String,
    /// The entity this type refers to, if it is declared by a module.
    /// `None` for primitives and library types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decl: Option<QualifiedName>,
}

impl TypeRef {
    /// A type with no entity behind it (`int`, `void`, `std::string`).
    pub fn primitive(spelling: impl Into<String>) -> Self {
        Self {
            spelling: spelling.into(),
            decl: None,
        }
    }

    /// A type that refers to a declared entity.
    pub fn declared(spelling: impl Into<String>, decl: impl Into<QualifiedName>) -> Self {
        Self {
            spelling: spelling.into(),
            decl: Some(decl.into()),
        }
    }

    /// The `void` type.
    pub fn void() -> Self {
        Self::primitive("void")
    }

    /// Check if this is `void`.
    pub fn is_void(&self) -> bool {
        normalize_spelling(&self.spelling) == "void"
    }

    /// Check if the spelling is a pointer or reference.
    pub fn is_indirect(&self) -> bool {
        self.spelling.contains('*') || self.spelling.contains('&')
    }

    /// Spelling used for signature identity.
    ///
    /// Top-level `const` on a by-value parameter does not change a native
    /// function type, so `const int` and `int` share one identity.
    pub fn identity(&self) -> String {
        let normalized = normalize_spelling(&self.spelling);
        if self.is_indirect() {
            return normalized;
        }
        let stripped = normalized
            .strip_prefix("const ")
            .or_else(|| normalized.strip_suffix(" const"))
            .unwrap_or(&normalized);
        stripped.to_string()
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spelling)
    }
}

/// Canonical spacing for a native type spelling.
///
/// Collapses whitespace runs and drops spaces next to punctuation, so
/// `const int &` and `const int&` compare equal.
pub fn normalize_spelling(spelling: &str) -> String {
    let collapsed: Vec<char> = spelling
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .chars()
        .collect();

    let is_punct = |c: char| matches!(c, '*' | '&' | ',' | '<' | '>' | '(' | ')' | '[' | ']' | ':');

    let mut out = String::with_capacity(collapsed.len());
    for (i, &c) in collapsed.iter().enumerate() {
        if c == ' ' {
            let prev = collapsed[i - 1];
            let next = collapsed[i + 1];
            if is_punct(prev) || is_punct(next) {
                continue;
            }
        }
        out.push(c);
    }
    out
}

/// How a value is returned from a native function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefCategory {
    /// Returned by copy.
    #[default]
    Value,
    /// `const T&`
    ConstReference,
    /// `T&`
    MutableReference,
    /// `T*` or `const T*`
    Pointer,
}

/// Who owns the object behind a returned reference or pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnOwner {
    /// The invoking object (a member of `this`).
    #[serde(rename = "self")]
    SelfObject,
    /// The argument at this zero-based parameter index.
    Param(usize),
    /// Something outside the call entirely.
    External,
}

/// Return type descriptor of an overload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnType {
    /// The returned type.
    pub ty: TypeRef,
    /// Value / reference / pointer category.
    #[serde(default)]
    pub category: RefCategory,
    /// The source model marks the result as owned by the caller.
    #[serde(default)]
    pub owning: bool,
    /// Explicit owner of a non-owning reference or pointer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ReturnOwner>,
}

impl ReturnType {
    /// A by-value return.
    pub fn value(ty: TypeRef) -> Self {
        Self {
            ty,
            category: RefCategory::Value,
            owning: false,
            owner: None,
        }
    }

    /// A `void` return.
    pub fn void() -> Self {
        Self::value(TypeRef::void())
    }

    /// A return of the given category.
    pub fn with_category(ty: TypeRef, category: RefCategory) -> Self {
        Self {
            ty,
            category,
            owning: false,
            owner: None,
        }
    }

    /// Mark the result as owned by the caller.
    pub fn owning(mut self) -> Self {
        self.owning = true;
        self
    }

    /// Attach an explicit owner.
    pub fn owned_by(mut self, owner: ReturnOwner) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl Default for ReturnType {
    fn default() -> Self {
        Self::void()
    }
}

/// Host-framework return value policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnPolicy {
    /// Let the host framework pick.
    Automatic,
    /// Like `Automatic`, but references stay references.
    AutomaticReference,
    /// Copy the returned value into a new host object.
    Copy,
    /// Move the returned value into a new host object.
    Move,
    /// Hand ownership of the result to the caller.
    TakeOwnership,
    /// Raw reference with no lifetime management.
    Reference,
    /// Reference that keeps the invoking object alive.
    ReferenceInternal,
}

impl ReturnPolicy {
    /// Host-framework spelling of the policy.
    pub fn as_str(self) -> &'static str {
        match self {
            ReturnPolicy::Automatic => "automatic",
            ReturnPolicy::AutomaticReference => "automatic_reference",
            ReturnPolicy::Copy => "copy",
            ReturnPolicy::Move => "move",
            ReturnPolicy::TakeOwnership => "take_ownership",
            ReturnPolicy::Reference => "reference",
            ReturnPolicy::ReferenceInternal => "reference_internal",
        }
    }

    /// Parse the host-framework spelling.
    pub fn parse(s: &str) -> Option<Self> {
        let policy = match s.trim() {
            "automatic" => ReturnPolicy::Automatic,
            "automatic_reference" => ReturnPolicy::AutomaticReference,
            "copy" => ReturnPolicy::Copy,
            "move" => ReturnPolicy::Move,
            "take_ownership" => ReturnPolicy::TakeOwnership,
            "reference" => ReturnPolicy::Reference,
            "reference_internal" => ReturnPolicy::ReferenceInternal,
            _ => return None,
        };
        Some(policy)
    }
}

impl fmt::Display for ReturnPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keep-alive pair in host-framework argument numbering
/// (0 = return value, 1 = `this` or first argument).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeepAlive {
    /// Argument that holds the patient.
    pub nurse: u32,
    /// Argument kept alive at least as long as the nurse.
    pub patient: u32,
}

impl KeepAlive {
    pub fn new(nurse: u32, patient: u32) -> Self {
        Self { nurse, patient }
    }

    /// Parse `"1, 2"`.
    pub fn parse(s: &str) -> Option<Self> {
        let (nurse, patient) = s.split_once(',')?;
        Some(Self {
            nurse: nurse.trim().parse().ok()?,
            patient: patient.trim().parse().ok()?,
        })
    }
}

/// Member access level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn is_public(self) -> bool {
        self == Visibility::Public
    }
}

/// Ref-qualifier on a method's implicit object parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefQualifier {
    #[serde(rename = "&")]
    LValue,
    #[serde(rename = "&&")]
    RValue,
}

impl RefQualifier {
    pub fn as_str(self) -> &'static str {
        match self {
            RefQualifier::LValue => "&",
            RefQualifier::RValue => "&&",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_drops_spaces_near_punctuation() {
        assert_eq!(normalize_spelling("const int &"), "const int&");
        assert_eq!(normalize_spelling("Test_Node  *"), "Test_Node*");
        assert_eq!(
            normalize_spelling("std::vector< int , double >"),
            "std::vector<int,double>"
        );
        assert_eq!(normalize_spelling("unsigned   long"), "unsigned long");
    }

    #[test]
    fn identity_ignores_top_level_const() {
        assert_eq!(TypeRef::primitive("const int").identity(), "int");
        assert_eq!(TypeRef::primitive("int const").identity(), "int");
        assert_eq!(TypeRef::primitive("const int &").identity(), "const int&");
        assert_ne!(
            TypeRef::primitive("int").identity(),
            TypeRef::primitive("const int &").identity()
        );
    }

    #[test]
    fn policy_spelling_round_trips() {
        for policy in [
            ReturnPolicy::Copy,
            ReturnPolicy::ReferenceInternal,
            ReturnPolicy::TakeOwnership,
            ReturnPolicy::Reference,
        ] {
            assert_eq!(ReturnPolicy::parse(policy.as_str()), Some(policy));
        }
        assert_eq!(ReturnPolicy::parse("borrow"), None);
    }

    #[test]
    fn keep_alive_parse() {
        assert_eq!(KeepAlive::parse("1, 2"), Some(KeepAlive::new(1, 2)));
        assert_eq!(KeepAlive::parse("1"), None);
    }

    #[test]
    fn return_owner_from_json() {
        let owner: ReturnOwner = serde_json::from_str("\"self\"").unwrap();
        assert_eq!(owner, ReturnOwner::SelfObject);
        let owner: ReturnOwner = serde_json::from_str("{\"param\": 1}").unwrap();
        assert_eq!(owner, ReturnOwner::Param(1));
    }
}
