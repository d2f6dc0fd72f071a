use std::fmt;

use serde::{Deserialize, Serialize};

/// Qualified native identifier for an entity.
///
/// Used as the primary key for entities in a module. Serialized as the plain
/// `::`-separated string the header parser produced.
///
/// # Examples
///
/// ```
/// use binder_core::QualifiedName;
///
/// // Global namespace
/// let mesh = QualifiedName::global("Test_Mesh");
/// assert_eq!(mesh.to_string(), "Test_Mesh");
///
/// // With namespace
/// let node = QualifiedName::new("Node", vec!["gp".into(), "Mesh".into()]);
/// assert_eq!(node.to_string(), "gp::Mesh::Node");
/// assert_eq!(node.flattened(), "gp_Mesh_Node");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct QualifiedName {
    /// Simple name (e.g., "Test_Mesh", "AddNode")
    pub name: String,
    /// Enclosing namespaces and classes, outermost first.
    /// Empty for the global namespace.
    pub namespace: Vec<String>,
}

impl QualifiedName {
    /// Create a new qualified name with namespace.
    pub fn new(name: impl Into<String>, namespace: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace,
        }
    }

    /// Create a qualified name in the global namespace.
    pub fn global(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: Vec::new(),
        }
    }

    /// Create from a qualified string (e.g., "gp::Pnt").
    ///
    /// Splits on "::" - the last segment is the name, rest is namespace.
    /// Leading "::" (absolute path) is normalized: "::gp::Pnt" == "gp::Pnt".
    pub fn from_qualified_string(s: &str) -> Self {
        let mut parts: Vec<String> = s
            .split("::")
            .filter(|p| !p.is_empty())
            .map(str::to_string)
            .collect();
        match parts.pop() {
            Some(name) => Self {
                name,
                namespace: parts,
            },
            None => Self::global(""),
        }
    }

    /// Check if this is in the global namespace.
    pub fn is_global(&self) -> bool {
        self.namespace.is_empty()
    }

    /// Get the simple (unqualified) name.
    pub fn simple_name(&self) -> &str {
        &self.name
    }

    /// Get the namespace path.
    pub fn namespace_path(&self) -> &[String] {
        &self.namespace
    }

    /// Get the namespace as a joined string.
    pub fn namespace_string(&self) -> String {
        self.namespace.join("::")
    }

    /// Python-safe flattened form: `gp::Mesh::Node` -> `gp_Mesh_Node`.
    pub fn flattened(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}_{}", self.namespace.join("_"), self.name)
        }
    }

    /// Create a child name within this scope.
    ///
    /// Example: `Test_Mesh` + `AddNode` = `Test_Mesh::AddNode`
    pub fn child(&self, name: impl Into<String>) -> Self {
        let mut child_ns = self.namespace.clone();
        child_ns.push(self.name.clone());
        Self {
            name: name.into(),
            namespace: child_ns,
        }
    }

    /// Sibling with a distinguishing suffix appended to the simple name.
    ///
    /// Example: `Test_Template` + `_IntInt` = `Test_Template_IntInt`
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            name: format!("{}{}", self.name, suffix),
            namespace: self.namespace.clone(),
        }
    }

    /// Get the enclosing scope as a QualifiedName (if any).
    ///
    /// Example: `gp::Mesh::Node` -> Some(`gp::Mesh`)
    pub fn parent(&self) -> Option<Self> {
        let (name, namespace) = self.namespace.split_last()?;
        Some(Self {
            name: name.clone(),
            namespace: namespace.to_vec(),
        })
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}::{}", self.namespace.join("::"), self.name)
        }
    }
}

impl From<&str> for QualifiedName {
    fn from(s: &str) -> Self {
        Self::from_qualified_string(s)
    }
}

impl From<String> for QualifiedName {
    fn from(s: String) -> Self {
        Self::from_qualified_string(&s)
    }
}

impl From<QualifiedName> for String {
    fn from(name: QualifiedName) -> Self {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_name() {
        let name = QualifiedName::global("Test_Node");
        assert_eq!(name.name, "Test_Node");
        assert!(name.is_global());
        assert_eq!(name.to_string(), "Test_Node");
        assert_eq!(name.flattened(), "Test_Node");
    }

    #[test]
    fn from_qualified_string_leading_colons() {
        let absolute = QualifiedName::from_qualified_string("::gp::Pnt");
        let relative = QualifiedName::from_qualified_string("gp::Pnt");
        assert_eq!(absolute, relative);
        assert_eq!(absolute.namespace, vec!["gp"]);

        let empty = QualifiedName::from_qualified_string("::");
        assert_eq!(empty.name, "");
        assert!(empty.is_global());
    }

    #[test]
    fn child_and_parent() {
        let class = QualifiedName::from("Test_Mesh");
        let method = class.child("AddNode");
        assert_eq!(method.to_string(), "Test_Mesh::AddNode");
        assert_eq!(method.parent(), Some(class));
        assert!(QualifiedName::global("int").parent().is_none());
    }

    #[test]
    fn suffix_keeps_namespace() {
        let template = QualifiedName::from("ns::Pair");
        assert_eq!(template.with_suffix("_IntInt").to_string(), "ns::Pair_IntInt");
    }

    #[test]
    fn serde_as_plain_string() {
        let name = QualifiedName::from("gp::Mesh::Node");
        let json = serde_json::to_string(&name).unwrap();
        assert_eq!(json, "\"gp::Mesh::Node\"");
        let back: QualifiedName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, name);
    }
}
