//! Enumeration entry.

use serde::{Deserialize, Serialize};

use crate::QualifiedName;

/// One enumerator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumValue {
    pub name: String,
    /// Numeric value, informational only; the emitter references the native constant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<i64>,
}

/// Entity-model entry for a native enumeration.
///
/// A tagged enum becomes one enumerated host type whose members are also
/// exported into the owning scope. An untagged enum becomes free-standing
/// integer constants on the module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumEntry {
    pub id: QualifiedName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    pub tagged: bool,
    pub values: Vec<EnumValue>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<QualifiedName>,
    #[serde(default)]
    pub before_type: Vec<String>,
    #[serde(default)]
    pub after_type: Vec<String>,
}

impl EnumEntry {
    /// Create a scoped (tagged) enum.
    pub fn tagged(id: impl Into<QualifiedName>) -> Self {
        Self::new(id, true)
    }

    /// Create an enum whose values become plain module constants.
    pub fn untagged(id: impl Into<QualifiedName>) -> Self {
        Self::new(id, false)
    }

    fn new(id: impl Into<QualifiedName>, tagged: bool) -> Self {
        Self {
            id: id.into(),
            name: None,
            doc: None,
            tagged,
            values: Vec::new(),
            dependencies: Vec::new(),
            before_type: Vec::new(),
            after_type: Vec::new(),
        }
    }

    /// Add an enumerator.
    pub fn with_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.values.push(EnumValue {
            name: name.into(),
            value: Some(value),
        });
        self
    }

    /// Python-visible name: the override, else the flattened identifier.
    pub fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.flattened())
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Qualified native spelling of an enumerator.
    ///
    /// Tagged values live under the enum (`Color::Red`); untagged values live
    /// in the scope enclosing the enum (`Red`, `gp::Red`).
    pub fn value_path(&self, value: &EnumValue) -> String {
        if self.tagged {
            self.id.child(value.name.clone()).to_string()
        } else {
            QualifiedName::new(value.name.clone(), self.id.namespace.clone()).to_string()
        }
    }
}
