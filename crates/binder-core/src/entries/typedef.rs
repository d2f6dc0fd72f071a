use serde::{Deserialize, Serialize};

use crate::{QualifiedName, TypeRef};

/// A type alias. Emits nothing; exists to satisfy ordering edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefEntry {
    pub id: QualifiedName,
    pub target: TypeRef,
}

impl TypedefEntry {
    pub fn new(id: impl Into<QualifiedName>, target: TypeRef) -> Self {
        Self {
            id: id.into(),
            target,
        }
    }
}
