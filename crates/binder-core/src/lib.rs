//! Entity model for the binding generator.
//!
//! This crate holds the typed description of a native library's API surface
//! (classes, enums, functions, typedefs, templates) as produced by the header
//! parser, together with the error taxonomy shared by every pipeline stage.
//! It contains no pipeline logic.

mod entries;
mod error;
mod module;
mod qualified_name;
mod signature_hash;
mod types;

pub use entries::{
    ClassEntry, Constructor, Entity, EntityKind, EnumEntry, EnumValue, FieldEntry, FunctionEntry,
    Instantiation, MethodEntry, Overload, Param, TemplateBody, TemplateEntry, TemplateParam,
    TypedefEntry,
};
pub use error::{ConfigError, Warning};
pub use module::{Capacity, ModuleDef};
pub use qualified_name::QualifiedName;
pub use signature_hash::{SignatureHash, hash_constants};
pub use types::{
    KeepAlive, RefCategory, RefQualifier, ReturnOwner, ReturnPolicy, ReturnType, TypeRef,
    Visibility, normalize_spelling,
};
