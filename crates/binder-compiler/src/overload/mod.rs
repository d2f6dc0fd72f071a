//! Overload disambiguation.
//!
//! Groups every declared signature of one name and produces, for each, a
//! cast the host framework can use to select exactly that overload.
//!
//! ## Algorithm
//!
//! 1. Key each overload by [`SignatureHash`] (name, parameter identities,
//!    object constness, ref-qualifier)
//! 2. Reject a repeated key: a different return type makes the pair
//!    unrepresentable, an identical one is a plain duplicate
//! 3. Render a disambiguating cast per overload (omitted for a lone overload
//!    unless casts are forced)
//! 4. Report default-argument overlaps as warnings

mod defaults;
mod operators;
mod signature;

pub use defaults::default_overlaps;
pub use operators::{is_operator_name, python_operator_name};
pub use signature::{param_list, render_cast, signature_text};

use binder_core::{ConfigError, Overload, SignatureHash, Warning, normalize_spelling};
use rustc_hash::FxHashMap;

/// Who declares an overload set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableOwner<'a> {
    /// A class, by native spelling.
    Class(&'a str),
    /// Module scope; the string names the enclosing namespace for diagnostics.
    Module(&'a str),
}

impl<'a> CallableOwner<'a> {
    fn native_class(self) -> Option<&'a str> {
        match self {
            CallableOwner::Class(native) => Some(native),
            CallableOwner::Module(_) => None,
        }
    }

    fn label(self) -> &'a str {
        match self {
            CallableOwner::Class(label) | CallableOwner::Module(label) => label,
        }
    }
}

/// One overload with its selection data.
#[derive(Debug, Clone)]
pub struct Disambiguated {
    pub overload: Overload,
    pub hash: SignatureHash,
    /// `None` when a single overload is registered without a cast.
    pub cast: Option<String>,
}

/// A disambiguated overload set.
#[derive(Debug, Clone)]
pub struct OverloadSet {
    pub name: String,
    pub overloads: Vec<Disambiguated>,
    pub warnings: Vec<Warning>,
}

/// Disambiguate every overload of `name`.
///
/// # Errors
///
/// - [`ConfigError::EmptyOverloadSet`] for a name with no overloads
/// - [`ConfigError::AmbiguousReturnOverload`] for two overloads differing
///   only in return type
/// - [`ConfigError::DuplicateOverload`] for two identical overloads
pub fn disambiguate(
    owner: CallableOwner<'_>,
    name: &str,
    overloads: &[Overload],
    always_cast: bool,
) -> Result<OverloadSet, ConfigError> {
    if overloads.is_empty() {
        return Err(ConfigError::EmptyOverloadSet {
            owner: owner.label().to_string(),
            name: name.to_string(),
        });
    }

    let native_owner = owner.native_class();
    let needs_cast = always_cast || overloads.len() > 1;

    let mut seen: FxHashMap<SignatureHash, usize> = FxHashMap::default();
    let mut resolved = Vec::with_capacity(overloads.len());
    for (i, overload) in overloads.iter().enumerate() {
        let hash = SignatureHash::from_overload(name, overload);
        if let Some(&first) = seen.get(&hash) {
            return Err(collision(owner.label(), name, &overloads[first], overload));
        }
        seen.insert(hash, i);

        tracing::trace!(owner = owner.label(), method = name, %hash, "overload keyed");
        resolved.push(Disambiguated {
            overload: overload.clone(),
            hash,
            cast: needs_cast.then(|| render_cast(native_owner, overload)),
        });
    }

    let warnings = default_overlaps(owner.label(), name, overloads);
    for warning in &warnings {
        tracing::warn!("{warning}");
    }

    Ok(OverloadSet {
        name: name.to_string(),
        overloads: resolved,
        warnings,
    })
}

fn collision(owner: &str, name: &str, first: &Overload, second: &Overload) -> ConfigError {
    let first_return = normalize_spelling(&first.ret.ty.spelling);
    let second_return = normalize_spelling(&second.ret.ty.spelling);
    if first_return != second_return {
        ConfigError::AmbiguousReturnOverload {
            owner: owner.to_string(),
            name: name.to_string(),
            signature: signature_text(second),
            first_return,
            second_return,
        }
    } else {
        ConfigError::DuplicateOverload {
            owner: owner.to_string(),
            name: name.to_string(),
            signature: signature_text(second),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{Param, RefQualifier, ReturnType, TypeRef};

    fn f(param: &str, ret: &str) -> Overload {
        Overload::new(ReturnType::value(TypeRef::primitive(ret)))
            .with_param(Param::new("x", TypeRef::primitive(param)))
    }

    #[test]
    fn distinct_parameter_types_both_selectable() {
        let set = disambiguate(
            CallableOwner::Class("Shape"),
            "f",
            &[f("int", "void"), f("const int &", "void")],
            false,
        )
        .unwrap();
        assert_eq!(set.overloads.len(), 2);
        assert_ne!(set.overloads[0].hash, set.overloads[1].hash);
        assert_eq!(
            set.overloads[0].cast.as_deref(),
            Some("(void (Shape::*)(int))")
        );
        assert_eq!(
            set.overloads[1].cast.as_deref(),
            Some("(void (Shape::*)(const int &))")
        );
    }

    #[test]
    fn return_only_difference_rejected() {
        let result = disambiguate(
            CallableOwner::Class("Shape"),
            "f",
            &[f("int", "int"), f("int", "double")],
            true,
        );
        match result {
            Err(ConfigError::AmbiguousReturnOverload {
                owner,
                name,
                first_return,
                second_return,
                ..
            }) => {
                assert_eq!(owner, "Shape");
                assert_eq!(name, "f");
                assert_eq!(first_return, "int");
                assert_eq!(second_return, "double");
            }
            other => panic!("Expected AmbiguousReturnOverload, got {:?}", other),
        }
    }

    #[test]
    fn exact_duplicate_rejected() {
        let result = disambiguate(
            CallableOwner::Module("gp"),
            "f",
            &[f("int", "int"), f("const int", "int")],
            true,
        );
        assert!(matches!(result, Err(ConfigError::DuplicateOverload { .. })));
    }

    #[test]
    fn constness_distinguishes() {
        let set = disambiguate(
            CallableOwner::Class("Shape"),
            "Value",
            &[
                Overload::new(ReturnType::value(TypeRef::primitive("int &"))),
                Overload::new(ReturnType::value(TypeRef::primitive("int"))).as_const(),
                Overload::new(ReturnType::value(TypeRef::primitive("int")))
                    .with_ref_qualifier(RefQualifier::RValue),
            ],
            false,
        )
        .unwrap();
        assert_eq!(set.overloads.len(), 3);
        assert_eq!(
            set.overloads[1].cast.as_deref(),
            Some("(int (Shape::*)() const)")
        );
    }

    #[test]
    fn single_overload_cast_optional() {
        let set = disambiguate(CallableOwner::Class("Shape"), "f", &[f("int", "void")], false)
            .unwrap();
        assert_eq!(set.overloads[0].cast, None);
        let set = disambiguate(CallableOwner::Class("Shape"), "f", &[f("int", "void")], true)
            .unwrap();
        assert!(set.overloads[0].cast.is_some());
    }

    #[test]
    fn free_function_cast() {
        let set = disambiguate(CallableOwner::Module("gp"), "f", &[f("int", "void")], true)
            .unwrap();
        assert_eq!(set.overloads[0].cast.as_deref(), Some("(void (*)(int))"));
    }

    #[test]
    fn empty_set_rejected() {
        let result = disambiguate(CallableOwner::Class("Shape"), "f", &[], true);
        assert!(matches!(result, Err(ConfigError::EmptyOverloadSet { .. })));
    }
}
