//! Type substitution for template instantiation.
//!
//! Template bodies carry native spellings that mention their slot names
//! (`T`, `const K &`, `std::pair<T, K>`). Substitution rewrites each slot
//! token to the concrete argument spelling and re-targets the declaration
//! reference when the whole type was a slot.

use binder_core::{ConfigError, QualifiedName, TemplateEntry, TypeRef};
use rustc_hash::FxHashMap;

/// Map from slot name to concrete type.
pub type SubstitutionMap = FxHashMap<String, TypeRef>;

/// Build a substitution map for one instantiation.
///
/// Slots without an argument take their default; a default may mention
/// earlier slots. A slot with neither is a configuration error.
pub fn build_substitution_map(
    template: &TemplateEntry,
    args: &[TypeRef],
    instance: &QualifiedName,
) -> Result<SubstitutionMap, ConfigError> {
    if args.len() > template.params.len() {
        return Err(ConfigError::TooManyTemplateArguments {
            template: template.id.clone(),
            instance: instance.clone(),
            expected: template.params.len(),
            got: args.len(),
        });
    }

    let mut map = SubstitutionMap::default();
    for (i, slot) in template.params.iter().enumerate() {
        let concrete = match (args.get(i), &slot.default) {
            (Some(arg), _) => arg.clone(),
            (None, Some(default)) => substitute_type(default, &map),
            (None, None) => {
                return Err(ConfigError::MissingTemplateArgument {
                    template: template.id.clone(),
                    instance: instance.clone(),
                    slot: slot.name.clone(),
                });
            }
        };
        map.insert(slot.name.clone(), concrete);
    }
    Ok(map)
}

/// Concrete arguments in slot order, defaults filled in.
pub fn ordered_args<'a>(template: &TemplateEntry, map: &'a SubstitutionMap) -> Vec<&'a TypeRef> {
    template
        .slot_names()
        .filter_map(|slot| map.get(slot))
        .collect()
}

/// Substitute slot names in a type reference.
pub fn substitute_type(ty: &TypeRef, map: &SubstitutionMap) -> TypeRef {
    let decl = match &ty.decl {
        Some(decl) if decl.is_global() => match map.get(decl.simple_name()) {
            Some(arg) => arg.decl.clone(),
            None => Some(decl.clone()),
        },
        other => other.clone(),
    };
    TypeRef {
        spelling: substitute_spelling(&ty.spelling, map),
        decl,
    }
}

/// Substitute slot names in an identifier (base class, dependency).
///
/// An identifier that is exactly a slot becomes the argument's declaration;
/// `None` when the argument is not a declared entity.
pub fn substitute_identifier(id: &QualifiedName, map: &SubstitutionMap) -> Option<QualifiedName> {
    if id.is_global() {
        if let Some(arg) = map.get(id.simple_name()) {
            return arg.decl.clone();
        }
    }
    Some(id.clone())
}

/// Replace every slot token in a native spelling.
///
/// A token is a maximal run of identifier characters. Tokens qualified by a
/// preceding `::` belong to another scope and are left alone.
pub fn substitute_spelling(spelling: &str, map: &SubstitutionMap) -> String {
    if map.is_empty() {
        return spelling.to_string();
    }

    let mut out = String::with_capacity(spelling.len());
    let mut rest = spelling;
    while let Some(start) = rest.find(is_ident_char) {
        let (before, tail) = rest.split_at(start);
        out.push_str(before);
        let end = tail.find(|c: char| !is_ident_char(c)).unwrap_or(tail.len());
        let (token, after) = tail.split_at(end);

        let qualified = out.trim_end().ends_with("::");
        match map.get(token) {
            Some(arg) if !qualified => out.push_str(&arg.spelling),
            _ => out.push_str(token),
        }
        rest = after;
    }
    out.push_str(rest);
    out
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{ClassEntry, TemplateBody, TemplateParam};

    fn pair_template() -> TemplateEntry {
        TemplateEntry::new(
            "Test_Template",
            vec![
                TemplateParam::new("T"),
                TemplateParam::new("K").with_default(TypeRef::primitive("int")),
            ],
            TemplateBody::Class(ClassEntry::new("Test_Template")),
        )
    }

    fn map(pairs: &[(&str, TypeRef)]) -> SubstitutionMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn default_fills_missing_argument() {
        let template = pair_template();
        let m = build_substitution_map(
            &template,
            &[TypeRef::primitive("double")],
            &"Test_Template_Double".into(),
        )
        .unwrap();
        assert_eq!(m["T"].spelling, "double");
        assert_eq!(m["K"].spelling, "int");
    }

    #[test]
    fn missing_argument_without_default() {
        let template = pair_template();
        match build_substitution_map(&template, &[], &"Test_Template_X".into()) {
            Err(ConfigError::MissingTemplateArgument { slot, instance, .. }) => {
                assert_eq!(slot, "T");
                assert_eq!(instance.to_string(), "Test_Template_X");
            }
            other => panic!("Expected MissingTemplateArgument, got {:?}", other),
        }
    }

    #[test]
    fn too_many_arguments() {
        let template = pair_template();
        let args = vec![TypeRef::primitive("int"); 3];
        match build_substitution_map(&template, &args, &"Test_Template_X".into()) {
            Err(ConfigError::TooManyTemplateArguments { expected, got, .. }) => {
                assert_eq!(expected, 2);
                assert_eq!(got, 3);
            }
            other => panic!("Expected TooManyTemplateArguments, got {:?}", other),
        }
    }

    #[test]
    fn default_may_mention_earlier_slot() {
        let template = TemplateEntry::new(
            "Same",
            vec![
                TemplateParam::new("T"),
                TemplateParam::new("U").with_default(TypeRef::primitive("const T &")),
            ],
            TemplateBody::Class(ClassEntry::new("Same")),
        );
        let m = build_substitution_map(&template, &[TypeRef::primitive("double")], &"Same_D".into())
            .unwrap();
        assert_eq!(m["U"].spelling, "const double &");
    }

    #[test]
    fn spelling_tokens_replaced() {
        let m = map(&[
            ("T", TypeRef::primitive("int")),
            ("K", TypeRef::primitive("double")),
        ]);
        assert_eq!(substitute_spelling("const T &", &m), "const int &");
        assert_eq!(
            substitute_spelling("std::pair<T, K>", &m),
            "std::pair<int, double>"
        );
        assert_eq!(substitute_spelling("Tuple<TT>", &m), "Tuple<TT>");
        assert_eq!(substitute_spelling("ns::T *", &m), "ns::T *");
    }

    #[test]
    fn whole_slot_retargets_declaration() {
        let m = map(&[("T", TypeRef::declared("Test_Node", "Test_Node"))]);
        let ty = substitute_type(&TypeRef::declared("T *", "T"), &m);
        assert_eq!(ty.spelling, "Test_Node *");
        assert_eq!(ty.decl, Some(QualifiedName::global("Test_Node")));

        let m = map(&[("T", TypeRef::primitive("int"))]);
        let ty = substitute_type(&TypeRef::declared("const T &", "T"), &m);
        assert_eq!(ty.spelling, "const int &");
        assert_eq!(ty.decl, None);
    }

    #[test]
    fn identifiers_follow_slots() {
        let m = map(&[("B", TypeRef::declared("Base", "Base"))]);
        assert_eq!(
            substitute_identifier(&"B".into(), &m),
            Some(QualifiedName::global("Base"))
        );
        assert_eq!(
            substitute_identifier(&"Other".into(), &m),
            Some(QualifiedName::global("Other"))
        );
    }
}
