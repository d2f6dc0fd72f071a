//! Template instantiation system.
//!
//! Expands every template entity of a module, in place, into one concrete
//! entity per requested instantiation.
//!
//! ## Components
//!
//! - [`SubstitutionMap`]: Maps slot names to concrete types
//! - [`instantiate_template`]: Instantiate a single request
//! - [`instantiate_templates`]: Expand a whole entity list

mod instantiation;
mod substitution;

pub use instantiation::{format_template_instance_name, instantiate_template};
pub use substitution::{
    SubstitutionMap, build_substitution_map, substitute_identifier, substitute_spelling,
    substitute_type,
};

use binder_core::{ConfigError, Entity, EntityKind, QualifiedName};
use rustc_hash::{FxHashMap, FxHashSet};

/// Result of expanding a module's templates.
#[derive(Debug, Default)]
pub struct Expansion {
    /// Entities in declaration order, each template replaced by its instances.
    pub entities: Vec<Entity>,
    /// Template identifier -> the instance identifiers it stands for.
    pub aliases: Vec<(QualifiedName, Vec<QualifiedName>)>,
    /// Identifiers produced by instantiation. Each is unique in the module.
    pub instances: FxHashSet<QualifiedName>,
}

/// Expand every template entity in place.
///
/// A dependency on a template identifier later fans out to every instance
/// through the returned aliases.
///
/// An instance identifier may not repeat and may not equal any hand-written
/// entity's identifier, wherever that entity is declared.
pub fn instantiate_templates(entities: Vec<Entity>) -> Result<Expansion, ConfigError> {
    let declared: FxHashMap<QualifiedName, EntityKind> = entities
        .iter()
        .filter(|e| !matches!(e, Entity::Template(_)))
        .map(|e| (e.id().clone(), e.kind()))
        .collect();

    let mut expansion = Expansion {
        entities: Vec::with_capacity(entities.len()),
        aliases: Vec::new(),
        instances: FxHashSet::default(),
    };

    for entity in entities {
        let Entity::Template(template) = entity else {
            expansion.entities.push(entity);
            continue;
        };

        let mut instance_ids = Vec::with_capacity(template.instantiations.len());
        for request in &template.instantiations {
            let instance = instantiate_template(&template, request)?;
            let id = instance.id().clone();
            if let Some(kind) = declared.get(&id) {
                return Err(ConfigError::DuplicateEntity {
                    id,
                    existing: kind.to_string(),
                    duplicate: "instance".to_string(),
                });
            }
            if !expansion.instances.insert(id.clone()) {
                return Err(ConfigError::DuplicateEntity {
                    id,
                    existing: "instance".to_string(),
                    duplicate: "instance".to_string(),
                });
            }
            instance_ids.push(id);
            expansion.entities.push(instance);
        }
        tracing::debug!(
            template = %template.id,
            instances = instance_ids.len(),
            "expanded template"
        );
        expansion.aliases.push((template.id.clone(), instance_ids));
    }

    Ok(expansion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{
        ClassEntry, FunctionEntry, Instantiation, Overload, ReturnType, TemplateBody,
        TemplateEntry, TemplateParam, TypeRef,
    };

    fn template_with(instances: &[(&str, &str, &str)]) -> Entity {
        let mut template = TemplateEntry::new(
            "Test_Template",
            vec![TemplateParam::new("T"), TemplateParam::new("K")],
            TemplateBody::Class(ClassEntry::new("Test_Template")),
        );
        for (suffix, t, k) in instances {
            template = template.with_instantiation(Instantiation::new(
                *suffix,
                vec![TypeRef::primitive(*t), TypeRef::primitive(*k)],
            ));
        }
        template.into()
    }

    #[test]
    fn instances_replace_template_in_place() {
        let entities = vec![
            ClassEntry::new("Before").into(),
            template_with(&[("_IntInt", "int", "int"), ("_DoubleInt", "double", "int")]),
            ClassEntry::new("After").into(),
        ];
        let expansion = instantiate_templates(entities).unwrap();
        let ids: Vec<String> = expansion.entities.iter().map(|e| e.id().to_string()).collect();
        assert_eq!(
            ids,
            vec!["Before", "Test_Template_IntInt", "Test_Template_DoubleInt", "After"]
        );
        assert_eq!(expansion.aliases.len(), 1);
        assert_eq!(expansion.aliases[0].1.len(), 2);
    }

    #[test]
    fn instances_do_not_share_state() {
        let expansion = instantiate_templates(vec![template_with(&[
            ("_IntInt", "int", "int"),
            ("_DoubleInt", "double", "int"),
        ])])
        .unwrap();
        let natives: Vec<String> = expansion
            .entities
            .iter()
            .map(|e| e.as_class().unwrap().native_spelling())
            .collect();
        assert_eq!(
            natives,
            vec!["Test_Template<int, int>", "Test_Template<double, int>"]
        );
    }

    #[test]
    fn missing_argument_aborts() {
        let template = TemplateEntry::new(
            "Box",
            vec![TemplateParam::new("T")],
            TemplateBody::Class(ClassEntry::new("Box")),
        )
        .with_instantiation(Instantiation::new("_Empty", vec![]));
        let result = instantiate_templates(vec![template.into()]);
        assert!(matches!(
            result,
            Err(ConfigError::MissingTemplateArgument { .. })
        ));
    }

    #[test]
    fn repeated_suffix_rejected() {
        let result = instantiate_templates(vec![template_with(&[
            ("_x", "int", "int"),
            ("_x", "double", "int"),
        ])]);
        match result {
            Err(ConfigError::DuplicateEntity { id, existing, duplicate }) => {
                assert_eq!(id, QualifiedName::global("Test_Template_x"));
                assert_eq!(existing, "instance");
                assert_eq!(duplicate, "instance");
            }
            other => panic!("Expected DuplicateEntity, got {:?}", other),
        }
    }

    fn convert_template() -> Entity {
        TemplateEntry::new(
            "convert",
            vec![TemplateParam::new("T")],
            TemplateBody::Function(
                FunctionEntry::new("convert")
                    .with_overload(Overload::new(ReturnType::value(TypeRef::primitive("T")))),
            ),
        )
        .with_instantiation(Instantiation::new("_double", vec![TypeRef::primitive("double")]))
        .into()
    }

    fn hand_written_convert() -> Entity {
        FunctionEntry::new("convert_double")
            .with_overload(Overload::new(ReturnType::value(TypeRef::primitive("double"))))
            .into()
    }

    #[test]
    fn instance_cannot_shadow_hand_written_entity() {
        for entities in [
            vec![hand_written_convert(), convert_template()],
            vec![convert_template(), hand_written_convert()],
        ] {
            match instantiate_templates(entities) {
                Err(ConfigError::DuplicateEntity { id, existing, duplicate }) => {
                    assert_eq!(id, QualifiedName::global("convert_double"));
                    assert_eq!(existing, "function");
                    assert_eq!(duplicate, "instance");
                }
                other => panic!("Expected DuplicateEntity, got {:?}", other),
            }
        }
    }

    #[test]
    fn instances_are_recorded() {
        let expansion = instantiate_templates(vec![convert_template()]).unwrap();
        assert!(expansion.instances.contains(&QualifiedName::global("convert_double")));
        assert_eq!(expansion.instances.len(), 1);
    }
}
