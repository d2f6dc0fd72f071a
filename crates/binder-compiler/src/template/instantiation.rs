//! Template instantiation.
//!
//! Each requested instantiation becomes an ordinary entity with a
//! synthesized identifier (template identifier plus the instantiation
//! suffix). From here on the instance is indistinguishable from a
//! hand-written entity.

use binder_core::{
    ClassEntry, ConfigError, Constructor, Entity, FieldEntry, FunctionEntry, Instantiation,
    MethodEntry, Overload, Param, QualifiedName, TemplateBody, TemplateEntry, TypedefEntry,
};

use super::substitution::{
    SubstitutionMap, build_substitution_map, ordered_args, substitute_identifier,
    substitute_spelling, substitute_type,
};

/// Format the native spelling of an instance (`Pair<int, double>`).
pub fn format_template_instance_name(base: &str, args: &[&binder_core::TypeRef]) -> String {
    let args: Vec<&str> = args.iter().map(|a| a.spelling.as_str()).collect();
    format!("{}<{}>", base, args.join(", "))
}

/// Instantiate one request of a template.
pub fn instantiate_template(
    template: &TemplateEntry,
    request: &Instantiation,
) -> Result<Entity, ConfigError> {
    let instance_id = template.id.with_suffix(&request.suffix);
    let map = build_substitution_map(template, &request.args, &instance_id)?;
    let native = format_template_instance_name(&template.id.to_string(), &ordered_args(template, &map));

    let mut dependencies: Vec<QualifiedName> = template
        .dependencies
        .iter()
        .filter_map(|d| substitute_identifier(d, &map))
        .collect();
    // Arguments naming declared entities must be registered first.
    dependencies.extend(ordered_args(template, &map).into_iter().filter_map(|a| a.decl.clone()));

    let entity = match &template.body {
        TemplateBody::Class(body) => {
            let mut class = instantiate_class(body, &template.id, &instance_id, &map);
            class.native_type = Some(match &body.native_type {
                Some(spelling) => substitute_spelling(spelling, &map),
                None => native,
            });
            class.name = request.name.clone().or(class.name);
            if class.doc.is_none() {
                class.doc = template.doc.clone();
            }
            merge_dependencies(&mut class.dependencies, dependencies, &instance_id);
            Entity::Class(class)
        }
        TemplateBody::Function(body) => {
            let mut function = instantiate_function(body, &instance_id, &map);
            function.native_name = Some(match &body.native_name {
                Some(spelling) => substitute_spelling(spelling, &map),
                None => native,
            });
            function.name = request.name.clone().or(function.name);
            if function.doc.is_none() {
                function.doc = template.doc.clone();
            }
            merge_dependencies(&mut function.dependencies, dependencies, &instance_id);
            Entity::Function(function)
        }
    };

    tracing::trace!(template = %template.id, instance = %instance_id, "instantiated template");
    Ok(entity)
}

fn merge_dependencies(
    target: &mut Vec<QualifiedName>,
    extra: Vec<QualifiedName>,
    instance_id: &QualifiedName,
) {
    for dep in extra {
        if &dep != instance_id && !target.contains(&dep) {
            target.push(dep);
        }
    }
}

fn instantiate_class(
    body: &ClassEntry,
    template_id: &QualifiedName,
    instance_id: &QualifiedName,
    map: &SubstitutionMap,
) -> ClassEntry {
    ClassEntry {
        id: instance_id.clone(),
        name: body.name.clone(),
        doc: body.doc.clone(),
        native_type: None,
        holder: body.holder.as_ref().map(|h| substitute_spelling(h, map)),
        bases: body
            .bases
            .iter()
            .filter_map(|b| substitute_identifier(b, map))
            .collect(),
        constructors: body
            .constructors
            .iter()
            .map(|c| Constructor {
                params: substitute_params(&c.params, map),
                visibility: c.visibility,
            })
            .collect(),
        methods: body
            .methods
            .iter()
            .map(|m| MethodEntry {
                name: m.name.clone(),
                doc: m.doc.clone(),
                overloads: m.overloads.iter().map(|o| substitute_overload(o, map)).collect(),
            })
            .collect(),
        fields: body
            .fields
            .iter()
            .map(|f| FieldEntry {
                ty: substitute_type(&f.ty, map),
                ..f.clone()
            })
            .collect(),
        typedefs: body
            .typedefs
            .iter()
            .map(|t| TypedefEntry {
                id: rehome(&t.id, template_id, instance_id),
                target: substitute_type(&t.target, map),
            })
            .collect(),
        dependencies: body
            .dependencies
            .iter()
            .filter_map(|d| substitute_identifier(d, map))
            .collect(),
        before_type: body.before_type.clone(),
        after_type: body.after_type.clone(),
        is_abstract: body.is_abstract,
    }
}

fn instantiate_function(
    body: &FunctionEntry,
    instance_id: &QualifiedName,
    map: &SubstitutionMap,
) -> FunctionEntry {
    FunctionEntry {
        id: instance_id.clone(),
        name: body.name.clone(),
        native_name: None,
        doc: body.doc.clone(),
        overloads: body
            .overloads
            .iter()
            .map(|o| substitute_overload(o, map))
            .collect(),
        dependencies: body
            .dependencies
            .iter()
            .filter_map(|d| substitute_identifier(d, map))
            .collect(),
    }
}

fn substitute_overload(overload: &Overload, map: &SubstitutionMap) -> Overload {
    let mut out = overload.clone();
    out.params = substitute_params(&overload.params, map);
    out.ret.ty = substitute_type(&overload.ret.ty, map);
    out
}

fn substitute_params(params: &[Param], map: &SubstitutionMap) -> Vec<Param> {
    params
        .iter()
        .map(|p| Param {
            name: p.name.clone(),
            ty: substitute_type(&p.ty, map),
            default: p.default.as_ref().map(|d| substitute_spelling(d, map)),
        })
        .collect()
}

/// Move a nested identifier from the template scope into the instance scope.
fn rehome(id: &QualifiedName, template_id: &QualifiedName, instance_id: &QualifiedName) -> QualifiedName {
    match id.parent() {
        Some(parent) if &parent == template_id => instance_id.child(id.simple_name()),
        _ => id.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{RefCategory, ReturnType, TemplateParam, TypeRef};

    fn pair() -> TemplateEntry {
        let body = ClassEntry::new("Test_Template")
            .with_constructor(Constructor::new())
            .with_method(
                MethodEntry::new("First").with_overload(
                    Overload::new(ReturnType::with_category(
                        TypeRef::declared("T &", "T"),
                        RefCategory::MutableReference,
                    ))
                    .with_param(Param::new("other", TypeRef::primitive("const K &"))),
                ),
            )
            .with_typedef(TypedefEntry::new(
                "Test_Template::value_type",
                TypeRef::declared("T", "T"),
            ));
        TemplateEntry::new(
            "Test_Template",
            vec![
                TemplateParam::new("T"),
                TemplateParam::new("K").with_default(TypeRef::primitive("int")),
            ],
            TemplateBody::Class(body),
        )
    }

    #[test]
    fn class_instance_is_concrete() {
        let template = pair();
        let request = Instantiation::new(
            "_NodeInt",
            vec![TypeRef::declared("Test_Node", "Test_Node")],
        );
        let entity = instantiate_template(&template, &request).unwrap();
        let class = entity.as_class().unwrap();

        assert_eq!(class.id.to_string(), "Test_Template_NodeInt");
        assert_eq!(class.native_spelling(), "Test_Template<Test_Node, int>");
        let overload = &class.methods[0].overloads[0];
        assert_eq!(overload.ret.ty.spelling, "Test_Node &");
        assert_eq!(overload.ret.ty.decl, Some("Test_Node".into()));
        assert_eq!(overload.params[0].ty.spelling, "const int &");
        assert_eq!(class.typedefs[0].id.to_string(), "Test_Template_NodeInt::value_type");
        assert_eq!(class.dependencies, vec![QualifiedName::global("Test_Node")]);
    }

    #[test]
    fn request_name_overrides_display_name() {
        let template = pair();
        let request =
            Instantiation::new("_IntInt", vec![TypeRef::primitive("int")]).with_name("IntPair");
        let entity = instantiate_template(&template, &request).unwrap();
        assert_eq!(entity.display_name(), "IntPair");
    }

    #[test]
    fn function_instance_gets_native_name() {
        let body = FunctionEntry::new("convert").with_overload(
            Overload::new(ReturnType::value(TypeRef::primitive("T")))
                .with_param(Param::new("value", TypeRef::primitive("const T &"))),
        );
        let template = TemplateEntry::new(
            "convert",
            vec![TemplateParam::new("T")],
            TemplateBody::Function(body),
        );
        let request = Instantiation::new("_double", vec![TypeRef::primitive("double")]);
        let entity = instantiate_template(&template, &request).unwrap();
        let function = entity.as_function().unwrap();
        assert_eq!(function.native_spelling(), "convert<double>");
        assert_eq!(function.overloads[0].ret.ty.spelling, "double");
        assert_eq!(entity.display_name(), "convert_double");
    }
}
