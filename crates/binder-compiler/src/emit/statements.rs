//! Registration statements for each planned entity.

use std::fmt::Write;

use crate::plan::{
    ArgPlan, CallablePlan, ClassPlan, EntityPlan, EnumPlan, FunctionPlan, PlanKind,
};

/// Render one entity block, ending with a newline.
pub fn render_entity(entity: &EntityPlan) -> String {
    let marker = entity.id.flattened().to_uppercase();
    match &entity.kind {
        PlanKind::Class(class) => render_class(&marker, class),
        PlanKind::Enum(e) => render_enum(&marker, e),
        PlanKind::Function(function) => render_function(&marker, function),
        PlanKind::Typedef => format!("// TYPEDEF: {marker}\n"),
    }
}

fn render_class(marker: &str, class: &ClassPlan) -> String {
    let mut out = format!("// CLASS: {marker}\n");
    push_fragments(&mut out, "Before type", &class.before_type);
    if !class.before_type.is_empty() {
        out.push('\n');
    }

    let mut template_args = vec![class.native.clone()];
    template_args.extend(class.holder.iter().cloned());
    template_args.extend(class.bases.iter().cloned());
    let _ = writeln!(
        out,
        "py::class_<{}> {}(mod, \"{}\", \"{}\");",
        template_args.join(", "),
        class.variable,
        class.python_name,
        escape(&class.doc)
    );

    if !class.constructors.is_empty() {
        out.push_str("\n// Constructors\n");
        for ctor in &class.constructors {
            let _ = writeln!(
                out,
                "{}.def(py::init<{}>(){});",
                class.variable,
                ctor.types.join(", "),
                render_args(&ctor.args)
            );
        }
    }

    if !class.methods.is_empty() || class.iterable {
        out.push_str("\n// Methods\n");
        for method in &class.methods {
            out.push_str(&render_callable(&class.variable, method));
        }
        if class.iterable {
            let _ = writeln!(
                out,
                "{}.def(\"__iter__\", [](const {} &self) {{ return py::make_iterator(self.begin(), self.end()); }}, py::keep_alive<0, 1>());",
                class.variable, class.native
            );
        }
    }

    if !class.fields.is_empty() {
        out.push_str("\n// Fields\n");
        for field in &class.fields {
            let access = if field.readonly { "readonly" } else { "readwrite" };
            let _ = writeln!(
                out,
                "{}.def_{}(\"{}\", &{}, \"{}\");",
                class.variable,
                access,
                field.name,
                field.native_path,
                escape(&field.doc)
            );
        }
    }

    if !class.after_type.is_empty() {
        out.push('\n');
        push_fragments(&mut out, "After type", &class.after_type);
    }
    out
}

fn render_enum(marker: &str, e: &EnumPlan) -> String {
    let mut out = format!("// ENUM: {marker}\n");
    push_fragments(&mut out, "Before type", &e.before_type);

    if e.tagged {
        let _ = writeln!(
            out,
            "py::enum_<{}>(mod, \"{}\", \"{}\")",
            e.native,
            e.python_name,
            escape(&e.doc)
        );
        for value in &e.values {
            let _ = writeln!(out, "\t.value(\"{}\", {})", value.name, value.path);
        }
        out.push_str("\t.export_values();\n");
    } else {
        for value in &e.values {
            let _ = writeln!(
                out,
                "mod.attr(\"{}\") = py::cast(int({}));",
                value.name, value.path
            );
        }
    }

    push_fragments(&mut out, "After type", &e.after_type);
    out
}

fn render_function(marker: &str, function: &FunctionPlan) -> String {
    let mut out = format!("// FUNCTION: {marker}\n");
    for overload in &function.overloads {
        out.push_str(&render_callable("mod", overload));
    }
    out
}

/// `recv.def("name", (cast) &Native::name, "doc", args..., policy, keep_alive..., guards...);`
pub fn render_callable(receiver: &str, callable: &CallablePlan) -> String {
    let mut out = String::new();
    let def = if callable.is_static { "def_static" } else { "def" };
    let _ = write!(out, "{receiver}.{def}(\"{}\", ", callable.python_name);
    if let Some(cast) = &callable.cast {
        let _ = write!(out, "{cast} ");
    }
    let _ = write!(out, "&{}, ", callable.native_path);
    if callable.is_operator {
        out.push_str("py::is_operator(), ");
    }
    let _ = write!(out, "\"{}\"", escape(&callable.doc));
    out.push_str(&render_args(&callable.args));
    if let Some(policy) = callable.policy {
        let _ = write!(out, ", py::return_value_policy::{policy}");
    }
    for pair in &callable.keep_alive {
        let _ = write!(out, ", py::keep_alive<{}, {}>()", pair.nurse, pair.patient);
    }
    for guard in &callable.call_guards {
        let _ = write!(out, ", py::call_guard<{guard}>()");
    }
    out.push_str(");\n");
    out
}

fn render_args(args: &[ArgPlan]) -> String {
    let mut out = String::new();
    for arg in args {
        let _ = write!(out, ", py::arg(\"{}\")", arg.name);
        if let Some(default) = &arg.default {
            let _ = write!(out, " = {default}");
        }
    }
    out
}

fn push_fragments(out: &mut String, heading: &str, fragments: &[String]) {
    if fragments.is_empty() {
        return;
    }
    let _ = writeln!(out, "// {heading}");
    for fragment in fragments {
        out.push_str(fragment);
        out.push('\n');
    }
}

/// Escape text for a native string literal.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => {}
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{ConstructorPlan, EnumValuePlan, FieldPlan};
    use binder_core::{KeepAlive, ReturnPolicy};
    use pretty_assertions::assert_eq;

    fn mesh() -> ClassPlan {
        ClassPlan {
            variable: "cls_Test_Mesh".into(),
            python_name: "Test_Mesh".into(),
            native: "Test_Mesh".into(),
            holder: None,
            bases: vec![],
            doc: String::new(),
            before_type: vec![],
            constructors: vec![ConstructorPlan {
                types: vec![],
                args: vec![],
            }],
            methods: vec![CallablePlan {
                python_name: "AddNode".into(),
                native_path: "Test_Mesh::AddNode".into(),
                is_static: false,
                is_operator: false,
                cast: Some("(void (Test_Mesh::*)(const int, Test_Node *))".into()),
                doc: String::new(),
                args: vec![
                    ArgPlan { name: "id".into(), default: None },
                    ArgPlan { name: "node".into(), default: None },
                ],
                policy: None,
                keep_alive: vec![KeepAlive::new(1, 2)],
                call_guards: vec![],
            }],
            iterable: false,
            fields: vec![],
            after_type: vec![],
        }
    }

    fn entity(id: &str, kind: PlanKind) -> EntityPlan {
        EntityPlan {
            id: id.into(),
            dependencies: vec![],
            kind,
        }
    }

    #[test]
    fn class_block() {
        let text = render_entity(&entity("Test_Mesh", PlanKind::Class(mesh())));
        assert_eq!(
            text,
            "// CLASS: TEST_MESH\n\
             py::class_<Test_Mesh> cls_Test_Mesh(mod, \"Test_Mesh\", \"\");\n\
             \n\
             // Constructors\n\
             cls_Test_Mesh.def(py::init<>());\n\
             \n\
             // Methods\n\
             cls_Test_Mesh.def(\"AddNode\", (void (Test_Mesh::*)(const int, Test_Node *)) &Test_Mesh::AddNode, \"\", py::arg(\"id\"), py::arg(\"node\"), py::keep_alive<1, 2>());\n"
        );
    }

    #[test]
    fn fragments_surround_class() {
        let mut class = mesh();
        class.methods.clear();
        class.before_type = vec!["// one".into()];
        class.after_type = vec!["// two".into()];
        let text = render_entity(&entity("Test_Mesh", PlanKind::Class(class)));
        let before = text.find("// one").unwrap();
        let register = text.find("py::class_").unwrap();
        let ctor = text.find("py::init").unwrap();
        let after = text.find("// two").unwrap();
        assert!(before < register);
        assert!(ctor < after);
        assert!(text.ends_with("// After type\n// two\n"));
    }

    #[test]
    fn holder_and_bases_follow_native_type() {
        let mut class = mesh();
        class.holder = Some("std::shared_ptr<Test_Mesh>".into());
        class.bases = vec!["Test_Base".into()];
        class.doc = "A \"mesh\"\nof nodes".into();
        let text = render_entity(&entity("Test_Mesh", PlanKind::Class(class)));
        assert!(text.contains(
            "py::class_<Test_Mesh, std::shared_ptr<Test_Mesh>, Test_Base> cls_Test_Mesh(mod, \"Test_Mesh\", \"A \\\"mesh\\\"\\nof nodes\");"
        ));
    }

    #[test]
    fn tagged_enum_block() {
        let plan = EnumPlan {
            python_name: "TaggedEnum".into(),
            native: "TaggedEnum".into(),
            doc: String::new(),
            tagged: true,
            values: vec![
                EnumValuePlan { name: "A".into(), path: "TaggedEnum::A".into() },
                EnumValuePlan { name: "B".into(), path: "TaggedEnum::B".into() },
            ],
            before_type: vec![],
            after_type: vec![],
        };
        let text = render_entity(&entity("TaggedEnum", PlanKind::Enum(plan)));
        assert_eq!(
            text,
            "// ENUM: TAGGEDENUM\n\
             py::enum_<TaggedEnum>(mod, \"TaggedEnum\", \"\")\n\
             \t.value(\"A\", TaggedEnum::A)\n\
             \t.value(\"B\", TaggedEnum::B)\n\
             \t.export_values();\n"
        );
    }

    #[test]
    fn untagged_enum_block() {
        let plan = EnumPlan {
            python_name: "Flags".into(),
            native: "Flags".into(),
            doc: String::new(),
            tagged: false,
            values: vec![
                EnumValuePlan { name: "A".into(), path: "A".into() },
                EnumValuePlan { name: "B".into(), path: "B".into() },
            ],
            before_type: vec![],
            after_type: vec![],
        };
        let text = render_entity(&entity("Flags", PlanKind::Enum(plan)));
        assert_eq!(
            text,
            "// ENUM: FLAGS\n\
             mod.attr(\"A\") = py::cast(int(A));\n\
             mod.attr(\"B\") = py::cast(int(B));\n"
        );
    }

    #[test]
    fn static_operator_and_policy_statements() {
        let mut callable = CallablePlan {
            python_name: "__add__".into(),
            native_path: "Vec::operator+".into(),
            is_static: false,
            is_operator: true,
            cast: None,
            doc: "Sum".into(),
            args: vec![ArgPlan { name: "other".into(), default: None }],
            policy: Some(ReturnPolicy::ReferenceInternal),
            keep_alive: vec![],
            call_guards: vec![],
        };
        assert_eq!(
            render_callable("cls_Vec", &callable),
            "cls_Vec.def(\"__add__\", &Vec::operator+, py::is_operator(), \"Sum\", py::arg(\"other\"), py::return_value_policy::reference_internal);\n"
        );

        callable.is_static = true;
        callable.is_operator = false;
        callable.python_name = "Origin_".into();
        callable.args = vec![ArgPlan { name: "scale".into(), default: Some("1.0".into()) }];
        callable.policy = None;
        assert_eq!(
            render_callable("cls_Vec", &callable),
            "cls_Vec.def_static(\"Origin_\", &Vec::operator+, \"Sum\", py::arg(\"scale\") = 1.0);\n"
        );
    }

    #[test]
    fn call_guards_close_the_statement() {
        let mut class = mesh();
        class.methods[0].call_guards = vec!["py::gil_scoped_release".into()];
        let text = render_callable(&class.variable, &class.methods[0]);
        assert!(text.ends_with(
            "py::keep_alive<1, 2>(), py::call_guard<py::gil_scoped_release>());\n"
        ));
    }

    #[test]
    fn iterable_class_gets_iter() {
        let mut class = mesh();
        class.iterable = true;
        let text = render_entity(&entity("Test_Mesh", PlanKind::Class(class)));
        assert!(text.ends_with(
            "cls_Test_Mesh.def(\"__iter__\", [](const Test_Mesh &self) { return py::make_iterator(self.begin(), self.end()); }, py::keep_alive<0, 1>());\n"
        ));
    }

    #[test]
    fn fields_after_methods() {
        let mut class = mesh();
        class.fields = vec![FieldPlan {
            name: "count".into(),
            native_path: "Test_Mesh::count".into(),
            readonly: true,
            doc: String::new(),
        }];
        let text = render_entity(&entity("Test_Mesh", PlanKind::Class(class)));
        let methods = text.find("// Methods").unwrap();
        let field = text
            .find("cls_Test_Mesh.def_readonly(\"count\", &Test_Mesh::count, \"\");")
            .unwrap();
        assert!(methods < field);
    }

    #[test]
    fn typedef_is_marker_only() {
        assert_eq!(
            render_entity(&entity("ns::Handle", PlanKind::Typedef)),
            "// TYPEDEF: NS_HANDLE\n"
        );
    }
}
