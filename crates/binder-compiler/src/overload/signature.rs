//! Disambiguating casts.
//!
//! The host framework picks a member function pointer by its exact type, so
//! every overload gets a C-style cast spelling that type out:
//!
//! ```text
//! (R (Owner::*)(P1, P2) const &)   non-static member
//! (R (*)(P1, P2))                  static member or free function
//! ```

use binder_core::{Overload, normalize_spelling};

/// Render the cast that selects exactly this overload.
///
/// `owner` is the native spelling of the owning class; `None` for free
/// functions. Static members always use a plain function pointer.
pub fn render_cast(owner: Option<&str>, overload: &Overload) -> String {
    let params = param_list(overload);
    let ret = &overload.ret.ty.spelling;
    match owner {
        Some(owner) if !overload.is_static => {
            let mut qualifiers = String::new();
            if overload.is_const {
                qualifiers.push_str(" const");
            }
            if let Some(q) = overload.ref_qualifier {
                qualifiers.push(' ');
                qualifiers.push_str(q.as_str());
            }
            format!("({ret} ({owner}::*)({params}){qualifiers})")
        }
        _ => format!("({ret} (*)({params}))"),
    }
}

/// Verbatim parameter spellings joined for a signature.
pub fn param_list(overload: &Overload) -> String {
    overload
        .params
        .iter()
        .map(|p| p.ty.spelling.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Human-readable signature used in diagnostics.
pub fn signature_text(overload: &Overload) -> String {
    let params = overload
        .params
        .iter()
        .map(|p| normalize_spelling(&p.ty.spelling))
        .collect::<Vec<_>>()
        .join(", ");
    let mut qualifiers = String::new();
    if overload.is_const {
        qualifiers.push_str(" const");
    }
    if let Some(q) = overload.ref_qualifier {
        qualifiers.push(' ');
        qualifiers.push_str(q.as_str());
    }
    if qualifiers.is_empty() {
        params
    } else {
        format!("({params}){qualifiers}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{Param, RefQualifier, ReturnType, TypeRef};

    fn add_node() -> Overload {
        Overload::new(ReturnType::void())
            .with_param(Param::new("id", TypeRef::primitive("const int")))
            .with_param(Param::new("node", TypeRef::declared("Test_Node *", "Test_Node")))
    }

    #[test]
    fn member_cast() {
        assert_eq!(
            render_cast(Some("Test_Mesh"), &add_node()),
            "(void (Test_Mesh::*)(const int, Test_Node *))"
        );
    }

    #[test]
    fn const_ref_qualified_member_cast() {
        let overload = Overload::new(ReturnType::value(TypeRef::primitive("int")))
            .as_const()
            .with_ref_qualifier(RefQualifier::LValue);
        assert_eq!(
            render_cast(Some("Shape"), &overload),
            "(int (Shape::*)() const &)"
        );
    }

    #[test]
    fn static_and_free_casts() {
        let overload = add_node().as_static();
        assert_eq!(
            render_cast(Some("Test_Mesh"), &overload),
            "(void (*)(const int, Test_Node *))"
        );
        assert_eq!(
            render_cast(None, &add_node()),
            "(void (*)(const int, Test_Node *))"
        );
    }

    #[test]
    fn diagnostic_signature() {
        assert_eq!(signature_text(&add_node()), "const int, Test_Node*");
        let konst = Overload::new(ReturnType::void())
            .with_param(Param::new("x", TypeRef::primitive("int")))
            .as_const();
        assert_eq!(signature_text(&konst), "(int) const");
    }
}
