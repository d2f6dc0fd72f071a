//! Directive file parsing.
//!
//! The side-table is written one directive per line:
//!
//! ```text
//! # comment
//! +before_module Test --> py::module::import("OCCT.Standard");
//! +after_module Test --> // trailing text
//! +before_type Test_Mesh --> // text before the class
//! +after_type Test_Mesh --> // text after the class
//! +return_policy Test_Mesh::Nodes --> reference_internal
//! +keep_alive Test_Mesh::AddNode --> 1, 2
//! +pname Test_Mesh --> Mesh
//! +header Test: Test_Extra.hxx
//! +nodelete Test_Mesh
//! +cguard Test_Mesh::Perform --> py::gil_scoped_release
//! +skip Test_Internal
//! -class Test_Hidden
//! -enum Test_HiddenKind
//! -typedef Test_HiddenHandle
//! -function Test_Mesh::DumpJson
//! -function* DumpJson
//! -field Test_Mesh::cache
//! -base Test_Mesh --> Test_Transient
//! ```
//!
//! `-function*` names a method by its bare name and applies to every class.

use std::path::Path;

use binder_compiler::{Anchor, SideTable};
use binder_core::{KeepAlive, ReturnPolicy};

use crate::error::{BinderError, Result};

/// A line that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}: {message}")]
pub struct DirectiveError {
    /// One-based line number.
    pub line: usize,
    pub message: String,
}

impl DirectiveError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Read and parse a directive file.
pub fn load_directives(path: impl AsRef<Path>) -> Result<SideTable> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|e| BinderError::io(path, e))?;
    parse_directives(&text).map_err(|e| BinderError::Directive {
        path: path.to_path_buf(),
        line: e.line,
        message: e.message,
    })
}

/// Parse directive text into a side-table.
///
/// The table is not validated here; that needs the prepared modules.
pub fn parse_directives(text: &str) -> std::result::Result<SideTable, DirectiveError> {
    let mut table = SideTable::new();

    for (index, raw) in text.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (directive, rest) = match line.split_once(char::is_whitespace) {
            Some((directive, rest)) => (directive, rest.trim()),
            None => (line, ""),
        };

        match directive {
            "+before_module" => {
                let (module, text) = arrow(rest, line_no)?;
                table.add_fragment(module, Anchor::Prologue, text);
            }
            "+after_module" => {
                let (module, text) = arrow(rest, line_no)?;
                table.add_fragment(module, Anchor::Epilogue, text);
            }
            "+before_type" => {
                let (target, text) = arrow(rest, line_no)?;
                table.add_fragment(target, Anchor::BeforeType, text);
            }
            "+after_type" => {
                let (target, text) = arrow(rest, line_no)?;
                table.add_fragment(target, Anchor::AfterType, text);
            }
            "+return_policy" => {
                let (target, value) = arrow(rest, line_no)?;
                let policy = ReturnPolicy::parse(value).ok_or_else(|| {
                    DirectiveError::new(line_no, format!("unknown return policy '{value}'"))
                })?;
                table.set_policy(target, policy);
            }
            "+keep_alive" => {
                let (target, value) = arrow(rest, line_no)?;
                let pair = KeepAlive::parse(value).ok_or_else(|| {
                    DirectiveError::new(
                        line_no,
                        format!("keep_alive expects 'nurse, patient', got '{value}'"),
                    )
                })?;
                table.add_keep_alive(target, pair);
            }
            "+pname" => {
                let (target, name) = arrow(rest, line_no)?;
                table.set_python_name(target, name);
            }
            "+header" => {
                let (module, header) = rest
                    .split_once(':')
                    .map(|(m, h)| (m.trim(), h.trim()))
                    .filter(|(m, h)| !m.is_empty() && !h.is_empty())
                    .ok_or_else(|| DirectiveError::new(line_no, "expected 'Module: header'"))?;
                table.add_header(module, header);
            }
            "+nodelete" => {
                if rest.is_empty() {
                    return Err(DirectiveError::new(line_no, "nodelete needs a class"));
                }
                table.add_nodelete(rest);
            }
            "+cguard" => {
                let (target, guard) = arrow(rest, line_no)?;
                if guard.is_empty() {
                    return Err(DirectiveError::new(line_no, "cguard needs a guard type"));
                }
                table.add_call_guard(target, guard);
            }
            "+skip" => table.add_skip(single(rest, line_no, directive)?),
            "-class" => table.exclude_class(single(rest, line_no, directive)?),
            "-enum" => table.exclude_enum(single(rest, line_no, directive)?),
            "-typedef" => table.exclude_typedef(single(rest, line_no, directive)?),
            "-function" => table.exclude_function(single(rest, line_no, directive)?),
            "-function*" => table.exclude_method_name(single(rest, line_no, directive)?),
            "-field" => table.exclude_field(single(rest, line_no, directive)?),
            "-base" => {
                let (class, base) = arrow(rest, line_no)?;
                if base.is_empty() {
                    return Err(DirectiveError::new(line_no, "missing base after '-->'"));
                }
                table.exclude_base(class, base);
            }
            other => {
                return Err(DirectiveError::new(
                    line_no,
                    format!("unknown directive '{other}'"),
                ));
            }
        }
    }

    Ok(table)
}

/// The lone target of a directive that takes nothing else.
fn single<'a>(
    rest: &'a str,
    line_no: usize,
    directive: &str,
) -> std::result::Result<&'a str, DirectiveError> {
    if rest.is_empty() {
        return Err(DirectiveError::new(line_no, format!("{directive} needs a target")));
    }
    Ok(rest)
}

/// Split `target --> value`, both sides trimmed and non-empty target.
fn arrow(rest: &str, line_no: usize) -> std::result::Result<(&str, &str), DirectiveError> {
    let (target, value) = rest
        .split_once("-->")
        .ok_or_else(|| DirectiveError::new(line_no, "expected 'target --> value'"))?;
    let target = target.trim();
    if target.is_empty() {
        return Err(DirectiveError::new(line_no, "missing target before '-->'"));
    }
    Ok((target, value.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragments_by_anchor() {
        let table = parse_directives(
            "# leading comment\n\
             \n\
             +before_module Test --> // prologue\n\
             +after_module Test --> // epilogue\n\
             +before_type Test_Mesh --> // before\n\
             +after_type Test_Mesh --> // after 1\n\
             +after_type Test_Mesh --> // after 2\n",
        )
        .unwrap();
        assert_eq!(table.fragments.get("Test", Anchor::Prologue), ["// prologue"]);
        assert_eq!(table.fragments.get("Test", Anchor::Epilogue), ["// epilogue"]);
        assert_eq!(table.fragments.get("Test_Mesh", Anchor::BeforeType), ["// before"]);
        assert_eq!(
            table.fragments.get("Test_Mesh", Anchor::AfterType),
            ["// after 1", "// after 2"]
        );
    }

    #[test]
    fn overrides() {
        let table = parse_directives(
            "+return_policy Test_Mesh::Nodes --> reference_internal\n\
             +keep_alive Test_Mesh::AddNode --> 1, 2\n\
             +pname Test_Mesh --> Mesh\n\
             +header Test: Test_Extra.hxx\n\
             +nodelete Test_Mesh\n",
        )
        .unwrap();
        assert_eq!(
            table.policy("Test_Mesh::Nodes"),
            Some(ReturnPolicy::ReferenceInternal)
        );
        assert_eq!(table.keep_alive("Test_Mesh::AddNode"), [KeepAlive::new(1, 2)]);
        assert_eq!(table.python_name("Test_Mesh"), Some("Mesh"));
        assert_eq!(table.headers("Test"), ["Test_Extra.hxx"]);
        assert!(table.is_nodelete("Test_Mesh"));
    }

    #[test]
    fn exclusions_and_guards() {
        let table = parse_directives(
            "+cguard Test_Mesh::Perform --> py::gil_scoped_release\n\
             +skip Test_Internal\n\
             -class Test_Hidden\n\
             -enum Test_HiddenKind\n\
             -typedef Test_HiddenHandle\n\
             -function Test_Mesh::DumpJson\n\
             -function* Dump\n\
             -field Test_Mesh::cache\n\
             -base Test_Mesh --> Test_Transient\n",
        )
        .unwrap();
        assert_eq!(
            table.call_guards("Test_Mesh::Perform"),
            ["py::gil_scoped_release"]
        );
        assert!(table.is_excluded("Test_Internal"));
        assert!(table.is_excluded("Test_Hidden"));
        assert!(table.is_excluded("Test_HiddenKind"));
        assert!(table.is_excluded("Test_HiddenHandle"));
        assert!(table.is_method_excluded("Test_Mesh::DumpJson", "DumpJson"));
        assert!(table.is_method_excluded("Other::Dump", "Dump"));
        assert!(!table.is_method_excluded("Test_Mesh::Perform", "Perform"));
        assert!(table.is_field_excluded("Test_Mesh::cache"));
        assert!(table.is_base_excluded("Test_Mesh", "Test_Transient"));
        assert!(table.is_base_excluded("Other", "Test_Hidden"));
        assert!(!table.is_base_excluded("Other", "Test_Transient"));
    }

    #[test]
    fn exclusion_needs_target() {
        let err = parse_directives("-class Test_Hidden\n-field\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.to_string(), "line 2: -field needs a target");
    }

    #[test]
    fn fragment_text_keeps_inner_arrows() {
        let table = parse_directives("+after_type A --> x --> y\n").unwrap();
        assert_eq!(table.fragments.get("A", Anchor::AfterType), ["x --> y"]);
    }

    #[test]
    fn unknown_directive_names_line() {
        let err = parse_directives("# ok\n+pname A --> B\n+frobnicate A\n").unwrap_err();
        assert_eq!(err.line, 3);
        assert!(err.message.contains("+frobnicate"));
        assert_eq!(err.to_string(), "line 3: unknown directive '+frobnicate'");
    }

    #[test]
    fn bad_policy_rejected() {
        let err = parse_directives("+return_policy A::f --> borrow\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("borrow"));
    }

    #[test]
    fn missing_arrow_rejected() {
        match parse_directives("+pname Test_Mesh Mesh") {
            Err(DirectiveError { line: 1, .. }) => {}
            other => panic!("Expected DirectiveError on line 1, got {:?}", other.map(|_| ())),
        }
    }
}
