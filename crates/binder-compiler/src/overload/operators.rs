//! Native operator names mapped to host-language special methods.

/// Check whether a native member name is an operator (`operator+`,
/// `operator()`), as opposed to an identifier that merely starts with
/// "operator" (`operatorCount`).
pub fn is_operator_name(name: &str) -> bool {
    match name.strip_prefix("operator") {
        Some(rest) => rest
            .chars()
            .next()
            .is_some_and(|c| !(c.is_ascii_alphanumeric() || c == '_')),
        None => false,
    }
}

/// Special-method name for a native member operator.
///
/// `arity` is the explicit parameter count; it separates unary `-x` from
/// binary `a - b`. Returns `None` for operators with no counterpart
/// (assignment, conversion, `->`, ...).
pub fn python_operator_name(name: &str, arity: usize) -> Option<&'static str> {
    let op = name.strip_prefix("operator")?.trim();
    let mapped = match (op, arity) {
        ("+", 0) => "__pos__",
        ("-", 0) => "__neg__",
        ("+", _) => "__add__",
        ("-", _) => "__sub__",
        ("*", _) => "__mul__",
        ("/", _) => "__truediv__",
        ("+=", _) => "__iadd__",
        ("-=", _) => "__isub__",
        ("*=", _) => "__imul__",
        ("/=", _) => "__itruediv__",
        ("==", _) => "__eq__",
        ("!=", _) => "__ne__",
        ("<", _) => "__lt__",
        ("<=", _) => "__le__",
        (">", _) => "__gt__",
        (">=", _) => "__ge__",
        ("()", _) => "__call__",
        ("[]", _) => "__getitem__",
        ("++", _) => "plus_plus",
        ("--", _) => "minus_minus",
        (">>", _) => "bits_right",
        ("<<", _) => "bits_left",
        _ => return None,
    };
    Some(mapped)
}
