//! Error and diagnostic types for binding generation.
//!
//! ## Hierarchy
//!
//! ```text
//! ConfigError - fatal structural problems in the entity model or side-table
//! Warning     - advisory diagnostics that never block output
//! ```
//!
//! I/O and input-format errors are wrapped by the driver crate, which owns
//! file handling.

use std::fmt;

use thiserror::Error;

use crate::QualifiedName;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Fatal configuration errors.
///
/// Raised by the stage that detects them; a run that produces one writes no
/// output at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Entities form a must-be-declared-before cycle.
    #[error("cyclic dependency: {}", format_cycle(.cycle))]
    CyclicDependency {
        /// Identifiers on the cycle, in edge order, first not repeated.
        cycle: Vec<QualifiedName>,
    },

    /// A dependency edge names an identifier that is not in the module.
    #[error("'{entity}' depends on unknown identifier '{missing}'")]
    UnresolvedDependency {
        entity: QualifiedName,
        missing: QualifiedName,
    },

    /// Two entities share an identifier.
    #[error("duplicate identifier '{id}': already declared as {existing}, redeclared as {duplicate}")]
    DuplicateEntity {
        id: QualifiedName,
        existing: String,
        duplicate: String,
    },

    /// Overloads identical in parameters and constness differ only in return type.
    #[error(
        "overloads of '{owner}::{name}' differ only in return type ({first_return} vs {second_return}) for signature ({signature})"
    )]
    AmbiguousReturnOverload {
        owner: String,
        name: String,
        signature: String,
        first_return: String,
        second_return: String,
    },

    /// The same signature is declared twice.
    #[error("duplicate overload '{owner}::{name}({signature})'")]
    DuplicateOverload {
        owner: String,
        name: String,
        signature: String,
    },

    /// A function or method has no overloads at all.
    #[error("'{owner}::{name}' has no overloads")]
    EmptyOverloadSet { owner: String, name: String },

    /// A template slot with no default was not given an argument.
    #[error("instantiation '{instance}' of template '{template}' is missing an argument for '{slot}'")]
    MissingTemplateArgument {
        template: QualifiedName,
        instance: QualifiedName,
        slot: String,
    },

    /// An instantiation supplied more arguments than there are slots.
    #[error("instantiation '{instance}' of template '{template}' expects at most {expected} arguments, got {got}")]
    TooManyTemplateArguments {
        template: QualifiedName,
        instance: QualifiedName,
        expected: usize,
        got: usize,
    },

    /// An injected fragment targets an entity that does not exist.
    #[error("fragment for anchor '{anchor}' targets unknown entity '{target}'")]
    UnknownAnchorTarget { target: String, anchor: String },

    /// A policy or name override targets something that does not exist.
    #[error("{directive} override targets unknown '{target}'")]
    UnknownOverrideTarget { target: String, directive: String },

    /// Two values would be exported under one name in the same scope.
    #[error("name '{name}' is exported by both '{first}' and '{second}'")]
    DuplicateExport {
        name: String,
        first: QualifiedName,
        second: QualifiedName,
    },

    /// Unit capacity must be at least one.
    #[error("module '{module}' declares a zero emission-unit capacity")]
    InvalidCapacity { module: String },
}

fn format_cycle(cycle: &[QualifiedName]) -> String {
    let mut parts: Vec<String> = cycle.iter().map(ToString::to_string).collect();
    if let Some(first) = cycle.first() {
        parts.push(first.to_string());
    }
    parts.join(" -> ")
}

impl ConfigError {
    /// Identifiers this error names, for tooling that highlights entities.
    pub fn identifiers(&self) -> Vec<String> {
        match self {
            ConfigError::CyclicDependency { cycle } => cycle.iter().map(ToString::to_string).collect(),
            ConfigError::UnresolvedDependency { entity, missing } => {
                vec![entity.to_string(), missing.to_string()]
            }
            ConfigError::DuplicateEntity { id, .. } => vec![id.to_string()],
            ConfigError::AmbiguousReturnOverload { owner, name, .. }
            | ConfigError::DuplicateOverload { owner, name, .. }
            | ConfigError::EmptyOverloadSet { owner, name } => vec![format!("{owner}::{name}")],
            ConfigError::MissingTemplateArgument { template, instance, .. }
            | ConfigError::TooManyTemplateArguments { template, instance, .. } => {
                vec![template.to_string(), instance.to_string()]
            }
            ConfigError::UnknownAnchorTarget { target, .. }
            | ConfigError::UnknownOverrideTarget { target, .. } => vec![target.clone()],
            ConfigError::DuplicateExport { first, second, .. } => {
                vec![first.to_string(), second.to_string()]
            }
            ConfigError::InvalidCapacity { module } => vec![module.clone()],
        }
    }
}

// ============================================================================
// Warnings
// ============================================================================

/// Advisory diagnostics. Reported to the caller, never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A shorter overload matches a call that a longer overload's defaults
    /// also accept, so one may shadow the other.
    DefaultArgumentOverlap {
        owner: String,
        name: String,
        shorter: String,
        longer: String,
    },

    /// A side-table override matched only non-public members.
    OverrideOnNonPublic { target: String },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::DefaultArgumentOverlap {
                owner,
                name,
                shorter,
                longer,
            } => write!(
                f,
                "'{owner}::{name}({shorter})' overlaps the defaulted arguments of '{owner}::{name}({longer})'"
            ),
            Warning::OverrideOnNonPublic { target } => {
                write!(f, "override for '{target}' applies only to non-public members")
            }
        }
    }
}
