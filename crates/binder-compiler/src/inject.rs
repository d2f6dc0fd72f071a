//! Extension injection side-table.
//!
//! Externally supplied fragments and per-member overrides, keyed by native
//! identifier. Fragments are opaque text: they are placed at their anchor
//! verbatim and in the order supplied, never parsed.
//!
//! One side-table usually serves every module of a run, so its targets are
//! validated against the union of all modules being compiled.

use std::fmt;

use binder_core::{
    ClassEntry, ConfigError, Entity, EntityKind, KeepAlive, QualifiedName, ReturnPolicy, Warning,
};
use binder_registry::EntityArena;
use rustc_hash::{FxHashMap, FxHashSet};

/// Named insertion point for fragments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Before a class or enum registration statement.
    BeforeType,
    /// After a class's last member statement.
    AfterType,
    /// File scope of the primary unit, before the entry point.
    Prologue,
    /// End of the primary entry point, after continuation calls.
    Epilogue,
}

impl Anchor {
    fn is_module_level(self) -> bool {
        matches!(self, Anchor::Prologue | Anchor::Epilogue)
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Anchor::BeforeType => "before_type",
            Anchor::AfterType => "after_type",
            Anchor::Prologue => "before_module",
            Anchor::Epilogue => "after_module",
        };
        f.write_str(s)
    }
}

/// Per-target directive, recorded for validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverrideKind {
    ReturnPolicy,
    KeepAlive,
    PythonName,
    NoDelete,
    CallGuard,
    Skip,
    ExcludeClass,
    ExcludeEnum,
    ExcludeTypedef,
    /// A free function or one method (`Class::method`).
    ExcludeFunction,
    /// Every method with this name, in any class.
    ExcludeMethodName,
    ExcludeField,
    ExcludeBase,
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OverrideKind::ReturnPolicy => "return_policy",
            OverrideKind::KeepAlive => "keep_alive",
            OverrideKind::PythonName => "pname",
            OverrideKind::NoDelete => "nodelete",
            OverrideKind::CallGuard => "cguard",
            OverrideKind::Skip => "skip",
            OverrideKind::ExcludeClass => "-class",
            OverrideKind::ExcludeEnum => "-enum",
            OverrideKind::ExcludeTypedef => "-typedef",
            OverrideKind::ExcludeFunction => "-function",
            OverrideKind::ExcludeMethodName => "-function*",
            OverrideKind::ExcludeField => "-field",
            OverrideKind::ExcludeBase => "-base",
        };
        f.write_str(s)
    }
}

/// Ordered fragments per (target, anchor).
#[derive(Debug, Clone, Default)]
pub struct Fragments {
    entries: FxHashMap<(String, Anchor), Vec<String>>,
    /// First-insertion order of keys, for deterministic validation.
    order: Vec<(String, Anchor)>,
}

impl Fragments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment at an anchor of a target.
    pub fn push(&mut self, target: impl Into<String>, anchor: Anchor, text: impl Into<String>) {
        let key = (target.into(), anchor);
        match self.entries.get_mut(&key) {
            Some(texts) => texts.push(text.into()),
            None => {
                self.order.push(key.clone());
                self.entries.insert(key, vec![text.into()]);
            }
        }
    }

    /// Fragments for one target and anchor, in supply order.
    pub fn get(&self, target: &str, anchor: Anchor) -> &[String] {
        self.entries
            .get(&(target.to_string(), anchor))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every type-level anchor names a class or enum and every
    /// module-level anchor names a module being compiled.
    pub fn validate(&self, scope: &ValidationScope<'_>) -> Result<(), ConfigError> {
        for (target, anchor) in &self.order {
            let known = if anchor.is_module_level() {
                scope.modules.contains(target.as_str())
            } else {
                scope.find_entity(target).is_some_and(|e| {
                    matches!(e, Entity::Class(_) | Entity::Enum(_))
                })
            };
            if !known {
                return Err(ConfigError::UnknownAnchorTarget {
                    target: target.clone(),
                    anchor: anchor.to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Everything a side-table may legally refer to.
pub struct ValidationScope<'a> {
    modules: FxHashSet<&'a str>,
    arenas: Vec<&'a EntityArena>,
}

impl<'a> ValidationScope<'a> {
    pub fn new() -> Self {
        Self {
            modules: FxHashSet::default(),
            arenas: Vec::new(),
        }
    }

    /// Add one module's name and entities.
    pub fn with_module(mut self, name: &'a str, arena: &'a EntityArena) -> Self {
        self.modules.insert(name);
        self.arenas.push(arena);
        self
    }

    fn find_entity(&self, target: &str) -> Option<&'a Entity> {
        let id = QualifiedName::from(target);
        self.arenas
            .iter()
            .copied()
            .find_map(|arena| arena.lookup(&id).map(|entity_id| arena.get(entity_id)))
    }

    fn find_kind(&self, target: &str, kind: EntityKind) -> bool {
        self.find_entity(target).is_some_and(|e| e.kind() == kind)
    }

    /// Owning class of a `Class::member` target.
    fn owner_class(&self, target: &str) -> Option<(&'a ClassEntry, String)> {
        let id = QualifiedName::from(target);
        let owner = id.parent()?;
        match self.find_entity(&owner.to_string())? {
            Entity::Class(class) => Some((class, id.simple_name().to_string())),
            _ => None,
        }
    }

    fn has_method_named(&self, name: &str) -> bool {
        self.arenas.iter().any(|arena| {
            arena.iter().any(|(_, entity)| match entity {
                Entity::Class(class) => class.methods.iter().any(|m| m.name == name),
                _ => false,
            })
        })
    }

    /// Resolve `Class::method` or a free-function identifier to whether any
    /// of its overloads is public. `None` when the target does not exist.
    fn member_visibility(&self, target: &str) -> Option<bool> {
        if let Some(Entity::Function(function)) = self.find_entity(target) {
            return Some(function.overloads.iter().any(|o| o.visibility.is_public()));
        }
        let (class, member) = self.owner_class(target)?;
        let mut overloads = class
            .methods
            .iter()
            .filter(|m| m.name == member)
            .flat_map(|m| &m.overloads)
            .peekable();
        overloads.peek()?;
        Some(overloads.any(|o| o.visibility.is_public()))
    }
}

impl Default for ValidationScope<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Side-table of fragments and overrides supplied next to the entity model.
#[derive(Debug, Clone, Default)]
pub struct SideTable {
    pub fragments: Fragments,
    policies: FxHashMap<String, ReturnPolicy>,
    keep_alive: FxHashMap<String, Vec<KeepAlive>>,
    python_names: FxHashMap<String, String>,
    headers: FxHashMap<String, Vec<String>>,
    nodelete: FxHashSet<String>,
    call_guards: FxHashMap<String, Vec<String>>,
    skipped: FxHashSet<String>,
    excluded: FxHashSet<String>,
    excluded_method_names: FxHashSet<String>,
    excluded_fields: FxHashSet<String>,
    /// Class -> base classes left out of its registration.
    excluded_bases: FxHashMap<String, Vec<String>>,
    /// Override targets in first-insertion order.
    override_order: Vec<(String, OverrideKind)>,
}

impl SideTable {
    pub fn new() -> Self {
        Self::default()
    }

    // === Builder Methods ===

    pub fn add_fragment(&mut self, target: impl Into<String>, anchor: Anchor, text: impl Into<String>) {
        self.fragments.push(target, anchor, text);
    }

    /// Policy override for every overload of `Class::method` or a free function.
    pub fn set_policy(&mut self, target: impl Into<String>, policy: ReturnPolicy) {
        let target = target.into();
        self.record(&target, OverrideKind::ReturnPolicy);
        self.policies.insert(target, policy);
    }

    pub fn add_keep_alive(&mut self, target: impl Into<String>, pair: KeepAlive) {
        let target = target.into();
        self.record(&target, OverrideKind::KeepAlive);
        self.keep_alive.entry(target).or_default().push(pair);
    }

    pub fn set_python_name(&mut self, target: impl Into<String>, name: impl Into<String>) {
        let target = target.into();
        self.record(&target, OverrideKind::PythonName);
        self.python_names.insert(target, name.into());
    }

    pub fn add_header(&mut self, module: impl Into<String>, header: impl Into<String>) {
        self.headers.entry(module.into()).or_default().push(header.into());
    }

    /// Register a class with a holder that never deletes its object.
    pub fn add_nodelete(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.record(&target, OverrideKind::NoDelete);
        self.nodelete.insert(target);
    }

    /// Wrap every registration of `Class::method` or a free function in a
    /// call guard type.
    pub fn add_call_guard(&mut self, target: impl Into<String>, guard: impl Into<String>) {
        let target = target.into();
        self.record(&target, OverrideKind::CallGuard);
        self.call_guards.entry(target).or_default().push(guard.into());
    }

    /// Leave an entity of any kind out of the output.
    pub fn add_skip(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.record(&target, OverrideKind::Skip);
        self.skipped.insert(target);
    }

    pub fn exclude_class(&mut self, target: impl Into<String>) {
        self.exclude(target.into(), OverrideKind::ExcludeClass);
    }

    pub fn exclude_enum(&mut self, target: impl Into<String>) {
        self.exclude(target.into(), OverrideKind::ExcludeEnum);
    }

    pub fn exclude_typedef(&mut self, target: impl Into<String>) {
        self.exclude(target.into(), OverrideKind::ExcludeTypedef);
    }

    /// Leave out a free function or every overload of `Class::method`.
    pub fn exclude_function(&mut self, target: impl Into<String>) {
        self.exclude(target.into(), OverrideKind::ExcludeFunction);
    }

    fn exclude(&mut self, target: String, kind: OverrideKind) {
        self.record(&target, kind);
        self.excluded.insert(target);
    }

    /// Leave out every method with this native name.
    pub fn exclude_method_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.record(&name, OverrideKind::ExcludeMethodName);
        self.excluded_method_names.insert(name);
    }

    /// Leave out one field (`Class::field`).
    pub fn exclude_field(&mut self, target: impl Into<String>) {
        let target = target.into();
        self.record(&target, OverrideKind::ExcludeField);
        self.excluded_fields.insert(target);
    }

    /// Register `class` without `base` in its base list.
    pub fn exclude_base(&mut self, class: impl Into<String>, base: impl Into<String>) {
        let class = class.into();
        self.record(&class, OverrideKind::ExcludeBase);
        self.excluded_bases.entry(class).or_default().push(base.into());
    }

    fn record(&mut self, target: &str, kind: OverrideKind) {
        if !self.override_order.iter().any(|(t, k)| t == target && *k == kind) {
            self.override_order.push((target.to_string(), kind));
        }
    }

    // === Query Methods ===

    pub fn policy(&self, target: &str) -> Option<ReturnPolicy> {
        self.policies.get(target).copied()
    }

    pub fn keep_alive(&self, target: &str) -> &[KeepAlive] {
        self.keep_alive.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn python_name(&self, target: &str) -> Option<&str> {
        self.python_names.get(target).map(String::as_str)
    }

    pub fn headers(&self, module: &str) -> &[String] {
        self.headers.get(module).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_nodelete(&self, target: &str) -> bool {
        self.nodelete.contains(target)
    }

    pub fn call_guards(&self, target: &str) -> &[String] {
        self.call_guards.get(target).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a whole entity stays out of the output.
    pub fn is_excluded(&self, target: &str) -> bool {
        self.skipped.contains(target) || self.excluded.contains(target)
    }

    /// Whether a method group stays out of its class's registration.
    pub fn is_method_excluded(&self, target: &str, name: &str) -> bool {
        self.excluded.contains(target) || self.excluded_method_names.contains(name)
    }

    pub fn is_field_excluded(&self, target: &str) -> bool {
        self.excluded_fields.contains(target)
    }

    /// Whether `base` is dropped from `class`'s registration. Excluded
    /// classes are dropped from every base list.
    pub fn is_base_excluded(&self, class: &str, base: &str) -> bool {
        self.excluded.contains(base)
            || self
                .excluded_bases
                .get(class)
                .is_some_and(|bases| bases.iter().any(|b| b == base))
    }

    /// Validate every fragment anchor and override target.
    ///
    /// Returns advisory warnings for overrides that only reach non-public
    /// members, which are never registered.
    pub fn validate(&self, scope: &ValidationScope<'_>) -> Result<Vec<Warning>, ConfigError> {
        self.fragments.validate(scope)?;

        let mut warnings = Vec::new();
        for (target, kind) in &self.override_order {
            let known = match kind {
                OverrideKind::PythonName | OverrideKind::NoDelete | OverrideKind::Skip => {
                    scope.find_entity(target).is_some()
                }
                OverrideKind::ReturnPolicy | OverrideKind::KeepAlive | OverrideKind::CallGuard => {
                    match scope.member_visibility(target) {
                        Some(true) => true,
                        Some(false) => {
                            warnings.push(Warning::OverrideOnNonPublic {
                                target: target.clone(),
                            });
                            true
                        }
                        None => false,
                    }
                }
                OverrideKind::ExcludeClass => scope.find_kind(target, EntityKind::Class),
                OverrideKind::ExcludeEnum => scope.find_kind(target, EntityKind::Enum),
                OverrideKind::ExcludeTypedef => scope.find_kind(target, EntityKind::Typedef),
                OverrideKind::ExcludeFunction => scope.member_visibility(target).is_some(),
                OverrideKind::ExcludeMethodName => scope.has_method_named(target),
                OverrideKind::ExcludeField => scope
                    .owner_class(target)
                    .is_some_and(|(class, field)| class.fields.iter().any(|f| f.name == field)),
                OverrideKind::ExcludeBase => self.bases_known(scope, target)?,
            };
            if !known {
                return Err(ConfigError::UnknownOverrideTarget {
                    target: target.clone(),
                    directive: kind.to_string(),
                });
            }
        }
        Ok(warnings)
    }

    /// The class exists and lists every base excluded from it.
    fn bases_known(&self, scope: &ValidationScope<'_>, class: &str) -> Result<bool, ConfigError> {
        let Some(Entity::Class(entry)) = scope.find_entity(class) else {
            return Ok(false);
        };
        for base in self.excluded_bases.get(class).into_iter().flatten() {
            if !entry.bases.iter().any(|b| b.to_string() == *base) {
                return Err(ConfigError::UnknownOverrideTarget {
                    target: format!("{class} --> {base}"),
                    directive: OverrideKind::ExcludeBase.to_string(),
                });
            }
        }
        Ok(true)
    }
}
