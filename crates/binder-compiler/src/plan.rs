//! Registration plans.
//!
//! A plan is the fully annotated form of one entity: every name, cast,
//! policy and fragment the emitter needs, decided ahead of rendering. Plans
//! are built in resolved declaration order and never change afterwards.

use binder_core::{
    Capacity, ClassEntry, ConfigError, Entity, EnumEntry, FunctionEntry, KeepAlive, MethodEntry,
    Param, QualifiedName, ReturnPolicy, SignatureHash, Warning, normalize_spelling,
};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::PreparedModule;
use crate::inject::{Anchor, SideTable};
use crate::overload::{
    CallableOwner, Disambiguated, disambiguate, is_operator_name, python_operator_name,
};
use crate::policy::{CallableKind, infer_policy};

// ============================================================================
// Plan Types
// ============================================================================

/// Everything needed to render one module.
#[derive(Debug, Clone)]
pub struct ModulePlan {
    pub name: String,
    /// Native headers, common includes excluded.
    pub includes: Vec<String>,
    /// Fully qualified modules imported at load time.
    pub imports: Vec<String>,
    pub prologue: Vec<String>,
    pub epilogue: Vec<String>,
    pub capacity: Option<Capacity>,
    pub entities: Vec<EntityPlan>,
}

/// One entity ready for rendering.
#[derive(Debug, Clone)]
pub struct EntityPlan {
    pub id: QualifiedName,
    /// Positions in [`ModulePlan::entities`] of direct dependencies.
    pub dependencies: Vec<usize>,
    pub kind: PlanKind,
}

#[derive(Debug, Clone)]
pub enum PlanKind {
    Class(ClassPlan),
    Enum(EnumPlan),
    Function(FunctionPlan),
    /// Marker only.
    Typedef,
}

#[derive(Debug, Clone)]
pub struct ClassPlan {
    /// Local variable holding the class object (`cls_Test_Mesh`).
    pub variable: String,
    pub python_name: String,
    pub native: String,
    pub holder: Option<String>,
    /// Native spellings of base classes.
    pub bases: Vec<String>,
    pub doc: String,
    pub before_type: Vec<String>,
    pub constructors: Vec<ConstructorPlan>,
    pub methods: Vec<CallablePlan>,
    /// Registers `__iter__` over `begin()`/`end()`.
    pub iterable: bool,
    pub fields: Vec<FieldPlan>,
    pub after_type: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ConstructorPlan {
    pub types: Vec<String>,
    pub args: Vec<ArgPlan>,
}

/// A named argument label with its optional default.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgPlan {
    pub name: String,
    pub default: Option<String>,
}

/// One registration statement for one overload.
#[derive(Debug, Clone)]
pub struct CallablePlan {
    pub python_name: String,
    /// Address-of target without the `&` (`Test_Mesh::AddNode`).
    pub native_path: String,
    pub is_static: bool,
    pub is_operator: bool,
    pub cast: Option<String>,
    pub doc: String,
    pub args: Vec<ArgPlan>,
    pub policy: Option<ReturnPolicy>,
    pub keep_alive: Vec<KeepAlive>,
    /// Guard types wrapped around each call.
    pub call_guards: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct FieldPlan {
    pub name: String,
    pub native_path: String,
    pub readonly: bool,
    pub doc: String,
}

#[derive(Debug, Clone)]
pub struct EnumPlan {
    pub python_name: String,
    pub native: String,
    pub doc: String,
    pub tagged: bool,
    pub values: Vec<EnumValuePlan>,
    pub before_type: Vec<String>,
    pub after_type: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct EnumValuePlan {
    pub name: String,
    /// Native path of the enumerator.
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct FunctionPlan {
    pub python_name: String,
    pub overloads: Vec<CallablePlan>,
}

/// Plan plus the advisory warnings raised while building it.
#[derive(Debug)]
pub struct PlanOutput {
    pub plan: ModulePlan,
    pub warnings: Vec<Warning>,
}

// ============================================================================
// Plan Construction
// ============================================================================

/// Annotate every entity of a prepared module, in resolved order.
pub fn build_plan(
    module: &PreparedModule,
    side_table: &SideTable,
    always_cast: bool,
) -> Result<PlanOutput, ConfigError> {
    let mut builder = PlanBuilder {
        module,
        side_table,
        always_cast,
        warnings: Vec::new(),
        exports: FxHashMap::default(),
    };

    let mut planned = Vec::with_capacity(module.order.len());
    for &entity_id in &module.order {
        let entity = module.arena.get(entity_id);
        if side_table.is_excluded(&entity.id().to_string()) {
            tracing::debug!(entity = %entity.id(), "excluded");
            continue;
        }
        let kind = match entity {
            Entity::Class(class) => PlanKind::Class(builder.class(class)?),
            Entity::Enum(e) => PlanKind::Enum(builder.enumeration(e)?),
            Entity::Function(function) => match builder.function(function)? {
                Some(plan) => PlanKind::Function(plan),
                None => continue,
            },
            Entity::Typedef(_) => PlanKind::Typedef,
            // Expanded before the arena is built.
            Entity::Template(_) => continue,
        };
        tracing::trace!(entity = %entity.id(), kind = %entity.kind(), "planned");
        planned.push((entity_id, kind));
    }

    let positions: FxHashMap<_, usize> = planned
        .iter()
        .enumerate()
        .map(|(pos, (id, _))| (*id, pos))
        .collect();
    let entities = planned
        .into_iter()
        .map(|(entity_id, kind)| {
            let mut dependencies: Vec<usize> = module
                .graph
                .dependencies_of(entity_id)
                .into_iter()
                .filter_map(|dep| positions.get(&dep).copied())
                .collect();
            dependencies.sort_unstable();
            EntityPlan {
                id: module.arena.get(entity_id).id().clone(),
                dependencies,
                kind,
            }
        })
        .collect();

    let prologue = side_table.fragments.get(&module.name, Anchor::Prologue).to_vec();
    let epilogue = side_table.fragments.get(&module.name, Anchor::Epilogue).to_vec();
    let mut includes = module.includes.clone();
    includes.extend(side_table.headers(&module.name).iter().cloned());
    let imports = module
        .imports
        .iter()
        .filter(|import| **import != module.name)
        .map(|import| match &module.package {
            Some(package) => format!("{package}.{import}"),
            None => import.clone(),
        })
        .collect();

    Ok(PlanOutput {
        plan: ModulePlan {
            name: module.name.clone(),
            includes,
            imports,
            prologue,
            epilogue,
            capacity: module.capacity,
            entities,
        },
        warnings: builder.warnings,
    })
}

struct PlanBuilder<'a> {
    module: &'a PreparedModule,
    side_table: &'a SideTable,
    always_cast: bool,
    warnings: Vec<Warning>,
    /// Module-scope name -> (exporting entity, exported by a free function).
    exports: FxHashMap<String, (QualifiedName, bool)>,
}

impl PlanBuilder<'_> {
    fn class(&mut self, class: &ClassEntry) -> Result<ClassPlan, ConfigError> {
        let id = class.id.to_string();
        let native = class.native_spelling();
        let python_name = self.python_name(&id, class.display_name());
        self.export(&python_name, &class.id, false)?;

        let holder = if self.side_table.is_nodelete(&id) {
            Some(format!("std::unique_ptr<{native}, py::nodelete>"))
        } else {
            class.holder.clone()
        };

        let bases = class
            .bases
            .iter()
            .filter(|base| !self.side_table.is_base_excluded(&id, &base.to_string()))
            .map(|base| match self.module.arena.lookup(base) {
                Some(base_id) => match self.module.arena.get(base_id) {
                    Entity::Class(base_class) => base_class.native_spelling(),
                    other => other.id().to_string(),
                },
                None => base.to_string(),
            })
            .collect();

        let constructors = if class.is_abstract {
            Vec::new()
        } else {
            self.constructors(class)?
        };

        let mut methods = Vec::new();
        let mut iterator_ends = 0;
        for method in group_methods(class)? {
            let target = class.id.child(method.name.clone()).to_string();
            if self.side_table.is_method_excluded(&target, &method.name) {
                tracing::debug!(member = %target, "excluded");
                continue;
            }
            if matches!(method.name.as_str(), "begin" | "end")
                && method
                    .overloads
                    .iter()
                    .any(|o| o.visibility.is_public() && !o.is_static)
            {
                iterator_ends += 1;
            }
            methods.extend(self.method(class, &native, &method)?);
        }

        let fields = class
            .fields
            .iter()
            .filter(|f| f.visibility.is_public())
            .filter(|f| !self.side_table.is_field_excluded(&format!("{id}::{}", f.name)))
            .map(|f| FieldPlan {
                name: f.name.clone(),
                native_path: format!("{native}::{}", f.name),
                readonly: f.readonly,
                doc: f.doc.clone().unwrap_or_default(),
            })
            .collect();

        Ok(ClassPlan {
            variable: format!("cls_{}", class.id.flattened()),
            python_name,
            native,
            holder,
            bases,
            doc: class.doc.clone().unwrap_or_default(),
            before_type: self.fragments(&class.before_type, &id, Anchor::BeforeType),
            constructors,
            methods,
            iterable: iterator_ends == 2,
            fields,
            after_type: self.fragments(&class.after_type, &id, Anchor::AfterType),
        })
    }

    fn constructors(&mut self, class: &ClassEntry) -> Result<Vec<ConstructorPlan>, ConfigError> {
        let mut seen: FxHashSet<SignatureHash> = FxHashSet::default();
        let mut plans = Vec::new();
        for ctor in class.constructors.iter().filter(|c| c.visibility.is_public()) {
            let types: Vec<_> = ctor.params.iter().map(|p| p.ty.clone()).collect();
            let hash = SignatureHash::from_constructor(&types);
            if !seen.insert(hash) {
                let signature: Vec<String> = types.iter().map(|t| normalize_spelling(&t.spelling)).collect();
                return Err(ConfigError::DuplicateOverload {
                    owner: class.id.to_string(),
                    name: "__init__".to_string(),
                    signature: signature.join(", "),
                });
            }
            plans.push(ConstructorPlan {
                types: ctor.params.iter().map(|p| p.ty.spelling.clone()).collect(),
                args: arg_plans(&ctor.params),
            });
        }
        Ok(plans)
    }

    fn method(
        &mut self,
        class: &ClassEntry,
        native: &str,
        method: &MethodEntry,
    ) -> Result<Vec<CallablePlan>, ConfigError> {
        let public: Vec<_> = method
            .overloads
            .iter()
            .filter(|o| o.visibility.is_public())
            .cloned()
            .collect();
        if public.is_empty() {
            tracing::trace!(class = %class.id, method = %method.name, "no public overloads");
            return Ok(Vec::new());
        }

        let target = class.id.child(method.name.clone()).to_string();
        let is_operator = is_operator_name(&method.name);
        let set = disambiguate(
            CallableOwner::Class(native),
            &method.name,
            &public,
            self.always_cast,
        )?;
        self.warnings.extend(set.warnings.iter().cloned());

        let mut plans = Vec::with_capacity(set.overloads.len());
        for resolved in &set.overloads {
            let overload = &resolved.overload;
            let python_name = match self.side_table.python_name(&target) {
                Some(name) => name.to_string(),
                None if is_operator => {
                    match python_operator_name(&method.name, overload.params.len()) {
                        Some(name) => name.to_string(),
                        None => {
                            tracing::debug!(member = %target, "operator has no special method");
                            continue;
                        }
                    }
                }
                None if overload.is_static => format!("{}_", method.name),
                None => method.name.clone(),
            };
            let kind = if overload.is_static {
                CallableKind::Function
            } else {
                CallableKind::Method
            };
            let doc = overload.doc.clone();
            plans.push(self.callable(
                resolved,
                &target,
                python_name,
                format!("{native}::{}", method.name),
                kind,
                is_operator,
                doc,
            ));
        }
        Ok(plans)
    }

    fn function(&mut self, function: &FunctionEntry) -> Result<Option<FunctionPlan>, ConfigError> {
        let target = function.id.to_string();
        if is_operator_name(function.id.simple_name()) {
            tracing::debug!(member = %target, "free operator skipped");
            return Ok(None);
        }
        if function.overloads.is_empty() {
            return Err(ConfigError::EmptyOverloadSet {
                owner: function.id.namespace_string(),
                name: function.id.simple_name().to_string(),
            });
        }
        let public: Vec<_> = function
            .overloads
            .iter()
            .filter(|o| o.visibility.is_public())
            .cloned()
            .collect();
        if public.is_empty() {
            return Ok(None);
        }

        let scope = function.id.namespace_string();
        let set = disambiguate(
            CallableOwner::Module(&scope),
            function.id.simple_name(),
            &public,
            self.always_cast,
        )?;
        self.warnings.extend(set.warnings.iter().cloned());

        let python_name = self.python_name(&target, function.display_name());
        self.export(&python_name, &function.id, true)?;

        let native = function.native_spelling();
        let overloads = set
            .overloads
            .iter()
            .map(|resolved| {
                let doc = resolved.overload.doc.clone().or_else(|| function.doc.clone());
                self.callable(
                    resolved,
                    &target,
                    python_name.clone(),
                    native.clone(),
                    CallableKind::Function,
                    false,
                    doc,
                )
            })
            .collect();

        Ok(Some(FunctionPlan {
            python_name,
            overloads,
        }))
    }

    #[allow(clippy::too_many_arguments)]
    fn callable(
        &self,
        resolved: &Disambiguated,
        target: &str,
        python_name: String,
        native_path: String,
        kind: CallableKind,
        is_operator: bool,
        doc: Option<String>,
    ) -> CallablePlan {
        let overload = &resolved.overload;
        let mut lifetime = infer_policy(overload, kind);
        if let Some(policy) = self.side_table.policy(target) {
            lifetime = lifetime.override_with(policy);
        }
        let lifetime = lifetime.with_keep_alive(self.side_table.keep_alive(target).iter().copied());
        tracing::trace!(member = target, policy = %lifetime.policy, explicit = lifetime.explicit, "policy");

        CallablePlan {
            python_name,
            native_path,
            is_static: overload.is_static,
            is_operator,
            cast: resolved.cast.clone(),
            doc: doc.unwrap_or_default(),
            args: arg_plans(&overload.params),
            policy: lifetime.rendered(),
            keep_alive: lifetime.keep_alive,
            call_guards: self.side_table.call_guards(target).to_vec(),
        }
    }

    fn enumeration(&mut self, e: &EnumEntry) -> Result<EnumPlan, ConfigError> {
        let id = e.id.to_string();
        let python_name = self.python_name(&id, e.display_name());
        if e.tagged {
            self.export(&python_name, &e.id, false)?;
        }

        let mut values = Vec::with_capacity(e.values.len());
        for value in &e.values {
            self.export(&value.name, &e.id, false)?;
            values.push(EnumValuePlan {
                name: value.name.clone(),
                path: e.value_path(value),
            });
        }

        Ok(EnumPlan {
            python_name,
            native: id.clone(),
            doc: e.doc.clone().unwrap_or_default(),
            tagged: e.tagged,
            values,
            before_type: self.fragments(&e.before_type, &id, Anchor::BeforeType),
            after_type: self.fragments(&e.after_type, &id, Anchor::AfterType),
        })
    }

    fn python_name(&self, target: &str, default: String) -> String {
        self.side_table
            .python_name(target)
            .map(str::to_string)
            .unwrap_or(default)
    }

    fn fragments(&self, inline: &[String], target: &str, anchor: Anchor) -> Vec<String> {
        let mut all = inline.to_vec();
        all.extend(self.side_table.fragments.get(target, anchor).iter().cloned());
        all
    }

    /// Claim a module-scope name. Free functions may share a name (the host
    /// framework chains them as overloads); anything else may not.
    fn export(&mut self, name: &str, owner: &QualifiedName, is_function: bool) -> Result<(), ConfigError> {
        match self.exports.get(name) {
            None => {
                self.exports
                    .insert(name.to_string(), (owner.clone(), is_function));
                Ok(())
            }
            Some((_, true)) if is_function => Ok(()),
            Some((first, _)) => Err(ConfigError::DuplicateExport {
                name: name.to_string(),
                first: first.clone(),
                second: owner.clone(),
            }),
        }
    }
}

/// Gather a class's method entries into one overload set per name, in
/// first-appearance order. Each overload keeps its own entry's doc.
fn group_methods(class: &ClassEntry) -> Result<Vec<MethodEntry>, ConfigError> {
    let mut groups: Vec<MethodEntry> = Vec::new();
    let mut index: FxHashMap<&str, usize> = FxHashMap::default();
    for method in &class.methods {
        if method.overloads.is_empty() {
            return Err(ConfigError::EmptyOverloadSet {
                owner: class.id.to_string(),
                name: method.name.clone(),
            });
        }
        let overloads = method.overloads.iter().cloned().map(|mut overload| {
            if overload.doc.is_none() {
                overload.doc = method.doc.clone();
            }
            overload
        });
        match index.get(method.name.as_str()) {
            Some(&i) => groups[i].overloads.extend(overloads),
            None => {
                index.insert(&method.name, groups.len());
                let mut group = MethodEntry::new(method.name.clone());
                group.overloads.extend(overloads);
                groups.push(group);
            }
        }
    }
    Ok(groups)
}

fn arg_plans(params: &[Param]) -> Vec<ArgPlan> {
    params
        .iter()
        .enumerate()
        .map(|(i, p)| ArgPlan {
            name: if p.name.is_empty() {
                format!("a{i}")
            } else {
                p.name.clone()
            },
            default: p.default.clone(),
        })
        .collect()
}
