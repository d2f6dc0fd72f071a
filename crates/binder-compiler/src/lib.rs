//! Binding Compiler
//!
//! Turns a module's entity model into registration source units.
//!
//! ## Pipeline
//!
//! 1. **Prepare**: expand templates, index entities, build the dependency
//!    graph and resolve the declaration order
//! 2. **Validate**: check side-table anchors and overrides against every
//!    prepared module
//! 3. **Plan**: disambiguate overloads, infer lifetime policies, attach
//!    fragments
//! 4. **Emit**: render entity blocks, split into units, assemble the text
//!
//! Steps 1 and 3-4 touch only one module, so independent modules can run
//! them in parallel; step 2 needs them all.
//!
//! ## Modules
//!
//! - [`template`]: Template instantiation
//! - [`overload`]: Overload disambiguation and operator naming
//! - [`policy`]: Return-value lifetime policy inference
//! - [`inject`]: Side-table fragments and overrides
//! - [`plan`]: Annotated per-entity registration plans
//! - [`split`]: Partitioning into emission units
//! - [`emit`]: Text rendering

pub mod emit;
pub mod inject;
pub mod overload;
pub mod plan;
pub mod policy;
pub mod split;
pub mod template;

pub use emit::{EmitOptions, EmittedUnit, Emitter, continuation_name};
pub use inject::{Anchor, Fragments, OverrideKind, SideTable, ValidationScope};
pub use overload::{CallableOwner, OverloadSet, disambiguate};
pub use plan::{ModulePlan, build_plan};
pub use policy::{CallableKind, LifetimePolicy, infer_policy};
pub use split::split;
pub use template::{Expansion, instantiate_templates};

use binder_core::{Capacity, ConfigError, ModuleDef, Warning};
use binder_registry::{DependencyGraph, EntityArena, EntityId, resolve_order};

/// A module with its entities indexed and ordered, ready for planning.
#[derive(Debug)]
pub struct PreparedModule {
    pub name: String,
    pub package: Option<String>,
    pub includes: Vec<String>,
    pub imports: Vec<String>,
    pub capacity: Option<Capacity>,
    pub arena: EntityArena,
    pub graph: DependencyGraph,
    /// Resolved declaration order.
    pub order: Vec<EntityId>,
}

/// Rendered output of one module.
#[derive(Debug)]
pub struct CompiledModule {
    pub name: String,
    /// Primary unit first, then continuations in invocation order.
    pub units: Vec<EmittedUnit>,
    pub warnings: Vec<Warning>,
}

/// Expand, index and order a module's entities.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn prepare_module(module: ModuleDef) -> Result<PreparedModule, ConfigError> {
    let _span = tracing::debug_span!("prepare", module = %module.name).entered();

    let expansion = instantiate_templates(module.entities)?;

    let mut arena = EntityArena::new();
    for entity in expansion.entities {
        if expansion.instances.contains(entity.id()) {
            arena.insert_exclusive(entity)?;
        } else {
            arena.insert(entity)?;
        }
    }
    for (template, instances) in expansion.aliases {
        let targets = instances
            .iter()
            .filter_map(|instance| arena.lookup(instance))
            .collect();
        arena.add_alias(template, targets)?;
    }

    let graph = DependencyGraph::build(&arena, &module.externals)?;
    let order = resolve_order(&arena, &graph)?;
    tracing::debug!(entities = arena.len(), edges = graph.edge_count(), "module prepared");

    Ok(PreparedModule {
        name: module.name,
        package: module.package,
        includes: module.includes,
        imports: module.imports,
        capacity: module.capacity,
        arena,
        graph,
        order,
    })
}

/// Plan and render a prepared module.
///
/// The side-table must already be validated against every module it serves.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn finish_module(
    module: &PreparedModule,
    side_table: &SideTable,
    options: &EmitOptions,
) -> Result<CompiledModule, ConfigError> {
    let _span = tracing::debug_span!("finish", module = %module.name).entered();

    let output = build_plan(module, side_table, options.always_cast)?;
    let units = Emitter::new(options).render_module(&output.plan)?;
    tracing::debug!(units = units.len(), warnings = output.warnings.len(), "module rendered");

    Ok(CompiledModule {
        name: module.name.clone(),
        units,
        warnings: output.warnings,
    })
}

/// Run the whole pipeline for a single module.
///
/// Every configuration error aborts before any text exists.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn compile_module(
    module: ModuleDef,
    side_table: &SideTable,
    options: &EmitOptions,
) -> Result<CompiledModule, ConfigError> {
    let prepared = prepare_module(module)?;
    let scope = ValidationScope::new().with_module(&prepared.name, &prepared.arena);
    let mut warnings = side_table.validate(&scope)?;

    let mut compiled = finish_module(&prepared, side_table, options)?;
    warnings.append(&mut compiled.warnings);
    compiled.warnings = warnings;
    Ok(compiled)
}
