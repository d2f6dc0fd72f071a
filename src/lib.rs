//! # binder
//!
//! Generates pybind11 registration sources from a native API entity model.
//!
//! A run loads one JSON entity model per module, an optional TOML settings
//! file and an optional directive file, then renders every module before
//! anything is written:
//!
//! ```no_run
//! use binder::{Generator, Settings, load_directives, load_module};
//!
//! # fn main() -> binder::Result<()> {
//! binder::init_tracing();
//! let settings = Settings::load("binder.toml")?;
//! let side_table = load_directives("config.txt")?;
//! let modules = vec![load_module("gp.json")?, load_module("TopoDS.json")?];
//!
//! let generation = Generator::new(settings, side_table).generate(modules)?;
//! generation.write("out")?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - `binder-core`: entity model and error taxonomy
//! - `binder-registry`: entity arena, dependency graph, declaration order
//! - `binder-compiler`: templates, overloads, policies, side-table, emission

pub mod config;
pub mod directives;
pub mod error;
mod logging;
pub mod output;

pub use binder_compiler::{CompiledModule, EmitOptions, EmittedUnit, SideTable, compile_module};
pub use binder_core::{ConfigError, ModuleDef, Warning};
pub use config::Settings;
pub use directives::{DirectiveError, load_directives, parse_directives};
pub use error::{BinderError, Result};
pub use logging::init_tracing;
pub use output::{WriteReport, load_module, write_units};

use std::path::Path;

use binder_compiler::{PreparedModule, ValidationScope, finish_module, prepare_module};
use binder_core::QualifiedName;
use rayon::prelude::*;
use rustc_hash::FxHashSet;

/// Multi-module generator.
///
/// Modules are independent except for side-table validation, so a run has
/// three phases: prepare every module in parallel, validate the side-table
/// against all of them, then plan and render every module in parallel.
pub struct Generator {
    settings: Settings,
    side_table: SideTable,
    options: EmitOptions,
}

/// Rendered output of a whole run, in module input order.
#[derive(Debug)]
pub struct Generation {
    pub modules: Vec<CompiledModule>,
    pub warnings: Vec<Warning>,
}

impl Generator {
    pub fn new(settings: Settings, side_table: SideTable) -> Self {
        let options = settings.emit_options();
        Self {
            settings,
            side_table,
            options,
        }
    }

    /// Generator with default settings and an empty side-table.
    pub fn with_defaults() -> Self {
        Self::new(Settings::default(), SideTable::new())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Render every module. Fails on the first configuration error in
    /// module input order; nothing is written either way.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn generate(&self, modules: Vec<ModuleDef>) -> Result<Generation> {
        let _span = tracing::info_span!("generate", modules = modules.len()).entered();

        let mut seen = FxHashSet::default();
        for module in &modules {
            if !seen.insert(module.name.as_str()) {
                return Err(ConfigError::DuplicateEntity {
                    id: QualifiedName::global(module.name.as_str()),
                    existing: "module".to_string(),
                    duplicate: "module".to_string(),
                }
                .into());
            }
        }

        let modules: Vec<ModuleDef> = modules
            .into_iter()
            .map(|mut module| {
                if module.capacity.is_none() {
                    module.capacity = self.settings.capacity;
                }
                module
            })
            .collect();

        let prepared: Vec<PreparedModule> = first_error(
            modules.into_par_iter().map(prepare_module).collect(),
        )?;

        let scope = prepared
            .iter()
            .fold(ValidationScope::new(), |scope, module| {
                scope.with_module(&module.name, &module.arena)
            });
        let mut warnings = self.side_table.validate(&scope)?;

        let compiled: Vec<CompiledModule> = first_error(
            prepared
                .par_iter()
                .map(|module| finish_module(module, &self.side_table, &self.options))
                .collect(),
        )?;

        for module in &compiled {
            warnings.extend(module.warnings.iter().cloned());
        }
        for warning in &warnings {
            tracing::warn!("{warning}");
        }
        tracing::info!(
            units = compiled.iter().map(|m| m.units.len()).sum::<usize>(),
            warnings = warnings.len(),
            "generation complete"
        );

        Ok(Generation {
            modules: compiled,
            warnings,
        })
    }
}

impl Generation {
    /// All units of all modules, in order.
    pub fn units(&self) -> impl Iterator<Item = &EmittedUnit> {
        self.modules.iter().flat_map(|m| m.units.iter())
    }

    /// Write every unit into `dir`.
    pub fn write(&self, dir: impl AsRef<Path>) -> Result<WriteReport> {
        let units: Vec<EmittedUnit> = self.units().cloned().collect();
        write_units(dir, &units)
    }
}

/// Keep input order when reporting errors from a parallel stage.
fn first_error<T>(results: Vec<std::result::Result<T, ConfigError>>) -> Result<Vec<T>> {
    results
        .into_iter()
        .collect::<std::result::Result<Vec<T>, ConfigError>>()
        .map_err(BinderError::from)
}
