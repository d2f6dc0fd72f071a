//! Emitter - renders planned modules into registration source units.
//!
//! Rendering is mechanical: every decision was made while planning. The
//! emitter renders each entity block once, hands the line counts to the
//! splitter, then assembles the primary unit and its continuations.
//!
//! ## Unit layout
//!
//! ```text
//! primary                          continuation k
//! -------                          --------------
//! banner                           banner
//! #include ...                     #include ...
//! prologue fragments
//! void bind_<M>_k(py::module&);    void bind_<M>_k(py::module &mod) {
//! PYBIND11_MODULE(<M>, mod) {          entity blocks
//!     imports                      }
//!     entity blocks
//!     bind_<M>_k(mod);
//!     epilogue fragments
//! }
//! ```

mod statements;

pub use statements::{escape, render_callable, render_entity};

use std::fmt::Write;
use std::ops::Range;

use binder_core::ConfigError;

use crate::plan::ModulePlan;
use crate::split::split;

/// Rendering options shared by every module of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// License or notice block placed at the top of every unit.
    pub banner: String,
    /// Headers included by every unit before the module's own headers.
    pub common_includes: Vec<String>,
    /// Emit a disambiguating cast even for names with a single overload.
    pub always_cast: bool,
    /// Extension of unit file names, without the dot.
    pub source_extension: String,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            banner: "/*\nThis file was generated by binder. Do not edit.\n*/".to_string(),
            common_includes: vec!["pyOCCT_Common.hxx".to_string()],
            always_cast: true,
            source_extension: "cxx".to_string(),
        }
    }
}

/// One rendered source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedUnit {
    pub file_name: String,
    /// Module name for the primary unit, continuation function otherwise.
    pub entry_point: String,
    pub text: String,
}

/// Renders module plans.
pub struct Emitter<'a> {
    options: &'a EmitOptions,
}

impl<'a> Emitter<'a> {
    pub fn new(options: &'a EmitOptions) -> Self {
        Self { options }
    }

    /// Render a module into its primary unit followed by continuations.
    pub fn render_module(&self, plan: &ModulePlan) -> Result<Vec<EmittedUnit>, ConfigError> {
        let blocks: Vec<String> = plan.entities.iter().map(render_entity).collect();
        let line_counts: Vec<usize> = blocks.iter().map(|b| b.lines().count()).collect();
        let partition = split(plan, &line_counts)?;
        Ok(self.render_units(plan, &blocks, &partition))
    }

    /// Assemble units from pre-rendered entity blocks.
    pub fn render_units(
        &self,
        plan: &ModulePlan,
        blocks: &[String],
        partition: &[Range<usize>],
    ) -> Vec<EmittedUnit> {
        let continuations: Vec<String> = (2..=partition.len())
            .map(|k| continuation_name(&plan.name, k))
            .collect();

        let mut units = Vec::with_capacity(partition.len());
        for (i, range) in partition.iter().enumerate() {
            let body = blocks[range.clone()].join("\n");
            let unit = if i == 0 {
                EmittedUnit {
                    file_name: format!("{}.{}", plan.name, self.options.source_extension),
                    entry_point: plan.name.clone(),
                    text: self.primary(plan, &body, &continuations),
                }
            } else {
                let entry_point = continuations[i - 1].clone();
                EmittedUnit {
                    file_name: format!(
                        "{}_{}.{}",
                        plan.name,
                        i + 1,
                        self.options.source_extension
                    ),
                    text: self.continuation(plan, &entry_point, &body),
                    entry_point,
                }
            };
            units.push(unit);
        }
        units
    }

    fn primary(&self, plan: &ModulePlan, body: &str, continuations: &[String]) -> String {
        let mut out = self.preamble(plan);

        if !plan.prologue.is_empty() {
            for fragment in &plan.prologue {
                out.push_str(fragment);
                out.push('\n');
            }
            out.push('\n');
        }

        if !continuations.is_empty() {
            out.push_str("// Functions for split modules\n");
            for name in continuations {
                let _ = writeln!(out, "void {name}(py::module&);");
            }
            out.push('\n');
        }

        let _ = writeln!(out, "PYBIND11_MODULE({}, mod) {{\n", plan.name);

        if !plan.imports.is_empty() {
            for import in &plan.imports {
                let _ = writeln!(out, "py::module::import(\"{import}\");");
            }
            out.push('\n');
        }

        out.push_str(body);

        if !continuations.is_empty() {
            out.push('\n');
            for name in continuations {
                let _ = writeln!(out, "{name}(mod);");
            }
        }

        if !plan.epilogue.is_empty() {
            out.push('\n');
            for fragment in &plan.epilogue {
                out.push_str(fragment);
                out.push('\n');
            }
        }

        out.push_str("\n}\n");
        out
    }

    fn continuation(&self, plan: &ModulePlan, entry_point: &str, body: &str) -> String {
        let mut out = self.preamble(plan);
        let _ = writeln!(out, "void {entry_point}(py::module &mod) {{\n");
        out.push_str(body);
        out.push_str("\n}\n");
        out
    }

    fn preamble(&self, plan: &ModulePlan) -> String {
        let mut out = String::new();
        let banner = self.options.banner.trim_end();
        if !banner.is_empty() {
            out.push_str(banner);
            out.push('\n');
        }
        for include in self.options.common_includes.iter().chain(&plan.includes) {
            let _ = writeln!(out, "#include <{include}>");
        }
        out.push('\n');
        out
    }
}

/// Entry point of the k-th unit (k >= 2).
pub fn continuation_name(module: &str, k: usize) -> String {
    format!("bind_{module}_{k}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{EntityPlan, PlanKind};
    use binder_core::Capacity;
    use pretty_assertions::assert_eq;

    fn typedefs(name: &str, n: usize, capacity: Option<Capacity>) -> ModulePlan {
        ModulePlan {
            name: name.into(),
            includes: vec![format!("{name}_Module.h")],
            imports: vec![],
            prologue: vec![],
            epilogue: vec![],
            capacity,
            entities: (0..n)
                .map(|i| EntityPlan {
                    id: format!("T{i}").into(),
                    dependencies: vec![],
                    kind: PlanKind::Typedef,
                })
                .collect(),
        }
    }

    fn options() -> EmitOptions {
        EmitOptions {
            banner: "// banner".into(),
            ..EmitOptions::default()
        }
    }

    #[test]
    fn single_unit_layout() {
        let options = options();
        let units = Emitter::new(&options)
            .render_module(&typedefs("Test", 1, None))
            .unwrap();
        assert_eq!(units.len(), 1);
        assert_eq!(units[0].file_name, "Test.cxx");
        assert_eq!(
            units[0].text,
            "// banner\n\
             #include <pyOCCT_Common.hxx>\n\
             #include <Test_Module.h>\n\
             \n\
             PYBIND11_MODULE(Test, mod) {\n\
             \n\
             // TYPEDEF: T0\n\
             \n\
             }\n"
        );
    }

    #[test]
    fn continuations_declared_and_invoked_in_order() {
        let options = options();
        let units = Emitter::new(&options)
            .render_module(&typedefs("TestSplit", 3, Some(Capacity::Entities(1))))
            .unwrap();
        let names: Vec<&str> = units.iter().map(|u| u.file_name.as_str()).collect();
        assert_eq!(names, vec!["TestSplit.cxx", "TestSplit_2.cxx", "TestSplit_3.cxx"]);

        let primary = &units[0].text;
        assert!(primary.contains(
            "// Functions for split modules\nvoid bind_TestSplit_2(py::module&);\nvoid bind_TestSplit_3(py::module&);\n"
        ));
        let own = primary.find("// TYPEDEF: T0").unwrap();
        let second = primary.find("bind_TestSplit_2(mod);").unwrap();
        let third = primary.find("bind_TestSplit_3(mod);").unwrap();
        assert!(own < second && second < third);

        assert_eq!(units[1].entry_point, "bind_TestSplit_2");
        assert!(units[1].text.contains("void bind_TestSplit_2(py::module &mod) {\n\n// TYPEDEF: T1\n\n}\n"));
        assert!(!units[1].text.contains("PYBIND11_MODULE"));
    }

    #[test]
    fn prologue_imports_and_epilogue() {
        let options = options();
        let mut plan = typedefs("Test", 1, None);
        plan.prologue = vec!["// prologue".into()];
        plan.epilogue = vec!["// epilogue".into()];
        plan.imports = vec!["OCCT.Standard".into()];
        let text = &Emitter::new(&options).render_module(&plan).unwrap()[0].text;

        let prologue = text.find("// prologue").unwrap();
        let entry = text.find("PYBIND11_MODULE").unwrap();
        let import = text.find("py::module::import(\"OCCT.Standard\");").unwrap();
        let body = text.find("// TYPEDEF").unwrap();
        let epilogue = text.find("// epilogue").unwrap();
        assert!(prologue < entry && entry < import && import < body && body < epilogue);
        assert!(text.ends_with("// epilogue\n\n}\n"));
    }

    #[test]
    fn empty_module_still_has_entry_point() {
        let options = options();
        let units = Emitter::new(&options)
            .render_module(&typedefs("Empty", 0, Some(Capacity::Entities(4))))
            .unwrap();
        assert_eq!(units.len(), 1);
        assert!(units[0].text.contains("PYBIND11_MODULE(Empty, mod) {"));
    }
}
