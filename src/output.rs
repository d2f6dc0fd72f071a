//! Reading the entity model and writing rendered units.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use binder_compiler::EmittedUnit;
use binder_core::{ModuleDef, SignatureHash};
use tempfile::NamedTempFile;

use crate::error::{BinderError, Result};

/// Load one module's entity model from JSON.
pub fn load_module(path: impl AsRef<Path>) -> Result<ModuleDef> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| BinderError::io(path, e))?;
    serde_json::from_str(&text).map_err(|source| BinderError::Model {
        path: path.to_path_buf(),
        source,
    })
}

/// What happened to each unit on disk.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub written: Vec<PathBuf>,
    /// Units whose file already held identical text.
    pub unchanged: Vec<PathBuf>,
}

/// Write units into `dir`.
///
/// Each file is replaced atomically: the text goes to a temporary file in
/// the same directory which is then renamed over the target, so a failed
/// write never leaves a truncated unit behind.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn write_units(dir: impl AsRef<Path>, units: &[EmittedUnit]) -> Result<WriteReport> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| BinderError::io(dir, e))?;

    let mut report = WriteReport::default();
    for unit in units {
        let target = dir.join(&unit.file_name);
        if is_unchanged(&target, &unit.text) {
            tracing::debug!(file = %target.display(), "unchanged, skipped");
            report.unchanged.push(target);
            continue;
        }

        let mut temp = NamedTempFile::new_in(dir).map_err(|e| BinderError::io(dir, e))?;
        if let Err(e) = temp.write_all(unit.text.as_bytes()) {
            return Err(BinderError::io(temp.path(), e));
        }
        temp.persist(&target)
            .map_err(|e| BinderError::io(&target, e.error))?;

        tracing::debug!(file = %target.display(), bytes = unit.text.len(), "written");
        report.written.push(target);
    }
    Ok(report)
}

fn is_unchanged(target: &Path, text: &str) -> bool {
    match fs::read_to_string(target) {
        Ok(existing) => SignatureHash::from_content(&existing) == SignatureHash::from_content(text),
        Err(_) => false,
    }
}
