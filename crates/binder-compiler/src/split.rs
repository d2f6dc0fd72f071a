//! Output splitting.
//!
//! Partitions a module's planned entities into emission units. Units keep the
//! resolved order, so every dependency is still registered before its
//! dependents; the continuation units run in partition order right after the
//! primary unit's own entities.
//!
//! A boundary directly between an entity and a dependency immediately before
//! it is not allowed. Such a boundary moves earlier within the unit, or later
//! when no earlier position exists.

use std::ops::Range;

use binder_core::{Capacity, ConfigError};

use crate::plan::ModulePlan;

/// Partition the module into unit ranges over [`ModulePlan::entities`].
///
/// `line_counts[i]` is the rendered line count of entity `i`; it is only
/// consulted for [`Capacity::Lines`]. With no capacity the module is one unit.
pub fn split(plan: &ModulePlan, line_counts: &[usize]) -> Result<Vec<Range<usize>>, ConfigError> {
    let n = plan.entities.len();
    let Some(capacity) = plan.capacity else {
        return Ok(vec![0..n]);
    };
    if capacity.limit() == 0 {
        return Err(ConfigError::InvalidCapacity {
            module: plan.name.clone(),
        });
    }

    let weight = |i: usize| match capacity {
        Capacity::Entities(_) => 1,
        Capacity::Lines(_) => line_counts.get(i).copied().unwrap_or(1),
    };
    let boundary_allowed = |b: usize| !plan.entities[b].dependencies.contains(&(b - 1));

    let mut units = Vec::new();
    let mut start = 0;
    while start < n {
        let mut end = start;
        let mut total = 0;
        while end < n && (end == start || total + weight(end) <= capacity.limit()) {
            total += weight(end);
            end += 1;
        }

        if end < n && !boundary_allowed(end) {
            end = (start + 1..end)
                .rev()
                .find(|&b| boundary_allowed(b))
                .or_else(|| (end + 1..n).find(|&b| boundary_allowed(b)))
                .unwrap_or(n);
        }

        units.push(start..end);
        start = end;
    }

    if units.is_empty() {
        units.push(0..0);
    }
    tracing::debug!(module = %plan.name, units = units.len(), "module partitioned");
    Ok(units)
}
