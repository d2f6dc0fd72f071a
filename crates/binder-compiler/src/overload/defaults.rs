//! Default-argument overlap detection.
//!
//! Overload A with `n` parameters whose first default sits at index `k` can
//! be called with any `m` arguments where `k <= m < n`. If another overload B
//! of the same name takes exactly `m` parameters of the same types, a call
//! with `m` arguments matches both. The host framework tries overloads in
//! registration order, so this is reported but not rejected.

use binder_core::{Overload, Warning};

use super::signature::signature_text;

/// Warnings for every overlapping pair in an overload set.
pub fn default_overlaps(owner: &str, name: &str, overloads: &[Overload]) -> Vec<Warning> {
    let mut warnings = Vec::new();
    for (i, longer) in overloads.iter().enumerate() {
        let Some(first_default) = longer.first_default() else {
            continue;
        };
        let n = longer.params.len();
        for (j, shorter) in overloads.iter().enumerate() {
            let m = shorter.params.len();
            if i == j || m < first_default || m >= n {
                continue;
            }
            if longer.is_static != shorter.is_static {
                continue;
            }
            let shared_prefix = longer.params[..m]
                .iter()
                .zip(&shorter.params)
                .all(|(a, b)| a.ty.identity() == b.ty.identity());
            if shared_prefix {
                warnings.push(Warning::DefaultArgumentOverlap {
                    owner: owner.to_string(),
                    name: name.to_string(),
                    shorter: signature_text(shorter),
                    longer: signature_text(longer),
                });
            }
        }
    }
    warnings
}
