//! Return-value lifetime policy inference.
//!
//! | Return | Owner | Policy |
//! |---|---|---|
//! | marked owning | any | `take_ownership` |
//! | value, const reference | any | `copy` |
//! | mutable reference | none, self | `reference_internal` |
//! | pointer | self | `reference_internal` |
//! | pointer | none, external | `reference` |
//! | reference, pointer | param(i) | `reference` + keep the argument alive |
//!
//! Static members and free functions have no invoking object, so "self"
//! degrades to `reference`. An explicit per-overload policy replaces the
//! table result.

use binder_core::{KeepAlive, Overload, RefCategory, ReturnOwner, ReturnPolicy};

/// How a callable receives its arguments, which fixes keep-alive numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallableKind {
    /// Non-static member: argument 1 is `this`.
    Method,
    /// Static member or free function: argument 1 is the first parameter.
    Function,
}

impl CallableKind {
    /// Host-framework index of a zero-based parameter.
    fn argument_index(self, param: usize) -> u32 {
        let offset = match self {
            CallableKind::Method => 2,
            CallableKind::Function => 1,
        };
        param as u32 + offset
    }
}

/// The lifetime handling chosen for one overload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifetimePolicy {
    pub policy: ReturnPolicy,
    /// Set when the policy came from an annotation rather than the table.
    pub explicit: bool,
    pub keep_alive: Vec<KeepAlive>,
}

impl LifetimePolicy {
    /// Policy annotation to render, if any.
    ///
    /// An inferred `copy` is the host default for these returns and is left
    /// implicit.
    pub fn rendered(&self) -> Option<ReturnPolicy> {
        if !self.explicit && self.policy == ReturnPolicy::Copy {
            None
        } else {
            Some(self.policy)
        }
    }

    /// Replace the policy with an external override.
    pub fn override_with(mut self, policy: ReturnPolicy) -> Self {
        self.policy = policy;
        self.explicit = true;
        self
    }

    /// Append keep-alive pairs, skipping ones already present.
    pub fn with_keep_alive(mut self, pairs: impl IntoIterator<Item = KeepAlive>) -> Self {
        for pair in pairs {
            if !self.keep_alive.contains(&pair) {
                self.keep_alive.push(pair);
            }
        }
        self
    }
}

/// Infer the lifetime policy of an overload's return value.
pub fn infer_policy(overload: &Overload, kind: CallableKind) -> LifetimePolicy {
    let ret = &overload.ret;
    let mut keep_alive = Vec::new();

    let policy = if ret.owning {
        ReturnPolicy::TakeOwnership
    } else {
        match (ret.category, ret.owner) {
            (RefCategory::Value | RefCategory::ConstReference, _) => ReturnPolicy::Copy,
            (RefCategory::MutableReference | RefCategory::Pointer, Some(ReturnOwner::Param(i))) => {
                keep_alive.push(KeepAlive::new(0, kind.argument_index(i)));
                ReturnPolicy::Reference
            }
            (RefCategory::MutableReference, None | Some(ReturnOwner::SelfObject))
            | (RefCategory::Pointer, Some(ReturnOwner::SelfObject)) => match kind {
                CallableKind::Method => ReturnPolicy::ReferenceInternal,
                CallableKind::Function => ReturnPolicy::Reference,
            },
            (RefCategory::MutableReference, Some(ReturnOwner::External))
            | (RefCategory::Pointer, None | Some(ReturnOwner::External)) => ReturnPolicy::Reference,
        }
    };

    let inferred = LifetimePolicy {
        policy,
        explicit: false,
        keep_alive,
    };
    let inferred = match overload.policy {
        Some(explicit) => inferred.override_with(explicit),
        None => inferred,
    };
    inferred.with_keep_alive(overload.keep_alive.iter().copied())
}

#[cfg(test)]
mod tests {
    use super::*;
    use binder_core::{ReturnType, TypeRef};

    fn returning(ret: ReturnType) -> Overload {
        Overload::new(ret)
    }

    fn category(spelling: &str, category: RefCategory) -> ReturnType {
        ReturnType::with_category(TypeRef::primitive(spelling), category)
    }

    #[test]
    fn value_is_copied_implicitly() {
        let p = infer_policy(
            &returning(ReturnType::value(TypeRef::primitive("int"))),
            CallableKind::Method,
        );
        assert_eq!(p.policy, ReturnPolicy::Copy);
        assert_eq!(p.rendered(), None);
    }

    #[test]
    fn const_reference_is_copied() {
        let p = infer_policy(
            &returning(category("const int &", RefCategory::ConstReference)),
            CallableKind::Method,
        );
        assert_eq!(p.policy, ReturnPolicy::Copy);
        assert_eq!(p.rendered(), None);
    }

    #[test]
    fn mutable_reference_tied_to_self() {
        let p = infer_policy(
            &returning(category("int &", RefCategory::MutableReference)),
            CallableKind::Method,
        );
        assert_eq!(p.rendered(), Some(ReturnPolicy::ReferenceInternal));
        assert!(p.keep_alive.is_empty());
    }

    #[test]
    fn mutable_reference_from_static_has_no_self() {
        let p = infer_policy(
            &returning(category("int &", RefCategory::MutableReference)),
            CallableKind::Function,
        );
        assert_eq!(p.policy, ReturnPolicy::Reference);
    }

    #[test]
    fn owning_pointer_transfers() {
        let p = infer_policy(
            &returning(category("Shape *", RefCategory::Pointer).owning()),
            CallableKind::Method,
        );
        assert_eq!(p.policy, ReturnPolicy::TakeOwnership);
    }

    #[test]
    fn third_party_owner_is_raw_reference() {
        let p = infer_policy(
            &returning(category("Shape *", RefCategory::Pointer).owned_by(ReturnOwner::External)),
            CallableKind::Method,
        );
        assert_eq!(p.policy, ReturnPolicy::Reference);
        assert!(p.keep_alive.is_empty());
    }

    #[test]
    fn parameter_owner_keeps_argument_alive() {
        let ret = category("Node &", RefCategory::MutableReference).owned_by(ReturnOwner::Param(0));
        let method = infer_policy(&returning(ret.clone()), CallableKind::Method);
        assert_eq!(method.policy, ReturnPolicy::Reference);
        assert_eq!(method.keep_alive, vec![KeepAlive::new(0, 2)]);

        let function = infer_policy(&returning(ret), CallableKind::Function);
        assert_eq!(function.keep_alive, vec![KeepAlive::new(0, 1)]);
    }

    #[test]
    fn explicit_override_wins_for_every_category() {
        for ret in [
            ReturnType::value(TypeRef::primitive("int")),
            category("const int &", RefCategory::ConstReference),
            category("int &", RefCategory::MutableReference),
            category("int *", RefCategory::Pointer).owning(),
        ] {
            let overload = returning(ret).with_policy(ReturnPolicy::Move);
            let p = infer_policy(&overload, CallableKind::Method);
            assert_eq!(p.rendered(), Some(ReturnPolicy::Move));
        }
    }

    #[test]
    fn explicit_copy_is_rendered() {
        let overload = returning(category("int &", RefCategory::MutableReference))
            .with_policy(ReturnPolicy::Copy);
        let p = infer_policy(&overload, CallableKind::Method);
        assert_eq!(p.rendered(), Some(ReturnPolicy::Copy));
    }

    #[test]
    fn declared_keep_alive_appended_once() {
        let overload = returning(ReturnType::void())
            .with_keep_alive(KeepAlive::new(1, 2))
            .with_keep_alive(KeepAlive::new(1, 2));
        let p = infer_policy(&overload, CallableKind::Method);
        assert_eq!(p.keep_alive, vec![KeepAlive::new(1, 2)]);
    }
}
