//! Deterministic hash-based overload identity.
//!
//! [`SignatureHash`] identifies one callable signature within an overload set.
//! It is computed from the callable name, the identity spelling of every
//! parameter type, and the qualifiers of the implicit object parameter. The
//! return type is deliberately absent: the host framework selects overloads
//! purely on parameters and object constness, so two overloads with equal
//! hashes are indistinguishable to it.
//!
//! # Examples
//!
//! ```
//! use binder_core::{SignatureHash, TypeRef};
//!
//! let by_value = SignatureHash::from_callable("f", &[TypeRef::primitive("int")], false, None);
//! let by_ref = SignatureHash::from_callable("f", &[TypeRef::primitive("const int &")], false, None);
//! assert_ne!(by_value, by_ref);
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

use crate::{Overload, RefQualifier, TypeRef};

/// Domain-specific mixing constants for hash computation.
pub mod hash_constants {
    /// Separator constant for parameter positions
    pub const SEP: u64 = 0x4bc94d6bd06053ad;

    /// Domain marker for callable signatures
    pub const CALLABLE: u64 = 0x5ea77ffbcdf5f302;

    /// Domain marker for constructor signatures
    pub const CONSTRUCTOR: u64 = 0x9a7f3d5e2b8c4601;

    /// Domain marker for rendered unit contents
    pub const CONTENT: u64 = 0x1a095090689d4647;

    /// Parameter position mixing constants.
    /// Each parameter position gets a unique constant to ensure parameter order matters.
    pub const PARAM_MARKERS: [u64; 16] = [
        0x9e3779b97f4a7c15,
        0xbf58476d1ce4e5b9,
        0x94d049bb133111eb,
        0xd6e8feb86659fd93,
        0xe7037ed1a0b428db,
        0xc6a4a7935bd1e995,
        0x8648dbbc94d49b8d,
        0xa2b48b2c69e0d657,
        0x7c3e9f2a5b8d1403,
        0x5d8c7b4a3e9f2106,
        0x3f1e9d8c7b5a4203,
        0x1a2b3c4d5e6f7089,
        0x9f8e7d6c5b4a3210,
        0x2468ace013579bdf,
        0xfdb97531eca86420,
        0x123456789abcdef0,
    ];
}

/// A deterministic 64-bit hash identifying one overload signature.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct SignatureHash(pub u64);

impl SignatureHash {
    /// Hash of a function or method signature.
    ///
    /// Parameter order matters; `(int, double)` and `(double, int)` differ.
    pub fn from_callable(
        name: &str,
        params: &[TypeRef],
        is_const: bool,
        ref_qualifier: Option<RefQualifier>,
    ) -> Self {
        let qualifier = match ref_qualifier {
            None => 0x0,
            Some(RefQualifier::LValue) => 0x2,
            Some(RefQualifier::RValue) => 0x4,
        };
        let modifier = if is_const { 0x1 } else { 0x0 } | qualifier;
        let seed = hash_constants::CALLABLE ^ xxh64(name.as_bytes(), 0) ^ modifier;
        SignatureHash(mix_params(seed, params))
    }

    /// Hash of a declared overload under `name`.
    pub fn from_overload(name: &str, overload: &Overload) -> Self {
        Self::from_callable(
            name,
            &overload.param_types(),
            overload.is_const,
            overload.ref_qualifier,
        )
    }

    /// Hash of a constructor signature.
    pub fn from_constructor(params: &[TypeRef]) -> Self {
        SignatureHash(mix_params(hash_constants::CONSTRUCTOR, params))
    }

    /// Content hash of rendered text.
    pub fn from_content(text: &str) -> Self {
        SignatureHash(hash_constants::CONTENT ^ xxh64(text.as_bytes(), 0))
    }

    /// Get the raw u64 value.
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

fn mix_params(seed: u64, params: &[TypeRef]) -> u64 {
    let mut hash = seed;
    for (i, param) in params.iter().enumerate() {
        let marker = hash_constants::PARAM_MARKERS
            .get(i)
            .copied()
            .unwrap_or_else(|| hash_constants::PARAM_MARKERS[0].wrapping_add(i as u64));
        let param_hash = xxh64(param.identity().as_bytes(), 0);
        // wrapping_mul keeps parameter order significant
        hash = hash
            .wrapping_mul(hash_constants::SEP)
            .wrapping_add(marker ^ param_hash);
    }
    hash
}

impl fmt::Debug for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SignatureHash({:#018x})", self.0)
    }
}

impl fmt::Display for SignatureHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#018x}", self.0)
    }
}
