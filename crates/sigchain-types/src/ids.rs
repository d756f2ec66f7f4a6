//! Newtype identifiers used throughout the sigchain data model.
//!
//! Every identifier that crosses a storage or wire boundary gets its own type
//! instead of a bare `B256`/`String`, so that a `Uid` and a `Kid` can never be
//! swapped at a call site without a type error.

use alloy_primitives::B256;
use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A user ID. Opaque to the core beyond equality and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct Uid(pub B256);

/// A key ID (the fingerprint of a public key known to the sigchain).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct Kid(pub B256);

/// A device ID, keying the parallel device map carried by [`crate::Cki`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct DeviceId(pub String);

/// A signature ID: the detached signature's own content-addressed identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct SigId(pub B256);

/// A link ID: the content hash of a link's canonical byte form.
///
/// For v2 links this hashes the outer form; for v1 links it hashes the inner
/// payload (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct LinkId(pub B256);

/// The all-zero link ID used as the initial high-prev pointer (spec.md §3,
/// "High-Prev Info").
pub const ZERO_LINK_ID: LinkId = LinkId(B256::ZERO);

/// A strictly positive, densely-allocated sequence number.
///
/// `spec.md` requires `seqno[i] == seqno[i-1] + 1` starting from `1`; this
/// type does not itself enforce that (the [`crate::link::Link`] invariant
/// checks live in the verifier, which has the surrounding context), it only
/// prevents accidental confusion with an unrelated `u64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
pub struct Seqno(pub u64);

impl Seqno {
    /// The first seqno in any chain.
    pub const ONE: Self = Self(1);

    /// Returns the next seqno after this one.
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns `true` if this is the first link of a chain.
    pub const fn is_first(self) -> bool {
        self.0 == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seqno_next_increments() {
        assert_eq!(Seqno(4).next(), Seqno(5));
    }

    #[test]
    fn seqno_one_is_first() {
        assert!(Seqno::ONE.is_first());
        assert!(!Seqno(2).is_first());
    }

    #[test]
    fn ids_roundtrip_json() {
        let uid = Uid(B256::repeat_byte(0x11));
        let json = serde_json::to_string(&uid).unwrap();
        let back: Uid = serde_json::from_str(&json).unwrap();
        assert_eq!(uid, back);
    }
}
