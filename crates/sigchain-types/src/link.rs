//! The chain link model (spec.md §3, Component A).

use crate::ids::{Kid, LinkId, SigId, Uid, ZERO_LINK_ID};
use alloy_primitives::{B256, Bytes};
use serde::{Deserialize, Serialize};

/// Which of the two coexisting signature formats produced a link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SigVersion {
    /// Inner-only format: the signature covers the full payload directly.
    V1 = 1,
    /// Outer+inner split format, which additionally permits stubbing.
    V2 = 2,
}

/// Semantic role a link plays, as produced by the external `LinkTyper`
/// collaborator (spec.md §1: "link payload parsing ... abstracted as a
/// `LinkTyper`").
///
/// This is the tagged-variant replacement for dynamic runtime type-tagging
/// called for in spec.md §9 ("Dynamic link-type classification").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LinkType {
    /// Installs the account's eldest (root) key.
    Eldest,
    /// Delegates a sibling key (full signing authority).
    Sibkey,
    /// Delegates a subordinate key (restricted authority).
    Subkey,
    /// Revokes one or more previously-delegated keys.
    Revoke,
    /// Registers or updates a device.
    Device,
    /// Refreshes the account's active PGP full-hash.
    PgpUpdate,
    /// Records a new per-user-key generation.
    PerUserKey,
    /// Binds or updates a Stellar wallet address.
    WalletStellar,
    /// Tracks another user; never modifies key state.
    Track,
    /// Any link type the core does not need to special-case.
    Other,
}

impl LinkType {
    /// Whether a link of this type may legally be a v2 stub (outer-only, no
    /// inner payload or signature).
    ///
    /// Key-modifying link types must always be sent inflated: the evaluator
    /// needs their payload to update key state, and a stub would silently
    /// hide a delegation or revocation from the client. `WalletStellar` is
    /// stubbable but separately tracked (spec.md §4.5) because stubbing it
    /// can roll back the client's view of the active wallet address.
    pub const fn allows_stubbing(self) -> bool {
        matches!(self, Self::Track | Self::Device | Self::WalletStellar | Self::Other)
    }

    /// Whether a link of this type installs, modifies, or revokes key state,
    /// and therefore forces an eager signature check under the elision rule
    /// of spec.md §4.2.
    pub const fn modifies_keys(self) -> bool {
        matches!(
            self,
            Self::Eldest | Self::Sibkey | Self::Subkey | Self::Revoke | Self::PerUserKey
        )
    }
}

/// `(seqno, link_id)` pair used for the high-priority skip-chain
/// (spec.md §3, "High-Prev Info").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighPrevInfo {
    /// Seqno of the referenced high-priority link.
    pub seqno: crate::ids::Seqno,
    /// Link ID of the referenced high-priority link.
    pub link_id: LinkId,
}

impl HighPrevInfo {
    /// The initial value before any high-priority link has appeared.
    pub const ZERO: Self = Self { seqno: crate::ids::Seqno(0), link_id: ZERO_LINK_ID };
}

impl Default for HighPrevInfo {
    fn default() -> Self {
        Self::ZERO
    }
}

/// `(seqno, link_id, sig_id)` summarizing a chain tail from an external
/// source (local cache, server, or merkle tree).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleTriple {
    /// Seqno of the attested tail link.
    pub seqno: crate::ids::Seqno,
    /// Link ID of the attested tail link.
    pub link_id: LinkId,
    /// Signature ID of the attested tail link.
    pub sig_id: SigId,
}

/// Cached key state attached to a link that was the tail of a subchain the
/// evaluator has already computed (spec.md §4.5 step 1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CkiCache {
    /// The [`crate::cki::COMPUTED_KEY_INFOS_VERSION_CURRENT`] this cache was
    /// computed under; a mismatch marks it stale.
    pub version: u32,
    /// The cached key state.
    pub cki: crate::cki::Cki,
}

/// One immutable append to a user's sigchain (spec.md §3, "Chain Link").
///
/// The "derived cache fields" (`chain_verified`, `sig_verified`,
/// `cki_cache`) are mutable but monotonic: once set they are only ever
/// refreshed to a newer, equally-or-more-verified state, never unset, per
/// spec.md §3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    /// Position in the chain; strictly positive, dense from 1.
    pub seqno: crate::ids::Seqno,
    /// Content hash of the previous link's canonical form. Absent iff
    /// `seqno == 1`.
    pub prev: Option<LinkId>,
    /// Content hash of this link's own canonical form.
    pub link_id: LinkId,
    /// Identifier of the detached signature.
    pub sig_id: SigId,
    /// The detached signature bytes.
    pub signature: Bytes,
    /// Which wire format produced this link.
    pub sig_version: SigVersion,
    /// Key that produced `signature`.
    pub signing_kid: Kid,
    /// The account's eldest key as of signing. Absent only in very old v1
    /// links, in which case `signing_kid` is assumed eldest.
    pub eldest_kid: Option<Kid>,
    /// Semantic role of this link, from the external `LinkTyper`.
    pub link_type: LinkType,
    /// For `Sibkey`/`Subkey` links, the key the payload delegates — distinct
    /// from `signing_kid`, the already-trusted key that performed the
    /// delegation. Populated at import time from the inner payload.
    pub delegated_kid: Option<Kid>,
    /// For `PgpUpdate` links, the refreshed PGP full-hash for `signing_kid`.
    pub pgp_hash: Option<B256>,
    /// For `PerUserKey` links, the new per-user-key generation for
    /// `signing_kid`.
    pub per_user_key_generation: Option<u64>,
    /// Sparse skip-pointer to an earlier high-priority link.
    pub high_skip: Option<HighPrevInfo>,
    /// `true` for a v2 outer-only link (no inner payload, no signature).
    pub stubbed: bool,
    /// `true` if this link's sig ID appears on the known-bad list; such
    /// links must be ignored by the evaluator and segmenter.
    pub is_bad: bool,
    /// Uid embedded in the (inner, or outer-for-stubs) payload, checked
    /// against the chain's bound uid by the verifier.
    pub uid: Uid,
    /// Username embedded in the payload, checked against the chain's bound
    /// username by the verifier.
    pub username: String,
    /// Set at import time when the load is for the chain owner and this
    /// link originated from the server rather than the local cache
    /// (spec.md §4.1 step 4).
    pub is_own_new_link_from_server: bool,

    /// Derived: structural (non-cryptographic) checks passed.
    pub chain_verified: bool,
    /// Derived: the link's own signature has been cryptographically
    /// verified.
    pub sig_verified: bool,
    /// Derived: if this link was the tail of a subchain the evaluator
    /// already walked, the resulting key state.
    pub cki_cache: Option<CkiCache>,
}

impl Link {
    /// Returns `true` if this link is the first of its chain.
    pub const fn is_genesis(&self) -> bool {
        self.seqno.0 == 1
    }
}
