//! [`crate::loader`] and component errors.

use thiserror::Error;

/// Error taxonomy for the loader pipeline and the components it drives
/// (spec.md §7).
#[derive(Debug, Error)]
pub enum LoadError {
    /// The server reports the user as deleted.
    #[error("user deleted")]
    UserDeleted,

    /// The server response disagreed with the merkle attestation: missing
    /// tail, rollback, or wrong tail.
    #[error(transparent)]
    ServerChainError(#[from] ServerChainError),

    /// `prev` did not equal the previous link's `link_id`.
    #[error("prev hash mismatch at seqno {seqno}")]
    PrevHashMismatch {
        /// Seqno of the offending link.
        seqno: u64,
    },

    /// `seqno` was not `previous + 1`.
    #[error("wrong seqno: expected {expected}, got {got}")]
    WrongSeqno {
        /// Expected seqno.
        expected: u64,
        /// Seqno actually present.
        got: u64,
    },

    /// Embedded username/uid disagreed with the chain's bound identity.
    #[error("embedded name or uid mismatch at seqno {seqno}")]
    NameOrIdMismatch {
        /// Seqno of the offending link.
        seqno: u64,
    },

    /// A declared high-prev did not match the computed expected value.
    #[error("high-prev mismatch at seqno {seqno}")]
    HighPrevMismatch {
        /// Seqno of the offending link.
        seqno: u64,
    },

    /// The first link of a subchain was stubbed.
    #[error("first link of subchain is stubbed")]
    StubbedFirstLink,

    /// The final link of a subchain was stubbed.
    #[error("final link of subchain is stubbed")]
    StubbedFinalLink,

    /// A link that must carry a signature was stubbed.
    #[error("stubbed link requires a signature")]
    StubbedSignatureNeeded,

    /// A link's type does not permit stubbing.
    #[error("link type does not allow stubbing")]
    StubbedDisallowed,

    /// A v2-only feature was used by a v1 link.
    #[error("sigchain v2 required")]
    SigchainV2Required,

    /// Outer/inner field disagreement, or the raw bytes did not parse.
    #[error("malformed link")]
    MalformedLink,

    /// A link's own signature failed cryptographic verification.
    #[error("signature invalid")]
    SignatureInvalid,

    /// A delegating link's reverse signature failed cryptographic
    /// verification.
    #[error("reverse signature invalid")]
    ReverseSignatureInvalid,

    /// A delegation could not be applied to the key family (e.g. signer not
    /// active).
    #[error("delegation invalid")]
    DelegationInvalid,

    /// An assertion that should be unreachable in well-formed input was
    /// violated (e.g. the evaluator reached an empty subchain).
    #[error("internal error: {0}")]
    InternalError(String),

    /// The structural pass requests a full reverify; the loader retries
    /// once automatically and this variant should not normally escape.
    #[error("reverify needed")]
    UserReverifyNeeded,

    /// The stored or fetched data could not round-trip through the local
    /// store.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PartialEq for LoadError {
    fn eq(&self, other: &Self) -> bool {
        use LoadError::*;
        match (self, other) {
            (UserDeleted, UserDeleted)
            | (StubbedFirstLink, StubbedFirstLink)
            | (StubbedFinalLink, StubbedFinalLink)
            | (StubbedSignatureNeeded, StubbedSignatureNeeded)
            | (StubbedDisallowed, StubbedDisallowed)
            | (SigchainV2Required, SigchainV2Required)
            | (MalformedLink, MalformedLink)
            | (SignatureInvalid, SignatureInvalid)
            | (ReverseSignatureInvalid, ReverseSignatureInvalid)
            | (DelegationInvalid, DelegationInvalid)
            | (UserReverifyNeeded, UserReverifyNeeded) => true,
            (ServerChainError(a), ServerChainError(b)) => a == b,
            (PrevHashMismatch { seqno: a }, PrevHashMismatch { seqno: b }) => a == b,
            (WrongSeqno { expected: a, got: b }, WrongSeqno { expected: c, got: d }) => {
                a == c && b == d
            }
            (NameOrIdMismatch { seqno: a }, NameOrIdMismatch { seqno: b }) => a == b,
            (HighPrevMismatch { seqno: a }, HighPrevMismatch { seqno: b }) => a == b,
            (InternalError(a), InternalError(b)) => a == b,
            (Storage(a), Storage(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for LoadError {}

/// Sub-taxonomy for the freshness oracle's comparison failures
/// (spec.md §4.6).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ServerChainError {
    /// `local_tail` is present but the server reports no tail at all.
    #[error("server forgot user")]
    ServerForgotUser,

    /// `server_tail.seqno < local_tail.seqno`.
    #[error("server rolled back tail")]
    ServerRollback,

    /// Seqnos agree but `link_id` disagrees.
    #[error("wrong tail")]
    WrongTail,

    /// The fetched response did not reach the merkle-attested tail.
    #[error("server response did not reach attested tail")]
    IncompleteResponse,
}

/// Errors from the local store port, kept distinct from
/// `sigchain-storage`'s own error type so a `sigchain-core` consumer need
/// not depend on `sigchain-storage` directly.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StorageError {
    /// The underlying database returned an error.
    #[error("database error: {0}")]
    Database(String),

    /// A requested entry was not present.
    #[error("entry not found")]
    EntryNotFound,

    /// A write was attempted while another write was in flight for the same
    /// uid, which should never happen under the per-uid mutex discipline.
    #[error("conflicting concurrent write")]
    ConflictError,
}
