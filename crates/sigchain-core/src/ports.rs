//! External collaborator traits (spec.md §6).
//!
//! The loader pipeline is written entirely against these ports; nothing in
//! `sigchain-core` knows about HTTP, an on-disk format, or a concrete
//! cryptographic library. `sigchain-storage` provides a `LocalStore`
//! implementation; a `Transport`, `MerkleOracle`, `Verifier`, `Hasher`, and
//! `LinkTyper` are supplied by the embedding application.

use crate::error::StorageError;
use async_trait::async_trait;
use auto_impl::auto_impl;
use sigchain_types::{Kid, Link, LinkId, LinkType, MerkleTriple, Uid};

/// Fetches new links from the untrusted server (spec.md §6 "Transport").
#[async_trait]
#[auto_impl(&, &mut, Arc, Box)]
pub trait Transport: Send + Sync {
    /// The error type this transport can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// `GET sig/get?uid=&low=&v2_compressed=true`.
    ///
    /// Returns opaque per-link byte payloads with `seqno > low`, in
    /// ascending seqno order. A server-reported "user deleted" status must
    /// be surfaced as [`TransportResponse::UserDeleted`] rather than an
    /// `Err`, since it is a meaningful, expected response rather than a
    /// transport failure.
    async fn fetch_links(&self, uid: Uid, low: u64) -> Result<TransportResponse, Self::Error>;
}

/// Outcome of a [`Transport::fetch_links`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportResponse {
    /// The server returned a (possibly empty) batch of raw link payloads.
    Links(Vec<Vec<u8>>),
    /// The server reports this uid as deleted.
    UserDeleted,
}

/// The user's local key/value cache (spec.md §6 "LocalStore").
#[async_trait]
#[auto_impl(&, &mut, Arc, Box)]
pub trait LocalStore: Send + Sync {
    /// Returns the locally cached public tail triple for `uid`, if any.
    async fn public_tail(&self, uid: Uid) -> Result<Option<MerkleTriple>, StorageError>;

    /// Returns the locally cached private tail triple for `uid`, if any.
    async fn private_tail(&self, uid: Uid) -> Result<Option<MerkleTriple>, StorageError>;

    /// Looks up a single cached link by its content hash.
    async fn get_link(&self, uid: Uid, link_id: LinkId) -> Result<Option<Link>, StorageError>;

    /// Persists a verified link, keyed by its `link_id`. Writing a link
    /// whose `link_id` already exists with identical bytes is a no-op
    /// (SPEC_FULL.md §4.9 "Idempotent re-import").
    async fn put_link(&self, uid: Uid, link: &Link) -> Result<(), StorageError>;

    /// Persists the new public tail triple.
    async fn put_public_tail(&self, uid: Uid, tail: MerkleTriple) -> Result<(), StorageError>;

    /// Persists the new private tail triple.
    async fn put_private_tail(&self, uid: Uid, tail: MerkleTriple) -> Result<(), StorageError>;
}

/// The globally-trusted merkle tree attestation service (spec.md §6
/// "MerkleOracle").
#[async_trait]
#[auto_impl(&, &mut, Arc, Box)]
pub trait MerkleOracle: Send + Sync {
    /// The error type this oracle can fail with.
    type Error: std::error::Error + Send + Sync + 'static;

    /// `LookupUser(uid)`.
    async fn lookup_user(&self, uid: Uid) -> Result<MerkleUserLeaf, Self::Error>;
}

/// The merkle tree's attestation of a single user's chain tails and eldest
/// key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerkleUserLeaf {
    /// The publicly-visible chain's attested tail, if the user has one.
    pub public: Option<MerkleTriple>,
    /// The private chain's attested tail, if the user has one.
    pub private: Option<MerkleTriple>,
    /// The user's current eldest key as attested by the tree.
    pub eldest: Kid,
}

/// Cryptographic signature verification (spec.md §6 "Verifier").
#[auto_impl(&, &mut, Arc, Box)]
pub trait Verifier: Send + Sync {
    /// Verifies `sig` over `payload` under `kid`.
    fn verify_signature(&self, kid: Kid, payload: &[u8], sig: &[u8]) -> bool;

    /// Verifies a delegating link's reverse signature: the newly delegated
    /// key's countersignature proving cooperation (spec.md §4.2).
    fn verify_reverse_signature(&self, link: &Link) -> bool;
}

/// Content hashing used to compute `link_id` from canonical bytes.
#[auto_impl(&, &mut, Arc, Box)]
pub trait Hasher: Send + Sync {
    /// Hashes `canonical_bytes` into a [`LinkId`].
    fn hash_link(&self, canonical_bytes: &[u8]) -> LinkId;
}

/// Classifies a link's raw payload into its semantic [`LinkType`]
/// (spec.md §1 "link payload parsing").
#[auto_impl(&, &mut, Arc, Box)]
pub trait LinkTyper: Send + Sync {
    /// Returns the semantic role of the link described by `raw_payload`.
    fn classify(&self, raw_payload: &[u8]) -> LinkType;
}
