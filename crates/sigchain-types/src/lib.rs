//! Core data model for the sigchain loader and verifier.
//!
//! This crate defines the fundamental, pure-data types shared across the
//! verifier, segmenter, evaluator, and storage layers: chain links, the
//! computed key state they accumulate into, and the identifiers that tie
//! them together. It has no I/O and no knowledge of transport, storage, or
//! merkle tree wire formats; those live behind the trait ports in
//! `sigchain-core`.

pub mod chain;
pub mod cki;
pub mod hex_string_u64;
pub mod ids;
pub mod link;

pub use chain::{Chain, HistoricalSubchain};
pub use cki::{COMPUTED_KEY_INFOS_VERSION_CURRENT, Cki, KeyInfo, Role};
pub use hex_string_u64::HexStringU64;
pub use ids::{DeviceId, Kid, LinkId, Seqno, SigId, Uid, ZERO_LINK_ID};
pub use link::{CkiCache, HighPrevInfo, Link, LinkType, MerkleTriple, SigVersion};
