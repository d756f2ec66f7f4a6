//! Loader, verifier, segmenter, and evaluator for the sigchain data model.
//!
//! This crate implements the read-side pipeline that turns a locally cached
//! link list plus whatever a server and a merkle tree attest into a
//! verified [`sigchain_types::Chain`] and its current key state. It knows
//! nothing about HTTP, an on-disk format, or a concrete signature scheme;
//! those live behind the traits in [`ports`], supplied by the embedding
//! application (and, for storage, by `sigchain-storage`).

pub mod bad_links;
pub mod config;
pub mod error;
pub mod evaluator;
pub mod freshness;
pub mod loader;
pub mod overlay;
pub mod ports;
pub mod segmenter;
pub mod verifier;

pub use bad_links::{historical_reset_sig_ids, StaticSigIdSet};
pub use config::Config;
pub use error::{LoadError, ServerChainError, StorageError};
pub use loader::{load, LoaderDeps};
pub use overlay::{apply_local_action, clear_overlay, overlay_is_fresh, LocalAction};
