//! Loader Pipeline (spec.md §4.7, Component G).
//!
//! Orchestrates components A-F: cache read, fetch, verify, segment,
//! evaluate, persist.

use crate::bad_links::StaticSigIdSet;
use crate::config::Config;
use crate::error::LoadError;
use crate::evaluator;
use crate::freshness::{self, Freshness};
use crate::ports::{LocalStore, MerkleOracle, Transport, TransportResponse, Verifier};
use crate::segmenter;
use crate::verifier;
use sigchain_metrics::observe_metrics_for_result_async;
use sigchain_types::{Chain, Link, Uid};
use tracing::{debug, error, warn};

/// Everything the loader needs from the embedding application to run one
/// `Load()` (spec.md §4.7).
pub struct LoaderDeps<'a, T, S, M, V> {
    /// Fetches new links from the server.
    pub transport: &'a T,
    /// Reads/writes the local cache.
    pub local_store: &'a S,
    /// Attests chain tails and the current eldest key.
    pub merkle_oracle: &'a M,
    /// Verifies signatures.
    pub verifier: &'a V,
    /// Parses raw link bytes into a [`Link`].
    pub import_link: &'a dyn Fn(&[u8], Uid, bool) -> Result<Link, LoadError>,
    /// The hardcoded historical reset sig-id set (spec.md §4.4).
    pub historical_reset_ids: &'a StaticSigIdSet,
    /// The caller-supplied known-bad sig-id set (SPEC_FULL.md §4.9).
    pub bad_links: &'a StaticSigIdSet,
}

/// Runs the full loader pipeline for `uid`, returning the verified,
/// segmented, evaluated chain.
pub async fn load<T, S, M, V>(
    uid: Uid,
    username: &str,
    config: &Config,
    deps: &LoaderDeps<'_, T, S, M, V>,
    now: u64,
) -> Result<Chain, LoadError>
where
    T: Transport,
    S: LocalStore,
    M: MerkleOracle,
    V: Verifier,
{
    let mut chain = Chain::new(uid, username.to_string());

    // Step 2: reconstruct from LocalStore.
    hydrate_from_local_store(&mut chain, deps).await?;

    // Step 3: structural verify of whatever is cached.
    verifier::verify_chain(&mut chain, false)?;

    // Step 4: consult MerkleOracle, decide freshness.
    let leaf = deps
        .merkle_oracle
        .lookup_user(uid)
        .await
        .map_err(|e| LoadError::InternalError(e.to_string()))?;

    let future_tail = if crate::overlay::overlay_is_fresh(&chain, now, config.server_update_lag.as_secs()) {
        chain.local_tail
    } else {
        None
    };

    let cached_tail = chain
        .tail()
        .map(|link| sigchain_types::MerkleTriple { seqno: link.seqno, link_id: link.link_id, sig_id: link.sig_id });

    let freshness = freshness::check_freshness(cached_tail, leaf.public, future_tail)?;

    // Step 5: fetch if stale.
    if matches!(freshness, Freshness::Stale) {
        fetch_and_append(uid, &mut chain, deps, &leaf).await?;
        crate::overlay::clear_overlay(&mut chain);
    }

    // Step 6: re-verify the (possibly extended) chain.
    match verifier::verify_chain(&mut chain, false) {
        Ok(()) => {}
        Err(LoadError::UserReverifyNeeded) => {
            warn!(target: "sigchain::loader", uid = %uid, "reverify requested, retrying once");
            verifier::verify_chain(&mut chain, true)?;
        }
        Err(e) => return Err(e),
    }

    // Step 7: segment into current + historical subchains.
    segmenter::segment(&mut chain, leaf.eldest, deps.historical_reset_ids)?;

    // Step 8: evaluate current subchain, then historical (logged, non-fatal).
    evaluate_current_and_historical(&mut chain, config.cki_version, deps.verifier);

    // Step 9: persist.
    if let Err(e) = persist(uid, &chain, deps).await {
        error!(target: "sigchain::loader", uid = %uid, error = %e, "persistence failed after successful verify");
    }

    debug!(target: "sigchain::loader", uid = %uid, summary = %chain.summary(), "load complete");
    Ok(chain)
}

async fn hydrate_from_local_store<T, S, M, V>(
    chain: &mut Chain,
    deps: &LoaderDeps<'_, T, S, M, V>,
) -> Result<(), LoadError>
where
    S: LocalStore,
{
    let Some(tail) = deps
        .local_store
        .public_tail(chain.uid)
        .await
        .map_err(LoadError::from)?
    else {
        return Ok(());
    };

    let mut links = Vec::new();
    let mut cursor = Some(tail.link_id);
    while let Some(link_id) = cursor {
        let Some(link) = deps.local_store.get_link(chain.uid, link_id).await.map_err(LoadError::from)? else {
            break;
        };
        cursor = link.prev;
        links.push(link);
    }
    links.reverse();
    chain.links = links;

    Ok(())
}

async fn fetch_and_append<T, S, M, V>(
    uid: Uid,
    chain: &mut Chain,
    deps: &LoaderDeps<'_, T, S, M, V>,
    leaf: &crate::ports::MerkleUserLeaf,
) -> Result<(), LoadError>
where
    T: Transport,
{
    let low = chain.tail().map_or(0, |link| link.seqno.0);
    let response = observe_metrics_for_result_async!(
        "sigchain_loader_fetch_success",
        "sigchain_loader_fetch_error",
        "sigchain_loader_fetch_duration_seconds",
        "fetch_links",
        deps.transport.fetch_links(uid, low)
    )
    .map_err(|e| LoadError::InternalError(e.to_string()))?;

    let raw_links = match response {
        TransportResponse::UserDeleted => return Err(LoadError::UserDeleted),
        TransportResponse::Links(raw) => raw,
    };

    for raw in &raw_links {
        let mut link = (deps.import_link)(raw, uid, true)?;
        link.is_bad = deps.bad_links.contains(link.sig_id);
        chain.links.push(link);
    }

    if let Some(expected) = leaf.public {
        let reached = chain.tail().is_some_and(|tail| tail.seqno >= expected.seqno);
        if !reached {
            return Err(crate::error::ServerChainError::IncompleteResponse.into());
        }
    }

    Ok(())
}

fn evaluate_current_and_historical(chain: &mut Chain, cki_version: u32, verifier: &dyn Verifier) {
    let start = chain.current_subchain_start;
    if start.0 > 0 {
        if let Some(index) = chain.links.iter().position(|link| link.seqno == start) {
            match evaluator::evaluate(&mut chain.links[index..], cki_version, verifier) {
                Ok((hit, _)) => chain.was_fully_cached = hit,
                Err(e) => error!(target: "sigchain::loader", error = %e, "current subchain evaluation failed"),
            }
        }
    }

    for historical in chain.historical.clone() {
        let start_idx = chain.links.iter().position(|link| link.seqno == historical.start);
        let end_idx = chain.links.iter().position(|link| link.seqno == historical.end);
        if let (Some(s), Some(e)) = (start_idx, end_idx) {
            if let Err(err) = evaluator::evaluate(&mut chain.links[s..=e], cki_version, verifier) {
                warn!(
                    target: "sigchain::loader",
                    start = historical.start.0,
                    end = historical.end.0,
                    error = %err,
                    "historical subchain evaluation failed; continuing"
                );
            }
        }
    }
}

async fn persist<T, S, M, V>(
    uid: Uid,
    chain: &Chain,
    deps: &LoaderDeps<'_, T, S, M, V>,
) -> Result<(), LoadError>
where
    S: LocalStore,
{
    for link in &chain.links {
        if link.chain_verified {
            deps.local_store.put_link(uid, link).await.map_err(LoadError::from)?;
        }
    }

    if let Some(tail) = chain.tail() {
        let triple = sigchain_types::MerkleTriple { seqno: tail.seqno, link_id: tail.link_id, sig_id: tail.sig_id };
        deps.local_store.put_public_tail(uid, triple).await.map_err(LoadError::from)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::ports::{MerkleUserLeaf, TransportResponse};
    use alloy_primitives::B256;
    use async_trait::async_trait;
    use sigchain_types::{Kid, LinkId, Seqno};
    use std::sync::Mutex;

    struct FakeTransport {
        batches: Mutex<Vec<Vec<Vec<u8>>>>,
    }

    #[async_trait]
    impl Transport for FakeTransport {
        type Error = std::convert::Infallible;

        async fn fetch_links(&self, _uid: Uid, _low: u64) -> Result<TransportResponse, Self::Error> {
            let mut batches = self.batches.lock().unwrap();
            let batch = batches.pop().unwrap_or_default();
            Ok(TransportResponse::Links(batch))
        }
    }

    #[derive(Default)]
    struct FakeStore;

    #[async_trait]
    impl LocalStore for FakeStore {
        async fn public_tail(&self, _uid: Uid) -> Result<Option<sigchain_types::MerkleTriple>, StorageError> {
            Ok(None)
        }
        async fn private_tail(&self, _uid: Uid) -> Result<Option<sigchain_types::MerkleTriple>, StorageError> {
            Ok(None)
        }
        async fn get_link(&self, _uid: Uid, _link_id: LinkId) -> Result<Option<Link>, StorageError> {
            Ok(None)
        }
        async fn put_link(&self, _uid: Uid, _link: &Link) -> Result<(), StorageError> {
            Ok(())
        }
        async fn put_public_tail(&self, _uid: Uid, _tail: sigchain_types::MerkleTriple) -> Result<(), StorageError> {
            Ok(())
        }
        async fn put_private_tail(&self, _uid: Uid, _tail: sigchain_types::MerkleTriple) -> Result<(), StorageError> {
            Ok(())
        }
    }

    struct FakeOracle {
        leaf: MerkleUserLeaf,
    }

    #[async_trait]
    impl MerkleOracle for FakeOracle {
        type Error = std::convert::Infallible;

        async fn lookup_user(&self, _uid: Uid) -> Result<MerkleUserLeaf, Self::Error> {
            Ok(self.leaf.clone())
        }
    }

    struct AlwaysValid;

    impl Verifier for AlwaysValid {
        fn verify_signature(&self, _kid: Kid, _payload: &[u8], _sig: &[u8]) -> bool {
            true
        }
        fn verify_reverse_signature(&self, _link: &Link) -> bool {
            true
        }
    }

    fn noop_import(_raw: &[u8], _uid: Uid, _from_server: bool) -> Result<Link, LoadError> {
        Err(LoadError::MalformedLink)
    }

    #[tokio::test]
    async fn fresh_empty_user_yields_empty_chain() {
        let uid = Uid(B256::repeat_byte(1));
        let transport = FakeTransport { batches: Mutex::new(vec![]) };
        let store = FakeStore;
        let oracle = FakeOracle { leaf: MerkleUserLeaf { public: None, private: None, eldest: Kid(B256::ZERO) } };
        let verifier = AlwaysValid;
        let reset_ids = StaticSigIdSet::empty();
        let bad_links = StaticSigIdSet::empty();
        let import_link: &dyn Fn(&[u8], Uid, bool) -> Result<Link, LoadError> = &noop_import;

        let deps = LoaderDeps {
            transport: &transport,
            local_store: &store,
            merkle_oracle: &oracle,
            verifier: &verifier,
            import_link,
            historical_reset_ids: &reset_ids,
            bad_links: &bad_links,
        };

        let chain = load(uid, "alice", &Config::default(), &deps, 0).await.unwrap();
        assert!(chain.links.is_empty());
        assert_eq!(chain.current_subchain_start, Seqno(0));
    }

    #[tokio::test]
    async fn server_rollback_is_reported() {
        let uid = Uid(B256::repeat_byte(1));
        let transport = FakeTransport { batches: Mutex::new(vec![]) };
        let oracle = FakeOracle {
            leaf: MerkleUserLeaf {
                public: Some(sigchain_types::MerkleTriple {
                    seqno: Seqno(2),
                    link_id: LinkId(B256::repeat_byte(2)),
                    sig_id: sigchain_types::SigId(B256::repeat_byte(2)),
                }),
                private: None,
                eldest: Kid(B256::ZERO),
            },
        };
        let verifier = AlwaysValid;
        let reset_ids = StaticSigIdSet::empty();
        let bad_links = StaticSigIdSet::empty();
        let import_link: &dyn Fn(&[u8], Uid, bool) -> Result<Link, LoadError> = &noop_import;

        // Fake store reports no local tail, but we want to simulate a cached
        // tail ahead of the server; build a chain manually instead of via
        // hydrate to exercise the freshness check directly.
        struct StoreWithTail;
        #[async_trait]
        impl LocalStore for StoreWithTail {
            async fn public_tail(&self, _uid: Uid) -> Result<Option<sigchain_types::MerkleTriple>, StorageError> {
                Ok(Some(sigchain_types::MerkleTriple {
                    seqno: Seqno(9),
                    link_id: LinkId(B256::repeat_byte(9)),
                    sig_id: sigchain_types::SigId(B256::repeat_byte(9)),
                }))
            }
            async fn private_tail(&self, _uid: Uid) -> Result<Option<sigchain_types::MerkleTriple>, StorageError> {
                Ok(None)
            }
            async fn get_link(&self, _uid: Uid, link_id: LinkId) -> Result<Option<Link>, StorageError> {
                Ok(Some(Link {
                    seqno: Seqno(9),
                    prev: None,
                    link_id,
                    sig_id: sigchain_types::SigId(B256::repeat_byte(9)),
                    signature: alloy_primitives::Bytes::from_static(&[0u8; 64]),
                    sig_version: sigchain_types::SigVersion::V2,
                    signing_kid: Kid(B256::ZERO),
                    eldest_kid: Some(Kid(B256::ZERO)),
                    link_type: sigchain_types::LinkType::Eldest,
                    delegated_kid: None,
                    pgp_hash: None,
                    per_user_key_generation: None,
                    high_skip: None,
                    stubbed: false,
                    is_bad: false,
                    uid,
                    username: "alice".to_string(),
                    is_own_new_link_from_server: false,
                    chain_verified: true,
                    sig_verified: false,
                    cki_cache: None,
                }))
            }
            async fn put_link(&self, _uid: Uid, _link: &Link) -> Result<(), StorageError> {
                Ok(())
            }
            async fn put_public_tail(
                &self,
                _uid: Uid,
                _tail: sigchain_types::MerkleTriple,
            ) -> Result<(), StorageError> {
                Ok(())
            }
            async fn put_private_tail(
                &self,
                _uid: Uid,
                _tail: sigchain_types::MerkleTriple,
            ) -> Result<(), StorageError> {
                Ok(())
            }
        }

        let store = StoreWithTail;
        let deps = LoaderDeps {
            transport: &transport,
            local_store: &store,
            merkle_oracle: &oracle,
            verifier: &verifier,
            import_link,
            historical_reset_ids: &reset_ids,
            bad_links: &bad_links,
        };

        let err = load(uid, "alice", &Config::default(), &deps, 0).await.unwrap_err();
        assert_eq!(
            err,
            LoadError::ServerChainError(crate::error::ServerChainError::ServerRollback)
        );
    }
}

