//! Local Overlay (spec.md §4.8, Component H).

use sigchain_types::{Chain, HighPrevInfo, Kid, MerkleTriple, SigId};

/// A local action the server has not yet reflected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocalAction {
    /// A just-issued delegation, applied locally before the server has
    /// caught up.
    Delegate {
        /// The newly delegated key.
        key: Kid,
        /// Identifier of the delegating signature.
        sig_id: SigId,
        /// Key that performed the delegation.
        signer: Kid,
        /// Whether the new key is a sibkey (vs. subkey).
        is_sibkey: bool,
    },
    /// A locally-observed tail advance, not yet confirmed by the server.
    Bump {
        /// The new tail triple.
        triple: MerkleTriple,
        /// Whether this bump is a high-priority delegation, which also
        /// advances the high-prev skip-chain anchor.
        is_high_delegator: bool,
    },
}

/// Applies `action` to `chain`'s overlay fields.
///
/// `now` is the current Unix timestamp in seconds, supplied by the caller
/// rather than read from the clock here so the pure core stays
/// deterministic and testable.
pub fn apply_local_action(chain: &mut Chain, action: LocalAction, now: u64) {
    match action {
        LocalAction::Delegate { key, sig_id, signer, is_sibkey } => {
            let mut working = working_cki(chain);
            let role = if is_sibkey { sigchain_types::Role::Sibkey } else { sigchain_types::Role::Subkey };
            working.keys.insert(
                key,
                sigchain_types::KeyInfo {
                    role,
                    delegation_sig_id: Some(sig_id),
                    delegation_signer: Some(signer),
                    delegated_at: chain.next_seqno(),
                    revoked_at: None,
                    active_pgp_hash: None,
                    per_user_key_generation: None,
                },
            );
            chain.local_cki = Some(working);
        }
        LocalAction::Bump { mut triple, is_high_delegator } => {
            triple.seqno = chain.next_seqno();
            chain.local_tail = Some(triple);
            chain.local_update_time = Some(now);
            if is_high_delegator {
                chain.local_next_high_prev_override =
                    Some(HighPrevInfo { seqno: triple.seqno, link_id: triple.link_id });
            }
        }
    }
}

/// Clears the overlay: called when a server load supersedes it (spec.md
/// §4.8 "a server load that supersedes them clears them").
pub fn clear_overlay(chain: &mut Chain) {
    chain.local_cki = None;
    chain.local_tail = None;
    chain.local_next_high_prev_override = None;
    chain.local_update_time = None;
}

/// Returns `true` if the overlay is still within `server_update_lag` of
/// `now` and therefore should be preferred over the cached-loaded chain
/// (spec.md §4.8 "Overlays are advisory").
pub fn overlay_is_fresh(chain: &Chain, now: u64, server_update_lag_secs: u64) -> bool {
    chain.local_update_time.is_some_and(|updated_at| now.saturating_sub(updated_at) <= server_update_lag_secs)
}

/// Obtains a working CKI for a new local delegation: the chain tail's CKI
/// shallow-copied if present, else a fresh one seeded with the local
/// eldest (spec.md §4.8, §9 "Shallow copy of CKI under local delegation").
///
/// `spec.md` leaves the copy strategy as an open question and suggests deep
/// clone absent a measured need; that is what this does, since `Cki`'s
/// `HashMap` fields have no cheap structural-sharing representation in this
/// crate's dependency set.
fn working_cki(chain: &Chain) -> sigchain_types::Cki {
    if let Some(cached) = chain.tail().and_then(|link| link.cki_cache.as_ref()) {
        return cached.cki.clone();
    }
    chain.local_cki.clone().unwrap_or_default()
}
