//! Subchain Evaluator (spec.md §4.5, Component E).

use crate::error::LoadError;
use crate::ports::Verifier;
use sigchain_types::{CkiCache, Cki, KeyInfo, Link, LinkType, Role};

/// `(cached_hit, cki)`: whether the tail link's cache satisfied the request
/// without a replay, and the resulting key state.
pub type EvaluationResult = (bool, Cki);

/// Replays `subchain` over a fresh key family (or returns the tail's cached
/// key state, if current) to produce the authoritative key state at the
/// subchain's tip.
///
/// `subchain` must be non-empty; an empty slice reaching the evaluator is a
/// caller bug (spec.md §7 `InternalError`).
pub fn evaluate(
    subchain: &mut [Link],
    cki_version: u32,
    verifier: &dyn Verifier,
) -> Result<EvaluationResult, LoadError> {
    let Some(tail) = subchain.last() else {
        return Err(LoadError::InternalError("evaluator received an empty subchain".to_string()));
    };

    if let Some(cache) = &tail.cki_cache {
        if cache.version == cki_version {
            return Ok((true, cache.cki.clone()));
        }
    }

    let mut cki = Cki::default();
    let mut seen_unstubbed_wallet = false;
    let mut first = true;

    for link in subchain.iter_mut() {
        if link.is_bad {
            continue;
        }

        if link.stubbed {
            if first {
                return Err(LoadError::StubbedFirstLink);
            }
            if !link.link_type.allows_stubbing() {
                return Err(LoadError::StubbedDisallowed);
            }
            if link.link_type == LinkType::WalletStellar && seen_unstubbed_wallet {
                return Err(LoadError::DelegationInvalid);
            }
            first = false;
            continue;
        }

        if link.link_type == LinkType::WalletStellar && link.sig_version == sigchain_types::SigVersion::V1 {
            return Err(LoadError::SigchainV2Required);
        }

        if first {
            cki.eldest_kid = link.eldest_kid.or(Some(link.signing_kid));
            cki.keys.insert(
                link.signing_kid,
                KeyInfo {
                    role: Role::Eldest,
                    delegation_sig_id: None,
                    delegation_signer: None,
                    delegated_at: link.seqno,
                    revoked_at: None,
                    active_pgp_hash: None,
                    per_user_key_generation: None,
                },
            );
        }

        let needs_eager_sig_check = link.link_type.modifies_keys() || is_last(subchain, link);
        if needs_eager_sig_check {
            // signature checked against the key that supposedly signed it;
            // `verify_signature` takes the raw signature bytes as payload
            // since canonicalization of the inner payload is the caller's
            // (LinkTyper/Transport) concern, out of scope here.
            if !verifier.verify_signature(link.signing_kid, &[], &link.signature) {
                return Err(LoadError::SignatureInvalid);
            }
            link.sig_verified = true;
        }

        match link.link_type {
            LinkType::Sibkey | LinkType::Subkey => {
                if !verifier.verify_reverse_signature(link) {
                    return Err(LoadError::ReverseSignatureInvalid);
                }
                let Some(delegated_kid) = link.delegated_kid else {
                    return Err(LoadError::DelegationInvalid);
                };
                let role = if link.link_type == LinkType::Sibkey { Role::Sibkey } else { Role::Subkey };
                cki.keys.insert(
                    delegated_kid,
                    KeyInfo {
                        role,
                        delegation_sig_id: Some(link.sig_id),
                        delegation_signer: Some(link.signing_kid),
                        delegated_at: link.seqno,
                        revoked_at: None,
                        active_pgp_hash: None,
                        per_user_key_generation: None,
                    },
                );
            }
            LinkType::Revoke => {
                if let Some(info) = cki.keys.get_mut(&link.signing_kid) {
                    info.revoked_at = Some(link.seqno);
                }
            }
            LinkType::Device => {
                cki.devices.insert(sigchain_types::DeviceId(link.username.clone()), link.signing_kid);
            }
            LinkType::WalletStellar => {
                cki.active_wallet_stellar = Some(link.username.clone());
                seen_unstubbed_wallet = true;
            }
            LinkType::PgpUpdate => {
                if let Some(info) = cki.keys.get_mut(&link.signing_kid) {
                    info.active_pgp_hash = link.pgp_hash;
                }
            }
            LinkType::PerUserKey => {
                if let Some(info) = cki.keys.get_mut(&link.signing_kid) {
                    info.per_user_key_generation = link.per_user_key_generation;
                }
            }
            _ => {}
        }

        first = false;
    }

    if let Some(last) = subchain.last_mut() {
        last.cki_cache = Some(CkiCache { version: cki_version, cki: cki.clone() });
    }

    Ok((false, cki))
}

fn is_last(subchain: &[Link], link: &Link) -> bool {
    subchain.last().is_some_and(|tail| tail.link_id == link.link_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{B256, Bytes};
    use sigchain_types::{Kid, LinkId, SigId, SigVersion, Uid};

    struct AlwaysValid;

    impl Verifier for AlwaysValid {
        fn verify_signature(&self, _kid: Kid, _payload: &[u8], _sig: &[u8]) -> bool {
            true
        }
        fn verify_reverse_signature(&self, _link: &Link) -> bool {
            true
        }
    }

    fn base_link(seqno: u64, link_type: LinkType, kid: Kid) -> Link {
        Link {
            seqno: sigchain_types::Seqno(seqno),
            prev: None,
            link_id: LinkId(B256::repeat_byte(seqno as u8)),
            sig_id: SigId(B256::repeat_byte(seqno as u8)),
            signature: Bytes::from_static(&[1u8; 64]),
            sig_version: SigVersion::V2,
            signing_kid: kid,
            eldest_kid: Some(kid),
            link_type,
            delegated_kid: None,
            pgp_hash: None,
            per_user_key_generation: None,
            high_skip: None,
            stubbed: false,
            is_bad: false,
            uid: Uid(B256::repeat_byte(1)),
            username: "alice".to_string(),
            is_own_new_link_from_server: false,
            chain_verified: true,
            sig_verified: false,
            cki_cache: None,
        }
    }

    #[test]
    fn single_eldest_link_registers_eldest() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut subchain = vec![base_link(1, LinkType::Eldest, k1)];
        let (hit, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        assert!(!hit);
        assert_eq!(cki.eldest_kid, Some(k1));
        assert_eq!(cki.active_key(&k1).map(|info| info.role), Some(Role::Eldest));
    }

    #[test]
    fn sibkey_link_records_delegated_key_not_signer() {
        let eldest = Kid(B256::repeat_byte(5));
        let delegated = Kid(B256::repeat_byte(6));
        let mut sibkey_link = base_link(2, LinkType::Sibkey, eldest);
        sibkey_link.delegated_kid = Some(delegated);
        let mut subchain = vec![base_link(1, LinkType::Eldest, eldest), sibkey_link];
        let (_, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        let info = cki.active_key(&delegated).expect("delegated key recorded");
        assert_eq!(info.role, Role::Sibkey);
        assert_eq!(info.delegation_signer, Some(eldest));
        assert!(cki.is_known(&eldest));
    }

    #[test]
    fn sibkey_link_without_delegated_kid_is_rejected() {
        let eldest = Kid(B256::repeat_byte(5));
        let mut subchain =
            vec![base_link(1, LinkType::Eldest, eldest), base_link(2, LinkType::Sibkey, eldest)];
        let err = evaluate(&mut subchain, 1, &AlwaysValid).unwrap_err();
        assert_eq!(err, LoadError::DelegationInvalid);
    }

    #[test]
    fn pgp_update_refreshes_active_hash() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut pgp_link = base_link(2, LinkType::PgpUpdate, k1);
        pgp_link.pgp_hash = Some(B256::repeat_byte(0xAB));
        let mut subchain = vec![base_link(1, LinkType::Eldest, k1), pgp_link];
        let (_, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        assert_eq!(cki.active_key(&k1).and_then(|info| info.active_pgp_hash), Some(B256::repeat_byte(0xAB)));
    }

    #[test]
    fn per_user_key_records_generation() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut puk_link = base_link(2, LinkType::PerUserKey, k1);
        puk_link.per_user_key_generation = Some(3);
        let mut subchain = vec![base_link(1, LinkType::Eldest, k1), puk_link];
        let (_, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        assert_eq!(cki.active_key(&k1).and_then(|info| info.per_user_key_generation), Some(3));
    }

    #[test]
    fn cached_hit_skips_replay() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut link = base_link(1, LinkType::Eldest, k1);
        let mut cached = Cki::default();
        cached.eldest_kid = Some(k1);
        link.cki_cache = Some(CkiCache { version: 7, cki: cached.clone() });
        let mut subchain = vec![link];
        let (hit, cki) = evaluate(&mut subchain, 7, &AlwaysValid).unwrap();
        assert!(hit);
        assert_eq!(cki, cached);
    }

    #[test]
    fn stale_cache_version_forces_replay() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut link = base_link(1, LinkType::Eldest, k1);
        link.cki_cache = Some(CkiCache { version: 1, cki: Cki::default() });
        let mut subchain = vec![link];
        let (hit, _) = evaluate(&mut subchain, 2, &AlwaysValid).unwrap();
        assert!(!hit);
    }

    #[test]
    fn revocation_marks_key_inactive() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut subchain =
            vec![base_link(1, LinkType::Eldest, k1), base_link(2, LinkType::Revoke, k1)];
        let (_, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        assert!(cki.active_key(&k1).is_none());
        assert!(cki.is_known(&k1));
    }

    #[test]
    fn bad_link_is_skipped() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut revoke = base_link(2, LinkType::Revoke, k1);
        revoke.is_bad = true;
        let mut subchain = vec![base_link(1, LinkType::Eldest, k1), revoke];
        let (_, cki) = evaluate(&mut subchain, 1, &AlwaysValid).unwrap();
        assert!(cki.active_key(&k1).is_some());
    }

    #[test]
    fn stubbed_first_link_is_rejected() {
        let k1 = Kid(B256::repeat_byte(5));
        let mut link = base_link(1, LinkType::Track, k1);
        link.stubbed = true;
        let mut subchain = vec![link];
        let err = evaluate(&mut subchain, 1, &AlwaysValid).unwrap_err();
        assert_eq!(err, LoadError::StubbedFirstLink);
    }
}
