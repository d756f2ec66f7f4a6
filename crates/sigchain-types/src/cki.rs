//! Key state accumulation model (spec.md §3 "Key State (CKI)", Component B).

use crate::ids::{DeviceId, Kid, Seqno, SigId};
use alloy_primitives::B256;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Bumped whenever the shape or semantics of [`Cki`] changes in a way that
/// invalidates any cache computed under a previous version (spec.md §4.5
/// step 1, "CkiCache").
pub const COMPUTED_KEY_INFOS_VERSION_CURRENT: u32 = 1;

/// The authority a key carries within an account (spec.md §3 "Role is one
/// of `{eldest, sibkey, subkey}`").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// The account's root key.
    Eldest,
    /// Full signing authority; may delegate and revoke other keys.
    Sibkey,
    /// Restricted authority; may not delegate or revoke.
    Subkey,
}

/// Per-key bookkeeping accumulated by walking a subchain (spec.md §3 "Key
/// State (CKI)", §4.2).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyInfo {
    /// Authority this key was granted.
    pub role: Role,
    /// Identifier of the signature that delegated this key, if it was
    /// delegated (absent for the eldest key itself).
    pub delegation_sig_id: Option<SigId>,
    /// Key that performed the delegation, if not the eldest key itself
    /// (spec.md §3 delegation provenance).
    pub delegation_signer: Option<Kid>,
    /// Seqno of the link that delegated this key.
    pub delegated_at: Seqno,
    /// Seqno of the link that revoked this key, if any.
    pub revoked_at: Option<Seqno>,
    /// Active PGP full-hash for this key, last refreshed by a `PgpUpdate`
    /// link (spec.md §4.2 "refreshes the active PGP full-hash for its KID").
    pub active_pgp_hash: Option<B256>,
    /// Most recent per-user-key generation recorded by a `PerUserKey` link
    /// (spec.md §4.2 "records a new generation").
    pub per_user_key_generation: Option<u64>,
}

impl KeyInfo {
    /// Whether this key currently holds authority (has not been revoked).
    pub const fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }
}

/// Computed key state for an account as of a given subchain tail
/// (spec.md §3 "Key State (CKI)").
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cki {
    /// The account's current eldest key, if one has been installed.
    pub eldest_kid: Option<Kid>,
    /// Every key ever delegated, active or revoked.
    pub keys: HashMap<Kid, KeyInfo>,
    /// Device-to-key bindings accumulated from device links.
    pub devices: HashMap<DeviceId, Kid>,
    /// The active Stellar wallet address, if any link has bound one and it
    /// has not since been rolled back by a stub (spec.md §4.5 "Wallet
    /// address tracking").
    pub active_wallet_stellar: Option<String>,
}

impl Cki {
    /// Returns the [`KeyInfo`] for `kid` if the key is known and currently
    /// active.
    pub fn active_key(&self, kid: &Kid) -> Option<&KeyInfo> {
        self.keys.get(kid).filter(|info| info.is_active())
    }

    /// Returns `true` if `kid` ever appeared in this key state, active or
    /// not.
    pub fn is_known(&self, kid: &Kid) -> bool {
        self.keys.contains_key(kid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;

    #[test]
    fn default_cki_has_no_eldest() {
        let cki = Cki::default();
        assert!(cki.eldest_kid.is_none());
        assert!(!cki.is_known(&Kid(B256::ZERO)));
    }

    #[test]
    fn revoked_key_is_not_active() {
        let kid = Kid(B256::repeat_byte(9));
        let mut cki = Cki::default();
        cki.keys.insert(
            kid,
            KeyInfo {
                role: Role::Sibkey,
                delegation_sig_id: None,
                delegation_signer: None,
                delegated_at: Seqno(1),
                revoked_at: Some(Seqno(3)),
                active_pgp_hash: None,
                per_user_key_generation: None,
            },
        );
        assert!(cki.is_known(&kid));
        assert!(cki.active_key(&kid).is_none());
    }

    #[test]
    fn active_key_is_returned() {
        let kid = Kid(B256::repeat_byte(9));
        let mut cki = Cki::default();
        cki.keys.insert(
            kid,
            KeyInfo {
                role: Role::Subkey,
                delegation_sig_id: None,
                delegation_signer: Some(kid),
                delegated_at: Seqno(1),
                revoked_at: None,
                active_pgp_hash: None,
                per_user_key_generation: None,
            },
        );
        assert_eq!(cki.active_key(&kid).map(|info| info.role), Some(Role::Subkey));
    }
}
