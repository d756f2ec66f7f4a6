//! Freshness Oracle (spec.md §4.6, Component F).

use crate::error::{LoadError, ServerChainError};
use sigchain_types::MerkleTriple;

/// Outcome of comparing the locally cached tail against the server- and
/// merkle-attested tails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// Nothing is cached and the server has nothing either.
    Empty,
    /// The cached tail agrees with the server-attested tail and no pending
    /// local bump supersedes it.
    Fresh,
    /// The server has links beyond the cached tail; fetch starting after
    /// `local_tail`'s seqno (or from seqno 0 if `local_tail` is absent).
    Stale,
}

/// Compares `(local_tail, server_tail, future_tail)` per spec.md §4.6.
///
/// `future_tail` is the locally-pending overlay bump, if any and still
/// within the `SERVER_UPDATE_LAG` staleness window (spec.md §4.8); pass
/// `None` once that window has elapsed.
pub fn check_freshness(
    local_tail: Option<MerkleTriple>,
    server_tail: Option<MerkleTriple>,
    future_tail: Option<MerkleTriple>,
) -> Result<Freshness, LoadError> {
    let Some(server) = server_tail else {
        return if local_tail.is_some() {
            Err(ServerChainError::ServerForgotUser.into())
        } else {
            Ok(Freshness::Empty)
        };
    };

    let Some(local) = local_tail else {
        return Ok(Freshness::Stale);
    };

    if server.seqno < local.seqno {
        return Err(ServerChainError::ServerRollback.into());
    }

    if server.seqno == local.seqno {
        if server.link_id != local.link_id {
            return Err(ServerChainError::WrongTail.into());
        }

        if let Some(future) = future_tail {
            if future.seqno > local.seqno {
                return Ok(Freshness::Stale);
            }
        }

        return Ok(Freshness::Fresh);
    }

    Ok(Freshness::Stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::B256;
    use sigchain_types::{LinkId, Seqno, SigId};

    fn triple(seqno: u64, link_byte: u8) -> MerkleTriple {
        MerkleTriple {
            seqno: Seqno(seqno),
            link_id: LinkId(B256::repeat_byte(link_byte)),
            sig_id: SigId(B256::repeat_byte(link_byte)),
        }
    }

    #[test]
    fn fresh_empty_user() {
        let result = check_freshness(None, None, None).unwrap();
        assert_eq!(result, Freshness::Empty);
    }

    #[test]
    fn server_forgot_user_errors() {
        let err = check_freshness(Some(triple(5, 1)), None, None).unwrap_err();
        assert_eq!(err, LoadError::ServerChainError(ServerChainError::ServerForgotUser));
    }

    #[test]
    fn server_rollback_errors() {
        let err = check_freshness(Some(triple(9, 1)), Some(triple(7, 1)), None).unwrap_err();
        assert_eq!(err, LoadError::ServerChainError(ServerChainError::ServerRollback));
    }

    #[test]
    fn wrong_tail_errors() {
        let err = check_freshness(Some(triple(5, 0xA)), Some(triple(5, 0xB)), None).unwrap_err();
        assert_eq!(err, LoadError::ServerChainError(ServerChainError::WrongTail));
    }

    #[test]
    fn matching_tail_is_fresh() {
        let result = check_freshness(Some(triple(5, 1)), Some(triple(5, 1)), None).unwrap();
        assert_eq!(result, Freshness::Fresh);
    }

    #[test]
    fn server_ahead_is_stale() {
        let result = check_freshness(Some(triple(5, 1)), Some(triple(7, 1)), None).unwrap();
        assert_eq!(result, Freshness::Stale);
    }

    #[test]
    fn pending_local_bump_forces_stale() {
        let result =
            check_freshness(Some(triple(5, 1)), Some(triple(5, 1)), Some(triple(6, 2))).unwrap();
        assert_eq!(result, Freshness::Stale);
    }
}
