//! Chain Verifier (spec.md §4.3, Component C).

use crate::error::LoadError;
use sigchain_types::{Chain, HighPrevInfo, Link, Seqno, Uid};
use tracing::debug;

/// Re-checks the prev-pointer chain, seqno monotonicity, high-prev
/// integrity, and embedded-identity agreement across every link of a chain
/// (all subchains, not just the current one).
///
/// Runs a backward pass (tail → head) that short-circuits on the first
/// already-`chain_verified` link, followed by a forward pass that
/// propagates the expected high-prev value from that boundary to the tail.
pub fn verify_chain(chain: &mut Chain, force_reverify: bool) -> Result<(), LoadError> {
    let boundary = backward_pass(chain, force_reverify)?;
    forward_pass(chain, boundary)
}

/// Runs the backward structural pass and returns the index at which the
/// already-verified suffix begins (i.e. the first index that still needs a
/// forward high-prev check).
fn backward_pass(chain: &mut Chain, force_reverify: bool) -> Result<usize, LoadError> {
    let uid = chain.uid;
    let username = chain.username.clone();
    let len = chain.links.len();

    let mut boundary = len;
    for i in (0..len).rev() {
        if !force_reverify && chain.links[i].chain_verified {
            boundary = i + 1;
            break;
        }

        check_structural(&chain.links, i, uid, &username)?;
        chain.links[i].chain_verified = true;
        boundary = i;
    }

    debug!(target: "sigchain::verifier", boundary, len, "backward pass complete");
    Ok(boundary)
}

fn check_structural(links: &[Link], i: usize, uid: Uid, username: &str) -> Result<(), LoadError> {
    let link = &links[i];

    if link.uid != uid || link.username != username {
        return Err(LoadError::NameOrIdMismatch { seqno: link.seqno.0 });
    }

    if i == 0 {
        if link.seqno != Seqno::ONE {
            return Err(LoadError::WrongSeqno { expected: 1, got: link.seqno.0 });
        }
        return Ok(());
    }

    let prev = &links[i - 1];
    if link.seqno != prev.seqno.next() {
        return Err(LoadError::WrongSeqno { expected: prev.seqno.next().0, got: link.seqno.0 });
    }
    if link.prev != Some(prev.link_id) {
        return Err(LoadError::PrevHashMismatch { seqno: link.seqno.0 });
    }

    Ok(())
}

/// Propagates the expected high-prev from `boundary` forward to the tail,
/// asserting agreement with any link that declares one.
fn forward_pass(chain: &mut Chain, boundary: usize) -> Result<(), LoadError> {
    let mut expected = anchor_before(&chain.links, boundary);

    for link in &chain.links[boundary..] {
        if let Some(declared) = link.high_skip {
            if declared != expected {
                return Err(LoadError::HighPrevMismatch { seqno: link.seqno.0 });
            }
        }
        expected = next_expected_high_prev(expected, link);
    }

    Ok(())
}

/// The high-prev anchor in effect just before `boundary`: the `(seqno,
/// link_id)` of the last key-modifying link at or before `boundary - 1`, or
/// `HighPrevInfo::ZERO` if none exists.
fn anchor_before(links: &[Link], boundary: usize) -> HighPrevInfo {
    links[..boundary]
        .iter()
        .rev()
        .find(|l| l.link_type.modifies_keys())
        .map(|l| HighPrevInfo { seqno: l.seqno, link_id: l.link_id })
        .unwrap_or(HighPrevInfo::ZERO)
}

/// The expected high-prev anchor after `link`, per spec.md §3/§4.3: each
/// link deterministically produces the next high-prev from its own type and
/// seqno, not from whatever it happens to declare. Key-modifying link types
/// become the new anchor; all others leave `current` unchanged.
fn next_expected_high_prev(current: HighPrevInfo, link: &Link) -> HighPrevInfo {
    if link.link_type.modifies_keys() {
        HighPrevInfo { seqno: link.seqno, link_id: link.link_id }
    } else {
        current
    }
}
