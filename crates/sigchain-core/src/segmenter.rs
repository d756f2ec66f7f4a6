//! Subchain Segmenter (spec.md §4.4, Component D).

use crate::bad_links::StaticSigIdSet;
use crate::error::LoadError;
use sigchain_types::{Chain, HistoricalSubchain, Kid, Link, LinkType, Seqno};

/// Crops `chain.links` to the suffix that constitutes the subchain
/// currently anchored at `eldest`, recursively walking historical subchains
/// out of the remaining prefix until none can be extracted.
///
/// Returns the seqno the current subchain starts at (`0` if the current
/// subchain is empty, i.e. the user has reset since the chain's tail link).
/// `chain.historical` is populated oldest-first.
pub fn segment(
    chain: &mut Chain,
    eldest: Kid,
    historical_reset_ids: &StaticSigIdSet,
) -> Result<Seqno, LoadError> {
    chain.historical.clear();

    let n = chain.links.len();
    if n == 0 {
        return Ok(Seqno(0));
    }

    let tail = &chain.links[n - 1];
    if tail.stubbed {
        return Err(LoadError::StubbedFinalLink);
    }

    let (current_start_seqno, mut remaining_end) = if tail.eldest_kid == Some(eldest) {
        let start_index = find_subchain_start(&chain.links[..n], historical_reset_ids)?;
        (chain.links[start_index].seqno, start_index)
    } else {
        (Seqno(0), n)
    };

    while remaining_end > 0 {
        let slice = &chain.links[..remaining_end];
        let Some(prefix_tail) = slice.last() else { break };
        if prefix_tail.eldest_kid.is_none() {
            break;
        }

        let start_index = find_subchain_start(slice, historical_reset_ids)?;
        chain.historical.push(HistoricalSubchain {
            start: slice[start_index].seqno,
            end: prefix_tail.seqno,
            reason: "historical subchain reset".to_string(),
        });
        remaining_end = start_index;
    }

    chain.historical.reverse();
    chain.current_subchain_start = current_start_seqno;
    Ok(current_start_seqno)
}

/// Finds the index within `slice` at which the current subchain begins,
/// per spec.md §4.4 steps 4-5.
fn find_subchain_start(
    slice: &[Link],
    historical_reset_ids: &StaticSigIdSet,
) -> Result<usize, LoadError> {
    for i in (1..slice.len()).rev() {
        if is_subchain_start(&slice[i], &slice[i - 1], historical_reset_ids) {
            return Ok(i);
        }
    }

    if slice[0].seqno != Seqno::ONE {
        return Err(LoadError::InternalError(
            "segmenter reached a gap: prefix does not start at seqno 1".to_string(),
        ));
    }

    Ok(0)
}

/// `is_subchain_start(curr, prev)` (spec.md §4.4).
fn is_subchain_start(curr: &Link, prev: &Link, historical_reset_ids: &StaticSigIdSet) -> bool {
    curr.seqno == Seqno::ONE
        || curr.link_type == LinkType::Eldest
        || (matches!(curr.sig_version, sigchain_types::SigVersion::V1)
            && matches!(prev.sig_version, sigchain_types::SigVersion::V1)
            && curr.eldest_kid != prev.eldest_kid)
        || historical_reset_ids.contains(curr.sig_id)
}
