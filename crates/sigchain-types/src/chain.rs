//! The chain container (spec.md §3 "Chain").

use crate::cki::Cki;
use crate::ids::{LinkId, Seqno, Uid};
use crate::link::{HighPrevInfo, Link, MerkleTriple};
use serde::{Deserialize, Serialize};

/// A contiguous run of seqnos that the segmenter has set aside from the
/// current subchain, together with the evaluation error that caused it to be
/// set aside (spec.md §4.4 "Historical Subchains", §9 "historical subchain
/// evaluation error handling").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoricalSubchain {
    /// First seqno of the historical run, inclusive.
    pub start: Seqno,
    /// Last seqno of the historical run, inclusive.
    pub end: Seqno,
    /// Human-readable reason the segmenter cut the chain here, logged at
    /// `warn!` rather than surfaced as a load failure.
    pub reason: String,
}

/// A user's full local view of their sigchain: the bound identity, the
/// ordered links, and any historical subchains the segmenter has carved off
/// (spec.md §3 "Chain").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chain {
    /// The uid this chain belongs to. Every link's embedded uid must match
    /// this (spec.md §4.3).
    pub uid: Uid,
    /// The username bound to `uid`. Every link's embedded username must
    /// match this once set (spec.md §4.3).
    pub username: String,
    /// Every link known locally, in ascending seqno order, seqno dense from
    /// 1 with no gaps (spec.md §3).
    pub links: Vec<Link>,
    /// Subchains the segmenter has cut away from the current, live
    /// subchain.
    pub historical: Vec<HistoricalSubchain>,
    /// Seqno the current (live) subchain starts at; `0` means there is no
    /// current subchain (the user is new, or has just reset).
    pub current_subchain_start: Seqno,
    /// `true` if the last load found the cached tail fully fresh and
    /// reused its cached key state without re-evaluating (spec.md §4.7
    /// "Fully-cached short-circuit").
    pub was_fully_cached: bool,

    /// Local overlay: a not-yet-server-visible delegation (spec.md §4.8
    /// `LocalDelegate`).
    pub local_cki: Option<Cki>,
    /// Local overlay: a not-yet-server-visible tail bump (spec.md §4.8
    /// `Bump`).
    pub local_tail: Option<MerkleTriple>,
    /// Local overlay: a not-yet-server-visible high-prev anchor override,
    /// set alongside `local_tail` when the bump is a high-priority
    /// delegation.
    pub local_next_high_prev_override: Option<HighPrevInfo>,
    /// Unix timestamp (seconds) of the last local overlay write; used to
    /// judge whether the overlay is still within `SERVER_UPDATE_LAG`.
    pub local_update_time: Option<u64>,
}

impl Chain {
    /// Builds an empty chain bound to `uid`/`username` with no links yet.
    pub fn new(uid: Uid, username: String) -> Self {
        Self {
            uid,
            username,
            links: Vec::new(),
            historical: Vec::new(),
            current_subchain_start: Seqno(0),
            was_fully_cached: false,
            local_cki: None,
            local_tail: None,
            local_next_high_prev_override: None,
            local_update_time: None,
        }
    }

    /// The current tail link, if any.
    pub fn tail(&self) -> Option<&Link> {
        self.links.last()
    }

    /// The seqno the next imported link must carry.
    pub fn next_seqno(&self) -> Seqno {
        self.tail().map_or(Seqno::ONE, |link| link.seqno.next())
    }

    /// Looks up a link by its content hash.
    pub fn find_by_link_id(&self, link_id: LinkId) -> Option<&Link> {
        self.links.iter().find(|link| link.link_id == link_id)
    }

    /// A short debug/logging summary of this chain's shape (SPEC_FULL.md
    /// §4.9 "Chain debug summary").
    pub fn summary(&self) -> String {
        format!(
            "uid={} links={} historical_subchains={} tail_seqno={}",
            self.uid,
            self.links.len(),
            self.historical.len(),
            self.tail().map_or(0, |link| link.seqno.0)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ZERO_LINK_ID;
    use alloy_primitives::B256;

    fn uid() -> Uid {
        Uid(B256::repeat_byte(1))
    }

    #[test]
    fn empty_chain_next_seqno_is_one() {
        let chain = Chain::new(uid(), "alice".to_string());
        assert_eq!(chain.next_seqno(), Seqno::ONE);
        assert!(chain.tail().is_none());
    }

    #[test]
    fn find_by_link_id_returns_none_when_absent() {
        let chain = Chain::new(uid(), "alice".to_string());
        assert!(chain.find_by_link_id(ZERO_LINK_ID).is_none());
    }

    #[test]
    fn summary_reports_empty_chain() {
        let chain = Chain::new(uid(), "alice".to_string());
        let summary = chain.summary();
        assert!(summary.contains("links=0"));
        assert!(summary.contains("tail_seqno=0"));
    }
}
