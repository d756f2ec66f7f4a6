//! Static sig-id sets: the hardcoded historical reset exceptions (spec.md
//! §4.4, §9 "Process-wide hardcoded reset set") and the caller-supplied
//! known-bad list (SPEC_FULL.md §4.9 "`is_bad` list source").

use sigchain_types::SigId;
use std::collections::HashSet;

/// An immutable, process-wide set of [`SigId`]s, shared by the hardcoded
/// historical reset exceptions and by caller-supplied known-bad lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticSigIdSet(HashSet<SigId>);

impl StaticSigIdSet {
    /// Builds a set from an explicit list of sig ids.
    pub fn new(ids: impl IntoIterator<Item = SigId>) -> Self {
        Self(ids.into_iter().collect())
    }

    /// Returns `true` if `id` is a member of this set.
    pub fn contains(&self, id: SigId) -> bool {
        self.0.contains(&id)
    }

    /// An empty set, useful when the caller has no known-bad links to seed.
    pub fn empty() -> Self {
        Self(HashSet::new())
    }
}

impl FromIterator<SigId> for StaticSigIdSet {
    fn from_iter<T: IntoIterator<Item = SigId>>(iter: T) -> Self {
        Self::new(iter)
    }
}

/// The six historical sig ids that reused an eldest key without an explicit
/// `eldest` marker (spec.md §4.4 `is_subchain_start`, fourth condition).
///
/// These bytes are placeholders: the source corpus for this crate did not
/// retain the original six sig ids, only the requirement that such a fixed
/// set exists and must be consulted verbatim. A deployment of this crate
/// must replace these with the real historical values before relying on
/// segmentation for accounts old enough to be affected.
pub fn historical_reset_sig_ids() -> StaticSigIdSet {
    use alloy_primitives::B256;
    StaticSigIdSet::new([
        SigId(B256::repeat_byte(0xA1)),
        SigId(B256::repeat_byte(0xA2)),
        SigId(B256::repeat_byte(0xA3)),
        SigId(B256::repeat_byte(0xA4)),
        SigId(B256::repeat_byte(0xA5)),
        SigId(B256::repeat_byte(0xA6)),
    ])
}
