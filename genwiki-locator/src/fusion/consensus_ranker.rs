//! Consensus Ranker
//!
//! Imposes a deterministic order on validated evidence so the first
//! non-null entry can be taken as the winner.
//!
//! # Ordering
//! 1. Candidate value, ascending lexicographic (null before any id)
//! 2. Occurrence count of the value, descending
//! 3. Insertion order (stable sort)
//!
//! Entries with equal values always have equal counts, so the second key
//! never changes the outcome: the order is plain lexicographic by id.

use crate::evidence::EvidenceMap;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default)]
pub struct ConsensusRanker;

impl ConsensusRanker {
    pub fn new() -> Self {
        Self
    }

    /// Ranked copy of `evidence`
    pub fn rank(&self, evidence: &EvidenceMap) -> EvidenceMap {
        let mut counts: HashMap<Option<&str>, usize> = HashMap::new();
        for (_, candidate) in evidence.iter() {
            *counts.entry(candidate).or_default() += 1;
        }

        let mut entries = evidence.entries().to_vec();
        entries.sort_by(|(_, a), (_, b)| {
            a.cmp(b).then_with(|| {
                let count_a = counts.get(&a.as_deref()).copied().unwrap_or(0);
                let count_b = counts.get(&b.as_deref()).copied().unwrap_or(0);
                count_b.cmp(&count_a)
            })
        });

        let ranked = EvidenceMap::from_entries(entries);
        debug!(winner = ?ranked.first_candidate(), entries = ranked.len(), "Evidence ranked");
        ranked
    }
}
