//! Rank assignment for siblings sharing a stage.
//!
//! After every mutating command the full sibling sequence is renumbered
//! with consecutive integers starting at zero, so a rank collision can
//! never survive a command.

use std::collections::HashMap;

use super::domain::{Candidate, CandidateId, CandidateSeed};

/// Assign consecutive ranks starting at 0 in the given order. Total over
/// any input; an empty sequence yields an empty mapping.
pub fn assign_sequential(ordered: &[CandidateId]) -> HashMap<CandidateId, i64> {
    ordered
        .iter()
        .enumerate()
        .map(|(position, id)| (id.clone(), position as i64))
        .collect()
}

/// Sort candidates into the canonical sibling order: rank ascending, ties
/// by `applied_at` ascending, final tie-break on id so the order is total.
pub fn sort_siblings(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.applied_at.cmp(&b.applied_at))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Order seeds for initial rank assignment within one stage: explicitly
/// ranked seeds first in imported rank order, then unranked seeds by
/// `applied_at` ascending.
pub(crate) fn seed_order(seeds: &mut Vec<&CandidateSeed>) -> Vec<CandidateId> {
    seeds.sort_by(|a, b| match (a.rank, b.rank) {
        (Some(left), Some(right)) => left
            .cmp(&right)
            .then_with(|| a.applied_at.cmp(&b.applied_at)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a
            .applied_at
            .cmp(&b.applied_at)
            .then_with(|| a.id.cmp(&b.id)),
    });
    seeds.iter().map(|seed| seed.id.clone()).collect()
}
