//! Read-side projections derived from the engine's query surface.
//!
//! Both views are pure recomputations: nothing here is cached or persisted,
//! so they are correct immediately after any command completes.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::domain::{Candidate, Stage};
use super::engine::{PipelineEngine, PipelineError};
use super::store::CandidateStore;

/// Text filter applied to both projections: case-insensitive substring
/// match over name and email. An empty filter matches everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CandidateFilter {
    pub search: Option<String>,
}

impl CandidateFilter {
    pub fn matching(search: impl Into<String>) -> Self {
        Self {
            search: Some(search.into()),
        }
    }

    pub(crate) fn matches(&self, candidate: &Candidate) -> bool {
        match &self.search {
            None => true,
            Some(term) => {
                let term = term.to_lowercase();
                term.is_empty()
                    || candidate.name.to_lowercase().contains(&term)
                    || candidate.email.to_lowercase().contains(&term)
            }
        }
    }
}

/// Group the filtered pipeline by stage. Every registry stage is present as
/// a key (empty columns included) and the map iterates in canonical order.
pub fn board_view<S>(
    engine: &PipelineEngine<S>,
    filter: &CandidateFilter,
) -> Result<BTreeMap<Stage, Vec<Candidate>>, PipelineError>
where
    S: CandidateStore + 'static,
{
    let mut board = BTreeMap::new();
    for stage in Stage::ordered() {
        let members = engine
            .list_by_stage(stage)?
            .into_iter()
            .filter(|candidate| filter.matches(candidate))
            .collect();
        board.insert(stage, members);
    }
    Ok(board)
}

/// Flatten the filtered pipeline into one list, ordered by stage canonical
/// order and rank within each stage. `stage` constrains the view to a
/// single column.
pub fn flat_view<S>(
    engine: &PipelineEngine<S>,
    filter: &CandidateFilter,
    stage: Option<Stage>,
) -> Result<Vec<Candidate>, PipelineError>
where
    S: CandidateStore + 'static,
{
    let mut flat = Vec::new();
    for registry_stage in Stage::ordered() {
        if stage.is_some_and(|constraint| constraint != registry_stage) {
            continue;
        }
        flat.extend(
            engine
                .list_by_stage(registry_stage)?
                .into_iter()
                .filter(|candidate| filter.matches(candidate)),
        );
    }
    Ok(flat)
}
