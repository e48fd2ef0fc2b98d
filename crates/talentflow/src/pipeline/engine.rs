use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, info};

use super::domain::{Candidate, CandidateId, CandidateSeed, MetadataPatch, Stage, StageChange};
use super::ranking;
use super::store::{CandidateStore, StoreError};

/// How long a command waits for a stage lock before reporting contention.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_millis(250);

/// A candidate can change stage between the unlocked read that discovers its
/// stage and the moment both stage locks are held. The read is re-validated
/// under the locks and retried this many times.
const STALE_READ_ATTEMPTS: usize = 3;

/// Error raised by the pipeline engine.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("candidate {0} not found")]
    NotFound(CandidateId),
    #[error("unknown pipeline stage '{0}'")]
    InvalidStage(String),
    #[error("reorder list does not match the members of stage {0}")]
    InvalidReorder(Stage),
    #[error("stage {0} is locked by another operation, retry")]
    Contention(Stage),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Resolve a stage wire name, surfacing registry misses as `InvalidStage`.
pub fn resolve_stage(value: &str) -> Result<Stage, PipelineError> {
    Stage::parse(value).ok_or_else(|| PipelineError::InvalidStage(value.trim().to_string()))
}

/// Core service exposing the move/reorder commands and the query surface.
///
/// Mutations execute under per-stage locks; a cross-stage move takes both
/// locks in canonical registry order so two overlapping drags cannot
/// deadlock or compute ranks from a stale sibling set.
pub struct PipelineEngine<S> {
    store: Arc<S>,
    locks: StageLockTable,
}

struct StageLockTable {
    slots: [Mutex<()>; Stage::COUNT],
    timeout: Duration,
}

impl StageLockTable {
    fn new(timeout: Duration) -> Self {
        Self {
            slots: Default::default(),
            timeout,
        }
    }

    /// Acquire the given stages' locks in canonical registry order, with a
    /// bounded wait per lock.
    fn acquire(&self, stages: &[Stage]) -> Result<Vec<MutexGuard<'_, ()>>, PipelineError> {
        let mut wanted = stages.to_vec();
        wanted.sort();
        wanted.dedup();

        let mut guards = Vec::with_capacity(wanted.len());
        for stage in wanted {
            let guard = self.slots[stage.slot()]
                .try_lock_for(self.timeout)
                .ok_or(PipelineError::Contention(stage))?;
            guards.push(guard);
        }
        Ok(guards)
    }
}

impl<S> PipelineEngine<S>
where
    S: CandidateStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self::with_lock_timeout(store, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn with_lock_timeout(store: Arc<S>, timeout: Duration) -> Self {
        Self {
            store,
            locks: StageLockTable::new(timeout),
        }
    }

    /// Move a candidate to `target` at the given zero-based position.
    ///
    /// The index is clamped to the destination's current length, so a list
    /// that shrank between the client's read and this command is not an
    /// error. When the stage actually changes, an audit entry is appended
    /// and the source stage is renumbered as well. Repeating a call with
    /// the candidate's current stage and position is a no-op.
    pub fn move_to_stage(
        &self,
        id: &CandidateId,
        target: Stage,
        index: usize,
        actor: &str,
    ) -> Result<Candidate, PipelineError> {
        for _ in 0..STALE_READ_ATTEMPTS {
            let source = self.fetch_required(id)?.stage;
            let _guards = self.locks.acquire(&[source, target])?;

            let candidate = self.fetch_required(id)?;
            if candidate.stage != source {
                continue;
            }
            return self.apply_move(candidate, target, index, actor);
        }
        Err(PipelineError::Contention(target))
    }

    fn apply_move(
        &self,
        candidate: Candidate,
        target: Stage,
        index: usize,
        actor: &str,
    ) -> Result<Candidate, PipelineError> {
        let now = Utc::now();
        let source = candidate.stage;
        let stage_changed = source != target;

        let mut destination = self.store.list_by_stage(target)?;
        ranking::sort_siblings(&mut destination);

        let mut order: Vec<CandidateId> = destination
            .iter()
            .map(|sibling| sibling.id.clone())
            .filter(|sibling_id| sibling_id != &candidate.id)
            .collect();
        let slot = index.min(order.len());
        order.insert(slot, candidate.id.clone());
        let ranks = ranking::assign_sequential(&order);

        let mut batch = Vec::new();

        let mut moved = candidate;
        let new_rank = ranks[&moved.id];
        let moved_dirty = stage_changed || moved.rank != new_rank;
        if stage_changed {
            moved
                .stage_history
                .push(StageChange::transition(source, target, now, actor));
            moved.stage = target;
        }
        if moved_dirty {
            moved.rank = new_rank;
            moved.updated_at = now;
            batch.push(moved.clone());
        }

        for mut sibling in destination {
            if sibling.id == moved.id {
                continue;
            }
            let rank = ranks[&sibling.id];
            if sibling.rank != rank {
                sibling.rank = rank;
                sibling.updated_at = now;
                batch.push(sibling);
            }
        }

        if stage_changed {
            let mut remaining = self.store.list_by_stage(source)?;
            ranking::sort_siblings(&mut remaining);
            let order: Vec<CandidateId> = remaining
                .iter()
                .map(|sibling| sibling.id.clone())
                .filter(|sibling_id| sibling_id != &moved.id)
                .collect();
            let ranks = ranking::assign_sequential(&order);
            for mut sibling in remaining {
                if sibling.id == moved.id {
                    continue;
                }
                let rank = ranks[&sibling.id];
                if sibling.rank != rank {
                    sibling.rank = rank;
                    sibling.updated_at = now;
                    batch.push(sibling);
                }
            }
        }

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }

        debug!(candidate = %moved.id, from = %source, to = %target, slot, "pipeline move applied");
        Ok(moved)
    }

    /// Replace the sibling order of one stage. `ordered` must be an exact
    /// permutation of the stage's current members; no audit entry is
    /// appended because no stage changes.
    pub fn reorder_within_stage(
        &self,
        stage: Stage,
        ordered: &[CandidateId],
    ) -> Result<(), PipelineError> {
        let _guards = self.locks.acquire(&[stage])?;

        let members = self.store.list_by_stage(stage)?;
        if ordered.len() != members.len() {
            return Err(PipelineError::InvalidReorder(stage));
        }
        let current: HashSet<&CandidateId> = members.iter().map(|member| &member.id).collect();
        let mut seen = HashSet::with_capacity(ordered.len());
        for id in ordered {
            if !current.contains(id) || !seen.insert(id) {
                return Err(PipelineError::InvalidReorder(stage));
            }
        }

        let ranks = ranking::assign_sequential(ordered);
        let now = Utc::now();
        let batch: Vec<Candidate> = members
            .into_iter()
            .filter_map(|mut member| {
                let rank = ranks[&member.id];
                if member.rank != rank {
                    member.rank = rank;
                    member.updated_at = now;
                    Some(member)
                } else {
                    None
                }
            })
            .collect();

        if !batch.is_empty() {
            self.store.commit(batch)?;
        }
        debug!(stage = %stage, "stage reordered");
        Ok(())
    }

    /// Candidates in `stage`, rank ascending with ties broken by
    /// `applied_at`. Empty stages yield an empty sequence.
    pub fn list_by_stage(&self, stage: Stage) -> Result<Vec<Candidate>, PipelineError> {
        let mut members = self.store.list_by_stage(stage)?;
        ranking::sort_siblings(&mut members);
        Ok(members)
    }

    /// Whether the store holds any candidates at all. Used by startup
    /// seeding to avoid re-importing over a reloaded snapshot.
    pub fn is_empty(&self) -> Result<bool, PipelineError> {
        Ok(self.store.list_all()?.is_empty())
    }

    /// A candidate's audit trail, `changed_at` ascending.
    pub fn get_history(&self, id: &CandidateId) -> Result<Vec<StageChange>, PipelineError> {
        let candidate = self.fetch_required(id)?;
        let mut history = candidate.stage_history;
        history.sort_by_key(|change| change.changed_at);
        Ok(history)
    }

    /// Bulk-insert seeded candidates. Each record receives its initial
    /// `None -> applied` audit entry stamped with `applied_at`. Ranks are
    /// normalized per stage up front: explicitly ranked seeds keep their
    /// imported order, unranked seeds follow in `applied_at` order.
    pub fn seed_candidates(&self, seeds: &[CandidateSeed]) -> Result<usize, PipelineError> {
        let _guards = self.locks.acquire(&Stage::ordered())?;

        for seed in seeds {
            if self.store.fetch(&seed.id)?.is_some() {
                return Err(PipelineError::Store(StoreError::Conflict));
            }
        }

        let mut inserted = 0;
        for stage in Stage::ordered() {
            let mut members: Vec<&CandidateSeed> =
                seeds.iter().filter(|seed| seed.stage == stage).collect();
            if members.is_empty() {
                continue;
            }

            // Seeding into a populated stage appends below the existing members.
            let occupied = self.store.list_by_stage(stage)?.len() as i64;
            let order = ranking::seed_order(&mut members);
            let ranks = ranking::assign_sequential(&order);

            for seed in members {
                let candidate = Candidate {
                    id: seed.id.clone(),
                    name: seed.name.clone(),
                    email: seed.email.clone(),
                    job_id: seed.job_id.clone(),
                    stage,
                    rank: occupied + ranks[&seed.id],
                    applied_at: seed.applied_at,
                    updated_at: seed.applied_at,
                    stage_history: vec![StageChange::initial(seed.applied_at)],
                    notes: seed.notes.clone(),
                };
                self.store.insert(candidate)?;
                inserted += 1;
            }
        }

        info!(inserted, "candidate seed applied");
        Ok(inserted)
    }

    /// Write display fields through without validation, serialized behind
    /// the candidate's current stage lock so the patch never interleaves
    /// with a rank or stage write.
    pub fn patch_metadata(
        &self,
        id: &CandidateId,
        patch: &MetadataPatch,
    ) -> Result<Candidate, PipelineError> {
        let mut contended = Stage::Applied;
        for _ in 0..STALE_READ_ATTEMPTS {
            let source = self.fetch_required(id)?.stage;
            contended = source;
            let _guards = self.locks.acquire(&[source])?;

            let mut candidate = self.fetch_required(id)?;
            if candidate.stage != source {
                continue;
            }
            if patch.is_empty() {
                return Ok(candidate);
            }

            if let Some(name) = &patch.name {
                candidate.name = name.clone();
            }
            if let Some(email) = &patch.email {
                candidate.email = email.clone();
            }
            if let Some(notes) = &patch.notes {
                candidate.notes = notes.clone();
            }
            candidate.updated_at = Utc::now();

            self.store.commit(vec![candidate.clone()])?;
            return Ok(candidate);
        }
        Err(PipelineError::Contention(contended))
    }

    fn fetch_required(&self, id: &CandidateId) -> Result<Candidate, PipelineError> {
        self.store
            .fetch(id)?
            .ok_or_else(|| PipelineError::NotFound(id.clone()))
    }
}
