use std::collections::HashMap;
use std::sync::mpsc::{Receiver, SyncSender};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::pipeline::domain::{Candidate, CandidateId, CandidateSeed, JobId, Stage};
use crate::pipeline::engine::PipelineEngine;
use crate::pipeline::store::{CandidateStore, StoreError};

#[derive(Default)]
pub(super) struct MemoryStore {
    records: Mutex<HashMap<CandidateId, Candidate>>,
}

impl CandidateStore for MemoryStore {
    fn insert(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&candidate.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(candidate.id.clone(), candidate);
        Ok(())
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn list_by_stage(&self, stage: Stage) -> Result<Vec<Candidate>, StoreError> {
        let guard = self.records.lock().expect("store mutex poisoned");
        Ok(guard
            .values()
            .filter(|candidate| candidate.stage == stage)
            .cloned()
            .collect())
    }

    fn commit(&self, batch: Vec<Candidate>) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        for candidate in batch {
            guard.insert(candidate.id.clone(), candidate);
        }
        Ok(())
    }
}

/// Store whose every operation fails, for surfacing backend errors.
pub(super) struct UnavailableStore;

impl CandidateStore for UnavailableStore {
    fn insert(&self, _candidate: Candidate) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn fetch(&self, _id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn list_by_stage(&self, _stage: Stage) -> Result<Vec<Candidate>, StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }

    fn commit(&self, _batch: Vec<Candidate>) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("store offline".to_string()))
    }
}

/// Wraps `MemoryStore` so a commit can be parked at a rendezvous point
/// while the committing command still holds its stage locks.
pub(super) struct GatedStore {
    pub(super) inner: MemoryStore,
    pub(super) gate: Mutex<Option<CommitGate>>,
}

pub(super) struct CommitGate {
    pub(super) entered: SyncSender<()>,
    pub(super) release: Receiver<()>,
}

impl GatedStore {
    pub(super) fn new() -> Self {
        Self {
            inner: MemoryStore::default(),
            gate: Mutex::new(None),
        }
    }
}

impl CandidateStore for GatedStore {
    fn insert(&self, candidate: Candidate) -> Result<(), StoreError> {
        self.inner.insert(candidate)
    }

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError> {
        self.inner.fetch(id)
    }

    fn list_all(&self) -> Result<Vec<Candidate>, StoreError> {
        self.inner.list_all()
    }

    fn list_by_stage(&self, stage: Stage) -> Result<Vec<Candidate>, StoreError> {
        self.inner.list_by_stage(stage)
    }

    fn commit(&self, batch: Vec<Candidate>) -> Result<(), StoreError> {
        let gate = self.gate.lock().expect("gate mutex poisoned").take();
        if let Some(gate) = gate {
            gate.entered.send(()).expect("gate observer gone");
            gate.release.recv().expect("gate release dropped");
        }
        self.inner.commit(batch)
    }
}

pub(super) fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0)
        .single()
        .expect("valid fixture timestamp")
}

pub(super) fn seed(id: &str, stage: Stage, minutes_after_base: i64) -> CandidateSeed {
    CandidateSeed {
        id: CandidateId(id.to_string()),
        name: format!("Candidate {id}"),
        email: format!("{id}@example.com"),
        job_id: JobId("job-1".to_string()),
        stage,
        rank: None,
        applied_at: base_time() + Duration::minutes(minutes_after_base),
        notes: Vec::new(),
    }
}

pub(super) fn ranked_seed(
    id: &str,
    stage: Stage,
    rank: i64,
    minutes_after_base: i64,
) -> CandidateSeed {
    CandidateSeed {
        rank: Some(rank),
        ..seed(id, stage, minutes_after_base)
    }
}

pub(super) fn engine_with(seeds: Vec<CandidateSeed>) -> Arc<PipelineEngine<MemoryStore>> {
    let engine = Arc::new(PipelineEngine::new(Arc::new(MemoryStore::default())));
    engine.seed_candidates(&seeds).expect("seed applies");
    engine
}

pub(super) fn cid(id: &str) -> CandidateId {
    CandidateId(id.to_string())
}

pub(super) fn ids(candidates: &[Candidate]) -> Vec<String> {
    candidates
        .iter()
        .map(|candidate| candidate.id.0.clone())
        .collect()
}
