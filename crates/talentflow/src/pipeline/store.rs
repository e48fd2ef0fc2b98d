use super::domain::{Candidate, CandidateId, Stage};

/// Storage abstraction so the engine can be exercised against an in-memory
/// map in tests and a snapshot-backed map in the service.
///
/// Reads must return a consistent snapshot (never a half-written record);
/// `commit` must apply the whole batch or none of it.
pub trait CandidateStore: Send + Sync {
    /// Insert a freshly seeded candidate. Duplicate ids are a `Conflict`.
    fn insert(&self, candidate: Candidate) -> Result<(), StoreError>;

    fn fetch(&self, id: &CandidateId) -> Result<Option<Candidate>, StoreError>;

    fn list_all(&self) -> Result<Vec<Candidate>, StoreError>;

    fn list_by_stage(&self, stage: Stage) -> Result<Vec<Candidate>, StoreError>;

    /// Atomically upsert every candidate in the batch. Used for the
    /// multi-candidate rank rewrites a move or reorder produces.
    fn commit(&self, batch: Vec<Candidate>) -> Result<(), StoreError>;
}

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("candidate record already exists")]
    Conflict,
    #[error("candidate record not found")]
    NotFound,
    #[error("store unavailable: {0}")]
    Unavailable(String),
}
