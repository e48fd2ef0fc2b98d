//! The candidate pipeline state engine.
//!
//! Candidates move through a fixed set of hiring stages on a kanban-style
//! board. This module owns the data model, the transition/reorder commands
//! with their per-stage locking discipline, the rank-persistence policy,
//! and the read-side projections clients consume.

pub mod domain;
pub mod engine;
pub mod import;
pub mod projection;
pub mod ranking;
pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use domain::{
    Candidate, CandidateId, CandidateSeed, JobId, MetadataPatch, Note, Stage, StageChange,
};
pub use engine::{resolve_stage, PipelineEngine, PipelineError, DEFAULT_LOCK_TIMEOUT};
pub use import::{CandidateCsvImporter, CandidateImportError};
pub use projection::{board_view, flat_view, CandidateFilter};
pub use router::{pipeline_router, BoardColumnView, CandidateSummaryView};
pub use store::{CandidateStore, StoreError};
