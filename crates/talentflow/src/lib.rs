//! Candidate pipeline state engine for a kanban-style hiring board.
//!
//! The [`pipeline`] module owns the data model, the move/reorder commands,
//! the rank-persistence policy, and the read-side projections. `config`,
//! `error`, and `telemetry` carry the operational scaffolding shared with
//! the HTTP service crate.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod telemetry;
