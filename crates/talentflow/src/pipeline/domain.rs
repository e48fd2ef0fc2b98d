use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// One discrete phase of the hiring pipeline.
///
/// The enum doubles as the stage registry: `ordered()` is the canonical
/// display order used for board columns and for lock acquisition, and the
/// derived `Ord` follows that same order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Applied,
    Screen,
    Tech,
    Offer,
    Hired,
    Rejected,
}

impl Stage {
    pub const COUNT: usize = 6;

    pub const fn ordered() -> [Self; Stage::COUNT] {
        [
            Self::Applied,
            Self::Screen,
            Self::Tech,
            Self::Offer,
            Self::Hired,
            Self::Rejected,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Screen => "screen",
            Self::Tech => "tech",
            Self::Offer => "offer",
            Self::Hired => "hired",
            Self::Rejected => "rejected",
        }
    }

    /// Resolve a wire name such as `"screen"`. Returns `None` for anything
    /// outside the registry; callers at untyped boundaries map that to
    /// [`PipelineError::InvalidStage`](super::engine::PipelineError).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "applied" => Some(Self::Applied),
            "screen" => Some(Self::Screen),
            "tech" => Some(Self::Tech),
            "offer" => Some(Self::Offer),
            "hired" => Some(Self::Hired),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub(crate) const fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Identifier wrapper for candidates. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CandidateId(pub String);

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Foreign key into external job data. Never inspected by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

/// One audit entry in a candidate's stage history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageChange {
    pub id: Uuid,
    pub from: Option<Stage>,
    pub to: Stage,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
}

impl StageChange {
    /// The entry every candidate starts with: `None -> applied`, stamped
    /// with the application timestamp.
    pub fn initial(applied_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: None,
            to: Stage::Applied,
            changed_at: applied_at,
            changed_by: "System".to_string(),
        }
    }

    pub(crate) fn transition(
        from: Stage,
        to: Stage,
        changed_at: DateTime<Utc>,
        changed_by: &str,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from: Some(from),
            to,
            changed_at,
            changed_by: changed_by.to_string(),
        }
    }
}

/// Free-text note attached by recruiters. Opaque payload: stored, patched,
/// and returned verbatim, never read by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub content: String,
    pub mentions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

/// One applicant moving through the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub job_id: JobId,
    pub stage: Stage,
    /// Sibling order within `stage`. Unique between commands, renumbered
    /// from zero after every mutation.
    pub rank: i64,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub stage_history: Vec<StageChange>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Bulk-import representation accepted by the seeding interface.
///
/// `rank` preserves imported order when present; seeds without one are
/// slotted after the ranked ones in `applied_at` order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidateSeed {
    pub id: CandidateId,
    pub name: String,
    pub email: String,
    pub job_id: JobId,
    pub stage: Stage,
    #[serde(default)]
    pub rank: Option<i64>,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Vec<Note>,
}

/// Narrow write path for display fields. Every field is optional; set
/// fields are written through unvalidated.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub notes: Option<Vec<Note>>,
}

impl MetadataPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.email.is_none() && self.notes.is_none()
    }
}
