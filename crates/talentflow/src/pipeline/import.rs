//! CSV seed import for the external seeding/import process.
//!
//! Expected columns: `id,name,email,job_id,stage,applied_at[,rank]`.
//! `applied_at` accepts an RFC 3339 timestamp or a bare `YYYY-MM-DD` date;
//! a blank `rank` cell means "assign on import".

use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};

use super::domain::{CandidateId, CandidateSeed, JobId, Stage};

#[derive(Debug, thiserror::Error)]
pub enum CandidateImportError {
    #[error("failed to read candidate export: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid candidate CSV data: {0}")]
    Csv(#[from] csv::Error),
    #[error("row {row}: unknown pipeline stage '{value}'")]
    UnknownStage { row: usize, value: String },
    #[error("row {row}: could not parse '{value}' as a timestamp or YYYY-MM-DD date")]
    Timestamp { row: usize, value: String },
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    id: String,
    name: String,
    email: String,
    job_id: String,
    stage: String,
    applied_at: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    rank: Option<i64>,
}

pub struct CandidateCsvImporter;

impl CandidateCsvImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<CandidateSeed>, CandidateImportError> {
        let file = File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<CandidateSeed>, CandidateImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut seeds = Vec::new();
        for (index, record) in csv_reader.deserialize::<CandidateRow>().enumerate() {
            let row = record?;
            // Header occupies line 1.
            let line = index + 2;

            let stage =
                Stage::parse(&row.stage).ok_or_else(|| CandidateImportError::UnknownStage {
                    row: line,
                    value: row.stage.clone(),
                })?;
            let applied_at = parse_timestamp(&row.applied_at).ok_or_else(|| {
                CandidateImportError::Timestamp {
                    row: line,
                    value: row.applied_at.clone(),
                }
            })?;

            seeds.push(CandidateSeed {
                id: CandidateId(row.id),
                name: row.name,
                email: row.email,
                job_id: JobId(row.job_id),
                stage,
                rank: row.rank,
                applied_at,
                notes: Vec::new(),
            });
        }

        Ok(seeds)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value
            .parse::<i64>()
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
