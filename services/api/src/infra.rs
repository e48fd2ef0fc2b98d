use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use talentflow::pipeline::{Candidate, CandidateId, CandidateStore, Stage, StoreError};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryCandidateStore {
    records: Arc<Mutex<HashMap<CandidateId, Candidate>>>,
}

impl CandidateStore for InMemoryCandidateStore {
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

/// Candidate store that mirrors every write to a JSON file so the board
/// survives a process restart. Writes go to a sibling temp file first and
/// are renamed into place.
pub(crate) struct SnapshotCandidateStore {
    records: Mutex<HashMap<CandidateId, Candidate>>,
    path: PathBuf,
}

impl SnapshotCandidateStore {
    pub(crate) fn open(path: PathBuf) -> Result<Self, StoreError> {
        let records = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str::<Vec<Candidate>>(&raw)
                .map_err(|err| {
                    StoreError::Unavailable(format!(
                        "snapshot {} is not valid candidate JSON: {err}",
                        path.display()
                    ))
                })?
                .into_iter()
                .map(|candidate| (candidate.id.clone(), candidate))
                .collect(),
            Err(err) if err.kind() == ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(StoreError::Unavailable(format!(
                    "cannot read snapshot {}: {err}",
                    path.display()
                )))
            }
        };

        Ok(Self {
            records: Mutex::new(records),
            path,
        })
    }

    fn persist(&self, records: &HashMap<CandidateId, Candidate>) -> Result<(), StoreError> {
        let mut rows: Vec<&Candidate> = records.values().collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        let payload = serde_json::to_string_pretty(&rows)
            .map_err(|err| StoreError::Unavailable(format!("cannot serialize snapshot: {err}")))?;

        let staging = staging_path(&self.path);
        fs::write(&staging, payload).map_err(|err| {
            StoreError::Unavailable(format!("cannot write snapshot {}: {err}", staging.display()))
        })?;
        fs::rename(&staging, &self.path).map_err(|err| {
            StoreError::Unavailable(format!(
                "cannot move snapshot into place at {}: {err}",
                self.path.display()
            ))
        })
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

impl CandidateStore for SnapshotCandidateStore {
    fn insert(&self, candidate: Candidate) -> Result<(), StoreError> {
        let mut guard = self.records.lock().expect("store mutex poisoned");
        if guard.contains_key(&candidate.id) {
            return Err(StoreError::Conflict);
        }
        guard.insert(candidate.id.clone(), candidate);
        self.persist(&guard)
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
        self.persist(&guard)
    }
}
