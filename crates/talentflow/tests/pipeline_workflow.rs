use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{Duration, TimeZone, Utc};
use talentflow::pipeline::{
    board_view, flat_view, Candidate, CandidateFilter, CandidateId, CandidateSeed, CandidateStore,
    JobId, PipelineEngine, Stage, StoreError,
};

#[derive(Default)]
struct BoardStore {
    records: Mutex<HashMap<CandidateId, Candidate>>,
}

impl CandidateStore for BoardStore {
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

fn seed(id: &str, name: &str, stage: Stage, minutes: i64) -> CandidateSeed {
    let applied_at = Utc
        .with_ymd_and_hms(2025, 4, 7, 8, 0, 0)
        .single()
        .expect("valid fixture timestamp")
        + Duration::minutes(minutes);
    CandidateSeed {
        id: CandidateId(id.to_string()),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        job_id: JobId("job-7".to_string()),
        stage,
        rank: None,
        applied_at,
        notes: Vec::new(),
    }
}

fn board_engine() -> Arc<PipelineEngine<BoardStore>> {
    let engine = Arc::new(PipelineEngine::new(Arc::new(BoardStore::default())));
    engine
        .seed_candidates(&[
            seed("emma", "Emma Smith", Stage::Applied, 0),
            seed("liam", "Liam Jones", Stage::Applied, 5),
            seed("ava", "Ava Garcia", Stage::Screen, 10),
            seed("noah", "Noah Davis", Stage::Tech, 15),
        ])
        .expect("seed applies");
    engine
}

#[test]
fn a_full_drag_session_keeps_the_board_consistent() {
    let engine = board_engine();

    // Recruiter drags Liam into screen above Ava, then promotes him to tech.
    engine
        .move_to_stage(&CandidateId("liam".into()), Stage::Screen, 0, "Rita")
        .expect("first drag");
    engine
        .move_to_stage(&CandidateId("liam".into()), Stage::Tech, 1, "Rita")
        .expect("second drag");

    let board = board_view(&engine, &CandidateFilter::default()).expect("board");
    let names = |stage: Stage| -> Vec<String> {
        board[&stage]
            .iter()
            .map(|candidate| candidate.id.0.clone())
            .collect()
    };

    assert_eq!(names(Stage::Applied), vec!["emma"]);
    assert_eq!(names(Stage::Screen), vec!["ava"]);
    assert_eq!(names(Stage::Tech), vec!["noah", "liam"]);

    for stage in Stage::ordered() {
        let members = engine.list_by_stage(stage).expect("list");
        let ranks: Vec<i64> = members.iter().map(|candidate| candidate.rank).collect();
        assert_eq!(
            ranks,
            (0..members.len() as i64).collect::<Vec<_>>(),
            "{stage} must stay contiguously ranked"
        );
        assert!(members.iter().all(|candidate| candidate.stage == stage));
    }

    let history = engine
        .get_history(&CandidateId("liam".into()))
        .expect("history");
    let hops: Vec<(Option<Stage>, Stage)> = history
        .iter()
        .map(|change| (change.from, change.to))
        .collect();
    assert_eq!(
        hops,
        vec![
            (None, Stage::Applied),
            (Some(Stage::Applied), Stage::Screen),
            (Some(Stage::Screen), Stage::Tech),
        ]
    );
}

#[test]
fn search_projection_spans_the_whole_board() {
    let engine = board_engine();

    let matches = flat_view(&engine, &CandidateFilter::matching("garcia"), None).expect("flat");
    let ids: Vec<&str> = matches.iter().map(|c| c.id.0.as_str()).collect();
    assert_eq!(ids, vec!["ava"]);

    let by_email = flat_view(&engine, &CandidateFilter::matching("LIAM@EXAMPLE"), None)
        .expect("flat");
    let ids: Vec<&str> = by_email.iter().map(|c| c.id.0.as_str()).collect();
    assert_eq!(ids, vec!["liam"]);

    let everyone = flat_view(&engine, &CandidateFilter::default(), None).expect("flat");
    assert_eq!(everyone.len(), 4);
}

#[test]
fn reordering_is_observable_exactly_as_submitted() {
    let engine = board_engine();
    engine
        .seed_candidates(&[seed("mia", "Mia Lopez", Stage::Applied, 20)])
        .expect("seed applies");

    let applied = engine.list_by_stage(Stage::Applied).expect("list");
    assert_eq!(applied.len(), 3);

    let reversed: Vec<CandidateId> = applied
        .iter()
        .rev()
        .map(|candidate| candidate.id.clone())
        .collect();
    engine
        .reorder_within_stage(Stage::Applied, &reversed)
        .expect("reorder applies");

    let observed: Vec<CandidateId> = engine
        .list_by_stage(Stage::Applied)
        .expect("list")
        .into_iter()
        .map(|candidate| candidate.id)
        .collect();
    assert_eq!(observed, reversed);
}
