use super::common::*;
use crate::pipeline::domain::Stage;
use crate::pipeline::projection::{board_view, flat_view, CandidateFilter};

#[test]
fn board_contains_every_stage_in_canonical_order() {
    let engine = engine_with(vec![seed("c1", Stage::Tech, 0)]);

    let board = board_view(&engine, &CandidateFilter::default()).expect("board");
    let columns: Vec<Stage> = board.keys().copied().collect();
    assert_eq!(columns, Stage::ordered().to_vec());
    assert!(board[&Stage::Applied].is_empty());
    assert_eq!(ids(&board[&Stage::Tech]), vec!["c1"]);
}

#[test]
fn search_matches_name_and_email_case_insensitively() {
    let mut amara = seed("c1", Stage::Applied, 0);
    amara.name = "Amara Okafor".to_string();
    amara.email = "amara.okafor@example.com".to_string();
    let mut liam = seed("c2", Stage::Screen, 1);
    liam.name = "Liam Chen".to_string();
    liam.email = "liam.chen@example.com".to_string();
    let engine = engine_with(vec![amara, liam]);

    let board = board_view(&engine, &CandidateFilter::matching("OKAFOR")).expect("board");
    assert_eq!(ids(&board[&Stage::Applied]), vec!["c1"]);
    assert!(board[&Stage::Screen].is_empty());

    let by_email = flat_view(&engine, &CandidateFilter::matching("liam.chen@"), None).expect("flat");
    assert_eq!(ids(&by_email), vec!["c2"]);
}

#[test]
fn blank_search_matches_everything() {
    let engine = engine_with(vec![
        seed("c1", Stage::Applied, 0),
        seed("c2", Stage::Hired, 1),
    ]);

    let flat = flat_view(&engine, &CandidateFilter::matching(""), None).expect("flat");
    assert_eq!(flat.len(), 2);
}

#[test]
fn flat_view_orders_by_stage_then_rank() {
    let engine = engine_with(vec![
        seed("h1", Stage::Hired, 0),
        seed("a2", Stage::Applied, 2),
        seed("a1", Stage::Applied, 1),
        seed("t1", Stage::Tech, 3),
    ]);

    let flat = flat_view(&engine, &CandidateFilter::default(), None).expect("flat");
    assert_eq!(ids(&flat), vec!["a1", "a2", "t1", "h1"]);
}

#[test]
fn flat_view_honors_stage_constraint() {
    let engine = engine_with(vec![
        seed("a1", Stage::Applied, 0),
        seed("t1", Stage::Tech, 1),
    ]);

    let flat = flat_view(&engine, &CandidateFilter::default(), Some(Stage::Tech)).expect("flat");
    assert_eq!(ids(&flat), vec!["t1"]);
}

#[test]
fn projections_recompute_after_commands() {
    let engine = engine_with(vec![
        seed("c1", Stage::Applied, 0),
        seed("c2", Stage::Applied, 1),
    ]);

    let before = board_view(&engine, &CandidateFilter::default()).expect("board");
    assert_eq!(ids(&before[&Stage::Applied]), vec!["c1", "c2"]);

    engine
        .move_to_stage(&cid("c1"), Stage::Offer, 0, "Alice")
        .expect("move");

    let after = board_view(&engine, &CandidateFilter::default()).expect("board");
    assert_eq!(ids(&after[&Stage::Applied]), vec!["c2"]);
    assert_eq!(ids(&after[&Stage::Offer]), vec!["c1"]);
}
