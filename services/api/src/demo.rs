use crate::infra::InMemoryCandidateStore;
use chrono::{Duration, Utc};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;
use talentflow::error::AppError;
use talentflow::pipeline::{
    board_view, flat_view, resolve_stage, Candidate, CandidateCsvImporter, CandidateFilter,
    CandidateId, CandidateSeed, JobId, PipelineEngine, Stage,
};

#[derive(Args, Debug, Default)]
pub(crate) struct BoardArgs {
    /// Candidate CSV export to render
    #[arg(long)]
    pub(crate) seed_csv: PathBuf,
    /// Case-insensitive name/email filter applied before grouping
    #[arg(long)]
    pub(crate) search: Option<String>,
    /// Restrict the output to one stage column
    #[arg(long)]
    pub(crate) stage: Option<String>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Actor recorded on the demo's stage changes
    #[arg(long, default_value = "Demo User")]
    pub(crate) actor: String,
}

pub(crate) fn run_board(args: BoardArgs) -> Result<(), AppError> {
    let BoardArgs {
        seed_csv,
        search,
        stage,
    } = args;

    let stage = stage.as_deref().map(resolve_stage).transpose()?;
    let seeds = CandidateCsvImporter::from_path(&seed_csv)?;
    let engine = demo_engine();
    let inserted = engine.seed_candidates(&seeds)?;
    println!("Loaded {} candidates from {}", inserted, seed_csv.display());

    let filter = CandidateFilter { search };
    match stage {
        Some(stage) => {
            let members = flat_view(&engine, &filter, Some(stage))?;
            render_column(stage, &members);
        }
        None => render_board(&engine, &filter)?,
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs { actor } = args;

    println!("Candidate pipeline demo");
    let engine = demo_engine();
    engine.seed_candidates(&demo_seeds())?;

    println!("\nBoard after seeding:");
    render_board(&engine, &CandidateFilter::default())?;

    // Walk one candidate through the funnel and reshuffle a column.
    engine.move_to_stage(&CandidateId("demo-emma".into()), Stage::Screen, 0, &actor)?;
    engine.move_to_stage(&CandidateId("demo-emma".into()), Stage::Tech, 0, &actor)?;
    let screen: Vec<CandidateId> = engine
        .list_by_stage(Stage::Screen)?
        .into_iter()
        .rev()
        .map(|candidate| candidate.id)
        .collect();
    engine.reorder_within_stage(Stage::Screen, &screen)?;

    println!("\nBoard after moving Emma to tech and reversing screen:");
    render_board(&engine, &CandidateFilter::default())?;

    println!("\nAudit trail for Emma:");
    for change in engine.get_history(&CandidateId("demo-emma".into()))? {
        let from = change
            .from
            .map(|stage| stage.label())
            .unwrap_or("(created)");
        println!(
            "  {} -> {} at {} by {}",
            from,
            change.to,
            change.changed_at.format("%Y-%m-%d %H:%M:%S"),
            change.changed_by
        );
    }
    Ok(())
}

fn demo_engine() -> Arc<PipelineEngine<InMemoryCandidateStore>> {
    Arc::new(PipelineEngine::new(Arc::new(
        InMemoryCandidateStore::default(),
    )))
}

fn demo_seeds() -> Vec<CandidateSeed> {
    let now = Utc::now();
    let seed = |id: &str, name: &str, stage: Stage, hours_ago: i64| CandidateSeed {
        id: CandidateId(format!("demo-{id}")),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        job_id: JobId("job-frontend".to_string()),
        stage,
        rank: None,
        applied_at: now - Duration::hours(hours_ago),
        notes: Vec::new(),
    };

    vec![
        seed("emma", "Emma Smith", Stage::Applied, 96),
        seed("liam", "Liam Jones", Stage::Applied, 72),
        seed("ava", "Ava Garcia", Stage::Screen, 60),
        seed("noah", "Noah Davis", Stage::Screen, 48),
        seed("mia", "Mia Lopez", Stage::Offer, 24),
    ]
}

fn render_board<S>(
    engine: &PipelineEngine<S>,
    filter: &CandidateFilter,
) -> Result<(), AppError>
where
    S: talentflow::pipeline::CandidateStore + 'static,
{
    let board = board_view(engine, filter)?;
    for (stage, members) in board {
        render_column(stage, &members);
    }
    Ok(())
}

fn render_column(stage: Stage, members: &[Candidate]) {
    println!("{} ({})", stage, members.len());
    if members.is_empty() {
        println!("  (no candidates)");
        return;
    }
    for candidate in members {
        println!(
            "  [{}] {} <{}>",
            candidate.rank, candidate.name, candidate.email
        );
    }
}
