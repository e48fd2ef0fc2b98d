use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryCandidateStore, SnapshotCandidateStore};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use talentflow::config::AppConfig;
use talentflow::error::AppError;
use talentflow::pipeline::{
    CandidateCsvImporter, CandidateStore, PipelineEngine, PipelineError,
};
use talentflow::telemetry;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }
    if let Some(snapshot) = args.snapshot.take() {
        config.pipeline.snapshot_path = Some(snapshot);
    }
    if let Some(seed_csv) = args.seed_csv.take() {
        config.pipeline.seed_csv = Some(seed_csv);
    }

    telemetry::init(&config.telemetry)?;

    match config.pipeline.snapshot_path.take() {
        Some(path) => {
            let store = SnapshotCandidateStore::open(path).map_err(PipelineError::from)?;
            serve(Arc::new(store), config).await
        }
        None => serve(Arc::new(InMemoryCandidateStore::default()), config).await,
    }
}

async fn serve<S>(store: Arc<S>, config: AppConfig) -> Result<(), AppError>
where
    S: CandidateStore + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let engine = Arc::new(PipelineEngine::with_lock_timeout(
        store,
        config.pipeline.lock_timeout(),
    ));
    seed_if_requested(&engine, config.pipeline.seed_csv.clone())?;

    let app = with_pipeline_routes(engine)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "candidate pipeline service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn seed_if_requested<S>(
    engine: &PipelineEngine<S>,
    seed_csv: Option<PathBuf>,
) -> Result<(), AppError>
where
    S: CandidateStore + 'static,
{
    let Some(path) = seed_csv else {
        return Ok(());
    };

    // A reloaded snapshot already contains the candidates; only seed a
    // store that starts empty.
    if !engine.is_empty()? {
        info!("store already populated, skipping seed import");
        return Ok(());
    }

    let seeds = CandidateCsvImporter::from_path(&path)?;
    let inserted = engine.seed_candidates(&seeds)?;
    info!(inserted, seed = %path.display(), "seeded candidates from export");
    Ok(())
}
