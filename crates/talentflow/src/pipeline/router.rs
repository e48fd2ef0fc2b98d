use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{Candidate, CandidateId, MetadataPatch, Stage};
use super::engine::{resolve_stage, PipelineEngine, PipelineError};
use super::projection::{board_view, flat_view, CandidateFilter};
use super::store::CandidateStore;

/// Router builder exposing the pipeline's query and command surface.
pub fn pipeline_router<S>(engine: Arc<PipelineEngine<S>>) -> Router
where
    S: CandidateStore + 'static,
{
    Router::new()
        .route("/api/v1/pipeline/board", get(board_handler::<S>))
        .route("/api/v1/pipeline/candidates", get(flat_handler::<S>))
        .route(
            "/api/v1/pipeline/stages/:stage/candidates",
            get(stage_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/stages/:stage/order",
            put(reorder_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/move",
            post(move_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id/history",
            get(history_handler::<S>),
        )
        .route(
            "/api/v1/pipeline/candidates/:candidate_id",
            patch(patch_handler::<S>),
        )
        .with_state(engine)
}

/// Sanitized candidate representation for list and board responses. Notes
/// stay off the wire here; the audit trail has its own endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct CandidateSummaryView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub job_id: String,
    pub stage: Stage,
    pub rank: i64,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Candidate> for CandidateSummaryView {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.id.0.clone(),
            name: candidate.name.clone(),
            email: candidate.email.clone(),
            job_id: candidate.job_id.0.clone(),
            stage: candidate.stage,
            rank: candidate.rank,
            applied_at: candidate.applied_at,
            updated_at: candidate.updated_at,
        }
    }
}

/// One board column: the stage plus its ordered members.
#[derive(Debug, Serialize)]
pub struct BoardColumnView {
    pub stage: Stage,
    pub candidates: Vec<CandidateSummaryView>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MoveRequest {
    pub(crate) stage: String,
    pub(crate) index: usize,
    #[serde(default = "default_actor")]
    pub(crate) actor: String,
}

fn default_actor() -> String {
    "User".to_string()
}

#[derive(Debug, Deserialize)]
pub(crate) struct ReorderRequest {
    pub(crate) ordered_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FlatQuery {
    pub(crate) search: Option<String>,
    pub(crate) stage: Option<String>,
}

pub(crate) async fn board_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Query(filter): Query<CandidateFilter>,
) -> Response
where
    S: CandidateStore + 'static,
{
    match board_view(&engine, &filter) {
        Ok(board) => {
            let columns: Vec<BoardColumnView> = board
                .into_iter()
                .map(|(stage, members)| BoardColumnView {
                    stage,
                    candidates: members.iter().map(CandidateSummaryView::from).collect(),
                })
                .collect();
            (StatusCode::OK, Json(columns)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn flat_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Query(query): Query<FlatQuery>,
) -> Response
where
    S: CandidateStore + 'static,
{
    let stage = match query.stage.as_deref().map(resolve_stage).transpose() {
        Ok(stage) => stage,
        Err(error) => return error_response(error),
    };
    let filter = CandidateFilter {
        search: query.search,
    };
    match flat_view(&engine, &filter, stage) {
        Ok(candidates) => {
            let views: Vec<CandidateSummaryView> =
                candidates.iter().map(CandidateSummaryView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn stage_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Path(stage): Path<String>,
) -> Response
where
    S: CandidateStore + 'static,
{
    match resolve_stage(&stage).and_then(|stage| engine.list_by_stage(stage)) {
        Ok(members) => {
            let views: Vec<CandidateSummaryView> =
                members.iter().map(CandidateSummaryView::from).collect();
            (StatusCode::OK, Json(views)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn move_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Path(candidate_id): Path<String>,
    Json(request): Json<MoveRequest>,
) -> Response
where
    S: CandidateStore + 'static,
{
    let id = CandidateId(candidate_id);
    let result = resolve_stage(&request.stage)
        .and_then(|stage| engine.move_to_stage(&id, stage, request.index, &request.actor));
    match result {
        Ok(candidate) => {
            (StatusCode::OK, Json(CandidateSummaryView::from(&candidate))).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn reorder_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Path(stage): Path<String>,
    Json(request): Json<ReorderRequest>,
) -> Response
where
    S: CandidateStore + 'static,
{
    let ordered: Vec<CandidateId> = request.ordered_ids.into_iter().map(CandidateId).collect();
    match resolve_stage(&stage).and_then(|stage| engine.reorder_within_stage(stage, &ordered)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn history_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Path(candidate_id): Path<String>,
) -> Response
where
    S: CandidateStore + 'static,
{
    let id = CandidateId(candidate_id);
    match engine.get_history(&id) {
        Ok(history) => (StatusCode::OK, Json(history)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn patch_handler<S>(
    State(engine): State<Arc<PipelineEngine<S>>>,
    Path(candidate_id): Path<String>,
    Json(patch): Json<MetadataPatch>,
) -> Response
where
    S: CandidateStore + 'static,
{
    let id = CandidateId(candidate_id);
    match engine.patch_metadata(&id, &patch) {
        Ok(candidate) => {
            (StatusCode::OK, Json(CandidateSummaryView::from(&candidate))).into_response()
        }
        Err(error) => error_response(error),
    }
}

/// `NotFound`/`InvalidStage`/`InvalidReorder` tell the client its view of
/// the board is stale; `Contention` tells it to retry the drag.
fn error_response(error: PipelineError) -> Response {
    let status = match &error {
        PipelineError::NotFound(_) => StatusCode::NOT_FOUND,
        PipelineError::InvalidStage(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PipelineError::InvalidReorder(_) => StatusCode::CONFLICT,
        PipelineError::Contention(_) => StatusCode::SERVICE_UNAVAILABLE,
        PipelineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
