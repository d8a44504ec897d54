use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{CampaignId, Candidate, CandidateId, OutreachAction};
use super::planner::CampaignGoals;
use super::prediction::ProspectProfile;
use super::repository::{AnalyticsSink, CampaignStore, TextGenerator};
use super::service::{DecisionService, DecisionServiceError};

/// Router builder exposing the decisioning API.
pub fn decision_router<S, K, G>(service: Arc<DecisionService<S, K, G>>) -> Router
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    Router::new()
        .route(
            "/api/v1/campaigns/:campaign_id/candidates/:candidate_id/evaluate",
            post(evaluate_handler::<S, K, G>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/strategy",
            post(strategy_handler::<S, K, G>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/segments",
            get(segments_handler::<S, K, G>),
        )
        .route(
            "/api/v1/campaigns/:campaign_id/performance",
            get(performance_handler::<S, K, G>),
        )
        .route("/api/v1/predictions", post(prediction_handler::<S, K, G>))
        .route(
            "/api/v1/communication-plans",
            post(communication_plan_handler::<S, K, G>),
        )
        .with_state(service)
}

#[derive(Debug, Serialize)]
pub(crate) struct EvaluationResponse {
    pub(crate) candidate_id: CandidateId,
    pub(crate) recommended_actions: Vec<OutreachAction>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PerformanceQuery {
    #[serde(default)]
    pub(crate) timeframe: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct PredictionRequest {
    pub(crate) candidates: Vec<ProspectProfile>,
    pub(crate) campaign_type: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub(crate) struct CommunicationPlanRequest {
    pub(crate) candidate: Candidate,
    #[serde(default)]
    pub(crate) campaign_goals: CampaignGoals,
}

pub(crate) async fn evaluate_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    Path((campaign_id, candidate_id)): Path<(String, String)>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    let candidate_id = CandidateId(candidate_id);
    match service.evaluate_candidate(&CampaignId(campaign_id), &candidate_id) {
        Ok(recommended_actions) => (
            StatusCode::OK,
            Json(EvaluationResponse {
                candidate_id,
                recommended_actions,
            }),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn strategy_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    match service.generate_strategy(&CampaignId(campaign_id)) {
        Ok(strategy) => (StatusCode::OK, Json(strategy)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn segments_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    Path(campaign_id): Path<String>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    match service.optimize_targeting(&CampaignId(campaign_id)) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn performance_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    Path(campaign_id): Path<String>,
    query: Result<Query<PerformanceQuery>, QueryRejection>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return json_error(rejection.status(), rejection.body_text()),
    };
    match service.analyze_performance(&CampaignId(campaign_id), query.timeframe.as_deref()) {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn prediction_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    request: Result<Json<PredictionRequest>, JsonRejection>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return json_error(rejection.status(), rejection.body_text()),
    };
    match service.predict_conversion(&request.candidates, &request.campaign_type) {
        Ok(forecast) => (StatusCode::OK, Json(forecast)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn communication_plan_handler<S, K, G>(
    State(service): State<Arc<DecisionService<S, K, G>>>,
    request: Result<Json<CommunicationPlanRequest>, JsonRejection>,
) -> Response
where
    S: CampaignStore + 'static,
    K: AnalyticsSink + 'static,
    G: TextGenerator + 'static,
{
    let Json(request) = match request {
        Ok(request) => request,
        Err(rejection) => return json_error(rejection.status(), rejection.body_text()),
    };
    let view = service.plan_communication(&request.candidate, &request.campaign_goals);
    (StatusCode::OK, Json(view)).into_response()
}

pub(crate) fn error_response(error: DecisionServiceError) -> Response {
    let status = match &error {
        DecisionServiceError::CampaignNotFound(_) | DecisionServiceError::CandidateNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        DecisionServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DecisionServiceError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    json_error(status, error.to_string())
}

/// `{"error": ...}` body shared by service errors and extractor rejections.
pub(crate) fn json_error(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
