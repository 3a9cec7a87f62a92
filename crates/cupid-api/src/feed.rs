use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use cupid_types::api::{Claims, SwipeRequest, SwipeResponse};

use crate::error::CoreError;
use crate::services::candidates::DEFAULT_CANDIDATE_LIMIT;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CandidateQuery {
    #[serde(default = "default_limit")]
    pub limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_CANDIDATE_LIMIT
}

pub async fn get_candidates(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Query(query), _): WithRejection<Query<CandidateQuery>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let profiles = state
        .candidates
        .get_candidates(claims.sub, query.limit)
        .await?;
    Ok(Json(profiles))
}

pub async fn swipe(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<SwipeRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let result = state
        .swipes
        .record_swipe(claims.sub, req.target_id, req.decision)
        .await?;
    Ok(Json(SwipeResponse {
        matched: result.matched,
        matched_with: result.new_match,
    }))
}
