use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;

use cupid_types::api::{RequestCodeRequest, VerifyCodeRequest};

use crate::error::CoreError;
use crate::state::AppState;

/// Public: the account may not have a session yet when it asks for a code.
pub async fn request_code(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<RequestCodeRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    state.otp.request_code(&req.email).await?;
    Ok(StatusCode::ACCEPTED)
}

pub async fn verify_code(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<VerifyCodeRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    state.otp.verify_code(req.account_id, &req.code).await?;
    Ok(StatusCode::NO_CONTENT)
}
