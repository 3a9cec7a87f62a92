use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use axum_extra::extract::WithRejection;

use cupid_types::api::{LoginRequest, SignupRequest};

use crate::error::CoreError;
use crate::state::AppState;

pub async fn signup(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SignupRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let res = state
        .accounts
        .signup(&req.email, &req.password, &req.full_name)
        .await?;
    Ok((StatusCode::CREATED, Json(res)))
}

pub async fn login(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<LoginRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let res = state.accounts.login(&req.email, &req.password).await?;
    Ok(Json(res))
}
