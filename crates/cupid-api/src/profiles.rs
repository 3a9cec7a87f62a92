use axum::{Extension, Json, extract::State, response::IntoResponse};
use axum_extra::extract::WithRejection;

use cupid_types::api::{Claims, UpdateProfileRequest};

use crate::error::CoreError;
use crate::state::AppState;

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, CoreError> {
    let res = state.profiles.get_profile(claims.sub).await?;
    Ok(Json(res))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<UpdateProfileRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let res = state.profiles.update_profile(claims.sub, req).await?;
    Ok(Json(res))
}
