use axum::{Extension, Json, extract::State, response::IntoResponse};

use cupid_types::api::Claims;

use crate::error::CoreError;
use crate::state::AppState;

pub async fn list_matches(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, CoreError> {
    let matches = state.swipes.list_matches(claims.sub).await?;
    Ok(Json(matches))
}
