use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use uuid::Uuid;

use cupid_types::api::{Claims, MarkReadResponse, SendMessageRequest};

use crate::error::CoreError;
use crate::state::AppState;

pub async fn send_message(
    State(state): State<AppState>,
    WithRejection(Path(match_id), _): WithRejection<Path<Uuid>, CoreError>,
    Extension(claims): Extension<Claims>,
    WithRejection(Json(req), _): WithRejection<Json<SendMessageRequest>, CoreError>,
) -> Result<impl IntoResponse, CoreError> {
    let message = state.chat.send(match_id, claims.sub, &req.content).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn get_messages(
    State(state): State<AppState>,
    WithRejection(Path(match_id), _): WithRejection<Path<Uuid>, CoreError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, CoreError> {
    let messages = state.chat.history_for(claims.sub, match_id).await?;
    Ok(Json(messages))
}

pub async fn mark_read(
    State(state): State<AppState>,
    WithRejection(Path(match_id), _): WithRejection<Path<Uuid>, CoreError>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, CoreError> {
    let updated = state.chat.mark_read(match_id, claims.sub).await?;
    Ok(Json(MarkReadResponse { updated }))
}
