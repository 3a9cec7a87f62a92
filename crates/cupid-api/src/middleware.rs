use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::error::CoreError;
use crate::state::AppState;

/// Extract and validate the session JWT from the Authorization header and
/// expose its `Claims` to handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, CoreError> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(CoreError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(CoreError::Unauthorized)?;

    let claims = state.accounts.decode_token(token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
