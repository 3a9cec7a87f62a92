use axum::{
    Router,
    extract::{State, WebSocketUpgrade},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};

use cupid_gateway::connection;

use crate::middleware::require_auth;
use crate::state::AppState;
use crate::{auth, feed, matches, messages, profiles, verification};

/// All HTTP and WebSocket routes. Cross-cutting layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/verification/request", post(verification::request_code))
        .route("/verification/verify", post(verification::verify_code))
        .route("/gateway", get(ws_upgrade));

    let protected_routes = Router::new()
        .route("/profile", get(profiles::get_profile).put(profiles::update_profile))
        .route("/candidates", get(feed::get_candidates))
        .route("/swipes", post(feed::swipe))
        .route("/matches", get(matches::list_matches))
        .route(
            "/matches/{match_id}/messages",
            get(messages::get_messages).post(messages::send_message),
        )
        .route("/matches/{match_id}/read", post(messages::mark_read))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    let dispatcher = state.dispatcher.clone();
    let jwt_secret = state.jwt_secret.clone();
    ws.on_upgrade(move |socket| connection::handle_connection(socket, dispatcher, jwt_secret))
}
