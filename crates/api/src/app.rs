use std::time::Duration;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::auth::AuthMiddleware;
use crate::routes;
use crate::state::AppState;

/// Builds the Axum router: a public health probe plus the authenticated API.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/tournament", post(routes::tournaments::create))
        .route(
            "/api/tournament/tournaments",
            post(routes::tournaments::list),
        )
        .route("/api/tournament/:id", get(routes::tournaments::get_one))
        .route(
            "/api/tournament/:id/complete",
            patch(routes::tournaments::complete),
        )
        .route(
            "/api/tournament/:id/generate-bracket",
            post(routes::tournaments::generate_bracket),
        )
        .route("/api/tournament/:id/bracket", get(routes::tournaments::bracket))
        .route("/api/tournament/:id/prizes", get(routes::tournaments::prizes))
        .route(
            "/api/tournament/:id/participants",
            get(routes::tournaments::participants),
        )
        .route(
            "/api/sponsorship/tournaments/:id",
            post(routes::sponsorships::sponsor),
        )
        .route("/api/application", post(routes::applications::submit))
        .route("/api/application/:id", get(routes::applications::by_id))
        .route(
            "/api/application/:id/status",
            patch(routes::applications::update_status),
        )
        .route(
            "/api/application/tournament/:id",
            get(routes::applications::list_for_tournament),
        )
        .route("/api/tickets/tournaments/:id", post(routes::tickets::book))
        .route("/api/fights/:id/result", patch(routes::fights::record_result))
        .route("/api/fights/:id/date", patch(routes::fights::update_date))
        .route(
            "/api/tournaments/:id/knights",
            get(routes::votes::knights_for_voting),
        )
        .route("/api/votes", post(routes::votes::submit))
        .route(
            "/api/user-roles/my-tournaments",
            get(routes::user_roles::my_tournaments),
        )
        .route(
            "/api/user-roles/tournaments/:id",
            get(routes::user_roles::my_role_in_tournament),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            AuthMiddleware::jwt_auth,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
        // Useful default middlewares
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(CorsLayer::permissive())
}

async fn health() -> &'static str {
    "ok"
}
