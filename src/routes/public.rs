use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a bearer token.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness check for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /users
        // Registration. Answers with a token so the client is logged in straight away.
        .route("/users", post(handlers::users::register_user))
        // POST /users/login
        .route("/users/login", post(handlers::users::login_user))
        // POST /admins/login
        .route("/admins/login", post(handlers::admins::login_admin))
}
