use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{delete, get, put},
};

/// Admin Router Module
///
/// Administrator management and moderation. A valid token is not enough here: each
/// handler resolves the subject against the admin table and answers 403 otherwise.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET/POST /admins
        // New admins can only be created by an existing one. The first admin comes
        // from the startup seed.
        .route(
            "/admins",
            get(handlers::admins::list_admins).post(handlers::admins::create_admin),
        )
        .route(
            "/admins/{admin_id}",
            put(handlers::admins::update_admin).delete(handlers::admins::delete_admin),
        )
        // DELETE /admins/{admin_id}/users/{user_id}
        .route(
            "/admins/{admin_id}/users/{user_id}",
            delete(handlers::admins::delete_user_as_admin),
        )
}
