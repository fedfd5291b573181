use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, put},
};

/// Authenticated Router Module
///
/// Everything a logged-in user can do. The gate layered on in `create_router`
/// guarantees every handler here receives a verified `AuthUser`. Routes scoped to a
/// `{user_id}` are restricted to that user or an admin inside the handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /users
        .route("/users", get(handlers::users::list_users))
        // PUT/DELETE /users/{user_id}
        // Deleting a user cascades to its addresses and enrollments.
        .route(
            "/users/{user_id}",
            put(handlers::users::update_user).delete(handlers::users::delete_user),
        )
        // --- Addresses ---
        .route(
            "/users/{user_id}/address",
            get(handlers::addresses::list_addresses).post(handlers::addresses::create_address),
        )
        .route(
            "/users/{user_id}/address/{address_id}",
            put(handlers::addresses::update_address).delete(handlers::addresses::delete_address),
        )
        // --- Courses ---
        // POST enrolls by course name, creating the course on first use.
        // DELETE takes the course name in the body.
        .route(
            "/users/{user_id}/courses",
            get(handlers::courses::list_courses)
                .post(handlers::courses::enroll_course)
                .delete(handlers::courses::unenroll_course),
        )
}
