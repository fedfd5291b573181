use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{require_present, require_self_or_admin, require_user};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ErrorBody},
    extract::{Json, Path},
    models::{Course, CourseRequest},
};

/// list_courses
///
/// [Authenticated Route] Courses the user is enrolled in, by name.
#[utoipa::path(
    get,
    path = "/users/{user_id}/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Enrolled courses", body = [Course]),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn list_courses(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Course>>, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    require_user(&state, user_id).await?;
    Ok(Json(state.repo.list_courses(user_id).await?))
}

/// enroll_course
///
/// [Authenticated Route] Enrolls the user in the named course, creating the course
/// on first use. Enrolling twice is a no-op that returns the same course.
#[utoipa::path(
    post,
    path = "/users/{user_id}/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    request_body = CourseRequest,
    responses(
        (status = 200, description = "Enrolled", body = Course),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn enroll_course(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CourseRequest>,
) -> Result<Json<Course>, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    require_user(&state, user_id).await?;
    require_present("name", &payload.name)?;

    let course = state.repo.enroll(user_id, payload.name.trim()).await?;
    tracing::debug!(user_id = %user_id, course_id = %course.id, "enrolled");
    Ok(Json(course))
}

/// unenroll_course
///
/// [Authenticated Route] Removes the user's enrollment in the named course. The
/// course itself stays.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/courses",
    tag = "courses",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    request_body = CourseRequest,
    responses(
        (status = 204, description = "Enrollment removed"),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User or enrollment not found", body = ErrorBody)
    )
)]
pub async fn unenroll_course(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<CourseRequest>,
) -> Result<StatusCode, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    require_user(&state, user_id).await?;

    if state.repo.unenroll(user_id, payload.name.trim()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("enrollment"))
    }
}
