use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{account_changes, require_present, require_self_or_admin};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, AuthError, ErrorBody},
    extract::{Json, Path},
    models::{
        LoginRequest, NewAccount, RegisterRequest, UpdateAccountRequest, User, UserAuthResponse,
        UserResponse,
    },
};

/// list_users
///
/// [Authenticated Route] Lists every registered user.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 401, description = "Missing, invalid or expired token", body = ErrorBody)
    )
)]
pub async fn list_users(
    _caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let users = state.repo.list_users().await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// register_user
///
/// [Public Route] Creates an account and logs it straight in. The password is hashed
/// before it reaches the store.
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserAuthResponse),
        (status = 400, description = "Blank field", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserAuthResponse>), ApiError> {
    require_present("name", &payload.name)?;
    require_present("email", &payload.email)?;
    require_present("password", &payload.password)?;

    let account = NewAccount {
        name: payload.name,
        email: payload.email,
        password_hash: state.auth.hash_password(&payload.password)?,
    };
    let user = state.repo.create_user(account).await?;
    let issued = state.auth.issue_token(user.id)?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(UserAuthResponse {
            token: issued.token,
            expires_in: issued.expires_in,
            subject: user.into(),
        }),
    ))
}

/// login_user
///
/// [Public Route] Exchanges email and password for a bearer token and marks the
/// account as logged in. Unknown email and wrong password answer identically.
#[utoipa::path(
    post,
    path = "/users/login",
    tag = "users",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = UserAuthResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorBody)
    )
)]
pub async fn login_user(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<UserAuthResponse>, ApiError> {
    let user = state.repo.find_user_by_email(&payload.email).await?;

    let issued = state
        .auth
        .login(user.as_ref().map(User::credential), &payload.password)
        .inspect_err(|e| tracing::warn!(reason = ?e, "user login rejected"))?;
    // login only succeeds when the store returned a credential.
    let user = user.ok_or(AuthError::CredentialNotFound)?;

    state.repo.mark_user_logged_in(user.id).await?;

    let mut subject = UserResponse::from(user);
    subject.is_logged = true;

    Ok(Json(UserAuthResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        subject,
    }))
}

/// update_user
///
/// [Authenticated Route] Partial update of an account by its owner or an admin. A
/// new password is re-hashed.
#[utoipa::path(
    put,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated", body = UserResponse),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn update_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    let changes = account_changes(&state, payload)?;

    match state.repo.update_user(user_id, changes).await? {
        Some(user) => Ok(Json(user.into())),
        None => Err(ApiError::NotFound("user")),
    }
}

/// delete_user
///
/// [Authenticated Route] Deletes an account, with its addresses and enrollments.
/// Tokens already issued to it simply run out; there is no revocation list.
#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_user(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;

    if state.repo.delete_user(user_id).await? {
        tracing::info!(user_id = %user_id, by = %caller.id, "user deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("user"))
    }
}
