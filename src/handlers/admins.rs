use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{account_changes, require_admin, require_present};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, AuthError, ErrorBody},
    extract::{Json, Path},
    models::{
        Admin, AdminAuthResponse, AdminResponse, LoginRequest, NewAccount, RegisterRequest,
        UpdateAccountRequest,
    },
};

/// list_admins
///
/// [Admin Route] Lists every administrator.
#[utoipa::path(
    get,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All admins", body = [AdminResponse]),
        (status = 403, description = "Caller is not an admin", body = ErrorBody)
    )
)]
pub async fn list_admins(
    caller: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminResponse>>, ApiError> {
    require_admin(&state, caller).await?;
    let admins = state.repo.list_admins().await?;
    Ok(Json(admins.into_iter().map(AdminResponse::from).collect()))
}

/// create_admin
///
/// [Admin Route] Creates another administrator. The new admin signs in through
/// `/admins/login`; no token is handed to the creator.
#[utoipa::path(
    post,
    path = "/admins",
    tag = "admins",
    security(("bearer_auth" = [])),
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Created", body = AdminResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 409, description = "Email already registered", body = ErrorBody)
    )
)]
pub async fn create_admin(
    caller: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AdminResponse>), ApiError> {
    require_admin(&state, caller).await?;
    require_present("name", &payload.name)?;
    require_present("email", &payload.email)?;
    require_present("password", &payload.password)?;

    let account = NewAccount {
        name: payload.name,
        email: payload.email,
        password_hash: state.auth.hash_password(&payload.password)?,
    };
    let admin = state.repo.create_admin(account).await?;

    tracing::info!(admin_id = %admin.id, by = %caller.id, "admin created");
    Ok((StatusCode::CREATED, Json(admin.into())))
}

/// login_admin
///
/// [Public Route] Exchanges admin email and password for a bearer token.
#[utoipa::path(
    post,
    path = "/admins/login",
    tag = "admins",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = AdminAuthResponse),
        (status = 401, description = "Incorrect email or password", body = ErrorBody)
    )
)]
pub async fn login_admin(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AdminAuthResponse>, ApiError> {
    let admin = state.repo.find_admin_by_email(&payload.email).await?;

    let issued = state
        .auth
        .login(admin.as_ref().map(Admin::credential), &payload.password)
        .inspect_err(|e| tracing::warn!(reason = ?e, "admin login rejected"))?;
    let admin = admin.ok_or(AuthError::CredentialNotFound)?;

    Ok(Json(AdminAuthResponse {
        token: issued.token,
        expires_in: issued.expires_in,
        subject: admin.into(),
    }))
}

/// update_admin
///
/// [Admin Route] Partial update of an administrator. A new password is re-hashed.
#[utoipa::path(
    put,
    path = "/admins/{admin_id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("admin_id" = Uuid, Path, description = "Admin ID")),
    request_body = UpdateAccountRequest,
    responses(
        (status = 200, description = "Updated", body = AdminResponse),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn update_admin(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<AdminResponse>, ApiError> {
    require_admin(&state, caller).await?;
    let changes = account_changes(&state, payload)?;

    match state.repo.update_admin(admin_id, changes).await? {
        Some(admin) => Ok(Json(admin.into())),
        None => Err(ApiError::NotFound("admin")),
    }
}

/// delete_admin
///
/// [Admin Route] Removes an administrator.
#[utoipa::path(
    delete,
    path = "/admins/{admin_id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(("admin_id" = Uuid, Path, description = "Admin ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "Not Found", body = ErrorBody)
    )
)]
pub async fn delete_admin(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(admin_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, caller).await?;

    if state.repo.delete_admin(admin_id).await? {
        tracing::info!(admin_id = %admin_id, by = %caller.id, "admin deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("admin"))
    }
}

/// delete_user_as_admin
///
/// [Admin Route] An administrator removes a user account. Both path segments carry
/// their own name, so `admin_id` and `user_id` are always distinguishable.
#[utoipa::path(
    delete,
    path = "/admins/{admin_id}/users/{user_id}",
    tag = "admins",
    security(("bearer_auth" = [])),
    params(
        ("admin_id" = Uuid, Path, description = "Admin ID"),
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "Admin or user not found", body = ErrorBody)
    )
)]
pub async fn delete_user_as_admin(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((admin_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    require_admin(&state, caller).await?;

    if state.repo.find_admin_by_id(admin_id).await?.is_none() {
        return Err(ApiError::NotFound("admin"));
    }

    if state.repo.delete_user(user_id).await? {
        tracing::info!(user_id = %user_id, admin_id = %admin_id, "user deleted by admin");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("user"))
    }
}
