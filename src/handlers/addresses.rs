use axum::{extract::State, http::StatusCode};
use uuid::Uuid;

use super::{require_present, require_self_or_admin, require_user};
use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ErrorBody},
    extract::{Json, Path},
    models::{Address, AddressRequest, UpdateAddressRequest},
};

/// list_addresses
///
/// [Authenticated Route] The addresses registered to a user.
#[utoipa::path(
    get,
    path = "/users/{user_id}/address",
    tag = "addresses",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Addresses", body = [Address]),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn list_addresses(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<Address>>, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    require_user(&state, user_id).await?;
    Ok(Json(state.repo.list_addresses(user_id).await?))
}

/// create_address
///
/// [Authenticated Route] Adds an address to a user.
#[utoipa::path(
    post,
    path = "/users/{user_id}/address",
    tag = "addresses",
    security(("bearer_auth" = [])),
    params(("user_id" = Uuid, Path, description = "User ID")),
    request_body = AddressRequest,
    responses(
        (status = 201, description = "Created", body = Address),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn create_address(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AddressRequest>,
) -> Result<(StatusCode, Json<Address>), ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;
    require_user(&state, user_id).await?;
    require_present("street", &payload.street)?;
    require_present("city", &payload.city)?;

    let address = state.repo.create_address(user_id, payload).await?;
    Ok((StatusCode::CREATED, Json(address)))
}

/// update_address
///
/// [Authenticated Route] Partial update. An address id that belongs to another
/// user is reported as not found.
#[utoipa::path(
    put,
    path = "/users/{user_id}/address/{address_id}",
    tag = "addresses",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("address_id" = Uuid, Path, description = "Address ID")
    ),
    request_body = UpdateAddressRequest,
    responses(
        (status = 200, description = "Updated", body = Address),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Address not found", body = ErrorBody)
    )
)]
pub async fn update_address(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((user_id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateAddressRequest>,
) -> Result<Json<Address>, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;

    match state.repo.update_address(user_id, address_id, payload).await? {
        Some(address) => Ok(Json(address)),
        None => Err(ApiError::NotFound("address")),
    }
}

/// delete_address
///
/// [Authenticated Route] Removes one of a user's addresses.
#[utoipa::path(
    delete,
    path = "/users/{user_id}/address/{address_id}",
    tag = "addresses",
    security(("bearer_auth" = [])),
    params(
        ("user_id" = Uuid, Path, description = "User ID"),
        ("address_id" = Uuid, Path, description = "Address ID")
    ),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the owner", body = ErrorBody),
        (status = 404, description = "Address not found", body = ErrorBody)
    )
)]
pub async fn delete_address(
    caller: AuthUser,
    State(state): State<AppState>,
    Path((user_id, address_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    require_self_or_admin(&state, caller, user_id).await?;

    if state.repo.delete_address(user_id, address_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("address"))
    }
}
