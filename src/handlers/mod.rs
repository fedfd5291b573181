//! Request handlers, one module per resource.
//!
//! Every handler behind the gate takes an `AuthUser` as its first argument. Role and
//! ownership checks that need the store live in the helpers below.

use uuid::Uuid;

use crate::{
    AppState,
    auth::AuthUser,
    error::ApiError,
    models::{AccountChanges, Admin, UpdateAccountRequest, User},
};

pub mod addresses;
pub mod admins;
pub mod courses;
pub mod users;

/// require_admin
///
/// Resolves the caller to an admin record. A valid token whose subject is not an
/// admin gets 403, not 401: the caller is authenticated, just not allowed.
pub(crate) async fn require_admin(state: &AppState, caller: AuthUser) -> Result<Admin, ApiError> {
    match state.repo.find_admin_by_id(caller.id).await? {
        Some(admin) => Ok(admin),
        None => {
            tracing::warn!(subject = %caller.id, "non-admin subject on admin route");
            Err(ApiError::Forbidden)
        }
    }
}

/// require_self_or_admin
///
/// Users may only act on their own `user_id`; admins may act on anyone's.
pub(crate) async fn require_self_or_admin(
    state: &AppState,
    caller: AuthUser,
    user_id: Uuid,
) -> Result<(), ApiError> {
    if caller.id == user_id {
        return Ok(());
    }
    require_admin(state, caller).await.map(|_| ())
}

/// Loads the user named in the path, or 404.
pub(crate) async fn require_user(state: &AppState, user_id: Uuid) -> Result<User, ApiError> {
    state
        .repo
        .find_user_by_id(user_id)
        .await?
        .ok_or(ApiError::NotFound("user"))
}

pub(crate) fn require_present(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::BadRequest(format!("{field} must not be empty")));
    }
    Ok(())
}

/// account_changes
///
/// Turns an update payload into store changes. A new password is hashed here, so
/// no update path can write plaintext.
pub(crate) fn account_changes(
    state: &AppState,
    req: UpdateAccountRequest,
) -> Result<AccountChanges, ApiError> {
    if let Some(name) = &req.name {
        require_present("name", name)?;
    }
    if let Some(email) = &req.email {
        require_present("email", email)?;
    }
    let password_hash = match req.password {
        Some(password) => {
            require_present("password", &password)?;
            Some(state.auth.hash_password(&password)?)
        }
        None => None,
    };
    Ok(AccountChanges {
        name: req.name,
        email: req.email,
        password_hash,
    })
}
