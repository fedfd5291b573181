use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Credential;

// --- Stored Records (Mapped to Database) ---

/// User
///
/// A user account row from the `users` table. Carries the password hash, so it is
/// never serialized; handlers answer with `UserResponse` instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    // Unique, compared exactly as stored.
    pub email: String,
    pub password_hash: String,
    // Flipped to true by a successful login.
    pub is_logged: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn credential(&self) -> Credential {
        Credential {
            id: self.id,
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Admin
///
/// An administrator row from the `admins` table.
#[derive(Debug, Clone, FromRow)]
pub struct Admin {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Admin {
    pub fn credential(&self) -> Credential {
        Credential {
            id: self.id,
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
        }
    }
}

/// Address
///
/// A postal address owned by a user (`addresses.user_id`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Address {
    pub id: Uuid,
    pub user_id: Uuid,
    pub street: String,
    pub number: i32,
    pub district: String,
    pub city: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Course
///
/// A course users can enroll in. Names are unique; enrollment is the
/// `user_courses (user_id, course_id)` link table.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Course {
    pub id: Uuid,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Store Inputs ---

/// A new user or admin. The password is already hashed by the time it gets here.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Partial account update; `None` keeps the stored value.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// --- Request Payloads (Input Schemas) ---

/// RegisterRequest
///
/// Body of `POST /users` and `POST /admins`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RegisterRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub password: String,
}

/// LoginRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginRequest {
    #[schema(example = "jane@example.com")]
    pub email: String,
    pub password: String,
}

/// UpdateAccountRequest
///
/// Partial update for users and admins. A supplied password is re-hashed before it
/// is stored.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateAccountRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// AddressRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AddressRequest {
    pub street: String,
    pub number: i32,
    pub district: String,
    pub city: String,
}

/// UpdateAddressRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateAddressRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
}

/// CourseRequest
///
/// Names the course to enroll in (created on first use) or to leave.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct CourseRequest {
    #[schema(example = "Rust for Backend Developers")]
    pub name: String,
}

/// --- Response Schemas (Output) ---

/// UserResponse
///
/// Public view of a user. Never includes the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_logged: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_logged: user.is_logged,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// AdminResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AdminResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<Admin> for AdminResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            created_at: admin.created_at,
            updated_at: admin.updated_at,
        }
    }
}

/// UserAuthResponse
///
/// Returned by user registration and login: the bearer token plus the subject it
/// was issued for.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UserAuthResponse {
    pub token: String,
    /// Seconds until the token expires.
    pub expires_in: u64,
    pub subject: UserResponse,
}

/// AdminAuthResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AdminAuthResponse {
    pub token: String,
    pub expires_in: u64,
    pub subject: AdminResponse,
}
