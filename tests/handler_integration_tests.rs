mod common;

use async_trait::async_trait;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use common::{json_body, seed_admin, seed_user, test_state};
use course_portal::{
    AppState,
    auth::AuthUser,
    error::{ApiError, AuthError, ErrorBody, RepoError},
    extract::{Json, Path},
    handlers,
    models::{
        AccountChanges, Address, AddressRequest, Admin, Course, CourseRequest, LoginRequest,
        NewAccount, RegisterRequest, UpdateAccountRequest, UpdateAddressRequest, User,
    },
    repository::{Repository, RepositoryState},
};
use std::sync::Arc;
use uuid::Uuid;

fn register(name: &str, email: &str, password: &str) -> Json<RegisterRequest> {
    Json(RegisterRequest {
        name: name.to_string(),
        email: email.to_string(),
        password: password.to_string(),
    })
}

fn login(email: &str, password: &str) -> Json<LoginRequest> {
    Json(LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    })
}

fn caller(id: Uuid) -> AuthUser {
    AuthUser { id }
}

// --- Users ---

#[tokio::test]
async fn test_register_hashes_password_and_returns_token() {
    let state = test_state();

    let (status, Json(body)) = handlers::users::register_user(
        State(state.clone()),
        register("Jane", "jane@x.io", "s3cret"),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body.subject.email, "jane@x.io");
    assert_eq!(state.auth.verify_token(&body.token).unwrap().id, body.subject.id);

    let stored = state.repo.find_user_by_id(body.subject.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "s3cret");
    assert!(state.auth.verify_password("s3cret", &stored.password_hash));
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let state = test_state();
    seed_user(&state, "Jane", "jane@x.io", "s3cret").await;

    let err = handlers::users::register_user(State(state), register("J", "jane@x.io", "x"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    assert_eq!(err.into_response().status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_rejects_blank_password() {
    let state = test_state();
    let err = handlers::users::register_user(State(state), register("Jane", "jane@x.io", "  "))
        .await
        .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_marks_user_logged_in() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "s3cret").await;

    let Json(body) = handlers::users::login_user(State(state.clone()), login("jane@x.io", "s3cret"))
        .await
        .unwrap();

    assert!(body.subject.is_logged);
    assert_eq!(body.expires_in, 78_300);
    assert!(state.repo.find_user_by_id(jane.id).await.unwrap().unwrap().is_logged);
}

#[tokio::test]
async fn test_login_unknown_email_and_wrong_password_look_the_same() {
    let state = test_state();
    seed_user(&state, "Jane", "jane@x.io", "s3cret").await;

    let unknown = handlers::users::login_user(State(state.clone()), login("nobody@x.io", "s3cret"))
        .await
        .unwrap_err();
    let wrong = handlers::users::login_user(State(state), login("jane@x.io", "nope"))
        .await
        .unwrap_err();

    assert!(matches!(unknown, ApiError::Auth(AuthError::CredentialNotFound)));
    assert!(matches!(wrong, ApiError::Auth(AuthError::PasswordMismatch)));

    let unknown = unknown.into_response();
    let wrong = wrong.into_response();
    assert_eq!(unknown.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let unknown: ErrorBody = json_body(unknown).await;
    let wrong: ErrorBody = json_body(wrong).await;
    assert_eq!(unknown.error, "invalid_credentials");
    assert_eq!(unknown.error, wrong.error);
    assert_eq!(unknown.message, wrong.message);
}

#[tokio::test]
async fn test_user_login_does_not_accept_admin_credentials() {
    let state = test_state();
    seed_admin(&state, "Root", "root@x.io", "rootpw").await;

    let err = handlers::users::login_user(State(state), login("root@x.io", "rootpw"))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Auth(AuthError::CredentialNotFound)));
}

#[tokio::test]
async fn test_update_user_rehashes_password() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "old").await;

    let payload = UpdateAccountRequest {
        password: Some("new".to_string()),
        ..Default::default()
    };
    let Json(body) = handlers::users::update_user(
        caller(jane.id),
        State(state.clone()),
        Path(jane.id),
        Json(payload),
    )
    .await
    .unwrap();
    assert_eq!(body.name, "Jane");

    let stored = state.repo.find_user_by_id(jane.id).await.unwrap().unwrap();
    assert_ne!(stored.password_hash, "new");
    assert!(state.auth.verify_password("new", &stored.password_hash));
    assert!(!state.auth.verify_password("old", &stored.password_hash));
}

#[tokio::test]
async fn test_user_cannot_update_someone_else() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;
    let bob = seed_user(&state, "Bob", "bob@x.io", "pw").await;

    let err = handlers::users::update_user(
        caller(bob.id),
        State(state),
        Path(jane.id),
        Json(UpdateAccountRequest::default()),
    )
    .await
    .unwrap_err();
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_may_delete_any_user() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;
    let root = seed_admin(&state, "Root", "root@x.io", "pw").await;

    let status = handlers::users::delete_user(caller(root.id), State(state.clone()), Path(jane.id))
        .await
        .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.repo.find_user_by_id(jane.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_delete_self_twice_is_not_found() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;

    handlers::users::delete_user(caller(jane.id), State(state.clone()), Path(jane.id))
        .await
        .unwrap();
    let err = handlers::users::delete_user(caller(jane.id), State(state), Path(jane.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("user")));
}

// --- Admins ---

#[tokio::test]
async fn test_admin_routes_forbid_plain_users() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;

    let err = handlers::admins::list_admins(caller(jane.id), State(state))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));
}

#[tokio::test]
async fn test_admin_creates_admin_who_can_log_in() {
    let state = test_state();
    let root = seed_admin(&state, "Root", "root@x.io", "rootpw").await;

    let (status, Json(created)) = handlers::admins::create_admin(
        caller(root.id),
        State(state.clone()),
        register("Second", "second@x.io", "pw2"),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);

    let Json(logged_in) =
        handlers::admins::login_admin(State(state.clone()), login("second@x.io", "pw2"))
            .await
            .unwrap();
    assert_eq!(logged_in.subject.id, created.id);
    assert_eq!(state.auth.verify_token(&logged_in.token).unwrap().id, created.id);

    let Json(all) = handlers::admins::list_admins(caller(root.id), State(state))
        .await
        .unwrap();
    assert_eq!(all.len(), 2);
}

#[tokio::test]
async fn test_delete_user_as_admin_checks_both_ids() {
    let state = test_state();
    let root = seed_admin(&state, "Root", "root@x.io", "pw").await;
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;

    let missing_admin = handlers::admins::delete_user_as_admin(
        caller(root.id),
        State(state.clone()),
        Path((Uuid::new_v4(), jane.id)),
    )
    .await
    .unwrap_err();
    assert!(matches!(missing_admin, ApiError::NotFound("admin")));

    let status = handlers::admins::delete_user_as_admin(
        caller(root.id),
        State(state.clone()),
        Path((root.id, jane.id)),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let missing_user = handlers::admins::delete_user_as_admin(
        caller(root.id),
        State(state),
        Path((root.id, jane.id)),
    )
    .await
    .unwrap_err();
    assert!(matches!(missing_user, ApiError::NotFound("user")));
}

#[tokio::test]
async fn test_update_and_delete_admin() {
    let state = test_state();
    let root = seed_admin(&state, "Root", "root@x.io", "pw").await;
    let other = seed_admin(&state, "Other", "other@x.io", "pw").await;

    let payload = UpdateAccountRequest {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let Json(updated) = handlers::admins::update_admin(
        caller(root.id),
        State(state.clone()),
        Path(other.id),
        Json(payload),
    )
    .await
    .unwrap();
    assert_eq!(updated.name, "Renamed");

    let status =
        handlers::admins::delete_admin(caller(root.id), State(state.clone()), Path(other.id))
            .await
            .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err = handlers::admins::delete_admin(caller(root.id), State(state), Path(other.id))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("admin")));
}

// --- Addresses ---

#[tokio::test]
async fn test_address_lifecycle() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;

    let request = AddressRequest {
        street: "Rua A".to_string(),
        number: 7,
        district: "Centro".to_string(),
        city: "Lisbon".to_string(),
    };
    let (status, Json(created)) = handlers::addresses::create_address(
        caller(jane.id),
        State(state.clone()),
        Path(jane.id),
        Json(request),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created.user_id, jane.id);

    let change = UpdateAddressRequest {
        number: Some(9),
        ..Default::default()
    };
    let Json(updated) = handlers::addresses::update_address(
        caller(jane.id),
        State(state.clone()),
        Path((jane.id, created.id)),
        Json(change),
    )
    .await
    .unwrap();
    assert_eq!(updated.number, 9);
    assert_eq!(updated.street, "Rua A");

    let status = handlers::addresses::delete_address(
        caller(jane.id),
        State(state.clone()),
        Path((jane.id, created.id)),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let Json(left) =
        handlers::addresses::list_addresses(caller(jane.id), State(state), Path(jane.id))
            .await
            .unwrap();
    assert!(left.is_empty());
}

#[tokio::test]
async fn test_address_for_missing_user_is_not_found() {
    let state = test_state();
    let root = seed_admin(&state, "Root", "root@x.io", "pw").await;

    let err = handlers::addresses::list_addresses(
        caller(root.id),
        State(state),
        Path(Uuid::new_v4()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("user")));
}

// --- Courses ---

#[tokio::test]
async fn test_enroll_twice_then_unenroll() {
    let state = test_state();
    let jane = seed_user(&state, "Jane", "jane@x.io", "pw").await;
    let course = || {
        Json(CourseRequest {
            name: "Rust 101".to_string(),
        })
    };

    let enroll = || {
        handlers::courses::enroll_course(
            caller(jane.id),
            State(state.clone()),
            Path(jane.id),
            course(),
        )
    };
    let Json(first) = enroll().await.unwrap();
    let Json(second) = enroll().await.unwrap();
    assert_eq!(first.id, second.id);

    let Json(listed) =
        handlers::courses::list_courses(caller(jane.id), State(state.clone()), Path(jane.id))
            .await
            .unwrap();
    assert_eq!(listed.len(), 1);

    let status = handlers::courses::unenroll_course(
        caller(jane.id),
        State(state.clone()),
        Path(jane.id),
        course(),
    )
    .await
    .unwrap();
    assert_eq!(status, StatusCode::NO_CONTENT);

    let err =
        handlers::courses::unenroll_course(caller(jane.id), State(state), Path(jane.id), course())
            .await
            .unwrap_err();
    assert!(matches!(err, ApiError::NotFound("enrollment")));
}

// --- Store failures ---

/// Every call fails as if the database were gone.
struct UnavailableRepository;

fn unavailable<T>() -> Result<T, RepoError> {
    Err(RepoError::Database(sqlx::Error::PoolTimedOut))
}

#[async_trait]
impl Repository for UnavailableRepository {
    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        unavailable()
    }
    async fn find_user_by_id(&self, _id: Uuid) -> Result<Option<User>, RepoError> {
        unavailable()
    }
    async fn find_user_by_email(&self, _email: &str) -> Result<Option<User>, RepoError> {
        unavailable()
    }
    async fn create_user(&self, _account: NewAccount) -> Result<User, RepoError> {
        unavailable()
    }
    async fn update_user(&self, _id: Uuid, _c: AccountChanges) -> Result<Option<User>, RepoError> {
        unavailable()
    }
    async fn delete_user(&self, _id: Uuid) -> Result<bool, RepoError> {
        unavailable()
    }
    async fn mark_user_logged_in(&self, _id: Uuid) -> Result<bool, RepoError> {
        unavailable()
    }
    async fn list_admins(&self) -> Result<Vec<Admin>, RepoError> {
        unavailable()
    }
    async fn find_admin_by_id(&self, _id: Uuid) -> Result<Option<Admin>, RepoError> {
        unavailable()
    }
    async fn find_admin_by_email(&self, _email: &str) -> Result<Option<Admin>, RepoError> {
        unavailable()
    }
    async fn create_admin(&self, _account: NewAccount) -> Result<Admin, RepoError> {
        unavailable()
    }
    async fn update_admin(
        &self,
        _id: Uuid,
        _c: AccountChanges,
    ) -> Result<Option<Admin>, RepoError> {
        unavailable()
    }
    async fn delete_admin(&self, _id: Uuid) -> Result<bool, RepoError> {
        unavailable()
    }
    async fn list_addresses(&self, _user_id: Uuid) -> Result<Vec<Address>, RepoError> {
        unavailable()
    }
    async fn create_address(
        &self,
        _user_id: Uuid,
        _r: AddressRequest,
    ) -> Result<Address, RepoError> {
        unavailable()
    }
    async fn update_address(
        &self,
        _user_id: Uuid,
        _address_id: Uuid,
        _r: UpdateAddressRequest,
    ) -> Result<Option<Address>, RepoError> {
        unavailable()
    }
    async fn delete_address(&self, _user_id: Uuid, _address_id: Uuid) -> Result<bool, RepoError> {
        unavailable()
    }
    async fn list_courses(&self, _user_id: Uuid) -> Result<Vec<Course>, RepoError> {
        unavailable()
    }
    async fn enroll(&self, _user_id: Uuid, _name: &str) -> Result<Course, RepoError> {
        unavailable()
    }
    async fn unenroll(&self, _user_id: Uuid, _name: &str) -> Result<bool, RepoError> {
        unavailable()
    }
}

#[tokio::test]
async fn test_store_failure_is_500_without_details() {
    let state = AppState {
        repo: Arc::new(UnavailableRepository) as RepositoryState,
        ..test_state()
    };

    let err = handlers::users::list_users(caller(Uuid::new_v4()), State(state))
        .await
        .unwrap_err();
    let response = err.into_response();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: ErrorBody = json_body(response).await;
    assert_eq!(body.error, "internal_error");
    assert!(!body.message.contains("pool"));
}
