#![allow(dead_code)]

use axum::{body::Body, http::Response};
use course_portal::{
    AppState, Authenticator, InMemoryRepository,
    config::{AppConfig, AuthConfig, DEFAULT_TOKEN_TTL_SECS, Env},
    models::{Admin, NewAccount, User},
    repository::RepositoryState,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub const TEST_SECRET: &str = "integration-test-secret";

/// Lowest bcrypt work factor, keeps the suite fast.
pub fn test_auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: TEST_SECRET.to_string(),
        token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
        bcrypt_cost: 4,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        db_url: String::new(),
        env: Env::Local,
        bind_addr: "127.0.0.1:0".to_string(),
        auth: test_auth_config(),
        admin_seed: None,
    }
}

/// App state over an empty in-memory store.
pub fn test_state() -> AppState {
    let config = test_config();
    AppState {
        repo: Arc::new(InMemoryRepository::new()) as RepositoryState,
        auth: Arc::new(Authenticator::new(&config.auth)),
        config,
    }
}

pub async fn seed_user(state: &AppState, name: &str, email: &str, password: &str) -> User {
    let account = NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: state.auth.hash_password(password).unwrap(),
    };
    state.repo.create_user(account).await.unwrap()
}

pub async fn seed_admin(state: &AppState, name: &str, email: &str, password: &str) -> Admin {
    let account = NewAccount {
        name: name.to_string(),
        email: email.to_string(),
        password_hash: state.auth.hash_password(password).unwrap(),
    };
    state.repo.create_admin(account).await.unwrap()
}

pub fn token_for(state: &AppState, subject: uuid::Uuid) -> String {
    state.auth.issue_token(subject).unwrap().token
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

pub async fn json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
