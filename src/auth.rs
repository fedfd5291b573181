use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{config::AuthConfig, error::AuthError};

/// Claims
///
/// Payload of every bearer token: the subject id plus the two timing claims.
/// Nothing else is embedded; roles are resolved from the store by the handlers
/// that need them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the id of the user or admin the token was issued to.
    pub id: Uuid,
    /// Issued At, seconds since the epoch.
    pub iat: i64,
    /// Expiration, seconds since the epoch. The token is dead from this instant on.
    pub exp: i64,
}

/// Credential
///
/// The slice of a stored account the authenticator needs to check a login.
#[derive(Debug, Clone)]
pub struct Credential {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
}

/// IssuedToken
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub subject: Uuid,
    pub expires_at: DateTime<Utc>,
    /// Lifetime in seconds, as reported to the client.
    pub expires_in: u64,
}

/// AuthUser
///
/// The typed request context the gate attaches to an admitted request. Handlers take
/// it as an argument to learn who is calling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
}

/// Authenticator
///
/// Password hashing/verification and token issuance/verification. Built once at
/// startup from `AuthConfig` and shared read-only; every method is a pure function
/// of its inputs, the secret and the clock.
pub struct Authenticator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    token_ttl_secs: u64,
    bcrypt_cost: u32,
    /// Hash checked against when a login names an unknown email, so that path pays
    /// the same bcrypt cost as a wrong password.
    dummy_hash: Option<String>,
}

/// AuthState
///
/// Shared handle to the authenticator held in the application state.
pub type AuthState = Arc<Authenticator>;

impl Authenticator {
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.jwt_secret.as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is compared by `verify_token_at` against an explicit clock, after
        // the signature has been accepted. `exp` must still be present.
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            token_ttl_secs: config.token_ttl_secs,
            bcrypt_cost: config.bcrypt_cost,
            dummy_hash: bcrypt::hash("unknown-account", config.bcrypt_cost).ok(),
        }
    }

    pub fn token_ttl_secs(&self) -> u64 {
        self.token_ttl_secs
    }

    // --- Passwords ---

    /// hash_password
    ///
    /// Salted bcrypt hash at the configured cost. Called on every path that creates
    /// or changes a credential.
    pub fn hash_password(&self, plaintext: &str) -> Result<String, AuthError> {
        bcrypt::hash(plaintext, self.bcrypt_cost).map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// verify_password
    ///
    /// True only when `plaintext` matches `stored_hash` byte for byte. Fails closed:
    /// a corrupt or foreign hash yields `false`, never an error the caller could
    /// mistake for success.
    pub fn verify_password(&self, plaintext: &str, stored_hash: &str) -> bool {
        match bcrypt::verify(plaintext, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("password verification failed closed: {}", e);
                false
            }
        }
    }

    // --- Tokens ---

    pub fn issue_token(&self, subject: Uuid) -> Result<IssuedToken, AuthError> {
        self.issue_token_at(subject, Utc::now())
    }

    /// issue_token_at
    ///
    /// Signs `{id, iat, exp}` with `exp = issued_at + TTL`.
    pub fn issue_token_at(
        &self,
        subject: Uuid,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedToken, AuthError> {
        let iat = issued_at.timestamp();
        let ttl = i64::try_from(self.token_ttl_secs)
            .map_err(|_| AuthError::TokenIssue("token TTL out of range".to_string()))?;
        let exp = iat
            .checked_add(ttl)
            .ok_or_else(|| AuthError::TokenIssue("token expiry overflows".to_string()))?;
        let expires_at = DateTime::<Utc>::from_timestamp(exp, 0)
            .ok_or_else(|| AuthError::TokenIssue("token expiry out of range".to_string()))?;

        let claims = Claims {
            id: subject,
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenIssue(e.to_string()))?;

        tracing::debug!(subject = %subject, exp, "issued bearer token");

        Ok(IssuedToken {
            token,
            subject,
            expires_at,
            expires_in: self.token_ttl_secs,
        })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_token_at(token, Utc::now())
    }

    /// verify_token_at
    ///
    /// Signature and shape first (`InvalidToken`), then expiry against `now`
    /// (`ExpiredToken`). A correctly signed token past its expiry is therefore always
    /// reported as expired, never as invalid.
    pub fn verify_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("token rejected: {:?}", e.kind());
            AuthError::InvalidToken
        })?;

        if now.timestamp() >= data.claims.exp {
            return Err(AuthError::ExpiredToken);
        }

        Ok(data.claims)
    }

    /// login
    ///
    /// Checks a plaintext password against the credential the store returned for the
    /// submitted email and issues a token for it. An absent credential still runs one
    /// bcrypt verification before failing.
    pub fn login(
        &self,
        credential: Option<Credential>,
        password: &str,
    ) -> Result<IssuedToken, AuthError> {
        let Some(credential) = credential else {
            if let Some(dummy) = &self.dummy_hash {
                let _ = self.verify_password(password, dummy);
            }
            return Err(AuthError::CredentialNotFound);
        };
        if !self.verify_password(password, &credential.password_hash) {
            return Err(AuthError::PasswordMismatch);
        }
        self.issue_token(credential.id)
    }

    // --- Authorization Gate ---

    pub fn authorize(&self, headers: &HeaderMap) -> Result<AuthUser, AuthError> {
        self.authorize_at(headers, Utc::now())
    }

    /// authorize_at
    ///
    /// The authorization gate: bearer extraction, then token verification. Holds no
    /// state between calls.
    pub fn authorize_at(
        &self,
        headers: &HeaderMap,
        now: DateTime<Utc>,
    ) -> Result<AuthUser, AuthError> {
        let token = bearer_token(headers)?;
        let claims = self.verify_token_at(token, now)?;
        Ok(AuthUser { id: claims.id })
    }
}

/// bearer_token
///
/// Pulls the token out of `Authorization: Bearer <token>`. An absent header, another
/// scheme or an empty token all count as missing.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidToken)?;

    let token = value
        .strip_prefix("Bearer ")
        .ok_or(AuthError::MissingToken)?
        .trim();

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

/// AuthUser Extractor Implementation
///
/// Handlers behind the gate middleware find the `AuthUser` it stored in the request
/// extensions. When a handler is mounted without the middleware, the extractor runs
/// the gate itself so the handler is never reachable unauthenticated.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    AuthState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(*user);
        }

        let authenticator = AuthState::from_ref(state);
        let user = authenticator.authorize(&parts.headers)?;
        parts.extensions.insert(user);
        Ok(user)
    }
}
