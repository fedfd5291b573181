use axum::{
    Router,
    extract::{FromRef, Request, State},
    http::HeaderName,
    middleware::{self, Next},
    response::{IntoResponse, Response},
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod models;
pub mod repository;

// Routing segregated by access level (public, authenticated, admin).
pub mod routes;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use auth::{AuthState, AuthUser, Authenticator};
pub use config::AppConfig;
pub use repository::{InMemoryRepository, PostgresRepository, RepositoryState};

/// ApiDoc
///
/// Generated OpenAPI document for every route, served at `/api-docs/openapi.json`
/// and browsable at `/swagger-ui`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::users::list_users, handlers::users::register_user,
        handlers::users::login_user, handlers::users::update_user,
        handlers::users::delete_user,
        handlers::admins::list_admins, handlers::admins::create_admin,
        handlers::admins::login_admin, handlers::admins::update_admin,
        handlers::admins::delete_admin, handlers::admins::delete_user_as_admin,
        handlers::addresses::list_addresses, handlers::addresses::create_address,
        handlers::addresses::update_address, handlers::addresses::delete_address,
        handlers::courses::list_courses, handlers::courses::enroll_course,
        handlers::courses::unenroll_course,
    ),
    components(
        schemas(
            models::RegisterRequest, models::LoginRequest, models::UpdateAccountRequest,
            models::UserResponse, models::AdminResponse, models::UserAuthResponse,
            models::AdminAuthResponse, models::Address, models::AddressRequest,
            models::UpdateAddressRequest, models::Course, models::CourseRequest,
            error::ErrorBody,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "users", description = "User accounts and login"),
        (name = "admins", description = "Administrator accounts and moderation"),
        (name = "addresses", description = "Addresses owned by a user"),
        (name = "courses", description = "Course enrollment")
    )
)]
pub struct ApiDoc;

/// Registers the `bearer_auth` scheme referenced by the protected paths.
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single shared container handed to every handler. Cloning is cheap: the
/// store and the authenticator sit behind `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// Persistence: Postgres in production, in-memory in tests.
    pub repo: RepositoryState,
    /// Password hashing and token issuance/verification.
    pub auth: AuthState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AuthState {
    fn from_ref(app_state: &AppState) -> AuthState {
        app_state.auth.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// The gate in front of every protected route. It runs `Authenticator::authorize`
/// on the request headers. On success the resolved `AuthUser` goes into the request
/// extensions and the request continues. On failure the handler never runs and the
/// client gets a 401 with the rejection code.
async fn auth_middleware(
    State(auth): State<AuthState>,
    mut request: Request,
    next: Next,
) -> Response {
    match auth.authorize(request.headers()) {
        Ok(user) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(reason = e.code(), "request rejected at auth gate");
            e.into_response()
        }
    }
}

/// create_router
///
/// Assembles the route tables, applies the gate to everything but the public
/// routes, and wraps the whole thing in the request-id, tracing and CORS layers.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let gate = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes().route_layer(gate.clone()))
        // Admin routes pass the same gate; the admin role itself is checked in the
        // handlers against the store.
        .merge(admin::admin_routes().route_layer(gate))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Opens one span per request carrying method, URI and the `x-request-id`, so every
/// log line of a request can be correlated.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
