use course_portal::{
    AppState, Authenticator, PostgresRepository,
    config::{AppConfig, Env},
    create_router, database,
    repository::RepositoryState,
};
use std::{error::Error, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Boot order: configuration, logging, database and schema, authenticator and admin
/// seed, then the HTTP server. Any failure before the listener is up aborts startup.
#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // 1. Configuration (fail fast: no signing secret, no server)
    dotenv::dotenv().ok();
    let config = AppConfig::load()?;

    // 2. Logging. RUST_LOG wins over the defaults below.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "course_portal=debug,tower_http=info,axum=trace".into());

    match config.env {
        Env::Local => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    tracing::debug!(auth = ?config.auth, "auth settings");

    // 3. Database
    let pool = database::connect(&config.db_url).await.inspect_err(|e| {
        tracing::error!("failed to connect to Postgres, check DATABASE_URL: {}", e)
    })?;
    database::ensure_schema(&pool).await?;

    let repo = Arc::new(PostgresRepository::new(pool)) as RepositoryState;

    // 4. Authenticator and initial admin
    let auth = Arc::new(Authenticator::new(&config.auth));

    match &config.admin_seed {
        Some(seed) => {
            database::seed_admin(&*repo, &auth, seed).await?;
        }
        None => tracing::debug!("no admin seed configured"),
    }

    // 5. Router and server
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState { repo, auth, config };
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    axum::serve(listener, app).await?;
    Ok(())
}
