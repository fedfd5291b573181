use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    auth::Authenticator,
    config::AdminSeed,
    error::{ApiError, RepoError},
    models::NewAccount,
    repository::Repository,
};

/// Tables created at startup when missing. This is the whole schema; there is no
/// migration history to replay.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        is_logged BOOLEAN NOT NULL DEFAULT FALSE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS admins (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS addresses (
        id UUID PRIMARY KEY,
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        street TEXT NOT NULL,
        number INTEGER NOT NULL,
        district TEXT NOT NULL,
        city TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS courses (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL UNIQUE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS user_courses (
        user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
        course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        PRIMARY KEY (user_id, course_id)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS addresses_user_id_idx ON addresses (user_id)",
];

/// Opens the Postgres connection pool.
pub async fn connect(db_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new().max_connections(5).connect(db_url).await
}

/// ensure_schema
///
/// Creates any missing table. Safe to run on every boot.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for &statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    tracing::info!("database schema ready");
    Ok(())
}

/// seed_admin
///
/// Creates the configured initial administrator unless an admin with that email
/// already exists. Returns whether a record was written.
pub async fn seed_admin(
    repo: &dyn Repository,
    authenticator: &Authenticator,
    seed: &AdminSeed,
) -> Result<bool, ApiError> {
    if repo.find_admin_by_email(&seed.email).await?.is_some() {
        tracing::debug!(email = %seed.email, "seed admin already present");
        return Ok(false);
    }

    let account = NewAccount {
        name: seed.name.clone(),
        email: seed.email.clone(),
        password_hash: authenticator.hash_password(&seed.password)?,
    };

    match repo.create_admin(account).await {
        Ok(admin) => {
            tracing::info!(admin_id = %admin.id, "seeded initial admin");
            Ok(true)
        }
        // Lost a race with another instance seeding the same email.
        Err(RepoError::Conflict(_)) => Ok(false),
        Err(e) => Err(e.into()),
    }
}
