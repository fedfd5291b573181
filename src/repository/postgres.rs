use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::RepoError,
    models::{
        AccountChanges, Address, AddressRequest, Admin, Course, NewAccount, UpdateAddressRequest,
        User,
    },
};

const USER_COLUMNS: &str = "id, name, email, password_hash, is_logged, created_at, updated_at";
const ADMIN_COLUMNS: &str = "id, name, email, password_hash, created_at, updated_at";
const ADDRESS_COLUMNS: &str = "id, user_id, street, number, district, city, created_at, updated_at";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Queries are checked at
/// runtime (`query_as::<_, T>`), so building the crate needs no live database.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Turns unique and foreign-key violations into `RepoError::Conflict`. A write that
/// races a delete of the row it references lands here.
fn write_error(e: sqlx::Error, what: &str) -> RepoError {
    let (unique, dangling) = match e.as_database_error() {
        Some(db) => (db.is_unique_violation(), db.is_foreign_key_violation()),
        None => (false, false),
    };
    if unique {
        RepoError::Conflict(format!("{what} already exists"))
    } else if dangling {
        RepoError::Conflict(format!("{what} references a missing record"))
    } else {
        tracing::error!("{} write error: {:?}", what, e);
        RepoError::Database(e)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, User>(&query).fetch_all(&self.pool).await?)
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let query = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_user
    ///
    /// New accounts start logged out.
    async fn create_user(&self, account: NewAccount) -> Result<User, RepoError> {
        let query = format!(
            "INSERT INTO users (id, name, email, password_hash, is_logged, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, false, NOW(), NOW()) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(Uuid::new_v4())
            .bind(account.name)
            .bind(account.email)
            .bind(account.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "user"))
    }

    /// update_user
    ///
    /// `COALESCE` keeps every column whose change is `None`.
    async fn update_user(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<User>, RepoError> {
        let query = format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, "user"))
    }

    /// delete_user
    ///
    /// Addresses and enrollments go with it through `ON DELETE CASCADE`.
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn mark_user_logged_in(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("UPDATE users SET is_logged = true, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- ADMINS ---

    async fn list_admins(&self) -> Result<Vec<Admin>, RepoError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, Admin>(&query).fetch_all(&self.pool).await?)
    }

    async fn find_admin_by_id(&self, id: Uuid) -> Result<Option<Admin>, RepoError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE id = $1");
        Ok(sqlx::query_as::<_, Admin>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, RepoError> {
        let query = format!("SELECT {ADMIN_COLUMNS} FROM admins WHERE email = $1");
        Ok(sqlx::query_as::<_, Admin>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_admin(&self, account: NewAccount) -> Result<Admin, RepoError> {
        let query = format!(
            "INSERT INTO admins (id, name, email, password_hash, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, NOW(), NOW()) RETURNING {ADMIN_COLUMNS}"
        );
        sqlx::query_as::<_, Admin>(&query)
            .bind(Uuid::new_v4())
            .bind(account.name)
            .bind(account.email)
            .bind(account.password_hash)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "admin"))
    }

    async fn update_admin(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<Admin>, RepoError> {
        let query = format!(
            r#"
            UPDATE admins
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {ADMIN_COLUMNS}
            "#
        );
        sqlx::query_as::<_, Admin>(&query)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| write_error(e, "admin"))
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM admins WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- ADDRESSES ---

    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError> {
        let query = format!(
            "SELECT {ADDRESS_COLUMNS} FROM addresses WHERE user_id = $1 ORDER BY created_at ASC"
        );
        Ok(sqlx::query_as::<_, Address>(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn create_address(
        &self,
        user_id: Uuid,
        req: AddressRequest,
    ) -> Result<Address, RepoError> {
        let query = format!(
            "INSERT INTO addresses \
             (id, user_id, street, number, district, city, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW()) RETURNING {ADDRESS_COLUMNS}"
        );
        sqlx::query_as::<_, Address>(&query)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(req.street)
            .bind(req.number)
            .bind(req.district)
            .bind(req.city)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| write_error(e, "address"))
    }

    /// update_address
    ///
    /// The `user_id` predicate is the ownership check: another user's address id
    /// matches zero rows.
    async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        req: UpdateAddressRequest,
    ) -> Result<Option<Address>, RepoError> {
        let query = format!(
            r#"
            UPDATE addresses
            SET street = COALESCE($3, street),
                number = COALESCE($4, number),
                district = COALESCE($5, district),
                city = COALESCE($6, city),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {ADDRESS_COLUMNS}
            "#
        );
        Ok(sqlx::query_as::<_, Address>(&query)
            .bind(address_id)
            .bind(user_id)
            .bind(req.street)
            .bind(req.number)
            .bind(req.district)
            .bind(req.city)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, RepoError> {
        let res = sqlx::query("DELETE FROM addresses WHERE id = $1 AND user_id = $2")
            .bind(address_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    // --- COURSES ---

    async fn list_courses(&self, user_id: Uuid) -> Result<Vec<Course>, RepoError> {
        Ok(sqlx::query_as::<_, Course>(
            r#"
            SELECT c.id, c.name, c.created_at
            FROM courses c
            JOIN user_courses uc ON uc.course_id = c.id
            WHERE uc.user_id = $1
            ORDER BY c.name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?)
    }

    /// enroll
    ///
    /// Find-or-create the course, then link it, in one transaction. The no-op
    /// `DO UPDATE` makes `RETURNING` yield the existing row on a name conflict, and
    /// `DO NOTHING` on the link makes a repeated enrollment harmless.
    async fn enroll(&self, user_id: Uuid, course_name: &str) -> Result<Course, RepoError> {
        let mut tx = self.pool.begin().await?;

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (id, name, created_at) VALUES ($1, $2, NOW())
            ON CONFLICT (name) DO UPDATE SET name = EXCLUDED.name
            RETURNING id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(course_name)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO user_courses (user_id, course_id, created_at) VALUES ($1, $2, NOW()) \
             ON CONFLICT DO NOTHING",
        )
        .bind(user_id)
        .bind(course.id)
        .execute(&mut *tx)
        .await
        .map_err(|e| write_error(e, "enrollment"))?;

        tx.commit().await?;
        Ok(course)
    }

    async fn unenroll(&self, user_id: Uuid, course_name: &str) -> Result<bool, RepoError> {
        let res = sqlx::query(
            r#"
            DELETE FROM user_courses uc
            USING courses c
            WHERE uc.course_id = c.id AND uc.user_id = $1 AND c.name = $2
            "#,
        )
        .bind(user_id)
        .bind(course_name)
        .execute(&self.pool)
        .await?;
        Ok(res.rows_affected() > 0)
    }
}
