use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::RepoError,
    models::{
        AccountChanges, Address, AddressRequest, Admin, Course, NewAccount, UpdateAddressRequest,
        User,
    },
};

mod memory;
mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

/// Repository Trait
///
/// The credential store and every resource store behind one contract, so handlers
/// never know whether Postgres or the in-memory implementation sits underneath.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across Axum's
/// task boundaries.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn list_users(&self) -> Result<Vec<User>, RepoError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;
    // Exact, case-sensitive match on the stored email.
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;
    // `RepoError::Conflict` when the email is taken.
    async fn create_user(&self, account: NewAccount) -> Result<User, RepoError>;
    async fn update_user(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<User>, RepoError>;
    // Also drops the user's addresses and enrollments.
    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError>;
    async fn mark_user_logged_in(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Admins ---
    async fn list_admins(&self) -> Result<Vec<Admin>, RepoError>;
    async fn find_admin_by_id(&self, id: Uuid) -> Result<Option<Admin>, RepoError>;
    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, RepoError>;
    async fn create_admin(&self, account: NewAccount) -> Result<Admin, RepoError>;
    async fn update_admin(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<Admin>, RepoError>;
    async fn delete_admin(&self, id: Uuid) -> Result<bool, RepoError>;

    // --- Addresses ---
    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError>;
    async fn create_address(
        &self,
        user_id: Uuid,
        req: AddressRequest,
    ) -> Result<Address, RepoError>;
    // Owner-scoped: `None` if the address does not exist or belongs to someone else.
    async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        req: UpdateAddressRequest,
    ) -> Result<Option<Address>, RepoError>;
    async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, RepoError>;

    // --- Courses ---
    async fn list_courses(&self, user_id: Uuid) -> Result<Vec<Course>, RepoError>;
    // Finds or creates the course by name and links it to the user. Idempotent.
    async fn enroll(&self, user_id: Uuid, course_name: &str) -> Result<Course, RepoError>;
    // True if an enrollment was removed.
    async fn unenroll(&self, user_id: Uuid, course_name: &str) -> Result<bool, RepoError>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
