use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Repository;
use crate::{
    error::RepoError,
    models::{
        AccountChanges, Address, AddressRequest, Admin, Course, NewAccount, UpdateAddressRequest,
        User,
    },
};

/// InMemoryRepository
///
/// A `Repository` held entirely in process memory. Enforces the same constraints as
/// the Postgres schema (unique emails, unique course names, owner-scoped address
/// writes, cascading user deletes). Used by the test suite and handy for running the
/// API without a database.
#[derive(Default)]
pub struct InMemoryRepository {
    inner: RwLock<Tables>,
}

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    admins: HashMap<Uuid, Admin>,
    addresses: HashMap<Uuid, Address>,
    courses: HashMap<Uuid, Course>,
    // (user_id, course_id)
    enrollments: BTreeSet<(Uuid, Uuid)>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn sorted_by_creation<T: Clone>(
    rows: impl Iterator<Item = T>,
    key: impl Fn(&T) -> (i64, Uuid),
) -> Vec<T> {
    let mut rows: Vec<T> = rows.collect();
    rows.sort_by_key(|row| key(row));
    rows
}

#[async_trait]
impl Repository for InMemoryRepository {
    // --- Users ---

    async fn list_users(&self) -> Result<Vec<User>, RepoError> {
        let tables = self.inner.read().await;
        Ok(sorted_by_creation(tables.users.values().cloned(), |u| {
            (u.created_at.timestamp_micros(), u.id)
        }))
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let tables = self.inner.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, account: NewAccount) -> Result<User, RepoError> {
        let mut tables = self.inner.write().await;
        if tables.users.values().any(|u| u.email == account.email) {
            return Err(RepoError::Conflict("user already exists".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            is_logged: false,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update_user(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<User>, RepoError> {
        let mut tables = self.inner.write().await;
        if let Some(email) = &changes.email {
            if tables.users.values().any(|u| u.id != id && &u.email == email) {
                return Err(RepoError::Conflict("user already exists".to_string()));
            }
        }
        let Some(user) = tables.users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            user.name = name;
        }
        if let Some(email) = changes.email {
            user.email = email;
        }
        if let Some(hash) = changes.password_hash {
            user.password_hash = hash;
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.inner.write().await;
        if tables.users.remove(&id).is_none() {
            return Ok(false);
        }
        tables.addresses.retain(|_, a| a.user_id != id);
        tables.enrollments.retain(|(user_id, _)| *user_id != id);
        Ok(true)
    }

    async fn mark_user_logged_in(&self, id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.inner.write().await;
        match tables.users.get_mut(&id) {
            Some(user) => {
                user.is_logged = true;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    // --- Admins ---

    async fn list_admins(&self) -> Result<Vec<Admin>, RepoError> {
        let tables = self.inner.read().await;
        Ok(sorted_by_creation(tables.admins.values().cloned(), |a| {
            (a.created_at.timestamp_micros(), a.id)
        }))
    }

    async fn find_admin_by_id(&self, id: Uuid) -> Result<Option<Admin>, RepoError> {
        Ok(self.inner.read().await.admins.get(&id).cloned())
    }

    async fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, RepoError> {
        let tables = self.inner.read().await;
        Ok(tables.admins.values().find(|a| a.email == email).cloned())
    }

    async fn create_admin(&self, account: NewAccount) -> Result<Admin, RepoError> {
        let mut tables = self.inner.write().await;
        if tables.admins.values().any(|a| a.email == account.email) {
            return Err(RepoError::Conflict("admin already exists".to_string()));
        }
        let now = Utc::now();
        let admin = Admin {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
            created_at: now,
            updated_at: now,
        };
        tables.admins.insert(admin.id, admin.clone());
        Ok(admin)
    }

    async fn update_admin(
        &self,
        id: Uuid,
        changes: AccountChanges,
    ) -> Result<Option<Admin>, RepoError> {
        let mut tables = self.inner.write().await;
        if let Some(email) = &changes.email {
            if tables.admins.values().any(|a| a.id != id && &a.email == email) {
                return Err(RepoError::Conflict("admin already exists".to_string()));
            }
        }
        let Some(admin) = tables.admins.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(name) = changes.name {
            admin.name = name;
        }
        if let Some(email) = changes.email {
            admin.email = email;
        }
        if let Some(hash) = changes.password_hash {
            admin.password_hash = hash;
        }
        admin.updated_at = Utc::now();
        Ok(Some(admin.clone()))
    }

    async fn delete_admin(&self, id: Uuid) -> Result<bool, RepoError> {
        Ok(self.inner.write().await.admins.remove(&id).is_some())
    }

    // --- Addresses ---

    async fn list_addresses(&self, user_id: Uuid) -> Result<Vec<Address>, RepoError> {
        let tables = self.inner.read().await;
        Ok(sorted_by_creation(
            tables.addresses.values().filter(|a| a.user_id == user_id).cloned(),
            |a| (a.created_at.timestamp_micros(), a.id),
        ))
    }

    async fn create_address(
        &self,
        user_id: Uuid,
        req: AddressRequest,
    ) -> Result<Address, RepoError> {
        let mut tables = self.inner.write().await;
        if !tables.users.contains_key(&user_id) {
            // Mirrors the foreign key on addresses.user_id.
            return Err(RepoError::Conflict("address owner does not exist".to_string()));
        }
        let now = Utc::now();
        let address = Address {
            id: Uuid::new_v4(),
            user_id,
            street: req.street,
            number: req.number,
            district: req.district,
            city: req.city,
            created_at: now,
            updated_at: now,
        };
        tables.addresses.insert(address.id, address.clone());
        Ok(address)
    }

    async fn update_address(
        &self,
        user_id: Uuid,
        address_id: Uuid,
        req: UpdateAddressRequest,
    ) -> Result<Option<Address>, RepoError> {
        let mut tables = self.inner.write().await;
        let Some(address) = tables
            .addresses
            .get_mut(&address_id)
            .filter(|a| a.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(street) = req.street {
            address.street = street;
        }
        if let Some(number) = req.number {
            address.number = number;
        }
        if let Some(district) = req.district {
            address.district = district;
        }
        if let Some(city) = req.city {
            address.city = city;
        }
        address.updated_at = Utc::now();
        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, user_id: Uuid, address_id: Uuid) -> Result<bool, RepoError> {
        let mut tables = self.inner.write().await;
        let owned = tables
            .addresses
            .get(&address_id)
            .is_some_and(|a| a.user_id == user_id);
        if owned {
            tables.addresses.remove(&address_id);
        }
        Ok(owned)
    }

    // --- Courses ---

    async fn list_courses(&self, user_id: Uuid) -> Result<Vec<Course>, RepoError> {
        let tables = self.inner.read().await;
        let mut courses: Vec<Course> = tables
            .enrollments
            .iter()
            .filter(|(u, _)| *u == user_id)
            .filter_map(|(_, course_id)| tables.courses.get(course_id).cloned())
            .collect();
        courses.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(courses)
    }

    async fn enroll(&self, user_id: Uuid, course_name: &str) -> Result<Course, RepoError> {
        let mut tables = self.inner.write().await;
        if !tables.users.contains_key(&user_id) {
            return Err(RepoError::Conflict("enrolling user does not exist".to_string()));
        }
        let existing = tables.courses.values().find(|c| c.name == course_name).cloned();
        let course = match existing {
            Some(course) => course,
            None => {
                let course = Course {
                    id: Uuid::new_v4(),
                    name: course_name.to_string(),
                    created_at: Utc::now(),
                };
                tables.courses.insert(course.id, course.clone());
                course
            }
        };
        tables.enrollments.insert((user_id, course.id));
        Ok(course)
    }

    async fn unenroll(&self, user_id: Uuid, course_name: &str) -> Result<bool, RepoError> {
        let mut tables = self.inner.write().await;
        let Some(course_id) = tables
            .courses
            .values()
            .find(|c| c.name == course_name)
            .map(|c| c.id)
        else {
            return Ok(false);
        };
        Ok(tables.enrollments.remove(&(user_id, course_id)))
    }
}
