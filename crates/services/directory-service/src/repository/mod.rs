//! Repository layer for data access.
//!
//! Two backends implement the same traits: [`UserStore`]/[`GroupStore`] on
//! PostgreSQL and [`MemoryStore`] for tests and local runs.

pub mod entities;
mod group_repository;
mod memory_store;
mod query;
mod user_repository;

use std::sync::Arc;

use sea_orm::DatabaseConnection;

pub use group_repository::{GroupRepository, GroupStore, MemberDelta};
pub use memory_store::MemoryStore;
pub use query::UserQuery;
pub use user_repository::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use group_repository::MockGroupRepository;
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;

/// Both collections behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
}

impl Repositories {
    pub fn postgres(db: DatabaseConnection) -> Self {
        Self {
            users: Arc::new(UserStore::new(db.clone())),
            groups: Arc::new(GroupStore::new(db)),
        }
    }

    /// Fresh, empty in-memory collections.
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            groups: store,
        }
    }
}
