//! Service Container - Centralized service access.

use std::sync::Arc;

use super::{
    GroupManager, GroupService, MemberCountPolicy, MemberCounter, SessionManager, SessionService,
    UserManager, UserService,
};
use crate::repository::Repositories;

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    fn users(&self) -> Arc<dyn UserService>;

    fn groups(&self) -> Arc<dyn GroupService>;

    fn sessions(&self) -> Arc<dyn SessionService>;
}

/// Settings shared by the services.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub member_count_policy: MemberCountPolicy,
    pub bootstrap_admin_phone: String,
}

/// Concrete implementation of ServiceContainer
pub struct Services {
    user_service: Arc<dyn UserService>,
    group_service: Arc<dyn GroupService>,
    session_service: Arc<dyn SessionService>,
}

impl Services {
    pub fn new(
        user_service: Arc<dyn UserService>,
        group_service: Arc<dyn GroupService>,
        session_service: Arc<dyn SessionService>,
    ) -> Self {
        Self {
            user_service,
            group_service,
            session_service,
        }
    }

    /// Wire every service over one pair of repositories.
    pub fn from_repositories(repos: &Repositories, settings: ServiceSettings) -> Self {
        let counter = MemberCounter::new(repos.groups.clone(), settings.member_count_policy);

        Self {
            user_service: Arc::new(UserManager::new(repos.users.clone(), counter.clone())),
            group_service: Arc::new(GroupManager::new(
                repos.groups.clone(),
                repos.users.clone(),
                settings.member_count_policy,
            )),
            session_service: Arc::new(SessionManager::new(
                repos.users.clone(),
                counter,
                settings.bootstrap_admin_phone,
            )),
        }
    }
}

impl ServiceContainer for Services {
    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn groups(&self) -> Arc<dyn GroupService> {
        self.group_service.clone()
    }

    fn sessions(&self) -> Arc<dyn SessionService> {
        self.session_service.clone()
    }
}
