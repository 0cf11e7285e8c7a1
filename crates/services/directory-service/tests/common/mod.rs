//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use directory_service_lib::api::{create_router, AppState};
use directory_service_lib::config::DirectoryConfig;
use directory_service_lib::identity::IdentityVerifier;
use directory_service_lib::repository::Repositories;
use directory_service_lib::service::{MemberCountPolicy, ServiceSettings, Services};
use domain::{Grade, GroupFormData, Role, UserFormData};

pub const ADMIN_PHONE: &str = "+84333141692";
pub const TOKEN_SECRET: &str = "integration-test-secret";

/// Services over a fresh in-memory store.
pub fn memory_services(policy: MemberCountPolicy) -> (Repositories, Services) {
    let repos = Repositories::memory();
    let services = Services::from_repositories(
        &repos,
        ServiceSettings {
            member_count_policy: policy,
            bootstrap_admin_phone: ADMIN_PHONE.to_string(),
        },
    );
    (repos, services)
}

pub fn test_config() -> DirectoryConfig {
    let mut config = DirectoryConfig::default();
    config.identity.token_secret = TOKEN_SECRET.to_string();
    config.identity.leeway_seconds = 0;
    config
}

/// Router, store and token signer for HTTP tests.
pub struct TestApp {
    pub repos: Repositories,
    pub services: Arc<Services>,
    pub verifier: Arc<IdentityVerifier>,
    pub router: axum::Router,
}

impl TestApp {
    pub fn new() -> Self {
        let config = test_config();
        let (repos, services) = memory_services(MemberCountPolicy::PerRole);
        let services = Arc::new(services);
        let verifier = Arc::new(IdentityVerifier::new(&config.identity));
        let router = create_router(AppState::new(
            services.clone(),
            verifier.clone(),
            repos.clone(),
        ));

        Self {
            repos,
            services,
            verifier,
            router,
        }
    }

    pub fn token_for(&self, phone: &str) -> String {
        self.verifier
            .issue("test-subject", phone, chrono::Duration::minutes(5))
            .unwrap()
    }
}

pub fn user_form(phone: &str, name: &str, roles: Vec<Role>) -> UserFormData {
    UserFormData {
        phone_number: phone.to_string(),
        display_name: name.to_string(),
        birth_year: 1990,
        club: None,
        roles,
        grade: Grade::C,
        is_active: true,
    }
}

pub fn group_form(name: &str, roles: Vec<Role>) -> GroupFormData {
    GroupFormData {
        name: name.to_string(),
        description: String::new(),
        roles,
        color: None,
    }
}
