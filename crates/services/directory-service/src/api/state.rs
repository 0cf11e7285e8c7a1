//! Application state for dependency injection.

use std::sync::Arc;

use crate::identity::IdentityVerifier;
use crate::repository::Repositories;
use crate::service::ServiceContainer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<dyn ServiceContainer>,
    pub identity: Arc<IdentityVerifier>,
    /// Raw store access, used by the health check only
    pub repos: Repositories,
}

impl AppState {
    pub fn new(
        services: Arc<dyn ServiceContainer>,
        identity: Arc<IdentityVerifier>,
        repos: Repositories,
    ) -> Self {
        Self {
            services,
            identity,
            repos,
        }
    }
}
