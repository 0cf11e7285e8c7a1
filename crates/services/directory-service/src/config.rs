//! Directory service configuration.

use std::env;
use std::str::FromStr;

use common::{AppError, DatabaseConfig, IdentityConfig, ServiceConfig};

use crate::service::MemberCountPolicy;

/// Phone number granted the `admin` role at self-registration
pub const DEFAULT_BOOTSTRAP_ADMIN_PHONE: &str = "+84333141692";

/// Secret used for identity tokens when none is configured (debug builds only)
const DEV_TOKEN_SECRET: &str = "dev-identity-secret-do-not-use-in-production";

/// Where profiles and groups are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

impl FromStr for StoreBackend {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            other => Err(AppError::validation(format!(
                "Unknown store backend '{}'",
                other
            ))),
        }
    }
}

/// Directory service configuration.
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    pub service: ServiceConfig,
    pub database: DatabaseConfig,
    pub identity: IdentityConfig,
    pub store_backend: StoreBackend,
    /// Self-registration with this number yields an admin profile
    pub bootstrap_admin_phone: String,
    pub member_count_policy: MemberCountPolicy,
}

impl DirectoryConfig {
    /// Load configuration from environment variables.
    ///
    /// Unparseable values fall back to their defaults with a warning.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let service = ServiceConfig {
            service_name: defaults.service.service_name.clone(),
            host: env::var("DIRECTORY_HOST").unwrap_or(defaults.service.host),
            port: parse_var("DIRECTORY_PORT").unwrap_or(defaults.service.port),
        };

        let database = DatabaseConfig {
            url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or(defaults.database.max_connections),
            min_connections: parse_var("DATABASE_MIN_CONNECTIONS")
                .unwrap_or(defaults.database.min_connections),
        };

        let token_secret = env::var("IDENTITY_TOKEN_SECRET").unwrap_or_else(|_| {
            if cfg!(debug_assertions) {
                tracing::warn!("IDENTITY_TOKEN_SECRET not set, using development secret");
                DEV_TOKEN_SECRET.to_string()
            } else {
                String::new()
            }
        });
        let identity = IdentityConfig {
            token_secret,
            leeway_seconds: parse_var("IDENTITY_TOKEN_LEEWAY")
                .unwrap_or(defaults.identity.leeway_seconds),
        };

        Self {
            service,
            database,
            identity,
            store_backend: parse_var("STORE_BACKEND").unwrap_or(defaults.store_backend),
            bootstrap_admin_phone: env::var("BOOTSTRAP_ADMIN_PHONE")
                .map(|phone| domain::normalize_phone(&phone))
                .unwrap_or(defaults.bootstrap_admin_phone),
            member_count_policy: parse_var("MEMBER_COUNT_POLICY")
                .unwrap_or(defaults.member_count_policy),
        }
    }

    /// Reject settings the server cannot run with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.identity.token_secret.is_empty() {
            return Err(AppError::internal("IDENTITY_TOKEN_SECRET must be set"));
        }
        if !domain::is_valid_phone(&self.bootstrap_admin_phone) {
            return Err(AppError::validation(format!(
                "BOOTSTRAP_ADMIN_PHONE '{}' is not a valid phone number",
                self.bootstrap_admin_phone
            )));
        }
        Ok(())
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            service: ServiceConfig::default(),
            database: DatabaseConfig::default(),
            identity: IdentityConfig::default(),
            store_backend: StoreBackend::default(),
            bootstrap_admin_phone: DEFAULT_BOOTSTRAP_ADMIN_PHONE.to_string(),
            member_count_policy: MemberCountPolicy::default(),
        }
    }
}

fn parse_var<T>(key: &str) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("Ignoring {}={}: {}", key, raw, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_backend_parses() {
        assert_eq!("memory".parse::<StoreBackend>().unwrap(), StoreBackend::Memory);
        assert_eq!(" Postgres ".parse::<StoreBackend>().unwrap(), StoreBackend::Postgres);
        assert!("firestore".parse::<StoreBackend>().is_err());
    }

    #[test]
    fn empty_secret_is_rejected() {
        let config = DirectoryConfig::default();
        assert!(config.validate().is_err());

        let mut config = DirectoryConfig::default();
        config.identity.token_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }
}
