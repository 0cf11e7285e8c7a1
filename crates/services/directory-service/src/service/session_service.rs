//! Session resolution and self-registration.
//!
//! Phone ownership is proven upstream by the identity provider; this service
//! only maps a verified number to a directory profile.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use common::{AppError, AppResult};
use domain::{
    is_valid_phone, Grade, NewUserProfile, RegistrationForm, Role, UserProfile,
    DEFAULT_REGISTRATION_AGE, SELF_REGISTRATION_ACTOR,
};

use super::member_counts::MemberCounter;
use crate::repository::UserRepository;

/// A signed-in profile together with its highest-priority role.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub primary_role: Role,
}

impl AuthUser {
    pub fn new(profile: UserProfile) -> Self {
        let primary_role = profile.primary_role().unwrap_or(Role::Member);
        Self {
            profile,
            primary_role,
        }
    }
}

/// What a verified phone number maps to.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum SessionOutcome {
    Active {
        user: AuthUser,
    },
    /// A profile exists but has been deactivated
    #[serde(rename_all = "camelCase")]
    Inactive { phone_number: String },
    /// No profile yet; the caller should submit a registration form
    #[serde(rename_all = "camelCase")]
    NeedsRegistration { phone_number: String },
}

/// Session service trait for dependency injection.
#[async_trait]
pub trait SessionService: Send + Sync {
    /// Map a verified phone number to its profile without side effects
    async fn lookup_session(&self, phone_number: &str) -> AppResult<SessionOutcome>;

    /// Sign in: like `lookup_session`, but stamps the login time of an active profile
    async fn resolve_session(&self, phone_number: &str) -> AppResult<SessionOutcome>;

    /// Create the profile for a verified number that has none
    async fn complete_registration(
        &self,
        phone_number: &str,
        form: RegistrationForm,
    ) -> AppResult<AuthUser>;
}

pub struct SessionManager {
    users: Arc<dyn UserRepository>,
    counter: MemberCounter,
    bootstrap_admin_phone: String,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserRepository>,
        counter: MemberCounter,
        bootstrap_admin_phone: impl Into<String>,
    ) -> Self {
        Self {
            users,
            counter,
            bootstrap_admin_phone: bootstrap_admin_phone.into(),
        }
    }

    fn initial_roles(&self, phone_number: &str) -> Vec<Role> {
        if phone_number == self.bootstrap_admin_phone {
            vec![Role::Admin]
        } else {
            vec![Role::Member]
        }
    }
}

#[async_trait]
impl SessionService for SessionManager {
    async fn lookup_session(&self, phone_number: &str) -> AppResult<SessionOutcome> {
        let profile = self.users.find_by_phone(phone_number).await?.into_iter().next();

        Ok(match profile {
            None => SessionOutcome::NeedsRegistration {
                phone_number: phone_number.to_string(),
            },
            Some(profile) if !profile.is_active => SessionOutcome::Inactive {
                phone_number: phone_number.to_string(),
            },
            Some(profile) => SessionOutcome::Active {
                user: AuthUser::new(profile),
            },
        })
    }

    async fn resolve_session(&self, phone_number: &str) -> AppResult<SessionOutcome> {
        let outcome = self.lookup_session(phone_number).await?;

        match outcome {
            SessionOutcome::Active { mut user } => {
                let now = Utc::now();
                self.users.touch_last_login(&user.profile.id, now).await?;
                user.profile.last_login_at = Some(now);
                user.profile.updated_at = now;
                tracing::info!(user_id = %user.profile.id, "User signed in");
                Ok(SessionOutcome::Active { user })
            }
            SessionOutcome::Inactive { .. } => {
                tracing::warn!(phone_number, "Sign-in refused for inactive profile");
                Ok(outcome)
            }
            SessionOutcome::NeedsRegistration { .. } => Ok(outcome),
        }
    }

    async fn complete_registration(
        &self,
        phone_number: &str,
        form: RegistrationForm,
    ) -> AppResult<AuthUser> {
        if !is_valid_phone(phone_number) {
            return Err(AppError::validation(
                "Phone number must have the form +84xxxxxxxxx",
            ));
        }
        form.validate_form()?;

        if !self.users.find_by_phone(phone_number).await?.is_empty() {
            return Err(AppError::conflict("Profile for this phone number"));
        }

        let now = Utc::now();
        let roles = self.initial_roles(phone_number);
        let new_profile = NewUserProfile {
            phone_number: phone_number.to_string(),
            display_name: form.display_name.trim().to_string(),
            birth_year: now.year() - DEFAULT_REGISTRATION_AGE,
            club: None,
            roles: roles.clone(),
            grade: Grade::C,
            rating_points: 0,
            is_active: true,
            last_login_at: Some(now),
            created_at: now,
            created_by: SELF_REGISTRATION_ACTOR.to_string(),
        };

        let id = self.users.insert(new_profile.clone()).await?;
        tracing::info!(user_id = %id, ?roles, "Profile self-registered");

        self.counter.increment(&roles).await;
        Ok(AuthUser::new(new_profile.into_profile(id)))
    }
}
