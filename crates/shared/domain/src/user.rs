//! User profile entity and related types.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::{
    MAX_REGISTRATION_NAME_LENGTH, MIN_BIRTH_YEAR, MIN_DISPLAY_NAME_LENGTH, MIN_MEMBER_AGE,
};
use crate::error::{DomainError, DomainResult};
use crate::phone::PHONE_REGEX;
use crate::role::{primary_role, Grade, Role};

/// A person with access to the club system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub phone_number: String,
    pub display_name: String,
    pub birth_year: i32,
    pub club: Option<String>,
    pub roles: Vec<Role>,
    pub grade: Grade,
    pub rating_points: i32,
    /// Push notification tokens registered by the user's devices
    pub device_tokens: Vec<String>,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_by: Option<String>,
    /// Soft delete timestamp (None = live, Some = cleaned)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl UserProfile {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.has_role(Role::Admin)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn primary_role(&self) -> Option<Role> {
        primary_role(&self.roles)
    }
}

/// A profile as seen by a specific viewer.
///
/// The protection flags are derived on every read and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub can_delete: bool,
    pub can_deactivate: bool,
}

impl ManagedUser {
    /// Annotate `profile` for `viewer_id`.
    ///
    /// Nobody may delete their own account; an admin may not deactivate
    /// their own account.
    pub fn for_viewer(profile: UserProfile, viewer_id: Option<&str>) -> Self {
        let is_self = viewer_id == Some(profile.id.as_str());
        Self {
            can_delete: !is_self,
            can_deactivate: !is_self || !profile.is_admin(),
            profile,
        }
    }
}

/// Admin-facing create/edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct UserFormData {
    #[validate(regex(
        path = *PHONE_REGEX,
        message = "Phone number must have the form +84xxxxxxxxx"
    ))]
    pub phone_number: String,
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
    pub birth_year: i32,
    #[serde(default)]
    pub club: Option<String>,
    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<Role>,
    pub grade: Grade,
    pub is_active: bool,
}

impl UserFormData {
    /// Run every field rule; the first failure is reported.
    pub fn validate_form(&self) -> DomainResult<()> {
        self.validate()?;

        let max_year = Utc::now().year() - MIN_MEMBER_AGE;
        if self.birth_year < MIN_BIRTH_YEAR || self.birth_year > max_year {
            return Err(DomainError::validation(format!(
                "Birth year must be between {} and {}",
                MIN_BIRTH_YEAR, max_year
            )));
        }

        Ok(())
    }

    /// Trim text fields, map a blank club to none and drop duplicate roles.
    pub fn normalized(mut self) -> Self {
        self.display_name = self.display_name.trim().to_string();
        self.club = self
            .club
            .map(|club| club.trim().to_string())
            .filter(|club| !club.is_empty());
        self.roles = dedup_roles(self.roles);
        self
    }
}

/// Name entered after the first successful phone verification.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegistrationForm {
    #[validate(custom(function = "validate_registration_name"))]
    pub display_name: String,
}

impl RegistrationForm {
    pub fn validate_form(&self) -> DomainResult<()> {
        self.validate()?;
        Ok(())
    }
}

/// Fields of a profile about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUserProfile {
    pub phone_number: String,
    pub display_name: String,
    pub birth_year: i32,
    pub club: Option<String>,
    pub roles: Vec<Role>,
    pub grade: Grade,
    pub rating_points: i32,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewUserProfile {
    /// Build an admin-created profile from a validated, normalized form.
    pub fn from_form(form: UserFormData, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            phone_number: form.phone_number,
            display_name: form.display_name,
            birth_year: form.birth_year,
            club: form.club,
            roles: form.roles,
            grade: form.grade,
            rating_points: 0,
            is_active: form.is_active,
            last_login_at: None,
            created_at: now,
            created_by: created_by.to_string(),
        }
    }

    /// Attach a store-assigned id.
    pub fn into_profile(self, id: String) -> UserProfile {
        UserProfile {
            id,
            phone_number: self.phone_number,
            display_name: self.display_name,
            birth_year: self.birth_year,
            club: self.club,
            roles: self.roles,
            grade: self.grade,
            rating_points: self.rating_points,
            device_tokens: Vec::new(),
            is_active: self.is_active,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.created_at,
            created_by: self.created_by,
            updated_by: None,
            deleted_at: None,
        }
    }
}

/// Full overwrite of the editable profile fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileChanges {
    pub phone_number: String,
    pub display_name: String,
    pub birth_year: i32,
    pub club: Option<String>,
    pub roles: Vec<Role>,
    pub grade: Grade,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub updated_by: String,
}

impl ProfileChanges {
    pub fn from_form(form: UserFormData, updated_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            phone_number: form.phone_number,
            display_name: form.display_name,
            birth_year: form.birth_year,
            club: form.club,
            roles: form.roles,
            grade: form.grade,
            is_active: form.is_active,
            updated_at: now,
            updated_by: updated_by.to_string(),
        }
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        profile.phone_number = self.phone_number.clone();
        profile.display_name = self.display_name.clone();
        profile.birth_year = self.birth_year;
        profile.club = self.club.clone();
        profile.roles = self.roles.clone();
        profile.grade = self.grade;
        profile.is_active = self.is_active;
        profile.updated_at = self.updated_at;
        profile.updated_by = Some(self.updated_by.clone());
    }
}

/// Head-count summary over every live profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserStatistics {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub admins: u64,
}

impl UserStatistics {
    pub fn from_profiles<'a>(profiles: impl IntoIterator<Item = &'a UserProfile>) -> Self {
        profiles
            .into_iter()
            .fold(UserStatistics::default(), |mut stats, profile| {
                stats.total += 1;
                if profile.is_active {
                    stats.active += 1;
                } else {
                    stats.inactive += 1;
                }
                if profile.is_admin() {
                    stats.admins += 1;
                }
                stats
            })
    }
}

/// Keep the first occurrence of every role.
pub fn dedup_roles(roles: Vec<Role>) -> Vec<Role> {
    let mut seen = Vec::with_capacity(roles.len());
    for role in roles {
        if !seen.contains(&role) {
            seen.push(role);
        }
    }
    seen
}

fn validate_display_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_DISPLAY_NAME_LENGTH {
        let mut error = ValidationError::new("display_name");
        error.message = Some(
            format!(
                "Display name must have at least {} characters",
                MIN_DISPLAY_NAME_LENGTH
            )
            .into(),
        );
        return Err(error);
    }
    Ok(())
}

fn validate_registration_name(name: &str) -> Result<(), ValidationError> {
    validate_display_name(name)?;
    if name.trim().chars().count() > MAX_REGISTRATION_NAME_LENGTH {
        let mut error = ValidationError::new("display_name");
        error.message = Some(
            format!(
                "Display name must have at most {} characters",
                MAX_REGISTRATION_NAME_LENGTH
            )
            .into(),
        );
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> UserFormData {
        UserFormData {
            phone_number: "+84912345678".to_string(),
            display_name: "  Nguyen Van An ".to_string(),
            birth_year: 1990,
            club: Some("   ".to_string()),
            roles: vec![Role::Player, Role::Member, Role::Player],
            grade: Grade::B,
            is_active: true,
        }
    }

    fn profile(id: &str, roles: Vec<Role>) -> UserProfile {
        NewUserProfile {
            roles,
            ..NewUserProfile::from_form(form().normalized(), "admin", Utc::now())
        }
        .into_profile(id.to_string())
    }

    #[test]
    fn valid_form_passes() {
        assert!(form().validate_form().is_ok());
    }

    #[test]
    fn malformed_phone_is_rejected() {
        let mut f = form();
        f.phone_number = "0912345678".to_string();
        assert!(matches!(f.validate_form(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn short_name_is_rejected_after_trim() {
        let mut f = form();
        f.display_name = "  A  ".to_string();
        let err = f.validate_form().unwrap_err();
        assert_eq!(
            err,
            DomainError::validation("Display name must have at least 2 characters")
        );
    }

    #[test]
    fn empty_roles_are_rejected() {
        let mut f = form();
        f.roles.clear();
        assert_eq!(
            f.validate_form().unwrap_err(),
            DomainError::validation("At least one role is required")
        );
    }

    #[test]
    fn implausible_birth_year_is_rejected() {
        let mut f = form();
        f.birth_year = 1900;
        assert!(f.validate_form().is_err());
        f.birth_year = Utc::now().year();
        assert!(f.validate_form().is_err());
    }

    #[test]
    fn normalized_trims_and_dedups() {
        let f = form().normalized();
        assert_eq!(f.display_name, "Nguyen Van An");
        assert_eq!(f.club, None);
        assert_eq!(f.roles, vec![Role::Player, Role::Member]);
    }

    #[test]
    fn viewer_cannot_delete_self() {
        let managed = ManagedUser::for_viewer(profile("u1", vec![Role::Member]), Some("u1"));
        assert!(!managed.can_delete);
        assert!(managed.can_deactivate);

        let other = ManagedUser::for_viewer(profile("u2", vec![Role::Admin]), Some("u1"));
        assert!(other.can_delete);
        assert!(other.can_deactivate);
    }

    #[test]
    fn admin_cannot_deactivate_self() {
        let managed = ManagedUser::for_viewer(profile("u1", vec![Role::Admin]), Some("u1"));
        assert!(!managed.can_delete);
        assert!(!managed.can_deactivate);
    }

    #[test]
    fn statistics_count_every_profile() {
        let mut inactive = profile("u3", vec![Role::Player]);
        inactive.is_active = false;
        let profiles = vec![
            profile("u1", vec![Role::Admin]),
            profile("u2", vec![Role::Member]),
            inactive,
        ];
        assert_eq!(
            UserStatistics::from_profiles(&profiles),
            UserStatistics {
                total: 3,
                active: 2,
                inactive: 1,
                admins: 1
            }
        );
    }

    #[test]
    fn registration_name_bounds() {
        let long = RegistrationForm {
            display_name: "x".repeat(51),
        };
        assert!(long.validate_form().is_err());
        let ok = RegistrationForm {
            display_name: " Lan ".to_string(),
        };
        assert!(ok.validate_form().is_ok());
    }
}
