//! Role groups: named role bundles with a derived member count.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::constants::MIN_GROUP_NAME_LENGTH;
use crate::error::DomainResult;
use crate::role::Role;
use crate::user::dedup_roles;

/// Role group entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RoleGroup {
    pub id: String,
    pub name: String,
    pub description: String,
    pub roles: Vec<Role>,
    /// Display hint only
    pub color: Option<String>,
    /// Default groups cannot be deleted
    pub is_default: bool,
    /// Maintained by the directory's bookkeeping, never edited directly
    pub member_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub created_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RoleGroup {
    pub fn matches_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Group create/edit form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct GroupFormData {
    #[validate(custom(function = "validate_group_name"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[validate(length(min = 1, message = "At least one role is required"))]
    pub roles: Vec<Role>,
    #[serde(default)]
    pub color: Option<String>,
}

impl GroupFormData {
    pub fn validate_form(&self) -> DomainResult<()> {
        self.validate()?;
        Ok(())
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.roles = dedup_roles(self.roles);
        self
    }
}

/// Fields of a group about to be inserted; the store assigns the id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoleGroup {
    pub name: String,
    pub description: String,
    pub roles: Vec<Role>,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
}

impl NewRoleGroup {
    pub fn from_form(form: GroupFormData, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            name: form.name,
            description: form.description,
            roles: form.roles,
            color: form.color,
            created_at: now,
            created_by: created_by.to_string(),
        }
    }

    /// Admin-created groups start empty and are never default.
    pub fn into_group(self, id: String) -> RoleGroup {
        RoleGroup {
            id,
            name: self.name,
            description: self.description,
            roles: self.roles,
            color: self.color,
            is_default: false,
            member_count: 0,
            created_at: self.created_at,
            updated_at: self.created_at,
            created_by: self.created_by,
            deleted_at: None,
        }
    }
}

/// Editable group fields; `member_count` and `is_default` are not among them.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupChanges {
    pub name: String,
    pub description: String,
    pub roles: Vec<Role>,
    pub color: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl GroupChanges {
    pub fn from_form(form: GroupFormData, now: DateTime<Utc>) -> Self {
        Self {
            name: form.name,
            description: form.description,
            roles: form.roles,
            color: form.color,
            updated_at: now,
        }
    }

    pub fn apply_to(&self, group: &mut RoleGroup) {
        group.name = self.name.clone();
        group.description = self.description.clone();
        group.roles = self.roles.clone();
        group.color = self.color.clone();
        group.updated_at = self.updated_at;
    }
}

fn validate_group_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().chars().count() < MIN_GROUP_NAME_LENGTH {
        let mut error = ValidationError::new("name");
        error.message = Some(
            format!(
                "Group name must have at least {} characters",
                MIN_GROUP_NAME_LENGTH
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

    #[test]
    fn group_form_rules() {
        let form = GroupFormData {
            name: " X ".to_string(),
            description: String::new(),
            roles: vec![Role::Referee],
            color: None,
        };
        assert!(form.validate_form().is_err());

        let form = GroupFormData {
            name: "Referees".to_string(),
            roles: vec![],
            ..form
        };
        assert!(form.validate_form().is_err());
    }

    #[test]
    fn new_groups_start_empty() {
        let form = GroupFormData {
            name: "  Umpires ".to_string(),
            description: " Match officials ".to_string(),
            roles: vec![Role::Referee, Role::Referee, Role::Member],
            color: Some("#3b82f6".to_string()),
        }
        .normalized();
        let group = NewRoleGroup::from_form(form, "admin-1", Utc::now()).into_group("g1".into());
        assert_eq!(group.name, "Umpires");
        assert_eq!(group.description, "Match officials");
        assert_eq!(group.roles, vec![Role::Referee, Role::Member]);
        assert_eq!(group.member_count, 0);
        assert!(!group.is_default);
        assert!(group.matches_role(Role::Member));
        assert!(!group.matches_role(Role::Admin));
    }
}
