//! Roles and grades.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Club roles. A profile holds a non-empty set of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Organizer,
    Referee,
    Treasurer,
    Captain,
    Player,
    Member,
    Viewer,
}

impl Role {
    /// Precedence used to pick a primary role out of a role set.
    pub const PRIORITY: [Role; 8] = [
        Role::Admin,
        Role::Organizer,
        Role::Referee,
        Role::Treasurer,
        Role::Captain,
        Role::Player,
        Role::Member,
        Role::Viewer,
    ];

    /// Stable wire/storage value
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Organizer => "organizer",
            Role::Referee => "referee",
            Role::Treasurer => "treasurer",
            Role::Captain => "captain",
            Role::Player => "player",
            Role::Member => "member",
            Role::Viewer => "viewer",
        }
    }

    /// Check if this role has admin privileges
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Highest-precedence role in `roles`, if any.
pub fn primary_role(roles: &[Role]) -> Option<Role> {
    Role::PRIORITY
        .iter()
        .copied()
        .find(|role| roles.contains(role))
}

/// Parse a comma-separated role list (`"admin,member"`), ignoring blanks.
pub fn parse_role_list(raw: &str) -> Result<Vec<Role>, DomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Role::from_str)
        .collect()
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::PRIORITY
            .iter()
            .copied()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unknown role '{}'", s)))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Player grade
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Grade {
    A,
    B,
    #[default]
    C,
}

impl Grade {
    pub const ALL: [Grade; 3] = [Grade::A, Grade::B, Grade::C];

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
        }
    }
}

/// Parse a comma-separated grade list (`"A,B"`), ignoring blanks.
pub fn parse_grade_list(raw: &str) -> Result<Vec<Grade>, DomainError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(Grade::from_str)
        .collect()
}

impl FromStr for Grade {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Grade::ALL
            .iter()
            .copied()
            .find(|grade| grade.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("Unknown grade '{}'", s)))
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_role_follows_priority() {
        assert_eq!(
            primary_role(&[Role::Member, Role::Referee, Role::Player]),
            Some(Role::Referee)
        );
        assert_eq!(primary_role(&[Role::Viewer]), Some(Role::Viewer));
        assert_eq!(primary_role(&[]), None);
    }

    #[test]
    fn roles_use_lowercase_wire_values() {
        let json = serde_json::to_string(&vec![Role::Admin, Role::Treasurer]).unwrap();
        assert_eq!(json, r#"["admin","treasurer"]"#);
        assert_eq!("captain".parse::<Role>().unwrap(), Role::Captain);
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn parse_lists_skip_blanks() {
        assert_eq!(
            parse_role_list("admin, member,").unwrap(),
            vec![Role::Admin, Role::Member]
        );
        assert_eq!(parse_grade_list("A,C").unwrap(), vec![Grade::A, Grade::C]);
        assert!(parse_grade_list("D").is_err());
    }
}
