//! Store-level user query.
//!
//! Everything here is answered by the store itself. Free-text search is not:
//! it runs over the retrieved profiles in the service layer.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use domain::{Grade, Role, SortDirection, UserFilter, UserListParams, UserProfile, UserSortField};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserQuery {
    /// Profiles holding at least one of these roles
    pub roles_any: Vec<Role>,
    pub grades: Vec<Grade>,
    pub is_active: Option<bool>,
    /// Case-sensitive prefix of `club`
    pub club_prefix: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub sort_by: UserSortField,
    pub sort_direction: SortDirection,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

impl UserQuery {
    /// Filters and ordering of a listing request, without paging.
    pub fn from_params(params: &UserListParams) -> Self {
        let UserFilter {
            roles,
            grades,
            is_active,
            club,
            created_after,
            created_before,
            ..
        } = &params.filter;

        Self {
            roles_any: roles.clone(),
            grades: grades.clone(),
            is_active: *is_active,
            club_prefix: club.clone().filter(|c| !c.is_empty()),
            created_after: *created_after,
            created_before: *created_before,
            sort_by: params.sort_by,
            sort_direction: params.sort_direction,
            offset: None,
            limit: None,
        }
    }

    /// Restrict to one page of results.
    pub fn paged(mut self, offset: u64, limit: u64) -> Self {
        self.offset = Some(offset);
        self.limit = Some(limit);
        self
    }

    /// Whether a profile passes every filter. Soft-deleted profiles never do.
    pub fn matches(&self, profile: &UserProfile) -> bool {
        if profile.is_deleted() {
            return false;
        }
        if !self.roles_any.is_empty() && !self.roles_any.iter().any(|r| profile.has_role(*r)) {
            return false;
        }
        if !self.grades.is_empty() && !self.grades.contains(&profile.grade) {
            return false;
        }
        if self.is_active.is_some_and(|active| profile.is_active != active) {
            return false;
        }
        if let Some(prefix) = &self.club_prefix {
            if !profile
                .club
                .as_deref()
                .is_some_and(|club| club.starts_with(prefix.as_str()))
            {
                return false;
            }
        }
        if self.created_after.is_some_and(|after| profile.created_at < after) {
            return false;
        }
        if self.created_before.is_some_and(|before| profile.created_at > before) {
            return false;
        }
        true
    }

    /// Ordering by the requested field and direction. Missing login times
    /// sort before any present one in ascending order.
    ///
    /// Text compares byte-wise here; Postgres orders text by the database
    /// collation, so the two stores can disagree on case and accents.
    pub fn compare(&self, a: &UserProfile, b: &UserProfile) -> Ordering {
        let ordering = match self.sort_by {
            UserSortField::DisplayName => a.display_name.cmp(&b.display_name),
            UserSortField::PhoneNumber => a.phone_number.cmp(&b.phone_number),
            UserSortField::Grade => a.grade.as_str().cmp(b.grade.as_str()),
            UserSortField::LastLoginAt => a.last_login_at.cmp(&b.last_login_at),
            UserSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };

        match self.sort_direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}
