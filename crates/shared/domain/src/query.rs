//! User listing parameters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE, MAX_LIST_OFFSET, MAX_PAGE_SIZE};
use crate::role::{Grade, Role};
use crate::user::UserProfile;

/// Optional listing filters. Empty sets mean "no restriction".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilter {
    /// Free text over display name, phone number and club (case-insensitive)
    pub search: Option<String>,
    /// Match profiles holding any of these roles
    #[serde(default)]
    pub roles: Vec<Role>,
    /// Match profiles with any of these grades
    #[serde(default)]
    pub grades: Vec<Grade>,
    pub is_active: Option<bool>,
    /// Case-sensitive club prefix
    pub club: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub created_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub created_before: Option<DateTime<Utc>>,
}

impl UserFilter {
    /// Lower-cased search term, if any non-blank one was given.
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    /// Free-text match, applied after retrieval.
    pub fn matches_search(term: &str, profile: &UserProfile) -> bool {
        profile.display_name.to_lowercase().contains(term)
            || profile.phone_number.contains(term)
            || profile
                .club
                .as_deref()
                .is_some_and(|club| club.to_lowercase().contains(term))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub enum UserSortField {
    #[default]
    DisplayName,
    PhoneNumber,
    Grade,
    LastLoginAt,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

/// Listing request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListParams {
    #[serde(default)]
    pub filter: UserFilter,
    #[serde(default)]
    pub sort_by: UserSortField,
    #[serde(default)]
    pub sort_direction: SortDirection,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    DEFAULT_PAGE_NUMBER
}

fn default_limit() -> u64 {
    DEFAULT_PAGE_SIZE
}

impl Default for UserListParams {
    fn default() -> Self {
        Self {
            filter: UserFilter::default(),
            sort_by: UserSortField::default(),
            sort_direction: SortDirection::default(),
            page: DEFAULT_PAGE_NUMBER,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl UserListParams {
    /// Page number, never below 1
    pub fn page(&self) -> u64 {
        self.page.max(1)
    }

    /// Page size within `1..=MAX_PAGE_SIZE`
    pub fn limit(&self) -> u64 {
        self.limit.clamp(1, MAX_PAGE_SIZE)
    }

    /// Number of records skipped before this page, capped at
    /// [`MAX_LIST_OFFSET`]
    pub fn offset(&self) -> u64 {
        (self.page() - 1)
            .saturating_mul(self.limit())
            .min(MAX_LIST_OFFSET)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_clamped() {
        let params = UserListParams {
            page: 0,
            limit: 1000,
            ..Default::default()
        };
        assert_eq!(params.page(), 1);
        assert_eq!(params.limit(), MAX_PAGE_SIZE);
        assert_eq!(params.offset(), 0);

        let params = UserListParams {
            page: 3,
            limit: 20,
            ..Default::default()
        };
        assert_eq!(params.offset(), 40);
    }

    #[test]
    fn huge_page_saturates_offset() {
        let params = UserListParams {
            page: u64::MAX,
            ..Default::default()
        };
        assert_eq!(params.page(), u64::MAX);
        assert_eq!(params.offset(), MAX_LIST_OFFSET);
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = UserFilter {
            search: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term(), None);

        let filter = UserFilter {
            search: Some(" Club ".to_string()),
            ..Default::default()
        };
        assert_eq!(filter.search_term().as_deref(), Some("club"));
    }

    #[test]
    fn sort_fields_use_camel_case() {
        let field: UserSortField = serde_json::from_str(r#""lastLoginAt""#).unwrap();
        assert_eq!(field, UserSortField::LastLoginAt);
    }
}
