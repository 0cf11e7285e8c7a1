//! Domain layer - Core business entities and value objects.
//!
//! This crate contains pure domain logic with no infrastructure dependencies:
//! user profiles, role groups, the closed role and grade enumerations, form
//! validation and phone number handling.

pub mod constants;
pub mod error;
pub mod group;
pub mod pagination;
pub mod phone;
pub mod query;
pub mod role;
pub mod user;

pub use constants::*;
pub use error::{DomainError, DomainResult};
pub use group::{GroupChanges, GroupFormData, NewRoleGroup, RoleGroup};
pub use pagination::{Paginated, PaginationMeta};
pub use phone::{is_valid_phone, normalize_phone, to_local_format};
pub use query::{SortDirection, UserFilter, UserListParams, UserSortField};
pub use role::{parse_grade_list, parse_role_list, primary_role, Grade, Role};
pub use user::{
    ManagedUser, NewUserProfile, ProfileChanges, RegistrationForm, UserFormData, UserProfile,
    UserStatistics,
};
