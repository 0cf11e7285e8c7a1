//! Domain-level constants.
//!
//! These constants define business rules and validation requirements.

// =============================================================================
// Phone numbers
// =============================================================================

/// Country prefix of every canonical phone number
pub const PHONE_COUNTRY_PREFIX: &str = "+84";

/// Canonical phone number format: `+84` followed by exactly nine digits
pub const PHONE_PATTERN: &str = r"^\+84\d{9}$";

// =============================================================================
// Profiles
// =============================================================================

/// Actor recorded in `created_by` for profiles created after phone verification
pub const SELF_REGISTRATION_ACTOR: &str = "self-registration";

/// Actor recorded for seeded records
pub const SYSTEM_ACTOR: &str = "system";

/// Minimum display name length (after trimming)
pub const MIN_DISPLAY_NAME_LENGTH: usize = 2;

/// Maximum display name length accepted at self-registration
pub const MAX_REGISTRATION_NAME_LENGTH: usize = 50;

/// Earliest accepted birth year
pub const MIN_BIRTH_YEAR: i32 = 1950;

/// Youngest accepted member age, in years
pub const MIN_MEMBER_AGE: i32 = 10;

/// Assumed age when a self-registered profile has no birth year yet
pub const DEFAULT_REGISTRATION_AGE: i32 = 25;

// =============================================================================
// Groups
// =============================================================================

/// Minimum group name length (after trimming)
pub const MIN_GROUP_NAME_LENGTH: usize = 2;

// =============================================================================
// Listing
// =============================================================================

/// Default page size for user listings
pub const DEFAULT_PAGE_SIZE: u64 = 50;

/// Maximum page size for user listings
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

/// Largest offset a store is asked to skip (fits a signed 64-bit column)
pub const MAX_LIST_OFFSET: u64 = i64::MAX as u64;
