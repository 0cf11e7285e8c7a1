//! Application services layer - use cases over the repositories.

pub mod container;
mod group_service;
mod member_counts;
mod session_service;
mod user_service;

pub use container::{ServiceContainer, ServiceSettings, Services};

pub use group_service::{GroupManager, GroupService};
pub use member_counts::{compute_member_counts, MemberCountPolicy, MemberCounter};
pub use session_service::{AuthUser, SessionManager, SessionOutcome, SessionService};
pub use user_service::{UserManager, UserService};
