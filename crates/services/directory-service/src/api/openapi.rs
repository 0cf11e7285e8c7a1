//! OpenAPI documentation.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::handlers::health_handler::{HealthResponse, StoreHealth};
use crate::api::handlers::user_handler::{PhoneExistsResponse, StatusRequest, UserPage};
use crate::api::response::IdResponse;
use crate::service::{AuthUser, SessionOutcome};
use domain::{
    Grade, GroupFormData, ManagedUser, PaginationMeta, RegistrationForm, Role, RoleGroup,
    SortDirection, UserFormData, UserProfile, UserSortField, UserStatistics,
};

/// API documentation struct.
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::api::handlers::health_handler::health_check,
        crate::api::handlers::session_handler::resolve_session,
        crate::api::handlers::session_handler::register,
        crate::api::handlers::user_handler::list_users,
        crate::api::handlers::user_handler::get_statistics,
        crate::api::handlers::user_handler::phone_exists,
        crate::api::handlers::user_handler::create_user,
        crate::api::handlers::user_handler::get_user,
        crate::api::handlers::user_handler::update_user,
        crate::api::handlers::user_handler::delete_user,
        crate::api::handlers::user_handler::toggle_status,
        crate::api::handlers::group_handler::list_groups,
        crate::api::handlers::group_handler::create_group,
        crate::api::handlers::group_handler::update_group,
        crate::api::handlers::group_handler::delete_group,
        crate::api::handlers::group_handler::recount_members,
    ),
    components(
        schemas(
            HealthResponse,
            StoreHealth,
            SessionOutcome,
            AuthUser,
            RegistrationForm,
            UserProfile,
            ManagedUser,
            UserFormData,
            UserPage,
            PaginationMeta,
            UserStatistics,
            UserSortField,
            SortDirection,
            PhoneExistsResponse,
            StatusRequest,
            IdResponse,
            RoleGroup,
            GroupFormData,
            Role,
            Grade,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness and store connectivity"),
        (name = "Session", description = "Sign-in and self-registration"),
        (name = "Users", description = "User directory administration"),
        (name = "Groups", description = "Role group administration"),
    )
)]
pub struct ApiDoc;

/// Security scheme modifier.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
