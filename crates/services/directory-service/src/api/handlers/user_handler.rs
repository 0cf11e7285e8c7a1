//! User directory handlers (admin only).

use axum::{
    extract::{Extension, Path, Query, State},
    response::Json,
    routing::{get, patch},
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use common::{AppError, AppResult};
use domain::{
    normalize_phone, parse_grade_list, parse_role_list, ManagedUser, Paginated, PaginationMeta,
    SortDirection, UserFilter, UserFormData, UserListParams, UserSortField, UserStatistics,
    DEFAULT_PAGE_NUMBER, DEFAULT_PAGE_SIZE,
};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::response::{Created, IdResponse, NoContent};
use crate::api::state::AppState;

/// Listing query string
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ListUsersQuery {
    /// Case-insensitive text over name, phone number and club
    pub search: Option<String>,
    /// Comma-separated roles; a profile matches if it has any of them
    #[param(example = "referee,captain")]
    pub roles: Option<String>,
    /// Comma-separated grades
    #[param(example = "A,B")]
    pub grades: Option<String>,
    pub is_active: Option<bool>,
    /// Case-sensitive club prefix
    pub club: Option<String>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub sort_by: Option<UserSortField>,
    pub sort_direction: Option<SortDirection>,
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

impl TryFrom<ListUsersQuery> for UserListParams {
    type Error = AppError;

    fn try_from(query: ListUsersQuery) -> Result<Self, Self::Error> {
        let roles = match query.roles.as_deref() {
            Some(raw) => parse_role_list(raw)?,
            None => Vec::new(),
        };
        let grades = match query.grades.as_deref() {
            Some(raw) => parse_grade_list(raw)?,
            None => Vec::new(),
        };

        Ok(UserListParams {
            filter: UserFilter {
                search: query.search,
                roles,
                grades,
                is_active: query.is_active,
                club: query.club,
                created_after: query.created_after,
                created_before: query.created_before,
            },
            sort_by: query.sort_by.unwrap_or_default(),
            sort_direction: query.sort_direction.unwrap_or_default(),
            page: query.page.unwrap_or(DEFAULT_PAGE_NUMBER),
            limit: query.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        })
    }
}

/// One page of users
#[derive(Debug, Serialize, ToSchema)]
pub struct UserPage {
    pub data: Vec<ManagedUser>,
    pub pagination: PaginationMeta,
}

impl From<Paginated<ManagedUser>> for UserPage {
    fn from(page: Paginated<ManagedUser>) -> Self {
        Self {
            data: page.data,
            pagination: page.pagination,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PhoneExistsQuery {
    /// Phone number in any common notation
    #[param(example = "0912345678")]
    pub phone: String,
    /// Ignore this profile (the one being edited)
    pub exclude_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PhoneExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub is_active: bool,
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/statistics", get(get_statistics))
        .route("/phone-exists", get(phone_exists))
        .route("/:id", get(get_user).put(update_user).delete(delete_user))
        .route("/:id/status", patch(toggle_status))
}

/// List users with filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(ListUsersQuery),
    responses(
        (status = 200, description = "One page of users", body = UserPage),
        (status = 400, description = "Unknown role or grade"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_users(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> AppResult<Json<UserPage>> {
    require_admin(&current_user)?;
    let params = UserListParams::try_from(query)?;
    let page = state
        .services
        .users()
        .list_users(params, Some(current_user.id.as_str()))
        .await?;
    Ok(Json(page.into()))
}

/// Head counts over all users
#[utoipa::path(
    get,
    path = "/users/statistics",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "User statistics", body = UserStatistics),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn get_statistics(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<UserStatistics>> {
    require_admin(&current_user)?;
    Ok(Json(state.services.users().get_user_statistics().await?))
}

/// Check whether a phone number is taken
#[utoipa::path(
    get,
    path = "/users/phone-exists",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(PhoneExistsQuery),
    responses(
        (status = 200, description = "Lookup result", body = PhoneExistsResponse),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn phone_exists(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Query(query): Query<PhoneExistsQuery>,
) -> AppResult<Json<PhoneExistsResponse>> {
    require_admin(&current_user)?;
    let exists = state
        .services
        .users()
        .check_phone_number_exists(&normalize_phone(&query.phone), query.exclude_id.as_deref())
        .await?;
    Ok(Json(PhoneExistsResponse { exists }))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    security(("bearer_auth" = [])),
    request_body = UserFormData,
    responses(
        (status = 201, description = "User created", body = IdResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<UserFormData>,
) -> AppResult<Created<IdResponse>> {
    require_admin(&current_user)?;
    let id = state
        .services
        .users()
        .create_user(form, &current_user.id)
        .await?;
    Ok(Created(IdResponse { id }))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User profile", body = ManagedUser),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<ManagedUser>> {
    require_admin(&current_user)?;
    let user = state
        .services
        .users()
        .get_user(&id, Some(current_user.id.as_str()))
        .await?;
    Ok(Json(user))
}

/// Replace a user's editable fields
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UserFormData,
    responses(
        (status = 204, description = "User updated"),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found")
    )
)]
pub async fn update_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(form): ValidatedJson<UserFormData>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state
        .services
        .users()
        .update_user(&id, form, &current_user.id)
        .await?;
    Ok(NoContent)
}

/// Delete a user
#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    responses(
        (status = 204, description = "User deleted"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Cannot delete your own account")
    )
)]
pub async fn delete_user(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state
        .services
        .users()
        .delete_user(&id, &current_user.id)
        .await?;
    Ok(NoContent)
}

/// Activate or deactivate a user
#[utoipa::path(
    patch,
    path = "/users/{id}/status",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = StatusRequest,
    responses(
        (status = 204, description = "Status changed"),
        (status = 403, description = "Forbidden - Admin only"),
        (status = 404, description = "User not found"),
        (status = 422, description = "Cannot deactivate your own account")
    )
)]
pub async fn toggle_status(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<StatusRequest>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state
        .services
        .users()
        .toggle_user_status(&id, body.is_active, &current_user.id)
        .await?;
    Ok(NoContent)
}
