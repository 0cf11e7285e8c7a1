//! Role group handlers (admin only).

use axum::{
    extract::{Extension, Path, State},
    response::Json,
    routing::{get, post, put},
    Router,
};

use common::AppResult;
use domain::{GroupFormData, RoleGroup};

use crate::api::extractors::ValidatedJson;
use crate::api::middleware::{require_admin, CurrentUser};
use crate::api::response::{Created, IdResponse, NoContent};
use crate::api::state::AppState;

/// Create group routes
pub fn group_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_groups).post(create_group))
        .route("/recount", post(recount_members))
        .route("/:id", put(update_group).delete(delete_group))
}

/// List role groups
#[utoipa::path(
    get,
    path = "/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All groups", body = Vec<RoleGroup>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn list_groups(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RoleGroup>>> {
    require_admin(&current_user)?;
    Ok(Json(state.services.groups().list_groups().await?))
}

/// Create a role group
#[utoipa::path(
    post,
    path = "/groups",
    tag = "Groups",
    security(("bearer_auth" = [])),
    request_body = GroupFormData,
    responses(
        (status = 201, description = "Group created", body = IdResponse),
        (status = 400, description = "Validation error"),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn create_group(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<GroupFormData>,
) -> AppResult<Created<IdResponse>> {
    require_admin(&current_user)?;
    let id = state
        .services
        .groups()
        .create_group(form, &current_user.id)
        .await?;
    Ok(Created(IdResponse { id }))
}

/// Replace a group's name, description, roles and color
#[utoipa::path(
    put,
    path = "/groups/{id}",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Group ID")
    ),
    request_body = GroupFormData,
    responses(
        (status = 204, description = "Group updated"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Group not found")
    )
)]
pub async fn update_group(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
    ValidatedJson(form): ValidatedJson<GroupFormData>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state.services.groups().update_group(&id, form).await?;
    Ok(NoContent)
}

/// Delete a non-default group
#[utoipa::path(
    delete,
    path = "/groups/{id}",
    tag = "Groups",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Group ID")
    ),
    responses(
        (status = 204, description = "Group deleted"),
        (status = 404, description = "Group not found"),
        (status = 422, description = "Default groups cannot be deleted")
    )
)]
pub async fn delete_group(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<NoContent> {
    require_admin(&current_user)?;
    state.services.groups().delete_group(&id).await?;
    Ok(NoContent)
}

/// Rebuild every member count from active profiles
#[utoipa::path(
    post,
    path = "/groups/recount",
    tag = "Groups",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Groups with fresh counts", body = Vec<RoleGroup>),
        (status = 403, description = "Forbidden - Admin only")
    )
)]
pub async fn recount_members(
    Extension(current_user): Extension<CurrentUser>,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<RoleGroup>>> {
    require_admin(&current_user)?;
    Ok(Json(state.services.groups().recompute_member_counts().await?))
}
