//! Session handlers: sign-in and first-time registration.

use axum::{
    extract::{Extension, State},
    response::Json,
    routing::{get, post},
    Router,
};

use common::AppResult;
use domain::RegistrationForm;

use crate::api::extractors::ValidatedJson;
use crate::api::response::Created;
use crate::api::state::AppState;
use crate::identity::VerifiedIdentity;
use crate::service::{AuthUser, SessionOutcome};

/// Create session routes
pub fn session_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(resolve_session))
        .route("/register", post(register))
}

/// Sign in with a verified phone number
#[utoipa::path(
    get,
    path = "/session",
    tag = "Session",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active, inactive or unregistered", body = SessionOutcome),
        (status = 401, description = "Missing or invalid identity token")
    )
)]
pub async fn resolve_session(
    Extension(identity): Extension<VerifiedIdentity>,
    State(state): State<AppState>,
) -> AppResult<Json<SessionOutcome>> {
    let outcome = state
        .services
        .sessions()
        .resolve_session(&identity.phone_number)
        .await?;
    Ok(Json(outcome))
}

/// Create the profile for a verified number
#[utoipa::path(
    post,
    path = "/session/register",
    tag = "Session",
    security(("bearer_auth" = [])),
    request_body = RegistrationForm,
    responses(
        (status = 201, description = "Profile created", body = AuthUser),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Missing or invalid identity token"),
        (status = 409, description = "A profile already uses this number")
    )
)]
pub async fn register(
    Extension(identity): Extension<VerifiedIdentity>,
    State(state): State<AppState>,
    ValidatedJson(form): ValidatedJson<RegistrationForm>,
) -> AppResult<Created<AuthUser>> {
    let user = state
        .services
        .sessions()
        .complete_registration(&identity.phone_number, form)
        .await?;
    Ok(Created(user))
}
