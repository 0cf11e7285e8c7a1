//! Authentication middleware.
//!
//! `identity_middleware` only proves phone ownership, for the session routes.
//! `auth_middleware` additionally requires an active directory profile.

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use common::{AppError, AppResult};
use domain::Role;

use crate::api::state::AppState;
use crate::identity::VerifiedIdentity;
use crate::service::{AuthUser, SessionOutcome};

/// Signed-in profile, resolved per request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: String,
    pub phone_number: String,
    pub roles: Vec<Role>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&Role::Admin)
    }
}

impl From<&AuthUser> for CurrentUser {
    fn from(user: &AuthUser) -> Self {
        Self {
            id: user.profile.id.clone(),
            phone_number: user.profile.phone_number.clone(),
            roles: user.profile.roles.clone(),
        }
    }
}

/// Check if user has admin privileges.
pub fn require_admin(user: &CurrentUser) -> AppResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

fn verify_bearer(
    state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> AppResult<VerifiedIdentity> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::Unauthorized)?;
    state.identity.verify(bearer.token())
}

/// Require a valid identity token.
pub async fn identity_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = verify_bearer(&state, bearer)?;
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}

/// Require a valid identity token belonging to an active profile.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = verify_bearer(&state, bearer)?;

    let user = match state
        .services
        .sessions()
        .lookup_session(&identity.phone_number)
        .await?
    {
        SessionOutcome::Active { user } => user,
        SessionOutcome::Inactive { .. } => return Err(AppError::Forbidden),
        SessionOutcome::NeedsRegistration { .. } => return Err(AppError::Unauthorized),
    };

    request.extensions_mut().insert(CurrentUser::from(&user));
    request.extensions_mut().insert(identity);

    Ok(next.run(request).await)
}
