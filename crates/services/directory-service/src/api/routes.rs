//! Route configuration.

use axum::{middleware, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::handlers::{group_routes, health_routes, session_routes, user_routes};
use crate::api::middleware::{auth_middleware, identity_middleware};
use crate::api::openapi::ApiDoc;
use crate::api::state::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check (no auth)
        .nest("/health", health_routes())
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Session routes (verified phone, profile optional)
        .nest(
            "/session",
            session_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                identity_middleware,
            )),
        )
        // Directory routes (active profile required)
        .nest(
            "/users",
            user_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/groups",
            group_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
