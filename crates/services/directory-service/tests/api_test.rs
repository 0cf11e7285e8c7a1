//! HTTP tests against the full router over the in-memory store.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::{TestApp, ADMIN_PHONE};
use directory_service_lib::service::ServiceContainer;
use domain::RegistrationForm;

const MEMBER_PHONE: &str = "+84912345678";

async fn send(
    router: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn register(app: &TestApp, phone: &str, name: &str) -> String {
    app.services
        .sessions()
        .complete_registration(
            phone,
            RegistrationForm {
                display_name: name.to_string(),
            },
        )
        .await
        .unwrap()
        .profile
        .id
}

fn user_body(phone: &str, name: &str, roles: &[&str]) -> Value {
    json!({
        "phoneNumber": phone,
        "displayName": name,
        "birthYear": 1990,
        "club": "Club Quận 1",
        "roles": roles,
        "grade": "B",
        "isActive": true
    })
}

// =============================================================================
// Health & authentication
// =============================================================================

#[tokio::test]
async fn health_reports_store_status() {
    let app = TestApp::new();
    let (status, body) = send(&app.router, Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn directory_requires_a_token() {
    let app = TestApp::new();

    let (status, body) = send(&app.router, Method::GET, "/users", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "UNAUTHORIZED");

    let (status, _) = send(&app.router, Method::GET, "/groups", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn verified_but_unregistered_number_is_unauthorized() {
    let app = TestApp::new();
    let token = app.token_for(MEMBER_PHONE);

    let (status, _) = send(&app.router, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn members_cannot_manage_the_directory() {
    let app = TestApp::new();
    register(&app, MEMBER_PHONE, "Tran Van Nam").await;
    let token = app.token_for(MEMBER_PHONE);

    let (status, body) = send(&app.router, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"]["code"], "FORBIDDEN");

    let (status, _) = send(&app.router, Method::GET, "/groups", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn deactivated_admin_is_forbidden() {
    let app = TestApp::new();
    let admin_id = register(&app, ADMIN_PHONE, "Admin").await;
    app.services
        .users()
        .toggle_user_status(&admin_id, false, "someone-else")
        .await
        .unwrap();

    let token = app.token_for(ADMIN_PHONE);
    let (status, _) = send(&app.router, Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(&app.router, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "inactive");
}

// =============================================================================
// Session
// =============================================================================

#[tokio::test]
async fn first_sign_in_registers_a_member() {
    let app = TestApp::new();
    let token = app.token_for("0912 345 678");

    let (status, body) = send(&app.router, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "needsRegistration");
    assert_eq!(body["phoneNumber"], MEMBER_PHONE);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/session/register",
        Some(&token),
        Some(json!({ "displayName": "Tran Van Nam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["primaryRole"], "member");
    assert_eq!(body["grade"], "C");

    let (status, _) = send(
        &app.router,
        Method::POST,
        "/session/register",
        Some(&token),
        Some(json!({ "displayName": "Tran Van Nam" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(&app.router, Method::GET, "/session", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "active");
    assert!(body["user"]["lastLoginAt"].is_string());
}

#[tokio::test]
async fn bootstrap_number_registers_as_admin() {
    let app = TestApp::new();
    let token = app.token_for(ADMIN_PHONE);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/session/register",
        Some(&token),
        Some(json!({ "displayName": "Club Admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["roles"], json!(["admin"]));
    assert_eq!(body["primaryRole"], "admin");
}

// =============================================================================
// Users
// =============================================================================

#[tokio::test]
async fn admin_manages_users() {
    let app = TestApp::new();
    let admin_id = register(&app, ADMIN_PHONE, "Admin").await;
    let token = app.token_for(ADMIN_PHONE);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/users",
        Some(&token),
        Some(user_body("+84911111111", "Referee One", &["referee", "member"])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let user_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/users?roles=referee,captain&isActive=true",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["data"][0]["displayName"], "Referee One");
    assert_eq!(body["data"][0]["canDelete"], true);

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/users/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["canDelete"], false);
    assert_eq!(body["canDeactivate"], false);

    let (status, body) = send(
        &app.router,
        Method::GET,
        "/users/phone-exists?phone=0911111111",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], true);

    let (status, body) = send(
        &app.router,
        Method::GET,
        &format!("/users/phone-exists?phone=0911111111&excludeId={}", user_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["exists"], false);

    let (status, _) = send(
        &app.router,
        Method::PATCH,
        &format!("/users/{}/status", user_id),
        Some(&token),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, Method::GET, "/users/statistics", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["inactive"], 1);
    assert_eq!(body["admins"], 1);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/users/{}", user_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app.router,
        Method::GET,
        &format!("/users/{}", user_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_cannot_remove_own_access() {
    let app = TestApp::new();
    let admin_id = register(&app, ADMIN_PHONE, "Admin").await;
    let token = app.token_for(ADMIN_PHONE);

    let (status, body) = send(
        &app.router,
        Method::DELETE,
        &format!("/users/{}", admin_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"]["message"], "Cannot delete your own account");

    let (status, _) = send(
        &app.router,
        Method::PATCH,
        &format!("/users/{}/status", admin_id),
        Some(&token),
        Some(json!({ "isActive": false })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn invalid_input_is_a_bad_request() {
    let app = TestApp::new();
    register(&app, ADMIN_PHONE, "Admin").await;
    let token = app.token_for(ADMIN_PHONE);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/users",
        Some(&token),
        Some(user_body("0911111111", "Local Format", &["member"])),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");

    let (status, _) = send(
        &app.router,
        Method::GET,
        "/users?roles=coach",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Groups
// =============================================================================

#[tokio::test]
async fn admin_manages_groups() {
    let app = TestApp::new();
    register(&app, ADMIN_PHONE, "Admin").await;
    let token = app.token_for(ADMIN_PHONE);

    let (status, body) = send(
        &app.router,
        Method::POST,
        "/groups",
        Some(&token),
        Some(json!({ "name": "Admins", "roles": ["admin"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let group_id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(&app.router, Method::POST, "/groups/recount", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["memberCount"], 1);

    let (status, _) = send(
        &app.router,
        Method::PUT,
        &format!("/groups/{}", group_id),
        Some(&token),
        Some(json!({ "name": "A", "roles": ["admin"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/groups/{}", group_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(
        &app.router,
        Method::DELETE,
        &format!("/groups/{}", group_id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
