mod common;

use agency_portal::access::UnknownRolePolicy;
use agency_portal::types::{MembershipStatus, Role};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use common::{membership, session_cookie, test_app, MemoryStore, TestApp};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

struct Team {
    org: Uuid,
    owner: Uuid,
    admin: Uuid,
    member: Uuid,
    inactive: Uuid,
}

fn team_app() -> (TestApp, Team) {
    let team = Team {
        org: Uuid::new_v4(),
        owner: Uuid::new_v4(),
        admin: Uuid::new_v4(),
        member: Uuid::new_v4(),
        inactive: Uuid::new_v4(),
    };
    let store = MemoryStore::default()
        .with(membership(team.owner, team.org, Role::Owner, MembershipStatus::Active))
        .with(membership(team.admin, team.org, Role::Admin, MembershipStatus::Active))
        .with(membership(team.member, team.org, Role::Member, MembershipStatus::Active))
        .with(membership(team.inactive, team.org, Role::Member, MembershipStatus::Inactive));
    (test_app(store, UnknownRolePolicy::FailClosed), team)
}

async fn call(app: &TestApp, method: Method, path: &str, user: Option<Uuid>, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(path);
    if let Some(user) = user {
        request = request.header(header::COOKIE, session_cookie(user));
    }
    let body = match body {
        Some(json) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.router.clone().oneshot(request.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn call_raw(app: &TestApp, method: Method, path: &str, user: Uuid, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(path)
        .header(header::COOKIE, session_cookie(user))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn whoami_reports_session_and_membership() {
    let (app, team) = team_app();

    let (status, body) = call(&app, Method::GET, "/api/auth/whoami", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], true);

    let (status, body) = call(&app, Method::GET, "/api/auth/whoami", Some(team.member), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["user"]["id"], team.member.to_string());
    assert_eq!(body["data"]["membership"]["role"], "member");
    assert_eq!(body["data"]["membership"]["organization_id"], team.org.to_string());

    let stranger = Uuid::new_v4();
    let (status, body) = call(&app, Method::GET, "/api/auth/whoami", Some(stranger), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["membership"].is_null());
}

#[tokio::test]
async fn manager_endpoints_reject_team_members() {
    let (app, team) = team_app();

    for path in ["/api/clients", "/api/payments", "/api/team"] {
        let (status, body) = call(&app, Method::GET, path, Some(team.member), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{}", path);
        assert_eq!(body["code"], "FORBIDDEN");
    }
}

#[tokio::test]
async fn membership_problems_map_to_status_codes() {
    let (app, team) = team_app();

    let (status, _) = call(&app, Method::GET, "/api/projects", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/projects", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = call(&app, Method::GET, "/api/projects", Some(team.inactive), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let failing = test_app(MemoryStore::failing(), UnknownRolePolicy::FailClosed);
    let (status, body) = call(&failing, Method::GET, "/api/projects", Some(Uuid::new_v4()), None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["code"], "SERVICE_UNAVAILABLE");
}

#[tokio::test]
async fn only_the_owner_renames_the_organization() {
    let (app, team) = team_app();

    let rename = json!({ "name": "Northwind Studio" });
    let (status, _) = call(&app, Method::PATCH, "/api/organization", Some(team.admin), Some(rename)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::PATCH,
        "/api/organization",
        Some(team.owner),
        Some(json!({ "name": "  " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["name"].is_string());
}

#[tokio::test]
async fn invalid_input_is_rejected_before_the_database() {
    let (app, team) = team_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/clients",
        Some(team.admin),
        Some(json!({ "name": "", "email": "not-an-email" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["name"].is_string());
    assert!(body["field_errors"]["email"].is_string());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/payments",
        Some(team.owner),
        Some(json!({ "client_id": Uuid::new_v4(), "amount": "0" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["amount"].is_string());
}

#[tokio::test]
async fn team_members_only_move_task_status() {
    let (app, team) = team_app();
    let task = format!("/api/tasks/{}", Uuid::new_v4());

    let (status, body) = call(
        &app,
        Method::PATCH,
        &task,
        Some(team.member),
        Some(json!({ "status": "done", "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let (status, _) = call(&app, Method::DELETE, &task, Some(team.member), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn only_the_owner_adds_admins() {
    let (app, team) = team_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/team",
        Some(team.admin),
        Some(json!({ "email": "new.hire@example.com", "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Only the owner can add admins");

    let (status, _) = call(&app, Method::DELETE, &format!("/api/team/{}", team.admin), Some(team.admin), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_enum_values_are_validation_errors() {
    let (app, team) = team_app();

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/clients",
        Some(team.owner),
        Some(json!({ "name": "Acme", "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert!(body["field_errors"]["status"].is_string());

    let (status, body) = call(&app, Method::GET, "/api/tasks?status=blocked", Some(team.owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn unparsable_json_body_is_invalid_json() {
    let (app, team) = team_app();

    let (status, body) = call_raw(&app, Method::POST, "/api/clients", team.owner, "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "INVALID_JSON");
    assert!(body["message"].is_string());

    // Authorization still runs before the body is read
    let (status, body) = call_raw(&app, Method::POST, "/api/clients", team.member, "{not json").await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn malformed_path_ids_are_bad_requests() {
    let (app, team) = team_app();

    for path in ["/api/clients/not-a-uuid", "/api/projects/42"] {
        let (status, body) = call(&app, Method::GET, path, Some(team.owner), None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", path);
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "BAD_REQUEST");
    }

    let (status, body) = call(&app, Method::DELETE, "/api/team/nobody", Some(team.owner), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}
