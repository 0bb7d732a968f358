mod common;

use agency_portal::access::UnknownRolePolicy;
use agency_portal::types::{MembershipStatus, Role};
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use common::{membership, session_cookie, test_app, token_for, MemoryStore, TestApp};
use tower::ServiceExt;
use uuid::Uuid;

struct Users {
    owner: Uuid,
    admin: Uuid,
    member: Uuid,
    inactive: Uuid,
    stranger: Uuid,
}

fn app_with_users(policy: UnknownRolePolicy) -> (TestApp, Users) {
    let org = Uuid::new_v4();
    let users = Users {
        owner: Uuid::new_v4(),
        admin: Uuid::new_v4(),
        member: Uuid::new_v4(),
        inactive: Uuid::new_v4(),
        stranger: Uuid::new_v4(),
    };
    let store = MemoryStore::default()
        .with(membership(users.owner, org, Role::Owner, MembershipStatus::Active))
        .with(membership(users.admin, org, Role::Admin, MembershipStatus::Active))
        .with(membership(users.member, org, Role::Member, MembershipStatus::Active))
        .with(membership(users.inactive, org, Role::Owner, MembershipStatus::Inactive));
    (test_app(store, policy), users)
}

async fn get(app: &TestApp, path: &str, user: Option<Uuid>) -> Response {
    let mut request = Request::builder().uri(path);
    if let Some(user) = user {
        request = request.header(header::COOKIE, session_cookie(user));
    }
    app.router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> Option<&str> {
    (response.status() == StatusCode::TEMPORARY_REDIRECT)
        .then(|| response.headers().get(header::LOCATION))
        .flatten()
        .and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn anonymous_requests_are_sent_to_the_matching_login() {
    let (app, _) = app_with_users(UnknownRolePolicy::FailClosed);

    assert_eq!(location(&get(&app, "/dashboard", None).await), Some("/login"));
    assert_eq!(location(&get(&app, "/payments/2024", None).await), Some("/login"));
    assert_eq!(location(&get(&app, "/projects", None).await), Some("/team-login"));
    assert_eq!(location(&get(&app, "/team-dashboard", None).await), Some("/team-login"));
}

#[tokio::test]
async fn anonymous_may_open_login_pages() {
    let (app, _) = app_with_users(UnknownRolePolicy::FailClosed);

    assert_eq!(get(&app, "/login", None).await.status(), StatusCode::OK);
    assert_eq!(get(&app, "/team-login", None).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn roles_are_kept_in_their_own_area() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    assert_eq!(location(&get(&app, "/tasks", Some(users.owner)).await), Some("/dashboard"));
    assert_eq!(location(&get(&app, "/clients", Some(users.member)).await), Some("/team-dashboard"));
    assert_eq!(location(&get(&app, "/settings", Some(users.admin)).await), Some("/team-dashboard"));
}

#[tokio::test]
async fn signed_in_users_skip_login_pages() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    assert_eq!(location(&get(&app, "/login", Some(users.owner)).await), Some("/dashboard"));
    assert_eq!(location(&get(&app, "/team-login", Some(users.owner)).await), Some("/dashboard"));
    assert_eq!(location(&get(&app, "/team-login", Some(users.member)).await), Some("/team-dashboard"));
    // The owner login sends members through the team login to their home
    assert_eq!(location(&get(&app, "/login", Some(users.member)).await), Some("/team-dashboard"));
}

#[tokio::test]
async fn allowed_pages_reach_the_handler() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    // No database behind the test router; the handler runs and fails, but
    // the request was not redirected.
    let response = get(&app, "/dashboard", Some(users.owner)).await;
    assert!(location(&response).is_none());
    assert!(response.status().is_server_error());
}

#[tokio::test]
async fn unknown_role_fails_closed() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    assert_eq!(location(&get(&app, "/dashboard", Some(users.stranger)).await), Some("/login"));
    assert_eq!(location(&get(&app, "/tasks", Some(users.inactive)).await), Some("/team-login"));
    assert_eq!(get(&app, "/login", Some(users.stranger)).await.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_role_may_fail_open() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailOpen);

    let response = get(&app, "/dashboard", Some(users.stranger)).await;
    assert!(location(&response).is_none());
    // The page itself still requires a membership
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn store_failure_is_an_unknown_role() {
    let app = test_app(MemoryStore::failing(), UnknownRolePolicy::FailClosed);
    let user = Uuid::new_v4();

    assert_eq!(location(&get(&app, "/clients", Some(user)).await), Some("/login"));
}

#[tokio::test]
async fn bypass_paths_never_resolve_a_session() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    for path in ["/api/clients", "/auth/callback", "/_next/static/chunk.js", "/favicon.ico", "/health"] {
        let response = get(&app, path, Some(users.member)).await;
        assert!(location(&response).is_none(), "{} redirected", path);
    }

    // /api/clients authorizes inside the handler; that is one resolution.
    // The other bypass paths never touch the resolver.
    assert_eq!(app.resolver.calls(), 1);
}

#[tokio::test]
async fn prefixes_match_whole_segments() {
    let (app, _) = app_with_users(UnknownRolePolicy::FailClosed);

    let response = get(&app, "/dashboards-overview", None).await;
    assert!(location(&response).is_none());
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bearer_tokens_are_accepted() {
    let (app, users) = app_with_users(UnknownRolePolicy::FailClosed);

    let request = Request::builder()
        .uri("/projects")
        .header(header::AUTHORIZATION, format!("Bearer {}", token_for(users.owner)))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(location(&response), Some("/dashboard"));
}

#[tokio::test]
async fn invalid_tokens_are_anonymous() {
    let (app, _) = app_with_users(UnknownRolePolicy::FailClosed);

    let request = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, format!("{}=not-a-jwt", common::COOKIE_NAME))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(location(&response), Some("/login"));
}
