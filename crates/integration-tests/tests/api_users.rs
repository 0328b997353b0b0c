mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;
use domains::Role;
use serde_json::json;

#[tokio::test]
async fn user_management_is_admin_only() {
    let app = TestApp::new();
    let (_, user) = app.login(Role::User).await;
    let (_, moderator) = app.login(Role::Moderator).await;

    let (status, _) = app.get("/api/v1/users/", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    for token in [&user, &moderator] {
        let (status, _) = app.get("/api/v1/users/", Some(token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }
}

#[tokio::test]
async fn admin_lists_and_searches_by_username() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    app.named_user("alice", "alice@example.com", Role::User).await;
    app.named_user("malice", "malice@example.com", Role::User).await;
    app.named_user("bob", "bob@example.com", Role::User).await;

    let (status, body) = app.get("/api/v1/users/", Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 4);

    let (_, body) = app.get("/api/v1/users/?search=alice", Some(&admin)).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["results"][0]["username"], "alice");
    assert!(body["results"][0].get("id").is_none());
}

#[tokio::test]
async fn admin_creates_users_with_roles() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;

    let (status, body) = app
        .post(
            "/api/v1/users/",
            Some(&admin),
            json!({ "username": "mod", "email": "mod@example.com", "role": "moderator", "bio": "hi" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(
        body,
        json!({
            "username": "mod",
            "email": "mod@example.com",
            "first_name": "",
            "last_name": "",
            "bio": "hi",
            "role": "moderator",
        })
    );

    let (status, body) = app
        .post(
            "/api/v1/users/",
            Some(&admin),
            json!({ "username": "mod", "email": "mod@example.com" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());
    assert!(body.get("email").is_some());

    let (status, body) = app
        .post(
            "/api/v1/users/",
            Some(&admin),
            json!({ "username": "Me", "email": "me@example.com", "role": "overlord" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());
    assert!(body.get("role").is_some());
}

#[tokio::test]
async fn admin_edits_and_deletes_by_username() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    app.named_user("target", "target@example.com", Role::User).await;
    let uri = "/api/v1/users/target/";

    let (status, body) = app.get(uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "target@example.com");

    let (status, body) = app
        .patch(uri, Some(&admin), json!({ "role": "moderator", "first_name": "Tar" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");
    assert_eq!(body["first_name"], "Tar");

    let (status, _) = app
        .send(Method::PUT, uri, Some(&admin), Some(json!({ "username": "target" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.delete(uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn profile_is_self_service_but_role_is_kept() {
    let app = TestApp::new();
    let (user, token) = app.login(Role::User).await;

    let (status, body) = app.get("/api/v1/users/me/", Some(&token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], user.username.as_str());

    let (status, body) = app
        .patch(
            "/api/v1/users/me/",
            Some(&token),
            json!({ "bio": "Люблю кино", "role": "admin" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bio"], "Люблю кино");
    assert_eq!(body["role"], "user");

    let (status, body) = app.delete("/api/v1/users/me/", Some(&token)).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, json!({ "detail": "Method \"DELETE\" not allowed." }));
}

#[tokio::test]
async fn profile_rejects_taken_username() {
    let app = TestApp::new();
    app.named_user("occupied", "occupied@example.com", Role::User).await;
    let (_, token) = app.login(Role::User).await;

    let (status, body) = app
        .patch("/api/v1/users/me/", Some(&token), json!({ "username": "occupied" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("username").is_some());
}

#[tokio::test]
async fn admin_may_promote_through_own_profile() {
    let app = TestApp::new();
    let (_, token) = app.login(Role::Admin).await;
    let (status, body) = app
        .patch("/api/v1/users/me/", Some(&token), json!({ "role": "moderator" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], "moderator");
}
