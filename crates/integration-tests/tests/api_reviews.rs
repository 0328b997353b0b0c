mod common;

use axum::http::StatusCode;
use common::TestApp;
use domains::Role;
use serde_json::json;

#[tokio::test]
async fn user_reviews_a_title_once() {
    let app = TestApp::new();
    let (reader, token) = app.login(Role::User).await;
    let title = app.title("Сталкер", 1979, None, &[]).await;
    let uri = format!("/api/v1/titles/{title}/reviews/");

    let (status, body) = app
        .post(&uri, Some(&token), json!({ "text": "Шедевр", "score": 10 }))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["author"], reader.username.as_str());
    assert_eq!(body["score"], 10);
    assert!(body["pub_date"].is_string());

    let (status, body) = app
        .post(&uri, Some(&token), json!({ "text": "Ещё раз", "score": 9 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("non_field_errors").is_some());

    let (_, detail) = app.get(&format!("/api/v1/titles/{title}/"), None).await;
    assert_eq!(detail["rating"], 10.0);
}

#[tokio::test]
async fn score_must_be_between_one_and_ten() {
    let app = TestApp::new();
    let (_, token) = app.login(Role::User).await;
    let title = app.title("Title", 2000, None, &[]).await;
    let uri = format!("/api/v1/titles/{title}/reviews/");

    for score in [0, 11, -3] {
        let (status, body) = app
            .post(&uri, Some(&token), json!({ "text": "meh", "score": score }))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{score}");
        assert!(body.get("score").is_some());
    }
}

#[tokio::test]
async fn anonymous_reads_but_cannot_write() {
    let app = TestApp::new();
    let reader = app.user(Role::User).await;
    let title = app.title("Title", 2000, None, &[]).await;
    app.review(title, &reader, 7).await;
    let uri = format!("/api/v1/titles/{title}/reviews/");

    let (status, body) = app.get(&uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    let (status, _) = app.post(&uri, None, json!({ "text": "hi", "score": 5 })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn only_author_moderator_or_admin_may_edit() {
    let app = TestApp::new();
    let (author, author_token) = app.login(Role::User).await;
    let (_, stranger) = app.login(Role::User).await;
    let (_, moderator) = app.login(Role::Moderator).await;
    let (_, admin) = app.login(Role::Admin).await;
    let title = app.title("Title", 2000, None, &[]).await;
    let review = app.review(title, &author, 4).await;
    let uri = format!("/api/v1/titles/{title}/reviews/{review}/");

    let (status, _) = app.patch(&uri, Some(&stranger), json!({ "score": 1 })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.patch(&uri, Some(&author_token), json!({ "score": 6 })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["score"], 6);

    let (status, body) = app
        .patch(&uri, Some(&moderator), json!({ "text": "moderated" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "moderated");
    assert_eq!(body["author"], author.username.as_str());

    let (status, _) = app.delete(&uri, Some(&stranger)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.delete(&uri, Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn review_is_scoped_to_its_title() {
    let app = TestApp::new();
    let author = app.user(Role::User).await;
    let first = app.title("First", 2000, None, &[]).await;
    let second = app.title("Second", 2000, None, &[]).await;
    let review = app.review(first, &author, 5).await;

    let (status, _) = app
        .get(&format!("/api/v1/titles/{second}/reviews/{review}/"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.get("/api/v1/titles/999/reviews/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn comments_follow_their_review() {
    let app = TestApp::new();
    let author = app.user(Role::User).await;
    let (commenter, token) = app.login(Role::User).await;
    let (_, stranger) = app.login(Role::User).await;
    let title = app.title("Title", 2000, None, &[]).await;
    let other_title = app.title("Other", 2000, None, &[]).await;
    let review = app.review(title, &author, 8).await;
    let uri = format!("/api/v1/titles/{title}/reviews/{review}/comments/");

    let (status, body) = app.post(&uri, Some(&token), json!({ "text": "Согласен" })).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["author"], commenter.username.as_str());
    let comment = body["id"].as_i64().unwrap();

    let (status, body) = app.post(&uri, Some(&token), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("text").is_some());
    let (status, _) = app.post(&uri, None, json!({ "text": "anon" })).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (_, list) = app.get(&uri, None).await;
    assert_eq!(list["count"], 1);
    assert_eq!(list["results"][0]["text"], "Согласен");

    let detail = format!("{uri}{comment}/");
    let (status, _) = app.patch(&detail, Some(&stranger), json!({ "text": "x" })).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = app.patch(&detail, Some(&token), json!({ "text": "Не согласен" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["text"], "Не согласен");

    let (status, _) = app
        .get(
            &format!("/api/v1/titles/{other_title}/reviews/{review}/comments/{comment}/"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.delete(&detail, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&detail, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_review_removes_its_comments() {
    let app = TestApp::new();
    let (author, token) = app.login(Role::User).await;
    let title = app.title("Title", 2000, None, &[]).await;
    let review = app.review(title, &author, 8).await;
    let uri = format!("/api/v1/titles/{title}/reviews/{review}/");
    let (status, body) = app
        .post(&format!("{uri}comments/"), Some(&token), json!({ "text": "me too" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let comment = body["id"].as_i64().unwrap();

    let (status, _) = app.delete(&uri, Some(&token)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app
        .get(&format!("{uri}comments/{comment}/"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
