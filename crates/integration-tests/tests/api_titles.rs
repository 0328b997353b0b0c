mod common;

use axum::http::StatusCode;
use common::TestApp;
use domains::validators::current_year;
use domains::Role;
use serde_json::{json, Value};

fn names(body: &Value) -> Vec<String> {
    body["results"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_owned())
        .collect()
}

#[tokio::test]
async fn admin_creates_a_title_and_reads_it_back_nested() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    app.category("Books", "books").await;
    app.genre("Fiction", "fiction").await;

    let (status, body) = app
        .post(
            "/api/v1/titles/",
            Some(&admin),
            json!({ "name": "X", "year": 2024, "category": "books", "genre": ["fiction"] }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let id = body["id"].as_i64().unwrap();
    assert_eq!(
        body,
        json!({
            "id": id,
            "name": "X",
            "year": 2024,
            "rating": null,
            "description": null,
            "genre": [{ "name": "Fiction", "slug": "fiction" }],
            "category": { "name": "Books", "slug": "books" },
        })
    );

    let (status, fetched) = app.get(&format!("/api/v1/titles/{id}/"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, body);
}

#[tokio::test]
async fn only_admins_write_titles() {
    let app = TestApp::new();
    let (_, user) = app.login(Role::User).await;
    let payload = json!({ "name": "X", "year": 2000, "category": "books", "genre": [] });

    let (status, _) = app.post("/api/v1/titles/", None, payload.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, _) = app.post("/api/v1/titles/", Some(&user), payload).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn create_validates_year_and_relations() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    app.category("Books", "books").await;

    let (status, body) = app
        .post(
            "/api/v1/titles/",
            Some(&admin),
            json!({
                "name": "Future",
                "year": current_year() + 1,
                "category": "missing",
                "genre": ["nope"],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("year").is_some());
    assert!(body.get("category").is_some());
    assert!(body.get("genre").is_some());

    let (status, body) = app.post("/api/v1/titles/", Some(&admin), json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    for field in ["name", "year", "category", "genre"] {
        assert!(body.get(field).is_some(), "{field}");
    }
}

#[tokio::test]
async fn partial_update_keeps_untouched_fields() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    let books = app.category("Books", "books").await;
    app.category("Films", "films").await;
    let drama = app.genre("Drama", "drama").await;
    let id = app.title("Old", 1990, Some(books.id), &[drama.id]).await;

    let (status, body) = app
        .patch(
            &format!("/api/v1/titles/{id}/"),
            Some(&admin),
            json!({ "name": "New", "category": "films" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "New");
    assert_eq!(body["year"], 1990);
    assert_eq!(body["category"]["slug"], "films");
    assert_eq!(body["genre"][0]["slug"], "drama");
}

#[tokio::test]
async fn patch_null_clears_description_but_not_category() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    app.category("Books", "books").await;
    let (status, body) = app
        .post(
            "/api/v1/titles/",
            Some(&admin),
            json!({
                "name": "  Dune ",
                "year": 1965,
                "description": "sand",
                "category": "books",
                "genre": [],
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["name"], "Dune");
    let uri = format!("/api/v1/titles/{}/", body["id"]);

    let (status, body) = app
        .patch(&uri, Some(&admin), json!({ "category": null }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "category": ["This field may not be null."] }));

    let (status, body) = app
        .patch(&uri, Some(&admin), json!({ "description": null }))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["description"].is_null());
    assert_eq!(body["category"]["slug"], "books");
}

#[tokio::test]
async fn filters_combine() {
    let app = TestApp::new();
    let film = app.category("Film", "film").await;
    let book = app.category("Book", "book").await;
    let drama = app.genre("Drama", "drama").await;
    let comedy = app.genre("Comedy", "comedy").await;
    app.title("The Godfather", 1972, Some(film.id), &[drama.id]).await;
    app.title("Godfather Part II", 1974, Some(film.id), &[drama.id]).await;
    app.title("Big Lebowski", 1998, Some(film.id), &[comedy.id]).await;
    app.title("War and Peace", 1869, Some(book.id), &[drama.id]).await;

    let (_, body) = app.get("/api/v1/titles/?genre=drama&category=film", None).await;
    assert_eq!(names(&body), ["The Godfather", "Godfather Part II"]);

    let (_, body) = app.get("/api/v1/titles/?name=godFATHER&year=1974", None).await;
    assert_eq!(names(&body), ["Godfather Part II"]);

    let (_, body) = app.get("/api/v1/titles/?category=book", None).await;
    assert_eq!(body["count"], 1);

    let (status, body) = app.get("/api/v1/titles/?year=soon", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.get("year").is_some());
}

#[tokio::test]
async fn listing_is_ordered_by_rating_with_unrated_last() {
    let app = TestApp::new();
    let reader = app.user(Role::User).await;
    let critic = app.user(Role::User).await;
    let unrated = app.title("Unrated", 2001, None, &[]).await;
    let high = app.title("High", 2002, None, &[]).await;
    let low = app.title("Low", 2003, None, &[]).await;
    app.review(high, &reader, 9).await;
    app.review(high, &critic, 8).await;
    app.review(low, &reader, 3).await;

    let (_, body) = app.get("/api/v1/titles/", None).await;
    assert_eq!(names(&body), ["Low", "High", "Unrated"]);
    assert_eq!(body["results"][1]["rating"], 8.5);
    assert!(body["results"][2]["rating"].is_null());

    let (_, detail) = app.get(&format!("/api/v1/titles/{unrated}/"), None).await;
    assert!(detail["rating"].is_null());
    let (_, detail) = app.get(&format!("/api/v1/titles/{low}/"), None).await;
    assert_eq!(detail["rating"], 3.0);
}

#[tokio::test]
async fn listing_is_paginated() {
    let app = TestApp::with_page_size(5);
    for n in 0..12 {
        app.title(&format!("Title {n:02}"), 2000, None, &[]).await;
    }

    let (status, body) = app.get("/api/v1/titles/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 12);
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
    assert_eq!(body["next"], "/api/v1/titles/?page=2");
    assert!(body["previous"].is_null());

    let (_, body) = app.get("/api/v1/titles/?year=2000&page=3", None).await;
    assert_eq!(body["results"].as_array().unwrap().len(), 2);
    assert!(body["next"].is_null());
    assert_eq!(body["previous"], "/api/v1/titles/?year=2000&page=2");

    let (status, body) = app.get("/api/v1/titles/?page=4", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Invalid page." }));
}

#[tokio::test]
async fn deleting_a_title_removes_its_reviews() {
    let app = TestApp::new();
    let (_, admin) = app.login(Role::Admin).await;
    let reader = app.user(Role::User).await;
    let id = app.title("Doomed", 2010, None, &[]).await;
    let review = app.review(id, &reader, 5).await;

    let (status, _) = app.delete(&format!("/api/v1/titles/{id}/"), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get(&format!("/api/v1/titles/{id}/"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app
        .get(&format!("/api/v1/titles/{id}/reviews/{review}/"), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn non_numeric_id_is_not_found() {
    let app = TestApp::new();
    let (status, body) = app.get("/api/v1/titles/abc/", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));
}
