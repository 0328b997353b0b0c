//! Shared fixtures: the full router over an in-memory store, a capturing
//! mailer and helpers to seed rows and send JSON requests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use api_adapters::{router, AppState, Ports};
use async_trait::async_trait;
use auth_adapters::{HmacCodes, JwtTokens};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use domains::{
    AccessTokens, Email, Id, Mailer, NewReview, NewTerm, NewTitle, NewUser, ReviewRepo, Role,
    TaxonomyKind, TaxonomyRepo, Term, TitleRepo, User, UserRepo,
};
use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use serde_json::Value;
use storage_adapters::MemoryStore;
use tower::ServiceExt;

pub const SECRET: &str = "integration-secret";
pub const FROM: &str = "noreply@yamdb.test";

/// Mailer that keeps every message for inspection.
#[derive(Default)]
pub struct Mailbox {
    sent: Mutex<Vec<Email>>,
}

impl Mailbox {
    pub fn sent(&self) -> Vec<Email> {
        self.sent.lock().unwrap().clone()
    }

    pub fn last_to(&self, address: &str) -> Option<Email> {
        self.sent().into_iter().rev().find(|m| m.to == address)
    }
}

#[async_trait]
impl Mailer for Mailbox {
    async fn send(&self, email: Email) -> domains::Result<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub tokens: Arc<JwtTokens>,
    pub mailbox: Arc<Mailbox>,
    seq: AtomicU64,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_page_size(10)
    }

    pub fn with_page_size(page_size: u32) -> Self {
        Self::with_store(Arc::new(MemoryStore::new()), page_size)
    }

    pub fn with_store(store: Arc<MemoryStore>, page_size: u32) -> Self {
        let tokens = Arc::new(JwtTokens::new(SECRET, chrono::Duration::hours(1)));
        let codes = Arc::new(HmacCodes::new(SECRET, chrono::Duration::days(1)));
        let mailbox = Arc::new(Mailbox::default());
        let ports = Ports::from_store(store.clone(), codes, tokens.clone(), mailbox.clone());
        let state = AppState::new(ports, page_size, FROM);
        Self {
            router: router(state),
            store,
            tokens,
            mailbox,
            seq: AtomicU64::new(1),
        }
    }

    /// Creates a user with a generated username and email.
    pub async fn user(&self, role: Role) -> User {
        let n = self.seq.fetch_add(1, Ordering::Relaxed);
        let email: String = SafeEmail().fake();
        let username = format!("{}{n}", role.as_str());
        self.named_user(&username, &format!("{n}.{email}"), role).await
    }

    pub async fn named_user(&self, username: &str, email: &str, role: Role) -> User {
        let mut user = NewUser::basic(username, email);
        user.role = role;
        self.store.create_user(user).await.unwrap()
    }

    /// A user of `role` plus a bearer token for it.
    pub async fn login(&self, role: Role) -> (User, String) {
        let user = self.user(role).await;
        let token = self.tokens.issue(&user).unwrap();
        (user, token)
    }

    pub async fn category(&self, name: &str, slug: &str) -> Term {
        self.term(TaxonomyKind::Category, name, slug).await
    }

    pub async fn genre(&self, name: &str, slug: &str) -> Term {
        self.term(TaxonomyKind::Genre, name, slug).await
    }

    async fn term(&self, kind: TaxonomyKind, name: &str, slug: &str) -> Term {
        self.store
            .create_term(
                kind,
                NewTerm {
                    name: name.into(),
                    slug: slug.into(),
                },
            )
            .await
            .unwrap()
    }

    pub async fn title(&self, name: &str, year: i32, category: Option<Id>, genres: &[Id]) -> Id {
        self.store
            .create_title(NewTitle {
                name: name.into(),
                year,
                description: None,
                category_id: category,
                genre_ids: genres.to_vec(),
            })
            .await
            .unwrap()
    }

    pub async fn review(&self, title_id: Id, author: &User, score: i32) -> Id {
        self.store
            .create_review(NewReview {
                title_id,
                author_id: author.id,
                text: format!("{} gives {score}", author.username),
                score,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, token, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, token, None).await
    }
}
