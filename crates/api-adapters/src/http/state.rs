//! Shared handler state.

use std::sync::Arc;

use domains::{
    AccessTokens, CommentRepo, ConfirmationCodes, Mailer, ReviewRepo, TaxonomyKind, TaxonomyRepo,
    TitleRepo, UserRepo,
};
use services::{
    AuthService, CommentService, ReviewService, TaxonomyService, TitleService, UserService,
};

use super::metrics::HttpMetrics;

/// Outbound ports the services are built from.
pub struct Ports {
    pub users: Arc<dyn UserRepo>,
    pub taxonomy: Arc<dyn TaxonomyRepo>,
    pub titles: Arc<dyn TitleRepo>,
    pub reviews: Arc<dyn ReviewRepo>,
    pub comments: Arc<dyn CommentRepo>,
    pub codes: Arc<dyn ConfirmationCodes>,
    pub tokens: Arc<dyn AccessTokens>,
    pub mailer: Arc<dyn Mailer>,
}

impl Ports {
    /// Wires every repository port to one store.
    pub fn from_store<S>(
        store: Arc<S>,
        codes: Arc<dyn ConfirmationCodes>,
        tokens: Arc<dyn AccessTokens>,
        mailer: Arc<dyn Mailer>,
    ) -> Self
    where
        S: UserRepo + TaxonomyRepo + TitleRepo + ReviewRepo + CommentRepo + 'static,
    {
        Self {
            users: store.clone(),
            taxonomy: store.clone(),
            titles: store.clone(),
            reviews: store.clone(),
            comments: store,
            codes,
            tokens,
            mailer,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub titles: Arc<TitleService>,
    pub categories: Arc<TaxonomyService>,
    pub genres: Arc<TaxonomyService>,
    pub reviews: Arc<ReviewService>,
    pub comments: Arc<CommentService>,
    pub users: Arc<UserService>,
    pub auth: Arc<AuthService>,
    pub page_size: u32,
    pub metrics: Arc<HttpMetrics>,
}

impl AppState {
    pub fn new(ports: Ports, page_size: u32, from_address: impl Into<String>) -> Self {
        let Ports {
            users,
            taxonomy,
            titles,
            reviews,
            comments,
            codes,
            tokens,
            mailer,
        } = ports;
        Self {
            titles: Arc::new(TitleService::new(titles.clone(), taxonomy.clone())),
            categories: Arc::new(TaxonomyService::new(taxonomy.clone(), TaxonomyKind::Category)),
            genres: Arc::new(TaxonomyService::new(taxonomy, TaxonomyKind::Genre)),
            reviews: Arc::new(ReviewService::new(reviews.clone(), titles)),
            comments: Arc::new(CommentService::new(comments, reviews)),
            users: Arc::new(UserService::new(users.clone())),
            auth: Arc::new(AuthService::new(users, codes, tokens, mailer, from_address)),
            page_size: page_size.max(1),
            metrics: Arc::new(HttpMetrics::new()),
        }
    }
}
