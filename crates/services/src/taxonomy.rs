//! Categories and genres: list, create and delete-by-slug.

use std::sync::Arc;

use domains::validators::{validate_slug, validate_text, NAME_MAX};
use domains::{
    AppError, NewTerm, Page, PageRequest, Result, TaxonomyKind, TaxonomyRepo, Term, User,
    ValidationErrors,
};
use serde::Deserialize;

use crate::permissions::{Access, Policy};
use crate::{check_present, required, trimmed};

/// Payload for creating a category or genre.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TermInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepo>,
    kind: TaxonomyKind,
}

impl TaxonomyService {
    const POLICY: Policy = Policy::AdminOrReadOnly;

    pub fn new(repo: Arc<dyn TaxonomyRepo>, kind: TaxonomyKind) -> Self {
        Self { repo, kind }
    }

    pub fn kind(&self) -> TaxonomyKind {
        self.kind
    }

    pub async fn list(&self, search: Option<String>, page: PageRequest) -> Result<Page<Term>> {
        let search = search.filter(|s| !s.trim().is_empty());
        self.repo.list_terms(self.kind, search, page).await
    }

    pub async fn create(&self, actor: Option<&User>, input: TermInput) -> Result<Term> {
        Self::POLICY.check(actor, Access::Write)?;

        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", trimmed(input.name));
        let slug = required(&mut errors, "slug", input.slug);
        check_present(&mut errors, name.as_ref(), |v| validate_text("name", v, Some(NAME_MAX)));
        check_present(&mut errors, slug.as_ref(), |v| validate_slug(v));

        if let Some(slug) = slug.as_deref() {
            if !errors.contains("slug") && self.repo.find_term(self.kind, slug).await?.is_some() {
                errors.add("slug", self.duplicate_slug_message());
            }
        }
        errors.into_result()?;

        let (Some(name), Some(slug)) = (name, slug) else {
            return Err(AppError::internal("validated term fields missing"));
        };
        let term = self
            .repo
            .create_term(self.kind, NewTerm { name, slug })
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => AppError::invalid("slug", self.duplicate_slug_message()),
                other => other,
            })?;
        tracing::info!(kind = self.kind.label(), slug = %term.slug, "term created");
        Ok(term)
    }

    pub async fn delete(&self, actor: Option<&User>, slug: &str) -> Result<()> {
        Self::POLICY.check(actor, Access::Write)?;
        self.repo.delete_term(self.kind, slug).await?;
        tracing::info!(kind = self.kind.label(), slug, "term deleted");
        Ok(())
    }

    fn duplicate_slug_message(&self) -> String {
        format!("{} with this slug already exists.", self.kind.label())
    }
}
