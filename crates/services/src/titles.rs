//! Titles: the reviewable works.
//!
//! Writes name category and genres by slug; reads come back with the
//! relations expanded and the average score attached.

use std::sync::Arc;

use domains::validators::{
    validate_max_len, validate_text, validate_year, DESCRIPTION_MAX, NAME_MAX,
};
use domains::{
    AppError, Id, NewTitle, Page, PageRequest, Result, TaxonomyKind, TaxonomyRepo, TitleDetail,
    TitleFilter, TitlePatch, TitleRepo, User, ValidationErrors,
};
use serde::Deserialize;

use crate::permissions::{Access, Policy};
use crate::{check_present, not_null, nullable, required, trimmed};

/// Write payload of a title. Every field is optional on partial update.
///
/// `description` and `category` keep an explicit `null` apart from an
/// absent key: `null` clears the description and is refused for the
/// category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TitleInput {
    pub name: Option<String>,
    pub year: Option<i32>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    /// Category slug
    #[serde(default, deserialize_with = "nullable")]
    pub category: Option<Option<String>>,
    /// Genre slugs
    pub genre: Option<Vec<String>>,
}

impl TitleInput {
    fn trimmed(self) -> Self {
        Self {
            name: trimmed(self.name),
            description: self.description.map(trimmed),
            ..self
        }
    }
}

pub struct TitleService {
    titles: Arc<dyn TitleRepo>,
    taxonomy: Arc<dyn TaxonomyRepo>,
}

impl TitleService {
    const POLICY: Policy = Policy::AdminOrReadOnly;

    pub fn new(titles: Arc<dyn TitleRepo>, taxonomy: Arc<dyn TaxonomyRepo>) -> Self {
        Self { titles, taxonomy }
    }

    pub async fn list(&self, filter: TitleFilter, page: PageRequest) -> Result<Page<TitleDetail>> {
        self.titles.list_titles(filter, page).await
    }

    pub async fn get(&self, id: Id) -> Result<TitleDetail> {
        self.titles
            .get_title(id)
            .await?
            .ok_or_else(|| AppError::not_found("title", id))
    }

    pub async fn create(&self, actor: Option<&User>, input: TitleInput) -> Result<TitleDetail> {
        Self::POLICY.check(actor, Access::Write)?;
        let input = input.trimmed();

        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", input.name);
        let year = required(&mut errors, "year", input.year);
        let category = match input.category {
            Some(category) => not_null(&mut errors, "category", category),
            None => required(&mut errors, "category", None),
        };
        let genre = required(&mut errors, "genre", input.genre);
        let description = input.description.flatten().filter(|d| !d.is_empty());
        check_present(&mut errors, name.as_ref(), |v| validate_text("name", v, Some(NAME_MAX)));
        check_present(&mut errors, year.as_ref(), |v| validate_year(*v));
        check_present(&mut errors, description.as_ref(), |v| {
            validate_max_len("description", v, DESCRIPTION_MAX)
        });
        let category_id = self.resolve_category(&mut errors, category.as_deref()).await?;
        let genre_ids = self.resolve_genres(&mut errors, genre.as_deref()).await?;
        errors.into_result()?;

        let (Some(name), Some(year), Some(genre_ids)) = (name, year, genre_ids) else {
            return Err(AppError::internal("validated title fields missing"));
        };
        let id = self
            .titles
            .create_title(NewTitle {
                name,
                year,
                description,
                category_id,
                genre_ids,
            })
            .await?;
        tracing::info!(title_id = id, "title created");
        self.get(id).await
    }

    pub async fn update(&self, actor: Option<&User>, id: Id, input: TitleInput) -> Result<TitleDetail> {
        Self::POLICY.check(actor, Access::Write)?;
        self.get(id).await?;
        let input = input.trimmed();

        let mut errors = ValidationErrors::new();
        check_present(&mut errors, input.name.as_ref(), |v| {
            validate_text("name", v, Some(NAME_MAX))
        });
        check_present(&mut errors, input.year.as_ref(), |v| validate_year(*v));
        let description = input.description.map(|d| d.filter(|d| !d.is_empty()));
        check_present(&mut errors, description.as_ref().and_then(Option::as_ref), |v| {
            validate_max_len("description", v, DESCRIPTION_MAX)
        });
        let category = match input.category {
            Some(category) => not_null(&mut errors, "category", category),
            None => None,
        };
        let category_id = self.resolve_category(&mut errors, category.as_deref()).await?;
        let genre_ids = self.resolve_genres(&mut errors, input.genre.as_deref()).await?;
        errors.into_result()?;

        let patch = TitlePatch {
            name: input.name,
            year: input.year,
            description,
            category_id,
            genre_ids,
        };
        self.titles.update_title(id, patch).await?;
        tracing::info!(title_id = id, "title updated");
        self.get(id).await
    }

    pub async fn delete(&self, actor: Option<&User>, id: Id) -> Result<()> {
        Self::POLICY.check(actor, Access::Write)?;
        self.get(id).await?;
        self.titles.delete_title(id).await?;
        tracing::info!(title_id = id, "title deleted");
        Ok(())
    }

    async fn resolve_category(
        &self,
        errors: &mut ValidationErrors,
        slug: Option<&str>,
    ) -> Result<Option<Id>> {
        let Some(slug) = slug else {
            return Ok(None);
        };
        match self.taxonomy.find_term(TaxonomyKind::Category, slug).await? {
            Some(term) => Ok(Some(term.id)),
            None => {
                errors.add("category", missing_slug(slug));
                Ok(None)
            }
        }
    }

    async fn resolve_genres(
        &self,
        errors: &mut ValidationErrors,
        slugs: Option<&[String]>,
    ) -> Result<Option<Vec<Id>>> {
        let Some(slugs) = slugs else {
            return Ok(None);
        };
        let mut ids = Vec::with_capacity(slugs.len());
        for slug in slugs {
            match self.taxonomy.find_term(TaxonomyKind::Genre, slug).await? {
                Some(term) if !ids.contains(&term.id) => ids.push(term.id),
                Some(_) => {}
                None => errors.add("genre", missing_slug(slug)),
            }
        }
        Ok(Some(ids))
    }
}

fn missing_slug(slug: &str) -> String {
    format!("Object with slug={slug} does not exist.")
}
