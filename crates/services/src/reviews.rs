//! Reviews of a title. One per author and title; score 1 to 10.

use std::sync::Arc;

use domains::validators::{validate_score, validate_text};
use domains::{
    AppError, Id, NewReview, Page, PageRequest, Result, Review, ReviewPatch, ReviewRepo,
    TitleRepo, User, ValidationErrors, NON_FIELD_ERRORS,
};
use serde::Deserialize;

use crate::permissions::{require_authenticated, Access, Policy};
use crate::{check_present, required, trimmed};

const ALREADY_REVIEWED: &str = "You have already reviewed this title.";

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewInput {
    pub text: Option<String>,
    pub score: Option<i32>,
}

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepo>,
    titles: Arc<dyn TitleRepo>,
}

impl ReviewService {
    const POLICY: Policy = Policy::OwnerModeratorAdminOrReadOnly;

    pub fn new(reviews: Arc<dyn ReviewRepo>, titles: Arc<dyn TitleRepo>) -> Self {
        Self { reviews, titles }
    }

    pub async fn list(&self, title_id: Id, page: PageRequest) -> Result<Page<Review>> {
        self.ensure_title(title_id).await?;
        self.reviews.list_reviews(title_id, page).await
    }

    pub async fn get(&self, title_id: Id, review_id: Id) -> Result<Review> {
        self.ensure_title(title_id).await?;
        self.reviews
            .get_review(title_id, review_id)
            .await?
            .ok_or_else(|| AppError::not_found("review", review_id))
    }

    pub async fn create(&self, actor: Option<&User>, title_id: Id, input: ReviewInput) -> Result<Review> {
        Self::POLICY.check(actor, Access::Write)?;
        let author = require_authenticated(actor)?;
        self.ensure_title(title_id).await?;

        let mut errors = ValidationErrors::new();
        let text = required(&mut errors, "text", trimmed(input.text));
        let score = required(&mut errors, "score", input.score);
        check_present(&mut errors, text.as_ref(), |v| validate_text("text", v, None));
        check_present(&mut errors, score.as_ref(), |v| validate_score(*v));
        if errors.is_empty()
            && self
                .reviews
                .find_by_author(title_id, author.id)
                .await?
                .is_some()
        {
            errors.add(NON_FIELD_ERRORS, ALREADY_REVIEWED);
        }
        errors.into_result()?;

        let (Some(text), Some(score)) = (text, score) else {
            return Err(AppError::internal("validated review fields missing"));
        };
        let review = self
            .reviews
            .create_review(NewReview {
                title_id,
                author_id: author.id,
                text,
                score,
            })
            .await
            .map_err(|err| match err {
                AppError::Conflict(_) => AppError::invalid(NON_FIELD_ERRORS, ALREADY_REVIEWED),
                other => other,
            })?;
        tracing::info!(title_id, review_id = review.id, author = %author.username, "review created");
        Ok(review)
    }

    pub async fn update(
        &self,
        actor: Option<&User>,
        title_id: Id,
        review_id: Id,
        input: ReviewInput,
    ) -> Result<Review> {
        Self::POLICY.check(actor, Access::Write)?;
        let review = self.get(title_id, review_id).await?;
        Self::POLICY.check_object(actor, Access::Write, review.author_id)?;

        let text = trimmed(input.text);
        let mut errors = ValidationErrors::new();
        check_present(&mut errors, text.as_ref(), |v| validate_text("text", v, None));
        check_present(&mut errors, input.score.as_ref(), |v| validate_score(*v));
        errors.into_result()?;

        let updated = self
            .reviews
            .update_review(
                review_id,
                ReviewPatch {
                    text,
                    score: input.score,
                },
            )
            .await?;
        tracing::info!(title_id, review_id, "review updated");
        Ok(updated)
    }

    pub async fn delete(&self, actor: Option<&User>, title_id: Id, review_id: Id) -> Result<()> {
        Self::POLICY.check(actor, Access::Write)?;
        let review = self.get(title_id, review_id).await?;
        Self::POLICY.check_object(actor, Access::Write, review.author_id)?;
        self.reviews.delete_review(review_id).await?;
        tracing::info!(title_id, review_id, "review deleted");
        Ok(())
    }

    async fn ensure_title(&self, title_id: Id) -> Result<()> {
        match self.titles.get_title(title_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("title", title_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use chrono::Utc;
    use domains::{MockReviewRepo, MockTitleRepo, Role, TitleDetail};

    fn titles() -> MockTitleRepo {
        let mut repo = MockTitleRepo::new();
        repo.expect_get_title().returning(|id| {
            Ok((id == 1).then(|| TitleDetail {
                id,
                name: "Dune".into(),
                year: 1965,
                description: None,
                category: None,
                genre: Vec::new(),
                rating: None,
            }))
        });
        repo
    }

    fn review(id: Id, author_id: Id) -> Review {
        Review {
            id,
            title_id: 1,
            author_id,
            author: format!("user{author_id}"),
            text: "Spice".into(),
            score: 8,
            pub_date: Utc::now(),
        }
    }

    fn input(score: i32) -> ReviewInput {
        ReviewInput {
            text: Some("Worth it".into()),
            score: Some(score),
        }
    }

    #[tokio::test]
    async fn second_review_by_same_author_is_rejected() {
        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_find_by_author()
            .returning(|_, author_id| Ok(Some(review(1, author_id))));
        reviews.expect_create_review().never();

        let service = ReviewService::new(Arc::new(reviews), Arc::new(titles()));
        let err = service
            .create(Some(&user(5, Role::User)), 1, input(7))
            .await
            .unwrap_err();
        let AppError::Validation(errors) = err else {
            panic!("expected validation error");
        };
        assert_eq!(
            errors.get(NON_FIELD_ERRORS),
            Some(&[ALREADY_REVIEWED.to_string()][..])
        );
    }

    #[tokio::test]
    async fn score_outside_range_is_rejected() {
        let service = ReviewService::new(Arc::new(MockReviewRepo::new()), Arc::new(titles()));
        for score in [0, 11, -3] {
            let err = service
                .create(Some(&user(5, Role::User)), 1, input(score))
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::Validation(e) if e.contains("score")));
        }
    }

    #[tokio::test]
    async fn create_binds_author_and_title() {
        let mut reviews = MockReviewRepo::new();
        reviews.expect_find_by_author().returning(|_, _| Ok(None));
        reviews
            .expect_create_review()
            .withf(|r| r.title_id == 1 && r.author_id == 5 && r.score == 10)
            .returning(|r| Ok(review(9, r.author_id)));

        let service = ReviewService::new(Arc::new(reviews), Arc::new(titles()));
        let created = service
            .create(Some(&user(5, Role::User)), 1, input(10))
            .await
            .unwrap();
        assert_eq!(created.author_id, 5);
    }

    #[tokio::test]
    async fn unknown_title_is_not_found() {
        let service = ReviewService::new(Arc::new(MockReviewRepo::new()), Arc::new(titles()));
        let err = service.list(2, PageRequest::default()).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn only_author_or_staff_may_edit() {
        let mut reviews = MockReviewRepo::new();
        reviews
            .expect_get_review()
            .returning(|_, id| Ok(Some(review(id, 5))));
        reviews
            .expect_update_review()
            .times(2)
            .returning(|id, _| Ok(review(id, 5)));
        let service = ReviewService::new(Arc::new(reviews), Arc::new(titles()));

        let err = service
            .update(Some(&user(6, Role::User)), 1, 3, input(4))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service
            .update(Some(&user(5, Role::User)), 1, 3, input(4))
            .await
            .unwrap();
        service
            .update(Some(&user(7, Role::Moderator)), 1, 3, input(4))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn anonymous_create_is_unauthorized() {
        let service = ReviewService::new(Arc::new(MockReviewRepo::new()), Arc::new(titles()));
        let err = service.create(None, 1, input(5)).await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }
}
