//! Comments on a review.

use std::sync::Arc;

use domains::validators::validate_text;
use domains::{
    AppError, Comment, CommentRepo, Id, NewComment, Page, PageRequest, Result, ReviewRepo, User,
    ValidationErrors,
};
use serde::Deserialize;

use crate::permissions::{require_authenticated, Access, Policy};
use crate::{check_present, required, trimmed};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub text: Option<String>,
}

pub struct CommentService {
    comments: Arc<dyn CommentRepo>,
    reviews: Arc<dyn ReviewRepo>,
}

impl CommentService {
    const POLICY: Policy = Policy::OwnerModeratorAdminOrReadOnly;

    pub fn new(comments: Arc<dyn CommentRepo>, reviews: Arc<dyn ReviewRepo>) -> Self {
        Self { comments, reviews }
    }

    pub async fn list(&self, title_id: Id, review_id: Id, page: PageRequest) -> Result<Page<Comment>> {
        self.ensure_review(title_id, review_id).await?;
        self.comments.list_comments(review_id, page).await
    }

    pub async fn get(&self, title_id: Id, review_id: Id, comment_id: Id) -> Result<Comment> {
        self.ensure_review(title_id, review_id).await?;
        self.comments
            .get_comment(review_id, comment_id)
            .await?
            .ok_or_else(|| AppError::not_found("comment", comment_id))
    }

    pub async fn create(
        &self,
        actor: Option<&User>,
        title_id: Id,
        review_id: Id,
        input: CommentInput,
    ) -> Result<Comment> {
        Self::POLICY.check(actor, Access::Write)?;
        let author = require_authenticated(actor)?;
        self.ensure_review(title_id, review_id).await?;

        let mut errors = ValidationErrors::new();
        let text = required(&mut errors, "text", trimmed(input.text));
        check_present(&mut errors, text.as_ref(), |v| validate_text("text", v, None));
        errors.into_result()?;
        let Some(text) = text else {
            return Err(AppError::internal("validated comment text missing"));
        };

        let comment = self
            .comments
            .create_comment(NewComment {
                review_id,
                author_id: author.id,
                text,
            })
            .await?;
        tracing::info!(review_id, comment_id = comment.id, author = %author.username, "comment created");
        Ok(comment)
    }

    pub async fn update(
        &self,
        actor: Option<&User>,
        title_id: Id,
        review_id: Id,
        comment_id: Id,
        input: CommentInput,
    ) -> Result<Comment> {
        Self::POLICY.check(actor, Access::Write)?;
        let comment = self.get(title_id, review_id, comment_id).await?;
        Self::POLICY.check_object(actor, Access::Write, comment.author_id)?;

        let Some(text) = trimmed(input.text) else {
            return Ok(comment);
        };
        validate_text("text", &text, None)?;
        let updated = self.comments.update_comment(comment_id, text).await?;
        tracing::info!(review_id, comment_id, "comment updated");
        Ok(updated)
    }

    pub async fn delete(
        &self,
        actor: Option<&User>,
        title_id: Id,
        review_id: Id,
        comment_id: Id,
    ) -> Result<()> {
        Self::POLICY.check(actor, Access::Write)?;
        let comment = self.get(title_id, review_id, comment_id).await?;
        Self::POLICY.check_object(actor, Access::Write, comment.author_id)?;
        self.comments.delete_comment(comment_id).await?;
        tracing::info!(review_id, comment_id, "comment deleted");
        Ok(())
    }

    async fn ensure_review(&self, title_id: Id, review_id: Id) -> Result<()> {
        match self.reviews.get_review(title_id, review_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::not_found("review", review_id)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::user;
    use chrono::Utc;
    use domains::{MockCommentRepo, MockReviewRepo, Review, Role};

    fn reviews() -> MockReviewRepo {
        let mut repo = MockReviewRepo::new();
        repo.expect_get_review().returning(|title_id, review_id| {
            Ok((title_id == 1 && review_id == 2).then(|| Review {
                id: review_id,
                title_id,
                author_id: 9,
                author: "critic".into(),
                text: "Fine".into(),
                score: 6,
                pub_date: Utc::now(),
            }))
        });
        repo
    }

    fn comment(id: Id, author_id: Id) -> Comment {
        Comment {
            id,
            review_id: 2,
            author_id,
            author: format!("user{author_id}"),
            text: "Agreed".into(),
            pub_date: Utc::now(),
        }
    }

    #[tokio::test]
    async fn review_of_another_title_is_not_found() {
        let service = CommentService::new(Arc::new(MockCommentRepo::new()), Arc::new(reviews()));
        let err = service
            .list(7, 2, PageRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(..)));
    }

    #[tokio::test]
    async fn create_binds_author_and_review() {
        let mut comments = MockCommentRepo::new();
        comments
            .expect_create_comment()
            .withf(|c| c.review_id == 2 && c.author_id == 4 && c.text == "Agreed")
            .returning(|c| Ok(comment(1, c.author_id)));
        let service = CommentService::new(Arc::new(comments), Arc::new(reviews()));

        let created = service
            .create(
                Some(&user(4, Role::User)),
                1,
                2,
                CommentInput {
                    text: Some("Agreed".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(created.author_id, 4);
    }

    #[tokio::test]
    async fn blank_text_is_rejected() {
        let service = CommentService::new(Arc::new(MockCommentRepo::new()), Arc::new(reviews()));
        let err = service
            .create(Some(&user(4, Role::User)), 1, 2, CommentInput::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(e) if e.contains("text")));
    }

    #[tokio::test]
    async fn stranger_cannot_delete() {
        let mut comments = MockCommentRepo::new();
        comments
            .expect_get_comment()
            .returning(|_, id| Ok(Some(comment(id, 4))));
        comments.expect_delete_comment().times(1).returning(|_| Ok(()));
        let service = CommentService::new(Arc::new(comments), Arc::new(reviews()));

        let err = service
            .delete(Some(&user(5, Role::User)), 1, 2, 3)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));

        service
            .delete(Some(&user(6, Role::Admin)), 1, 2, 3)
            .await
            .unwrap();
    }
}
