use chrono::Utc;

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::{Page, PageRequest};

use crate::domain::policy::{require_account, require_author_or_staff};
use crate::domain::repository::{CommentRepository, ReviewRepository};
use crate::domain::types::{Comment, NewComment, validate_text};
use crate::error::ApiError;

/// The review must exist and belong to the title in the path.
async fn ensure_review<R: ReviewRepository>(
    reviews: &R,
    title_id: i32,
    review_id: i32,
) -> Result<(), ApiError> {
    match reviews.find(title_id, review_id).await? {
        Some(_) => Ok(()),
        None => Err(ApiError::ReviewNotFound),
    }
}

async fn find_comment<R: ReviewRepository, C: CommentRepository>(
    reviews: &R,
    comments: &C,
    title_id: i32,
    review_id: i32,
    comment_id: i32,
) -> Result<Comment, ApiError> {
    ensure_review(reviews, title_id, review_id).await?;
    comments
        .find(review_id, comment_id)
        .await?
        .ok_or(ApiError::CommentNotFound)
}

fn check_text(text: Option<&str>) -> Result<&str, ApiError> {
    let text = text.ok_or_else(|| ApiError::validation("text", "this field is required"))?;
    validate_text(text, None).map_err(|msg| ApiError::validation("text", msg))?;
    Ok(text)
}

// ── ListComments ─────────────────────────────────────────────────────────────

pub struct ListCommentsUseCase<R: ReviewRepository, C: CommentRepository> {
    pub reviews: R,
    pub comments: C,
}

impl<R: ReviewRepository, C: CommentRepository> ListCommentsUseCase<R, C> {
    pub async fn execute(
        &self,
        title_id: i32,
        review_id: i32,
        page: PageRequest,
    ) -> Result<Page<Comment>, ApiError> {
        ensure_review(&self.reviews, title_id, review_id).await?;
        let (items, count) = self.comments.list(review_id, page).await?;
        Ok(Page::new(items, count, page))
    }
}

// ── GetComment ───────────────────────────────────────────────────────────────

pub struct GetCommentUseCase<R: ReviewRepository, C: CommentRepository> {
    pub reviews: R,
    pub comments: C,
}

impl<R: ReviewRepository, C: CommentRepository> GetCommentUseCase<R, C> {
    pub async fn execute(
        &self,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
    ) -> Result<Comment, ApiError> {
        find_comment(&self.reviews, &self.comments, title_id, review_id, comment_id).await
    }
}

// ── CreateComment ────────────────────────────────────────────────────────────

pub struct CreateCommentUseCase<R: ReviewRepository, C: CommentRepository> {
    pub reviews: R,
    pub comments: C,
}

impl<R: ReviewRepository, C: CommentRepository> CreateCommentUseCase<R, C> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        review_id: i32,
        text: Option<String>,
    ) -> Result<Comment, ApiError> {
        let author_id = require_account(caller)?;
        ensure_review(&self.reviews, title_id, review_id).await?;
        let text = check_text(text.as_deref())?;

        let comment = NewComment {
            review_id,
            author_id,
            text: text.to_owned(),
            pub_date: Utc::now(),
        };
        self.comments.create(&comment).await
    }
}

// ── UpdateComment ────────────────────────────────────────────────────────────

pub struct UpdateCommentUseCase<R: ReviewRepository, C: CommentRepository> {
    pub reviews: R,
    pub comments: C,
}

impl<R: ReviewRepository, C: CommentRepository> UpdateCommentUseCase<R, C> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
        text: Option<String>,
    ) -> Result<Comment, ApiError> {
        let comment =
            find_comment(&self.reviews, &self.comments, title_id, review_id, comment_id).await?;
        require_author_or_staff(caller, comment.author_id)?;
        if text.is_none() {
            return Ok(comment);
        }
        let text = check_text(text.as_deref())?;
        self.comments.update(comment.id, text).await
    }
}

// ── DeleteComment ────────────────────────────────────────────────────────────

pub struct DeleteCommentUseCase<R: ReviewRepository, C: CommentRepository> {
    pub reviews: R,
    pub comments: C,
}

impl<R: ReviewRepository, C: CommentRepository> DeleteCommentUseCase<R, C> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        review_id: i32,
        comment_id: i32,
    ) -> Result<(), ApiError> {
        let comment =
            find_comment(&self.reviews, &self.comments, title_id, review_id, comment_id).await?;
        require_author_or_staff(caller, comment.author_id)?;
        if !self.comments.delete(comment.id).await? {
            return Err(ApiError::CommentNotFound);
        }
        Ok(())
    }
}
