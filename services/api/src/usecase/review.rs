use chrono::Utc;

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::{Page, PageRequest};

use crate::domain::policy::{require_account, require_author_or_staff};
use crate::domain::repository::{ReviewRepository, TitleRepository};
use crate::domain::types::{NewReview, Review, validate_score, validate_text};
use crate::error::{ApiError, FieldErrors};

async fn ensure_title<T: TitleRepository>(titles: &T, title_id: i32) -> Result<(), ApiError> {
    if titles.exists(title_id).await? {
        Ok(())
    } else {
        Err(ApiError::TitleNotFound)
    }
}

async fn find_review<T: TitleRepository, R: ReviewRepository>(
    titles: &T,
    reviews: &R,
    title_id: i32,
    review_id: i32,
) -> Result<Review, ApiError> {
    ensure_title(titles, title_id).await?;
    reviews
        .find(title_id, review_id)
        .await?
        .ok_or(ApiError::ReviewNotFound)
}

// ── ListReviews ──────────────────────────────────────────────────────────────

pub struct ListReviewsUseCase<T: TitleRepository, R: ReviewRepository> {
    pub titles: T,
    pub reviews: R,
}

impl<T: TitleRepository, R: ReviewRepository> ListReviewsUseCase<T, R> {
    pub async fn execute(&self, title_id: i32, page: PageRequest) -> Result<Page<Review>, ApiError> {
        ensure_title(&self.titles, title_id).await?;
        let (items, count) = self.reviews.list(title_id, page).await?;
        Ok(Page::new(items, count, page))
    }
}

// ── GetReview ────────────────────────────────────────────────────────────────

pub struct GetReviewUseCase<T: TitleRepository, R: ReviewRepository> {
    pub titles: T,
    pub reviews: R,
}

impl<T: TitleRepository, R: ReviewRepository> GetReviewUseCase<T, R> {
    pub async fn execute(&self, title_id: i32, review_id: i32) -> Result<Review, ApiError> {
        find_review(&self.titles, &self.reviews, title_id, review_id).await
    }
}

// ── CreateReview ─────────────────────────────────────────────────────────────

pub struct CreateReviewInput {
    pub text: Option<String>,
    pub score: Option<i32>,
}

pub struct CreateReviewUseCase<T: TitleRepository, R: ReviewRepository> {
    pub titles: T,
    pub reviews: R,
}

impl<T: TitleRepository, R: ReviewRepository> CreateReviewUseCase<T, R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        input: CreateReviewInput,
    ) -> Result<Review, ApiError> {
        let author_id = require_account(caller)?;
        ensure_title(&self.titles, title_id).await?;

        let mut errors = FieldErrors::new();
        match &input.text {
            Some(text) => {
                if let Err(msg) = validate_text(text, None) {
                    errors.add("text", msg);
                }
            }
            None => errors.add("text", "this field is required"),
        }
        match input.score {
            Some(score) => {
                if let Err(msg) = validate_score(score) {
                    errors.add("score", msg);
                }
            }
            None => errors.add("score", "this field is required"),
        }
        errors.into_result()?;

        if self.reviews.exists_for_author(title_id, author_id).await? {
            return Err(ApiError::ReviewAlreadyExists);
        }
        let review = NewReview {
            title_id,
            author_id,
            text: input.text.unwrap_or_default(),
            score: input.score.unwrap_or_default(),
            pub_date: Utc::now(),
        };
        self.reviews.create(&review).await
    }
}

// ── UpdateReview ─────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct UpdateReviewInput {
    pub text: Option<String>,
    pub score: Option<i32>,
}

pub struct UpdateReviewUseCase<T: TitleRepository, R: ReviewRepository> {
    pub titles: T,
    pub reviews: R,
}

impl<T: TitleRepository, R: ReviewRepository> UpdateReviewUseCase<T, R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        review_id: i32,
        input: UpdateReviewInput,
    ) -> Result<Review, ApiError> {
        let review = find_review(&self.titles, &self.reviews, title_id, review_id).await?;
        require_author_or_staff(caller, review.author_id)?;

        let mut errors = FieldErrors::new();
        if let Some(text) = &input.text {
            if let Err(msg) = validate_text(text, None) {
                errors.add("text", msg);
            }
        }
        if let Some(score) = input.score {
            if let Err(msg) = validate_score(score) {
                errors.add("score", msg);
            }
        }
        errors.into_result()?;

        self.reviews
            .update(review.id, input.text.as_deref(), input.score)
            .await
    }
}

// ── DeleteReview ─────────────────────────────────────────────────────────────

pub struct DeleteReviewUseCase<T: TitleRepository, R: ReviewRepository> {
    pub titles: T,
    pub reviews: R,
}

impl<T: TitleRepository, R: ReviewRepository> DeleteReviewUseCase<T, R> {
    pub async fn execute(
        &self,
        caller: &Caller,
        title_id: i32,
        review_id: i32,
    ) -> Result<(), ApiError> {
        let review = find_review(&self.titles, &self.reviews, title_id, review_id).await?;
        require_author_or_staff(caller, review.author_id)?;
        if !self.reviews.delete(review.id).await? {
            return Err(ApiError::ReviewNotFound);
        }
        Ok(())
    }
}
