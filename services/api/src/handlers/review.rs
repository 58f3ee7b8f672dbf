use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::Page;

use crate::domain::policy;
use crate::domain::types::Review;
use crate::error::ApiError;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::review::{
    CreateReviewInput, CreateReviewUseCase, DeleteReviewUseCase, GetReviewUseCase,
    ListReviewsUseCase, UpdateReviewInput, UpdateReviewUseCase,
};

#[derive(Serialize)]
pub struct ReviewResponse {
    pub id: i32,
    pub text: String,
    /// Author's username.
    pub author: String,
    pub score: i32,
    #[serde(serialize_with = "yamdb_core::serde::to_rfc3339_ms")]
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            text: review.text,
            author: review.author,
            score: review.score,
            pub_date: review.pub_date,
        }
    }
}

#[derive(Deserialize)]
pub struct ReviewRequest {
    pub text: Option<String>,
    pub score: Option<i32>,
}

// ── GET /titles/{title_id}/reviews ───────────────────────────────────────────

pub async fn list_reviews(
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Page<ReviewResponse>>, ApiError> {
    let usecase = ListReviewsUseCase {
        titles: state.title_repo(),
        reviews: state.review_repo(),
    };
    let page = usecase
        .execute(title_id, query.page_request(state.page_size))
        .await?;
    Ok(Json(page.map(ReviewResponse::from)))
}

// ── POST /titles/{title_id}/reviews ──────────────────────────────────────────

pub async fn create_review(
    caller: Caller,
    State(state): State<AppState>,
    Path(title_id): Path<i32>,
    body: Result<JsonBody<ReviewRequest>, ApiError>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    policy::require_account(&caller)?;
    let JsonBody(body) = body?;
    let usecase = CreateReviewUseCase {
        titles: state.title_repo(),
        reviews: state.review_repo(),
    };
    let review = usecase
        .execute(
            &caller,
            title_id,
            CreateReviewInput {
                text: body.text,
                score: body.score,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(review.into())))
}

// ── GET /titles/{title_id}/reviews/{review_id} ───────────────────────────────

pub async fn get_review(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let usecase = GetReviewUseCase {
        titles: state.title_repo(),
        reviews: state.review_repo(),
    };
    Ok(Json(usecase.execute(title_id, review_id).await?.into()))
}

// ── PATCH /titles/{title_id}/reviews/{review_id} ─────────────────────────────

pub async fn update_review(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    body: Result<JsonBody<ReviewRequest>, ApiError>,
) -> Result<Json<ReviewResponse>, ApiError> {
    policy::require_account(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateReviewUseCase {
        titles: state.title_repo(),
        reviews: state.review_repo(),
    };
    let review = usecase
        .execute(
            &caller,
            title_id,
            review_id,
            UpdateReviewInput {
                text: body.text,
                score: body.score,
            },
        )
        .await?;
    Ok(Json(review.into()))
}

// ── DELETE /titles/{title_id}/reviews/{review_id} ────────────────────────────

pub async fn delete_review(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteReviewUseCase {
        titles: state.title_repo(),
        reviews: state.review_repo(),
    };
    usecase.execute(&caller, title_id, review_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
