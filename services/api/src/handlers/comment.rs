use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use yamdb_auth_types::identity::Caller;
use yamdb_domain::pagination::Page;

use crate::domain::policy;
use crate::domain::types::Comment;
use crate::error::ApiError;
use crate::handlers::extract::{JsonBody, QueryParams};
use crate::handlers::ListQuery;
use crate::state::AppState;
use crate::usecase::comment::{
    CreateCommentUseCase, DeleteCommentUseCase, GetCommentUseCase, ListCommentsUseCase,
    UpdateCommentUseCase,
};

#[derive(Serialize)]
pub struct CommentResponse {
    pub id: i32,
    pub text: String,
    pub author: String,
    #[serde(serialize_with = "yamdb_core::serde::to_rfc3339_ms")]
    pub pub_date: chrono::DateTime<chrono::Utc>,
}

impl From<Comment> for CommentResponse {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            text: comment.text,
            author: comment.author,
            pub_date: comment.pub_date,
        }
    }
}

#[derive(Deserialize)]
pub struct CommentRequest {
    pub text: Option<String>,
}

// ── GET /titles/{title_id}/reviews/{review_id}/comments ──────────────────────

pub async fn list_comments(
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    QueryParams(query): QueryParams<ListQuery>,
) -> Result<Json<Page<CommentResponse>>, ApiError> {
    let usecase = ListCommentsUseCase {
        reviews: state.review_repo(),
        comments: state.comment_repo(),
    };
    let page = usecase
        .execute(title_id, review_id, query.page_request(state.page_size))
        .await?;
    Ok(Json(page.map(CommentResponse::from)))
}

// ── POST /titles/{title_id}/reviews/{review_id}/comments ─────────────────────

pub async fn create_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id)): Path<(i32, i32)>,
    body: Result<JsonBody<CommentRequest>, ApiError>,
) -> Result<(StatusCode, Json<CommentResponse>), ApiError> {
    policy::require_account(&caller)?;
    let JsonBody(body) = body?;
    let usecase = CreateCommentUseCase {
        reviews: state.review_repo(),
        comments: state.comment_repo(),
    };
    let comment = usecase
        .execute(&caller, title_id, review_id, body.text)
        .await?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

// ── GET .../comments/{comment_id} ────────────────────────────────────────────

pub async fn get_comment(
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<Json<CommentResponse>, ApiError> {
    let usecase = GetCommentUseCase {
        reviews: state.review_repo(),
        comments: state.comment_repo(),
    };
    let comment = usecase.execute(title_id, review_id, comment_id).await?;
    Ok(Json(comment.into()))
}

// ── PATCH .../comments/{comment_id} ──────────────────────────────────────────

pub async fn update_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
    body: Result<JsonBody<CommentRequest>, ApiError>,
) -> Result<Json<CommentResponse>, ApiError> {
    policy::require_account(&caller)?;
    let JsonBody(body) = body?;
    let usecase = UpdateCommentUseCase {
        reviews: state.review_repo(),
        comments: state.comment_repo(),
    };
    let comment = usecase
        .execute(&caller, title_id, review_id, comment_id, body.text)
        .await?;
    Ok(Json(comment.into()))
}

// ── DELETE .../comments/{comment_id} ─────────────────────────────────────────

pub async fn delete_comment(
    caller: Caller,
    State(state): State<AppState>,
    Path((title_id, review_id, comment_id)): Path<(i32, i32, i32)>,
) -> Result<StatusCode, ApiError> {
    let usecase = DeleteCommentUseCase {
        reviews: state.review_repo(),
        comments: state.comment_repo(),
    };
    usecase
        .execute(&caller, title_id, review_id, comment_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
